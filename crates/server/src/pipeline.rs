//! Orchestration of one document-analysis run
//!
//! Stages run strictly in sequence: OCR, structured extraction, JSON parsing
//! and interpretation, then summarization. The first failing stage ends the
//! run; nothing after it is attempted.

use std::sync::Arc;

use medisage_core::{
    AnalysisRun, FailureOutcome, InterpretationCounts, InterpretedTestRecord, PipelineError,
    RawTestRecord, Stage, interpret, parse_range, parse_records,
};

use crate::ai::{ChatGateway, ExtractionGateway, ModelCaller, SummaryGateway};
use crate::ocr::{Document, DocumentKind, OcrEngine};

/// A run that stopped at `stage`, with everything produced before it
#[derive(Debug)]
pub struct StageFailure {
    pub stage: Stage,
    pub error: PipelineError,
    pub run: AnalysisRun,
}

impl StageFailure {
    /// User-facing report including the raw text gathered so far
    pub fn outcome(&self) -> FailureOutcome {
        FailureOutcome::from_pipeline_error(self.stage, &self.error)
            .with_raw_text(self.run.raw_text())
            .with_raw_extraction(self.run.raw_extraction())
    }
}

#[derive(Clone)]
pub struct Pipeline {
    ocr: Arc<dyn OcrEngine>,
    extraction: ExtractionGateway,
    summary: SummaryGateway,
    chat: ChatGateway,
}

impl Pipeline {
    pub fn new(ocr: Arc<dyn OcrEngine>, caller: ModelCaller) -> Self {
        Self {
            ocr,
            extraction: ExtractionGateway::new(caller.clone()),
            summary: SummaryGateway::new(caller.clone()),
            chat: ChatGateway::new(caller),
        }
    }

    pub fn ocr(&self) -> &Arc<dyn OcrEngine> {
        &self.ocr
    }

    /// Run every stage up to and including the summary
    pub async fn analyze(&self, document: &Document) -> Result<AnalysisRun, StageFailure> {
        let mut run = AnalysisRun::new();

        // Text extraction
        let text = match self.extract_text(document).await {
            Ok(text) => text,
            Err(e) => return Err(fail(Stage::TextExtraction, e, run)),
        };
        tracing::info!(chars = text.len(), "Text extracted");
        if let Err(e) = run.record_text(text) {
            return Err(fail(Stage::TextExtraction, e, run));
        }

        // Structured extraction
        let extracted = self
            .extraction
            .extract(run.raw_text().unwrap_or_default())
            .await;
        let raw_json = match extracted {
            Ok(raw) => raw,
            Err(e) => {
                return Err(fail(
                    Stage::DataExtraction,
                    PipelineError::model(Stage::DataExtraction, e),
                    run,
                ));
            }
        };
        tracing::info!(chars = raw_json.len(), "Lab data extracted");
        if let Err(e) = run.record_extraction(raw_json) {
            return Err(fail(Stage::DataExtraction, e, run));
        }

        // Parsing and interpretation
        let records = match parse_records(run.raw_extraction().unwrap_or_default()) {
            Ok(records) => records,
            Err(e) => return Err(fail(Stage::Interpretation, e.into(), run)),
        };
        warn_inverted_ranges(&records);
        let results = interpret(&records);
        record_interpretation_metrics(&results);
        if let Err(e) = run.record_interpretation(results) {
            return Err(fail(Stage::Interpretation, e, run));
        }

        // Summary
        let summarized = self.summary.summarize(run.results()).await;
        let summary = match summarized {
            Ok(summary) => summary,
            Err(e) => {
                return Err(fail(
                    Stage::Summarization,
                    PipelineError::model(Stage::Summarization, e),
                    run,
                ));
            }
        };
        if let Err(e) = run.record_summary(summary) {
            return Err(fail(Stage::Summarization, e, run));
        }

        metrics::counter!("pipeline_runs_total", "outcome" => "success").increment(1);
        tracing::info!(results = run.results().len(), "Analysis complete");
        Ok(run)
    }

    /// Ask a follow-up question about a summarized run
    pub async fn ask(&self, run: &mut AnalysisRun, question: &str) -> Result<String, PipelineError> {
        if question.trim().is_empty() {
            return Err(PipelineError::EmptyQuestion);
        }
        run.begin_question()?;

        let answered = self.chat.answer(question, run.results()).await;
        match answered {
            Ok(answer) => {
                run.record_answer()?;
                Ok(answer)
            }
            Err(e) => {
                run.abandon_question();
                Err(PipelineError::model(Stage::Answering, e))
            }
        }
    }

    /// Answer a question against results supplied by the caller.
    ///
    /// Runs are not kept server-side, so HTTP clients send back the results
    /// they received from the analysis.
    pub async fn answer(
        &self,
        question: &str,
        context: &[InterpretedTestRecord],
    ) -> Result<String, PipelineError> {
        if question.trim().is_empty() {
            return Err(PipelineError::EmptyQuestion);
        }

        tracing::info!(context_results = context.len(), "Answering follow-up question");
        self.chat
            .answer(question, context)
            .await
            .map_err(|e| PipelineError::model(Stage::Answering, e))
    }

    async fn extract_text(&self, document: &Document) -> Result<String, PipelineError> {
        let kind = DocumentKind::from_filename(&document.filename)?;
        tracing::info!(
            filename = %document.filename,
            kind = kind.mime_type(),
            bytes = document.bytes.len(),
            engine = self.ocr.name(),
            "Extracting text"
        );
        Ok(self.ocr.extract_text(&document.bytes, kind).await?)
    }
}

fn fail(stage: Stage, error: PipelineError, run: AnalysisRun) -> StageFailure {
    tracing::warn!(stage = %stage, error = %error, "Analysis stopped");
    metrics::counter!("pipeline_stage_failures_total", "stage" => stage.as_str()).increment(1);
    metrics::counter!("pipeline_runs_total", "outcome" => "failure").increment(1);
    StageFailure { stage, error, run }
}

/// Ranges like "10-5" are kept as written; flag them so they can be spotted
fn warn_inverted_ranges(records: &[RawTestRecord]) {
    for record in records {
        let Some(range) = parse_range(record.reference_range.as_deref()) else {
            continue;
        };
        if range.is_inverted() {
            tracing::warn!(
                test_name = %record.test_name,
                low = range.low,
                high = range.high,
                "Reference range lists the upper bound first"
            );
        }
    }
}

fn record_interpretation_metrics(results: &[InterpretedTestRecord]) {
    for result in results {
        metrics::counter!(
            "lab_results_total",
            "interpretation" => result.interpretation.as_str()
        )
        .increment(1);
    }

    let counts = InterpretationCounts::tally(results);
    tracing::info!(
        low = counts.low,
        normal = counts.normal,
        high = counts.high,
        unknown = counts.unknown,
        "Lab results interpreted"
    );
}
