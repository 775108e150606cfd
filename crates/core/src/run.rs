//! State of a single document-analysis run
//!
//! A run moves strictly forward:
//! `Idle -> TextExtracted -> DataExtracted -> Interpreted -> Summarized`,
//! after which follow-up questions alternate between `AwaitingQuestion`
//! and `Answered` for as long as the caller likes.

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::record::InterpretedTestRecord;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStage {
    #[default]
    Idle,
    TextExtracted,
    DataExtracted,
    Interpreted,
    Summarized,
    AwaitingQuestion,
    Answered,
}

impl RunStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStage::Idle => "idle",
            RunStage::TextExtracted => "text_extracted",
            RunStage::DataExtracted => "data_extracted",
            RunStage::Interpreted => "interpreted",
            RunStage::Summarized => "summarized",
            RunStage::AwaitingQuestion => "awaiting_question",
            RunStage::Answered => "answered",
        }
    }
}

impl std::fmt::Display for RunStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Artifacts of one analysis run, recorded stage by stage
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisRun {
    stage: RunStage,
    raw_text: Option<String>,
    raw_extraction: Option<String>,
    results: Vec<InterpretedTestRecord>,
    summary: Option<String>,
    answers: usize,
}

impl AnalysisRun {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self) -> RunStage {
        self.stage
    }

    /// OCR output
    pub fn raw_text(&self) -> Option<&str> {
        self.raw_text.as_deref()
    }

    /// JSON text recovered from the extraction model call
    pub fn raw_extraction(&self) -> Option<&str> {
        self.raw_extraction.as_deref()
    }

    pub fn results(&self) -> &[InterpretedTestRecord] {
        &self.results
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// Number of follow-up questions answered so far
    pub fn answers_given(&self) -> usize {
        self.answers
    }

    /// Whether follow-up questions are allowed
    pub fn accepts_questions(&self) -> bool {
        self.stage >= RunStage::Summarized
    }

    pub fn record_text(&mut self, text: String) -> Result<(), PipelineError> {
        self.advance(&[RunStage::Idle], RunStage::TextExtracted)?;
        self.raw_text = Some(text);
        Ok(())
    }

    pub fn record_extraction(&mut self, raw: String) -> Result<(), PipelineError> {
        self.advance(&[RunStage::TextExtracted], RunStage::DataExtracted)?;
        self.raw_extraction = Some(raw);
        Ok(())
    }

    pub fn record_interpretation(
        &mut self,
        results: Vec<InterpretedTestRecord>,
    ) -> Result<(), PipelineError> {
        self.advance(&[RunStage::DataExtracted], RunStage::Interpreted)?;
        self.results = results;
        Ok(())
    }

    pub fn record_summary(&mut self, summary: String) -> Result<(), PipelineError> {
        self.advance(&[RunStage::Interpreted], RunStage::Summarized)?;
        self.summary = Some(summary);
        Ok(())
    }

    /// Start a follow-up question
    pub fn begin_question(&mut self) -> Result<(), PipelineError> {
        self.advance(
            &[RunStage::Summarized, RunStage::Answered],
            RunStage::AwaitingQuestion,
        )
    }

    /// Mark the pending question as answered
    pub fn record_answer(&mut self) -> Result<(), PipelineError> {
        self.advance(&[RunStage::AwaitingQuestion], RunStage::Answered)?;
        self.answers += 1;
        Ok(())
    }

    /// Give up on a pending question so another can be asked
    pub fn abandon_question(&mut self) {
        if self.stage == RunStage::AwaitingQuestion {
            self.stage = if self.answers > 0 {
                RunStage::Answered
            } else {
                RunStage::Summarized
            };
        }
    }

    fn advance(&mut self, allowed_from: &[RunStage], to: RunStage) -> Result<(), PipelineError> {
        if !allowed_from.contains(&self.stage) {
            return Err(PipelineError::InvalidTransition {
                from: self.stage,
                to,
            });
        }
        self.stage = to;
        Ok(())
    }
}
