use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Pipeline stage at which a run can fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    TextExtraction,
    DataExtraction,
    Interpretation,
    Summarization,
    Answering,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::TextExtraction => "text_extraction",
            Stage::DataExtraction => "data_extraction",
            Stage::Interpretation => "interpretation",
            Stage::Summarization => "summarization",
            Stage::Answering => "answering",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Document could not be turned into text
#[derive(Debug, Clone, Error)]
pub enum OcrError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("No text found in document: {0}")]
    NoText(String),

    #[error("Document unreadable: {0}")]
    Unreadable(String),

    #[error("OCR engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("OCR timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
}

/// Model output could not be parsed as a JSON array of test records
#[derive(Debug, Error)]
#[error("Failed to parse lab results: {message}")]
pub struct ExtractionFormatError {
    pub message: String,
    /// The text that failed to parse, kept for manual inspection
    pub raw: String,
}

/// Language-model call failure
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    /// Network failure, rate limiting, or a server-side error
    #[error("Transient model error: {0}")]
    Transient(String),

    /// Rejected request, typically a bad credential or invalid model id
    #[error("Model request rejected: {0}")]
    Permanent(String),

    #[error("Model call timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("Model returned no text content")]
    EmptyResponse,
}

impl ModelError {
    /// Whether a second attempt could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, ModelError::Transient(_) | ModelError::Timeout(_))
    }
}

/// Stage-level failure of an analysis run
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Ocr(#[from] OcrError),

    #[error(transparent)]
    ExtractionFormat(#[from] ExtractionFormatError),

    #[error("{stage} failed: {source}")]
    Model {
        stage: Stage,
        #[source]
        source: ModelError,
    },

    #[error("Cannot move from {from} to {to}")]
    InvalidTransition {
        from: crate::run::RunStage,
        to: crate::run::RunStage,
    },

    #[error("Question must not be empty")]
    EmptyQuestion,
}

impl PipelineError {
    pub fn model(stage: Stage, source: ModelError) -> Self {
        PipelineError::Model { stage, source }
    }
}
