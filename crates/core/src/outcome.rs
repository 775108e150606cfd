//! User-facing failure documents
//!
//! Every failure shown to the user carries the stage it happened at and
//! whatever raw text the run had produced so far, so the user can inspect
//! what the OCR engine or the model actually returned.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, OcrError, PipelineError, Stage};

/// Category of failure
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    UnsupportedFormat,
    Ocr,
    ExtractionFormat,
    ModelTransient,
    ModelPermanent,
    ModelTimeout,
    Invalid,
    Throttled,
    Internal,
}

impl From<&PipelineError> for FailureKind {
    fn from(err: &PipelineError) -> Self {
        match err {
            PipelineError::Ocr(OcrError::UnsupportedFormat(_)) => FailureKind::UnsupportedFormat,
            PipelineError::Ocr(_) => FailureKind::Ocr,
            PipelineError::ExtractionFormat(_) => FailureKind::ExtractionFormat,
            PipelineError::Model { source, .. } => match source {
                ModelError::Transient(_) | ModelError::EmptyResponse => FailureKind::ModelTransient,
                ModelError::Permanent(_) => FailureKind::ModelPermanent,
                ModelError::Timeout(_) => FailureKind::ModelTimeout,
            },
            PipelineError::EmptyQuestion => FailureKind::Invalid,
            PipelineError::InvalidTransition { .. } => FailureKind::Internal,
        }
    }
}

/// Failure report returned in place of a result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureOutcome {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,

    pub kind: FailureKind,

    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_extraction: Option<String>,
}

impl FailureOutcome {
    pub fn new(kind: FailureKind, message: &str) -> Self {
        Self {
            run_id: None,
            stage: None,
            kind,
            message: message.to_string(),
            raw_text: None,
            raw_extraction: None,
        }
    }

    /// Create an outcome for an invalid request
    pub fn invalid(message: &str) -> Self {
        Self::new(FailureKind::Invalid, message)
    }

    /// Create an outcome for a rejected, rate-limited request
    pub fn throttled(message: &str) -> Self {
        Self::new(FailureKind::Throttled, message)
    }

    pub fn internal(message: &str) -> Self {
        Self::new(FailureKind::Internal, message)
    }

    /// Describe a stage failure. A format failure always carries the text
    /// that did not parse.
    pub fn from_pipeline_error(stage: Stage, err: &PipelineError) -> Self {
        let mut outcome = Self::new(FailureKind::from(err), &err.to_string());
        outcome.stage = Some(stage);
        if let PipelineError::ExtractionFormat(format) = err {
            outcome.raw_extraction = Some(format.raw.clone());
        }
        outcome
    }

    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    pub fn with_raw_text(mut self, raw_text: Option<&str>) -> Self {
        if let Some(text) = raw_text {
            self.raw_text = Some(text.to_string());
        }
        self
    }

    pub fn with_raw_extraction(mut self, raw_extraction: Option<&str>) -> Self {
        if let Some(text) = raw_extraction {
            self.raw_extraction = Some(text.to_string());
        }
        self
    }
}
