//! Application error handling

use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use medisage_core::{FailureKind, FailureOutcome, PipelineError, Stage};

use crate::pipeline::StageFailure;

/// Application error type
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    PayloadTooLarge(String),
    /// A pipeline stage failed; the outcome carries the raw context
    Failed(Box<FailureOutcome>),
    Internal(String),
}

impl AppError {
    /// Wrap a stage failure of the run `run_id`
    pub fn stage_failure(failure: &StageFailure, run_id: &str) -> Self {
        AppError::Failed(Box::new(failure.outcome().with_run_id(run_id)))
    }

    pub fn pipeline(stage: Stage, err: &PipelineError) -> Self {
        AppError::Failed(Box::new(FailureOutcome::from_pipeline_error(stage, err)))
    }
}

/// HTTP status used for each kind of failure
pub fn status_for(kind: FailureKind) -> StatusCode {
    match kind {
        FailureKind::UnsupportedFormat => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        FailureKind::Ocr | FailureKind::ExtractionFormat => StatusCode::UNPROCESSABLE_ENTITY,
        FailureKind::ModelTransient => StatusCode::SERVICE_UNAVAILABLE,
        FailureKind::ModelPermanent => StatusCode::BAD_GATEWAY,
        FailureKind::ModelTimeout => StatusCode::GATEWAY_TIMEOUT,
        FailureKind::Invalid => StatusCode::BAD_REQUEST,
        FailureKind::Throttled => StatusCode::TOO_MANY_REQUESTS,
        FailureKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let outcome = match self {
            AppError::BadRequest(msg) => FailureOutcome::invalid(&msg),
            AppError::PayloadTooLarge(msg) => {
                return (StatusCode::PAYLOAD_TOO_LARGE, Json(FailureOutcome::invalid(&msg)))
                    .into_response();
            }
            AppError::Failed(outcome) => *outcome,
            AppError::Internal(msg) => FailureOutcome::internal(&msg),
        };

        (status_for(outcome.kind), Json(outcome)).into_response()
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(err.body_text())
        } else {
            AppError::BadRequest(format!("Upload error: {}", err.body_text()))
        }
    }
}
