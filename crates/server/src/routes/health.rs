//! Health check endpoint

use axum::{Json, extract::State};
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    ocr_engine: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

/// GET /health - Report whether image OCR is usable.
///
/// A missing OCR engine leaves PDF analysis working, so the server reports
/// `degraded` with 200 rather than failing the check.
pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    let ocr = state.pipeline.ocr();
    if ocr.is_available().await {
        Json(HealthResponse {
            status: "healthy".to_string(),
            ocr_engine: ocr.name(),
            reason: None,
        })
    } else {
        tracing::warn!(engine = ocr.name(), "OCR engine unavailable");
        Json(HealthResponse {
            status: "degraded".to_string(),
            ocr_engine: ocr.name(),
            reason: Some("Image OCR is unavailable; only PDFs with a text layer can be analyzed".into()),
        })
    }
}
