//! Document analysis endpoint

use axum::{
    Extension, Json,
    extract::{Multipart, State},
};
use chrono::{DateTime, Utc};
use medisage_core::{
    InterpretationCounts, InterpretedTestRecord, RunStage, TableRow, render_table,
};
use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

use crate::AppState;
use crate::error::AppError;
use crate::middleware::RequestId;
use crate::ocr::Document;

/// Multipart field carrying the uploaded report
const FILE_FIELD: &str = "file";

/// Result of a completed analysis run
#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub run_id: String,
    pub stage: RunStage,
    pub filename: String,
    pub raw_text: String,
    pub raw_extraction: String,
    pub results: Vec<InterpretedTestRecord>,
    pub table: Vec<TableRow>,
    pub counts: InterpretationCounts,
    pub summary: String,
    pub analyzed_at: DateTime<Utc>,
}

/// POST /analyze - Run OCR, extraction, interpretation and summary on an upload
pub async fn analyze(
    State(state): State<AppState>,
    request_id: Option<Extension<RequestId>>,
    multipart: Multipart,
) -> Result<Json<AnalysisResponse>, AppError> {
    let document = read_document(multipart).await?;
    let run_id = Uuid::new_v4().to_string();

    let span = tracing::info_span!(
        "analysis",
        run_id = %run_id,
        request_id = request_id.as_ref().map(|Extension(id)| id.0.as_str()).unwrap_or("unknown"),
        filename = %document.filename
    );

    let run = state
        .pipeline
        .analyze(&document)
        .instrument(span)
        .await
        .map_err(|failure| AppError::stage_failure(&failure, &run_id))?;

    let results = run.results().to_vec();
    Ok(Json(AnalysisResponse {
        run_id,
        stage: run.stage(),
        filename: document.filename,
        raw_text: run.raw_text().unwrap_or_default().to_string(),
        raw_extraction: run.raw_extraction().unwrap_or_default().to_string(),
        table: render_table(&results),
        counts: InterpretationCounts::tally(&results),
        summary: run.summary().unwrap_or_default().to_string(),
        results,
        analyzed_at: Utc::now(),
    }))
}

/// Pull the `file` field out of the upload
async fn read_document(mut multipart: Multipart) -> Result<Document, AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::BadRequest("Uploaded file has no filename".into()))?;
        let bytes = field.bytes().await?;
        if bytes.is_empty() {
            return Err(AppError::BadRequest(format!("Uploaded file '{}' is empty", filename)));
        }

        return Ok(Document {
            filename,
            bytes: bytes.to_vec(),
        });
    }

    Err(AppError::BadRequest(format!(
        "Missing multipart field '{}'",
        FILE_FIELD
    )))
}
