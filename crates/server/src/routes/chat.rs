//! Follow-up question endpoint

use axum::{Json, extract::State};
use medisage_core::{InterpretedTestRecord, PipelineError, Stage};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::AppError;

/// A question about previously returned results
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub question: String,
    #[serde(default)]
    pub results: Vec<InterpretedTestRecord>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub answer: String,
}

/// POST /chat - Answer a question about interpreted results
pub async fn ask(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    match state.pipeline.answer(&request.question, &request.results).await {
        Ok(answer) => Ok(Json(ChatResponse { answer })),
        Err(PipelineError::EmptyQuestion) => {
            Err(AppError::BadRequest("Question must not be empty".into()))
        }
        Err(e) => Err(AppError::pipeline(Stage::Answering, &e)),
    }
}
