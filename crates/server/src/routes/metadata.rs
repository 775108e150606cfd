//! Metadata endpoint handler

use axum::{Json, extract::State};
use medisage_core::ServiceCapabilities;

use crate::AppState;

/// GET /metadata - Return supported formats, model and stages
pub async fn get(State(state): State<AppState>) -> Json<ServiceCapabilities> {
    Json(state.capabilities.as_ref().clone())
}
