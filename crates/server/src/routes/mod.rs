pub mod analyze;
pub mod chat;
pub mod health;
pub mod metadata;
pub mod metrics;

use axum::{Router, extract::DefaultBodyLimit, routing::post};

use crate::AppState;

/// Routes that call the language model
pub fn analysis_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/analyze",
            post(analyze::analyze).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/chat", post(chat::ask))
}
