//! medisage-server library crate
//!
//! Exposes `build_app`, `AppState` and `config` for integration tests.
//! The actual binary entrypoint is in `main.rs`.

pub mod ai;
pub mod config;
mod error;
mod middleware;
pub mod ocr;
pub mod pipeline;
mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::{Extension, Router, middleware as axum_mw, routing::get};
use medisage_core::ServiceCapabilities;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use ai::{ClaudeClient, ModelCaller};
use config::Config;
use ocr::{DocumentOcr, OcrEngine, PdfiumRenderer, TesseractCli};
use pipeline::Pipeline;

pub use error::AppError;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Pipeline,
    pub capabilities: Arc<ServiceCapabilities>,
}

impl AppState {
    pub fn new(caller: ModelCaller, ocr: Arc<dyn OcrEngine>) -> Self {
        let capabilities = Arc::new(ServiceCapabilities::new(caller.model_id()));
        Self {
            pipeline: Pipeline::new(ocr, caller),
            capabilities,
        }
    }

    /// Claude for every model call; PDF text layer, PDFium page rendering and
    /// Tesseract for OCR
    pub fn from_config(config: &Config) -> Self {
        let client = ClaudeClient::new(
            config.anthropic_api_key.clone(),
            config.model.clone(),
            config.model_max_tokens,
        );
        let caller = ModelCaller::new(
            Arc::new(client),
            Duration::from_secs(config.model_timeout_secs),
        );
        let tesseract = TesseractCli::new(
            config.tesseract_path.clone(),
            Duration::from_secs(config.ocr_timeout_secs),
        );
        let renderer = PdfiumRenderer::new(config.pdfium_library_path.clone());
        let ocr = DocumentOcr::new(Arc::new(tesseract)).with_page_renderer(Arc::new(renderer));
        Self::new(caller, Arc::new(ocr))
    }
}

/// Build the full application router with all routes and middleware.
///
/// Extracted from `main()` so integration tests can construct the app
/// without binding to a TCP port.
pub fn build_app(state: AppState, config: &Config) -> Router {
    let rate_limiter = middleware::create_rate_limiter(config.rate_limit_rps);

    // Model-backed routes are rate limited
    let analysis_routes = routes::analysis_routes(config.max_upload_bytes)
        .layer(axum_mw::from_fn(middleware::rate_limit_middleware))
        .layer(Extension(rate_limiter));

    // Install Prometheus metrics recorder.
    // Use build_recorder() + set_global_recorder() so that repeated calls
    // (e.g. in integration tests) don't panic; the second install is
    // silently ignored and we still get a valid handle for /metrics.
    let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
    let prometheus_handle = recorder.handle();
    let _ = metrics::set_global_recorder(recorder);

    let public_routes = Router::new()
        .route("/metadata", get(routes::metadata::get))
        .route("/health", get(routes::health::check))
        .route("/metrics", get(routes::metrics::get))
        .layer(Extension(prometheus_handle));

    // Build CORS layer
    let cors = if config.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Metrics sit on the routes so the matched path is known
    Router::new()
        .merge(public_routes)
        .merge(analysis_routes)
        .route_layer(axum_mw::from_fn(middleware::metrics_middleware))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(axum_mw::from_fn(middleware::request_id_middleware))
        .layer(cors)
}
