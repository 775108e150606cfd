//! Integration tests for the MediSage server.
//!
//! The router is driven in-process through `tower::ServiceExt::oneshot`, with a
//! scripted language model and a fixed-text OCR engine standing in for Claude
//! and Tesseract.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{Value as JsonValue, json};
use tower::ServiceExt;

use medisage_core::{ModelError, OcrError};
use medisage_server::{
    AppState,
    ai::{ModelCaller, StubModel},
    build_app,
    config::Config,
    ocr::{DocumentOcr, EchoRecognizer, FixedTextOcr, StubPageRenderer},
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const BOUNDARY: &str = "medisage-test-boundary";

const REPORT_TEXT: &str = "Hemoglobin 13.5 g/dL 12-16\nWBC 12000 /uL 4000-11000";

const EXTRACTION: &str = r#"Here is the data:
[
  {"test_name": "Hemoglobin", "value": "13.5", "unit": "g/dL", "reference_range": "12-16"},
  {"test_name": "WBC", "value": 12000, "unit": "/uL", "reference_range": "4000-11000"}
]"#;

fn test_config() -> Config {
    Config {
        bind_address: "0.0.0.0:0".to_string(),
        cors_origins: vec!["*".to_string()],
        rate_limit_rps: 1000,
        anthropic_api_key: "sk-test".to_string(),
        model: "stub".to_string(),
        model_max_tokens: 1024,
        model_timeout_secs: 5,
        tesseract_path: "tesseract".to_string(),
        pdfium_library_path: None,
        ocr_timeout_secs: 5,
        max_upload_bytes: 1024 * 1024,
    }
}

/// Build the app router around a scripted model and OCR engine.
fn test_app_with(model: Arc<StubModel>, ocr: FixedTextOcr, config: &Config) -> Router {
    let caller = ModelCaller::new(model, Duration::from_secs(config.model_timeout_secs))
        .with_retry_backoff(Duration::ZERO);
    build_app(AppState::new(caller, Arc::new(ocr)), config)
}

fn test_app(model: Arc<StubModel>, ocr: FixedTextOcr) -> Router {
    test_app_with(model, ocr, &test_config())
}

/// Send a request to the app and return (status, body as JSON).
async fn request(app: &Router, req: Request<Body>) -> (StatusCode, JsonValue) {
    let response = app.clone().oneshot(req).await.expect("Request failed");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();

    let body = if bytes.is_empty() {
        JsonValue::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null)
    };

    (status, body)
}

/// Build a GET request.
fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Build a POST request with JSON body.
fn post(uri: &str, body: JsonValue) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

/// Build a multipart POST to /analyze carrying one file in the `file` field.
fn upload(filename: &str, contents: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
            filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(contents);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/analyze")
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

// ---------------------------------------------------------------------------
// Health, metadata and metrics
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_reports_healthy_when_ocr_available() {
    let app = test_app(Arc::new(StubModel::new()), FixedTextOcr::new(REPORT_TEXT));
    let (status, body) = request(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["ocr_engine"], "fixed-text");
}

#[tokio::test]
async fn health_reports_degraded_without_ocr() {
    let ocr = FixedTextOcr::failing(OcrError::EngineUnavailable("not installed".into()));
    let app = test_app(Arc::new(StubModel::new()), ocr);
    let (status, body) = request(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert!(body["reason"].is_string());
}

#[tokio::test]
async fn metadata_lists_formats_and_model() {
    let app = test_app(Arc::new(StubModel::new()), FixedTextOcr::new(REPORT_TEXT));
    let (status, body) = request(&app, get("/metadata")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "medisage");
    assert_eq!(body["model"], "stub");
    assert_eq!(body["formats"], json!(["pdf", "png", "jpg", "jpeg"]));
    assert_eq!(
        body["interpretations"],
        json!(["Low", "Normal", "High", "Unknown"])
    );
}

#[tokio::test]
async fn responses_carry_request_id() {
    let app = test_app(Arc::new(StubModel::new()), FixedTextOcr::new(REPORT_TEXT));

    let req = Request::builder()
        .uri("/health")
        .header("X-Request-ID", "abc-123")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "abc-123");

    let response = app.oneshot(get("/health")).await.unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn metrics_endpoint_renders_text() {
    let app = test_app(Arc::new(StubModel::new()), FixedTextOcr::new(REPORT_TEXT));
    let response = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

#[tokio::test]
async fn analyze_returns_interpreted_results_and_summary() {
    let model = Arc::new(
        StubModel::new()
            .with_response(EXTRACTION)
            .with_response("Your white cell count is slightly high."),
    );
    let app = test_app(model.clone(), FixedTextOcr::new(REPORT_TEXT));

    let (status, body) = request(&app, upload("report.pdf", b"%PDF-1.4")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stage"], "summarized");
    assert_eq!(body["filename"], "report.pdf");
    assert_eq!(body["raw_text"], REPORT_TEXT);
    assert!(body["raw_extraction"].as_str().unwrap().starts_with('['));
    assert!(body["run_id"].is_string());
    assert!(body["analyzed_at"].is_string());

    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["test_name"], "Hemoglobin");
    assert_eq!(results[0]["value"], 13.5);
    assert_eq!(results[0]["interpretation"], "Normal");
    assert_eq!(results[1]["interpretation"], "High");

    assert_eq!(body["counts"]["normal"], 1);
    assert_eq!(body["counts"]["high"], 1);
    assert_eq!(body["table"][1]["highlight"]["color"], "red");
    assert!(body["table"][0]["highlight"].is_object());
    assert_eq!(body["summary"], "Your white cell count is slightly high.");

    assert_eq!(model.calls(), 2);
    assert!(model.prompts()[0].contains(REPORT_TEXT));
}

#[tokio::test]
async fn analyze_accepts_uppercase_image_extension() {
    let model = Arc::new(StubModel::new().with_response("[]").with_response("No results."));
    let app = test_app(model, FixedTextOcr::new(REPORT_TEXT));

    let (status, body) = request(&app, upload("SCAN.JPG", b"\xff\xd8\xff")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"], json!([]));
    assert_eq!(body["summary"], "No results.");
}

#[tokio::test]
async fn scanned_pdf_is_recognized_page_by_page() {
    let model = Arc::new(StubModel::new().with_response("[]").with_response("No results."));
    let caller = ModelCaller::new(model.clone(), Duration::from_secs(5))
        .with_retry_backoff(Duration::ZERO);
    let ocr = DocumentOcr::new(Arc::new(EchoRecognizer)).with_page_renderer(Arc::new(
        StubPageRenderer::new(&["Hemoglobin 13.5 g/dL 12-16", "WBC 12000 /uL 4000-11000"]),
    ));
    let app = build_app(AppState::new(caller, Arc::new(ocr)), &test_config());

    let (status, body) = request(&app, upload("scan.pdf", b"image-only pdf")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["raw_text"], REPORT_TEXT);
    assert!(model.prompts()[0].contains("WBC 12000 /uL 4000-11000"));
}

#[tokio::test]
async fn analyze_rejects_unsupported_format() {
    let model = Arc::new(StubModel::new());
    let app = test_app(model.clone(), FixedTextOcr::new(REPORT_TEXT));

    let (status, body) = request(&app, upload("report.docx", b"PK")).await;

    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body["kind"], "unsupported_format");
    assert_eq!(body["stage"], "text_extraction");
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn analyze_reports_ocr_failure() {
    let model = Arc::new(StubModel::new());
    let ocr = FixedTextOcr::failing(OcrError::NoText("blank page".into()));
    let app = test_app(model.clone(), ocr);

    let (status, body) = request(&app, upload("blank.png", b"\x89PNG")).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "ocr");
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn malformed_extraction_returns_raw_output() {
    let model = Arc::new(StubModel::new().with_response("Sorry, I could not find any lab values."));
    let app = test_app(model.clone(), FixedTextOcr::new(REPORT_TEXT));

    let (status, body) = request(&app, upload("report.pdf", b"%PDF-1.4")).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "extraction_format");
    assert_eq!(body["stage"], "interpretation");
    assert_eq!(body["raw_text"], REPORT_TEXT);
    assert!(body["run_id"].is_string());
    // Summary is never attempted
    assert_eq!(model.calls(), 1);
}

#[tokio::test]
async fn permanent_model_failure_is_bad_gateway() {
    let model = Arc::new(StubModel::new().with_error(ModelError::Permanent("invalid api key".into())));
    let app = test_app(model.clone(), FixedTextOcr::new(REPORT_TEXT));

    let (status, body) = request(&app, upload("report.pdf", b"%PDF-1.4")).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["kind"], "model_permanent");
    assert_eq!(body["stage"], "data_extraction");
    assert_eq!(model.calls(), 1);
}

#[tokio::test]
async fn transient_summary_failure_is_retried_then_reported() {
    let model = Arc::new(
        StubModel::new()
            .with_response(EXTRACTION)
            .with_error(ModelError::Transient("overloaded".into()))
            .with_error(ModelError::Transient("overloaded".into())),
    );
    let app = test_app(model.clone(), FixedTextOcr::new(REPORT_TEXT));

    let (status, body) = request(&app, upload("report.pdf", b"%PDF-1.4")).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["kind"], "model_transient");
    assert_eq!(body["stage"], "summarization");
    assert_eq!(model.calls(), 3);
}

#[tokio::test]
async fn analyze_without_file_field_is_bad_request() {
    let app = test_app(Arc::new(StubModel::new()), FixedTextOcr::new(REPORT_TEXT));

    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nhello\r\n--{b}--\r\n",
        b = BOUNDARY
    );
    let req = Request::builder()
        .method("POST")
        .uri("/analyze")
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap();

    let (status, body) = request(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid");
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let config = Config {
        max_upload_bytes: 64,
        ..test_config()
    };
    let app = test_app_with(
        Arc::new(StubModel::new()),
        FixedTextOcr::new(REPORT_TEXT),
        &config,
    );

    let (status, _) = request(&app, upload("report.pdf", &[b'x'; 1024])).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn analysis_routes_are_rate_limited() {
    let config = Config {
        rate_limit_rps: 1,
        ..test_config()
    };
    let model = Arc::new(StubModel::new().with_response("[]").with_response("Nothing to report."));
    let app = test_app_with(model, FixedTextOcr::new(REPORT_TEXT), &config);

    let (status, _) = request(&app, upload("report.pdf", b"%PDF-1.4")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = request(&app, upload("report.pdf", b"%PDF-1.4")).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["kind"], "throttled");

    // Public routes are not limited
    let (status, _) = request(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

#[tokio::test]
async fn chat_answers_using_supplied_results() {
    let model = Arc::new(StubModel::new().with_response("A WBC of 12000 can indicate infection."));
    let app = test_app(model.clone(), FixedTextOcr::new(REPORT_TEXT));

    let (status, body) = request(
        &app,
        post(
            "/chat",
            json!({
                "question": "What does high WBC mean?",
                "results": [{
                    "test_name": "WBC",
                    "value": 12000.0,
                    "unit": "/uL",
                    "reference_range": "4000-11000",
                    "interpretation": "High"
                }]
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"], "A WBC of 12000 can indicate infection.");

    let prompt = &model.prompts()[0];
    assert!(prompt.contains("What does high WBC mean?"));
    assert!(prompt.contains("4000-11000"));
    assert!((model.params()[0].temperature - 0.7).abs() < f32::EPSILON);
}

#[tokio::test]
async fn chat_rejects_blank_question() {
    let model = Arc::new(StubModel::new());
    let app = test_app(model.clone(), FixedTextOcr::new(REPORT_TEXT));

    let (status, body) = request(&app, post("/chat", json!({ "question": "   ", "results": [] }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid");
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn chat_model_timeout_is_gateway_timeout() {
    let timeout = ModelError::Timeout(Duration::from_secs(5));
    let model = Arc::new(StubModel::new().with_error(timeout.clone()).with_error(timeout));
    let app = test_app(model.clone(), FixedTextOcr::new(REPORT_TEXT));

    let (status, body) = request(&app, post("/chat", json!({ "question": "Is this bad?" }))).await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["kind"], "model_timeout");
    assert_eq!(body["stage"], "answering");
    assert_eq!(model.calls(), 2);
}
