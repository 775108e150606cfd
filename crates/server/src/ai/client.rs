//! Claude API client for the Anthropic Messages API

use async_trait::async_trait;
use medisage_core::ModelError;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use super::{CompletionParams, LanguageModel};

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";

/// Client for the Anthropic Claude Messages API
#[derive(Clone)]
pub struct ClaudeClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    max_tokens: u32,
}

/// A message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

/// Individual content block within a response
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

/// Request body for the Messages API
#[derive(Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message>,
}

/// Response from the Messages API
#[derive(Debug, Deserialize)]
pub struct ApiResponse {
    #[allow(dead_code)]
    pub id: String,
    pub content: Vec<ContentBlock>,
}

/// Error detail from the Messages API
#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl ClaudeClient {
    /// Create a new client with the given API key and model id
    pub fn new(api_key: String, model: String, max_tokens: u32) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            model,
            max_tokens,
        }
    }

    /// Send a single-turn request and return the parsed response
    async fn send(&self, prompt: &str, temperature: f32) -> Result<ApiResponse, ModelError> {
        let request = ApiRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature,
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let response = self
            .http
            .post(API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| ModelError::Transient(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ApiError>(&body)
                .map(|api_err| api_err.error.message)
                .unwrap_or(body);
            return Err(classify_status(status, detail));
        }

        response
            .json::<ApiResponse>()
            .await
            .map_err(|e| ModelError::Transient(format!("Failed to parse response: {}", e)))
    }
}

/// Rate limiting and server-side errors may clear up; anything else will not
fn classify_status(status: StatusCode, detail: String) -> ModelError {
    let message = format!("Claude API error ({}): {}", status, detail);
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        ModelError::Transient(message)
    } else {
        ModelError::Permanent(message)
    }
}

/// Extract the first text block from an API response
fn extract_text(response: &ApiResponse) -> Result<String, ModelError> {
    response
        .content
        .iter()
        .find_map(|block| match block {
            ContentBlock::Text { text } => Some(text.clone()),
            ContentBlock::Other => None,
        })
        .ok_or(ModelError::EmptyResponse)
}

#[async_trait]
impl LanguageModel for ClaudeClient {
    async fn complete(&self, prompt: &str, params: CompletionParams) -> Result<String, ModelError> {
        let response = self.send(prompt, params.temperature).await?;
        extract_text(&response)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}
