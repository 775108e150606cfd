//! Language-model collaborators and the gateways built on them

pub mod chat;
pub mod client;
pub mod extraction;
pub mod stub;
pub mod summary;

pub use chat::ChatGateway;
pub use client::ClaudeClient;
pub use extraction::ExtractionGateway;
pub use stub::StubModel;
pub use summary::SummaryGateway;

use async_trait::async_trait;
use medisage_core::ModelError;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Sampling parameters for a single completion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionParams {
    pub temperature: f32,
}

/// A stateless, single-turn text completion service
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, prompt: &str, params: CompletionParams) -> Result<String, ModelError>;

    fn model_id(&self) -> &str;
}

/// Delay before the single retry of a transient failure
const RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Calls a [`LanguageModel`] with a timeout and one retry on transient failure.
///
/// All gateways share one caller so every model call site gets the same policy.
#[derive(Clone)]
pub struct ModelCaller {
    model: Arc<dyn LanguageModel>,
    timeout: Duration,
    retry_backoff: Duration,
}

impl ModelCaller {
    pub fn new(model: Arc<dyn LanguageModel>, timeout: Duration) -> Self {
        Self {
            model,
            timeout,
            retry_backoff: RETRY_BACKOFF,
        }
    }

    /// Override the retry delay (tests use zero)
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    pub fn model_id(&self) -> &str {
        self.model.model_id()
    }

    /// Run one completion on behalf of `gateway`
    pub async fn complete(
        &self,
        gateway: &'static str,
        prompt: &str,
        params: CompletionParams,
    ) -> Result<String, ModelError> {
        match self.attempt(gateway, prompt, params).await {
            Err(e) if e.is_retryable() => {
                tracing::warn!(
                    gateway = gateway,
                    error = %e,
                    backoff_ms = self.retry_backoff.as_millis() as u64,
                    "Model call failed, retrying once"
                );
                tokio::time::sleep(self.retry_backoff).await;
                self.attempt(gateway, prompt, params).await
            }
            result => result,
        }
    }

    async fn attempt(
        &self,
        gateway: &'static str,
        prompt: &str,
        params: CompletionParams,
    ) -> Result<String, ModelError> {
        let start = Instant::now();
        let result = match tokio::time::timeout(self.timeout, self.model.complete(prompt, params))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(ModelError::Timeout(self.timeout)),
        };
        let duration = start.elapsed().as_secs_f64();

        let outcome = match &result {
            Ok(_) => "success",
            Err(ModelError::Transient(_)) => "transient",
            Err(ModelError::Permanent(_)) => "permanent",
            Err(ModelError::Timeout(_)) => "timeout",
            Err(ModelError::EmptyResponse) => "empty",
        };

        metrics::counter!("model_calls_total", "gateway" => gateway, "outcome" => outcome)
            .increment(1);
        metrics::histogram!("model_call_duration_seconds", "gateway" => gateway).record(duration);

        tracing::debug!(
            gateway = gateway,
            model = self.model.model_id(),
            outcome = outcome,
            duration_secs = duration,
            "Model call finished"
        );

        result
    }
}
