//! Deterministic language model for tests and offline runs

use async_trait::async_trait;
use medisage_core::ModelError;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use super::{CompletionParams, LanguageModel};

/// Replays queued responses in order and records every prompt it receives.
///
/// When the queue is empty, calls fail with a permanent error.
#[derive(Default)]
pub struct StubModel {
    responses: Mutex<VecDeque<Result<String, ModelError>>>,
    prompts: Mutex<Vec<(String, CompletionParams)>>,
    delay: Option<Duration>,
}

impl StubModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful completion
    pub fn with_response(self, text: &str) -> Self {
        self.push(Ok(text.to_string()));
        self
    }

    /// Queue a failed completion
    pub fn with_error(self, err: ModelError) -> Self {
        self.push(Err(err));
        self
    }

    /// Sleep before answering each call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Prompts received so far, oldest first
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).iter().map(|(p, _)| p.clone()).collect()
    }

    /// Sampling parameters received so far, oldest first
    pub fn params(&self) -> Vec<CompletionParams> {
        lock(&self.prompts).iter().map(|(_, params)| *params).collect()
    }

    pub fn calls(&self) -> usize {
        lock(&self.prompts).len()
    }

    fn push(&self, response: Result<String, ModelError>) {
        lock(&self.responses).push_back(response);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl LanguageModel for StubModel {
    async fn complete(&self, prompt: &str, params: CompletionParams) -> Result<String, ModelError> {
        lock(&self.prompts).push((prompt.to_string(), params));
        let response = lock(&self.responses).pop_front();

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        response.unwrap_or_else(|| {
            Err(ModelError::Permanent(
                "stub model has no response queued".to_string(),
            ))
        })
    }

    fn model_id(&self) -> &str {
        "stub"
    }
}
