//! Follow-up questions answered against interpreted results

use medisage_core::{InterpretedTestRecord, ModelError};

use super::summary::serialize_results;
use super::{CompletionParams, ModelCaller};

const TEMPERATURE: f32 = 0.7;

/// Answers one question at a time. No conversation history is kept.
#[derive(Clone)]
pub struct ChatGateway {
    caller: ModelCaller,
}

impl ChatGateway {
    pub fn new(caller: ModelCaller) -> Self {
        Self { caller }
    }

    pub async fn answer(
        &self,
        question: &str,
        context: &[InterpretedTestRecord],
    ) -> Result<String, ModelError> {
        let prompt = build_prompt(question, context);
        self.caller
            .complete(
                "chat",
                &prompt,
                CompletionParams {
                    temperature: TEMPERATURE,
                },
            )
            .await
    }
}

pub fn build_prompt(question: &str, context: &[InterpretedTestRecord]) -> String {
    format!(
        "You are a medical assistant. Based on the following lab report interpretation:\n\
         {}\n\n\
         Patient question: {}\n\n\
         Provide a helpful, medically informed answer.",
        serialize_results(context),
        question
    )
}
