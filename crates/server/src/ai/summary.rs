//! Patient-facing summary of interpreted results

use medisage_core::{InterpretedTestRecord, ModelError};

use super::{CompletionParams, ModelCaller};

const PROMPT_TEMPLATE: &str = r#"Given the following interpreted lab results, summarize them in simple, friendly language a patient can understand.

Structured data:
{structured_data}

Summary:
"#;

const TEMPERATURE: f32 = 0.3;

#[derive(Clone)]
pub struct SummaryGateway {
    caller: ModelCaller,
}

impl SummaryGateway {
    pub fn new(caller: ModelCaller) -> Self {
        Self { caller }
    }

    /// Returns the model's summary verbatim
    pub async fn summarize(&self, results: &[InterpretedTestRecord]) -> Result<String, ModelError> {
        let prompt = build_prompt(results);
        self.caller
            .complete(
                "summary",
                &prompt,
                CompletionParams {
                    temperature: TEMPERATURE,
                },
            )
            .await
    }
}

pub fn build_prompt(results: &[InterpretedTestRecord]) -> String {
    PROMPT_TEMPLATE.replace("{structured_data}", &serialize_results(results))
}

/// Pretty JSON form of the results shared by the summary and chat prompts
pub(crate) fn serialize_results(results: &[InterpretedTestRecord]) -> String {
    // Serializing plain records and strings cannot fail
    serde_json::to_string_pretty(results).unwrap_or_else(|_| "[]".to_string())
}
