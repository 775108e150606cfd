//! Structured lab-result extraction from OCR text

use medisage_core::{ModelError, extract_json_array};

use super::{CompletionParams, ModelCaller};

const PROMPT_TEMPLATE: &str = r#"You are an expert medical assistant.

From the following lab report text, extract all lab test results into a JSON array where each object has exactly these fields:

- test_name (string)
- value (string or number)
- unit (string or null)
- reference_range (string or null)

Return only the JSON array. Do not add any explanation, prose, or markdown.

Report:
{report_text}
"#;

/// Low temperature keeps the structured output stable between runs
const TEMPERATURE: f32 = 0.3;

/// Asks the model for a JSON array of test records
#[derive(Clone)]
pub struct ExtractionGateway {
    caller: ModelCaller,
}

impl ExtractionGateway {
    pub fn new(caller: ModelCaller) -> Self {
        Self { caller }
    }

    /// Return the JSON array text found in the model's reply.
    ///
    /// The text is not validated. When the reply has no bracket pair, the
    /// result is an empty string and parsing it downstream fails.
    pub async fn extract(&self, document_text: &str) -> Result<String, ModelError> {
        let prompt = build_prompt(document_text);
        let response = self
            .caller
            .complete(
                "extraction",
                &prompt,
                CompletionParams {
                    temperature: TEMPERATURE,
                },
            )
            .await?;

        tracing::debug!(raw_output = %response, "Extraction model output");

        let slice = extract_json_array(&response);
        if !slice.is_found() {
            tracing::warn!(
                response_len = response.len(),
                "No JSON array found in extraction output"
            );
        }

        Ok(slice.as_str().to_string())
    }
}

/// Embed the report text in the extraction prompt
pub fn build_prompt(document_text: &str) -> String {
    PROMPT_TEMPLATE.replace("{report_text}", document_text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::StubModel;
    use std::sync::Arc;
    use std::time::Duration;

    fn gateway(model: Arc<StubModel>) -> ExtractionGateway {
        ExtractionGateway::new(ModelCaller::new(model, Duration::from_secs(5)))
    }

    #[test]
    fn prompt_embeds_report_and_fields() {
        let prompt = build_prompt("Glucose 95 mg/dL (70-110)");
        assert!(prompt.contains("Glucose 95 mg/dL (70-110)"));
        for field in ["test_name", "value", "unit", "reference_range"] {
            assert!(prompt.contains(field), "missing {field}");
        }
        assert!(prompt.contains("JSON array"));
    }

    #[test]
    fn prompt_keeps_braces_in_report_text() {
        let prompt = build_prompt("weird {report_text} {} text");
        assert!(prompt.contains("weird {report_text} {} text"));
    }

    #[tokio::test]
    async fn strips_prose_around_array() {
        let model = Arc::new(
            StubModel::new()
                .with_response(r#"Here is the data: [ {"test_name": "WBC"} ] Hope this helps!"#),
        );

        let json = gateway(model.clone()).extract("WBC 15.2").await.unwrap();
        assert_eq!(json, r#"[ {"test_name": "WBC"} ]"#);
        assert!(model.prompts()[0].contains("WBC 15.2"));
        assert_eq!(model.params()[0].temperature, TEMPERATURE);
    }

    #[tokio::test]
    async fn reply_without_array_is_empty() {
        let model = Arc::new(StubModel::new().with_response("I found no lab results."));
        let json = gateway(model).extract("blank page").await.unwrap();
        assert_eq!(json, "");
    }

    #[tokio::test]
    async fn model_failure_propagates() {
        let model = Arc::new(StubModel::new().with_error(ModelError::Permanent("401".into())));
        let err = gateway(model).extract("text").await.unwrap_err();
        assert!(matches!(err, ModelError::Permanent(_)));
    }
}
