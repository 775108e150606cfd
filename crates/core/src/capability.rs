use serde::{Deserialize, Serialize};

use crate::document::DocumentKind;
use crate::run::RunStage;

/// What this service can analyze and how (served at `/metadata`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceCapabilities {
    pub name: String,
    pub version: String,
    pub formats: Vec<String>,
    pub model: String,
    pub stages: Vec<RunStage>,
    pub interpretations: Vec<String>,
}

impl ServiceCapabilities {
    /// Create the capability document for a service using `model`
    pub fn new(model: &str) -> Self {
        Self {
            name: "medisage".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            formats: DocumentKind::supported_extensions()
                .map(str::to_string)
                .collect(),
            model: model.to_string(),
            stages: vec![
                RunStage::TextExtracted,
                RunStage::DataExtracted,
                RunStage::Interpreted,
                RunStage::Summarized,
            ],
            interpretations: ["Low", "Normal", "High", "Unknown"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}
