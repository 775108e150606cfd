//! Lab test records as produced by the model and after interpretation

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A lab value as reported by the model: either free text ("95 mg/dL") or a bare number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LabValue {
    Number(f64),
    Text(String),
}

impl LabValue {
    /// Text form of the value, the input to value parsing
    pub fn to_text(&self) -> String {
        match self {
            LabValue::Number(n) => n.to_string(),
            LabValue::Text(s) => s.clone(),
        }
    }
}

impl From<&str> for LabValue {
    fn from(s: &str) -> Self {
        LabValue::Text(s.to_string())
    }
}

impl From<f64> for LabValue {
    fn from(n: f64) -> Self {
        LabValue::Number(n)
    }
}

/// One test result as extracted by the model.
///
/// Nothing about the model output is trusted: build these with
/// [`RawTestRecord::from_json`], which coerces any JSON value into a record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTestRecord {
    #[serde(default)]
    pub test_name: String,
    #[serde(default)]
    pub value: Option<LabValue>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub reference_range: Option<String>,
}

impl RawTestRecord {
    /// Coerce an arbitrary JSON element into a record.
    ///
    /// Missing or null fields become `None` (an empty `test_name`), numbers in
    /// text fields are rendered as decimal text, and any other non-string
    /// JSON is kept as its JSON text. A non-object element yields an empty record.
    pub fn from_json(element: &JsonValue) -> Self {
        let Some(obj) = element.as_object() else {
            return Self::default();
        };

        let value = match obj.get("value") {
            None | Some(JsonValue::Null) => None,
            Some(JsonValue::Number(n)) => n.as_f64().map(LabValue::Number),
            Some(other) => text_field(Some(other)).map(LabValue::Text),
        };

        Self {
            test_name: text_field(obj.get("test_name")).unwrap_or_default(),
            value,
            unit: text_field(obj.get("unit")),
            reference_range: text_field(obj.get("reference_range")),
        }
    }
}

/// Render a JSON field as text; null and absent fields are `None`
fn text_field(field: Option<&JsonValue>) -> Option<String> {
    match field? {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

/// Interpretation label assigned to each test result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interpretation {
    Low,
    Normal,
    High,
    Unknown,
}

impl Interpretation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interpretation::Low => "Low",
            Interpretation::Normal => "Normal",
            Interpretation::High => "High",
            Interpretation::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for Interpretation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A test result after classification against its reference range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterpretedTestRecord {
    pub test_name: String,
    pub value: Option<f64>,
    pub unit: Option<String>,
    pub reference_range: Option<String>,
    pub interpretation: Interpretation,
}

/// Numeric bounds parsed from a reference-range string.
///
/// Bounds are taken in textual order and never reordered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericRange {
    pub low: f64,
    pub high: f64,
}

impl NumericRange {
    /// True when the range text listed the larger bound first (e.g. "10-5")
    pub fn is_inverted(&self) -> bool {
        self.low > self.high
    }
}
