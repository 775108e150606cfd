//! Classification of lab results against their reference ranges

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::ExtractionFormatError;
use crate::parse::{parse_range, parse_value};
use crate::record::{Interpretation, InterpretedTestRecord, NumericRange, RawTestRecord};

/// Classify a value against a range. Both bounds are inclusive.
pub fn classify(value: Option<f64>, range: Option<NumericRange>) -> Interpretation {
    let (Some(value), Some(range)) = (value, range) else {
        return Interpretation::Unknown;
    };

    if value < range.low {
        Interpretation::Low
    } else if value > range.high {
        Interpretation::High
    } else {
        Interpretation::Normal
    }
}

/// Interpret a single record. Unparseable values or ranges yield `Unknown`.
pub fn interpret_record(record: &RawTestRecord) -> InterpretedTestRecord {
    let value = record.value.as_ref().and_then(parse_value);
    let range = parse_range(record.reference_range.as_deref());

    InterpretedTestRecord {
        test_name: record.test_name.clone(),
        value,
        unit: record.unit.clone(),
        reference_range: record.reference_range.clone(),
        interpretation: classify(value, range),
    }
}

/// Interpret every record, preserving order and length
pub fn interpret(records: &[RawTestRecord]) -> Vec<InterpretedTestRecord> {
    records.iter().map(interpret_record).collect()
}

/// Parse the extraction stage's JSON text and interpret it.
///
/// The text must be a JSON array. Anything else fails the whole stage; a
/// malformed element inside the array only degrades that record to `Unknown`.
pub fn interpret_json(json: &str) -> Result<Vec<InterpretedTestRecord>, ExtractionFormatError> {
    let records = parse_records(json)?;
    Ok(interpret(&records))
}

/// Parse the extraction stage's JSON text into raw records
pub fn parse_records(json: &str) -> Result<Vec<RawTestRecord>, ExtractionFormatError> {
    let parsed: JsonValue = serde_json::from_str(json).map_err(|e| ExtractionFormatError {
        message: e.to_string(),
        raw: json.to_string(),
    })?;

    let JsonValue::Array(elements) = parsed else {
        return Err(ExtractionFormatError {
            message: format!("expected a JSON array, got {}", json_kind(&parsed)),
            raw: json.to_string(),
        });
    };

    Ok(elements.iter().map(RawTestRecord::from_json).collect())
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

/// Tally of interpretation labels across a result set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterpretationCounts {
    pub low: usize,
    pub normal: usize,
    pub high: usize,
    pub unknown: usize,
}

impl InterpretationCounts {
    pub fn tally(results: &[InterpretedTestRecord]) -> Self {
        results.iter().fold(Self::default(), |mut counts, r| {
            match r.interpretation {
                Interpretation::Low => counts.low += 1,
                Interpretation::Normal => counts.normal += 1,
                Interpretation::High => counts.high += 1,
                Interpretation::Unknown => counts.unknown += 1,
            }
            counts
        })
    }

    /// Results outside their reference range
    pub fn abnormal(&self) -> usize {
        self.low + self.high
    }
}
