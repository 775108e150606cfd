//! Numeric parsing of free-text lab values and reference ranges

use regex::Regex;
use std::sync::LazyLock;

use crate::record::{LabValue, NumericRange};

/// ASCII digits with at most one decimal point, which may lead (".5") or
/// trail ("5."). Signs are not part of a match.
static DECIMAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)").expect("decimal pattern is valid")
});

/// Parse the first decimal number out of a lab value ("12.5 mg/dL" -> 12.5)
pub fn parse_value(raw: &LabValue) -> Option<f64> {
    parse_value_text(&raw.to_text())
}

/// Text form of [`parse_value`]. Only the first number is used.
pub fn parse_value_text(raw: &str) -> Option<f64> {
    DECIMAL.find(raw)?.as_str().parse().ok()
}

/// Parse a reference range ("70-110", "13.0 - 17.0 g/dL") into numeric bounds.
///
/// The first two numbers in the text become `low` and `high`, in that order,
/// even when the text lists them backwards.
pub fn parse_range(raw: Option<&str>) -> Option<NumericRange> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }

    let mut numbers = DECIMAL.find_iter(raw).map(|m| m.as_str().parse::<f64>());
    let low = numbers.next()?.ok()?;
    let high = numbers.next()?.ok()?;

    Some(NumericRange { low, high })
}
