//! Tabular rendering of interpreted results with per-label color treatment

use serde::Serialize;

use crate::record::{Interpretation, InterpretedTestRecord};

/// Colors used to mark an interpretation cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Highlight {
    pub background: &'static str,
    pub color: &'static str,
}

impl Highlight {
    /// Inline CSS for the cell
    pub fn css(&self) -> String {
        format!("background-color: {}; color: {};", self.background, self.color)
    }
}

/// High is red, Low is blue, Normal is green. Unknown is left unstyled.
pub fn highlight(interpretation: Interpretation) -> Option<Highlight> {
    match interpretation {
        Interpretation::High => Some(Highlight {
            background: "#FFCCCC",
            color: "red",
        }),
        Interpretation::Low => Some(Highlight {
            background: "#CCE5FF",
            color: "blue",
        }),
        Interpretation::Normal => Some(Highlight {
            background: "#D4EDDA",
            color: "green",
        }),
        Interpretation::Unknown => None,
    }
}

/// One row of the results table
#[derive(Debug, Clone, Serialize)]
pub struct TableRow {
    pub test_name: String,
    /// Parsed value, or an empty cell
    pub value: String,
    pub unit: String,
    pub reference_range: String,
    pub interpretation: Interpretation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight: Option<Highlight>,
}

impl From<&InterpretedTestRecord> for TableRow {
    fn from(record: &InterpretedTestRecord) -> Self {
        Self {
            test_name: record.test_name.clone(),
            value: record.value.map(|v| v.to_string()).unwrap_or_default(),
            unit: record.unit.clone().unwrap_or_default(),
            reference_range: record.reference_range.clone().unwrap_or_default(),
            interpretation: record.interpretation,
            highlight: highlight(record.interpretation),
        }
    }
}

pub fn render_table(results: &[InterpretedTestRecord]) -> Vec<TableRow> {
    results.iter().map(TableRow::from).collect()
}
