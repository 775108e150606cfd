//! medisage-core: lab-report domain types and interpretation
//!
//! This crate holds everything about a lab-report analysis that does not
//! touch the network or the filesystem: test records, value and range
//! parsing, classification, the run state machine, and failure documents.

pub mod capability;
pub mod display;
pub mod document;
pub mod error;
pub mod interpret;
pub mod json_slice;
pub mod outcome;
pub mod parse;
pub mod record;
pub mod run;

pub use capability::ServiceCapabilities;
pub use display::{Highlight, TableRow, highlight, render_table};
pub use document::DocumentKind;
pub use error::{ExtractionFormatError, ModelError, OcrError, PipelineError, Stage};
pub use interpret::{
    InterpretationCounts, classify, interpret, interpret_json, interpret_record, parse_records,
};
pub use json_slice::{JsonSlice, extract_json_array};
pub use outcome::{FailureKind, FailureOutcome};
pub use parse::{parse_range, parse_value, parse_value_text};
pub use record::{Interpretation, InterpretedTestRecord, LabValue, NumericRange, RawTestRecord};
pub use run::{AnalysisRun, RunStage};
