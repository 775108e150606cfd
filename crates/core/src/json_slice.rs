//! Best-effort recovery of a JSON array from free-form model output
//!
//! Models often wrap the requested JSON in prose or markdown fences. The
//! extractor takes everything from the first `[` to the last `]`, inclusive.
//! Known failure modes:
//!
//! - no `[` at all, or no `]` after the first `[`: nothing is found;
//! - prose containing brackets before or after the array widens the slice;
//! - several separate arrays are merged into one slice (`[1] and [2]`).
//!
//! The slice is not validated. JSON parsing downstream is the only gate.

/// Result of scanning model output for a JSON array
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonSlice<'a> {
    /// Text from the first `[` to the last `]`, inclusive
    Found(&'a str),
    /// No bracket pair in the text
    Missing,
}

impl<'a> JsonSlice<'a> {
    /// The recovered slice, or an empty string when nothing was found
    pub fn as_str(&self) -> &'a str {
        match self {
            JsonSlice::Found(s) => s,
            JsonSlice::Missing => "",
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, JsonSlice::Found(_))
    }
}

/// Extract the substring between the first `[` and the last `]`
pub fn extract_json_array(text: &str) -> JsonSlice<'_> {
    let Some(start) = text.find('[') else {
        return JsonSlice::Missing;
    };

    match text.rfind(']') {
        Some(end) if end > start => JsonSlice::Found(&text[start..=end]),
        _ => JsonSlice::Missing,
    }
}
