//! Accepted document formats

use serde::Serialize;

use crate::error::OcrError;

/// Document format, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Pdf,
    Png,
    Jpeg,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 3] = [DocumentKind::Pdf, DocumentKind::Png, DocumentKind::Jpeg];

    /// Lowercase file extensions that map to this kind
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            DocumentKind::Pdf => &["pdf"],
            DocumentKind::Png => &["png"],
            DocumentKind::Jpeg => &["jpg", "jpeg"],
        }
    }

    /// Every accepted extension, in [`DocumentKind::ALL`] order
    pub fn supported_extensions() -> impl Iterator<Item = &'static str> {
        Self::ALL.into_iter().flat_map(|kind| kind.extensions().iter().copied())
    }

    /// Dispatch on the (case-insensitive) extension of `filename`
    pub fn from_filename(filename: &str) -> Result<Self, OcrError> {
        let extension = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        Self::ALL
            .into_iter()
            .find(|kind| kind.extensions().iter().any(|ext| *ext == extension))
            .ok_or_else(|| OcrError::UnsupportedFormat(filename.to_string()))
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => "application/pdf",
            DocumentKind::Png => "image/png",
            DocumentKind::Jpeg => "image/jpeg",
        }
    }

    pub fn is_image(&self) -> bool {
        !matches!(self, DocumentKind::Pdf)
    }
}
