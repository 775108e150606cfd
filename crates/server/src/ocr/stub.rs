use async_trait::async_trait;
use medisage_core::OcrError;
use std::sync::{Arc, Mutex};

use super::{DocumentKind, ImageRecognizer, OcrEngine, PdfPageRenderer};

/// OCR engine that returns the same text (or error) for every document
pub struct FixedTextOcr {
    result: Result<String, OcrError>,
}

impl FixedTextOcr {
    pub fn new(text: &str) -> Self {
        Self {
            result: Ok(text.to_string()),
        }
    }

    pub fn failing(err: OcrError) -> Self {
        Self { result: Err(err) }
    }
}

#[async_trait]
impl OcrEngine for FixedTextOcr {
    async fn extract_text(&self, _bytes: &[u8], _kind: DocumentKind) -> Result<String, OcrError> {
        self.result.clone()
    }

    async fn is_available(&self) -> bool {
        self.result.is_ok()
    }

    fn name(&self) -> &'static str {
        "fixed-text"
    }
}

/// Recognizer that reads the image bytes back as UTF-8 text
pub struct EchoRecognizer;

#[async_trait]
impl ImageRecognizer for EchoRecognizer {
    async fn recognize(&self, image: &[u8]) -> Result<String, OcrError> {
        let text = String::from_utf8_lossy(image).into_owned();
        if text.trim().is_empty() {
            return Err(OcrError::NoText("blank image".to_string()));
        }
        Ok(text)
    }

    async fn probe(&self) -> bool {
        true
    }
}

/// Page renderer whose "images" are fixed byte strings, one per page
#[derive(Clone, Default)]
pub struct StubPageRenderer {
    pages: Arc<Vec<Vec<u8>>>,
    unavailable: bool,
    rendered: Arc<Mutex<Vec<usize>>>,
}

impl StubPageRenderer {
    pub fn new(pages: &[&str]) -> Self {
        Self {
            pages: Arc::new(pages.iter().map(|p| p.as_bytes().to_vec()).collect()),
            ..Self::default()
        }
    }

    /// Renderer whose backing library cannot be loaded
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    /// Pages rendered so far, in call order
    pub fn rendered(&self) -> Vec<usize> {
        self.rendered
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl PdfPageRenderer for StubPageRenderer {
    fn page_count(&self, _pdf: &[u8]) -> Result<usize, OcrError> {
        if self.unavailable {
            return Err(OcrError::EngineUnavailable("stub renderer disabled".to_string()));
        }
        Ok(self.pages.len())
    }

    fn render_page(&self, _pdf: &[u8], page: usize) -> Result<Vec<u8>, OcrError> {
        self.rendered
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(page);
        self.pages
            .get(page)
            .cloned()
            .ok_or_else(|| OcrError::Unreadable(format!("page {} out of range", page)))
    }
}
