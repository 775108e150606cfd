//! Document text extraction
//!
//! PDFs are read through their text layer. When a PDF has no usable text
//! layer (a scan), each page is rendered to an image and recognized in page
//! order. Images go straight to the recognizer.

pub mod pdf;
pub mod render;
pub mod stub;
pub mod tesseract;

pub use medisage_core::DocumentKind;
pub use render::PdfiumRenderer;
pub use stub::{EchoRecognizer, FixedTextOcr, StubPageRenderer};
pub use tesseract::TesseractCli;

use async_trait::async_trait;
use medisage_core::OcrError;
use std::sync::Arc;

/// An uploaded document
#[derive(Debug, Clone)]
pub struct Document {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Turns document bytes into text
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Extract all text, concatenating pages in page order
    async fn extract_text(&self, bytes: &[u8], kind: DocumentKind) -> Result<String, OcrError>;

    /// Whether image OCR can currently run
    async fn is_available(&self) -> bool;

    fn name(&self) -> &'static str;
}

/// Recognizes the text in one image
#[async_trait]
pub trait ImageRecognizer: Send + Sync {
    async fn recognize(&self, image: &[u8]) -> Result<String, OcrError>;

    /// Whether the recognizer can run at all
    async fn probe(&self) -> bool;
}

/// Renders PDF pages to PNG images. Blocking; called on the blocking pool.
pub trait PdfPageRenderer: Send + Sync {
    fn page_count(&self, pdf: &[u8]) -> Result<usize, OcrError>;

    /// Render the zero-based page `page`
    fn render_page(&self, pdf: &[u8], page: usize) -> Result<Vec<u8>, OcrError>;
}

/// PDF text layer, with page rendering for scans, plus image recognition
pub struct DocumentOcr {
    images: Arc<dyn ImageRecognizer>,
    renderer: Option<Arc<dyn PdfPageRenderer>>,
}

impl DocumentOcr {
    pub fn new(images: Arc<dyn ImageRecognizer>) -> Self {
        Self {
            images,
            renderer: None,
        }
    }

    /// OCR PDF pages through `renderer` when the text layer is unusable
    pub fn with_page_renderer(mut self, renderer: Arc<dyn PdfPageRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    async fn extract_pdf(&self, bytes: &[u8]) -> Result<String, OcrError> {
        let err = match pdf::extract_text(bytes.to_vec()).await {
            Ok(text) => return Ok(text),
            Err(err @ (OcrError::NoText(_) | OcrError::Unreadable(_))) => err,
            Err(err) => return Err(err),
        };

        let Some(renderer) = self.renderer.clone() else {
            return Err(err);
        };

        tracing::info!(reason = %err, "PDF text layer unusable, recognizing rendered pages");
        match self.recognize_pages(renderer, bytes).await {
            Err(OcrError::EngineUnavailable(reason)) => {
                tracing::warn!(reason = %reason, "PDF page rendering unavailable");
                Err(err)
            }
            result => result,
        }
    }

    /// Render every page and recognize it, joining the text in page order
    async fn recognize_pages(
        &self,
        renderer: Arc<dyn PdfPageRenderer>,
        bytes: &[u8],
    ) -> Result<String, OcrError> {
        let pdf: Arc<[u8]> = Arc::from(bytes);

        let count = {
            let renderer = renderer.clone();
            let pdf = pdf.clone();
            blocking(move || renderer.page_count(&pdf)).await?
        };
        if count == 0 {
            return Err(OcrError::NoText("PDF has no pages".to_string()));
        }

        let mut pages = Vec::with_capacity(count);
        for page in 0..count {
            let image = {
                let renderer = renderer.clone();
                let pdf = pdf.clone();
                blocking(move || renderer.render_page(&pdf, page)).await?
            };

            // A blank page is not a failure of the whole document
            let text = match self.images.recognize(&image).await {
                Ok(text) => text,
                Err(OcrError::NoText(_)) => String::new(),
                Err(e) => return Err(e),
            };
            tracing::debug!(page = page + 1, chars = text.len(), "Recognized PDF page");
            pages.push(text.trim_end().to_string());
        }

        if pages.iter().all(|text| text.trim().is_empty()) {
            return Err(OcrError::NoText(format!(
                "no text recognized on any of {} pages",
                count
            )));
        }

        Ok(pages.join("\n"))
    }
}

async fn blocking<T, F>(f: F) -> Result<T, OcrError>
where
    F: FnOnce() -> Result<T, OcrError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| OcrError::Unreadable(format!("PDF renderer crashed: {}", e)))?
}

#[async_trait]
impl OcrEngine for DocumentOcr {
    async fn extract_text(&self, bytes: &[u8], kind: DocumentKind) -> Result<String, OcrError> {
        if kind.is_image() {
            self.images.recognize(bytes).await
        } else {
            self.extract_pdf(bytes).await
        }
    }

    async fn is_available(&self) -> bool {
        self.images.probe().await
    }

    fn name(&self) -> &'static str {
        "pdf-text+tesseract"
    }
}
