//! PDF page rendering through PDFium
//!
//! The `Pdfium` handle is `!Send`, so every call binds the library afresh.
//! The OS caches the dynamic library load after the first call.

use std::io::Cursor;

use image::ImageOutputFormat;
use medisage_core::OcrError;
use pdfium_render::prelude::*;

use super::PdfPageRenderer;

/// Resolution used for OCR input
pub const RENDER_DPI: u32 = 300;

/// Cap on either rendered dimension
const MAX_DIMENSION_PX: u32 = 4096;

const POINTS_PER_INCH: f32 = 72.0;

/// Renders PDF pages to PNG with the PDFium library
#[derive(Debug, Clone, Default)]
pub struct PdfiumRenderer {
    library_path: Option<String>,
}

impl PdfiumRenderer {
    /// `library_path` points at the PDFium shared library; `None` searches
    /// the system library paths
    pub fn new(library_path: Option<String>) -> Self {
        Self { library_path }
    }

    fn load(&self) -> Result<Pdfium, OcrError> {
        let bindings = match &self.library_path {
            Some(path) => Pdfium::bind_to_library(path),
            None => Pdfium::bind_to_system_library(),
        }
        .map_err(|e| OcrError::EngineUnavailable(format!("PDFium library not loadable: {}", e)))?;

        Ok(Pdfium::new(bindings))
    }
}

fn load_error(e: PdfiumError) -> OcrError {
    OcrError::Unreadable(format!("Failed to open PDF: {}", e))
}

/// Pixel size for a page of `width` x `height` points, scaled down to fit
/// [`MAX_DIMENSION_PX`] with the aspect ratio kept
fn render_dimensions(width: f32, height: f32, dpi: u32) -> (u32, u32) {
    let scale = dpi as f32 / POINTS_PER_INCH;
    let w = (width * scale).max(1.0);
    let h = (height * scale).max(1.0);

    let longest = w.max(h);
    let ratio = if longest > MAX_DIMENSION_PX as f32 {
        MAX_DIMENSION_PX as f32 / longest
    } else {
        1.0
    };

    let clamp = |v: f32| ((v * ratio).round() as u32).clamp(1, MAX_DIMENSION_PX);
    (clamp(w), clamp(h))
}

impl PdfPageRenderer for PdfiumRenderer {
    fn page_count(&self, pdf: &[u8]) -> Result<usize, OcrError> {
        let pdfium = self.load()?;
        let document = pdfium.load_pdf_from_byte_slice(pdf, None).map_err(load_error)?;
        Ok(document.pages().len() as usize)
    }

    fn render_page(&self, pdf: &[u8], page: usize) -> Result<Vec<u8>, OcrError> {
        let pdfium = self.load()?;
        let document = pdfium.load_pdf_from_byte_slice(pdf, None).map_err(load_error)?;

        let index = u16::try_from(page)
            .map_err(|_| OcrError::Unreadable(format!("page index {} out of range", page)))?;
        let pages = document.pages();
        let pdf_page = pages.get(index).map_err(|e| {
            OcrError::Unreadable(format!("page {} of {}: {}", page + 1, pages.len(), e))
        })?;

        let (width, height) =
            render_dimensions(pdf_page.width().value, pdf_page.height().value, RENDER_DPI);
        let config = PdfRenderConfig::new()
            .set_target_width(width as i32)
            .set_maximum_height(height as i32);

        let bitmap = pdf_page
            .render_with_config(&config)
            .map_err(|e| OcrError::Unreadable(format!("page {} did not render: {}", page + 1, e)))?;

        let mut png = Cursor::new(Vec::new());
        bitmap
            .as_image()
            .write_to(&mut png, ImageOutputFormat::Png)
            .map_err(|e| OcrError::Unreadable(format!("page {} PNG encoding: {}", page + 1, e)))?;

        let png = png.into_inner();
        tracing::debug!(page = page + 1, width, height, bytes = png.len(), "Rendered PDF page");
        Ok(png)
    }
}
