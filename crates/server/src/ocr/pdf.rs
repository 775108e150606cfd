//! PDF text-layer extraction

use medisage_core::OcrError;

/// Extract the text layer of every page, in page order.
///
/// Runs on the blocking pool; a panic inside the PDF parser is reported as
/// an unreadable document.
pub async fn extract_text(bytes: Vec<u8>) -> Result<String, OcrError> {
    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| OcrError::Unreadable(format!("PDF parser crashed: {}", e)))?
        .map_err(|e| OcrError::Unreadable(format!("Failed to read PDF: {}", e)))?;

    if text.trim().is_empty() {
        return Err(OcrError::NoText("PDF has no text layer".to_string()));
    }

    tracing::debug!(chars = text.len(), "Extracted PDF text layer");
    Ok(text)
}
