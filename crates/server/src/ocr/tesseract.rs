//! Image OCR through the Tesseract command-line tool

use async_trait::async_trait;
use medisage_core::OcrError;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::ImageRecognizer;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Runs `tesseract stdin stdout` on image bytes
#[derive(Debug, Clone)]
pub struct TesseractCli {
    program: String,
    timeout: Duration,
}

impl TesseractCli {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    /// Recognize the text in an image
    pub async fn recognize(&self, image: &[u8]) -> Result<String, OcrError> {
        let mut child = Command::new(&self.program)
            .args(["stdin", "stdout"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| OcrError::EngineUnavailable("tesseract stdin not captured".into()))?;

        // Feed stdin concurrently so a large image cannot deadlock on full pipes
        let input = image.to_vec();
        let writer = tokio::spawn(async move {
            let result = stdin.write_all(&input).await;
            drop(stdin);
            result
        });

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| OcrError::Timeout(self.timeout))?
            .map_err(|e| OcrError::Unreadable(format!("tesseract failed: {}", e)))?;

        if let Ok(Err(e)) = writer.await {
            tracing::debug!(error = %e, "tesseract closed stdin early");
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::Unreadable(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        if text.trim().is_empty() {
            return Err(OcrError::NoText("no text recognized in image".to_string()));
        }

        tracing::debug!(chars = text.len(), "Recognized image text");
        Ok(text)
    }

    /// Check that the binary runs
    pub async fn probe(&self) -> bool {
        let status = Command::new(&self.program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status();

        matches!(
            tokio::time::timeout(PROBE_TIMEOUT, status).await,
            Ok(Ok(status)) if status.success()
        )
    }

    fn spawn_error(&self, err: std::io::Error) -> OcrError {
        if err.kind() == std::io::ErrorKind::NotFound {
            OcrError::EngineUnavailable(format!("'{}' not found on PATH", self.program))
        } else {
            OcrError::EngineUnavailable(format!("failed to start '{}': {}", self.program, err))
        }
    }
}

#[async_trait]
impl ImageRecognizer for TesseractCli {
    async fn recognize(&self, image: &[u8]) -> Result<String, OcrError> {
        TesseractCli::recognize(self, image).await
    }

    async fn probe(&self) -> bool {
        TesseractCli::probe(self).await
    }
}
