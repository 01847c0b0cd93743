//! OCR over image bytes using a `tesseract` subprocess.
//!
//! The engine is stateless between calls: each recognition writes the image
//! to a temp file, runs one bounded `tesseract` invocation, and the temp
//! file is removed when the guard drops, on every exit path.

use std::io::Write;
use std::time::Duration;

use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::debug;

use crate::error::ExtractError;

const OCR_LANGUAGE: &str = "eng";

#[derive(Clone)]
pub struct OcrEngine {
    tesseract_path: String,
    timeout: Duration,
}

impl OcrEngine {
    pub fn new(tesseract_path: impl Into<String>, timeout: Duration) -> Self {
        Self {
            tesseract_path: tesseract_path.into(),
            timeout,
        }
    }

    /// Recognize text in raw image bytes. Returns trimmed recognized text;
    /// any engine failure (spawn, non-zero exit, timeout) is `OcrFailed`.
    pub async fn recognize(&self, data: &[u8]) -> Result<String, ExtractError> {
        if data.is_empty() {
            return Err(ExtractError::OcrFailed("empty image data".to_string()));
        }

        let mut tmpfile = NamedTempFile::new()
            .map_err(|e| ExtractError::OcrFailed(format!("failed to create temp file: {}", e)))?;
        tmpfile
            .write_all(data)
            .map_err(|e| ExtractError::OcrFailed(format!("failed to write temp file: {}", e)))?;
        let image_path = tmpfile.path().to_string_lossy().to_string();

        debug!(image_bytes = data.len(), "Running OCR");

        let mut cmd = Command::new(&self.tesseract_path);
        cmd.arg(&image_path)
            .arg("stdout")
            .arg("-l")
            .arg(OCR_LANGUAGE);

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| {
                ExtractError::OcrFailed(format!(
                    "tesseract timed out after {}s",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| ExtractError::OcrFailed(format!("failed to run tesseract: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractError::OcrFailed(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        debug!(text_len = text.len(), "OCR completed");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_input_fails_fast() {
        let engine = OcrEngine::new("tesseract", Duration::from_secs(5));
        assert!(matches!(
            engine.recognize(&[]).await,
            Err(ExtractError::OcrFailed(_))
        ));
    }

    #[tokio::test]
    async fn missing_binary_is_ocr_failed() {
        let engine = OcrEngine::new("/nonexistent/tesseract-binary", Duration::from_secs(5));
        let err = engine.recognize(b"fake image bytes").await.unwrap_err();
        assert!(matches!(err, ExtractError::OcrFailed(_)));
    }
}
