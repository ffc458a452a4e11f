//! OCR abstraction
//!
//! Text recognition for image attachments. The engine itself is an opaque
//! external collaborator; the production implementation shells out to the
//! tesseract CLI with a bounded timeout.

use crate::config::OcrConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;

/// Marker substituted when an image yields no recognizable text or the
/// OCR step fails outright. Callers never see an OCR error.
pub const NO_TEXT_MARKER: &str = "[no readable text detected]";

/// Trait for text recognition from image pixels
#[async_trait]
pub trait Ocr: Send + Sync {
    /// Recognize text in a PNG-encoded image
    async fn recognize(&self, png: &[u8]) -> Result<String>;

    /// Get the engine name
    fn name(&self) -> &str;
}

/// Tesseract CLI-backed OCR engine
pub struct TesseractCli {
    bin: String,
    lang: String,
    timeout: Duration,
}

impl TesseractCli {
    pub fn new(bin: String, lang: String, timeout: Duration) -> Self {
        Self { bin, lang, timeout }
    }
}

#[async_trait]
impl Ocr for TesseractCli {
    async fn recognize(&self, png: &[u8]) -> Result<String> {
        // tesseract reads from a file path, so stage the image in a
        // scratch file that is removed when the handle drops.
        let mut scratch = tempfile::Builder::new()
            .suffix(".png")
            .tempfile()
            .map_err(|e| AppError::Internal {
                message: format!("Failed to create OCR scratch file: {}", e),
            })?;
        scratch.write_all(png)?;
        scratch.flush()?;

        let run = Command::new(&self.bin)
            .arg(scratch.path())
            .arg("stdout")
            .args(["-l", &self.lang])
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, run)
            .await
            .map_err(|_| AppError::Timeout {
                secs: self.timeout.as_secs(),
            })?
            .map_err(|e| AppError::Internal {
                message: format!("Failed to run {}: {}", self.bin, e),
            })?;

        if !output.status.success() {
            return Err(AppError::Internal {
                message: format!(
                    "{} exited with {}: {}",
                    self.bin,
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn name(&self) -> &str {
        "tesseract"
    }
}

/// No-op engine for deployments without tesseract and for tests
pub struct DisabledOcr;

#[async_trait]
impl Ocr for DisabledOcr {
    async fn recognize(&self, _png: &[u8]) -> Result<String> {
        Ok(String::new())
    }

    fn name(&self) -> &str {
        "disabled"
    }
}

/// Create an OCR engine based on configuration
pub fn create_ocr(config: &OcrConfig) -> Arc<dyn Ocr> {
    if config.enabled {
        Arc::new(TesseractCli::new(
            config.bin.clone(),
            config.lang.clone(),
            Duration::from_secs(config.timeout_secs),
        ))
    } else {
        Arc::new(DisabledOcr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_ocr_returns_empty() {
        let ocr = DisabledOcr;
        let text = ocr.recognize(&[]).await.unwrap();
        assert!(text.is_empty());
        assert_eq!(ocr.name(), "disabled");
    }

    #[test]
    fn test_create_ocr_respects_toggle() {
        let mut config = crate::AppConfig::default().ocr;
        config.enabled = false;
        assert_eq!(create_ocr(&config).name(), "disabled");
        config.enabled = true;
        assert_eq!(create_ocr(&config).name(), "tesseract");
    }
}
