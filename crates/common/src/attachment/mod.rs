//! Attachment extraction
//!
//! Classifies an uploaded file by declared MIME type or filename suffix,
//! enforces per-kind size ceilings, and produces plain text (and, for
//! images, a normalized bitmap) for prompt assembly. Rejections are typed
//! errors; partial extraction degrades instead of failing the request.

pub mod image;
pub mod pdf;

use crate::config::ExtractionConfig;
use crate::errors::{AppError, Result};
use crate::metrics;
use crate::ocr::{Ocr, NO_TEXT_MARKER};
use std::path::Path;
use std::sync::Arc;

/// Supported attachment kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Pdf,
    Text,
    Image,
}

/// Normalized image ready for a multimodal prompt
#[derive(Debug, Clone)]
pub struct ImagePayload {
    /// PNG-encoded pixels, orientation-corrected and downscaled
    pub data: Vec<u8>,
    pub mime_type: String,
}

/// What extraction produced. `text: None` signals a failed or empty
/// extraction, which is non-fatal; the request proceeds with less context.
#[derive(Debug, Clone, Default)]
pub struct ExtractionResult {
    pub text: Option<String>,
    pub image: Option<ImagePayload>,
}

/// Attachment extractor with fixed limits and an injected OCR engine
pub struct Extractor {
    config: ExtractionConfig,
    ocr: Arc<dyn Ocr>,
}

impl Extractor {
    pub fn new(config: ExtractionConfig, ocr: Arc<dyn Ocr>) -> Self {
        Self { config, ocr }
    }

    /// Extract text (and image payload) from an uploaded file.
    ///
    /// Size ceilings and unsupported/mismatched types reject with a 400-class
    /// error. Everything past that point degrades: unparseable PDFs yield an
    /// empty excerpt and failed OCR yields an explicit marker.
    pub async fn extract(
        &self,
        bytes: &[u8],
        content_type: Option<&str>,
        filename: &str,
    ) -> Result<ExtractionResult> {
        let kind = classify(content_type, filename).inspect_err(|_| {
            metrics::record_attachment_rejected("unsupported_type");
        })?;

        let limit_mb = match kind {
            AttachmentKind::Image => self.config.max_image_mb,
            _ => self.config.max_document_mb,
        };
        if bytes.len() > limit_mb * 1024 * 1024 {
            metrics::record_attachment_rejected("too_large");
            return Err(AppError::AttachmentTooLarge {
                size: bytes.len(),
                limit_mb,
            });
        }

        match kind {
            AttachmentKind::Pdf => {
                let text = pdf::extract_text_capped(bytes, self.config.pdf_page_cap);
                Ok(ExtractionResult {
                    text: non_empty(text),
                    image: None,
                })
            }
            AttachmentKind::Text => {
                let text = String::from_utf8_lossy(bytes).into_owned();
                Ok(ExtractionResult {
                    text: non_empty(text),
                    image: None,
                })
            }
            AttachmentKind::Image => {
                let png = image::normalize(bytes, self.config.image_max_side)?;
                let text = match self.ocr.recognize(&png).await {
                    Ok(t) if !t.trim().is_empty() => t,
                    Ok(_) => NO_TEXT_MARKER.to_string(),
                    Err(e) => {
                        tracing::warn!(engine = self.ocr.name(), error = %e, "OCR failed, degrading");
                        NO_TEXT_MARKER.to_string()
                    }
                };
                Ok(ExtractionResult {
                    text: Some(text),
                    image: Some(ImagePayload {
                        data: png,
                        mime_type: "image/png".to_string(),
                    }),
                })
            }
        }
    }
}

fn non_empty(text: String) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Classify by declared MIME type or filename suffix into exactly one kind.
///
/// The declared type wins when both are known and agree; a disagreement
/// that involves an image is rejected outright, since a mislabeled binary
/// blob is the one case the decoder cannot degrade around.
pub fn classify(content_type: Option<&str>, filename: &str) -> Result<AttachmentKind> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let from_mime = content_type.and_then(kind_from_mime);
    let from_ext = kind_from_extension(&extension);

    match (from_mime, from_ext) {
        (Some(m), Some(e)) if m != e && (m == AttachmentKind::Image || e == AttachmentKind::Image) => {
            Err(AppError::MimeMismatch {
                declared: content_type.unwrap_or("unknown").to_string(),
                extension,
            })
        }
        (Some(m), _) => Ok(m),
        (None, Some(e)) => Ok(e),
        (None, None) => Err(AppError::UnsupportedAttachmentType {
            detail: format!(
                "{} ({})",
                filename,
                content_type.unwrap_or("no content type")
            ),
        }),
    }
}

fn kind_from_mime(content_type: &str) -> Option<AttachmentKind> {
    // Strip parameters like "; charset=utf-8"
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_ascii_lowercase();

    match mime.as_str() {
        "application/pdf" => Some(AttachmentKind::Pdf),
        "application/octet-stream" => None,
        "image/png" | "image/jpeg" | "image/webp" | "image/gif" => Some(AttachmentKind::Image),
        m if m.starts_with("text/") => Some(AttachmentKind::Text),
        "application/markdown" => Some(AttachmentKind::Text),
        _ => None,
    }
}

fn kind_from_extension(extension: &str) -> Option<AttachmentKind> {
    match extension {
        "pdf" => Some(AttachmentKind::Pdf),
        "txt" | "md" | "markdown" | "text" => Some(AttachmentKind::Text),
        "png" | "jpg" | "jpeg" | "webp" | "gif" => Some(AttachmentKind::Image),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::DisabledOcr;

    fn extractor() -> Extractor {
        Extractor::new(ExtractionConfig::default(), Arc::new(DisabledOcr))
    }

    #[test]
    fn test_classify_by_mime() {
        assert_eq!(
            classify(Some("application/pdf"), "notes").unwrap(),
            AttachmentKind::Pdf
        );
        assert_eq!(
            classify(Some("text/plain; charset=utf-8"), "notes").unwrap(),
            AttachmentKind::Text
        );
        assert_eq!(
            classify(Some("image/png"), "shot.png").unwrap(),
            AttachmentKind::Image
        );
    }

    #[test]
    fn test_classify_by_extension_when_mime_unknown() {
        assert_eq!(
            classify(Some("application/octet-stream"), "readme.md").unwrap(),
            AttachmentKind::Text
        );
        assert_eq!(classify(None, "paper.PDF").unwrap(), AttachmentKind::Pdf);
    }

    #[test]
    fn test_classify_rejects_unknown() {
        let err = classify(Some("application/zip"), "archive.zip").unwrap_err();
        assert!(matches!(err, AppError::UnsupportedAttachmentType { .. }));
    }

    #[test]
    fn test_classify_rejects_image_mismatch() {
        let err = classify(Some("image/png"), "report.pdf").unwrap_err();
        assert!(matches!(err, AppError::MimeMismatch { .. }));

        let err = classify(Some("application/pdf"), "shot.png").unwrap_err();
        assert!(matches!(err, AppError::MimeMismatch { .. }));
    }

    #[tokio::test]
    async fn test_document_size_ceiling() {
        let oversized = vec![0u8; 6 * 1024 * 1024];
        let err = extractor()
            .extract(&oversized, Some("application/pdf"), "big.pdf")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Attachment too large (max 5MB).");
    }

    #[tokio::test]
    async fn test_image_ceiling_is_larger() {
        // 6 MB is fine for images (ceiling 7 MB); it fails later on decode,
        // not on size.
        let blob = vec![0u8; 6 * 1024 * 1024];
        let err = extractor()
            .extract(&blob, Some("image/png"), "big.png")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ImageDecode { .. }));
    }

    #[tokio::test]
    async fn test_text_is_never_rejected() {
        let invalid_utf8 = vec![b'h', b'i', 0xff, 0xfe, b'!'];
        let result = extractor()
            .extract(&invalid_utf8, Some("text/plain"), "note.txt")
            .await
            .unwrap();
        let text = result.text.unwrap();
        assert!(text.starts_with("hi"));
        assert!(text.contains('\u{FFFD}'));
    }

    #[tokio::test]
    async fn test_corrupt_pdf_degrades_to_no_text() {
        let result = extractor()
            .extract(b"not a pdf at all", Some("application/pdf"), "bad.pdf")
            .await
            .unwrap();
        assert!(result.text.is_none());
        assert!(result.image.is_none());
    }

    #[tokio::test]
    async fn test_image_with_no_ocr_text_gets_marker() {
        let png = image::test_png(64, 32);
        let result = extractor()
            .extract(&png, Some("image/png"), "shot.png")
            .await
            .unwrap();
        assert_eq!(result.text.as_deref(), Some(NO_TEXT_MARKER));
        let payload = result.image.unwrap();
        assert_eq!(payload.mime_type, "image/png");
        assert!(!payload.data.is_empty());
    }
}
