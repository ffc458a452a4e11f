//! PDF text extraction
//!
//! Reads at most the first N pages of a document (cost control) and
//! degrades per page: a blank or corrupt page contributes an empty
//! string instead of failing the attachment.

use lopdf::Document;
use tracing::{debug, warn};

/// Extract text from the first `page_cap` pages of a PDF.
///
/// Never fails: an unparseable document yields an empty string.
pub fn extract_text_capped(bytes: &[u8], page_cap: usize) -> String {
    let doc = match Document::load_mem(bytes) {
        Ok(doc) => doc,
        Err(e) => {
            warn!(error = %e, "Failed to load PDF, degrading to empty excerpt");
            return String::new();
        }
    };

    let pages: Vec<u32> = doc.get_pages().keys().copied().take(page_cap).collect();
    debug!(
        total_pages = doc.get_pages().len(),
        examined = pages.len(),
        "Extracting text from PDF"
    );

    let mut text = String::new();
    for page in pages {
        match doc.extract_text(&[page]) {
            Ok(page_text) => {
                text.push_str(&page_text);
                text.push('\n');
            }
            Err(e) => {
                warn!(page, error = %e, "Failed to extract text from page, skipping");
            }
        }
    }

    clean_text(&text)
}

/// Collapse runs of whitespace left behind by PDF layout operators
fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};

    /// Build an in-memory PDF with one page per label
    fn build_pdf(labels: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for label in labels {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![100.into(), 600.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*label)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(
                dictionary! {},
                content.encode().unwrap(),
            ));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn test_page_cap_is_enforced() {
        let pdf = build_pdf(&["Alpha page", "Bravo page", "Charlie page"]);
        let text = extract_text_capped(&pdf, 2);
        assert!(text.contains("Alpha page"), "got: {}", text);
        assert!(text.contains("Bravo page"), "got: {}", text);
        assert!(!text.contains("Charlie page"), "got: {}", text);
    }

    #[test]
    fn test_short_document_is_fully_read() {
        let pdf = build_pdf(&["Only page"]);
        let text = extract_text_capped(&pdf, 2);
        assert!(text.contains("Only page"));
    }

    #[test]
    fn test_corrupt_document_degrades() {
        assert_eq!(extract_text_capped(b"%PDF-garbage", 2), "");
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("Hello   World\n\nTest"), "Hello World Test");
    }
}
