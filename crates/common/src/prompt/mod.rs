//! Prompt assembly
//!
//! Deterministically orders model inputs as
//! `[system_instruction?, image?, attachment_excerpt?, question_or_default]`.

use crate::attachment::ExtractionResult;

/// Instruction substituted when an attachment arrives without a question
pub const DEFAULT_ATTACHMENT_QUESTION: &str = "analyze the attached content";

/// One ordered model input
#[derive(Debug, Clone, PartialEq)]
pub enum PromptPart {
    Text(String),
    InlineImage { mime_type: String, data: Vec<u8> },
}

/// Assemble the ordered prompt parts.
///
/// The caller guarantees that at least one of `question` or `extraction`
/// is present; the handler rejects empty requests before this stage.
/// The attachment excerpt is truncated to `excerpt_chars` characters to
/// bound cost.
pub fn assemble(
    system_instruction: Option<&str>,
    extraction: Option<&ExtractionResult>,
    question: Option<&str>,
    excerpt_chars: usize,
) -> Vec<PromptPart> {
    let mut parts = Vec::with_capacity(4);

    if let Some(instruction) = system_instruction {
        if !instruction.trim().is_empty() {
            parts.push(PromptPart::Text(instruction.to_string()));
        }
    }

    if let Some(extraction) = extraction {
        if let Some(image) = &extraction.image {
            parts.push(PromptPart::InlineImage {
                mime_type: image.mime_type.clone(),
                data: image.data.clone(),
            });
        }
        if let Some(text) = &extraction.text {
            parts.push(PromptPart::Text(format!(
                "Attached content:\n{}",
                truncate_chars(text, excerpt_chars)
            )));
        }
    }

    let question = question.map(str::trim).filter(|q| !q.is_empty());
    parts.push(PromptPart::Text(
        question.unwrap_or(DEFAULT_ATTACHMENT_QUESTION).to_string(),
    ));

    parts
}

/// Truncate on a character boundary, never mid-codepoint
fn truncate_chars(text: &str, cap: usize) -> &str {
    match text.char_indices().nth(cap) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
