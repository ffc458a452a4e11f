//! Local CLI provider
//!
//! Shells out to the howdoi documentation-lookup tool with a bounded
//! argument list and timeout. Attachments are not consumed on this path;
//! only the question text reaches the CLI.

use super::{Answer, AnswerProvider, AskInput};
use crate::errors::{AppError, Result};
use crate::prompt::DEFAULT_ATTACHMENT_QUESTION;
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tokio::process::Command;

/// Answer returned when the CLI produces no output for a query
pub const NO_ANSWER_FALLBACK: &str = "Sorry, couldn't find help for that topic.";

/// Answer provider backed by the howdoi CLI
pub struct HowdoiProvider {
    bin: String,
    num_answers: u32,
    timeout: Duration,
}

impl HowdoiProvider {
    pub fn new(bin: String, num_answers: u32, timeout: Duration) -> Self {
        Self {
            bin,
            num_answers,
            timeout,
        }
    }
}

#[async_trait]
impl AnswerProvider for HowdoiProvider {
    async fn answer(&self, input: &AskInput) -> Result<Answer> {
        if input.extraction.is_some() {
            tracing::warn!("howdoi backend ignores attachment content, answering from the question text only");
        }

        let question = input
            .question
            .as_deref()
            .unwrap_or(DEFAULT_ATTACHMENT_QUESTION);

        let started = Instant::now();

        let run = Command::new(&self.bin)
            .args(["--num", &self.num_answers.to_string(), "--color", "0"])
            .args(question.split_whitespace())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, run)
            .await
            .map_err(|_| AppError::Timeout {
                secs: self.timeout.as_secs(),
            })?
            .map_err(|e| AppError::ProviderFailed {
                message: format!("Failed to run {}: {}", self.bin, e),
            })?;

        if !output.status.success() {
            return Err(AppError::ProviderFailed {
                message: format!(
                    "{} exited with {}: {}",
                    self.bin,
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        let mut text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if text.is_empty() {
            tracing::warn!(question, "CLI produced no answer");
            text = NO_ANSWER_FALLBACK.to_string();
        }

        Ok(Answer {
            text,
            source: "howdoi".to_string(),
            elapsed_ms: started.elapsed().as_millis() as u64,
        })
    }

    fn name(&self) -> &str {
        "howdoi"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(question: &str) -> AskInput {
        AskInput {
            question: Some(question.to_string()),
            extraction: None,
        }
    }

    #[tokio::test]
    async fn test_cli_output_is_returned() {
        // echo stands in for howdoi; it prints the argument list back
        let provider = HowdoiProvider::new("echo".to_string(), 1, Duration::from_secs(8));
        let answer = provider.answer(&input("reverse a list")).await.unwrap();
        assert!(answer.text.contains("reverse a list"));
        assert!(answer.text.contains("--num 1"));
        assert_eq!(answer.source, "howdoi");
    }

    #[tokio::test]
    async fn test_empty_output_degrades_to_fallback() {
        // true exits 0 with no output
        let provider = HowdoiProvider::new("true".to_string(), 1, Duration::from_secs(8));
        let answer = provider.answer(&input("anything")).await.unwrap();
        assert_eq!(answer.text, NO_ANSWER_FALLBACK);
    }

    #[tokio::test]
    async fn test_missing_binary_is_provider_failure() {
        let provider = HowdoiProvider::new(
            "definitely-not-a-real-binary".to_string(),
            1,
            Duration::from_secs(8),
        );
        let err = provider.answer(&input("anything")).await.unwrap_err();
        assert!(matches!(err, AppError::ProviderFailed { .. }));
    }

    #[tokio::test]
    async fn test_attachment_text_never_reaches_the_cli() {
        use crate::attachment::ExtractionResult;

        let provider = HowdoiProvider::new("echo".to_string(), 1, Duration::from_secs(8));
        let mut query = input("sort a vec");
        query.extraction = Some(ExtractionResult {
            text: Some("contents of the upload".to_string()),
            image: None,
        });

        let answer = provider.answer(&query).await.unwrap();
        assert!(answer.text.contains("sort a vec"));
        assert!(!answer.text.contains("contents of the upload"));
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_provider_failure() {
        // false exits 1
        let provider = HowdoiProvider::new("false".to_string(), 1, Duration::from_secs(8));
        let err = provider.answer(&input("anything")).await.unwrap_err();
        assert!(matches!(err, AppError::ProviderFailed { .. }));
    }
}
