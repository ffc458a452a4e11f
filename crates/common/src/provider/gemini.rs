//! Remote generation API provider

use super::{Answer, AnswerProvider, AskInput};
use crate::config::GenerationConfig;
use crate::errors::Result;
use crate::generation::{GenerationClient, GenerateTransport};
use crate::prompt;
use async_trait::async_trait;
use std::sync::Arc;

/// Answer provider backed by the hosted generation service
pub struct GeminiProvider {
    client: GenerationClient,
    system_instruction: String,
    excerpt_chars: usize,
}

impl GeminiProvider {
    pub fn from_config(config: GenerationConfig) -> Result<Self> {
        let system_instruction = config.system_instruction.clone();
        let excerpt_chars = config.excerpt_chars;
        Ok(Self {
            client: GenerationClient::from_config(config)?,
            system_instruction,
            excerpt_chars,
        })
    }

    /// Construct with an explicit transport (tests)
    pub fn with_transport(config: GenerationConfig, transport: Arc<dyn GenerateTransport>) -> Self {
        let system_instruction = config.system_instruction.clone();
        let excerpt_chars = config.excerpt_chars;
        Self {
            client: GenerationClient::new(config, transport),
            system_instruction,
            excerpt_chars,
        }
    }
}

#[async_trait]
impl AnswerProvider for GeminiProvider {
    async fn answer(&self, input: &AskInput) -> Result<Answer> {
        let parts = prompt::assemble(
            Some(&self.system_instruction),
            input.extraction.as_ref(),
            input.question.as_deref(),
            self.excerpt_chars,
        );

        let outcome = self.client.generate(&parts).await?;

        tracing::info!(
            model = %outcome.model,
            elapsed_ms = outcome.elapsed_ms,
            parts = parts.len(),
            "Generation completed"
        );

        Ok(Answer {
            text: outcome.text,
            source: outcome.model,
            elapsed_ms: outcome.elapsed_ms,
        })
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use crate::generation::GenerateContentRequest;
    use std::sync::Mutex;

    /// Transport that captures the request and returns a canned answer
    struct CapturingTransport {
        request_json: Mutex<Option<String>>,
    }

    #[async_trait]
    impl GenerateTransport for CapturingTransport {
        async fn send(&self, _model: &str, request: &GenerateContentRequest) -> Result<String> {
            *self.request_json.lock().unwrap() =
                Some(serde_json::to_string(request).map_err(AppError::from)?);
            Ok(r#"{"candidates":[{"content":{"parts":[{"text":"answer"}]}}]}"#.to_string())
        }
    }

    #[tokio::test]
    async fn test_prompt_carries_system_instruction_and_question() {
        let transport = Arc::new(CapturingTransport {
            request_json: Mutex::new(None),
        });
        let provider =
            GeminiProvider::with_transport(GenerationConfig::default(), transport.clone());

        let input = AskInput {
            question: Some("how do I reverse a list".to_string()),
            extraction: None,
        };
        let answer = provider.answer(&input).await.unwrap();

        assert_eq!(answer.text, "answer");
        assert_eq!(answer.source, crate::DEFAULT_PRIMARY_MODEL);

        let sent = transport.request_json.lock().unwrap().clone().unwrap();
        assert!(sent.contains("how do I reverse a list"));
        assert!(sent.contains("programming assistant"));
    }
}
