//! Answer provider abstraction
//!
//! A single capability interface over the two answer backends: the remote
//! generation API and the local howdoi CLI. The backend is selected once at
//! startup from configuration; handlers only ever see the trait.

pub mod gemini;
pub mod howdoi;

use crate::attachment::ExtractionResult;
use crate::config::AppConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use std::sync::Arc;

pub use gemini::GeminiProvider;
pub use howdoi::HowdoiProvider;

/// Validated input for one answer request
#[derive(Debug, Default)]
pub struct AskInput {
    /// Trimmed, non-empty question, if one was supplied
    pub question: Option<String>,
    /// Extraction output for the attachment, if one was supplied
    pub extraction: Option<ExtractionResult>,
}

/// A produced answer
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    /// Where the answer came from (model identifier or CLI name)
    pub source: String,
    pub elapsed_ms: u64,
}

/// Trait for answer backends
#[async_trait]
pub trait AnswerProvider: Send + Sync {
    /// Produce an answer for the validated input
    async fn answer(&self, input: &AskInput) -> Result<Answer>;

    /// Get the backend name
    fn name(&self) -> &str;
}

/// Create an answer provider based on configuration.
///
/// Constructed once at startup and shared read-only across requests.
pub fn create_provider(config: &AppConfig) -> Result<Arc<dyn AnswerProvider>> {
    match config.answer.backend.as_str() {
        "gemini" => {
            let provider = GeminiProvider::from_config(config.generation.clone())?;
            Ok(Arc::new(provider))
        }
        "howdoi" => Ok(Arc::new(HowdoiProvider::new(
            config.answer.howdoi_bin.clone(),
            config.answer.howdoi_num_answers,
            config.howdoi_timeout(),
        ))),
        other => Err(AppError::Configuration {
            message: format!("Unknown answer backend: {}", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_backend_is_rejected() {
        let mut config = AppConfig::default();
        config.answer.backend = "oracle".to_string();
        let err = create_provider(&config).err().unwrap();
        assert!(matches!(err, AppError::Configuration { .. }));
    }

    #[test]
    fn test_howdoi_backend_constructs() {
        let mut config = AppConfig::default();
        config.answer.backend = "howdoi".to_string();
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.name(), "howdoi");
    }

    #[test]
    fn test_gemini_backend_requires_api_key() {
        let mut config = AppConfig::default();
        config.answer.backend = "gemini".to_string();
        config.generation.api_key = None;
        assert!(create_provider(&config).is_err());

        config.generation.api_key = Some("test-key".to_string());
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.name(), "gemini");
    }
}
