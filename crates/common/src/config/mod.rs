//! Configuration management for the AskGate service
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config.toml, config.yaml)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Answer provider selection and CLI-backend settings
    pub answer: AnswerConfig,

    /// Remote generation service configuration
    pub generation: GenerationConfig,

    /// Attachment extraction limits
    pub extraction: ExtractionConfig,

    /// OCR configuration
    pub ocr: OcrConfig,

    /// Observability configuration
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum accepted request body size in bytes. Must be above the
    /// attachment ceilings so oversized uploads reach the handler and
    /// get the documented 400 instead of a framework-level 413.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnswerConfig {
    /// Answer backend: "gemini" (remote generation API) or "howdoi" (local CLI)
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Path or name of the howdoi binary
    #[serde(default = "default_howdoi_bin")]
    pub howdoi_bin: String,

    /// Number of answers requested from the CLI
    #[serde(default = "default_howdoi_num_answers")]
    pub howdoi_num_answers: u32,

    /// CLI execution timeout in seconds
    #[serde(default = "default_howdoi_timeout")]
    pub howdoi_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GenerationConfig {
    /// API key for the generation service
    pub api_key: Option<String>,

    /// API base URL
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Primary model identifier
    #[serde(default = "default_primary_model")]
    pub primary_model: String,

    /// Fallback model identifier, used once after primary retries are exhausted
    #[serde(default = "default_fallback_model")]
    pub fallback_model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Output token cap
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Thinking budget (0 = disabled)
    #[serde(default)]
    pub thinking_budget: u32,

    /// System instruction prepended to every prompt
    #[serde(default = "default_system_instruction")]
    pub system_instruction: String,

    /// Attachment excerpt cap in characters
    #[serde(default = "default_excerpt_chars")]
    pub excerpt_chars: usize,

    /// Maximum attempts against the primary model
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Linear backoff base in milliseconds (base * attempt number)
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Request timeout in seconds
    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExtractionConfig {
    /// Size ceiling for documents (PDF, text) in megabytes
    #[serde(default = "default_max_document_mb")]
    pub max_document_mb: usize,

    /// Size ceiling for images in megabytes
    #[serde(default = "default_max_image_mb")]
    pub max_image_mb: usize,

    /// Number of PDF pages examined, counted from the front
    #[serde(default = "default_pdf_page_cap")]
    pub pdf_page_cap: usize,

    /// Longest allowed image side in pixels after downscaling
    #[serde(default = "default_image_max_side")]
    pub image_max_side: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OcrConfig {
    /// Enable OCR for image attachments
    #[serde(default = "default_ocr_enabled")]
    pub enabled: bool,

    /// Path or name of the tesseract binary
    #[serde(default = "default_ocr_bin")]
    pub bin: String,

    /// Recognition language
    #[serde(default = "default_ocr_lang")]
    pub lang: String,

    /// OCR execution timeout in seconds
    #[serde(default = "default_ocr_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Metrics port (0 to disable)
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_max_body_bytes() -> usize { 16 * 1024 * 1024 }
fn default_backend() -> String { "gemini".to_string() }
fn default_howdoi_bin() -> String { "howdoi".to_string() }
fn default_howdoi_num_answers() -> u32 { 1 }
fn default_howdoi_timeout() -> u64 { 8 }
fn default_api_base() -> String { "https://generativelanguage.googleapis.com/v1beta".to_string() }
fn default_primary_model() -> String { crate::DEFAULT_PRIMARY_MODEL.to_string() }
fn default_fallback_model() -> String { crate::DEFAULT_FALLBACK_MODEL.to_string() }
fn default_temperature() -> f32 { 0.4 }
fn default_max_output_tokens() -> u32 { 2048 }
fn default_system_instruction() -> String {
    "You are a concise programming assistant. Answer the user's question \
     directly, using fenced code blocks for any code."
        .to_string()
}
fn default_excerpt_chars() -> usize { 3000 }
fn default_max_attempts() -> u32 { 3 }
fn default_backoff_base_ms() -> u64 { 1200 }
fn default_generation_timeout() -> u64 { 30 }
fn default_max_document_mb() -> usize { 5 }
fn default_max_image_mb() -> usize { 7 }
fn default_pdf_page_cap() -> usize { 2 }
fn default_image_max_side() -> u32 { 1600 }
fn default_ocr_enabled() -> bool { true }
fn default_ocr_bin() -> String { "tesseract".to_string() }
fn default_ocr_lang() -> String { "eng".to_string() }
fn default_ocr_timeout() -> u64 { 10 }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { false }
fn default_metrics_port() -> u16 { 0 }

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Start with defaults
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?

            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // Load from environment variables with APP__ prefix
            // e.g., APP__SERVER__PORT=8081
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load from a specific TOML file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )
            .build()?;

        config.try_deserialize()
    }

    /// CLI execution timeout as Duration
    pub fn howdoi_timeout(&self) -> Duration {
        Duration::from_secs(self.answer.howdoi_timeout_secs)
    }

    /// Generation request timeout as Duration
    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation.timeout_secs)
    }
}

impl ExtractionConfig {
    /// Document ceiling in bytes
    pub fn max_document_bytes(&self) -> usize {
        self.max_document_mb * 1024 * 1024
    }

    /// Image ceiling in bytes
    pub fn max_image_bytes(&self) -> usize {
        self.max_image_mb * 1024 * 1024
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
                max_body_bytes: default_max_body_bytes(),
            },
            answer: AnswerConfig {
                backend: default_backend(),
                howdoi_bin: default_howdoi_bin(),
                howdoi_num_answers: default_howdoi_num_answers(),
                howdoi_timeout_secs: default_howdoi_timeout(),
            },
            generation: GenerationConfig::default(),
            extraction: ExtractionConfig::default(),
            ocr: OcrConfig {
                enabled: default_ocr_enabled(),
                bin: default_ocr_bin(),
                lang: default_ocr_lang(),
                timeout_secs: default_ocr_timeout(),
            },
            observability: ObservabilityConfig {
                log_level: default_log_level(),
                json_logging: default_json_logging(),
                metrics_port: default_metrics_port(),
            },
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: default_api_base(),
            primary_model: default_primary_model(),
            fallback_model: default_fallback_model(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            thinking_budget: 0,
            system_instruction: default_system_instruction(),
            excerpt_chars: default_excerpt_chars(),
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
            timeout_secs: default_generation_timeout(),
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_document_mb: default_max_document_mb(),
            max_image_mb: default_max_image_mb(),
            pdf_page_cap: default_pdf_page_cap(),
            image_max_side: default_image_max_side(),
        }
    }
}
