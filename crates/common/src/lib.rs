//! AskGate Common Library
//!
//! Shared code for the AskGate service including:
//! - Error types and HTTP mapping
//! - Configuration management
//! - Attachment extraction (PDF, text, image + OCR)
//! - Prompt assembly
//! - Generation client with retry and model fallback
//! - Answer provider abstraction
//! - Metrics helpers

pub mod attachment;
pub mod config;
pub mod errors;
pub mod generation;
pub mod metrics;
pub mod ocr;
pub mod prompt;
pub mod provider;

// Re-export commonly used types
pub use config::AppConfig;
pub use errors::{AppError, Result};
pub use provider::{Answer, AnswerProvider, AskInput};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default primary generation model
pub const DEFAULT_PRIMARY_MODEL: &str = "gemini-2.0-flash";

/// Default fallback generation model
pub const DEFAULT_FALLBACK_MODEL: &str = "gemini-1.5-flash";
