//! Error types for the AskGate service
//!
//! Provides a single error taxonomy with:
//! - Distinct error types for different failure modes
//! - HTTP status code mapping
//! - A `{"result": message}` response body, matching the answer envelope

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Message returned for any uncaught internal fault. The real diagnostic
/// is logged, never sent to the caller.
pub const INTERNAL_ERROR_MESSAGE: &str = "Unexpected error. Please try again.";

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation failed: {message}")]
    Validation { message: String },

    #[error("Invalid JSON body.")]
    InvalidJson,

    #[error("Question cannot be empty.")]
    EmptyQuestion,

    // Attachment rejections
    #[error("Attachment too large (max {limit_mb}MB).")]
    AttachmentTooLarge { size: usize, limit_mb: usize },

    #[error("Unsupported attachment type: {detail}")]
    UnsupportedAttachmentType { detail: String },

    #[error("Attachment content type {declared} does not match extension .{extension}")]
    MimeMismatch { declared: String, extension: String },

    #[error("Could not decode image: {message}")]
    ImageDecode { message: String },

    // Upstream / provider errors
    #[error("Generation service unavailable: {message}")]
    UpstreamUnavailable { message: String },

    #[error("Model unreachable after retries and fallback ({model}): {message}")]
    ModelUnreachable { model: String, message: String },

    #[error("Answer provider failed: {message}")]
    ProviderFailed { message: String },

    #[error("Timeout after {secs}s. Try a shorter query.")]
    Timeout { secs: u64 },

    // Internal errors
    #[error("Internal server error: {message}")]
    Internal { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::Validation { .. }
            | AppError::InvalidJson
            | AppError::EmptyQuestion
            | AppError::AttachmentTooLarge { .. }
            | AppError::UnsupportedAttachmentType { .. }
            | AppError::MimeMismatch { .. }
            | AppError::ImageDecode { .. } => StatusCode::BAD_REQUEST,

            // 502 Bad Gateway
            AppError::UpstreamUnavailable { .. }
            | AppError::ModelUnreachable { .. }
            | AppError::ProviderFailed { .. } => StatusCode::BAD_GATEWAY,

            // 504 Gateway Timeout
            AppError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,

            // 500 Internal Server Error
            AppError::Internal { .. }
            | AppError::Configuration { .. }
            | AppError::Serialization(_)
            | AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Check if this error should be logged at error level
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Check if this error is a client error
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

/// Error response body. Uses the same `result` field as a successful
/// answer, which is what the original API clients expect.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub result: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let diagnostic = self.to_string();

        // Log based on severity
        if self.is_server_error() {
            tracing::error!(
                error = %diagnostic,
                status = status.as_u16(),
                "Server error"
            );
        } else if self.is_client_error() {
            tracing::warn!(
                error = %diagnostic,
                status = status.as_u16(),
                "Client error"
            );
        }

        // 500s get a sanitized message; everything else is user-correctable
        // or describes an upstream condition the caller may act on.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            INTERNAL_ERROR_MESSAGE.to_string()
        } else {
            diagnostic
        };

        (status, Json(ErrorBody { result: message })).into_response()
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_too_large_message() {
        let err = AppError::AttachmentTooLarge {
            size: 6 * 1024 * 1024,
            limit_mb: 5,
        };
        assert_eq!(err.to_string(), "Attachment too large (max 5MB).");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.is_client_error());
    }

    #[test]
    fn test_empty_question_is_bad_request() {
        let err = AppError::EmptyQuestion;
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Question cannot be empty.");
    }

    #[test]
    fn test_upstream_errors_are_bad_gateway() {
        let err = AppError::ModelUnreachable {
            model: "gemini-1.5-flash".into(),
            message: "503 UNAVAILABLE".into(),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_timeout_maps_to_504() {
        let err = AppError::Timeout { secs: 8 };
        assert_eq!(err.status_code(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn test_internal_error_is_server_error() {
        let err = AppError::Internal {
            message: "Something went wrong".into(),
        };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.is_server_error());
    }
}
