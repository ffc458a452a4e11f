//! Generation service client
//!
//! Typed client for a Gemini-style `generateContent` REST endpoint with a
//! bounded retry loop and a single fallback-model attempt. The HTTP
//! transport sits behind a trait so retry behavior is testable without a
//! network.

use crate::config::GenerationConfig;
use crate::errors::{AppError, Result};
use crate::metrics;
use crate::prompt::PromptPart;
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

/// Gemini content part
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

/// Inline binary data (base64-encoded)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub thinking_config: ThinkingConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThinkingConfig {
    pub thinking_budget: u32,
}

#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
pub struct CandidatePart {
    pub text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate, if any
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let joined: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if joined.is_empty() {
            None
        } else {
            Some(joined)
        }
    }
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// One generation attempt against one model. Returns the raw response body
/// on HTTP success so the caller owns answer extraction.
#[async_trait]
pub trait GenerateTransport: Send + Sync {
    async fn send(&self, model: &str, request: &GenerateContentRequest) -> Result<String>;
}

/// reqwest-backed transport for the hosted generation API
pub struct HttpTransport {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
}

impl HttpTransport {
    pub fn new(client: reqwest::Client, api_base: String, api_key: String) -> Self {
        Self {
            client,
            api_base,
            api_key,
        }
    }
}

#[async_trait]
impl GenerateTransport for HttpTransport {
    async fn send(&self, model: &str, request: &GenerateContentRequest) -> Result<String> {
        let url = format!("{}/models/{}:generateContent", self.api_base, model);

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(request)
            .send()
            .await
            .map_err(|e| AppError::UpstreamUnavailable {
                message: format!("Request failed: {}", e),
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(AppError::UpstreamUnavailable {
                message: format!("API error {}: {}", status, body),
            });
        }

        Ok(body)
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Result of a successful generation call
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub text: String,
    /// Model that actually produced the answer (primary or fallback)
    pub model: String,
    pub elapsed_ms: u64,
}

/// Generation client with fixed sampling config, bounded retries, and a
/// single fallback-model attempt.
pub struct GenerationClient {
    transport: Arc<dyn GenerateTransport>,
    config: GenerationConfig,
}

impl GenerationClient {
    pub fn new(config: GenerationConfig, transport: Arc<dyn GenerateTransport>) -> Self {
        Self { transport, config }
    }

    /// Build a client with the HTTP transport from configuration
    pub fn from_config(config: GenerationConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| AppError::Configuration {
                message: "generation.api_key is required for the gemini backend".to_string(),
            })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        let transport = Arc::new(HttpTransport::new(client, config.api_base.clone(), api_key));
        Ok(Self::new(config, transport))
    }

    /// Generate an answer for the assembled prompt parts.
    ///
    /// Up to `max_attempts` tries against the primary model, retrying only
    /// on service-unavailability with linear backoff. When retries are
    /// exhausted, one attempt is made against the fallback model (skipped
    /// when the primary already is the fallback).
    pub async fn generate(&self, parts: &[PromptPart]) -> Result<GenerationOutcome> {
        let request = self.build_request(parts);
        let started = Instant::now();
        let primary = &self.config.primary_model;

        let primary_error = match self.attempt_with_retry(primary, &request).await {
            Ok(text) => {
                return Ok(GenerationOutcome {
                    text,
                    model: primary.clone(),
                    elapsed_ms: started.elapsed().as_millis() as u64,
                })
            }
            Err(e) => e,
        };

        // Only unavailability earns a fallback; anything else was a hard
        // failure and retrying a different model will not fix it.
        let fallback = &self.config.fallback_model;
        if !is_retryable(&primary_error) || fallback == primary {
            return Err(primary_error);
        }

        tracing::warn!(
            primary = %primary,
            fallback = %fallback,
            error = %primary_error,
            "Primary model exhausted retries, attempting fallback"
        );

        match self.attempt_once(fallback, &request).await {
            Ok(text) => Ok(GenerationOutcome {
                text,
                model: fallback.clone(),
                elapsed_ms: started.elapsed().as_millis() as u64,
            }),
            Err(e) => Err(AppError::ModelUnreachable {
                model: fallback.clone(),
                message: e.to_string(),
            }),
        }
    }

    async fn attempt_with_retry(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<String> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            match self.attempt_once(model, request).await {
                Ok(text) => return Ok(text),
                Err(e) if is_retryable(&e) => {
                    // Back off only when another attempt follows
                    if attempt < max_attempts {
                        let delay =
                            Duration::from_millis(self.config.backoff_base_ms * attempt as u64);
                        tracing::warn!(
                            model,
                            attempt,
                            max_attempts,
                            delay_ms = delay.as_millis() as u64,
                            error = %e,
                            "Generation unavailable, backing off"
                        );
                        last_error = Some(e);
                        tokio::time::sleep(delay).await;
                    } else {
                        last_error = Some(e);
                    }
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| AppError::UpstreamUnavailable {
            message: "Unknown error after retries".to_string(),
        }))
    }

    async fn attempt_once(&self, model: &str, request: &GenerateContentRequest) -> Result<String> {
        let started = Instant::now();
        let result = self.transport.send(model, request).await;
        metrics::record_generation(started.elapsed().as_secs_f64(), model, result.is_ok());
        result.map(|body| extract_answer(&body))
    }

    fn build_request(&self, parts: &[PromptPart]) -> GenerateContentRequest {
        let parts = parts
            .iter()
            .map(|part| match part {
                PromptPart::Text(text) => Part::Text { text: text.clone() },
                PromptPart::InlineImage { mime_type, data } => Part::InlineData {
                    inline_data: InlineData {
                        mime_type: mime_type.clone(),
                        data: base64::engine::general_purpose::STANDARD.encode(data),
                    },
                },
            })
            .collect();

        GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts,
            }],
            generation_config: GenerationParams {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_output_tokens,
                thinking_config: ThinkingConfig {
                    thinking_budget: self.config.thinking_budget,
                },
            },
        }
    }
}

/// Whether the failure indicates a transient unavailability condition.
///
/// Classifies on the upstream message alone, not the variant's Display
/// text, so a hard 4xx is never mistaken for a transient outage.
fn is_retryable(error: &AppError) -> bool {
    let AppError::UpstreamUnavailable { message } = error else {
        return false;
    };
    let message = message.to_ascii_lowercase();
    message.contains("503") || message.contains("unavailable") || message.contains("overloaded")
}

/// Pull the answer text out of a raw response body. Falls back to the body
/// itself when no textual candidate part exists, so the caller always gets
/// *something* back.
fn extract_answer(body: &str) -> String {
    match serde_json::from_str::<GenerateContentResponse>(body) {
        Ok(parsed) => parsed.text().unwrap_or_else(|| body.to_string()),
        Err(_) => body.to_string(),
    }
}
