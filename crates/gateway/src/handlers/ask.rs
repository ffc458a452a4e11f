//! The /ask handler
//!
//! Accepts a JSON body `{"question": "..."}` or a multipart form with an
//! optional `question` field and an optional `attachment` file, runs
//! extraction and the configured answer provider, and maps every failure
//! mode to a status code. Retries live inside the generation client; this
//! handler never retries.

use axum::{
    body::Bytes,
    extract::{FromRequest, Multipart, Request, State},
    http::header::CONTENT_TYPE,
    Json,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use uuid::Uuid;
use validator::Validate;

use crate::AppState;
use askgate_common::{
    errors::{AppError, Result},
    metrics, AskInput,
};

/// JSON request body
#[derive(Debug, Deserialize, Validate)]
pub struct AskRequest {
    #[validate(length(max = 4000))]
    pub question: Option<String>,
}

/// Successful answer response
#[derive(Debug, Serialize, Deserialize)]
pub struct AskResponse {
    pub result: String,
    pub source: String,
    pub meta: AskMeta,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AskMeta {
    pub time_ms: u64,
}

/// Parsed request payload, same shape for both body encodings
#[derive(Debug, Default)]
struct AskPayload {
    question: Option<String>,
    attachment: Option<UploadedFile>,
}

#[derive(Debug)]
struct UploadedFile {
    filename: String,
    content_type: Option<String>,
    bytes: Bytes,
}

/// Answer a question, optionally grounded in an uploaded attachment
pub async fn ask(State(state): State<AppState>, request: Request) -> Result<Json<AskResponse>> {
    let started = Instant::now();
    let backend = state.provider.name().to_string();

    // Every outcome is counted, rejections included
    let result = handle_ask(&state, request).await;
    let status = match &result {
        Ok(_) => 200,
        Err(e) => e.status_code().as_u16(),
    };
    metrics::record_ask(started.elapsed().as_secs_f64(), &backend, status);

    result
}

async fn handle_ask(state: &AppState, request: Request) -> Result<Json<AskResponse>> {
    let ask_id = Uuid::new_v4();

    let payload = parse_body(state, request).await?;

    // An empty question is fine only when an attachment provides context
    let question = payload
        .question
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty());
    if question.is_none() && payload.attachment.is_none() {
        return Err(AppError::EmptyQuestion);
    }

    tracing::info!(
        %ask_id,
        question = question.as_deref().unwrap_or("<attachment only>"),
        attachment = payload.attachment.as_ref().map(|f| f.filename.as_str()),
        "Received question"
    );

    let extraction = match &payload.attachment {
        Some(file) => Some(
            state
                .extractor
                .extract(&file.bytes, file.content_type.as_deref(), &file.filename)
                .await?,
        ),
        None => None,
    };

    let input = AskInput {
        question,
        extraction,
    };

    let answer = state.provider.answer(&input).await?;

    tracing::info!(
        %ask_id,
        source = %answer.source,
        time_ms = answer.elapsed_ms,
        "Answer returned"
    );

    Ok(Json(AskResponse {
        result: answer.text,
        source: answer.source,
        meta: AskMeta {
            time_ms: answer.elapsed_ms,
        },
    }))
}

/// Dispatch on the request content type: multipart form or JSON
async fn parse_body(state: &AppState, request: Request) -> Result<AskPayload> {
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(request, state)
            .await
            .map_err(|e| AppError::Validation {
                message: format!("Invalid multipart body: {}", e),
            })?;
        parse_multipart(multipart).await
    } else {
        let bytes = Bytes::from_request(request, state)
            .await
            .map_err(|e| AppError::Validation {
                message: format!("Could not read request body: {}", e),
            })?;
        parse_json(&bytes)
    }
}

fn parse_json(bytes: &[u8]) -> Result<AskPayload> {
    let parsed: AskRequest = serde_json::from_slice(bytes).map_err(|_| AppError::InvalidJson)?;
    parsed.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
    })?;
    Ok(AskPayload {
        question: parsed.question,
        attachment: None,
    })
}

async fn parse_multipart(mut multipart: Multipart) -> Result<AskPayload> {
    let mut payload = AskPayload::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| AppError::Validation {
        message: format!("Invalid multipart field: {}", e),
    })? {
        match field.name() {
            Some("question") => {
                let text = field.text().await.map_err(|e| AppError::Validation {
                    message: format!("Unreadable question field: {}", e),
                })?;
                payload.question = Some(text);
            }
            Some("attachment") => {
                let filename = field
                    .file_name()
                    .unwrap_or("attachment")
                    .to_string();
                let content_type = field.content_type().map(|ct| ct.to_string());
                let bytes = field.bytes().await.map_err(|e| AppError::Validation {
                    message: format!("Unreadable attachment: {}", e),
                })?;
                payload.attachment = Some(UploadedFile {
                    filename,
                    content_type,
                    bytes,
                });
            }
            // Unknown fields are ignored rather than rejected
            _ => {}
        }
    }

    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_valid() {
        let payload = parse_json(br#"{"question": "how do I sort a vec"}"#).unwrap();
        assert_eq!(payload.question.as_deref(), Some("how do I sort a vec"));
        assert!(payload.attachment.is_none());
    }

    #[test]
    fn test_parse_json_malformed() {
        let err = parse_json(b"{not json").unwrap_err();
        assert!(matches!(err, AppError::InvalidJson));
    }

    #[test]
    fn test_parse_json_rejects_oversized_question() {
        let body = format!(r#"{{"question": "{}"}}"#, "q".repeat(5000));
        let err = parse_json(body.as_bytes()).unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }
}
