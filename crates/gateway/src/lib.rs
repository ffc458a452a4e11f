//! AskGate gateway library
//!
//! Router and application state, kept out of `main.rs` so integration
//! tests can drive the service in-process.

pub mod handlers;

use askgate_common::attachment::Extractor;
use askgate_common::errors::ErrorBody;
use askgate_common::{AnswerProvider, AppConfig};
use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

/// Application state shared across handlers.
///
/// Constructed once at startup; read-only thereafter.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub provider: Arc<dyn AnswerProvider>,
    pub extractor: Arc<Extractor>,
}

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    // The body ceiling sits above the attachment limits so oversized
    // uploads reach the handler and get the documented 400.
    let body_limit = DefaultBodyLimit::max(state.config.server.max_body_bytes);

    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/ask", post(handlers::ask::ask).fallback(method_not_allowed))
        .route("/ask/", post(handlers::ask::ask).fallback(method_not_allowed))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(request_id)
        .layer(propagate_id)
        .layer(body_limit)
        .with_state(state)
}

/// Wrong-method responses carry the same `{"result": message}` envelope
/// as every other error.
async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ErrorBody {
            result: "Invalid request.".to_string(),
        }),
    )
}
