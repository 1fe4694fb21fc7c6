//! Request handlers for the poster API.

use super::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Map, Value};
use uddokta_core::{ChainError, PosterConcept, PosterError, PosterRequest, PosterResponse};

/// Errors surfaced to API clients as JSON bodies.
#[derive(Debug)]
pub enum ApiError {
    /// Body is not JSON
    InvalidJson(String),
    /// Body is JSON but fields have the wrong types
    InvalidRequest(String),
    /// `text` missing or empty
    MissingText,
    /// No text provider produced a concept
    TextGeneration(ChainError),
    /// A provider answered without a usable prompt
    EmptyPrompt(PosterConcept),
}

impl From<PosterError> for ApiError {
    fn from(err: PosterError) -> Self {
        match err {
            PosterError::MissingText => Self::MissingText,
            PosterError::TextGeneration(chain) => Self::TextGeneration(chain),
            PosterError::EmptyPrompt { concept } => Self::EmptyPrompt(concept),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::InvalidJson(message) => (
                StatusCode::BAD_REQUEST,
                json!({"error": "invalid_json", "message": message}),
            ),
            Self::InvalidRequest(message) => (
                StatusCode::BAD_REQUEST,
                json!({"error": "invalid_request", "message": message}),
            ),
            Self::MissingText => (
                StatusCode::BAD_REQUEST,
                json!({"error": PosterError::MissingText.to_string()}),
            ),
            Self::TextGeneration(chain) => {
                // Per-provider keys (`openai_error`, `gemini_error`) are what the
                // dashboard reads; `provider_errors` keeps the full ordered map.
                let mut body = Map::new();
                body.insert(
                    "error".into(),
                    "Failed to generate prompt with all text providers".into(),
                );
                let mut provider_errors = Map::new();
                for failure in &chain.failures {
                    body.insert(
                        format!("{}_error", failure.provider),
                        failure.message.clone().into(),
                    );
                    provider_errors.insert(failure.provider.clone(), failure.message.clone().into());
                }
                body.insert("provider_errors".into(), Value::Object(provider_errors));
                (StatusCode::INTERNAL_SERVER_ERROR, Value::Object(body))
            }
            Self::EmptyPrompt(concept) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({"error": "Failed to generate prompt", "details": concept}),
            ),
        };
        (status, Json(body)).into_response()
    }
}

/// Decode the request body. An empty body counts as `{}`. Only objects and
/// arrays are accepted at the top level; an array carries no `text`.
fn parse_request(body: &[u8]) -> Result<PosterRequest, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(PosterRequest::default());
    }
    let value: Value = serde_json::from_slice(body).map_err(|e| {
        tracing::warn!("Invalid JSON body: {e}");
        ApiError::InvalidJson(e.to_string())
    })?;
    match value {
        Value::Object(_) => {
            serde_json::from_value(value).map_err(|e| ApiError::InvalidRequest(e.to_string()))
        }
        Value::Array(_) => Ok(PosterRequest::default()),
        other => {
            tracing::warn!("Rejected top-level JSON {other}");
            Err(ApiError::InvalidJson(
                "top-level JSON value must be an object or array".into(),
            ))
        }
    }
}

/// `POST /api/create`
pub async fn create_poster(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PosterResponse>, ApiError> {
    let request = parse_request(&body)?;
    let response = state.service.create(request).await.map_err(|e| {
        match &e {
            PosterError::MissingText => tracing::debug!("Rejected request without text"),
            other => tracing::error!("/api/create failed: {other}"),
        }
        ApiError::from(e)
    })?;
    Ok(Json(response))
}

/// `OPTIONS /api/create` (CORS preflight)
pub async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Any other method on `/api/create`.
pub async fn method_not_allowed(method: Method) -> Response {
    tracing::warn!("/api/create called with unsupported method: {method}");
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({
            "error": "method_not_allowed",
            "method": method.as_str(),
            "allowed": ["POST"],
        })),
    )
        .into_response()
}

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(json!({"status": "ok", "version": uddokta_core::VERSION}))
}
