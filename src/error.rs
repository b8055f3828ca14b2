use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::models::Tier;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("External API error: {0}")]
    ExternalApi(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::ExternalApi(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::HttpClient(_) => (StatusCode::BAD_GATEWAY, self.to_string()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Why a candidate tier produced nothing usable
///
/// Everything except `Exhausted` is recovered by moving to the next tier.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    #[error("source '{source_name}' timed out after {timeout_ms}ms")]
    Timeout { source_name: String, timeout_ms: u64 },

    #[error("source '{source_name}' failed: {reason}")]
    Failure { source_name: String, reason: String },

    #[error("tier {tier} yielded no usable candidates")]
    EmptyPool { tier: Tier },

    #[error("all candidate sources exhausted{}", cause_suffix(.last_cause))]
    Exhausted { last_cause: Option<Box<SourceError>> },
}

fn cause_suffix(cause: &Option<Box<SourceError>>) -> String {
    cause
        .as_ref()
        .map(|cause| format!(": {}", cause))
        .unwrap_or_default()
}

impl SourceError {
    /// Classifies a fetch error, folding client-side timeouts into `Timeout`
    pub fn from_fetch(source_name: &str, timeout_ms: u64, err: AppError) -> Self {
        match err {
            AppError::HttpClient(e) if e.is_timeout() => SourceError::Timeout {
                source_name: source_name.to_string(),
                timeout_ms,
            },
            other => SourceError::Failure {
                source_name: source_name.to_string(),
                reason: other.to_string(),
            },
        }
    }
}
