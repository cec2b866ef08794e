use std::path::PathBuf;

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

/// Failures of the retrieval-augmented engine itself.
///
/// Every variant renders a message an operator can tell apart without log
/// access: a missing corpus, a missing index, an unreachable model service
/// and a malformed query all read differently.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no .txt documents found under {0}")]
    EmptyCorpus(PathBuf),

    #[error("embedding service unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("vector index not found at {0}; run `bark-index` to build it first")]
    IndexNotFound(PathBuf),

    #[error("query rewrite failed: {0}")]
    RewriteFailed(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("answer generation failed: {0}")]
    GenerationFailed(String),

    #[error("index store error: {0}")]
    Store(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    pub fn store<E: std::fmt::Display>(err: E) -> Self {
        EngineError::Store(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InvalidQuery(msg) => ApiError::BadRequest(msg),
            EngineError::IndexNotFound(_) | EngineError::EmbeddingUnavailable(_) => {
                ApiError::ServiceUnavailable(err.to_string())
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            ApiError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}
