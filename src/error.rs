use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

/// Failures of the retrieval/generation pipeline.
#[derive(Debug, Error)]
pub enum RagError {
    #[error("upstream API error: {0}")]
    Upstream(String),
    #[error("vector dimension mismatch: query has {query}, corpus entry has {entry}")]
    DimensionMismatch { query: usize, entry: usize },
    #[error("corpus error: {0}")]
    Corpus(String),
    #[error("corpus index is not ready")]
    NotReady,
}

impl From<reqwest::Error> for RagError {
    fn from(err: reqwest::Error) -> Self {
        RagError::Upstream(err.to_string())
    }
}

/// Errors surfaced to HTTP callers. Details stay in the logs.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Question is required")]
    Validation,
    #[error("Service not ready")]
    NotReady,
    #[error("Internal server error")]
    Internal,
}

impl From<RagError> for ApiError {
    fn from(err: RagError) -> Self {
        match err {
            RagError::NotReady => ApiError::NotReady,
            _ => ApiError::Internal,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            ApiError::Validation => StatusCode::BAD_REQUEST,
            ApiError::NotReady => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
