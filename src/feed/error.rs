use crate::kv_store::StoreError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Failures of feed reads and interactive actions.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Not logged in")]
    Unauthenticated,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Upstream service unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}

impl FeedError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            FeedError::Unauthenticated => StatusCode::UNAUTHORIZED,
            FeedError::Forbidden(_) => StatusCode::FORBIDDEN,
            FeedError::InvalidInput(_) | FeedError::NotFound(_) => StatusCode::BAD_REQUEST,
            FeedError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            FeedError::StoreUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Label used by the error metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            FeedError::Unauthenticated => "unauthenticated",
            FeedError::Forbidden(_) => "forbidden",
            FeedError::InvalidInput(_) => "invalid_input",
            FeedError::NotFound(_) => "not_found",
            FeedError::UpstreamUnavailable(_) => "upstream_unavailable",
            FeedError::StoreUnavailable(_) => "store_unavailable",
        }
    }
}

impl IntoResponse for FeedError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // Backend details stay in the logs.
        let message = match &self {
            FeedError::StoreUnavailable(_) => "Internal server error".to_string(),
            FeedError::UpstreamUnavailable(_) => "Upstream service unavailable".to_string(),
            other => other.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
