//! Error types for the TTL cache
//!
//! Provides unified error handling using thiserror.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache and its HTTP front end.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// TTL must be a positive duration
    #[error("Invalid TTL: {0:?} (must be greater than zero)")]
    InvalidTtl(Duration),

    /// The sweeper needs a Tokio runtime to be spawned on
    #[error("No Tokio runtime available to run the TTL sweeper")]
    NoRuntime,

    /// The sweeper was already signalled to stop
    #[error("TTL sweeper already stopped")]
    SweeperStopped,

    /// Key not found in cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) | CacheError::InvalidTtl(_) => StatusCode::BAD_REQUEST,
            CacheError::SweeperStopped => StatusCode::CONFLICT,
            CacheError::NoRuntime => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
