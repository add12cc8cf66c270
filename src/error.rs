//! Error types for the infrastructure service
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Service Error Enum ==
/// Unified error type for the infrastructure service.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Requested resource does not exist (cache key, queue item)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Storage backend unreachable or failing
    #[error("Backend unavailable: {0}")]
    Backend(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// True for the backend-unavailable error class, which the cache layer
    /// recovers from by falling back to the in-memory backend.
    pub fn is_backend_failure(&self) -> bool {
        matches!(self, ServiceError::Backend(_))
    }
}

impl From<redis::RedisError> for ServiceError {
    fn from(err: redis::RedisError) -> Self {
        ServiceError::Backend(err.to_string())
    }
}

impl From<std::io::Error> for ServiceError {
    fn from(err: std::io::Error) -> Self {
        ServiceError::Backend(err.to_string())
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::Internal(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServiceError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ServiceError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ServiceError::Backend(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            ServiceError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the infrastructure service.
pub type Result<T> = std::result::Result<T, ServiceError>;
