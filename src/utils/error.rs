//! The `error` module defines the error type shared across `chatrelay`.
//!
//! Every fallible operation on the write path (ingress, store, persistence)
//! returns [`RelayError`]. The HTTP layer converts it into a status code, so a
//! failed submission never takes the server down.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    /// A submission was missing a field or could not be parsed.
    #[error("invalid submission: {0}")]
    InvalidSubmission(String),

    /// The store was asked to append an id that does not extend it by one.
    #[error("message id mismatch: expected {expected}, got {got}")]
    IdMismatch { expected: i64, got: i64 },

    /// Durable data on disk does not form a contiguous log.
    #[error("corrupt message log: {0}")]
    Corrupt(String),

    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RelayError>;

impl RelayError {
    /// HTTP status reported to the submitting client.
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::InvalidSubmission(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}
