//! Client error types.

use thiserror::Error;

/// Errors raised by the catalog and ledger clients.
///
/// `Transport` errors are transient and safe to retry; the other variants
/// are definitive answers from the endpoint and must not be retried.
#[derive(Debug, Error, Clone)]
pub enum ClientError {
    /// Network-level failure: connect, timeout, broken body.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The endpoint refused the request.
    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The addressed resource does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The endpoint returned a payload we could not decode.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl ClientError {
    /// Returns true if the error is transient and the call may be retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }
}

/// Convenience type alias for client results.
pub type Result<T> = std::result::Result<T, ClientError>;
