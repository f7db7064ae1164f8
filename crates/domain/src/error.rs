//! Domain error types.

use thiserror::Error;

/// Errors raised by domain validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Payment channel identifier is not a recognized mobile number format.
    #[error("Invalid payment channel: {0:?}")]
    InvalidChannel(String),
}
