//! Payment error types.

use common::BookingId;
use thiserror::Error;

use crate::attempt::TransactionId;

/// Errors raised while initiating or polling a payment.
#[derive(Debug, Error, Clone)]
pub enum PaymentError {
    /// A non-terminal attempt already exists for the booking.
    #[error("Payment already in flight for booking {0}")]
    DuplicateInFlight(BookingId),

    /// The provider refused the push request.
    #[error("Provider rejected the payment push: {0}")]
    ProviderRejected(String),

    /// No attempt is known for the given transaction id.
    #[error("Unknown payment transaction: {0}")]
    UnknownTransaction(TransactionId),

    /// Network-level failure talking to the provider.
    #[error("Provider transport error: {0}")]
    Transport(String),
}

impl PaymentError {
    /// Returns true if the error is transient and the call may be retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, PaymentError::Transport(_))
    }
}

/// Convenience type alias for payment results.
pub type Result<T> = std::result::Result<T, PaymentError>;
