//! Reservation error types and machine-readable reason codes.

use clients::ClientError;
use common::{BookingId, SpaceId};
use payment::PaymentError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Machine-readable reason code attached to every terminal failure, so
/// callers can render an accurate message without string matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureReason {
    /// The space is occupied or has an attempt in flight.
    SpaceUnavailable,
    /// The requested space does not exist.
    SpaceNotFound,
    /// Payment channel identifier failed validation.
    InvalidChannel,
    /// Requested duration failed validation.
    InvalidDuration,
    /// The booking ledger refused or could not create the record.
    BookingCreationError,
    /// The provider declined the payment.
    PaymentRejected,
    /// The payment did not settle within the poll budget.
    PaymentTimeout,
    /// The user aborted the attempt before settlement.
    Cancelled,
    /// The provider could not be reached after bounded retries.
    ProviderUnavailable,
    /// The catalog or ledger could not be reached after bounded retries.
    CatalogUnavailable,
}

impl FailureReason {
    /// Returns the reason code as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::SpaceUnavailable => "SpaceUnavailable",
            FailureReason::SpaceNotFound => "SpaceNotFound",
            FailureReason::InvalidChannel => "InvalidChannel",
            FailureReason::InvalidDuration => "InvalidDuration",
            FailureReason::BookingCreationError => "BookingCreationError",
            FailureReason::PaymentRejected => "PaymentRejected",
            FailureReason::PaymentTimeout => "PaymentTimeout",
            FailureReason::Cancelled => "Cancelled",
            FailureReason::ProviderUnavailable => "ProviderUnavailable",
            FailureReason::CatalogUnavailable => "CatalogUnavailable",
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Warning surfaced when the payment settled but one of the commit writes
/// could not be completed in-flow. The booking stays confirmed; the
/// reconciliation pass repairs the lagging write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartialCommitWarning {
    /// The booking-status write failed after settlement.
    BookingStatusLagging,
    /// The availability-flag write failed after the booking was confirmed.
    AvailabilityLagging,
}

/// Errors raised by the reservation orchestrator.
#[derive(Debug, Error)]
pub enum ReservationError {
    /// Space is occupied or already has an attempt in flight.
    #[error("Space {0} is not available")]
    SpaceUnavailable(SpaceId),

    /// The requested space does not exist.
    #[error("Space {0} not found")]
    SpaceNotFound(SpaceId),

    /// Payment channel failed validation; nothing was mutated.
    #[error("Invalid payment channel: {0:?}")]
    InvalidChannel(String),

    /// Duration failed validation; nothing was mutated.
    #[error("Invalid booking duration: {0}")]
    InvalidDuration(u32),

    /// Booking record could not be created.
    #[error("Booking creation failed: {0}")]
    BookingCreation(#[source] ClientError),

    /// The provider declined the payment; the booking was rolled back.
    #[error("Payment rejected for booking {booking_id}")]
    PaymentRejected { booking_id: BookingId },

    /// The payment never settled; the booking was rolled back.
    #[error("Payment timed out for booking {booking_id} after {polls} polls")]
    PaymentTimeout { booking_id: BookingId, polls: u32 },

    /// The user cancelled before settlement; the booking was rolled back.
    #[error("Reservation cancelled for booking {booking_id}")]
    Cancelled { booking_id: BookingId },

    /// Payment initiation failed; the booking was rolled back.
    #[error(transparent)]
    Payment(#[from] PaymentError),

    /// Catalog or ledger could not be reached after bounded retries.
    #[error(transparent)]
    Client(#[from] ClientError),
}

impl ReservationError {
    /// Returns the machine-readable reason code for this failure.
    pub fn reason(&self) -> FailureReason {
        match self {
            ReservationError::SpaceUnavailable(_) => FailureReason::SpaceUnavailable,
            ReservationError::SpaceNotFound(_) => FailureReason::SpaceNotFound,
            ReservationError::InvalidChannel(_) => FailureReason::InvalidChannel,
            ReservationError::InvalidDuration(_) => FailureReason::InvalidDuration,
            ReservationError::BookingCreation(_) => FailureReason::BookingCreationError,
            ReservationError::PaymentRejected { .. } => FailureReason::PaymentRejected,
            ReservationError::PaymentTimeout { .. } => FailureReason::PaymentTimeout,
            ReservationError::Cancelled { .. } => FailureReason::Cancelled,
            ReservationError::Payment(PaymentError::ProviderRejected(_)) => {
                FailureReason::PaymentRejected
            }
            ReservationError::Payment(_) => FailureReason::ProviderUnavailable,
            ReservationError::Client(_) => FailureReason::CatalogUnavailable,
        }
    }
}

/// Convenience type alias for orchestrator results.
pub type Result<T> = std::result::Result<T, ReservationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_codes() {
        assert_eq!(
            ReservationError::SpaceUnavailable(SpaceId::new()).reason(),
            FailureReason::SpaceUnavailable
        );
        assert_eq!(
            ReservationError::InvalidChannel("bad".into()).reason(),
            FailureReason::InvalidChannel
        );
        assert_eq!(
            ReservationError::PaymentTimeout {
                booking_id: BookingId::new(),
                polls: 5
            }
            .reason(),
            FailureReason::PaymentTimeout
        );
        assert_eq!(
            ReservationError::Payment(PaymentError::ProviderRejected("declined".into())).reason(),
            FailureReason::PaymentRejected
        );
        assert_eq!(
            ReservationError::Client(ClientError::Transport("down".into())).reason(),
            FailureReason::CatalogUnavailable
        );
    }

    #[test]
    fn test_reason_display_matches_code() {
        assert_eq!(FailureReason::SpaceUnavailable.to_string(), "SpaceUnavailable");
        assert_eq!(FailureReason::PaymentTimeout.to_string(), "PaymentTimeout");
    }
}
