//! Booking lifecycle state machine.

use serde::{Deserialize, Serialize};

/// The status of a booking in its lifecycle.
///
/// Status transitions:
/// ```text
/// Pending ──► AwaitingPayment ──┬──► Confirmed
///     │              │          ├──► Failed
///     │              │          └──► Cancelled
///     └──────────────┴──► Failed | Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BookingStatus {
    /// Booking record created, payment not yet requested.
    #[default]
    Pending,

    /// Payment push issued, waiting for settlement.
    AwaitingPayment,

    /// Payment settled; the booking occupies its space (terminal state).
    Confirmed,

    /// Payment rejected or timed out (terminal state).
    Failed,

    /// Aborted by the user before settlement (terminal state).
    Cancelled,
}

impl BookingStatus {
    /// Returns true if the booking can move to `AwaitingPayment`.
    pub fn can_await_payment(&self) -> bool {
        matches!(self, BookingStatus::Pending)
    }

    /// Returns true if the booking can be confirmed.
    pub fn can_confirm(&self) -> bool {
        matches!(self, BookingStatus::AwaitingPayment)
    }

    /// Returns true if the booking can be failed or cancelled.
    pub fn can_resolve(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::AwaitingPayment)
    }

    /// Returns true if `next` is a legal transition from this status.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        match next {
            BookingStatus::Pending => false,
            BookingStatus::AwaitingPayment => self.can_await_payment(),
            BookingStatus::Confirmed => self.can_confirm(),
            BookingStatus::Failed | BookingStatus::Cancelled => self.can_resolve(),
        }
    }

    /// Returns true if this is a terminal status (no further transitions).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Confirmed | BookingStatus::Failed | BookingStatus::Cancelled
        )
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "Pending",
            BookingStatus::AwaitingPayment => "AwaitingPayment",
            BookingStatus::Confirmed => "Confirmed",
            BookingStatus::Failed => "Failed",
            BookingStatus::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
