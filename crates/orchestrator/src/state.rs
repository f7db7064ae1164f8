//! Reservation attempt state machine.

use serde::{Deserialize, Serialize};

/// The state of a reservation attempt in its lifecycle.
///
/// State transitions:
/// ```text
/// Idle ──► ReservationRequested ──► BookingCreated ──► PaymentInitiated
///                │                        │                  │
///                ▼                        ▼                  ▼
///              Failed ◄──────────── RollingBack ◄──── PaymentPolling ──► Committing ──► Confirmed
///                                        │
///                                        └──► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ReservationState {
    /// No attempt in progress.
    #[default]
    Idle,

    /// Reservation intent received, availability not yet verified.
    ReservationRequested,

    /// Booking record exists in the ledger.
    BookingCreated,

    /// Payment push issued to the provider.
    PaymentInitiated,

    /// Polling the provider for settlement.
    PaymentPolling,

    /// Payment settled; writing booking status and availability.
    Committing,

    /// Resolving the booking after a failed or abandoned payment.
    RollingBack,

    /// Booking confirmed and space occupied (terminal state).
    Confirmed,

    /// Attempt failed with a reason code (terminal state).
    Failed,

    /// Attempt aborted by the user before settlement (terminal state).
    Cancelled,
}

impl ReservationState {
    /// Returns true if a reservation request can start from this state.
    pub fn can_request(&self) -> bool {
        matches!(self, ReservationState::Idle)
    }

    /// Returns true if a booking record can be created in this state.
    pub fn can_create_booking(&self) -> bool {
        matches!(self, ReservationState::ReservationRequested)
    }

    /// Returns true if a payment push can be issued in this state.
    pub fn can_initiate_payment(&self) -> bool {
        matches!(self, ReservationState::BookingCreated)
    }

    /// Returns true if the attempt is waiting on a payment outcome.
    pub fn is_awaiting_settlement(&self) -> bool {
        matches!(
            self,
            ReservationState::PaymentInitiated | ReservationState::PaymentPolling
        )
    }

    /// Returns true if this is a terminal state (no further transitions).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ReservationState::Confirmed | ReservationState::Failed | ReservationState::Cancelled
        )
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationState::Idle => "Idle",
            ReservationState::ReservationRequested => "ReservationRequested",
            ReservationState::BookingCreated => "BookingCreated",
            ReservationState::PaymentInitiated => "PaymentInitiated",
            ReservationState::PaymentPolling => "PaymentPolling",
            ReservationState::Committing => "Committing",
            ReservationState::RollingBack => "RollingBack",
            ReservationState::Confirmed => "Confirmed",
            ReservationState::Failed => "Failed",
            ReservationState::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for ReservationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_idle() {
        assert_eq!(ReservationState::default(), ReservationState::Idle);
    }

    #[test]
    fn test_can_request() {
        assert!(ReservationState::Idle.can_request());
        assert!(!ReservationState::ReservationRequested.can_request());
        assert!(!ReservationState::Confirmed.can_request());
    }

    #[test]
    fn test_can_create_booking() {
        assert!(ReservationState::ReservationRequested.can_create_booking());
        assert!(!ReservationState::Idle.can_create_booking());
        assert!(!ReservationState::BookingCreated.can_create_booking());
    }

    #[test]
    fn test_can_initiate_payment() {
        assert!(ReservationState::BookingCreated.can_initiate_payment());
        assert!(!ReservationState::PaymentInitiated.can_initiate_payment());
        assert!(!ReservationState::RollingBack.can_initiate_payment());
    }

    #[test]
    fn test_is_awaiting_settlement() {
        assert!(ReservationState::PaymentInitiated.is_awaiting_settlement());
        assert!(ReservationState::PaymentPolling.is_awaiting_settlement());
        assert!(!ReservationState::Committing.is_awaiting_settlement());
        assert!(!ReservationState::Failed.is_awaiting_settlement());
    }

    #[test]
    fn test_terminal_states() {
        assert!(ReservationState::Confirmed.is_terminal());
        assert!(ReservationState::Failed.is_terminal());
        assert!(ReservationState::Cancelled.is_terminal());

        assert!(!ReservationState::Idle.is_terminal());
        assert!(!ReservationState::ReservationRequested.is_terminal());
        assert!(!ReservationState::BookingCreated.is_terminal());
        assert!(!ReservationState::PaymentInitiated.is_terminal());
        assert!(!ReservationState::PaymentPolling.is_terminal());
        assert!(!ReservationState::Committing.is_terminal());
        assert!(!ReservationState::RollingBack.is_terminal());
    }

    #[test]
    fn test_display() {
        assert_eq!(ReservationState::Idle.to_string(), "Idle");
        assert_eq!(ReservationState::PaymentPolling.to_string(), "PaymentPolling");
        assert_eq!(ReservationState::Confirmed.to_string(), "Confirmed");
    }

    #[test]
    fn test_serialization() {
        let state = ReservationState::Committing;
        let json = serde_json::to_string(&state).unwrap();
        let deserialized: ReservationState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, deserialized);
    }
}
