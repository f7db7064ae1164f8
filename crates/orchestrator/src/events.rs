//! Reservation attempt events.
//!
//! Every step of the flow is recorded as an event and fed through
//! [`ReservationAttempt::apply`](crate::attempt::ReservationAttempt::apply);
//! the attempt's state is only ever changed by applying one of these.

use chrono::{DateTime, Utc};
use common::{BookingId, SpaceId, UserId};
use domain::{BookingStatus, Money, RateUnit};
use payment::TransactionId;
use serde::{Deserialize, Serialize};

use crate::error::{FailureReason, PartialCommitWarning};

/// Events that can occur during a reservation attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ReservationEvent {
    /// Reservation intent received.
    Requested(RequestedData),

    /// Attempt rejected before a booking record existed.
    Rejected(RejectedData),

    /// Booking record created in the ledger.
    BookingCreated(BookingCreatedData),

    /// Ledger refused or could not create the booking record.
    BookingRejected(BookingRejectedData),

    /// Payment push issued to the provider.
    PaymentInitiated(PaymentInitiatedData),

    /// Provider refused or could not accept the payment push.
    PaymentInitiationFailed(PaymentInitiationFailedData),

    /// Settlement polling started.
    PollingStarted,

    /// Provider reported the payment settled.
    PaymentConfirmed(PollResultData),

    /// Provider declined the payment.
    PaymentFailed(PollResultData),

    /// Poll budget exhausted while the provider still reported processing.
    PaymentTimedOut(PollResultData),

    /// User asked to abort before settlement.
    CancellationRequested,

    /// Another settled attempt took the space before this one committed.
    CommitConflict,

    /// Booking confirmed and availability flipped.
    CommitCompleted(CommitCompletedData),

    /// Payment settled but a commit write is lagging; reconciliation will
    /// repair it.
    CommitDeferred(CommitDeferredData),

    /// Booking resolved to its final status after a failed or abandoned
    /// payment.
    RolledBack(RolledBackData),
}

/// Data for the Requested event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestedData {
    /// The space being reserved.
    pub space_id: SpaceId,
    /// The requesting user.
    pub user_id: UserId,
    /// Number of rate units requested.
    pub duration: u32,
    /// Billing granularity.
    pub unit: RateUnit,
    /// When the intent was received.
    pub requested_at: DateTime<Utc>,
}

/// Data for the Rejected event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectedData {
    /// Why the attempt was rejected.
    pub reason: FailureReason,
}

/// Data for the BookingCreated event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingCreatedData {
    /// The ledger-assigned booking id.
    pub booking_id: BookingId,
    /// Computed total amount.
    pub amount: Money,
}

/// Data for the BookingRejected event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRejectedData {
    /// Error message from the ledger.
    pub error: String,
}

/// Data for the PaymentInitiated event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInitiatedData {
    /// Provider-assigned transaction id.
    pub transaction_id: TransactionId,
}

/// Data for the PaymentInitiationFailed event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInitiationFailedData {
    /// Error message from the initiator.
    pub error: String,
}

/// Data for poll outcome events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollResultData {
    /// How many polls were issued before the outcome.
    pub polls: u32,
}

/// Data for the CommitCompleted event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitCompletedData {
    /// When both commit writes landed.
    pub completed_at: DateTime<Utc>,
}

/// Data for the CommitDeferred event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitDeferredData {
    /// Which commit write is lagging.
    pub warning: PartialCommitWarning,
}

/// Data for the RolledBack event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RolledBackData {
    /// Final booking status written by the rollback.
    pub final_status: BookingStatus,
    /// Why the attempt was rolled back.
    pub reason: FailureReason,
}

impl ReservationEvent {
    /// Returns the event name for logging.
    pub fn event_type(&self) -> &'static str {
        match self {
            ReservationEvent::Requested(_) => "Requested",
            ReservationEvent::Rejected(_) => "Rejected",
            ReservationEvent::BookingCreated(_) => "BookingCreated",
            ReservationEvent::BookingRejected(_) => "BookingRejected",
            ReservationEvent::PaymentInitiated(_) => "PaymentInitiated",
            ReservationEvent::PaymentInitiationFailed(_) => "PaymentInitiationFailed",
            ReservationEvent::PollingStarted => "PollingStarted",
            ReservationEvent::PaymentConfirmed(_) => "PaymentConfirmed",
            ReservationEvent::PaymentFailed(_) => "PaymentFailed",
            ReservationEvent::PaymentTimedOut(_) => "PaymentTimedOut",
            ReservationEvent::CancellationRequested => "CancellationRequested",
            ReservationEvent::CommitConflict => "CommitConflict",
            ReservationEvent::CommitCompleted(_) => "CommitCompleted",
            ReservationEvent::CommitDeferred(_) => "CommitDeferred",
            ReservationEvent::RolledBack(_) => "RolledBack",
        }
    }
}

// Convenience constructors
impl ReservationEvent {
    /// Creates a Requested event.
    pub fn requested(space_id: SpaceId, user_id: UserId, duration: u32, unit: RateUnit) -> Self {
        ReservationEvent::Requested(RequestedData {
            space_id,
            user_id,
            duration,
            unit,
            requested_at: Utc::now(),
        })
    }

    /// Creates a Rejected event.
    pub fn rejected(reason: FailureReason) -> Self {
        ReservationEvent::Rejected(RejectedData { reason })
    }

    /// Creates a BookingCreated event.
    pub fn booking_created(booking_id: BookingId, amount: Money) -> Self {
        ReservationEvent::BookingCreated(BookingCreatedData { booking_id, amount })
    }

    /// Creates a BookingRejected event.
    pub fn booking_rejected(error: impl Into<String>) -> Self {
        ReservationEvent::BookingRejected(BookingRejectedData {
            error: error.into(),
        })
    }

    /// Creates a PaymentInitiated event.
    pub fn payment_initiated(transaction_id: TransactionId) -> Self {
        ReservationEvent::PaymentInitiated(PaymentInitiatedData { transaction_id })
    }

    /// Creates a PaymentInitiationFailed event.
    pub fn payment_initiation_failed(error: impl Into<String>) -> Self {
        ReservationEvent::PaymentInitiationFailed(PaymentInitiationFailedData {
            error: error.into(),
        })
    }

    /// Creates a PaymentConfirmed event.
    pub fn payment_confirmed(polls: u32) -> Self {
        ReservationEvent::PaymentConfirmed(PollResultData { polls })
    }

    /// Creates a PaymentFailed event.
    pub fn payment_failed(polls: u32) -> Self {
        ReservationEvent::PaymentFailed(PollResultData { polls })
    }

    /// Creates a PaymentTimedOut event.
    pub fn payment_timed_out(polls: u32) -> Self {
        ReservationEvent::PaymentTimedOut(PollResultData { polls })
    }

    /// Creates a CommitCompleted event.
    pub fn commit_completed() -> Self {
        ReservationEvent::CommitCompleted(CommitCompletedData {
            completed_at: Utc::now(),
        })
    }

    /// Creates a CommitDeferred event.
    pub fn commit_deferred(warning: PartialCommitWarning) -> Self {
        ReservationEvent::CommitDeferred(CommitDeferredData { warning })
    }

    /// Creates a RolledBack event.
    pub fn rolled_back(final_status: BookingStatus, reason: FailureReason) -> Self {
        ReservationEvent::RolledBack(RolledBackData {
            final_status,
            reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type() {
        assert_eq!(
            ReservationEvent::requested(SpaceId::new(), UserId::new(), 2, RateUnit::Hour)
                .event_type(),
            "Requested"
        );
        assert_eq!(
            ReservationEvent::booking_created(BookingId::new(), Money::from_units(20)).event_type(),
            "BookingCreated"
        );
        assert_eq!(
            ReservationEvent::payment_initiated(TransactionId::new("TX-0001")).event_type(),
            "PaymentInitiated"
        );
        assert_eq!(ReservationEvent::PollingStarted.event_type(), "PollingStarted");
        assert_eq!(
            ReservationEvent::payment_timed_out(5).event_type(),
            "PaymentTimedOut"
        );
        assert_eq!(
            ReservationEvent::rolled_back(BookingStatus::Failed, FailureReason::PaymentRejected)
                .event_type(),
            "RolledBack"
        );
    }

    #[test]
    fn test_serialization_roundtrip() {
        let events = vec![
            ReservationEvent::requested(SpaceId::new(), UserId::new(), 2, RateUnit::Hour),
            ReservationEvent::rejected(FailureReason::SpaceUnavailable),
            ReservationEvent::booking_created(BookingId::new(), Money::from_units(20)),
            ReservationEvent::booking_rejected("ledger down"),
            ReservationEvent::payment_initiated(TransactionId::new("TX-0001")),
            ReservationEvent::payment_initiation_failed("push declined"),
            ReservationEvent::PollingStarted,
            ReservationEvent::payment_confirmed(2),
            ReservationEvent::payment_failed(1),
            ReservationEvent::payment_timed_out(30),
            ReservationEvent::CancellationRequested,
            ReservationEvent::CommitConflict,
            ReservationEvent::commit_completed(),
            ReservationEvent::commit_deferred(PartialCommitWarning::AvailabilityLagging),
            ReservationEvent::rolled_back(BookingStatus::Cancelled, FailureReason::Cancelled),
        ];

        for event in events {
            let json = serde_json::to_string(&event).unwrap();
            let deserialized: ReservationEvent = serde_json::from_str(&json).unwrap();
            assert_eq!(event.event_type(), deserialized.event_type());
        }
    }
}
