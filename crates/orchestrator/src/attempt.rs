//! Reservation attempt instance.

use common::{BookingId, SpaceId, UserId};
use domain::Money;
use payment::TransactionId;
use serde::{Deserialize, Serialize};

use crate::error::{FailureReason, PartialCommitWarning};
use crate::events::ReservationEvent;
use crate::state::ReservationState;

/// One end-to-end reservation attempt, driven by events.
///
/// Tracks the state machine position and the context accumulated during the
/// flow (booking id, transaction id, amount). Every state change goes
/// through [`apply`](Self::apply), which also keeps the event log, so a
/// terminal attempt carries the full history of how it got there.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReservationAttempt {
    state: ReservationState,
    space_id: Option<SpaceId>,
    user_id: Option<UserId>,
    booking_id: Option<BookingId>,
    transaction_id: Option<TransactionId>,
    amount: Option<Money>,
    polls: u32,
    failure_reason: Option<FailureReason>,
    warning: Option<PartialCommitWarning>,
    log: Vec<ReservationEvent>,
}

impl ReservationAttempt {
    /// Creates a fresh attempt in `Idle`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies an event, advancing the state machine and recording it in
    /// the log.
    pub fn apply(&mut self, event: ReservationEvent) {
        match &event {
            ReservationEvent::Requested(data) => {
                self.space_id = Some(data.space_id);
                self.user_id = Some(data.user_id);
                self.state = ReservationState::ReservationRequested;
            }
            ReservationEvent::Rejected(data) => {
                self.failure_reason = Some(data.reason);
                self.state = ReservationState::Failed;
            }
            ReservationEvent::BookingCreated(data) => {
                self.booking_id = Some(data.booking_id);
                self.amount = Some(data.amount);
                self.state = ReservationState::BookingCreated;
            }
            ReservationEvent::BookingRejected(_) => {
                self.failure_reason = Some(FailureReason::BookingCreationError);
                self.state = ReservationState::Failed;
            }
            ReservationEvent::PaymentInitiated(data) => {
                self.transaction_id = Some(data.transaction_id.clone());
                self.state = ReservationState::PaymentInitiated;
            }
            ReservationEvent::PaymentInitiationFailed(_) => {
                self.state = ReservationState::RollingBack;
            }
            ReservationEvent::PollingStarted => {
                self.state = ReservationState::PaymentPolling;
            }
            ReservationEvent::PaymentConfirmed(data) => {
                self.polls = data.polls;
                self.state = ReservationState::Committing;
            }
            ReservationEvent::PaymentFailed(data) => {
                self.polls = data.polls;
                self.failure_reason = Some(FailureReason::PaymentRejected);
                self.state = ReservationState::RollingBack;
            }
            ReservationEvent::PaymentTimedOut(data) => {
                self.polls = data.polls;
                self.failure_reason = Some(FailureReason::PaymentTimeout);
                self.state = ReservationState::RollingBack;
            }
            ReservationEvent::CancellationRequested => {
                self.failure_reason = Some(FailureReason::Cancelled);
                self.state = ReservationState::RollingBack;
            }
            ReservationEvent::CommitConflict => {
                self.failure_reason = Some(FailureReason::SpaceUnavailable);
                self.state = ReservationState::RollingBack;
            }
            ReservationEvent::CommitCompleted(_) => {
                self.state = ReservationState::Confirmed;
            }
            ReservationEvent::CommitDeferred(data) => {
                self.warning = Some(data.warning);
                self.state = ReservationState::Confirmed;
            }
            ReservationEvent::RolledBack(data) => {
                self.failure_reason = Some(data.reason);
                self.state = match data.final_status {
                    domain::BookingStatus::Cancelled => ReservationState::Cancelled,
                    _ => ReservationState::Failed,
                };
            }
        }
        self.log.push(event);
    }
}

// Query methods
impl ReservationAttempt {
    /// Returns the current state.
    pub fn state(&self) -> ReservationState {
        self.state
    }

    /// Returns the space being reserved.
    pub fn space_id(&self) -> Option<SpaceId> {
        self.space_id
    }

    /// Returns the requesting user.
    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    /// Returns the booking id, once created.
    pub fn booking_id(&self) -> Option<BookingId> {
        self.booking_id
    }

    /// Returns the provider transaction id, once initiated.
    pub fn transaction_id(&self) -> Option<&TransactionId> {
        self.transaction_id.as_ref()
    }

    /// Returns the computed amount, once the booking exists.
    pub fn amount(&self) -> Option<Money> {
        self.amount
    }

    /// Returns how many settlement polls were issued.
    pub fn polls(&self) -> u32 {
        self.polls
    }

    /// Returns the failure reason, if any.
    pub fn failure_reason(&self) -> Option<FailureReason> {
        self.failure_reason
    }

    /// Returns the partial-commit warning, if any.
    pub fn warning(&self) -> Option<PartialCommitWarning> {
        self.warning
    }

    /// Returns the recorded event history.
    pub fn log(&self) -> &[ReservationEvent] {
        &self.log
    }
}
