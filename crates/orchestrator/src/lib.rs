//! Reservation orchestration core for the space booking platform.
//!
//! Drives the booking–payment–availability flow as an explicit state
//! machine: a reservation attempt moves through booking creation, payment
//! initiation, settlement polling, and commit or rollback, with every
//! transition recorded as an event. A periodic reconciliation pass repairs
//! the drift partial failures leave behind.

pub mod attempt;
pub mod error;
pub mod events;
pub mod orchestrator;
pub mod reconciler;
pub mod retry;
pub mod state;

pub use attempt::ReservationAttempt;
pub use error::{FailureReason, PartialCommitWarning, ReservationError};
pub use events::ReservationEvent;
pub use orchestrator::{
    OrchestratorConfig, ReservationOrchestrator, ReservationReceipt, ReservationRequest,
};
pub use reconciler::{ReconcileReport, Reconciler, ReconcilerConfig};
pub use retry::{RetryPolicy, Retryable, with_retry};
pub use state::ReservationState;
