//! Payment initiation for the booking platform.
//!
//! Wraps the external mobile-money provider behind the [`PaymentGateway`]
//! trait and layers the platform's guarantees on top: one in-flight attempt
//! per booking, provider transaction correlation, and immutable terminal
//! attempt records that make repeated status polls idempotent.

pub mod attempt;
pub mod error;
pub mod gateway;
pub mod initiator;

pub use attempt::{AttemptStatus, PaymentAttempt, PaymentStatus, TransactionId};
pub use error::PaymentError;
pub use gateway::{HttpPaymentGateway, InMemoryPaymentGateway, PaymentGateway, ScriptedOutcome};
pub use initiator::PaymentInitiator;
