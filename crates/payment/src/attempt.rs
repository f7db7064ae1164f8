//! Payment attempt records and status enums.

use chrono::{DateTime, Utc};
use common::BookingId;
use domain::{Money, Msisdn};
use serde::{Deserialize, Serialize};

/// Provider-assigned transaction identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    /// Wraps a provider transaction id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the transaction id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TransactionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TransactionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Settlement state as reported by the provider's status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    /// Push delivered, settlement pending.
    Processing,
    /// Settled successfully (terminal).
    Confirmed,
    /// Declined or expired on the provider side (terminal).
    Failed,
}

impl PaymentStatus {
    /// Returns true if the provider will not change this state again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Confirmed | PaymentStatus::Failed)
    }
}

/// Lifecycle state of a payment attempt as tracked by the initiator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttemptStatus {
    /// Push request accepted by the provider.
    Initiated,
    /// Settlement pending.
    Processing,
    /// Settled successfully (terminal).
    Confirmed,
    /// Declined by the provider (terminal).
    Failed,
    /// Poll budget exhausted before settlement (terminal).
    TimedOut,
}

impl AttemptStatus {
    /// Returns true if the attempt is immutable from here on.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AttemptStatus::Confirmed | AttemptStatus::Failed | AttemptStatus::TimedOut
        )
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptStatus::Initiated => "Initiated",
            AttemptStatus::Processing => "Processing",
            AttemptStatus::Confirmed => "Confirmed",
            AttemptStatus::Failed => "Failed",
            AttemptStatus::TimedOut => "TimedOut",
        }
    }
}

impl std::fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A payment attempt correlated to a booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentAttempt {
    /// The channel the push was sent to.
    pub channel: Msisdn,

    /// Amount requested.
    pub amount: Money,

    /// The booking this attempt settles (correlation id).
    pub booking_id: BookingId,

    /// Provider-assigned transaction id.
    pub transaction_id: TransactionId,

    /// Current attempt status.
    pub status: AttemptStatus,

    /// When the push was issued.
    pub initiated_at: DateTime<Utc>,
}

impl PaymentAttempt {
    /// Returns true if the attempt is still awaiting settlement.
    pub fn in_flight(&self) -> bool {
        !self.status.is_terminal()
    }
}
