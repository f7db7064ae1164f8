//! Payment initiator: duplicate guard and terminal-status caching over the
//! provider gateway.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::Utc;
use common::BookingId;
use domain::{Money, Msisdn};

use crate::attempt::{AttemptStatus, PaymentAttempt, PaymentStatus, TransactionId};
use crate::error::PaymentError;
use crate::gateway::PaymentGateway;

#[derive(Debug, Default)]
struct InitiatorState {
    attempts: HashMap<BookingId, PaymentAttempt>,
    booking_by_transaction: HashMap<TransactionId, BookingId>,
}

/// Issues push payments and tracks one attempt per booking.
///
/// Guarantees layered on the raw gateway:
/// - at most one non-terminal attempt per booking (`DuplicateInFlight`);
/// - terminal attempts are immutable, and polls against them answer from
///   the record without another provider call.
#[derive(Debug, Clone)]
pub struct PaymentInitiator<G: PaymentGateway> {
    gateway: G,
    state: Arc<RwLock<InitiatorState>>,
}

impl<G: PaymentGateway> PaymentInitiator<G> {
    /// Creates an initiator over the given provider gateway.
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            state: Arc::new(RwLock::new(InitiatorState::default())),
        }
    }

    /// Issues a push payment for a booking.
    ///
    /// The channel is validated at `Msisdn` construction, so by this point
    /// it is well-formed. Fails with `DuplicateInFlight` if a non-terminal
    /// attempt already exists for the booking.
    #[tracing::instrument(skip(self), fields(booking_id = %booking_id, amount = %amount))]
    pub async fn initiate(
        &self,
        channel: &Msisdn,
        amount: Money,
        booking_id: BookingId,
    ) -> Result<PaymentAttempt, PaymentError> {
        {
            let state = self.state.read().unwrap();
            if let Some(existing) = state.attempts.get(&booking_id)
                && existing.in_flight()
            {
                return Err(PaymentError::DuplicateInFlight(booking_id));
            }
        }

        let transaction_id = self.gateway.push(channel, amount, booking_id).await?;
        tracing::info!(%transaction_id, "payment push issued");

        let attempt = PaymentAttempt {
            channel: channel.clone(),
            amount,
            booking_id,
            transaction_id: transaction_id.clone(),
            status: AttemptStatus::Initiated,
            initiated_at: Utc::now(),
        };

        let mut state = self.state.write().unwrap();
        state.attempts.insert(booking_id, attempt.clone());
        state.booking_by_transaction.insert(transaction_id, booking_id);
        Ok(attempt)
    }

    /// Looks up the settlement state of a transaction.
    ///
    /// Read-only with respect to the provider: once the attempt has settled
    /// (`Confirmed`/`Failed`), the recorded terminal state is returned and
    /// the provider is not consulted again.
    pub async fn poll_status(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<PaymentStatus, PaymentError> {
        let booking_id = {
            let state = self.state.read().unwrap();
            let booking_id = state
                .booking_by_transaction
                .get(transaction_id)
                .copied()
                .ok_or_else(|| PaymentError::UnknownTransaction(transaction_id.clone()))?;

            match state.attempts.get(&booking_id).map(|a| a.status) {
                Some(AttemptStatus::Confirmed) => return Ok(PaymentStatus::Confirmed),
                Some(AttemptStatus::Failed) => return Ok(PaymentStatus::Failed),
                _ => booking_id,
            }
        };

        let status = self.gateway.status(transaction_id).await?;

        {
            let mut state = self.state.write().unwrap();
            if let Some(attempt) = state.attempts.get_mut(&booking_id)
                && !attempt.status.is_terminal()
            {
                attempt.status = match status {
                    PaymentStatus::Processing => AttemptStatus::Processing,
                    PaymentStatus::Confirmed => AttemptStatus::Confirmed,
                    PaymentStatus::Failed => AttemptStatus::Failed,
                };
            }
        }

        Ok(status)
    }

    /// Records that the poll budget for a booking's attempt has expired.
    ///
    /// The attempt becomes `TimedOut` (terminal), which releases the
    /// duplicate guard for any later reservation attempt on the booking.
    pub fn mark_timed_out(&self, booking_id: BookingId) {
        let mut state = self.state.write().unwrap();
        if let Some(attempt) = state.attempts.get_mut(&booking_id)
            && !attempt.status.is_terminal()
        {
            attempt.status = AttemptStatus::TimedOut;
            tracing::warn!(%booking_id, transaction_id = %attempt.transaction_id, "payment attempt timed out");
        }
    }

    /// Returns the current attempt for a booking, if any.
    pub fn attempt_for(&self, booking_id: BookingId) -> Option<PaymentAttempt> {
        self.state.read().unwrap().attempts.get(&booking_id).cloned()
    }
}
