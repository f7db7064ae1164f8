//! Payment provider boundary: trait, scripted in-memory gateway, HTTP gateway.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::BookingId;
use domain::{Money, Msisdn};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::attempt::{PaymentStatus, TransactionId};
use crate::error::PaymentError;

/// The external push-payment provider as the initiator sees it.
///
/// `status` is a read-only lookup and must be safe to call repeatedly;
/// the provider's settlement logic stays behind this boundary.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Issues a push request and returns the provider transaction id.
    async fn push(
        &self,
        channel: &Msisdn,
        amount: Money,
        reference: BookingId,
    ) -> Result<TransactionId, PaymentError>;

    /// Looks up the current settlement state of a transaction.
    async fn status(&self, transaction_id: &TransactionId) -> Result<PaymentStatus, PaymentError>;
}

/// How the in-memory gateway resolves a pushed payment.
#[derive(Debug, Clone, Copy)]
pub enum ScriptedOutcome {
    /// Report `Processing` until the Nth poll, then `Confirmed`.
    ConfirmAfter(u32),
    /// Report `Processing` until the Nth poll, then `Failed`.
    FailAfter(u32),
    /// Never resolve; every poll reports `Processing`.
    StuckProcessing,
    /// Refuse the push request itself.
    RejectPush,
}

#[derive(Debug)]
struct GatewayState {
    outcome: ScriptedOutcome,
    next_id: u32,
    polls_by_transaction: HashMap<TransactionId, u32>,
    push_count: u32,
    poll_count: u32,
}

impl Default for GatewayState {
    fn default() -> Self {
        Self {
            outcome: ScriptedOutcome::ConfirmAfter(1),
            next_id: 0,
            polls_by_transaction: HashMap::new(),
            push_count: 0,
            poll_count: 0,
        }
    }
}

/// In-memory payment gateway with scripted settlement outcomes, for tests
/// and demo wiring.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentGateway {
    state: Arc<RwLock<GatewayState>>,
}

impl InMemoryPaymentGateway {
    /// Creates a gateway that confirms on the first poll.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts how subsequently pushed payments resolve.
    pub fn set_outcome(&self, outcome: ScriptedOutcome) {
        self.state.write().unwrap().outcome = outcome;
    }

    /// Returns the number of push requests received.
    pub fn push_count(&self) -> u32 {
        self.state.read().unwrap().push_count
    }

    /// Returns the number of status lookups received.
    pub fn poll_count(&self) -> u32 {
        self.state.read().unwrap().poll_count
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    async fn push(
        &self,
        _channel: &Msisdn,
        _amount: Money,
        _reference: BookingId,
    ) -> Result<TransactionId, PaymentError> {
        let mut state = self.state.write().unwrap();
        state.push_count += 1;

        if matches!(state.outcome, ScriptedOutcome::RejectPush) {
            return Err(PaymentError::ProviderRejected(
                "push request declined".to_string(),
            ));
        }

        state.next_id += 1;
        let transaction_id = TransactionId::new(format!("TX-{:04}", state.next_id));
        state
            .polls_by_transaction
            .insert(transaction_id.clone(), 0);
        Ok(transaction_id)
    }

    async fn status(&self, transaction_id: &TransactionId) -> Result<PaymentStatus, PaymentError> {
        let mut state = self.state.write().unwrap();
        state.poll_count += 1;

        let outcome = state.outcome;
        let polls = state
            .polls_by_transaction
            .get_mut(transaction_id)
            .ok_or_else(|| PaymentError::UnknownTransaction(transaction_id.clone()))?;
        *polls += 1;
        let polls = *polls;

        let status = match outcome {
            ScriptedOutcome::ConfirmAfter(n) if polls >= n => PaymentStatus::Confirmed,
            ScriptedOutcome::FailAfter(n) if polls >= n => PaymentStatus::Failed,
            _ => PaymentStatus::Processing,
        };
        Ok(status)
    }
}

#[derive(Deserialize)]
struct PushResponse {
    mpesa_transaction_id: String,
}

#[derive(Deserialize)]
struct StatusResponse {
    status: PaymentStatus,
}

/// Payment gateway backed by the provider's push and status endpoints.
#[derive(Debug, Clone)]
pub struct HttpPaymentGateway {
    http: Client,
    base_url: String,
}

impl HttpPaymentGateway {
    /// Creates a gateway client for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn push(
        &self,
        channel: &Msisdn,
        amount: Money,
        reference: BookingId,
    ) -> Result<TransactionId, PaymentError> {
        let url = format!("{}/stkpush", self.base_url);
        let body = serde_json::json!({
            "phone_number": channel.as_str(),
            "amount": amount.units(),
            "order_id": reference,
        });

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| PaymentError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PaymentError::ProviderRejected(message));
        }

        let push: PushResponse = response
            .json()
            .await
            .map_err(|e| PaymentError::Transport(e.to_string()))?;
        Ok(TransactionId::new(push.mpesa_transaction_id))
    }

    async fn status(&self, transaction_id: &TransactionId) -> Result<PaymentStatus, PaymentError> {
        let url = format!("{}/payments/{transaction_id}", self.base_url);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| PaymentError::Transport(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(PaymentError::UnknownTransaction(transaction_id.clone()));
        }
        if !response.status().is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PaymentError::Transport(message));
        }

        let status: StatusResponse = response
            .json()
            .await
            .map_err(|e| PaymentError::Transport(e.to_string()))?;
        Ok(status.status)
    }
}
