//! Reservation orchestrator.
//!
//! Composes the space catalog, booking ledger and payment initiator into a
//! single reservation flow: availability guard, booking creation, payment
//! push, settlement polling, and commit or rollback. The orchestrator is
//! the only component that knows the step ordering and the compensating
//! actions; the clients are unaware of each other.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use clients::{BookingLedger, SpaceCatalog};
use common::{BookingId, SpaceId, UserId};
use domain::{BookingStatus, Money, Msisdn, NewBooking, RateUnit};
use payment::{PaymentGateway, PaymentInitiator, PaymentStatus, TransactionId};
use serde::{Deserialize, Serialize};

use crate::attempt::ReservationAttempt;
use crate::error::{FailureReason, PartialCommitWarning, ReservationError};
use crate::events::ReservationEvent;
use crate::retry::{RetryPolicy, with_retry};

/// Tunables for the reservation flow.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Retry policy for transient catalog/ledger/provider errors.
    pub retry: RetryPolicy,

    /// Delay before the first settlement poll.
    pub poll_interval: Duration,

    /// Growth factor applied to the poll delay after each poll.
    pub poll_backoff_multiplier: f64,

    /// Upper bound on the delay between polls.
    pub max_poll_interval: Duration,

    /// Maximum number of settlement polls per attempt.
    pub max_polls: u32,

    /// Wall-clock budget for the polling phase.
    pub poll_budget: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            poll_interval: Duration::from_secs(2),
            poll_backoff_multiplier: 1.5,
            max_poll_interval: Duration::from_secs(10),
            max_polls: 30,
            poll_budget: Duration::from_secs(120),
        }
    }
}

/// A user's intent to reserve a space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationRequest {
    /// The space to reserve.
    pub space_id: SpaceId,
    /// The requesting user.
    pub user_id: UserId,
    /// Mobile-money channel to push the payment to, as entered.
    pub phone: String,
    /// Number of rate units to book.
    pub duration: u32,
    /// Billing granularity.
    pub unit: RateUnit,
}

/// The result of a confirmed reservation.
#[derive(Debug, Clone, Serialize)]
pub struct ReservationReceipt {
    /// The confirmed booking.
    pub booking_id: BookingId,
    /// The occupied space.
    pub space_id: SpaceId,
    /// Amount settled.
    pub amount: Money,
    /// Provider transaction that settled the booking.
    pub transaction_id: TransactionId,
    /// Set when the payment settled but a commit write is lagging; the
    /// reconciliation pass repairs the drift.
    pub warning: Option<PartialCommitWarning>,
}

/// Outcome of the settlement polling phase.
enum PollOutcome {
    Confirmed(u32),
    Failed(u32),
    TimedOut(u32),
    Cancelled(u32),
}

/// Holds a space's slot in the in-flight set for the duration of a flow.
struct InFlightGuard {
    set: Arc<Mutex<HashSet<SpaceId>>>,
    space_id: SpaceId,
}

impl InFlightGuard {
    fn acquire(set: &Arc<Mutex<HashSet<SpaceId>>>, space_id: SpaceId) -> Option<Self> {
        if set.lock().unwrap().insert(space_id) {
            Some(Self {
                set: set.clone(),
                space_id,
            })
        } else {
            None
        }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.set.lock().unwrap().remove(&self.space_id);
    }
}

/// Orchestrates reservation attempts across the three clients.
///
/// One logical flow per attempt; attempts for different spaces run
/// concurrently and independently. Attempts for the same space are mutually
/// exclusive via the in-flight set, and the final availability write is
/// serialized by a per-space commit lock.
pub struct ReservationOrchestrator<S, B, G>
where
    S: SpaceCatalog,
    B: BookingLedger,
    G: PaymentGateway,
{
    spaces: S,
    bookings: B,
    payments: PaymentInitiator<G>,
    config: OrchestratorConfig,
    in_flight: Arc<Mutex<HashSet<SpaceId>>>,
    commit_locks: Mutex<HashMap<SpaceId, Arc<tokio::sync::Mutex<()>>>>,
    cancel_flags: Mutex<HashMap<BookingId, Arc<AtomicBool>>>,
}

impl<S, B, G> ReservationOrchestrator<S, B, G>
where
    S: SpaceCatalog,
    B: BookingLedger,
    G: PaymentGateway,
{
    /// Creates a new orchestrator over the given clients.
    pub fn new(spaces: S, bookings: B, gateway: G, config: OrchestratorConfig) -> Self {
        Self {
            spaces,
            bookings,
            payments: PaymentInitiator::new(gateway),
            config,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            commit_locks: Mutex::new(HashMap::new()),
            cancel_flags: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the payment initiator.
    pub fn payments(&self) -> &PaymentInitiator<G> {
        &self.payments
    }

    /// Runs one reservation attempt end to end.
    ///
    /// Steps execute strictly in order: booking create, payment initiate,
    /// settlement polling, commit or rollback. No step begins before the
    /// previous one's result is known.
    #[tracing::instrument(skip(self, request), fields(space_id = %request.space_id, user_id = %request.user_id))]
    pub async fn reserve(
        &self,
        request: ReservationRequest,
    ) -> Result<ReservationReceipt, ReservationError> {
        metrics::counter!("reservations_started_total").increment(1);
        let started = std::time::Instant::now();
        let mut attempt = ReservationAttempt::new();

        let result = self.run(&mut attempt, request).await;

        metrics::histogram!("reservation_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        match &result {
            Ok(receipt) => {
                metrics::counter!("reservations_confirmed_total").increment(1);
                tracing::info!(
                    booking_id = %receipt.booking_id,
                    amount = %receipt.amount,
                    warning = ?receipt.warning,
                    "reservation confirmed"
                );
            }
            Err(err) => {
                metrics::counter!("reservations_failed_total", "reason" => err.reason().as_str())
                    .increment(1);
                tracing::warn!(reason = %err.reason(), error = %err, "reservation failed");
            }
        }
        result
    }

    /// Requests cancellation of an in-flight attempt.
    ///
    /// Best-effort: the polling loop observes the flag between polls and
    /// rolls the booking back to `Cancelled`. Returns false if no attempt
    /// is in flight for the booking; a lost signal is backstopped by the
    /// reconciliation pass.
    pub fn cancel(&self, booking_id: BookingId) -> bool {
        match self.cancel_flags.lock().unwrap().get(&booking_id) {
            Some(flag) => {
                flag.store(true, Ordering::SeqCst);
                tracing::info!(%booking_id, "cancellation requested");
                true
            }
            None => false,
        }
    }

    async fn run(
        &self,
        attempt: &mut ReservationAttempt,
        request: ReservationRequest,
    ) -> Result<ReservationReceipt, ReservationError> {
        // Validation first: bad input is rejected before any side effect
        let channel = Msisdn::new(&request.phone)
            .map_err(|_| ReservationError::InvalidChannel(request.phone.clone()))?;
        if request.duration == 0 {
            return Err(ReservationError::InvalidDuration(request.duration));
        }

        attempt.apply(ReservationEvent::requested(
            request.space_id,
            request.user_id,
            request.duration,
            request.unit,
        ));

        let space = with_retry(&self.config.retry, || self.spaces.get(request.space_id))
            .await?
            .ok_or(ReservationError::SpaceNotFound(request.space_id))?;
        if !space.available {
            attempt.apply(ReservationEvent::rejected(FailureReason::SpaceUnavailable));
            return Err(ReservationError::SpaceUnavailable(request.space_id));
        }

        // One attempt per space at a time; the guard is held until the
        // attempt reaches a terminal state
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight, request.space_id) else {
            attempt.apply(ReservationEvent::rejected(FailureReason::SpaceUnavailable));
            return Err(ReservationError::SpaceUnavailable(request.space_id));
        };

        let amount = space.rate(request.unit).multiply(request.duration);
        let start_time = Utc::now();
        let new_booking = NewBooking {
            space_id: request.space_id,
            user_id: request.user_id,
            start_time,
            end_time: start_time + request.unit.span(request.duration),
            amount,
        };

        let booking = match with_retry(&self.config.retry, || {
            self.bookings.create(new_booking.clone())
        })
        .await
        {
            Ok(booking) => booking,
            Err(err) => {
                attempt.apply(ReservationEvent::booking_rejected(err.to_string()));
                return Err(ReservationError::BookingCreation(err));
            }
        };
        attempt.apply(ReservationEvent::booking_created(booking.id, amount));
        tracing::info!(booking_id = %booking.id, %amount, "booking created");

        let cancel = self.register_cancel(booking.id);
        let result = self
            .settle(attempt, &channel, booking.id, request.space_id, amount, &cancel)
            .await;
        self.unregister_cancel(booking.id);
        result
    }

    async fn settle(
        &self,
        attempt: &mut ReservationAttempt,
        channel: &Msisdn,
        booking_id: BookingId,
        space_id: SpaceId,
        amount: Money,
        cancel: &Arc<AtomicBool>,
    ) -> Result<ReservationReceipt, ReservationError> {
        if let Err(err) = with_retry(&self.config.retry, || {
            self.bookings
                .set_status(booking_id, BookingStatus::AwaitingPayment)
        })
        .await
        {
            self.resolve_booking(booking_id, BookingStatus::Failed).await;
            attempt.apply(ReservationEvent::booking_rejected(err.to_string()));
            return Err(ReservationError::BookingCreation(err));
        }

        let payment = match self.payments.initiate(channel, amount, booking_id).await {
            Ok(payment) => payment,
            Err(err) => {
                attempt.apply(ReservationEvent::payment_initiation_failed(err.to_string()));
                self.resolve_booking(booking_id, BookingStatus::Failed).await;
                let err = ReservationError::Payment(err);
                attempt.apply(ReservationEvent::rolled_back(
                    BookingStatus::Failed,
                    err.reason(),
                ));
                return Err(err);
            }
        };
        let transaction_id = payment.transaction_id.clone();
        attempt.apply(ReservationEvent::payment_initiated(transaction_id.clone()));
        attempt.apply(ReservationEvent::PollingStarted);

        match self.poll_settlement(&transaction_id, cancel).await {
            PollOutcome::Confirmed(polls) => {
                attempt.apply(ReservationEvent::payment_confirmed(polls));
                let warning = self.commit(attempt, space_id, booking_id).await?;
                Ok(ReservationReceipt {
                    booking_id,
                    space_id,
                    amount,
                    transaction_id,
                    warning,
                })
            }
            PollOutcome::Failed(polls) => {
                attempt.apply(ReservationEvent::payment_failed(polls));
                self.resolve_booking(booking_id, BookingStatus::Failed).await;
                attempt.apply(ReservationEvent::rolled_back(
                    BookingStatus::Failed,
                    FailureReason::PaymentRejected,
                ));
                Err(ReservationError::PaymentRejected { booking_id })
            }
            PollOutcome::TimedOut(polls) => {
                self.payments.mark_timed_out(booking_id);
                attempt.apply(ReservationEvent::payment_timed_out(polls));
                self.resolve_booking(booking_id, BookingStatus::Failed).await;
                attempt.apply(ReservationEvent::rolled_back(
                    BookingStatus::Failed,
                    FailureReason::PaymentTimeout,
                ));
                Err(ReservationError::PaymentTimeout { booking_id, polls })
            }
            PollOutcome::Cancelled(_) => {
                self.payments.mark_timed_out(booking_id);
                attempt.apply(ReservationEvent::CancellationRequested);
                self.resolve_booking(booking_id, BookingStatus::Cancelled)
                    .await;
                attempt.apply(ReservationEvent::rolled_back(
                    BookingStatus::Cancelled,
                    FailureReason::Cancelled,
                ));
                Err(ReservationError::Cancelled { booking_id })
            }
        }
    }

    /// Polls the provider until a terminal status, the poll budget runs
    /// out, or the attempt is cancelled.
    ///
    /// The sleeps here are the flow's only suspension points; a slow
    /// settlement never blocks attempts for other spaces.
    async fn poll_settlement(
        &self,
        transaction_id: &TransactionId,
        cancel: &Arc<AtomicBool>,
    ) -> PollOutcome {
        let deadline = tokio::time::Instant::now() + self.config.poll_budget;
        let mut delay = self.config.poll_interval;
        let mut polls: u32 = 0;

        loop {
            if cancel.load(Ordering::SeqCst) {
                return PollOutcome::Cancelled(polls);
            }
            if polls >= self.config.max_polls || tokio::time::Instant::now() >= deadline {
                return PollOutcome::TimedOut(polls);
            }

            tokio::time::sleep(delay).await;
            if cancel.load(Ordering::SeqCst) {
                return PollOutcome::Cancelled(polls);
            }

            polls += 1;
            metrics::counter!("payment_polls_total").increment(1);
            match self.payments.poll_status(transaction_id).await {
                Ok(PaymentStatus::Confirmed) => return PollOutcome::Confirmed(polls),
                Ok(PaymentStatus::Failed) => return PollOutcome::Failed(polls),
                Ok(PaymentStatus::Processing) => {}
                Err(err) => {
                    // Transient poll failures burn a poll but not the attempt
                    tracing::warn!(%transaction_id, error = %err, "payment status poll failed");
                }
            }

            delay = delay
                .mul_f64(self.config.poll_backoff_multiplier)
                .min(self.config.max_poll_interval);
        }
    }

    /// Commits a settled attempt: confirm the booking, then occupy the
    /// space, in that order, under the per-space commit lock.
    async fn commit(
        &self,
        attempt: &mut ReservationAttempt,
        space_id: SpaceId,
        booking_id: BookingId,
    ) -> Result<Option<PartialCommitWarning>, ReservationError> {
        let lock = self.commit_lock(space_id);
        let _permit = lock.lock().await;

        // Single-writer-per-space: if another settled attempt occupied the
        // space while this payment was settling, exactly one may win
        let still_available =
            match with_retry(&self.config.retry, || self.spaces.get_availability(space_id)).await {
                Ok(available) => available,
                Err(err) => {
                    tracing::warn!(%space_id, error = %err, "availability re-check failed, proceeding to commit");
                    true
                }
            };
        if !still_available {
            metrics::counter!("reservation_commit_conflicts_total").increment(1);
            attempt.apply(ReservationEvent::CommitConflict);
            self.resolve_booking(booking_id, BookingStatus::Failed).await;
            attempt.apply(ReservationEvent::rolled_back(
                BookingStatus::Failed,
                FailureReason::SpaceUnavailable,
            ));
            return Err(ReservationError::SpaceUnavailable(space_id));
        }

        let mut warning = None;
        if let Err(err) = with_retry(&self.config.retry, || {
            self.bookings.set_status(booking_id, BookingStatus::Confirmed)
        })
        .await
        {
            tracing::error!(%booking_id, error = %err, "booking confirm write failed after settlement");
            warning = Some(PartialCommitWarning::BookingStatusLagging);
        }

        if warning.is_none()
            && let Err(err) = with_retry(&self.config.retry, || {
                self.spaces.set_availability(space_id, false)
            })
            .await
        {
            tracing::error!(%space_id, error = %err, "availability write failed after commit");
            warning = Some(PartialCommitWarning::AvailabilityLagging);
        }

        match warning {
            None => attempt.apply(ReservationEvent::commit_completed()),
            Some(w) => {
                metrics::counter!("reservation_partial_commits_total").increment(1);
                attempt.apply(ReservationEvent::commit_deferred(w));
            }
        }
        Ok(warning)
    }

    /// Writes a booking's terminal status during rollback. The space's
    /// availability is left untouched: it was never flipped.
    async fn resolve_booking(&self, booking_id: BookingId, status: BookingStatus) {
        if let Err(err) = with_retry(&self.config.retry, || {
            self.bookings.set_status(booking_id, status)
        })
        .await
        {
            tracing::error!(
                %booking_id, %status, error = %err,
                "rollback write failed; reconciliation will resolve the booking"
            );
        }
    }

    fn commit_lock(&self, space_id: SpaceId) -> Arc<tokio::sync::Mutex<()>> {
        self.commit_locks
            .lock()
            .unwrap()
            .entry(space_id)
            .or_default()
            .clone()
    }

    fn register_cancel(&self, booking_id: BookingId) -> Arc<AtomicBool> {
        let flag = Arc::new(AtomicBool::new(false));
        self.cancel_flags
            .lock()
            .unwrap()
            .insert(booking_id, flag.clone());
        flag
    }

    fn unregister_cancel(&self, booking_id: BookingId) {
        self.cancel_flags.lock().unwrap().remove(&booking_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clients::{InMemoryBookingLedger, InMemorySpaceCatalog};
    use domain::Space;
    use payment::{AttemptStatus, InMemoryPaymentGateway, ScriptedOutcome};

    type TestOrchestrator =
        ReservationOrchestrator<InMemorySpaceCatalog, InMemoryBookingLedger, InMemoryPaymentGateway>;

    fn test_config() -> OrchestratorConfig {
        OrchestratorConfig {
            retry: RetryPolicy {
                attempts: 3,
                initial_delay: Duration::from_millis(10),
                multiplier: 2.0,
                max_delay: Duration::from_millis(50),
            },
            poll_interval: Duration::from_millis(100),
            poll_backoff_multiplier: 1.5,
            max_poll_interval: Duration::from_millis(500),
            max_polls: 5,
            poll_budget: Duration::from_secs(60),
        }
    }

    fn setup() -> (
        TestOrchestrator,
        InMemorySpaceCatalog,
        InMemoryBookingLedger,
        InMemoryPaymentGateway,
        SpaceId,
    ) {
        let catalog = InMemorySpaceCatalog::new();
        let ledger = InMemoryBookingLedger::new();
        let gateway = InMemoryPaymentGateway::new();

        let space = Space {
            id: SpaceId::new(),
            name: "Atrium".to_string(),
            description: "Street-level atrium".to_string(),
            location: "CBD, Nairobi".to_string(),
            price_per_hour: Money::from_units(10),
            price_per_day: Money::from_units(60),
            available: true,
            image_url: None,
        };
        let space_id = space.id;
        catalog.insert(space);

        let orchestrator = ReservationOrchestrator::new(
            catalog.clone(),
            ledger.clone(),
            gateway.clone(),
            test_config(),
        );
        (orchestrator, catalog, ledger, gateway, space_id)
    }

    fn request(space_id: SpaceId) -> ReservationRequest {
        ReservationRequest {
            space_id,
            user_id: UserId::new(),
            phone: "254712345678".to_string(),
            duration: 2,
            unit: RateUnit::Hour,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirmed_payment_occupies_space() {
        let (orchestrator, catalog, ledger, gateway, space_id) = setup();

        let receipt = orchestrator.reserve(request(space_id)).await.unwrap();

        // 2h at 10/h
        assert_eq!(receipt.amount, Money::from_units(20));
        assert!(receipt.warning.is_none());

        let booking = ledger.get(receipt.booking_id).await.unwrap().unwrap();
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.amount, Money::from_units(20));

        assert!(!catalog.get_availability(space_id).await.unwrap());
        assert_eq!(gateway.push_count(), 1);

        let payment = orchestrator.payments().attempt_for(receipt.booking_id).unwrap();
        assert_eq!(payment.status, AttemptStatus::Confirmed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_payment_rolls_back_booking() {
        let (orchestrator, catalog, ledger, gateway, space_id) = setup();
        gateway.set_outcome(ScriptedOutcome::FailAfter(1));

        let err = orchestrator.reserve(request(space_id)).await.unwrap_err();
        assert!(matches!(err, ReservationError::PaymentRejected { .. }));
        assert_eq!(err.reason(), FailureReason::PaymentRejected);

        // Booking failed, availability untouched
        let bookings = ledger.list_awaiting_payment().await.unwrap();
        assert!(bookings.is_empty());
        assert_eq!(ledger.booking_count(), 1);
        assert!(catalog.get_availability(space_id).await.unwrap());
        assert_eq!(catalog.availability_write_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stuck_payment_times_out_without_duplicate_push() {
        let (orchestrator, catalog, _ledger, gateway, space_id) = setup();
        gateway.set_outcome(ScriptedOutcome::StuckProcessing);

        let err = orchestrator.reserve(request(space_id)).await.unwrap_err();
        let ReservationError::PaymentTimeout { booking_id, polls } = err else {
            panic!("expected PaymentTimeout, got {err:?}");
        };

        assert_eq!(polls, 5);
        assert_eq!(gateway.poll_count(), 5);
        assert_eq!(gateway.push_count(), 1);
        assert!(catalog.get_availability(space_id).await.unwrap());

        let payment = orchestrator.payments().attempt_for(booking_id).unwrap();
        assert_eq!(payment.status, AttemptStatus::TimedOut);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_channel_rejected_without_side_effects() {
        let (orchestrator, _catalog, ledger, gateway, space_id) = setup();

        let mut req = request(space_id);
        req.phone = "not-a-number".to_string();
        let err = orchestrator.reserve(req).await.unwrap_err();

        assert!(matches!(err, ReservationError::InvalidChannel(_)));
        assert_eq!(ledger.booking_count(), 0);
        assert_eq!(gateway.push_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_duration_rejected() {
        let (orchestrator, _catalog, ledger, _gateway, space_id) = setup();

        let mut req = request(space_id);
        req.duration = 0;
        let err = orchestrator.reserve(req).await.unwrap_err();

        assert!(matches!(err, ReservationError::InvalidDuration(0)));
        assert_eq!(ledger.booking_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_space_rejected() {
        let (orchestrator, _, ledger, _, _) = setup();

        let err = orchestrator.reserve(request(SpaceId::new())).await.unwrap_err();
        assert!(matches!(err, ReservationError::SpaceNotFound(_)));
        assert_eq!(ledger.booking_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unavailable_space_rejected_before_booking() {
        let (orchestrator, catalog, ledger, _gateway, space_id) = setup();
        catalog.set_availability(space_id, false).await.unwrap();

        let err = orchestrator.reserve(request(space_id)).await.unwrap_err();
        assert!(matches!(err, ReservationError::SpaceUnavailable(_)));
        assert_eq!(ledger.booking_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_booking_creation_failure_skips_payment() {
        let (orchestrator, catalog, ledger, gateway, space_id) = setup();
        ledger.set_fail_on_create(true);

        let err = orchestrator.reserve(request(space_id)).await.unwrap_err();
        assert!(matches!(err, ReservationError::BookingCreation(_)));
        assert_eq!(err.reason(), FailureReason::BookingCreationError);

        assert_eq!(gateway.push_count(), 0);
        assert!(catalog.get_availability(space_id).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_push_rolls_back_booking() {
        let (orchestrator, _catalog, ledger, gateway, space_id) = setup();
        gateway.set_outcome(ScriptedOutcome::RejectPush);

        let err = orchestrator.reserve(request(space_id)).await.unwrap_err();
        assert_eq!(err.reason(), FailureReason::PaymentRejected);

        let bookings = ledger.list_awaiting_payment().await.unwrap();
        assert!(bookings.is_empty());
        assert_eq!(ledger.booking_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_availability_write_failure_is_retried() {
        let (orchestrator, catalog, _ledger, _gateway, space_id) = setup();
        catalog.fail_next_set_availability(1);

        let receipt = orchestrator.reserve(request(space_id)).await.unwrap();
        assert!(receipt.warning.is_none());
        assert!(!catalog.get_availability(space_id).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_availability_writes_surface_warning() {
        let (orchestrator, catalog, ledger, _gateway, space_id) = setup();
        // More failures than the retry budget (3 attempts)
        catalog.fail_next_set_availability(3);

        let receipt = orchestrator.reserve(request(space_id)).await.unwrap();
        assert_eq!(
            receipt.warning,
            Some(PartialCommitWarning::AvailabilityLagging)
        );

        // The booking stays confirmed; the stale flag is reconciled later
        let booking = ledger.get(receipt.booking_id).await.unwrap().unwrap();
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert!(catalog.get_availability(space_id).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_polling_resolves_cancelled() {
        let (orchestrator, catalog, ledger, gateway, space_id) = setup();
        gateway.set_outcome(ScriptedOutcome::StuckProcessing);

        let orchestrator = Arc::new(orchestrator);
        let task = tokio::spawn({
            let orchestrator = orchestrator.clone();
            async move { orchestrator.reserve(request(space_id)).await }
        });

        // Let the attempt reach the polling phase
        while ledger.list_awaiting_payment().await.unwrap().is_empty() {
            tokio::task::yield_now().await;
        }
        let booking_id = ledger.list_awaiting_payment().await.unwrap()[0].id;
        assert!(orchestrator.cancel(booking_id));

        let err = task.await.unwrap().unwrap_err();
        assert!(matches!(err, ReservationError::Cancelled { .. }));

        let booking = ledger.get(booking_id).await.unwrap().unwrap();
        assert_eq!(booking.status, BookingStatus::Cancelled);
        assert!(catalog.get_availability(space_id).await.unwrap());

        // The signal is gone once the attempt resolves
        assert!(!orchestrator.cancel(booking_id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_request_rejected_while_first_in_flight() {
        let (orchestrator, _catalog, ledger, gateway, space_id) = setup();
        gateway.set_outcome(ScriptedOutcome::StuckProcessing);

        let orchestrator = Arc::new(orchestrator);
        let first = tokio::spawn({
            let orchestrator = orchestrator.clone();
            async move { orchestrator.reserve(request(space_id)).await }
        });

        while ledger.list_awaiting_payment().await.unwrap().is_empty() {
            tokio::task::yield_now().await;
        }

        // Second attempt for the same space: rejected before any booking
        let err = orchestrator.reserve(request(space_id)).await.unwrap_err();
        assert!(matches!(err, ReservationError::SpaceUnavailable(_)));
        assert_eq!(ledger.booking_count(), 1);

        let booking_id = ledger.list_awaiting_payment().await.unwrap()[0].id;
        orchestrator.cancel(booking_id);
        let _ = first.await.unwrap();
    }
}
