//! Periodic reconciliation of availability and booking status drift.

use chrono::{Duration, Utc};
use clients::{BookingLedger, ClientError, SpaceCatalog};
use domain::BookingStatus;

/// Tunables for the reconciliation pass.
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// How often the pass runs.
    pub interval: std::time::Duration,

    /// How long a booking may sit unsettled before it is force-failed.
    pub payment_timeout: Duration,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            interval: std::time::Duration::from_secs(30),
            payment_timeout: Duration::seconds(120),
        }
    }
}

/// Counts of repairs performed by one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Spaces flipped back to available (no active confirmed booking).
    pub spaces_released: u32,
    /// Spaces flipped to unavailable (confirmed booking, stale flag).
    pub spaces_reclaimed: u32,
    /// Unsettled bookings force-failed after the payment timeout.
    pub bookings_expired: u32,
}

/// Background sweep that repairs drift left by partial failures: stale
/// availability flags and bookings orphaned mid-flow.
pub struct Reconciler<S, B>
where
    S: SpaceCatalog,
    B: BookingLedger,
{
    spaces: S,
    bookings: B,
    config: ReconcilerConfig,
}

impl<S, B> Reconciler<S, B>
where
    S: SpaceCatalog,
    B: BookingLedger,
{
    /// Creates a reconciler over the given clients.
    pub fn new(spaces: S, bookings: B, config: ReconcilerConfig) -> Self {
        Self {
            spaces,
            bookings,
            config,
        }
    }

    /// Runs a single reconciliation pass.
    ///
    /// Sweeps, in order: unavailable spaces with no active confirmed
    /// booking are released; available spaces that do have one are
    /// reclaimed (heals the partial-commit window); unsettled bookings
    /// older than the payment timeout are force-failed.
    #[tracing::instrument(skip(self))]
    pub async fn run_once(&self) -> Result<ReconcileReport, ClientError> {
        metrics::counter!("reconciler_passes_total").increment(1);
        let now = Utc::now();
        let mut report = ReconcileReport::default();

        for space in self.spaces.list().await? {
            let bookings = self.bookings.list_active_for_space(space.id).await?;
            let occupied = bookings.iter().any(|b| b.occupies(now));

            if !space.available && !occupied {
                match self.spaces.set_availability(space.id, true).await {
                    Ok(()) => {
                        report.spaces_released += 1;
                        tracing::info!(space_id = %space.id, "released stale unavailable space");
                    }
                    Err(err) => {
                        tracing::warn!(space_id = %space.id, error = %err, "release write failed");
                    }
                }
            } else if space.available && occupied {
                match self.spaces.set_availability(space.id, false).await {
                    Ok(()) => {
                        report.spaces_reclaimed += 1;
                        tracing::info!(space_id = %space.id, "reclaimed space with confirmed booking");
                    }
                    Err(err) => {
                        tracing::warn!(space_id = %space.id, error = %err, "reclaim write failed");
                    }
                }
            }
        }

        for booking in self.bookings.list_awaiting_payment().await? {
            if booking.age(now) >= self.config.payment_timeout {
                match self
                    .bookings
                    .set_status(booking.id, BookingStatus::Failed)
                    .await
                {
                    Ok(()) => {
                        report.bookings_expired += 1;
                        tracing::warn!(booking_id = %booking.id, "force-failed booking stuck awaiting payment");
                    }
                    Err(err) => {
                        tracing::warn!(booking_id = %booking.id, error = %err, "expiry write failed");
                    }
                }
            }
        }

        metrics::counter!("reconciler_spaces_released_total")
            .increment(report.spaces_released as u64);
        metrics::counter!("reconciler_spaces_reclaimed_total")
            .increment(report.spaces_reclaimed as u64);
        metrics::counter!("reconciler_bookings_expired_total")
            .increment(report.bookings_expired as u64);
        tracing::debug!(
            released = report.spaces_released,
            reclaimed = report.spaces_reclaimed,
            expired = report.bookings_expired,
            "reconciliation pass complete"
        );
        Ok(report)
    }

    /// Drives `run_once` on a fixed interval until the shutdown signal
    /// changes.
    pub async fn run(self, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.tick().await; // skip immediate tick

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(err) = self.run_once().await {
                        tracing::warn!(error = %err, "reconciliation pass failed");
                    }
                }
                _ = shutdown.changed() => {
                    tracing::info!("reconciler shutting down");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use clients::{InMemoryBookingLedger, InMemorySpaceCatalog};
    use common::{BookingId, SpaceId, UserId};
    use domain::{Booking, Money, Space};

    fn reconciler(
        catalog: &InMemorySpaceCatalog,
        ledger: &InMemoryBookingLedger,
    ) -> Reconciler<InMemorySpaceCatalog, InMemoryBookingLedger> {
        Reconciler::new(
            catalog.clone(),
            ledger.clone(),
            ReconcilerConfig {
                interval: std::time::Duration::from_secs(1),
                payment_timeout: Duration::seconds(120),
            },
        )
    }

    fn space(available: bool) -> Space {
        Space {
            id: SpaceId::new(),
            name: "Loft".to_string(),
            description: "Upstairs loft".to_string(),
            location: "Ngong Road".to_string(),
            price_per_hour: Money::from_units(10),
            price_per_day: Money::from_units(60),
            available,
            image_url: None,
        }
    }

    fn booking(space_id: SpaceId, status: BookingStatus, age: Duration) -> Booking {
        let now = Utc::now();
        Booking {
            id: BookingId::new(),
            space_id,
            user_id: UserId::new(),
            start_time: now - age,
            end_time: now + Duration::hours(2),
            amount: Money::from_units(20),
            status,
            created_at: now - age,
        }
    }

    #[tokio::test]
    async fn test_releases_unavailable_space_with_no_active_booking() {
        let catalog = InMemorySpaceCatalog::new();
        let ledger = InMemoryBookingLedger::new();
        let s = space(false);
        let space_id = s.id;
        catalog.insert(s);

        let report = reconciler(&catalog, &ledger).run_once().await.unwrap();

        assert_eq!(report.spaces_released, 1);
        assert!(catalog.get_availability(space_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_keeps_space_unavailable_while_booking_active() {
        let catalog = InMemorySpaceCatalog::new();
        let ledger = InMemoryBookingLedger::new();
        let s = space(false);
        let space_id = s.id;
        catalog.insert(s);
        ledger.put(booking(space_id, BookingStatus::Confirmed, Duration::zero()));

        let report = reconciler(&catalog, &ledger).run_once().await.unwrap();

        assert_eq!(report.spaces_released, 0);
        assert!(!catalog.get_availability(space_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_reclaims_available_space_with_confirmed_booking() {
        let catalog = InMemorySpaceCatalog::new();
        let ledger = InMemoryBookingLedger::new();
        let s = space(true);
        let space_id = s.id;
        catalog.insert(s);
        // Partial commit left the flag stale
        ledger.put(booking(space_id, BookingStatus::Confirmed, Duration::zero()));

        let report = reconciler(&catalog, &ledger).run_once().await.unwrap();

        assert_eq!(report.spaces_reclaimed, 1);
        assert!(!catalog.get_availability(space_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_expires_bookings_stuck_awaiting_payment() {
        let catalog = InMemorySpaceCatalog::new();
        let ledger = InMemoryBookingLedger::new();

        let stuck = booking(
            SpaceId::new(),
            BookingStatus::AwaitingPayment,
            Duration::seconds(300),
        );
        let stuck_id = stuck.id;
        ledger.put(stuck);

        let fresh = booking(
            SpaceId::new(),
            BookingStatus::AwaitingPayment,
            Duration::seconds(10),
        );
        let fresh_id = fresh.id;
        ledger.put(fresh);

        let report = reconciler(&catalog, &ledger).run_once().await.unwrap();

        assert_eq!(report.bookings_expired, 1);
        assert_eq!(
            ledger.get(stuck_id).await.unwrap().unwrap().status,
            BookingStatus::Failed
        );
        assert_eq!(
            ledger.get(fresh_id).await.unwrap().unwrap().status,
            BookingStatus::AwaitingPayment
        );
    }

    #[tokio::test]
    async fn test_expired_confirmed_booking_releases_its_space() {
        let catalog = InMemorySpaceCatalog::new();
        let ledger = InMemoryBookingLedger::new();
        let s = space(false);
        let space_id = s.id;
        catalog.insert(s);

        // Confirmed booking whose window has passed
        let now = Utc::now();
        let mut past = booking(space_id, BookingStatus::Confirmed, Duration::hours(4));
        past.end_time = now - Duration::hours(1);
        ledger.put(past);

        let report = reconciler(&catalog, &ledger).run_once().await.unwrap();

        assert_eq!(report.spaces_released, 1);
        assert!(catalog.get_availability(space_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_noop_pass_reports_zero() {
        let catalog = InMemorySpaceCatalog::new();
        let ledger = InMemoryBookingLedger::new();
        catalog.insert(space(true));

        let report = reconciler(&catalog, &ledger).run_once().await.unwrap();
        assert_eq!(report, ReconcileReport::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_loop_sweeps_and_stops_on_shutdown() {
        let catalog = InMemorySpaceCatalog::new();
        let ledger = InMemoryBookingLedger::new();
        let s = space(false);
        let space_id = s.id;
        catalog.insert(s);

        let (tx, rx) = tokio::sync::watch::channel(false);
        let task = tokio::spawn(reconciler(&catalog, &ledger).run(rx));

        // One interval elapses, the stale flag is repaired
        tokio::time::sleep(std::time::Duration::from_secs(2)).await;
        assert!(catalog.get_availability(space_id).await.unwrap());

        tx.send(true).unwrap();
        task.await.unwrap();
    }
}
