//! Booking ledger client trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use common::{BookingId, SpaceId};
use domain::{Booking, BookingStatus, NewBooking};

use crate::error::ClientError;

/// Trait for booking ledger operations consumed by the orchestrator.
///
/// The ledger stores and mutates booking records field by field; lifecycle
/// legality and cross-entity consistency are the orchestrator's concern.
#[async_trait]
pub trait BookingLedger: Send + Sync {
    /// Creates a booking record with status `Pending`.
    async fn create(&self, booking: NewBooking) -> Result<Booking, ClientError>;

    /// Fetches a booking by id.
    async fn get(&self, booking_id: BookingId) -> Result<Option<Booking>, ClientError>;

    /// Writes a booking's status.
    async fn set_status(
        &self,
        booking_id: BookingId,
        status: BookingStatus,
    ) -> Result<(), ClientError>;

    /// Lists bookings that hold or may come to hold the space: non-terminal
    /// ones, and confirmed ones whose end time is still in the future.
    async fn list_active_for_space(&self, space_id: SpaceId) -> Result<Vec<Booking>, ClientError>;

    /// Lists bookings still waiting on a payment outcome.
    async fn list_awaiting_payment(&self) -> Result<Vec<Booking>, ClientError>;

    /// Removes a booking record (administrative cleanup).
    async fn delete(&self, booking_id: BookingId) -> Result<(), ClientError>;
}

#[derive(Debug, Default)]
struct LedgerState {
    bookings: HashMap<BookingId, Booking>,
    fail_on_create: bool,
    fail_next_set_status: u32,
}

/// In-memory booking ledger for tests and demo wiring.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBookingLedger {
    state: Arc<RwLock<LedgerState>>,
}

impl InMemoryBookingLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the ledger to reject creation calls.
    pub fn set_fail_on_create(&self, fail: bool) {
        self.state.write().unwrap().fail_on_create = fail;
    }

    /// Makes the next `count` status writes fail with a transport error.
    pub fn fail_next_set_status(&self, count: u32) {
        self.state.write().unwrap().fail_next_set_status = count;
    }

    /// Returns the number of booking records held.
    pub fn booking_count(&self) -> usize {
        self.state.read().unwrap().bookings.len()
    }

    /// Overwrites a booking record directly, bypassing `create`.
    ///
    /// Test hook for seeding ledger states the flow itself cannot produce,
    /// such as orphaned `AwaitingPayment` bookings with an old `created_at`.
    pub fn put(&self, booking: Booking) {
        self.state
            .write()
            .unwrap()
            .bookings
            .insert(booking.id, booking);
    }
}

#[async_trait]
impl BookingLedger for InMemoryBookingLedger {
    async fn create(&self, booking: NewBooking) -> Result<Booking, ClientError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_create {
            return Err(ClientError::Rejected {
                status: 422,
                message: "booking rejected".to_string(),
            });
        }

        let record = Booking {
            id: BookingId::new(),
            space_id: booking.space_id,
            user_id: booking.user_id,
            start_time: booking.start_time,
            end_time: booking.end_time,
            amount: booking.amount,
            status: BookingStatus::Pending,
            created_at: Utc::now(),
        };
        state.bookings.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get(&self, booking_id: BookingId) -> Result<Option<Booking>, ClientError> {
        Ok(self.state.read().unwrap().bookings.get(&booking_id).cloned())
    }

    async fn set_status(
        &self,
        booking_id: BookingId,
        status: BookingStatus,
    ) -> Result<(), ClientError> {
        let mut state = self.state.write().unwrap();

        if state.fail_next_set_status > 0 {
            state.fail_next_set_status -= 1;
            return Err(ClientError::Transport(
                "ledger endpoint unreachable".to_string(),
            ));
        }

        let booking = state
            .bookings
            .get_mut(&booking_id)
            .ok_or_else(|| ClientError::NotFound(format!("booking {booking_id}")))?;
        booking.status = status;
        Ok(())
    }

    async fn list_active_for_space(&self, space_id: SpaceId) -> Result<Vec<Booking>, ClientError> {
        let now = Utc::now();
        Ok(self
            .state
            .read()
            .unwrap()
            .bookings
            .values()
            .filter(|b| b.space_id == space_id)
            .filter(|b| !b.is_terminal() || b.occupies(now))
            .cloned()
            .collect())
    }

    async fn list_awaiting_payment(&self) -> Result<Vec<Booking>, ClientError> {
        Ok(self
            .state
            .read()
            .unwrap()
            .bookings
            .values()
            .filter(|b| {
                matches!(
                    b.status,
                    BookingStatus::Pending | BookingStatus::AwaitingPayment
                )
            })
            .cloned()
            .collect())
    }

    async fn delete(&self, booking_id: BookingId) -> Result<(), ClientError> {
        self.state
            .write()
            .unwrap()
            .bookings
            .remove(&booking_id)
            .map(|_| ())
            .ok_or_else(|| ClientError::NotFound(format!("booking {booking_id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use common::UserId;
    use domain::Money;

    fn new_booking(space_id: SpaceId) -> NewBooking {
        let now = Utc::now();
        NewBooking {
            space_id,
            user_id: UserId::new(),
            start_time: now,
            end_time: now + Duration::hours(2),
            amount: Money::from_units(20),
        }
    }

    #[tokio::test]
    async fn test_create_starts_pending() {
        let ledger = InMemoryBookingLedger::new();
        let booking = ledger.create(new_booking(SpaceId::new())).await.unwrap();

        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(ledger.booking_count(), 1);
        assert_eq!(ledger.get(booking.id).await.unwrap(), Some(booking));
    }

    #[tokio::test]
    async fn test_set_status_overwrites() {
        let ledger = InMemoryBookingLedger::new();
        let booking = ledger.create(new_booking(SpaceId::new())).await.unwrap();

        ledger
            .set_status(booking.id, BookingStatus::AwaitingPayment)
            .await
            .unwrap();
        let stored = ledger.get(booking.id).await.unwrap().unwrap();
        assert_eq!(stored.status, BookingStatus::AwaitingPayment);
    }

    #[tokio::test]
    async fn test_fail_on_create_is_a_rejection() {
        let ledger = InMemoryBookingLedger::new();
        ledger.set_fail_on_create(true);

        let err = ledger
            .create(new_booking(SpaceId::new()))
            .await
            .unwrap_err();
        assert!(!err.is_transient());
        assert_eq!(ledger.booking_count(), 0);
    }

    #[tokio::test]
    async fn test_list_active_for_space_excludes_failed() {
        let ledger = InMemoryBookingLedger::new();
        let space_id = SpaceId::new();

        let active = ledger.create(new_booking(space_id)).await.unwrap();
        let failed = ledger.create(new_booking(space_id)).await.unwrap();
        ledger
            .set_status(failed.id, BookingStatus::Failed)
            .await
            .unwrap();
        // Booking for another space does not show up
        ledger.create(new_booking(SpaceId::new())).await.unwrap();

        let listed = ledger.list_active_for_space(space_id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, active.id);
    }

    #[tokio::test]
    async fn test_list_active_includes_confirmed_with_future_end() {
        let ledger = InMemoryBookingLedger::new();
        let space_id = SpaceId::new();

        let booking = ledger.create(new_booking(space_id)).await.unwrap();
        ledger
            .set_status(booking.id, BookingStatus::Confirmed)
            .await
            .unwrap();

        let listed = ledger.list_active_for_space(space_id).await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_list_awaiting_payment() {
        let ledger = InMemoryBookingLedger::new();

        let waiting = ledger.create(new_booking(SpaceId::new())).await.unwrap();
        ledger
            .set_status(waiting.id, BookingStatus::AwaitingPayment)
            .await
            .unwrap();
        let confirmed = ledger.create(new_booking(SpaceId::new())).await.unwrap();
        ledger
            .set_status(confirmed.id, BookingStatus::Confirmed)
            .await
            .unwrap();

        let listed = ledger.list_awaiting_payment().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, waiting.id);
    }

    #[tokio::test]
    async fn test_delete() {
        let ledger = InMemoryBookingLedger::new();
        let booking = ledger.create(new_booking(SpaceId::new())).await.unwrap();

        ledger.delete(booking.id).await.unwrap();
        assert_eq!(ledger.booking_count(), 0);
        assert!(matches!(
            ledger.delete(booking.id).await,
            Err(ClientError::NotFound(_))
        ));
    }
}
