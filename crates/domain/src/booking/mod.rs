//! Booking entity and lifecycle.

pub mod status;

pub use status::BookingStatus;

use chrono::{DateTime, Utc};
use common::{BookingId, SpaceId, UserId};
use serde::{Deserialize, Serialize};

use crate::value_objects::Money;

/// A booking record as held by the booking ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// Unique booking identifier.
    pub id: BookingId,

    /// The space this booking occupies.
    pub space_id: SpaceId,

    /// The user who requested the reservation.
    pub user_id: UserId,

    /// Start of the booked window.
    pub start_time: DateTime<Utc>,

    /// End of the booked window.
    pub end_time: DateTime<Utc>,

    /// Total amount due, duration times the applicable rate.
    pub amount: Money,

    /// Current lifecycle status.
    pub status: BookingStatus,

    /// When the ledger created the record.
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// Returns true if this booking currently occupies its space:
    /// confirmed, with an end time still in the future.
    pub fn occupies(&self, now: DateTime<Utc>) -> bool {
        self.status == BookingStatus::Confirmed && self.end_time > now
    }

    /// Returns true if the booking has reached a terminal status.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Returns how long the booking has existed at `now`.
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.created_at
    }
}

/// Fields required to create a booking record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBooking {
    pub space_id: SpaceId,
    pub user_id: UserId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub amount: Money,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn booking_with(status: BookingStatus, end_offset: Duration) -> Booking {
        let now = Utc::now();
        Booking {
            id: BookingId::new(),
            space_id: SpaceId::new(),
            user_id: UserId::new(),
            start_time: now - Duration::hours(1),
            end_time: now + end_offset,
            amount: Money::from_units(20),
            status,
            created_at: now - Duration::hours(1),
        }
    }

    #[test]
    fn test_confirmed_future_booking_occupies() {
        let booking = booking_with(BookingStatus::Confirmed, Duration::hours(2));
        assert!(booking.occupies(Utc::now()));
    }

    #[test]
    fn test_expired_confirmed_booking_does_not_occupy() {
        let booking = booking_with(BookingStatus::Confirmed, Duration::hours(-1));
        assert!(!booking.occupies(Utc::now()));
    }

    #[test]
    fn test_unsettled_booking_does_not_occupy() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::AwaitingPayment,
            BookingStatus::Failed,
            BookingStatus::Cancelled,
        ] {
            let booking = booking_with(status, Duration::hours(2));
            assert!(!booking.occupies(Utc::now()), "{status} should not occupy");
        }
    }

    #[test]
    fn test_age() {
        let booking = booking_with(BookingStatus::AwaitingPayment, Duration::hours(2));
        let age = booking.age(Utc::now());
        assert!(age >= Duration::hours(1));
        assert!(age < Duration::hours(2));
    }

    #[test]
    fn test_serialization_roundtrip() {
        let booking = booking_with(BookingStatus::Confirmed, Duration::hours(2));
        let json = serde_json::to_string(&booking).unwrap();
        let deserialized: Booking = serde_json::from_str(&json).unwrap();
        assert_eq!(booking, deserialized);
    }
}
