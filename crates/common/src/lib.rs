//! Shared identifier types used across the booking platform crates.

pub mod types;

pub use types::{BookingId, SpaceId, UserId};
