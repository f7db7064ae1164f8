//! Domain layer for the space booking platform.
//!
//! Defines the `Space` and `Booking` entities, the booking lifecycle state
//! machine, and the value objects (`Money`, `RateUnit`, `Msisdn`) shared by
//! the client and orchestration crates.

pub mod booking;
pub mod error;
pub mod space;
pub mod value_objects;

pub use booking::{Booking, BookingStatus, NewBooking};
pub use error::DomainError;
pub use space::Space;
pub use value_objects::{Money, Msisdn, RateUnit};
