//! Clients for the space catalog and booking ledger endpoints.
//!
//! The orchestrator depends only on the `SpaceCatalog` and `BookingLedger`
//! traits. HTTP implementations speak the persistence endpoints with JSON
//! payloads and a bearer credential; in-memory implementations back the test
//! suites and the demo wiring, with failure-injection switches.

pub mod auth;
pub mod booking;
pub mod error;
pub mod http;
pub mod space;

pub use auth::AuthContext;
pub use booking::{BookingLedger, InMemoryBookingLedger};
pub use error::ClientError;
pub use http::{HttpBookingLedger, HttpSpaceCatalog};
pub use space::{InMemorySpaceCatalog, SpaceCatalog};
