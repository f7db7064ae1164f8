//! HTTP API server with observability for the space booking platform.
//!
//! Exposes the reservation flow end to end: catalog browsing, reservation
//! creation and cancellation, booking lookup, with structured logging
//! (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use clients::{BookingLedger, InMemoryBookingLedger, InMemorySpaceCatalog, SpaceCatalog};
use common::SpaceId;
use domain::{Money, Space};
use metrics_exporter_prometheus::PrometheusHandle;
use orchestrator::{Reconciler, ReservationOrchestrator};
use payment::{InMemoryPaymentGateway, PaymentGateway};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::Config;
use routes::reservations::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S, B, G>(state: Arc<AppState<S, B, G>>, metrics_handle: PrometheusHandle) -> Router
where
    S: SpaceCatalog + 'static,
    B: BookingLedger + 'static,
    G: PaymentGateway + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/spaces", get(routes::spaces::list::<S, B, G>))
        .route("/reservations", post(routes::reservations::create::<S, B, G>))
        .route(
            "/reservations/{id}/cancel",
            post(routes::reservations::cancel::<S, B, G>),
        )
        .route("/bookings", get(routes::reservations::list_for_space::<S, B, G>))
        .route("/bookings/{id}", get(routes::reservations::get_booking::<S, B, G>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// In-memory application state used by the binary and the test suite.
pub type DefaultAppState =
    AppState<InMemorySpaceCatalog, InMemoryBookingLedger, InMemoryPaymentGateway>;

/// Creates application state over in-memory clients, seeded with a small
/// demo catalog, plus the reconciler that repairs drift in the background.
pub fn create_default_state(
    config: &Config,
) -> (
    Arc<DefaultAppState>,
    Reconciler<InMemorySpaceCatalog, InMemoryBookingLedger>,
) {
    let catalog = InMemorySpaceCatalog::new();
    let ledger = InMemoryBookingLedger::new();
    let gateway = InMemoryPaymentGateway::new();

    for (name, description, location, per_hour, per_day) in [
        (
            "Rooftop Studio",
            "Open-plan studio with natural light",
            "Westlands, Nairobi",
            10,
            60,
        ),
        (
            "Garden Hall",
            "Hall with garden access for events",
            "Kilimani, Nairobi",
            15,
            90,
        ),
        (
            "Harbor Boardroom",
            "Boardroom seating twelve",
            "Mombasa Road",
            25,
            150,
        ),
    ] {
        catalog.insert(Space {
            id: SpaceId::new(),
            name: name.to_string(),
            description: description.to_string(),
            location: location.to_string(),
            price_per_hour: Money::from_units(per_hour),
            price_per_day: Money::from_units(per_day),
            available: true,
            image_url: None,
        });
    }

    let orchestrator = ReservationOrchestrator::new(
        catalog.clone(),
        ledger.clone(),
        gateway,
        config.orchestrator(),
    );
    let reconciler = Reconciler::new(catalog.clone(), ledger.clone(), config.reconciler());

    let state = Arc::new(AppState {
        orchestrator,
        catalog,
        ledger,
    });
    (state, reconciler)
}
