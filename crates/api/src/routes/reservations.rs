//! Reservation flow and booking lookup endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use clients::{BookingLedger, SpaceCatalog};
use common::{BookingId, SpaceId, UserId};
use domain::{Booking, RateUnit};
use orchestrator::{PartialCommitWarning, ReservationOrchestrator, ReservationRequest};
use payment::PaymentGateway;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S, B, G>
where
    S: SpaceCatalog,
    B: BookingLedger,
    G: PaymentGateway,
{
    pub orchestrator: ReservationOrchestrator<S, B, G>,
    pub catalog: S,
    pub ledger: B,
}

// -- Request types --

#[derive(Deserialize)]
pub struct CreateReservationRequest {
    pub space_id: SpaceId,
    pub user_id: UserId,
    pub phone: String,
    pub duration: u32,
    pub unit: RateUnit,
}

#[derive(Debug, Deserialize)]
pub struct BookingsQuery {
    pub space_id: SpaceId,
}

// -- Response types --

#[derive(Serialize)]
pub struct ReservationResponse {
    pub booking_id: String,
    pub space_id: String,
    pub amount_cents: i64,
    pub transaction_id: String,
    pub state: String,
    pub warning: Option<PartialCommitWarning>,
}

#[derive(Serialize)]
pub struct BookingResponse {
    pub id: String,
    pub space_id: String,
    pub user_id: String,
    pub start_time: chrono::DateTime<chrono::Utc>,
    pub end_time: chrono::DateTime<chrono::Utc>,
    pub amount_cents: i64,
    pub status: String,
}

impl From<Booking> for BookingResponse {
    fn from(booking: Booking) -> Self {
        Self {
            id: booking.id.to_string(),
            space_id: booking.space_id.to_string(),
            user_id: booking.user_id.to_string(),
            start_time: booking.start_time,
            end_time: booking.end_time,
            amount_cents: booking.amount.cents(),
            status: booking.status.to_string(),
        }
    }
}

#[derive(Serialize)]
pub struct BookingsResponse {
    pub bookings: Vec<BookingResponse>,
}

// -- Handlers --

/// POST /reservations — run the full reservation flow.
#[tracing::instrument(skip(state, req), fields(space_id = %req.space_id))]
pub async fn create<S, B, G>(
    State(state): State<Arc<AppState<S, B, G>>>,
    Json(req): Json<CreateReservationRequest>,
) -> Result<(StatusCode, Json<ReservationResponse>), ApiError>
where
    S: SpaceCatalog + 'static,
    B: BookingLedger + 'static,
    G: PaymentGateway + 'static,
{
    let receipt = state
        .orchestrator
        .reserve(ReservationRequest {
            space_id: req.space_id,
            user_id: req.user_id,
            phone: req.phone,
            duration: req.duration,
            unit: req.unit,
        })
        .await?;

    let response = ReservationResponse {
        booking_id: receipt.booking_id.to_string(),
        space_id: receipt.space_id.to_string(),
        amount_cents: receipt.amount.cents(),
        transaction_id: receipt.transaction_id.to_string(),
        state: "Confirmed".to_string(),
        warning: receipt.warning,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /reservations/:id/cancel — best-effort cancellation of an
/// in-flight attempt.
#[tracing::instrument(skip(state))]
pub async fn cancel<S, B, G>(
    State(state): State<Arc<AppState<S, B, G>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError>
where
    S: SpaceCatalog + 'static,
    B: BookingLedger + 'static,
    G: PaymentGateway + 'static,
{
    let booking_id = parse_booking_id(&id)?;
    if state.orchestrator.cancel(booking_id) {
        Ok(StatusCode::ACCEPTED)
    } else {
        Err(ApiError::NotFound(format!(
            "No reservation in flight for booking {id}"
        )))
    }
}

/// GET /bookings/:id — load a booking record.
#[tracing::instrument(skip(state))]
pub async fn get_booking<S, B, G>(
    State(state): State<Arc<AppState<S, B, G>>>,
    Path(id): Path<String>,
) -> Result<Json<BookingResponse>, ApiError>
where
    S: SpaceCatalog + 'static,
    B: BookingLedger + 'static,
    G: PaymentGateway + 'static,
{
    let booking_id = parse_booking_id(&id)?;
    let booking = state
        .ledger
        .get(booking_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Booking {id} not found")))?;
    Ok(Json(booking.into()))
}

/// GET /bookings?space_id= — list active bookings for a space.
#[tracing::instrument(skip(state))]
pub async fn list_for_space<S, B, G>(
    State(state): State<Arc<AppState<S, B, G>>>,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<BookingsResponse>, ApiError>
where
    S: SpaceCatalog + 'static,
    B: BookingLedger + 'static,
    G: PaymentGateway + 'static,
{
    let bookings = state
        .ledger
        .list_active_for_space(query.space_id)
        .await?
        .into_iter()
        .map(BookingResponse::from)
        .collect();
    Ok(Json(BookingsResponse { bookings }))
}

fn parse_booking_id(id: &str) -> Result<BookingId, ApiError> {
    id.parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid booking id: {id}")))
}
