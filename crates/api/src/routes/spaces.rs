//! Space catalog browse endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use clients::{BookingLedger, SpaceCatalog};
use domain::Space;
use payment::PaymentGateway;
use serde::Serialize;

use crate::error::ApiError;
use crate::routes::reservations::AppState;

#[derive(Serialize)]
pub struct SpaceResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub location: String,
    pub price_per_hour_cents: i64,
    pub price_per_day_cents: i64,
    pub available: bool,
    pub image_url: Option<String>,
}

impl From<Space> for SpaceResponse {
    fn from(space: Space) -> Self {
        Self {
            id: space.id.to_string(),
            name: space.name,
            description: space.description,
            location: space.location,
            price_per_hour_cents: space.price_per_hour.cents(),
            price_per_day_cents: space.price_per_day.cents(),
            available: space.available,
            image_url: space.image_url,
        }
    }
}

#[derive(Serialize)]
pub struct SpacesResponse {
    pub spaces: Vec<SpaceResponse>,
}

/// GET /spaces — list the rentable spaces.
#[tracing::instrument(skip(state))]
pub async fn list<S, B, G>(
    State(state): State<Arc<AppState<S, B, G>>>,
) -> Result<Json<SpacesResponse>, ApiError>
where
    S: SpaceCatalog + 'static,
    B: BookingLedger + 'static,
    G: PaymentGateway + 'static,
{
    let spaces = state
        .catalog
        .list()
        .await?
        .into_iter()
        .map(SpaceResponse::from)
        .collect();
    Ok(Json(SpacesResponse { spaces }))
}
