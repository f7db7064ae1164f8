//! HTTP implementations of the catalog and ledger clients.
//!
//! Both speak JSON to the persistence endpoints and attach the bearer
//! credential from the [`AuthContext`] handed in at construction.

use async_trait::async_trait;
use common::{BookingId, SpaceId};
use domain::{Booking, BookingStatus, NewBooking, Space};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;

use crate::auth::AuthContext;
use crate::booking::BookingLedger;
use crate::error::ClientError;
use crate::space::SpaceCatalog;

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::MalformedResponse(err.to_string())
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}

/// Maps a non-success response to the corresponding client error.
async fn check(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    if status == StatusCode::NOT_FOUND {
        Err(ClientError::NotFound(message))
    } else {
        Err(ClientError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

fn with_auth(builder: RequestBuilder, auth: &AuthContext) -> RequestBuilder {
    match auth.authorization_header() {
        Some(header) => builder.header(reqwest::header::AUTHORIZATION, header),
        None => builder,
    }
}

#[derive(Deserialize)]
struct SpacesEnvelope {
    spaces: Vec<Space>,
}

#[derive(Deserialize)]
struct BookingsEnvelope {
    bookings: Vec<Booking>,
}

/// Space catalog backed by the space persistence endpoint.
#[derive(Debug, Clone)]
pub struct HttpSpaceCatalog {
    http: Client,
    base_url: String,
    auth: AuthContext,
}

impl HttpSpaceCatalog {
    /// Creates a catalog client for the given base URL.
    pub fn new(base_url: impl Into<String>, auth: AuthContext) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            auth,
        }
    }
}

#[async_trait]
impl SpaceCatalog for HttpSpaceCatalog {
    async fn get(&self, space_id: SpaceId) -> Result<Option<Space>, ClientError> {
        let url = format!("{}/spaces/{space_id}", self.base_url);
        let response = with_auth(self.http.get(&url), &self.auth).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(check(response).await?.json().await?))
    }

    async fn list(&self) -> Result<Vec<Space>, ClientError> {
        let url = format!("{}/spaces", self.base_url);
        let response = with_auth(self.http.get(&url), &self.auth).send().await?;
        let envelope: SpacesEnvelope = check(response).await?.json().await?;
        Ok(envelope.spaces)
    }

    async fn get_availability(&self, space_id: SpaceId) -> Result<bool, ClientError> {
        self.get(space_id)
            .await?
            .map(|s| s.available)
            .ok_or_else(|| ClientError::NotFound(format!("space {space_id}")))
    }

    async fn set_availability(
        &self,
        space_id: SpaceId,
        available: bool,
    ) -> Result<(), ClientError> {
        let url = format!("{}/spaces/{space_id}", self.base_url);
        let body = serde_json::json!({ "availability": available });
        let response = with_auth(self.http.patch(&url), &self.auth)
            .json(&body)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }
}

/// Booking ledger backed by the booking persistence endpoint.
#[derive(Debug, Clone)]
pub struct HttpBookingLedger {
    http: Client,
    base_url: String,
    auth: AuthContext,
}

impl HttpBookingLedger {
    /// Creates a ledger client for the given base URL.
    pub fn new(base_url: impl Into<String>, auth: AuthContext) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            auth,
        }
    }
}

#[async_trait]
impl BookingLedger for HttpBookingLedger {
    async fn create(&self, booking: NewBooking) -> Result<Booking, ClientError> {
        let url = format!("{}/bookings", self.base_url);
        let response = with_auth(self.http.post(&url), &self.auth)
            .json(&booking)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    async fn get(&self, booking_id: BookingId) -> Result<Option<Booking>, ClientError> {
        let url = format!("{}/bookings/{booking_id}", self.base_url);
        let response = with_auth(self.http.get(&url), &self.auth).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(check(response).await?.json().await?))
    }

    async fn set_status(
        &self,
        booking_id: BookingId,
        status: BookingStatus,
    ) -> Result<(), ClientError> {
        let url = format!("{}/bookings/{booking_id}/status", self.base_url);
        let body = serde_json::json!({ "status": status });
        let response = with_auth(self.http.patch(&url), &self.auth)
            .json(&body)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn list_active_for_space(&self, space_id: SpaceId) -> Result<Vec<Booking>, ClientError> {
        let url = format!("{}/bookings?space_id={space_id}&active=true", self.base_url);
        let response = with_auth(self.http.get(&url), &self.auth).send().await?;
        let envelope: BookingsEnvelope = check(response).await?.json().await?;
        Ok(envelope.bookings)
    }

    async fn list_awaiting_payment(&self) -> Result<Vec<Booking>, ClientError> {
        let url = format!("{}/bookings?unsettled=true", self.base_url);
        let response = with_auth(self.http.get(&url), &self.auth).send().await?;
        let envelope: BookingsEnvelope = check(response).await?.json().await?;
        Ok(envelope.bookings)
    }

    async fn delete(&self, booking_id: BookingId) -> Result<(), ClientError> {
        let url = format!("{}/bookings/{booking_id}", self.base_url);
        let response = with_auth(self.http.delete(&url), &self.auth).send().await?;
        check(response).await?;
        Ok(())
    }
}
