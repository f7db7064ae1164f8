//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use orchestrator::{FailureReason, ReservationError};

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Reservation flow error.
    Reservation(ReservationError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NotFound", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BadRequest", msg),
            ApiError::Reservation(err) => {
                let reason = err.reason();
                (reservation_status(reason), reason.as_str(), err.to_string())
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal", msg)
            }
        };

        let body = serde_json::json!({ "error": message, "code": code });
        (status, axum::Json(body)).into_response()
    }
}

/// Maps a reservation reason code to an HTTP status.
fn reservation_status(reason: FailureReason) -> StatusCode {
    match reason {
        FailureReason::SpaceUnavailable | FailureReason::Cancelled => StatusCode::CONFLICT,
        FailureReason::SpaceNotFound => StatusCode::NOT_FOUND,
        FailureReason::InvalidChannel | FailureReason::InvalidDuration => StatusCode::BAD_REQUEST,
        FailureReason::PaymentRejected => StatusCode::PAYMENT_REQUIRED,
        FailureReason::PaymentTimeout => StatusCode::GATEWAY_TIMEOUT,
        FailureReason::BookingCreationError
        | FailureReason::ProviderUnavailable
        | FailureReason::CatalogUnavailable => StatusCode::BAD_GATEWAY,
    }
}

impl From<ReservationError> for ApiError {
    fn from(err: ReservationError) -> Self {
        ApiError::Reservation(err)
    }
}

impl From<clients::ClientError> for ApiError {
    fn from(err: clients::ClientError) -> Self {
        match err {
            clients::ClientError::NotFound(msg) => ApiError::NotFound(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}
