//! API error types with HTTP response mapping.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use booking::BookingError;
use store::StoreError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Booking failed.
    Booking(BookingError),
    /// Store lookup failed.
    Store(StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, details) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            ApiError::Booking(err) => booking_error_to_response(err),
            ApiError::Store(err) => store_error_to_response(err),
        };

        let body = match details {
            Some(details) => serde_json::json!({ "error": message, "details": details }),
            None => serde_json::json!({ "error": message }),
        };
        (status, axum::Json(body)).into_response()
    }
}

fn booking_error_to_response(err: BookingError) -> (StatusCode, String, Option<Vec<String>>) {
    match err {
        BookingError::Validation { message, details } => {
            (StatusCode::BAD_REQUEST, message, Some(details))
        }
        BookingError::Inventory(msg) => (StatusCode::CONFLICT, msg, None),
        BookingError::Payment(msg) => (StatusCode::PAYMENT_REQUIRED, msg, None),
        BookingError::Store(err) => store_error_to_response(err),
        other => internal(&other),
    }
}

fn store_error_to_response(err: StoreError) -> (StatusCode, String, Option<Vec<String>>) {
    match err {
        StoreError::ReservationNotFound(_) => (StatusCode::NOT_FOUND, err.to_string(), None),
        other => internal(&other),
    }
}

fn internal(err: &dyn std::error::Error) -> (StatusCode, String, Option<Vec<String>>) {
    tracing::error!(error = %err, "internal server error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
        None,
    )
}

impl From<BookingError> for ApiError {
    fn from(err: BookingError) -> Self {
        ApiError::Booking(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
