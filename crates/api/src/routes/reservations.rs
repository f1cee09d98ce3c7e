//! Reservation booking and lookup endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use booking::{BookingOutcome, ReservationRequest};
use common::ReservationId;
use store::{InventoryStore, Reservation, ReservationStore};

use crate::AppState;
use crate::error::ApiError;

/// POST /reservations: validate the request and run the booking saga.
#[tracing::instrument(skip(state, body))]
pub async fn create<R, I>(
    State(state): State<Arc<AppState<R, I>>>,
    body: Result<Json<ReservationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<BookingOutcome>), ApiError>
where
    R: ReservationStore + 'static,
    I: InventoryStore + 'static,
{
    let Json(request) = body?;

    match state.booking.book(request).await {
        Ok(outcome) => {
            metrics::counter!("api_reservations_total", "outcome" => "confirmed").increment(1);
            Ok((StatusCode::CREATED, Json(outcome)))
        }
        Err(err) => {
            metrics::counter!("api_reservations_total", "outcome" => err.kind()).increment(1);
            Err(err.into())
        }
    }
}

/// GET /reservations/{id}: load a reservation by ID.
#[tracing::instrument(skip(state))]
pub async fn get<R, I>(
    State(state): State<Arc<AppState<R, I>>>,
    Path(id): Path<String>,
) -> Result<Json<Reservation>, ApiError>
where
    R: ReservationStore + 'static,
    I: InventoryStore + 'static,
{
    let reservation_id = parse_reservation_id(&id)?;
    let reservation = state
        .reservations
        .get(reservation_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Reservation {id} not found")))?;

    Ok(Json(reservation))
}

fn parse_reservation_id(raw: &str) -> Result<ReservationId, ApiError> {
    uuid::Uuid::parse_str(raw)
        .map(ReservationId::from_uuid)
        .map_err(|e| ApiError::BadRequest(format!("Invalid reservation id: {e}")))
}
