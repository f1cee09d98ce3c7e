//! Event inventory lookup.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::EventId;
use store::{EventInventory, InventoryStore, ReservationStore};

use crate::AppState;
use crate::error::ApiError;

/// GET /events/{id}: current seat counts of an event.
#[tracing::instrument(skip(state))]
pub async fn get<R, I>(
    State(state): State<Arc<AppState<R, I>>>,
    Path(id): Path<String>,
) -> Result<Json<EventInventory>, ApiError>
where
    R: ReservationStore + 'static,
    I: InventoryStore + 'static,
{
    let event_id = EventId::parse(&id).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let event = state
        .inventory
        .find(&event_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Event {id} not found")))?;

    Ok(Json(event))
}
