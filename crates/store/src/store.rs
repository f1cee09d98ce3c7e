use async_trait::async_trait;

use crate::{
    EventId, EventInventory, NewReservation, Reservation, ReservationId, Result, StatusChange,
};

/// Owns reservation records and their lifecycle.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// Persists a new reservation in `Pending` status.
    async fn create(&self, reservation: NewReservation) -> Result<Reservation>;

    /// Moves a reservation to a new status.
    ///
    /// Fails with `ReservationNotFound` if the ID is unknown and with
    /// `InvalidTransition` if the reservation is already terminal.
    async fn set_status(&self, id: ReservationId, change: StatusChange) -> Result<Reservation>;

    /// Loads a reservation by ID.
    async fn get(&self, id: ReservationId) -> Result<Option<Reservation>>;
}

/// Owns seat counts for events.
///
/// `reserve` and `release` must each be a single atomic read-modify-write of
/// the available count. Concurrent callers must never drive the count below
/// zero.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Loads the current snapshot of an event.
    async fn find(&self, id: &EventId) -> Result<Option<EventInventory>>;

    /// Decrements the available count by `quantity` only if at least
    /// `quantity` seats are available.
    ///
    /// Returns `Ok(None)` when the event does not exist or does not have
    /// enough seats.
    async fn reserve(&self, id: &EventId, quantity: u32) -> Result<Option<EventInventory>>;

    /// Returns `quantity` seats to the event, never exceeding its total.
    ///
    /// Returns `Ok(None)` when the event does not exist.
    async fn release(&self, id: &EventId, quantity: u32) -> Result<Option<EventInventory>>;
}
