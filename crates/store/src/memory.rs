use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    EventId, EventInventory, InventoryStore, NewEvent, NewReservation, Reservation,
    ReservationId, ReservationStore, Result, StatusChange, StoreError, UserId,
};

/// In-memory reservation store for testing.
///
/// Enforces the same lifecycle rules as the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryReservationStore {
    reservations: Arc<RwLock<HashMap<ReservationId, Reservation>>>,
    create_calls: Arc<AtomicUsize>,
    set_status_calls: Arc<AtomicUsize>,
}

impl InMemoryReservationStore {
    /// Creates a new empty reservation store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored reservations.
    pub async fn count(&self) -> usize {
        self.reservations.read().await.len()
    }

    /// Returns every reservation made by a user, oldest first.
    pub async fn list_for_user(&self, user_id: &UserId) -> Vec<Reservation> {
        let store = self.reservations.read().await;
        let mut found: Vec<_> = store
            .values()
            .filter(|r| &r.user_id == user_id)
            .cloned()
            .collect();
        found.sort_by_key(|r| r.created_at);
        found
    }

    /// Number of `create` calls received.
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    /// Number of `set_status` calls received.
    pub fn set_status_calls(&self) -> usize {
        self.set_status_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReservationStore for InMemoryReservationStore {
    async fn create(&self, reservation: NewReservation) -> Result<Reservation> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if reservation.quantity == 0 {
            return Err(StoreError::InvalidQuantity(reservation.quantity));
        }

        let record = reservation.into_pending(Utc::now());
        self.reservations
            .write()
            .await
            .insert(record.id, record.clone());
        Ok(record)
    }

    async fn set_status(&self, id: ReservationId, change: StatusChange) -> Result<Reservation> {
        self.set_status_calls.fetch_add(1, Ordering::SeqCst);
        let mut store = self.reservations.write().await;
        let record = store
            .get_mut(&id)
            .ok_or(StoreError::ReservationNotFound(id))?;

        if !record.status.can_transition_to(change.status) {
            return Err(StoreError::InvalidTransition {
                from: record.status,
                to: change.status,
            });
        }

        change.apply_to(record, Utc::now());
        Ok(record.clone())
    }

    async fn get(&self, id: ReservationId) -> Result<Option<Reservation>> {
        Ok(self.reservations.read().await.get(&id).cloned())
    }
}

/// In-memory inventory store for testing.
///
/// `reserve` checks and decrements under a single write-lock acquisition,
/// giving it the same compare-and-swap semantics as the conditional
/// `UPDATE` used by the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryInventoryStore {
    events: Arc<RwLock<HashMap<EventId, EventInventory>>>,
    fail_on_release: Arc<AtomicBool>,
    find_calls: Arc<AtomicUsize>,
    reserve_calls: Arc<AtomicUsize>,
    release_calls: Arc<AtomicUsize>,
}

impl InMemoryInventoryStore {
    /// Creates a new empty inventory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an event and returns its snapshot.
    pub async fn insert(&self, event: NewEvent) -> EventInventory {
        let inventory = event.into_inventory(Utc::now());
        self.events
            .write()
            .await
            .insert(inventory.id.clone(), inventory.clone());
        inventory
    }

    /// Overwrites the stored snapshot of an event as-is.
    ///
    /// Lets tests plant records the collaborator would never produce itself.
    pub async fn put_raw(&self, inventory: EventInventory) {
        self.events
            .write()
            .await
            .insert(inventory.id.clone(), inventory);
    }

    /// Returns the available seat count of an event.
    pub async fn available(&self, id: &EventId) -> Option<u32> {
        self.events
            .read()
            .await
            .get(id)
            .and_then(|e| e.available_capacity)
    }

    /// Configures the service to fail every release call.
    pub fn set_fail_on_release(&self, fail: bool) {
        self.fail_on_release.store(fail, Ordering::SeqCst);
    }

    /// Number of `find` calls received.
    pub fn find_calls(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }

    /// Number of `reserve` calls received.
    pub fn reserve_calls(&self) -> usize {
        self.reserve_calls.load(Ordering::SeqCst)
    }

    /// Number of `release` calls received.
    pub fn release_calls(&self) -> usize {
        self.release_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InventoryStore for InMemoryInventoryStore {
    async fn find(&self, id: &EventId) -> Result<Option<EventInventory>> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.events.read().await.get(id).cloned())
    }

    async fn reserve(&self, id: &EventId, quantity: u32) -> Result<Option<EventInventory>> {
        self.reserve_calls.fetch_add(1, Ordering::SeqCst);
        if quantity == 0 {
            return Err(StoreError::InvalidQuantity(quantity));
        }

        let mut events = self.events.write().await;
        let Some(event) = events.get_mut(id) else {
            return Ok(None);
        };

        match event.available_capacity {
            Some(available) if available >= quantity => {
                event.available_capacity = Some(available - quantity);
                event.updated_at = Utc::now();
                Ok(Some(event.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn release(&self, id: &EventId, quantity: u32) -> Result<Option<EventInventory>> {
        self.release_calls.fetch_add(1, Ordering::SeqCst);
        if quantity == 0 {
            return Err(StoreError::InvalidQuantity(quantity));
        }
        if self.fail_on_release.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "inventory release rejected".to_string(),
            ));
        }

        let mut events = self.events.write().await;
        let Some(event) = events.get_mut(id) else {
            return Ok(None);
        };

        let available = event.available_capacity.unwrap_or(0);
        event.available_capacity = Some(
            available
                .saturating_add(quantity)
                .min(event.total_capacity),
        );
        event.updated_at = Utc::now();
        Ok(Some(event.clone()))
    }
}
