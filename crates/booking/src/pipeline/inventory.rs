//! Inventory precondition check.

use async_trait::async_trait;
use store::InventoryStore;

use super::{BookingContext, ValidationStage};
use crate::error::BookingError;

/// Rejects requests for events that are missing or visibly short of seats.
///
/// This is a plausibility check only. It reserves nothing and races with
/// concurrent bookings; the saga's atomic reserve is what actually enforces
/// capacity.
pub struct InventoryPrecondition<I> {
    inventory: I,
}

impl<I: InventoryStore> InventoryPrecondition<I> {
    pub fn new(inventory: I) -> Self {
        Self { inventory }
    }
}

#[async_trait]
impl<I: InventoryStore> ValidationStage for InventoryPrecondition<I> {
    fn name(&self) -> &'static str {
        "inventory_precondition"
    }

    async fn check(&self, ctx: &mut BookingContext) -> Result<(), BookingError> {
        let command = ctx.require_command(self.name())?;
        let event_id = command.event_id.clone();
        let quantity = command.quantity;

        let event = self
            .inventory
            .find(&event_id)
            .await?
            .ok_or_else(|| BookingError::inventory("The requested event does not exist"))?;

        let Some(available) = event.available_capacity else {
            return Err(BookingError::inventory(
                "The event has no available capacity configured",
            ));
        };

        if available < quantity {
            return Err(BookingError::inventory(
                "Not enough seats available for the requested quantity",
            ));
        }

        tracing::debug!(%event_id, available, quantity, "inventory precondition met");
        ctx.record_event(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{ReservationRequest, ValidatedCommand};
    use common::{EventId, PaymentMethod, UserId};
    use store::{InMemoryInventoryStore, NewEvent};

    fn context_for(event_id: EventId, quantity: u32) -> BookingContext {
        let mut ctx = BookingContext::new(ReservationRequest::default());
        ctx.record_command(ValidatedCommand {
            user_id: UserId::new("u-1"),
            event_id,
            quantity,
            payment_method: PaymentMethod::new("card"),
        })
        .unwrap();
        ctx
    }

    #[tokio::test]
    async fn test_enough_seats_records_snapshot() {
        let store = InMemoryInventoryStore::new();
        let event = store.insert(NewEvent::new("Concert", 5)).await;
        let stage = InventoryPrecondition::new(store.clone());

        let mut ctx = context_for(event.id.clone(), 5);
        stage.check(&mut ctx).await.unwrap();

        assert_eq!(ctx.event().map(|e| &e.id), Some(&event.id));
        // Nothing is reserved by the precondition check.
        assert_eq!(store.available(&event.id).await, Some(5));
        assert_eq!(store.reserve_calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_event() {
        let stage = InventoryPrecondition::new(InMemoryInventoryStore::new());
        let mut ctx = context_for(EventId::generate(), 1);

        let err = stage.check(&mut ctx).await.unwrap_err();
        assert_eq!(err.to_string(), "The requested event does not exist");
    }

    #[tokio::test]
    async fn test_insufficient_seats() {
        let store = InMemoryInventoryStore::new();
        let event = store
            .insert(NewEvent::new("Concert", 5).with_available(2))
            .await;
        let stage = InventoryPrecondition::new(store);

        let mut ctx = context_for(event.id, 3);
        let err = stage.check(&mut ctx).await.unwrap_err();
        assert!(matches!(err, BookingError::Inventory(_)));
        assert!(ctx.event().is_none());
    }

    #[tokio::test]
    async fn test_unreadable_capacity() {
        let store = InMemoryInventoryStore::new();
        let mut broken = store.insert(NewEvent::new("Broken", 5)).await;
        broken.available_capacity = None;
        store.put_raw(broken.clone()).await;
        let stage = InventoryPrecondition::new(store);

        let mut ctx = context_for(broken.id, 1);
        let err = stage.check(&mut ctx).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "The event has no available capacity configured"
        );
    }

    #[tokio::test]
    async fn test_requires_data_validation_first() {
        let stage = InventoryPrecondition::new(InMemoryInventoryStore::new());
        let mut ctx = BookingContext::new(ReservationRequest::default());
        assert!(matches!(
            stage.check(&mut ctx).await,
            Err(BookingError::Pipeline(_))
        ));
    }
}
