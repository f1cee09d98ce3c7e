//! Integration tests for the seat booking saga.

use std::sync::Arc;

use booking::{
    BookingError, BookingService, InMemoryPaymentGateway, ReservationRequest, ReservationSaga,
    SagaConfig, ValidatedCommand,
};
use common::{EventId, Money, PaymentMethod, UserId};
use futures_util::future::join_all;
use store::{
    InMemoryInventoryStore, InMemoryReservationStore, NewEvent, Reservation, ReservationStatus,
};

type TestService =
    BookingService<InMemoryReservationStore, InMemoryInventoryStore, InMemoryPaymentGateway>;

struct TestHarness {
    service: Arc<TestService>,
    reservations: InMemoryReservationStore,
    inventory: InMemoryInventoryStore,
    payment: InMemoryPaymentGateway,
    event_id: EventId,
}

impl TestHarness {
    async fn with_capacity(capacity: u32) -> Self {
        let reservations = InMemoryReservationStore::new();
        let inventory = InMemoryInventoryStore::new();
        let payment = InMemoryPaymentGateway::new();
        let event = inventory.insert(NewEvent::new("Festival", capacity)).await;

        let service = BookingService::new(
            reservations.clone(),
            inventory.clone(),
            payment.clone(),
            SagaConfig::default(),
        );

        Self {
            service: Arc::new(service),
            reservations,
            inventory,
            payment,
            event_id: event.id,
        }
    }

    fn saga(
        &self,
    ) -> ReservationSaga<InMemoryReservationStore, InMemoryInventoryStore, InMemoryPaymentGateway>
    {
        ReservationSaga::new(
            self.reservations.clone(),
            self.inventory.clone(),
            self.payment.clone(),
        )
    }

    fn request(&self, user: &str, quantity: u32, method: &str) -> ReservationRequest {
        ReservationRequest::new(user, self.event_id.as_str(), quantity, method)
    }

    fn command(&self, user: &str, quantity: u32, method: &str) -> ValidatedCommand {
        ValidatedCommand {
            user_id: UserId::new(user),
            event_id: self.event_id.clone(),
            quantity,
            payment_method: PaymentMethod::new(method),
        }
    }

    async fn available(&self) -> u32 {
        self.inventory.available(&self.event_id).await.unwrap()
    }

    async fn reservations_of(&self, user: &str) -> Vec<Reservation> {
        self.reservations.list_for_user(&UserId::new(user)).await
    }
}

#[tokio::test]
async fn test_successful_booking() {
    let h = TestHarness::with_capacity(10).await;

    let outcome = h.service.book(h.request("alice", 4, "card")).await.unwrap();

    assert_eq!(outcome.reservation.status, ReservationStatus::Confirmed);
    assert!(outcome.reservation.compensation_note.is_none());
    assert_eq!(outcome.event.available_capacity, Some(6));
    assert!(outcome.payment.confirmed);
    assert_eq!(outcome.payment.amount, Money::from_dollars(4));

    assert_eq!(h.available().await, 6);
    assert_eq!(h.payment.captured_total().await, Money::from_dollars(4));

    let stored = h.reservations_of("alice").await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].status, ReservationStatus::Confirmed);
    assert_eq!(stored[0].payment_reference, outcome.reservation.payment_reference);
}

#[tokio::test]
async fn test_invalid_quantity_touches_no_collaborator() {
    let h = TestHarness::with_capacity(10).await;

    for quantity in [
        serde_json::json!(0),
        serde_json::json!(-2),
        serde_json::json!("many"),
        serde_json::json!(1.5),
    ] {
        let request = ReservationRequest::new("alice", h.event_id.as_str(), quantity, "card");
        let err = h.service.book(request).await.unwrap_err();
        assert!(matches!(err, BookingError::Validation { .. }));
        assert_eq!(err.details().len(), 1);
    }

    assert_eq!(h.inventory.find_calls(), 0);
    assert_eq!(h.inventory.reserve_calls(), 0);
    assert_eq!(h.payment.authorize_calls(), 0);
    assert_eq!(h.payment.capture_calls(), 0);
    assert_eq!(h.reservations.create_calls(), 0);
}

#[tokio::test]
async fn test_capacity_shortfall_at_reserve_time() {
    let h = TestHarness::with_capacity(2).await;

    // Bypass the precondition check so the atomic reserve is what refuses.
    let err = h
        .saga()
        .execute(h.command("alice", 3, "card"))
        .await
        .unwrap_err();

    assert!(matches!(err, BookingError::Inventory(_)));
    assert_eq!(h.available().await, 2);

    let stored = h.reservations_of("alice").await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].status, ReservationStatus::Cancelled);
}

#[tokio::test]
async fn test_capacity_shortfall_rejected_by_precondition() {
    let h = TestHarness::with_capacity(2).await;

    let err = h
        .service
        .book(h.request("alice", 3, "card"))
        .await
        .unwrap_err();

    assert!(matches!(err, BookingError::Inventory(_)));
    assert_eq!(h.reservations.create_calls(), 0);
    assert_eq!(h.available().await, 2);
}

#[tokio::test]
async fn test_capture_failure_restores_inventory() {
    let h = TestHarness::with_capacity(10).await;
    h.payment.set_fail_on_capture(true);

    let err = h
        .service
        .book(h.request("alice", 3, "card"))
        .await
        .unwrap_err();

    assert!(matches!(err, BookingError::Transport(_)));
    assert_eq!(h.available().await, 10);
    assert_eq!(h.inventory.release_calls(), 1);

    let stored = h.reservations_of("alice").await;
    assert_eq!(stored[0].status, ReservationStatus::Cancelled);
    assert!(
        stored[0]
            .compensation_note
            .as_deref()
            .unwrap()
            .contains("payment processor unreachable")
    );
}

#[tokio::test]
async fn test_decline_token_cancels_and_restores_inventory() {
    let h = TestHarness::with_capacity(5).await;

    let err = h
        .saga()
        .execute(h.command("alice", 2, "decline"))
        .await
        .unwrap_err();

    assert!(matches!(err, BookingError::Payment(_)));
    assert_eq!(h.available().await, 5);

    let stored = h.reservations_of("alice").await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].status, ReservationStatus::Cancelled);
    assert_eq!(
        stored[0].compensation_note.as_deref(),
        Some("Reason: payment was declined by the gateway")
    );
}

#[tokio::test]
async fn test_decline_token_rejected_by_authorization_stage() {
    let h = TestHarness::with_capacity(5).await;

    let err = h
        .service
        .book(h.request("alice", 2, "DECLINE"))
        .await
        .unwrap_err();

    assert!(matches!(err, BookingError::Payment(_)));
    assert_eq!(h.reservations.create_calls(), 0);
    assert_eq!(h.payment.capture_calls(), 0);
}

#[tokio::test]
async fn test_retry_after_payment_failure_creates_new_reservation() {
    let h = TestHarness::with_capacity(5).await;
    h.payment.set_fail_on_capture(true);

    let first = h.service.book(h.request("alice", 1, "card")).await;
    assert!(first.is_err());

    h.payment.set_fail_on_capture(false);
    let second = h.service.book(h.request("alice", 1, "card")).await.unwrap();

    let stored = h.reservations_of("alice").await;
    assert_eq!(stored.len(), 2);
    assert_ne!(stored[0].id, stored[1].id);

    let (retried, abandoned): (Vec<_>, Vec<_>) = stored
        .into_iter()
        .partition(|r| r.id == second.reservation.id);
    assert_eq!(retried[0].status, ReservationStatus::Confirmed);
    assert_eq!(abandoned[0].status, ReservationStatus::Cancelled);
    assert_eq!(h.available().await, 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_two_concurrent_bookings_for_three_of_five() {
    let h = TestHarness::with_capacity(5).await;

    let tasks = ["alice", "bob"].map(|user| {
        let service = h.service.clone();
        let request = h.request(user, 3, "card");
        tokio::spawn(async move { service.book(request).await })
    });
    let results: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let confirmed = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(confirmed, 1);
    for result in &results {
        if let Err(err) = result {
            assert!(matches!(err, BookingError::Inventory(_)));
        }
    }
    assert_eq!(h.available().await, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_two_concurrent_sagas_for_three_of_five() {
    let h = Arc::new(TestHarness::with_capacity(5).await);
    let saga = Arc::new(h.saga());

    let tasks = ["alice", "bob"].map(|user| {
        let saga = saga.clone();
        let command = h.command(user, 3, "card");
        tokio::spawn(async move { saga.execute(command).await })
    });
    let results: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(
        results
            .iter()
            .filter(|r| matches!(r, Err(BookingError::Inventory(_))))
            .count(),
        1
    );
    assert_eq!(h.available().await, 2);

    // The loser's reservation exists but was cancelled.
    let mut statuses: Vec<_> = [h.reservations_of("alice").await, h.reservations_of("bob").await]
        .concat()
        .into_iter()
        .map(|r| r.status)
        .collect();
    statuses.sort_by_key(|s| s.as_str());
    assert_eq!(
        statuses,
        vec![ReservationStatus::Cancelled, ReservationStatus::Confirmed]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_bookings_never_oversell() {
    const CAPACITY: u32 = 20;
    const ATTEMPTS: usize = 40;
    const SEATS_EACH: u32 = 3;

    let h = TestHarness::with_capacity(CAPACITY).await;

    let tasks = (0..ATTEMPTS).map(|i| {
        let service = h.service.clone();
        let request = h.request(&format!("user-{i}"), SEATS_EACH, "card");
        tokio::spawn(async move { service.book(request).await })
    });
    let results: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let granted: u32 = results
        .iter()
        .filter_map(|r| r.as_ref().ok())
        .map(|outcome| outcome.reservation.quantity)
        .sum();

    assert!(granted <= CAPACITY);
    assert_eq!(granted, CAPACITY / SEATS_EACH * SEATS_EACH);
    assert_eq!(h.available().await, CAPACITY - granted);
    assert!(
        results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, BookingError::Inventory(_)))
    );
    assert_eq!(
        h.payment.captured_total().await,
        Money::from_dollars(i64::from(granted))
    );
}
