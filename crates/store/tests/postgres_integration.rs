//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use futures_util::future::join_all;
use sqlx::PgPool;
use store::{
    EventId, InventoryStore, Money, NewEvent, NewReservation, PaymentMethod,
    PostgresInventoryStore, PostgresReservationStore, ReservationId, ReservationStatus,
    ReservationStore, StatusChange, StoreError, UserId,
};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            store::run_migrations(&temp_pool).await.unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get fresh stores with their own pool and cleared tables
async fn get_test_stores() -> (PostgresReservationStore, PostgresInventoryStore) {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE reservations, event_inventory")
        .execute(&pool)
        .await
        .unwrap();

    (
        PostgresReservationStore::new(pool.clone()),
        PostgresInventoryStore::new(pool),
    )
}

fn new_reservation(event_id: &EventId, quantity: u32) -> NewReservation {
    NewReservation {
        user_id: UserId::new("user-42"),
        event_id: event_id.clone(),
        quantity,
        payment_method: PaymentMethod::new("card"),
        total: Money::from_dollars(i64::from(quantity)),
    }
}

#[tokio::test]
async fn test_create_and_get_reservation() {
    let (reservations, inventory) = get_test_stores().await;
    let event = inventory
        .create_event(NewEvent::new("Opening night", 10))
        .await
        .unwrap();

    let created = reservations
        .create(new_reservation(&event.id, 2))
        .await
        .unwrap();

    assert_eq!(created.status, ReservationStatus::Pending);
    assert_eq!(created.total, Money::from_dollars(2));

    let loaded = reservations.get(created.id).await.unwrap().unwrap();
    assert_eq!(loaded.id, created.id);
    assert_eq!(loaded.event_id, event.id);
    assert_eq!(loaded.quantity, 2);
}

#[tokio::test]
async fn test_confirm_then_cancel_is_rejected() {
    let (reservations, inventory) = get_test_stores().await;
    let event = inventory
        .create_event(NewEvent::new("Opening night", 10))
        .await
        .unwrap();
    let created = reservations
        .create(new_reservation(&event.id, 1))
        .await
        .unwrap();

    let confirmed = reservations
        .set_status(
            created.id,
            StatusChange::confirmed(Some("PAY-0001".to_string())),
        )
        .await
        .unwrap();
    assert_eq!(confirmed.status, ReservationStatus::Confirmed);
    assert_eq!(confirmed.payment_reference.as_deref(), Some("PAY-0001"));

    let result = reservations
        .set_status(created.id, StatusChange::cancelled("late failure"))
        .await;
    assert!(matches!(
        result,
        Err(StoreError::InvalidTransition {
            from: ReservationStatus::Confirmed,
            to: ReservationStatus::Cancelled,
        })
    ));
}

#[tokio::test]
async fn test_cancel_records_note() {
    let (reservations, inventory) = get_test_stores().await;
    let event = inventory
        .create_event(NewEvent::new("Opening night", 10))
        .await
        .unwrap();
    let created = reservations
        .create(new_reservation(&event.id, 1))
        .await
        .unwrap();

    let cancelled = reservations
        .set_status(created.id, StatusChange::cancelled("Reason: declined"))
        .await
        .unwrap();

    assert_eq!(cancelled.status, ReservationStatus::Cancelled);
    assert_eq!(
        cancelled.compensation_note.as_deref(),
        Some("Reason: declined")
    );
}

#[tokio::test]
async fn test_set_status_unknown_reservation() {
    let (reservations, _) = get_test_stores().await;
    let result = reservations
        .set_status(ReservationId::new(), StatusChange::cancelled("x"))
        .await;
    assert!(matches!(result, Err(StoreError::ReservationNotFound(_))));
}

#[tokio::test]
async fn test_reserve_and_release() {
    let (_, inventory) = get_test_stores().await;
    let event = inventory
        .create_event(NewEvent::new("Matinee", 5))
        .await
        .unwrap();

    let reserved = inventory.reserve(&event.id, 3).await.unwrap().unwrap();
    assert_eq!(reserved.available_capacity, Some(2));

    assert!(inventory.reserve(&event.id, 3).await.unwrap().is_none());

    let released = inventory.release(&event.id, 3).await.unwrap().unwrap();
    assert_eq!(released.available_capacity, Some(5));

    // Release never exceeds the total capacity.
    let released = inventory.release(&event.id, 4).await.unwrap().unwrap();
    assert_eq!(released.available_capacity, Some(5));
}

#[tokio::test]
async fn test_reserve_unknown_event_returns_none() {
    let (_, inventory) = get_test_stores().await;
    assert!(
        inventory
            .reserve(&EventId::generate(), 1)
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        inventory
            .release(&EventId::generate(), 1)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_zero_quantity_is_rejected() {
    let (_, inventory) = get_test_stores().await;
    let event = inventory
        .create_event(NewEvent::new("Matinee", 5))
        .await
        .unwrap();

    assert!(matches!(
        inventory.reserve(&event.id, 0).await,
        Err(StoreError::InvalidQuantity(0))
    ));
}

#[tokio::test]
async fn test_concurrent_reserves_never_oversell() {
    let (_, inventory) = get_test_stores().await;
    let event = inventory
        .create_event(NewEvent::new("Sold out show", 7))
        .await
        .unwrap();

    let attempts = (0..20).map(|_| {
        let inventory = inventory.clone();
        let id = event.id.clone();
        async move { inventory.reserve(&id, 2).await.unwrap().is_some() }
    });
    let granted = join_all(attempts).await.into_iter().filter(|ok| *ok).count();

    assert_eq!(granted, 3);
    let snapshot = inventory.find(&event.id).await.unwrap().unwrap();
    assert_eq!(snapshot.available_capacity, Some(1));
}
