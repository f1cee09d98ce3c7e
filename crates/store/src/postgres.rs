use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    EventId, EventInventory, InventoryStore, Money, NewEvent, NewReservation, PaymentMethod,
    Reservation, ReservationId, ReservationStatus, ReservationStore, Result, StatusChange,
    StoreError, UserId,
};

const RESERVATION_COLUMNS: &str = "id, user_id, event_id, quantity, payment_method, total_cents, \
     status, compensation_note, payment_reference, created_at, updated_at";

const EVENT_COLUMNS: &str =
    "id, name, total_capacity, available_capacity, created_at, updated_at";

/// Runs the database migrations shared by both PostgreSQL stores.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    Ok(())
}

fn db_quantity(quantity: u32) -> Result<i32> {
    match i32::try_from(quantity) {
        Ok(q) if q > 0 => Ok(q),
        _ => Err(StoreError::InvalidQuantity(quantity)),
    }
}

fn db_count(value: i32, column: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| StoreError::Corrupt(format!("{column} = {value}")))
}

fn parse_event_id(raw: String) -> Result<EventId> {
    EventId::parse(&raw).map_err(|e| StoreError::Corrupt(e.to_string()))
}

/// PostgreSQL-backed reservation store.
#[derive(Clone)]
pub struct PostgresReservationStore {
    pool: PgPool,
}

impl PostgresReservationStore {
    /// Creates a new PostgreSQL reservation store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn row_to_reservation(row: PgRow) -> Result<Reservation> {
        let status: String = row.try_get("status")?;
        let status = ReservationStatus::parse(&status)
            .ok_or_else(|| StoreError::Corrupt(format!("status = {status}")))?;

        Ok(Reservation {
            id: ReservationId::from_uuid(row.try_get::<Uuid, _>("id")?),
            user_id: UserId::new(row.try_get::<String, _>("user_id")?),
            event_id: parse_event_id(row.try_get("event_id")?)?,
            quantity: db_count(row.try_get("quantity")?, "quantity")?,
            payment_method: PaymentMethod::new(row.try_get::<String, _>("payment_method")?),
            total: Money::from_cents(row.try_get("total_cents")?),
            status,
            compensation_note: row.try_get("compensation_note")?,
            payment_reference: row.try_get("payment_reference")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl ReservationStore for PostgresReservationStore {
    #[tracing::instrument(skip(self, reservation), fields(event_id = %reservation.event_id))]
    async fn create(&self, reservation: NewReservation) -> Result<Reservation> {
        let quantity = db_quantity(reservation.quantity)?;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO reservations (id, user_id, event_id, quantity, payment_method, total_cents, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {RESERVATION_COLUMNS}
            "#
        ))
        .bind(ReservationId::new().as_uuid())
        .bind(reservation.user_id.as_str())
        .bind(reservation.event_id.as_str())
        .bind(quantity)
        .bind(reservation.payment_method.as_str())
        .bind(reservation.total.cents())
        .bind(ReservationStatus::Pending.as_str())
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_reservation(row)
    }

    #[tracing::instrument(skip(self, change), fields(status = %change.status))]
    async fn set_status(&self, id: ReservationId, change: StatusChange) -> Result<Reservation> {
        if !ReservationStatus::Pending.can_transition_to(change.status) {
            return Err(StoreError::InvalidTransition {
                from: ReservationStatus::Pending,
                to: change.status,
            });
        }

        // Only a pending row matches, so a terminal status is never overwritten.
        let updated = sqlx::query(&format!(
            r#"
            UPDATE reservations
            SET status = $2,
                compensation_note = $3,
                payment_reference = COALESCE($4, payment_reference),
                updated_at = now()
            WHERE id = $1 AND status = 'PENDING'
            RETURNING {RESERVATION_COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .bind(change.status.as_str())
        .bind(change.note.as_deref())
        .bind(change.payment_reference.as_deref())
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = updated {
            return Self::row_to_reservation(row);
        }

        let current: Option<String> =
            sqlx::query_scalar("SELECT status FROM reservations WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;

        match current {
            None => Err(StoreError::ReservationNotFound(id)),
            Some(status) => Err(StoreError::InvalidTransition {
                from: ReservationStatus::parse(&status)
                    .ok_or_else(|| StoreError::Corrupt(format!("status = {status}")))?,
                to: change.status,
            }),
        }
    }

    async fn get(&self, id: ReservationId) -> Result<Option<Reservation>> {
        let row = sqlx::query(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_reservation).transpose()
    }
}

/// PostgreSQL-backed inventory store.
///
/// Seat counts are only ever changed by single conditional `UPDATE`
/// statements, so concurrent reservations serialize on the row lock.
#[derive(Clone)]
pub struct PostgresInventoryStore {
    pool: PgPool,
}

impl PostgresInventoryStore {
    /// Creates a new PostgreSQL inventory store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Seeds an event and returns its snapshot.
    pub async fn create_event(&self, event: NewEvent) -> Result<EventInventory> {
        let total = i32::try_from(event.total_capacity)
            .map_err(|_| StoreError::InvalidQuantity(event.total_capacity))?;
        let available = i32::try_from(event.available_capacity)
            .map_err(|_| StoreError::InvalidQuantity(event.available_capacity))?;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO event_inventory (id, name, total_capacity, available_capacity)
            VALUES ($1, $2, $3, $4)
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(event.id.as_str())
        .bind(&event.name)
        .bind(total)
        .bind(available)
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_event(row)
    }

    fn row_to_event(row: PgRow) -> Result<EventInventory> {
        let available: i32 = row.try_get("available_capacity")?;

        Ok(EventInventory {
            id: parse_event_id(row.try_get("id")?)?,
            name: row.try_get("name")?,
            total_capacity: db_count(row.try_get("total_capacity")?, "total_capacity")?,
            available_capacity: u32::try_from(available).ok(),
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl InventoryStore for PostgresInventoryStore {
    async fn find(&self, id: &EventId) -> Result<Option<EventInventory>> {
        let row = sqlx::query(&format!(
            "SELECT {EVENT_COLUMNS} FROM event_inventory WHERE id = $1"
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_event).transpose()
    }

    #[tracing::instrument(skip(self))]
    async fn reserve(&self, id: &EventId, quantity: u32) -> Result<Option<EventInventory>> {
        let quantity = db_quantity(quantity)?;

        let row = sqlx::query(&format!(
            r#"
            UPDATE event_inventory
            SET available_capacity = available_capacity - $2,
                updated_at = now()
            WHERE id = $1 AND available_capacity >= $2
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(id.as_str())
        .bind(quantity)
        .fetch_optional(&self.pool)
        .await?;

        if row.is_none() {
            metrics::counter!("store_inventory_reserve_rejected_total").increment(1);
            tracing::debug!(event_id = %id, quantity, "conditional reserve matched no row");
        }

        row.map(Self::row_to_event).transpose()
    }

    #[tracing::instrument(skip(self))]
    async fn release(&self, id: &EventId, quantity: u32) -> Result<Option<EventInventory>> {
        let quantity = db_quantity(quantity)?;

        let row = sqlx::query(&format!(
            r#"
            UPDATE event_inventory
            SET available_capacity = LEAST(total_capacity, available_capacity + $2),
                updated_at = now()
            WHERE id = $1
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(id.as_str())
        .bind(quantity)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_event).transpose()
    }
}
