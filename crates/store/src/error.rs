use thiserror::Error;

use crate::{ReservationId, ReservationStatus};

/// Errors that can occur when interacting with the stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No reservation exists with the given ID.
    #[error("Reservation not found: {0}")]
    ReservationNotFound(ReservationId),

    /// The requested lifecycle transition is not allowed.
    #[error("Invalid reservation transition from {from} to {to}")]
    InvalidTransition {
        from: ReservationStatus,
        to: ReservationStatus,
    },

    /// Inventory operations require a quantity greater than zero.
    #[error("Quantity must be greater than zero, got {0}")]
    InvalidQuantity(u32),

    /// The backing service could not be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A stored row could not be mapped back to a record.
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
