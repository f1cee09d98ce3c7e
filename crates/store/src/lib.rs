//! Collaborators the booking saga depends on.
//!
//! Two stores live here, each with an in-memory implementation for tests and
//! a PostgreSQL implementation:
//! - [`ReservationStore`] owns reservation records and their lifecycle.
//! - [`InventoryStore`] owns per-event seat counts and guarantees that
//!   [`InventoryStore::reserve`] is a single atomic conditional decrement.

pub mod error;
pub mod inventory;
pub mod memory;
pub mod postgres;
pub mod reservation;
pub mod store;

pub use common::{EventId, Money, PaymentMethod, ReservationId, UserId};
pub use error::{Result, StoreError};
pub use inventory::{EventInventory, NewEvent};
pub use memory::{InMemoryInventoryStore, InMemoryReservationStore};
pub use postgres::{PostgresInventoryStore, PostgresReservationStore, run_migrations};
pub use reservation::{NewReservation, Reservation, ReservationStatus, StatusChange};
pub use store::{InventoryStore, ReservationStore};
