//! Shared identifier and value types used across the booking crates.

mod types;

pub use types::{EventId, InvalidEventId, Money, PaymentMethod, ReservationId, UserId};
