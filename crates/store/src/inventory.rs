//! Event seat inventory.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::EventId;

/// Snapshot of an event's seat counts.
///
/// The store keeps `0 <= available_capacity <= total_capacity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventInventory {
    pub id: EventId,
    pub name: String,
    pub total_capacity: u32,
    /// `None` only if the stored value could not be read as a seat count.
    pub available_capacity: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Seed data for an event. Used by tests and the demo server.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub id: EventId,
    pub name: String,
    pub total_capacity: u32,
    pub available_capacity: u32,
}

impl NewEvent {
    /// A fully available event with a generated ID.
    pub fn new(name: impl Into<String>, total_capacity: u32) -> Self {
        Self {
            id: EventId::generate(),
            name: name.into(),
            total_capacity,
            available_capacity: total_capacity,
        }
    }

    /// Overrides the available seat count, clamped to the total.
    pub fn with_available(mut self, available: u32) -> Self {
        self.available_capacity = available.min(self.total_capacity);
        self
    }

    pub(crate) fn into_inventory(self, now: DateTime<Utc>) -> EventInventory {
        EventInventory {
            id: self.id,
            name: self.name,
            total_capacity: self.total_capacity,
            available_capacity: Some(self.available_capacity),
            created_at: now,
            updated_at: now,
        }
    }
}
