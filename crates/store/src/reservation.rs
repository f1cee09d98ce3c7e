//! Reservation records and their lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{EventId, Money, PaymentMethod, ReservationId, UserId};

/// The lifecycle status of a reservation.
///
/// State transitions:
/// ```text
/// Pending ──┬──► Confirmed
///           └──► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    /// Created by the saga, resources not yet committed.
    #[default]
    Pending,

    /// Inventory reserved and payment captured (terminal state).
    Confirmed,

    /// The saga aborted and compensated (terminal state).
    Cancelled,
}

impl ReservationStatus {
    /// Returns true if a reservation in this status may move to `target`.
    pub fn can_transition_to(&self, target: ReservationStatus) -> bool {
        matches!(
            (self, target),
            (
                ReservationStatus::Pending,
                ReservationStatus::Confirmed | ReservationStatus::Cancelled
            )
        )
    }

    /// Returns true if this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ReservationStatus::Confirmed | ReservationStatus::Cancelled
        )
    }

    /// Returns the status name as stored.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "PENDING",
            ReservationStatus::Confirmed => "CONFIRMED",
            ReservationStatus::Cancelled => "CANCELLED",
        }
    }

    /// Parses a stored status name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(ReservationStatus::Pending),
            "CONFIRMED" => Some(ReservationStatus::Confirmed),
            "CANCELLED" => Some(ReservationStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A persisted reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub user_id: UserId,
    pub event_id: EventId,
    pub quantity: u32,
    pub payment_method: PaymentMethod,
    /// Amount the saga captures for this reservation.
    pub total: Money,
    pub status: ReservationStatus,
    /// Why the reservation was cancelled, if it was.
    pub compensation_note: Option<String>,
    /// Reference returned by the payment collaborator on capture.
    pub payment_reference: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields needed to create a reservation in [`ReservationStatus::Pending`].
#[derive(Debug, Clone)]
pub struct NewReservation {
    pub user_id: UserId,
    pub event_id: EventId,
    pub quantity: u32,
    pub payment_method: PaymentMethod,
    pub total: Money,
}

impl NewReservation {
    /// Builds a fully populated pending record with a fresh ID.
    pub(crate) fn into_pending(self, now: DateTime<Utc>) -> Reservation {
        Reservation {
            id: ReservationId::new(),
            user_id: self.user_id,
            event_id: self.event_id,
            quantity: self.quantity,
            payment_method: self.payment_method,
            total: self.total,
            status: ReservationStatus::Pending,
            compensation_note: None,
            payment_reference: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A requested status transition with its accompanying data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub status: ReservationStatus,
    pub note: Option<String>,
    pub payment_reference: Option<String>,
}

impl StatusChange {
    /// Confirms a reservation. Clears any compensation note.
    pub fn confirmed(payment_reference: Option<String>) -> Self {
        Self {
            status: ReservationStatus::Confirmed,
            note: None,
            payment_reference,
        }
    }

    /// Cancels a reservation, recording why.
    pub fn cancelled(note: impl Into<String>) -> Self {
        Self {
            status: ReservationStatus::Cancelled,
            note: Some(note.into()),
            payment_reference: None,
        }
    }

    /// Applies this change to a record in place.
    pub(crate) fn apply_to(&self, reservation: &mut Reservation, now: DateTime<Utc>) {
        reservation.status = self.status;
        reservation.compensation_note = self.note.clone();
        if self.payment_reference.is_some() {
            reservation.payment_reference = self.payment_reference.clone();
        }
        reservation.updated_at = now;
    }
}
