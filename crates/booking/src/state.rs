//! Saga phase machine and per-invocation progress.

use serde::{Deserialize, Serialize};
use store::{EventInventory, Reservation};

use crate::seat_booking;
use crate::services::payment::PaymentCapture;

/// Where a single saga invocation currently is.
///
/// Phase transitions:
/// ```text
/// Start ──► ReservationCreated ──► InventoryReserved ──► PaymentCaptured ──► Confirmed
///                 │                       │                     │
///                 └───────────────────────┴─────────────────────┴──► Compensating ──► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SagaPhase {
    /// No step has completed yet.
    #[default]
    Start,

    /// A pending reservation exists.
    ReservationCreated,

    /// Seats have been taken from the event.
    InventoryReserved,

    /// The gateway confirmed the payment.
    PaymentCaptured,

    /// The reservation is confirmed (terminal state).
    Confirmed,

    /// A step failed and completed steps are being undone.
    Compensating,

    /// Compensation finished (terminal state).
    Cancelled,
}

impl SagaPhase {
    /// Returns true if a failure in this phase must be compensated.
    pub fn can_compensate(&self) -> bool {
        matches!(
            self,
            SagaPhase::ReservationCreated
                | SagaPhase::InventoryReserved
                | SagaPhase::PaymentCaptured
        )
    }

    /// Returns true if this is a terminal phase.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SagaPhase::Confirmed | SagaPhase::Cancelled)
    }

    /// Returns the phase name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            SagaPhase::Start => "START",
            SagaPhase::ReservationCreated => "RESERVATION_CREATED",
            SagaPhase::InventoryReserved => "INVENTORY_RESERVED",
            SagaPhase::PaymentCaptured => "PAYMENT_CAPTURED",
            SagaPhase::Confirmed => "CONFIRMED",
            SagaPhase::Compensating => "COMPENSATING",
            SagaPhase::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for SagaPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Progress of one saga invocation.
///
/// Owned by a single call to [`ReservationSaga::execute`](crate::ReservationSaga::execute)
/// and dropped when it returns. The compensator reads it to know exactly what
/// to undo.
#[derive(Debug, Clone, Default)]
pub struct SagaState {
    phase: SagaPhase,
    reservation: Option<Reservation>,
    event: Option<EventInventory>,
    reserved_quantity: Option<u32>,
    payment: Option<PaymentCapture>,
    completed_steps: Vec<&'static str>,
}

impl SagaState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> SagaPhase {
        self.phase
    }

    /// The latest copy of the reservation record.
    pub fn reservation(&self) -> Option<&Reservation> {
        self.reservation.as_ref()
    }

    /// The event snapshot returned by the last inventory call.
    pub fn event(&self) -> Option<&EventInventory> {
        self.event.as_ref()
    }

    /// Seats currently held by this invocation, if any.
    pub fn reserved_quantity(&self) -> Option<u32> {
        self.reserved_quantity
    }

    pub fn inventory_reserved(&self) -> bool {
        self.reserved_quantity.is_some()
    }

    pub fn payment(&self) -> Option<&PaymentCapture> {
        self.payment.as_ref()
    }

    /// Forward steps that completed, in execution order.
    pub fn completed_steps(&self) -> &[&'static str] {
        &self.completed_steps
    }

    pub fn record_reservation(&mut self, reservation: Reservation) {
        self.reservation = Some(reservation);
        self.advance(SagaPhase::ReservationCreated, seat_booking::STEP_CREATE_RESERVATION);
    }

    pub fn record_inventory(&mut self, event: EventInventory, quantity: u32) {
        self.event = Some(event);
        self.reserved_quantity = Some(quantity);
        self.advance(SagaPhase::InventoryReserved, seat_booking::STEP_RESERVE_INVENTORY);
    }

    pub fn record_payment(&mut self, capture: PaymentCapture) {
        self.payment = Some(capture);
        self.advance(SagaPhase::PaymentCaptured, seat_booking::STEP_CAPTURE_PAYMENT);
    }

    pub fn record_confirmation(&mut self, reservation: Reservation) {
        self.reservation = Some(reservation);
        self.advance(SagaPhase::Confirmed, seat_booking::STEP_CONFIRM_RESERVATION);
    }

    /// Enters the compensating phase.
    pub fn begin_compensation(&mut self) {
        self.phase = SagaPhase::Compensating;
    }

    /// Records that reserved seats went back to the event.
    pub fn record_release(&mut self, event: EventInventory) {
        self.event = Some(event);
        self.reserved_quantity = None;
    }

    /// Ends compensation, keeping the cancelled record when the store
    /// accepted the cancellation.
    pub fn finish_compensation(&mut self, cancelled: Option<Reservation>) {
        if let Some(reservation) = cancelled {
            self.reservation = Some(reservation);
        }
        self.phase = SagaPhase::Cancelled;
    }

    fn advance(&mut self, phase: SagaPhase, step: &'static str) {
        self.phase = phase;
        self.completed_steps.push(step);
    }
}
