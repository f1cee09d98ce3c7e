//! Reservation saga orchestrator.

use std::future::Future;
use std::time::Instant;

use serde::Serialize;
use store::{
    EventInventory, InventoryStore, Money, NewReservation, Reservation, ReservationId,
    ReservationStore, StatusChange,
};

use crate::config::SagaConfig;
use crate::error::{BookingError, Result};
use crate::request::ValidatedCommand;
use crate::seat_booking;
use crate::services::payment::{PaymentCapture, PaymentGateway};
use crate::state::SagaState;

/// What a confirmed booking returns to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct BookingOutcome {
    /// The reservation, in `CONFIRMED` status.
    pub reservation: Reservation,
    /// The event snapshot right after seats were taken.
    pub event: EventInventory,
    pub payment: PaymentCapture,
}

/// Books seats by driving the reservation store, the inventory and the
/// payment gateway in strict sequence.
///
/// Steps: create a pending reservation, reserve inventory, capture payment,
/// confirm. A failure after the reservation exists releases the seats (if
/// taken), cancels the reservation with a note, and returns the original
/// error unchanged. A step that times out is not compensated: its outcome is
/// unknown, so the reservation is left `PENDING`.
pub struct ReservationSaga<R, I, P>
where
    R: ReservationStore,
    I: InventoryStore,
    P: PaymentGateway,
{
    reservations: R,
    inventory: I,
    payment: P,
    config: SagaConfig,
}

impl<R, I, P> ReservationSaga<R, I, P>
where
    R: ReservationStore,
    I: InventoryStore,
    P: PaymentGateway,
{
    /// Creates a saga with the default configuration.
    pub fn new(reservations: R, inventory: I, payment: P) -> Self {
        Self::with_config(reservations, inventory, payment, SagaConfig::default())
    }

    pub fn with_config(reservations: R, inventory: I, payment: P, config: SagaConfig) -> Self {
        Self {
            reservations,
            inventory,
            payment,
            config,
        }
    }

    pub fn config(&self) -> &SagaConfig {
        &self.config
    }

    /// Runs the saga for an already validated command.
    ///
    /// Not idempotent: every call that gets past the first step creates a
    /// new reservation record.
    #[tracing::instrument(
        skip(self, command),
        fields(
            saga_type = seat_booking::SAGA_TYPE,
            user_id = %command.user_id,
            event_id = %command.event_id,
            quantity = command.quantity,
        )
    )]
    pub async fn execute(&self, command: ValidatedCommand) -> Result<BookingOutcome> {
        metrics::counter!("booking_saga_executions_total").increment(1);
        let started = Instant::now();
        let mut saga = SagaState::new();
        let Some(total) = self.config.seat_price.checked_multiply(command.quantity) else {
            let error = BookingError::payment("The booking total exceeds the chargeable amount");
            tracing::warn!(%error, seat_price = %self.config.seat_price, "total overflowed");
            record_duration(started);
            return Err(error);
        };

        // 1. Create the pending reservation. Nothing to undo if this fails.
        tracing::info!(step = seat_booking::STEP_CREATE_RESERVATION, "saga step started");
        let reservation_id = match self.create_reservation(&command, total).await {
            Ok(reservation) => {
                let id = reservation.id;
                saga.record_reservation(reservation);
                id
            }
            Err(error) => {
                tracing::warn!(%error, kind = error.kind(), "reservation could not be created");
                record_duration(started);
                return Err(error);
            }
        };

        // 2. Take the seats.
        tracing::info!(step = seat_booking::STEP_RESERVE_INVENTORY, "saga step started");
        let event = match self.reserve_inventory(&command).await {
            Ok(event) => event,
            Err(error) => return Err(self.abort(&command, &mut saga, error, started).await),
        };
        saga.record_inventory(event.clone(), command.quantity);

        // 3. Capture payment.
        tracing::info!(step = seat_booking::STEP_CAPTURE_PAYMENT, "saga step started");
        let payment = match self.capture_payment(&command, total).await {
            Ok(payment) => payment,
            Err(error) => return Err(self.abort(&command, &mut saga, error, started).await),
        };
        saga.record_payment(payment.clone());

        // 4. Confirm.
        tracing::info!(step = seat_booking::STEP_CONFIRM_RESERVATION, "saga step started");
        let reservation = match self
            .confirm_reservation(reservation_id, payment.reference.clone())
            .await
        {
            Ok(reservation) => reservation,
            Err(error) => return Err(self.abort(&command, &mut saga, error, started).await),
        };
        saga.record_confirmation(reservation.clone());

        let duration = record_duration(started);
        metrics::counter!("booking_saga_confirmed_total").increment(1);
        tracing::info!(
            reservation_id = %reservation.id,
            payment_reference = %payment.reference,
            duration,
            "booking confirmed"
        );

        Ok(BookingOutcome {
            reservation,
            event,
            payment,
        })
    }

    async fn create_reservation(
        &self,
        command: &ValidatedCommand,
        total: Money,
    ) -> Result<Reservation> {
        let reservation = NewReservation {
            user_id: command.user_id.clone(),
            event_id: command.event_id.clone(),
            quantity: command.quantity,
            payment_method: command.payment_method.clone(),
            total,
        };
        self.call(
            seat_booking::STEP_CREATE_RESERVATION,
            self.reservations.create(reservation),
        )
        .await
    }

    async fn reserve_inventory(&self, command: &ValidatedCommand) -> Result<EventInventory> {
        self.call(
            seat_booking::STEP_RESERVE_INVENTORY,
            self.inventory.reserve(&command.event_id, command.quantity),
        )
        .await?
        .ok_or_else(|| {
            BookingError::inventory(
                "Could not reserve the requested seats; capacity may have changed concurrently",
            )
        })
    }

    async fn capture_payment(
        &self,
        command: &ValidatedCommand,
        amount: Money,
    ) -> Result<PaymentCapture> {
        let capture = self
            .call(
                seat_booking::STEP_CAPTURE_PAYMENT,
                self.payment.capture(&command.payment_method, amount),
            )
            .await?;

        if !capture.confirmed {
            return Err(BookingError::payment(
                "The payment processor did not confirm the transaction",
            ));
        }
        Ok(capture)
    }

    async fn confirm_reservation(
        &self,
        id: ReservationId,
        payment_reference: String,
    ) -> Result<Reservation> {
        self.call(
            seat_booking::STEP_CONFIRM_RESERVATION,
            self.reservations
                .set_status(id, StatusChange::confirmed(Some(payment_reference))),
        )
        .await
    }

    /// Compensates when the failure is known and hands the triggering error
    /// back to the caller.
    async fn abort(
        &self,
        command: &ValidatedCommand,
        saga: &mut SagaState,
        error: BookingError,
        started: Instant,
    ) -> BookingError {
        tracing::warn!(
            phase = %saga.phase(),
            kind = error.kind(),
            %error,
            "saga step failed"
        );

        if let BookingError::Timeout { step, .. } = &error {
            // The collaborator may have committed after the timer fired.
            // Nothing is undone; the reservation stays PENDING for reconciliation.
            metrics::counter!("booking_saga_unresolved_total", "step" => *step).increment(1);
            tracing::error!(
                step = *step,
                reservation_id = ?saga.reservation().map(|r| r.id),
                "step outcome unknown, reservation left pending"
            );
        } else {
            if saga.phase().can_compensate() {
                self.compensate(command, saga, &error).await;
            }
            metrics::counter!("booking_saga_cancelled_total", "reason" => error.kind())
                .increment(1);
        }

        record_duration(started);
        error
    }

    /// Undoes completed steps in reverse order. Never fails: problems are
    /// logged and counted.
    #[tracing::instrument(skip_all, fields(completed = saga.completed_steps().len()))]
    async fn compensate(
        &self,
        command: &ValidatedCommand,
        saga: &mut SagaState,
        error: &BookingError,
    ) {
        saga.begin_compensation();

        if let Some(payment) = saga.payment() {
            tracing::warn!(
                payment_reference = %payment.reference,
                amount = %payment.amount,
                "payment was captured before the failure and must be refunded out of band"
            );
        }

        if let Some(quantity) = saga.reserved_quantity() {
            let action = seat_booking::COMPENSATE_RELEASE_INVENTORY;
            match self
                .call(action, self.inventory.release(&command.event_id, quantity))
                .await
            {
                Ok(Some(event)) => {
                    tracing::info!(action, quantity, "compensation step completed");
                    saga.record_release(event);
                }
                Ok(None) => compensation_failed(action, "event no longer exists"),
                Err(e) => compensation_failed(action, &e),
            }
        }

        let mut cancelled = None;
        if let Some(id) = saga.reservation().map(|r| r.id) {
            let action = seat_booking::COMPENSATE_CANCEL_RESERVATION;
            let note = format!("Reason: {error}");
            match self
                .call(action, self.reservations.set_status(id, StatusChange::cancelled(note)))
                .await
            {
                Ok(reservation) => {
                    tracing::info!(action, reservation_id = %id, "compensation step completed");
                    cancelled = Some(reservation);
                }
                Err(e) => compensation_failed(action, &e),
            }
        }

        saga.finish_compensation(cancelled);
    }

    /// Awaits a collaborator call, bounded by the configured step timeout.
    async fn call<T, E, F>(&self, step: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, E>>,
        BookingError: From<E>,
    {
        match self.config.step_timeout {
            Some(timeout) => match tokio::time::timeout(timeout, fut).await {
                Ok(result) => result.map_err(BookingError::from),
                Err(_) => Err(BookingError::Timeout { step, timeout }),
            },
            None => fut.await.map_err(BookingError::from),
        }
    }
}

fn compensation_failed(action: &'static str, reason: impl std::fmt::Display) {
    metrics::counter!("booking_compensation_failures_total", "action" => action).increment(1);
    tracing::error!(action, error = %reason, "compensation action failed");
}

fn record_duration(started: Instant) -> f64 {
    let duration = started.elapsed().as_secs_f64();
    metrics::histogram!("booking_saga_duration_seconds").record(duration);
    duration
}
