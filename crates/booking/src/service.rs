//! Entry point for booking requests.

use store::{InventoryStore, ReservationStore};

use crate::config::SagaConfig;
use crate::error::Result;
use crate::orchestrator::{BookingOutcome, ReservationSaga};
use crate::pipeline::ValidationPipeline;
use crate::request::ReservationRequest;
use crate::services::payment::PaymentGateway;

/// Validates a request and, if it passes, runs the reservation saga.
///
/// The pipeline and the saga share the same inventory and payment
/// collaborators.
pub struct BookingService<R, I, P>
where
    R: ReservationStore,
    I: InventoryStore,
    P: PaymentGateway,
{
    pipeline: ValidationPipeline,
    saga: ReservationSaga<R, I, P>,
}

impl<R, I, P> BookingService<R, I, P>
where
    R: ReservationStore,
    I: InventoryStore + Clone + 'static,
    P: PaymentGateway + Clone + 'static,
{
    /// Builds the standard pipeline and a saga over the given collaborators.
    pub fn new(reservations: R, inventory: I, payment: P, config: SagaConfig) -> Self {
        let pipeline = ValidationPipeline::standard(inventory.clone(), payment.clone());
        let saga = ReservationSaga::with_config(reservations, inventory, payment, config);
        Self { pipeline, saga }
    }
}

impl<R, I, P> BookingService<R, I, P>
where
    R: ReservationStore,
    I: InventoryStore,
    P: PaymentGateway,
{
    /// Builds a service from parts, e.g. a pipeline with extra stages.
    pub fn from_parts(pipeline: ValidationPipeline, saga: ReservationSaga<R, I, P>) -> Self {
        Self { pipeline, saga }
    }

    pub fn pipeline(&self) -> &ValidationPipeline {
        &self.pipeline
    }

    pub fn saga(&self) -> &ReservationSaga<R, I, P> {
        &self.saga
    }

    /// Books seats for an untrusted request.
    ///
    /// Validation failures are returned before any collaborator state changes.
    pub async fn book(&self, request: ReservationRequest) -> Result<BookingOutcome> {
        let validated = self.pipeline.run(request).await?;
        self.saga.execute(validated.command).await
    }
}
