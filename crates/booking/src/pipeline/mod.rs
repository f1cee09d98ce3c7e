//! Request validation pipeline.
//!
//! A pipeline is an ordered list of [`ValidationStage`]s run by a fixed
//! runner. Each stage inspects a shared [`BookingContext`], records
//! annotations on it, and either lets the runner continue or aborts the
//! whole pipeline with an error.

pub mod data;
pub mod inventory;
pub mod payment;

use async_trait::async_trait;
use store::{EventInventory, InventoryStore};

use crate::error::BookingError;
use crate::request::{ReservationRequest, ValidatedCommand};
use crate::services::payment::{PaymentAuthorization, PaymentGateway};

pub use data::DataValidation;
pub use inventory::InventoryPrecondition;
pub use payment::PaymentAuthorizationCheck;

/// One step of the validation pipeline.
#[async_trait]
pub trait ValidationStage: Send + Sync {
    /// Name used in logs and metrics.
    fn name(&self) -> &'static str;

    /// Inspects the context and annotates it, or fails.
    ///
    /// Returning an error stops the pipeline; later stages do not run.
    async fn check(&self, ctx: &mut BookingContext) -> Result<(), BookingError>;
}

/// State passed by reference through every stage.
///
/// Annotation slots are write-once: a stage can add an annotation but can
/// never replace one recorded by another stage.
#[derive(Debug)]
pub struct BookingContext {
    request: ReservationRequest,
    command: Option<ValidatedCommand>,
    event: Option<EventInventory>,
    authorization: Option<PaymentAuthorization>,
}

impl BookingContext {
    /// Starts a context for an incoming request.
    pub fn new(request: ReservationRequest) -> Self {
        Self {
            request,
            command: None,
            event: None,
            authorization: None,
        }
    }

    /// The raw request.
    pub fn request(&self) -> &ReservationRequest {
        &self.request
    }

    /// The normalized command, once data validation has run.
    pub fn command(&self) -> Option<&ValidatedCommand> {
        self.command.as_ref()
    }

    /// The event snapshot loaded by the precondition check.
    pub fn event(&self) -> Option<&EventInventory> {
        self.event.as_ref()
    }

    /// The payment authorization.
    pub fn authorization(&self) -> Option<&PaymentAuthorization> {
        self.authorization.as_ref()
    }

    /// Returns the command or fails if no earlier stage produced it.
    pub fn require_command(&self, stage: &str) -> Result<&ValidatedCommand, BookingError> {
        self.command.as_ref().ok_or_else(|| {
            BookingError::Pipeline(format!(
                "stage '{stage}' requires a validated command from an earlier stage"
            ))
        })
    }

    pub fn record_command(&mut self, command: ValidatedCommand) -> Result<(), BookingError> {
        fill_once(&mut self.command, command, "validated command")
    }

    pub fn record_event(&mut self, event: EventInventory) -> Result<(), BookingError> {
        fill_once(&mut self.event, event, "event snapshot")
    }

    pub fn record_authorization(
        &mut self,
        authorization: PaymentAuthorization,
    ) -> Result<(), BookingError> {
        fill_once(&mut self.authorization, authorization, "payment authorization")
    }

    /// Finishes the context into the pipeline output.
    pub fn into_validated(self) -> Result<ValidatedBooking, BookingError> {
        let command = self.command.ok_or_else(|| {
            BookingError::Pipeline("no stage produced a validated command".to_string())
        })?;

        Ok(ValidatedBooking {
            command,
            event: self.event,
            authorization: self.authorization,
        })
    }
}

fn fill_once<T>(slot: &mut Option<T>, value: T, what: &str) -> Result<(), BookingError> {
    if slot.is_some() {
        return Err(BookingError::Pipeline(format!("{what} already recorded")));
    }
    *slot = Some(value);
    Ok(())
}

/// Output of a successful pipeline run.
#[derive(Debug, Clone)]
pub struct ValidatedBooking {
    pub command: ValidatedCommand,
    /// Snapshot from the precondition check. Not authoritative.
    pub event: Option<EventInventory>,
    pub authorization: Option<PaymentAuthorization>,
}

/// Runs stages in order, stopping at the first failure.
#[derive(Default)]
pub struct ValidationPipeline {
    stages: Vec<Box<dyn ValidationStage>>,
}

impl ValidationPipeline {
    /// Creates an empty pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard chain: data validation, inventory precondition, payment
    /// authorization.
    pub fn standard<I, P>(inventory: I, payment: P) -> Self
    where
        I: InventoryStore + 'static,
        P: PaymentGateway + 'static,
    {
        Self::new()
            .with_stage(DataValidation)
            .with_stage(InventoryPrecondition::new(inventory))
            .with_stage(PaymentAuthorizationCheck::new(payment))
    }

    /// Appends a stage to the end of the chain.
    pub fn with_stage(mut self, stage: impl ValidationStage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Names of the stages, in execution order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Validates a request.
    #[tracing::instrument(skip_all)]
    pub async fn run(
        &self,
        request: ReservationRequest,
    ) -> Result<ValidatedBooking, BookingError> {
        let mut ctx = BookingContext::new(request);

        for stage in &self.stages {
            if let Err(error) = stage.check(&mut ctx).await {
                metrics::counter!("booking_pipeline_rejections_total", "stage" => stage.name())
                    .increment(1);
                tracing::info!(
                    stage = stage.name(),
                    kind = error.kind(),
                    %error,
                    "request rejected"
                );
                return Err(error);
            }
            tracing::debug!(stage = stage.name(), "stage passed");
        }

        ctx.into_validated()
    }
}
