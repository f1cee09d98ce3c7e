//! Seat booking saga.
//!
//! Booking seats touches three resources that cannot share a transaction:
//! a reservation record, an event's seat inventory and a payment. This crate
//! provides:
//! 1. A validation pipeline that turns an untrusted [`ReservationRequest`]
//!    into a [`ValidatedCommand`].
//! 2. The [`ReservationSaga`], which creates a pending reservation, reserves
//!    seats, captures payment and confirms.
//!
//! If any step after the reservation is created fails, completed steps are
//! compensated (seats released, reservation cancelled) and the original
//! error is returned.

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod pipeline;
pub mod request;
pub mod seat_booking;
pub mod service;
pub mod services;
pub mod state;

pub use config::{PaymentConfig, SagaConfig};
pub use error::{BookingError, Result};
pub use orchestrator::{BookingOutcome, ReservationSaga};
pub use pipeline::{BookingContext, ValidatedBooking, ValidationPipeline, ValidationStage};
pub use request::{ReservationRequest, ValidatedCommand};
pub use service::BookingService;
pub use services::{InMemoryPaymentGateway, PaymentAuthorization, PaymentCapture, PaymentGateway};
pub use state::{SagaPhase, SagaState};
