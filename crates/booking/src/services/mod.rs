//! External service traits and in-memory implementations for saga steps.

pub mod payment;

pub use payment::{InMemoryPaymentGateway, PaymentAuthorization, PaymentCapture, PaymentGateway};
