//! Booking error types.

use std::time::Duration;

use store::StoreError;
use thiserror::Error;

/// Errors that can occur while validating or executing a booking.
///
/// `Validation` is only ever raised before any collaborator is touched.
/// Every other variant raised after the reservation is created drives
/// compensation before it reaches the caller.
#[derive(Debug, Error)]
pub enum BookingError {
    /// The request is malformed. `details` lists every violation found.
    #[error("{message}")]
    Validation {
        message: String,
        details: Vec<String>,
    },

    /// The event is missing or does not have enough seats.
    #[error("{0}")]
    Inventory(String),

    /// The payment method is unsupported or declined, or capture was not confirmed.
    #[error("{0}")]
    Payment(String),

    /// A store collaborator failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A collaborator could not be reached.
    #[error("Collaborator error: {0}")]
    Transport(String),

    /// A collaborator call exceeded the configured step timeout.
    #[error("Step '{step}' timed out after {timeout:?}")]
    Timeout {
        step: &'static str,
        timeout: Duration,
    },

    /// The validation pipeline is wired incorrectly.
    #[error("Validation pipeline misconfigured: {0}")]
    Pipeline(String),
}

impl BookingError {
    /// Builds a validation error from the collected violations.
    pub fn validation(details: Vec<String>) -> Self {
        BookingError::Validation {
            message: "The request contains invalid data".to_string(),
            details,
        }
    }

    /// Builds an inventory error.
    pub fn inventory(message: impl Into<String>) -> Self {
        BookingError::Inventory(message.into())
    }

    /// Builds a payment error.
    pub fn payment(message: impl Into<String>) -> Self {
        BookingError::Payment(message.into())
    }

    /// Stable label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            BookingError::Validation { .. } => "validation",
            BookingError::Inventory(_) => "inventory",
            BookingError::Payment(_) => "payment",
            BookingError::Store(_) => "store",
            BookingError::Transport(_) => "transport",
            BookingError::Timeout { .. } => "timeout",
            BookingError::Pipeline(_) => "pipeline",
        }
    }

    /// Violations carried by a validation error, empty otherwise.
    pub fn details(&self) -> &[String] {
        match self {
            BookingError::Validation { details, .. } => details,
            _ => &[],
        }
    }
}

/// Convenience type alias for booking results.
pub type Result<T> = std::result::Result<T, BookingError>;
