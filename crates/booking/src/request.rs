//! Booking request and its validated form.

use common::{EventId, PaymentMethod, UserId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An untrusted booking request as received from a caller.
///
/// Fields are kept as raw JSON so that a wrongly typed field is reported by
/// the validation pipeline together with every other problem, instead of
/// failing deserialization on the first one. Missing fields are `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReservationRequest {
    #[serde(default)]
    pub user_id: Value,
    #[serde(default)]
    pub event_id: Value,
    /// Integer, integral float or numeric string.
    #[serde(default)]
    pub quantity: Value,
    #[serde(default)]
    pub payment_method: Value,
}

impl ReservationRequest {
    /// Creates a request from anything convertible to JSON values.
    pub fn new(
        user_id: impl Into<Value>,
        event_id: impl Into<Value>,
        quantity: impl Into<Value>,
        payment_method: impl Into<Value>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            event_id: event_id.into(),
            quantity: quantity.into(),
            payment_method: payment_method.into(),
        }
    }
}

/// A type-checked and normalized booking command.
///
/// Produced once by the validation pipeline and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedCommand {
    pub user_id: UserId,
    pub event_id: EventId,
    pub quantity: u32,
    pub payment_method: PaymentMethod,
}
