//! Structural validation of the raw request.

use async_trait::async_trait;
use common::{EventId, PaymentMethod, UserId};
use serde_json::Value;

use super::{BookingContext, ValidationStage};
use crate::error::BookingError;
use crate::request::ValidatedCommand;

/// Checks every field of the request and records the normalized command.
///
/// Does not stop at the first bad field: all violations are reported in a
/// single `Validation` error.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataValidation;

#[async_trait]
impl ValidationStage for DataValidation {
    fn name(&self) -> &'static str {
        "data_validation"
    }

    async fn check(&self, ctx: &mut BookingContext) -> Result<(), BookingError> {
        let request = ctx.request();
        let mut errors = Vec::new();

        let user_id = non_empty_string(&request.user_id);
        if user_id.is_none() {
            errors.push("user_id is required and must be a non-empty string".to_string());
        }

        let event_id = request
            .event_id
            .as_str()
            .and_then(|raw| EventId::parse(raw).ok());
        if event_id.is_none() {
            errors.push(
                "event_id is required and must be a 24-character hexadecimal identifier"
                    .to_string(),
            );
        }

        let quantity = positive_integer(&request.quantity);
        if quantity.is_none() {
            errors.push(
                "quantity is required and must be an integer greater than zero".to_string(),
            );
        }

        let payment_method = non_empty_string(&request.payment_method);
        if payment_method.is_none() {
            errors.push("payment_method is required and must be a non-empty string".to_string());
        }

        match (user_id, event_id, quantity, payment_method) {
            (Some(user_id), Some(event_id), Some(quantity), Some(payment_method)) => {
                ctx.record_command(ValidatedCommand {
                    user_id: UserId::new(user_id),
                    event_id,
                    quantity,
                    payment_method: PaymentMethod::new(payment_method),
                })
            }
            _ => Err(BookingError::validation(errors)),
        }
    }
}

fn non_empty_string(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Accepts integers, integral floats and numeric strings in `1..=u32::MAX`.
fn positive_integer(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => match n.as_u64() {
            Some(int) => u32::try_from(int).ok().filter(|q| *q > 0),
            None => n.as_f64().and_then(integral_quantity),
        },
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok().and_then(integral_quantity)
        }
        _ => None,
    }
}

fn integral_quantity(value: f64) -> Option<u32> {
    if value.fract() == 0.0 && value >= 1.0 && value <= f64::from(u32::MAX) {
        Some(value as u32)
    } else {
        None
    }
}
