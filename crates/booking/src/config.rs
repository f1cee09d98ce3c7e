//! Saga and payment gateway settings.

use std::time::Duration;

use common::Money;

/// Settings for [`ReservationSaga`](crate::ReservationSaga).
#[derive(Debug, Clone)]
pub struct SagaConfig {
    /// Price of a single seat. The captured amount is `seat_price * quantity`.
    pub seat_price: Money,

    /// Upper bound for each collaborator call. `None` waits to completion.
    pub step_timeout: Option<Duration>,
}

impl Default for SagaConfig {
    fn default() -> Self {
        Self {
            seat_price: Money::from_dollars(1),
            step_timeout: None,
        }
    }
}

/// Policy for [`InMemoryPaymentGateway`](crate::InMemoryPaymentGateway).
///
/// Method comparisons are case-insensitive.
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    /// Methods the gateway knows about.
    pub accepted_methods: Vec<String>,

    /// Methods the gateway always declines.
    pub declined_methods: Vec<String>,
}

impl PaymentConfig {
    /// Returns true if the method is one the gateway supports.
    pub fn accepts(&self, method: &str) -> bool {
        contains_ignore_case(&self.accepted_methods, method)
    }

    /// Returns true if the method is flagged by policy.
    pub fn declines(&self, method: &str) -> bool {
        contains_ignore_case(&self.declined_methods, method)
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            accepted_methods: vec![
                "card".to_string(),
                "transfer".to_string(),
                "decline".to_string(),
                "insufficient-funds".to_string(),
            ],
            declined_methods: vec!["decline".to_string()],
        }
    }
}

fn contains_ignore_case(list: &[String], method: &str) -> bool {
    list.iter().any(|m| m.eq_ignore_ascii_case(method))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_seat_price_is_one_unit() {
        let config = SagaConfig::default();
        assert_eq!(config.seat_price.cents(), 100);
        assert!(config.step_timeout.is_none());
    }

    #[test]
    fn test_payment_policy_ignores_case() {
        let config = PaymentConfig::default();
        assert!(config.accepts("CARD"));
        assert!(config.accepts("Decline"));
        assert!(config.accepts("insufficient-funds"));
        assert!(!config.accepts("crypto"));
        assert!(config.declines("DECLINE"));
        assert!(!config.declines("card"));
    }
}
