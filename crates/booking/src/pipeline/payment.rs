//! Payment authorization check.

use async_trait::async_trait;

use super::{BookingContext, ValidationStage};
use crate::error::BookingError;
use crate::services::payment::PaymentGateway;

/// Asks the gateway whether the payment method can be used. No money moves.
pub struct PaymentAuthorizationCheck<P> {
    payment: P,
}

impl<P: PaymentGateway> PaymentAuthorizationCheck<P> {
    pub fn new(payment: P) -> Self {
        Self { payment }
    }
}

#[async_trait]
impl<P: PaymentGateway> ValidationStage for PaymentAuthorizationCheck<P> {
    fn name(&self) -> &'static str {
        "payment_authorization"
    }

    async fn check(&self, ctx: &mut BookingContext) -> Result<(), BookingError> {
        let method = ctx.require_command(self.name())?.payment_method.clone();

        let authorization = self.payment.authorize(&method).await?;
        if !authorization.authorized {
            return Err(BookingError::payment("payment was not authorized"));
        }

        ctx.record_authorization(authorization)
    }
}
