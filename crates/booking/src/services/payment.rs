//! Payment gateway trait and in-memory implementation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use common::{Money, PaymentMethod};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::config::PaymentConfig;
use crate::error::BookingError;

/// Result of a payment authorization. No money moves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentAuthorization {
    /// The method that was checked.
    pub method: PaymentMethod,
    /// Whether the gateway will accept captures for this method.
    pub authorized: bool,
}

/// Result of a payment capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentCapture {
    /// The payment reference assigned by the gateway.
    pub reference: String,
    /// Whether the gateway confirmed the transaction.
    pub confirmed: bool,
    /// The amount captured.
    pub amount: Money,
}

/// Trait for payment processing operations.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Checks that a payment method is supported and allowed by policy.
    async fn authorize(&self, method: &PaymentMethod)
    -> Result<PaymentAuthorization, BookingError>;

    /// Commits a payment of `amount` with the given method.
    async fn capture(
        &self,
        method: &PaymentMethod,
        amount: Money,
    ) -> Result<PaymentCapture, BookingError>;
}

#[derive(Debug, Default)]
struct InMemoryPaymentState {
    captures: Vec<PaymentCapture>,
    next_id: u32,
}

/// In-memory payment gateway simulating an immediate-confirmation processor.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentGateway {
    config: Arc<PaymentConfig>,
    state: Arc<RwLock<InMemoryPaymentState>>,
    unconfirmed_captures: Arc<AtomicBool>,
    fail_on_capture: Arc<AtomicBool>,
    capture_delay_ms: Arc<AtomicU64>,
    authorize_calls: Arc<AtomicUsize>,
    capture_calls: Arc<AtomicUsize>,
}

impl InMemoryPaymentGateway {
    /// Creates a gateway with the default payment policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a gateway with a custom payment policy.
    pub fn with_config(config: PaymentConfig) -> Self {
        Self {
            config: Arc::new(config),
            ..Self::default()
        }
    }

    /// Makes captures return `confirmed: false` instead of failing.
    pub fn set_confirm_captures(&self, confirm: bool) {
        self.unconfirmed_captures.store(!confirm, Ordering::SeqCst);
    }

    /// Makes captures fail as if the processor were unreachable.
    pub fn set_fail_on_capture(&self, fail: bool) {
        self.fail_on_capture.store(fail, Ordering::SeqCst);
    }

    /// Delays every capture, simulating a slow processor.
    pub fn set_capture_delay(&self, delay: Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.capture_delay_ms.store(millis, Ordering::SeqCst);
    }

    /// Number of `authorize` calls received.
    pub fn authorize_calls(&self) -> usize {
        self.authorize_calls.load(Ordering::SeqCst)
    }

    /// Number of `capture` calls received.
    pub fn capture_calls(&self) -> usize {
        self.capture_calls.load(Ordering::SeqCst)
    }

    /// Returns the number of confirmed captures.
    pub async fn capture_count(&self) -> usize {
        self.state.read().await.captures.len()
    }

    /// Returns the sum of all confirmed captures.
    pub async fn captured_total(&self) -> Money {
        self.state
            .read()
            .await
            .captures
            .iter()
            .fold(Money::zero(), |total, c| total + c.amount)
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    async fn authorize(
        &self,
        method: &PaymentMethod,
    ) -> Result<PaymentAuthorization, BookingError> {
        self.authorize_calls.fetch_add(1, Ordering::SeqCst);

        if !self.config.accepts(method.as_str()) {
            return Err(BookingError::payment("payment method is not supported"));
        }
        if self.config.declines(method.as_str()) {
            return Err(BookingError::payment(
                "payment method was declined by the gateway",
            ));
        }

        Ok(PaymentAuthorization {
            method: method.clone(),
            authorized: true,
        })
    }

    async fn capture(
        &self,
        method: &PaymentMethod,
        amount: Money,
    ) -> Result<PaymentCapture, BookingError> {
        self.capture_calls.fetch_add(1, Ordering::SeqCst);

        let delay = self.capture_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        if self.fail_on_capture.load(Ordering::SeqCst) {
            return Err(BookingError::Transport(
                "payment processor unreachable".to_string(),
            ));
        }
        if self.config.declines(method.as_str()) {
            return Err(BookingError::payment("payment was declined by the gateway"));
        }

        let mut state = self.state.write().await;
        state.next_id += 1;
        let capture = PaymentCapture {
            reference: format!("PAY-{:04}", state.next_id),
            confirmed: !self.unconfirmed_captures.load(Ordering::SeqCst),
            amount,
        };
        if capture.confirmed {
            state.captures.push(capture.clone());
        }

        Ok(capture)
    }
}
