//! HTTP API server for the seat booking saga.
//!
//! Exposes reservation booking and read endpoints, with structured logging
//! (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use booking::{BookingService, InMemoryPaymentGateway};
use metrics_exporter_prometheus::PrometheusHandle;
use store::{InventoryStore, ReservationStore};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;

/// Shared application state accessible from all handlers.
pub struct AppState<R, I>
where
    R: ReservationStore,
    I: InventoryStore,
{
    pub booking: BookingService<R, I, InMemoryPaymentGateway>,
    pub reservations: R,
    pub inventory: I,
}

/// Builds the booking service and read handles over one pair of stores.
pub fn create_state<R, I>(reservations: R, inventory: I, config: &Config) -> Arc<AppState<R, I>>
where
    R: ReservationStore + Clone,
    I: InventoryStore + Clone + 'static,
{
    let payment = InMemoryPaymentGateway::with_config(config.payment.clone());
    let booking = BookingService::new(
        reservations.clone(),
        inventory.clone(),
        payment,
        config.saga.clone(),
    );

    Arc::new(AppState {
        booking,
        reservations,
        inventory,
    })
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<R, I>(state: Arc<AppState<R, I>>, metrics_handle: PrometheusHandle) -> Router
where
    R: ReservationStore + 'static,
    I: InventoryStore + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/reservations", post(routes::reservations::create::<R, I>))
        .route("/reservations/{id}", get(routes::reservations::get::<R, I>))
        .route("/events/{id}", get(routes::events::get::<R, I>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
