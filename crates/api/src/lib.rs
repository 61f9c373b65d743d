//! HTTP API server for the inventory reservation service.
//!
//! Exposes order checkout and lifecycle endpoints, the inventory batch
//! entry points, and the product catalog, with structured logging
//! (tracing) and Prometheus metrics. Identity is injected by the
//! gateway as `x-user-*` headers; see [`auth`].

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use checkout::ReservationCoordinator;
use ledger::StockLedger;
use metrics_exporter_prometheus::PrometheusHandle;
use query::{OrderQueries, ProductQueries};
use store::{OrderStore, ProductStore};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Bound alias for anything that can back the service.
pub trait BackingStore: ProductStore + OrderStore + Clone + Send + Sync + 'static {}

impl<T> BackingStore for T where T: ProductStore + OrderStore + Clone + Send + Sync + 'static {}

/// Shared application state accessible from all handlers.
pub struct AppState<S: BackingStore> {
    pub coordinator: ReservationCoordinator<S>,
    pub ledger: StockLedger<S>,
    pub orders: OrderQueries<S>,
    pub products: ProductQueries<S>,
    pub store: S,
}

impl<S: BackingStore> AppState<S> {
    pub fn new(store: S) -> Self {
        Self {
            coordinator: ReservationCoordinator::new(store.clone()),
            ledger: StockLedger::new(store.clone()),
            orders: OrderQueries::new(store.clone()),
            products: ProductQueries::new(store.clone()),
            store,
        }
    }
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: BackingStore>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/orders", post(routes::orders::create::<S>))
        .route("/orders", get(routes::orders::list::<S>))
        .route("/orders/my-orders", get(routes::orders::my_orders::<S>))
        .route("/orders/admin/stats", get(routes::orders::stats::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route("/orders/{id}/status", put(routes::orders::update_status::<S>))
        .route(
            "/orders/{id}/payment",
            put(routes::orders::update_payment::<S>),
        )
        .route("/orders/{id}/cancel", post(routes::orders::cancel::<S>))
        .route("/inventory/check", post(routes::inventory::check::<S>))
        .route(
            "/inventory/process-order",
            post(routes::inventory::process_order::<S>),
        )
        .route(
            "/inventory/cancel-order",
            post(routes::inventory::cancel_order::<S>),
        )
        .route("/products", post(routes::products::create::<S>))
        .route("/products", get(routes::products::list::<S>))
        .route("/products/{id}", get(routes::products::get::<S>))
        .route("/products/{id}", put(routes::products::update::<S>))
        .route("/products/{id}", axum::routing::delete(routes::products::withdraw::<S>))
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
