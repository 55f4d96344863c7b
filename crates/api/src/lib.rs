//! HTTP API server for the storefront checkout core.
//!
//! Exposes the cart, catalog, checkout, order, and payment operations over
//! REST, with structured logging (tracing) and Prometheus metrics.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::{get, patch, post};
use axum::Router;
use checkout::CheckoutOrchestrator;
use commerce_store::CommerceStore;
use domain::{CartAggregator, Catalog, OrderAssembler, PaymentGate};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;

/// Shared application state accessible from all handlers.
pub struct AppState<S: CommerceStore> {
    pub catalog: Catalog<S>,
    pub carts: CartAggregator<S>,
    pub payments: PaymentGate<S>,
    pub orders: OrderAssembler<S>,
    pub checkout: CheckoutOrchestrator<S>,
    pub store: S,
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: CommerceStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
    config: &Config,
) -> Router {
    let cors = match config
        .cors_origin
        .as_deref()
        .and_then(|origin| origin.parse::<HeaderValue>().ok())
    {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(Any)
            .allow_headers(Any),
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    };

    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check::<S>))
        .route(
            "/cart",
            get(routes::cart::get_cart::<S>).post(routes::cart::add_item::<S>),
        )
        .route("/cart/checkout", post(routes::checkout::purchase_cart::<S>))
        .route(
            "/cart/{id}",
            patch(routes::cart::update_item::<S>).delete(routes::cart::remove_item::<S>),
        )
        .route("/category", post(routes::catalog::create_category::<S>))
        .route("/products", post(routes::catalog::create_product::<S>))
        .route("/products/{id}", get(routes::catalog::get_product::<S>))
        .route(
            "/products/{id}/checkout",
            post(routes::checkout::purchase_product::<S>),
        )
        .route("/order", get(routes::orders::list::<S>))
        .route("/order/{id}", get(routes::orders::get::<S>))
        .route("/order-item/{id}", get(routes::orders::get_item::<S>))
        .route("/payment", post(routes::payment::register::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Creates the shared state with every service wired over one store.
pub fn create_default_state<S: CommerceStore + Clone + 'static>(store: S) -> Arc<AppState<S>> {
    Arc::new(AppState {
        catalog: Catalog::new(store.clone()),
        carts: CartAggregator::new(store.clone()),
        payments: PaymentGate::new(store.clone()),
        orders: OrderAssembler::new(store.clone()),
        checkout: CheckoutOrchestrator::new(store.clone()),
        store,
    })
}
