//! HTTP API server for the bookstore catalog.
//!
//! Provides REST endpoints for books, audiobooks, users and orders, with
//! structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use catalog::Catalog;
use document_store::DocumentStore;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state accessible from all handlers.
pub struct AppState<S: DocumentStore> {
    pub catalog: Catalog<S>,
}

impl<S: DocumentStore + Clone> AppState<S> {
    /// Builds the catalog services over an already constructed store.
    pub fn new(store: S) -> Arc<Self> {
        Arc::new(Self {
            catalog: Catalog::new(store),
        })
    }
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: DocumentStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/", get(routes::index::welcome))
        .route("/health", get(routes::health::check))
        .route(
            "/books",
            get(routes::books::list::<S>).post(routes::books::create::<S>),
        )
        .route(
            "/books/{bookId}",
            get(routes::books::get::<S>)
                .put(routes::books::update::<S>)
                .delete(routes::books::delete::<S>),
        )
        .route(
            "/audio",
            get(routes::audio::list::<S>).post(routes::audio::create::<S>),
        )
        .route(
            "/audio/{audioId}",
            get(routes::audio::get::<S>)
                .put(routes::audio::update::<S>)
                .delete(routes::audio::delete::<S>),
        )
        .route(
            "/users",
            get(routes::users::list::<S>).post(routes::users::create::<S>),
        )
        .route(
            "/users/{userId}",
            get(routes::users::get::<S>)
                .put(routes::users::update::<S>)
                .delete(routes::users::delete::<S>),
        )
        .route("/users/{userId}/orders", get(routes::orders::by_user::<S>))
        .route(
            "/orders",
            get(routes::orders::list::<S>).post(routes::orders::create::<S>),
        )
        .route(
            "/orders/{orderId}",
            get(routes::orders::get::<S>)
                .put(routes::orders::update::<S>)
                .delete(routes::orders::delete::<S>),
        )
        .fallback(routes::index::not_found)
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
