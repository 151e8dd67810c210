//! METAR Proxy Service Library
//!
//! Forwards station queries to the NOAA aviation weather METAR API with
//! safe default parameters and a short-lived response cache.

pub mod config;
pub mod gateway;
pub mod handlers;
pub mod state;
pub mod station_cache;

use std::sync::Arc;

use axum::{
    routing::{delete, get},
    Extension, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

/// Route prefix of the weather endpoints.
pub const API_PREFIX: &str = "/api/weather";

/// Build the HTTP router. `/metrics` is only mounted when a Prometheus
/// handle is supplied.
pub fn build_router(state: Arc<AppState>, prometheus: Option<PrometheusHandle>) -> Router {
    let mut app = Router::new()
        // Weather endpoints
        .route(
            &format!("{}/stations", API_PREFIX),
            get(handlers::stations::stations_handler),
        )
        .route(
            &format!("{}/health", API_PREFIX),
            get(handlers::health::health_handler),
        )
        .route(
            &format!("{}/cache/stats", API_PREFIX),
            get(handlers::health::cache_stats_handler),
        )
        .route(
            &format!("{}/cache", API_PREFIX),
            delete(handlers::health::clear_cache_handler),
        )
        // Liveness for orchestrators
        .route("/health", get(handlers::health::health_handler));

    if let Some(handle) = prometheus {
        app = app
            .route("/metrics", get(handlers::health::metrics_handler))
            .layer(Extension(handle));
    }

    app.layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}
