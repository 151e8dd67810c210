//! Health, cache management and metrics handlers.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use metrics_exporter_prometheus::PrometheusHandle;

use crate::state::AppState;
use crate::station_cache::StationCacheSnapshot;

/// Fixed liveness body.
pub const HEALTH_MESSAGE: &str = "Weather API is running";

/// GET /api/weather/health, GET /health - liveness check, no upstream involved
pub async fn health_handler() -> &'static str {
    HEALTH_MESSAGE
}

/// GET /api/weather/cache/stats - station cache counters
pub async fn cache_stats_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Json<StationCacheSnapshot> {
    Json(state.gateway.cache().snapshot().await)
}

/// DELETE /api/weather/cache - drop every cached station response
pub async fn clear_cache_handler(Extension(state): Extension<Arc<AppState>>) -> StatusCode {
    state.gateway.cache().clear().await;
    StatusCode::NO_CONTENT
}

/// GET /metrics - Prometheus metrics
pub async fn metrics_handler(Extension(handle): Extension<PrometheusHandle>) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        handle.render(),
    )
        .into_response()
}
