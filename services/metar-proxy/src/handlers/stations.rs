//! Station query handler.

use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Response},
};
use metar_common::{ErrorPolicy, ProxyError, StationQuery};
use tracing::instrument;

use crate::state::AppState;

/// Response header reporting whether the body came from the cache.
pub const X_CACHE: HeaderName = HeaderName::from_static("x-cache");

/// GET /api/weather/stations
///
/// Accepts `format`, `hours`, `ids`, `bbox`, `gbox`, `output`, `taf`,
/// `order`, `latest` and `date`, all optional. Repeated keys are joined
/// with `,`. Unknown keys are ignored. Returns the upstream body
/// verbatim, or an error response shaped by the deployment's error policy.
#[instrument(skip(state))]
pub async fn stations_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let params = StationQuery::from_pairs(pairs);
    match state.gateway.fetch_stations(&params).await {
        Ok(stations) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, stations.content_type),
                (X_CACHE, stations.cache_status.as_str().to_string()),
            ],
            stations.body,
        )
            .into_response(),
        Err(e) => error_response(&e, state.config.error_policy),
    }
}

/// Render an upstream failure for the client.
pub fn error_response(err: &ProxyError, policy: ErrorPolicy) -> Response {
    let status =
        StatusCode::from_u16(err.http_status_code(policy)).unwrap_or(StatusCode::BAD_GATEWAY);
    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        err.client_message(policy),
    )
        .into_response()
}
