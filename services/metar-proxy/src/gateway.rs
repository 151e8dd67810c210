//! Forwarding gateway: cache lookup, upstream fetch, failure mapping.
//!
//! Each call makes at most one upstream request. Failures are returned
//! as [`ProxyError`] and are neither retried nor cached. Two concurrent
//! misses on the same key both go upstream; the later `put` wins.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use metar_common::{build_upstream_url, ProxyError, ProxyResult, QueryDefaults, StationQuery};
use metrics::{counter, histogram};
use reqwest::{header, Client};
use tracing::{debug, info, instrument, warn};

use crate::config::ProxyConfig;
use crate::station_cache::{CachedBody, StationCache};

/// Media types the upstream may answer with.
pub const UPSTREAM_ACCEPT: &str = "application/json, application/xml, text/plain";

/// Whether a response came from the cache or a fresh upstream fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
        }
    }
}

/// Successful result of [`ForwardingGateway::fetch_stations`].
#[derive(Debug, Clone)]
pub struct StationsBody {
    pub body: String,
    pub content_type: String,
    pub cache_status: CacheStatus,
}

/// Content type assumed when the upstream sends none.
pub fn content_type_for_format(format: &str) -> &'static str {
    match format.to_ascii_lowercase().as_str() {
        "json" | "geojson" => "application/json",
        "xml" => "application/xml",
        _ => "text/plain",
    }
}

/// Proxies station queries to the upstream METAR API through the cache.
pub struct ForwardingGateway {
    client: Client,
    upstream_url: String,
    defaults: QueryDefaults,
    cache: Arc<StationCache>,
}

impl ForwardingGateway {
    pub fn new(config: &ProxyConfig, cache: Arc<StationCache>) -> Result<Self> {
        let timeout = config.upstream_timeout();
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(5)))
            .user_agent(concat!("metar-proxy/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        info!(
            upstream = %config.upstream_url,
            timeout_secs = timeout.as_secs(),
            "Forwarding gateway initialized"
        );

        Ok(Self {
            client,
            upstream_url: config.upstream_url.clone(),
            defaults: config.query_defaults(),
            cache,
        })
    }

    pub fn cache(&self) -> &StationCache {
        &self.cache
    }

    /// Upstream URL that `params` resolves to.
    pub fn upstream_url_for(&self, params: &StationQuery) -> String {
        build_upstream_url(&self.upstream_url, params, &self.defaults)
    }

    /// Serve `params` from the cache, or fetch and cache it on a miss.
    #[instrument(skip(self, params), fields(key = tracing::field::Empty))]
    pub async fn fetch_stations(&self, params: &StationQuery) -> ProxyResult<StationsBody> {
        let effective = params.effective(&self.defaults);
        let key = effective.to_query_string();
        tracing::Span::current().record("key", key.as_str());

        if let Some(cached) = self.cache.get(&key).await {
            counter!("metar_cache_hits_total").increment(1);
            debug!("Station cache hit");
            return Ok(StationsBody {
                body: cached.body,
                content_type: cached.content_type,
                cache_status: CacheStatus::Hit,
            });
        }
        counter!("metar_cache_misses_total").increment(1);

        let url = build_upstream_url(&self.upstream_url, &effective, &self.defaults);
        let format = effective
            .format
            .as_deref()
            .unwrap_or(self.defaults.format.as_str());

        let started = Instant::now();
        let result = self.fetch_upstream(&url, format).await;
        let outcome = if result.is_ok() { "ok" } else { "error" };
        histogram!("metar_upstream_duration_seconds", "outcome" => outcome)
            .record(started.elapsed().as_secs_f64());

        let fetched = match result {
            Ok(fetched) => fetched,
            Err(e) => {
                counter!("metar_upstream_errors_total", "kind" => e.kind()).increment(1);
                warn!(url = %url, error = %e, "Upstream fetch failed");
                return Err(e);
            }
        };

        self.cache.put(key, fetched.clone()).await;

        Ok(StationsBody {
            body: fetched.body,
            content_type: fetched.content_type,
            cache_status: CacheStatus::Miss,
        })
    }

    async fn fetch_upstream(&self, url: &str, format: &str) -> ProxyResult<CachedBody> {
        counter!("metar_upstream_requests_total").increment(1);
        let started = Instant::now();

        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, UPSTREAM_ACCEPT)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProxyError::UpstreamStatus {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| content_type_for_format(format).to_string());

        let body = response.text().await.map_err(map_reqwest_error)?;

        let elapsed = started.elapsed();
        info!(
            url = %url,
            status = status.as_u16(),
            bytes = body.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Fetched stations from upstream"
        );

        Ok(CachedBody { body, content_type })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ProxyError {
    if err.is_timeout() {
        ProxyError::Timeout
    } else {
        ProxyError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::fixtures::metar;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gateway_for(server: &MockServer, config: ProxyConfig) -> ForwardingGateway {
        let config = ProxyConfig {
            upstream_url: format!("{}/api/data/metar", server.uri()),
            ..config
        };
        let cache = Arc::new(StationCache::new(config.cache_max_entries, config.cache_ttl()));
        ForwardingGateway::new(&config, cache).unwrap()
    }

    #[test]
    fn test_content_type_for_format() {
        assert_eq!(content_type_for_format("json"), "application/json");
        assert_eq!(content_type_for_format("XML"), "application/xml");
        assert_eq!(content_type_for_format("csv"), "text/plain");
        assert_eq!(content_type_for_format("raw"), "text/plain");
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/data/metar"))
            .and(query_param("ids", "@TOP"))
            .and(|req: &wiremock::Request| {
                req.headers
                    .get("accept")
                    .and_then(|v| v.to_str().ok())
                    == Some(UPSTREAM_ACCEPT)
            })
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(metar::JSON_BODY, "application/json"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let gateway = gateway_for(&server, ProxyConfig::default());

        let first = gateway.fetch_stations(&StationQuery::default()).await.unwrap();
        assert_eq!(first.cache_status, CacheStatus::Miss);
        assert_eq!(first.body, metar::JSON_BODY);
        assert_eq!(first.content_type, "application/json");

        let second = gateway.fetch_stations(&StationQuery::default()).await.unwrap();
        assert_eq!(second.cache_status, CacheStatus::Hit);
        assert_eq!(second.body, first.body);
        assert_eq!(second.content_type, first.content_type);
    }

    #[tokio::test]
    async fn test_missing_content_type_uses_format() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(metar::XML_BODY))
            .mount(&server)
            .await;

        let gateway = gateway_for(&server, ProxyConfig::default());
        let params = StationQuery {
            format: Some("xml".to_string()),
            ..StationQuery::default()
        };

        let result = gateway.fetch_stations(&params).await.unwrap();
        assert_eq!(result.content_type, "application/xml");
    }

    #[tokio::test]
    async fn test_upstream_status_is_error_and_not_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(2)
            .mount(&server)
            .await;

        let gateway = gateway_for(&server, ProxyConfig::default());

        let err = gateway
            .fetch_stations(&StationQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ProxyError::UpstreamStatus { status: 503, .. }));
        assert!(gateway.cache().is_empty().await);

        // Second call goes upstream again.
        assert!(gateway.fetch_stations(&StationQuery::default()).await.is_err());
    }

    #[test]
    fn test_upstream_duration_recorded_for_failures() {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let server = rt.block_on(async {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(503))
                .mount(&server)
                .await;
            server
        });
        let gateway = gateway_for(&server, ProxyConfig::default());

        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let result = metrics::with_local_recorder(&recorder, || {
            rt.block_on(gateway.fetch_stations(&StationQuery::default()))
        });
        assert!(result.is_err());

        let rendered = handle.render();
        assert!(rendered.contains("metar_upstream_duration_seconds"));
        assert!(rendered.contains("outcome=\"error\""));
        assert!(rendered.contains("metar_upstream_errors_total"));
    }

    #[tokio::test]
    async fn test_timeout_maps_to_timeout_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(metar::JSON_BODY)
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let gateway = gateway_for(
            &server,
            ProxyConfig {
                upstream_timeout_secs: 1,
                ..ProxyConfig::default()
            },
        );

        let err = gateway
            .fetch_stations(&StationQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ProxyError::Timeout));
        assert!(gateway.cache().is_empty().await);
    }

    #[tokio::test]
    async fn test_transport_error() {
        let config = ProxyConfig {
            // Port 9 (discard) on localhost is not expected to accept connections.
            upstream_url: "http://127.0.0.1:9/metar".to_string(),
            ..ProxyConfig::default()
        };
        let cache = Arc::new(StationCache::new(10, config.cache_ttl()));
        let gateway = ForwardingGateway::new(&config, cache).unwrap();

        let err = gateway
            .fetch_stations(&StationQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ProxyError::Transport(_) | ProxyError::Timeout));
    }

    #[tokio::test]
    async fn test_upstream_url_for() {
        let server = MockServer::start().await;
        let gateway = gateway_for(&server, ProxyConfig::default());
        let params = StationQuery {
            ids: Some("KJFK,KLAX".to_string()),
            format: Some("xml".to_string()),
            ..StationQuery::default()
        };

        assert_eq!(
            gateway.upstream_url_for(&params),
            format!("{}/api/data/metar?format=xml&hours=2&ids=KJFK,KLAX", server.uri())
        );
    }
}
