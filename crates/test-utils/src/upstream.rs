//! Mock METAR upstream built on `wiremock`.

use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::METAR_PATH;

/// A local HTTP server standing in for the METAR data API.
pub struct MockUpstream {
    server: MockServer,
}

impl MockUpstream {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL to configure the proxy with.
    pub fn base_url(&self) -> String {
        format!("{}{}", self.server.uri(), METAR_PATH)
    }

    /// Answer every METAR request with `body`.
    pub async fn respond_with_body(&self, body: &str, content_type: &str) {
        Mock::given(method("GET"))
            .and(path(METAR_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, content_type))
            .mount(&self.server)
            .await;
    }

    /// Answer every METAR request with `body` after `delay`.
    pub async fn respond_with_delay(&self, body: &str, content_type: &str, delay: Duration) {
        Mock::given(method("GET"))
            .and(path(METAR_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(body, content_type)
                    .set_delay(delay),
            )
            .mount(&self.server)
            .await;
    }

    /// Answer every METAR request with an empty `status` response.
    pub async fn respond_with_status(&self, status: u16) {
        Mock::given(method("GET"))
            .and(path(METAR_PATH))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Drop all mounted responses and recorded requests.
    pub async fn reset(&self) {
        self.server.reset().await;
    }

    /// Number of requests the upstream has received.
    pub async fn request_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map(|requests| requests.len())
            .unwrap_or(0)
    }

    /// Path of the most recent request.
    pub async fn last_request_path(&self) -> Option<String> {
        self.server
            .received_requests()
            .await
            .and_then(|requests| requests.last().map(|r| r.url.path().to_string()))
    }

    /// Raw (still encoded) query string of the most recent request.
    pub async fn last_request_query(&self) -> Option<String> {
        self.server.received_requests().await.and_then(|requests| {
            requests
                .last()
                .and_then(|r| r.url.query().map(str::to_string))
        })
    }

    /// Value of `name` on the most recent request.
    pub async fn last_request_header(&self, name: &str) -> Option<String> {
        self.server.received_requests().await.and_then(|requests| {
            requests.last().and_then(|r| {
                r.headers
                    .get(name)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
            })
        })
    }
}
