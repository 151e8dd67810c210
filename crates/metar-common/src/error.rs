//! Error types for the METAR proxy.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using ProxyError.
pub type ProxyResult<T> = Result<T, ProxyError>;

/// Prefix of every error body returned to clients.
pub const ERROR_MESSAGE_PREFIX: &str = "Error fetching weather station data";

/// Primary error type for proxy operations.
#[derive(Debug, Error)]
pub enum ProxyError {
    // === Upstream Errors ===
    #[error("upstream request timed out")]
    Timeout,

    #[error("upstream transport error: {0}")]
    Transport(String),

    #[error("upstream returned {status}: {message}")]
    UpstreamStatus { status: u16, message: String },

    // === Startup Errors ===
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ProxyError {
    /// Short label used for metrics and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::Timeout => "timeout",
            ProxyError::Transport(_) => "transport",
            ProxyError::UpstreamStatus { .. } => "status",
            ProxyError::Config(_) => "config",
        }
    }

    /// HTTP status code returned to the client under the given policy.
    pub fn http_status_code(&self, policy: ErrorPolicy) -> u16 {
        match self {
            ProxyError::Config(_) => 500,
            _ => match policy {
                ErrorPolicy::Detailed => 502,
                ErrorPolicy::Generic => 500,
            },
        }
    }

    /// Body returned to the client under the given policy.
    pub fn client_message(&self, policy: ErrorPolicy) -> String {
        match policy {
            ErrorPolicy::Detailed => format!("{}: {}", ERROR_MESSAGE_PREFIX, self),
            ErrorPolicy::Generic => ERROR_MESSAGE_PREFIX.to_string(),
        }
    }
}

/// How upstream failures are reported to clients.
///
/// One policy is chosen per deployment and applied to every failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// 502 Bad Gateway with the failure message in the body.
    #[default]
    Detailed,
    /// 500 Internal Server Error with a fixed body.
    Generic,
}

impl FromStr for ErrorPolicy {
    type Err = ProxyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "detailed" | "502" => Ok(ErrorPolicy::Detailed),
            "generic" | "500" => Ok(ErrorPolicy::Generic),
            other => Err(ProxyError::Config(format!(
                "unknown error policy '{}', expected 'detailed' or 'generic'",
                other
            ))),
        }
    }
}
