//! Proxy configuration loading and types.

use anyhow::{bail, Context, Result};
use metar_common::{ErrorPolicy, QueryDefaults};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Runtime configuration for the METAR proxy.
///
/// Loaded once at startup from an optional YAML file, then overridden by
/// `METAR_*` environment variables. Read-only afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Base URL of the upstream METAR endpoint.
    #[serde(default = "default_upstream_url")]
    pub upstream_url: String,

    /// Upper bound on a single upstream call, in seconds.
    #[serde(default = "default_upstream_timeout_secs")]
    pub upstream_timeout_secs: u64,

    /// Time-to-live of cached station responses, in seconds.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Maximum number of cached station responses.
    #[serde(default = "default_cache_max_entries")]
    pub cache_max_entries: usize,

    /// Format sent upstream when the client gives none.
    #[serde(default = "default_format")]
    pub default_format: String,

    /// Lookback window sent upstream when the client gives none.
    #[serde(default = "default_hours")]
    pub default_hours: String,

    /// How upstream failures are reported.
    #[serde(default)]
    pub error_policy: ErrorPolicy,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            upstream_url: default_upstream_url(),
            upstream_timeout_secs: default_upstream_timeout_secs(),
            cache_ttl_secs: default_cache_ttl_secs(),
            cache_max_entries: default_cache_max_entries(),
            default_format: default_format(),
            default_hours: default_hours(),
            error_policy: ErrorPolicy::default(),
        }
    }
}

fn default_upstream_url() -> String {
    "https://aviationweather.gov/api/data/metar".to_string()
}
fn default_upstream_timeout_secs() -> u64 {
    10
}
fn default_cache_ttl_secs() -> u64 {
    600 // 10 minutes
}
fn default_cache_max_entries() -> usize {
    1000
}
fn default_format() -> String {
    "json".to_string()
}
fn default_hours() -> String {
    "2".to_string()
}

impl ProxyConfig {
    /// Load configuration from an optional YAML file plus process environment.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a YAML configuration file. Missing keys take their defaults.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {:?}", path))?;
        let config: ProxyConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {:?}", path))?;

        tracing::info!(path = ?path, "Loaded proxy configuration");
        Ok(config)
    }

    /// Apply `METAR_*` overrides from `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("METAR_UPSTREAM_URL") {
            self.upstream_url = url;
        }
        if let Some(v) = lookup("METAR_UPSTREAM_TIMEOUT_SECS") {
            self.upstream_timeout_secs = v
                .parse()
                .with_context(|| format!("Invalid METAR_UPSTREAM_TIMEOUT_SECS: {}", v))?;
        }
        if let Some(v) = lookup("METAR_CACHE_TTL_SECS") {
            self.cache_ttl_secs = v
                .parse()
                .with_context(|| format!("Invalid METAR_CACHE_TTL_SECS: {}", v))?;
        }
        if let Some(v) = lookup("METAR_CACHE_MAX_ENTRIES") {
            self.cache_max_entries = v
                .parse()
                .with_context(|| format!("Invalid METAR_CACHE_MAX_ENTRIES: {}", v))?;
        }
        if let Some(format) = lookup("METAR_DEFAULT_FORMAT") {
            self.default_format = format;
        }
        if let Some(hours) = lookup("METAR_DEFAULT_HOURS") {
            self.default_hours = hours;
        }
        if let Some(policy) = lookup("METAR_ERROR_POLICY") {
            self.error_policy = policy.parse()?;
        }
        Ok(())
    }

    /// Reject configurations the proxy cannot run with.
    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.upstream_url)
            .with_context(|| format!("Invalid upstream URL: {}", self.upstream_url))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            bail!("Upstream URL must be http or https: {}", self.upstream_url);
        }
        if self.upstream_timeout_secs == 0 {
            bail!("upstream_timeout_secs must be greater than zero");
        }
        if self.cache_max_entries == 0 {
            bail!("cache_max_entries must be greater than zero");
        }
        if self.default_format.is_empty() || self.default_hours.is_empty() {
            bail!("default_format and default_hours must not be empty");
        }
        Ok(())
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn query_defaults(&self) -> QueryDefaults {
        QueryDefaults {
            format: self.default_format.clone(),
            hours: self.default_hours.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = ProxyConfig::default();
        assert_eq!(config.cache_ttl(), Duration::from_secs(600));
        assert_eq!(config.cache_max_entries, 1000);
        assert_eq!(config.query_defaults(), QueryDefaults::default());
        assert_eq!(config.error_policy, ErrorPolicy::Detailed);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_yaml_parsing() {
        let yaml = r#"
upstream_url: "http://localhost:9000/metar"
cache_ttl_secs: 60
default_format: csv
default_hours: "4"
error_policy: generic
"#;

        let config: ProxyConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.upstream_url, "http://localhost:9000/metar");
        assert_eq!(config.cache_ttl_secs, 60);
        assert_eq!(config.cache_max_entries, 1000);
        assert_eq!(config.default_format, "csv");
        assert_eq!(config.default_hours, "4");
        assert_eq!(config.error_policy, ErrorPolicy::Generic);
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "upstream_timeout_secs: 3").unwrap();

        let config = ProxyConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(config.upstream_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_bundled_config_matches_defaults() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../config/metar-proxy.yaml");
        let config = ProxyConfig::from_yaml_file(path).unwrap();
        let defaults = ProxyConfig::default();

        assert_eq!(config.upstream_url, defaults.upstream_url);
        assert_eq!(config.cache_ttl_secs, defaults.cache_ttl_secs);
        assert_eq!(config.cache_max_entries, defaults.cache_max_entries);
        assert_eq!(config.query_defaults(), defaults.query_defaults());
        assert_eq!(config.error_policy, defaults.error_policy);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(ProxyConfig::from_yaml_file("/nonexistent/metar-proxy.yaml").is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("METAR_UPSTREAM_URL", "http://127.0.0.1:8081/metar"),
            ("METAR_CACHE_MAX_ENTRIES", "5"),
            ("METAR_ERROR_POLICY", "generic"),
        ]
        .into_iter()
        .collect();

        let mut config = ProxyConfig::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.upstream_url, "http://127.0.0.1:8081/metar");
        assert_eq!(config.cache_max_entries, 5);
        assert_eq!(config.error_policy, ErrorPolicy::Generic);
        assert_eq!(config.cache_ttl_secs, 600);
    }

    #[test]
    fn test_invalid_env_override() {
        let mut config = ProxyConfig::default();
        let result = config.apply_overrides(|key| {
            (key == "METAR_CACHE_TTL_SECS").then(|| "ten".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = ProxyConfig {
            upstream_url: "ftp://example.com/metar".to_string(),
            ..ProxyConfig::default()
        };
        assert!(config.validate().is_err());

        let config = ProxyConfig {
            upstream_url: "not a url".to_string(),
            ..ProxyConfig::default()
        };
        assert!(config.validate().is_err());

        let config = ProxyConfig {
            cache_max_entries: 0,
            ..ProxyConfig::default()
        };
        assert!(config.validate().is_err());

        let config = ProxyConfig {
            upstream_timeout_secs: 0,
            ..ProxyConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
