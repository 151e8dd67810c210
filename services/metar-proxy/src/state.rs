//! Application state for the METAR proxy.

use anyhow::Result;
use std::sync::Arc;

use crate::config::ProxyConfig;
use crate::gateway::ForwardingGateway;
use crate::station_cache::StationCache;

/// Shared application state.
pub struct AppState {
    /// Startup configuration, read-only after construction.
    pub config: ProxyConfig,

    /// Cache-backed upstream gateway.
    pub gateway: ForwardingGateway,
}

impl AppState {
    /// Build state from a validated configuration.
    pub fn new(config: ProxyConfig) -> Result<Self> {
        let cache = Arc::new(StationCache::new(
            config.cache_max_entries,
            config.cache_ttl(),
        ));
        let gateway = ForwardingGateway::new(&config, cache)?;

        Ok(Self { config, gateway })
    }

    /// Load configuration (optional YAML file plus `METAR_*` env) and build state.
    pub fn from_env(config_path: Option<&str>) -> Result<Self> {
        Self::new(ProxyConfig::load(config_path)?)
    }
}
