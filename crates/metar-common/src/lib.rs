//! Common types shared by the METAR proxy services.

pub mod error;
pub mod query;

pub use error::{ErrorPolicy, ProxyError, ProxyResult};
pub use query::{build_upstream_url, QueryDefaults, StationQuery, DEFAULT_SCOPE};
