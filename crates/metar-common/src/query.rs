//! Station query parameters and upstream URL construction.
//!
//! A [`StationQuery`] mirrors the filters accepted by the METAR data API.
//! Every field is passed upstream as an opaque string; the only rewriting
//! applied is defaulting `format`/`hours` and the scope fallback, see
//! [`StationQuery::effective`].

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::{Deserialize, Serialize};

/// Station identifier meaning "top-priority stations", used when a query
/// names no ids, bbox or gbox.
pub const DEFAULT_SCOPE: &str = "@TOP";

/// Characters escaped inside a query parameter value. Separators that NOAA
/// expects verbatim (`,` `@` `:` `/`) are left alone.
const QUERY_VALUE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b'<')
    .add(b'=')
    .add(b'>')
    .add(b'`');

/// Optional filters for a METAR stations request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StationQuery {
    /// Response format (json, xml, csv, raw, ...).
    pub format: Option<String>,
    /// Lookback window in hours.
    pub hours: Option<String>,
    /// Comma separated station identifiers.
    pub ids: Option<String>,
    /// Bounding box `lat0,lon0,lat1,lon1`.
    pub bbox: Option<String>,
    /// Grid box.
    pub gbox: Option<String>,
    pub output: Option<String>,
    /// Include TAF alongside METAR.
    pub taf: Option<String>,
    pub order: Option<String>,
    /// Only the most recent report per station.
    pub latest: Option<String>,
    /// As-of date.
    pub date: Option<String>,
}

/// Deployment defaults applied to `format` and `hours`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryDefaults {
    pub format: String,
    pub hours: String,
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self {
            format: "json".to_string(),
            hours: "2".to_string(),
        }
    }
}

impl StationQuery {
    /// Build a query from raw `key=value` pairs.
    ///
    /// Unrecognized keys are ignored. A key given more than once has its
    /// values joined with `,`, so `ids=KJFK&ids=KLAX` becomes `ids=KJFK,KLAX`.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut query = StationQuery::default();
        for (key, value) in pairs {
            let slot = match key.as_ref() {
                "format" => &mut query.format,
                "hours" => &mut query.hours,
                "ids" => &mut query.ids,
                "bbox" => &mut query.bbox,
                "gbox" => &mut query.gbox,
                "output" => &mut query.output,
                "taf" => &mut query.taf,
                "order" => &mut query.order,
                "latest" => &mut query.latest,
                "date" => &mut query.date,
                _ => continue,
            };
            let value = value.into();
            match slot {
                Some(existing) => {
                    existing.push(',');
                    existing.push_str(&value);
                }
                None => *slot = Some(value),
            }
        }
        query
    }

    /// Whether the caller named any station scope.
    pub fn has_scope(&self) -> bool {
        self.ids.is_some() || self.bbox.is_some() || self.gbox.is_some()
    }

    /// The query as sent upstream.
    ///
    /// `format` and `hours` fall back to `defaults` when missing or empty,
    /// and `ids` becomes [`DEFAULT_SCOPE`] when no scope is given. All other
    /// fields are untouched. Applying this twice gives the same result.
    pub fn effective(&self, defaults: &QueryDefaults) -> StationQuery {
        let mut query = self.clone();

        if query.format.as_deref().map_or(true, str::is_empty) {
            query.format = Some(defaults.format.clone());
        }
        if query.hours.as_deref().map_or(true, str::is_empty) {
            query.hours = Some(defaults.hours.clone());
        }
        if !query.has_scope() {
            query.ids = Some(DEFAULT_SCOPE.to_string());
        }

        query
    }

    /// Supplied parameters in upstream order. Unset fields are skipped.
    pub fn pairs(&self) -> Vec<(&'static str, &str)> {
        [
            ("format", &self.format),
            ("hours", &self.hours),
            ("ids", &self.ids),
            ("bbox", &self.bbox),
            ("gbox", &self.gbox),
            ("output", &self.output),
            ("taf", &self.taf),
            ("order", &self.order),
            ("latest", &self.latest),
            ("date", &self.date),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.as_deref().map(|v| (key, v)))
        .collect()
    }

    /// Encoded query string for the supplied parameters, without a leading `?`.
    pub fn to_query_string(&self) -> String {
        self.pairs()
            .into_iter()
            .map(|(key, value)| format!("{}={}", key, utf8_percent_encode(value, QUERY_VALUE)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Cache key for this query after defaulting.
    ///
    /// Requests that only differ by omitting a defaulted value map to the
    /// same key.
    pub fn cache_key(&self, defaults: &QueryDefaults) -> String {
        self.effective(defaults).to_query_string()
    }
}

/// Build the upstream request URL for `params` against `base`.
pub fn build_upstream_url(base: &str, params: &StationQuery, defaults: &QueryDefaults) -> String {
    let query = params.effective(defaults).to_query_string();
    let separator = if base.contains('?') { '&' } else { '?' };
    format!("{}{}{}", base, separator, query)
}
