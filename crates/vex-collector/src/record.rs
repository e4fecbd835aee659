//! Typed decoding of raw upstream payloads.
//!
//! Decoding is two-staged: the envelope of a response is validated
//! first, then every record is decoded on its own so one malformed
//! record only costs that record.

use serde::Deserialize;
use serde_json::{Map, Value};

use vex_core::{DecodeError, DecodeResult, RawObservation};

/// One series of a time-series report.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SeriesRecord {
    /// Composite identity, comma separated (`site,app,clientIp,circuit`).
    pub name: String,
    /// Metric-kind tag, e.g. `bw-rx` or `fwdLossRatio`.
    pub metric: String,
    /// `[[timestamp, value], ...]`.
    #[serde(default)]
    pub data: Vec<Vec<Value>>,
}

impl SeriesRecord {
    /// Value of the first time bucket, or `None` when the series is empty.
    pub fn first_value(&self) -> DecodeResult<Option<f64>> {
        let Some(bucket) = self.data.first() else {
            return Ok(None);
        };
        let value = bucket.get(1).ok_or_else(|| {
            DecodeError::Shape(format!("bucket of {:?} has no value column", self.name))
        })?;
        value
            .as_f64()
            .map(Some)
            .ok_or_else(|| DecodeError::NonNumeric(value.to_string()))
    }
}

/// Availability of one site from a stats report.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteAvailability {
    pub site: String,
    pub mean: f64,
}

#[derive(Deserialize)]
struct SeriesEnvelope {
    #[serde(default)]
    data: Option<Vec<Value>>,
}

#[derive(Deserialize)]
struct StatsEnvelope {
    #[serde(default)]
    stats: Option<Map<String, Value>>,
}

#[derive(Deserialize)]
struct SiteStats {
    mean: f64,
}

/// Decode a time-series report into per-record results.
///
/// A missing or null `data` array means the tenant has no series.
pub fn decode_series(raw: &RawObservation) -> DecodeResult<Vec<DecodeResult<SeriesRecord>>> {
    let envelope = SeriesEnvelope::deserialize(raw.as_value())
        .map_err(|e| DecodeError::Shape(e.to_string()))?;

    Ok(envelope
        .data
        .unwrap_or_default()
        .into_iter()
        .map(|record| {
            SeriesRecord::deserialize(&record).map_err(|e| DecodeError::Shape(e.to_string()))
        })
        .collect())
}

/// Decode a stats report's `site → {mean}` map into per-site results.
pub fn decode_availability(
    raw: &RawObservation,
) -> DecodeResult<Vec<DecodeResult<SiteAvailability>>> {
    let envelope = StatsEnvelope::deserialize(raw.as_value())
        .map_err(|e| DecodeError::Shape(e.to_string()))?;

    Ok(envelope
        .stats
        .unwrap_or_default()
        .into_iter()
        .map(|(site, stats)| {
            SiteStats::deserialize(&stats)
                .map(|s| SiteAvailability { site: site.clone(), mean: s.mean })
                .map_err(|e| DecodeError::Shape(format!("site {site:?}: {e}")))
        })
        .collect())
}

/// Split a composite identity into its first `N` positional tokens.
///
/// Fewer than `N` tokens is an error; trailing tokens are ignored.
pub fn parse_identity<const N: usize>(identity: &str) -> DecodeResult<[&str; N]> {
    let tokens: Vec<&str> = identity.split(',').collect();
    tokens
        .get(..N)
        .and_then(|head| <[&str; N]>::try_from(head).ok())
        .ok_or_else(|| DecodeError::TokenCount {
            identity: identity.to_string(),
            expected: N,
            found: tokens.len(),
        })
}
