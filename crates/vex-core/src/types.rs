//! Domain types shared by every stage of a scrape cycle.
//!
//! Tenants and raw observations only live for the duration of one cycle.
//! Samples are the unit handed to the exposition layer.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::descriptor::MetricName;

// ── Tenant ─────────────────────────────────────────────────────────

/// A customer partition in the analytics backend, discovered per cycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Tenant {
    pub name: String,
}

impl Tenant {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Tenant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

// ── Metric families ────────────────────────────────────────────────

/// One category of upstream query, each with its own response shape
/// and transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricFamily {
    SitesAvailability,
    ApplicationUsageRate,
    ApplicationUsageVolume,
    SiteCircuitBandwidth,
    ApplianceCompute,
    SiteSla,
}

impl MetricFamily {
    /// Every family, in the order the coordinator launches them.
    pub const ALL: [MetricFamily; 6] = [
        MetricFamily::SitesAvailability,
        MetricFamily::ApplicationUsageRate,
        MetricFamily::ApplicationUsageVolume,
        MetricFamily::SiteCircuitBandwidth,
        MetricFamily::ApplianceCompute,
        MetricFamily::SiteSla,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricFamily::SitesAvailability => "sites_availability",
            MetricFamily::ApplicationUsageRate => "application_usage_rate",
            MetricFamily::ApplicationUsageVolume => "application_usage_volume",
            MetricFamily::SiteCircuitBandwidth => "site_circuit_bandwidth",
            MetricFamily::ApplianceCompute => "appliance_compute",
            MetricFamily::SiteSla => "site_sla",
        }
    }

    /// Metric names this family may emit.
    pub fn metrics(&self) -> &'static [MetricName] {
        use MetricName::*;
        match self {
            MetricFamily::SitesAvailability => &[SitesAvailabilityPercent],
            MetricFamily::ApplicationUsageRate => {
                &[ApplicationUsageBandwidthRxBps, ApplicationUsageBandwidthTxBps]
            }
            MetricFamily::ApplicationUsageVolume => {
                &[ApplicationUsageVolumeRxBytes, ApplicationUsageVolumeTxBytes]
            }
            MetricFamily::SiteCircuitBandwidth => {
                &[SiteCircuitUsageBandwidthRxBps, SiteCircuitUsageBandwidthTxBps]
            }
            MetricFamily::ApplianceCompute => &[
                ApplianceCpuLoadPct,
                ApplianceMemoryLoadPct,
                ApplianceDiskLoadPct,
                ApplianceSessionsLoad,
            ],
            MetricFamily::SiteSla => &[
                SiteSlamDelayMs,
                SiteSlamJitterFwdMs,
                SiteSlamJitterRcvMs,
                SiteSlamLossFwdPct,
                SiteSlamLossRcvPct,
            ],
        }
    }
}

impl fmt::Display for MetricFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Raw observations ───────────────────────────────────────────────

/// An untransformed per-tenant response body for one family.
///
/// The upstream schema is loosely typed, so the payload stays as JSON
/// until the family's decode step turns it into typed records.
#[derive(Debug, Clone, PartialEq)]
pub struct RawObservation(serde_json::Value);

impl RawObservation {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    pub fn into_value(self) -> serde_json::Value {
        self.0
    }
}

impl From<serde_json::Value> for RawObservation {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

// ── Samples ────────────────────────────────────────────────────────

/// How a sample's value is interpreted by the monitoring system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Gauge,
    Counter,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Gauge => "gauge",
            ValueKind::Counter => "counter",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One label key/value pair. Keys always come from the metric descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Label {
    pub name: &'static str,
    pub value: String,
}

/// A flat labeled observation, immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    metric: MetricName,
    value: f64,
    labels: Vec<Label>,
}

impl Sample {
    /// Build a sample whose label keys are taken from the metric's
    /// declared schema, paired positionally with `values`.
    ///
    /// Returns `None` when the number of values does not match the
    /// schema's arity.
    pub fn new<I, S>(metric: MetricName, value: f64, values: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys = metric.desc().labels;
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        if values.len() != keys.len() {
            return None;
        }

        let labels = keys
            .iter()
            .zip(values)
            .map(|(name, value)| Label { name, value })
            .collect();

        Some(Self {
            metric,
            value,
            labels,
        })
    }

    pub fn metric(&self) -> MetricName {
        self.metric
    }

    /// Stable metric identifier, without any exposition namespace.
    pub fn name(&self) -> &'static str {
        self.metric.desc().name
    }

    pub fn kind(&self) -> ValueKind {
        self.metric.desc().kind
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Look up a label value by key.
    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|l| l.name == name)
            .map(|l| l.value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_pairs_values_with_schema_order() {
        let sample = Sample::new(
            MetricName::SiteCircuitUsageBandwidthRxBps,
            512.0,
            ["acme", "NYC", "MPLS"],
        )
        .unwrap();

        let keys: Vec<&str> = sample.labels().iter().map(|l| l.name).collect();
        assert_eq!(keys, vec!["tenant", "site", "circuit"]);
        assert_eq!(sample.label("circuit"), Some("MPLS"));
        assert_eq!(sample.kind(), ValueKind::Gauge);
        assert_eq!(sample.name(), "site_circuit_usage_bandwidth_rx_bps");
    }

    #[test]
    fn sample_rejects_wrong_arity() {
        assert!(Sample::new(MetricName::SitesAvailabilityPercent, 1.0, ["acme"]).is_none());
        assert!(
            Sample::new(MetricName::SitesAvailabilityPercent, 1.0, ["a", "b", "c"]).is_none()
        );
    }

    #[test]
    fn every_family_metric_belongs_to_that_family_only() {
        let mut seen = std::collections::HashSet::new();
        for family in MetricFamily::ALL {
            for metric in family.metrics() {
                assert!(seen.insert(*metric), "{metric:?} declared twice");
            }
        }
        assert_eq!(seen.len(), MetricName::ALL.len());
    }

    #[test]
    fn tenant_deserializes_from_upstream_shape() {
        let tenants: Vec<Tenant> =
            serde_json::from_str(r#"[{"name":"acme"},{"name":"beta","extra":1}]"#).unwrap();
        assert_eq!(tenants, vec![Tenant::new("acme"), Tenant::new("beta")]);
    }
}
