//! Per-family upstream query constants.
//!
//! The collector treats these as opaque; only the HTTP client turns
//! them into URL paths and query pairs.

use crate::types::MetricFamily;

/// Lookback window requested from the analytics backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportPrecision {
    /// 15 minute window.
    Long,
    /// 5 minute window.
    Medium,
    /// 1 minute window.
    Short,
}

impl ReportPrecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportPrecision::Long => "15minutesAgo",
            ReportPrecision::Medium => "5minutesAgo",
            ReportPrecision::Short => "1minutesAgo",
        }
    }
}

/// Analytics feature area a query is issued against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    Sdwan,
    System,
}

impl Feature {
    /// Path segment following `/features/`.
    pub fn path_segment(&self) -> &'static str {
        match self {
            Feature::Sdwan => "SDWAN/",
            Feature::System => "SYSTEM",
        }
    }
}

/// Shape of the upstream report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    Stats,
    Timeseries,
}

impl QueryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::Stats => "stats",
            QueryType::Timeseries => "timeseries",
        }
    }
}

/// Everything the backend needs to answer one family's query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    pub feature: Feature,
    pub precision: ReportPrecision,
    /// Whether to bound the window with `end-date=today`.
    pub end_today: bool,
    /// Composite grouping key, e.g. `linkUsage(site,accCkt)`.
    pub grouping: &'static str,
    pub query_type: QueryType,
    pub aggregate: bool,
    pub gap: Option<&'static str>,
    /// Requested metric-kind tags.
    pub metrics: &'static [&'static str],
    /// Row limit; `-1` means everything.
    pub count: i64,
}

impl QuerySpec {
    /// Render the query as ordered key/value pairs. Repeated `metrics`
    /// keys are intentional; the backend reads them as a list.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("start-date", self.precision.as_str().to_string())];
        if self.end_today {
            pairs.push(("end-date", "today".to_string()));
        }
        pairs.push(("q", self.grouping.to_string()));
        pairs.push(("qt", self.query_type.as_str().to_string()));
        if self.aggregate {
            pairs.push(("ds", "aggregate".to_string()));
        }
        if let Some(gap) = self.gap {
            pairs.push(("gap", gap.to_string()));
        }
        for metric in self.metrics {
            pairs.push(("metrics", metric.to_string()));
        }
        pairs.push(("count", self.count.to_string()));
        pairs
    }
}

const ONE_MINUTE: Option<&str> = Some("1MINUTE");

static SITES_AVAILABILITY: QuerySpec = QuerySpec {
    feature: Feature::Sdwan,
    precision: ReportPrecision::Medium,
    end_today: true,
    grouping: "site",
    query_type: QueryType::Stats,
    aggregate: false,
    gap: None,
    metrics: &["availability"],
    count: -1,
};

static APPLICATION_USAGE_RATE: QuerySpec = QuerySpec {
    feature: Feature::Sdwan,
    precision: ReportPrecision::Long,
    end_today: true,
    grouping: "appUser(site,appId,user,accCkt)",
    query_type: QueryType::Timeseries,
    aggregate: true,
    gap: ONE_MINUTE,
    metrics: &["bw-rx", "bw-tx"],
    count: 15000,
};

static APPLICATION_USAGE_VOLUME: QuerySpec = QuerySpec {
    feature: Feature::Sdwan,
    precision: ReportPrecision::Long,
    end_today: true,
    grouping: "appUser(site,appId,user,accCkt)",
    query_type: QueryType::Timeseries,
    aggregate: true,
    gap: ONE_MINUTE,
    metrics: &["volume-rx", "volume-tx"],
    count: 15000,
};

static SITE_CIRCUIT_BANDWIDTH: QuerySpec = QuerySpec {
    feature: Feature::Sdwan,
    precision: ReportPrecision::Medium,
    end_today: true,
    grouping: "linkUsage(site,accCkt)",
    query_type: QueryType::Timeseries,
    aggregate: true,
    gap: ONE_MINUTE,
    metrics: &["bw-rx", "bw-tx"],
    count: -1,
};

static APPLIANCE_COMPUTE: QuerySpec = QuerySpec {
    feature: Feature::System,
    precision: ReportPrecision::Long,
    end_today: false,
    grouping: "applMonitor",
    query_type: QueryType::Timeseries,
    aggregate: true,
    gap: ONE_MINUTE,
    metrics: &["CPULOAD", "MEMLOAD", "DISKLOAD", "SESSLOAD"],
    count: -1,
};

static SITE_SLA: QuerySpec = QuerySpec {
    feature: Feature::Sdwan,
    precision: ReportPrecision::Long,
    end_today: true,
    grouping: "slam(localSite,remoteSite,localAccCkt,remoteAccCkt)",
    query_type: QueryType::Timeseries,
    aggregate: true,
    gap: ONE_MINUTE,
    metrics: &[
        "fwdDelayVar",
        "revDelayVar",
        "delay",
        "fwdLossRatio",
        "revLossRatio",
    ],
    count: -1,
};

impl MetricFamily {
    /// The fixed upstream query for this family.
    pub fn query(&self) -> &'static QuerySpec {
        match self {
            MetricFamily::SitesAvailability => &SITES_AVAILABILITY,
            MetricFamily::ApplicationUsageRate => &APPLICATION_USAGE_RATE,
            MetricFamily::ApplicationUsageVolume => &APPLICATION_USAGE_VOLUME,
            MetricFamily::SiteCircuitBandwidth => &SITE_CIRCUIT_BANDWIDTH,
            MetricFamily::ApplianceCompute => &APPLIANCE_COMPUTE,
            MetricFamily::SiteSla => &SITE_SLA,
        }
    }
}
