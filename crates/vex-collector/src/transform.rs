//! Per-family transforms from raw payloads to flat samples.
//!
//! Every transform is a pure function of `(tenant, payload)`. Records
//! that fail to decode are logged and skipped; records that fall under a
//! family's cardinality filter are dropped silently.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use vex_core::{DecodeError, DecodeResult, MetricFamily, MetricName, RawObservation, Sample, Tenant};

use crate::record::{SeriesRecord, decode_availability, decode_series, parse_identity};

/// Application bandwidth rates below this many bits per second are dropped.
pub const APP_RATE_FLOOR_BPS: f64 = 100.0;

/// Application volumes below this many bytes are dropped.
pub const APP_VOLUME_FLOOR_BYTES: f64 = 1000.0;

static CONTROLLER_DESTINATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^CTLR-.+").expect("valid controller pattern"));

static GATEWAY_DESTINATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r".*[-_]cgw.*").expect("valid gateway pattern"));

/// Transform one tenant's payload for `family` into samples.
pub fn transform(family: MetricFamily, tenant: &Tenant, raw: &RawObservation) -> Vec<Sample> {
    match family {
        MetricFamily::SitesAvailability => sites_availability(tenant, raw),
        MetricFamily::ApplicationUsageRate => {
            series_samples(family, tenant, raw, application_rate_record)
        }
        MetricFamily::ApplicationUsageVolume => {
            series_samples(family, tenant, raw, application_volume_record)
        }
        MetricFamily::SiteCircuitBandwidth => {
            series_samples(family, tenant, raw, circuit_bandwidth_record)
        }
        MetricFamily::ApplianceCompute => series_samples(family, tenant, raw, appliance_record),
        MetricFamily::SiteSla => series_samples(family, tenant, raw, sla_record),
    }
}

/// Whether an SLA path towards `destination` is worth exporting:
/// controller nodes and cloud gateways only.
pub fn sla_destination_allowed(destination: &str) -> bool {
    CONTROLLER_DESTINATION.is_match(destination) || GATEWAY_DESTINATION.is_match(destination)
}

// ── Metric-kind tags ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Rx,
    Tx,
}

impl Direction {
    fn bandwidth(tag: &str) -> Option<Self> {
        match tag {
            "bw-rx" => Some(Direction::Rx),
            "bw-tx" => Some(Direction::Tx),
            _ => None,
        }
    }

    fn volume(tag: &str) -> Option<Self> {
        match tag {
            "volume-rx" => Some(Direction::Rx),
            "volume-tx" => Some(Direction::Tx),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ApplianceKind {
    CpuLoad,
    MemLoad,
    DiskLoad,
    SessLoad,
}

impl ApplianceKind {
    /// The query asks for upper-case tags, the reports answer in lower case.
    fn parse(tag: &str) -> Option<Self> {
        match tag.to_ascii_lowercase().as_str() {
            "cpuload" => Some(ApplianceKind::CpuLoad),
            "memload" => Some(ApplianceKind::MemLoad),
            "diskload" => Some(ApplianceKind::DiskLoad),
            "sessload" => Some(ApplianceKind::SessLoad),
            _ => None,
        }
    }

    fn metric(self) -> MetricName {
        match self {
            ApplianceKind::CpuLoad => MetricName::ApplianceCpuLoadPct,
            ApplianceKind::MemLoad => MetricName::ApplianceMemoryLoadPct,
            ApplianceKind::DiskLoad => MetricName::ApplianceDiskLoadPct,
            ApplianceKind::SessLoad => MetricName::ApplianceSessionsLoad,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlaKind {
    Delay,
    FwdDelayVar,
    RevDelayVar,
    FwdLossRatio,
    RevLossRatio,
}

impl SlaKind {
    fn parse(tag: &str) -> Option<Self> {
        match tag {
            "delay" => Some(SlaKind::Delay),
            "fwdDelayVar" => Some(SlaKind::FwdDelayVar),
            "revDelayVar" => Some(SlaKind::RevDelayVar),
            "fwdLossRatio" => Some(SlaKind::FwdLossRatio),
            "revLossRatio" => Some(SlaKind::RevLossRatio),
            _ => None,
        }
    }

    fn metric(self) -> MetricName {
        match self {
            SlaKind::Delay => MetricName::SiteSlamDelayMs,
            SlaKind::FwdDelayVar => MetricName::SiteSlamJitterFwdMs,
            SlaKind::RevDelayVar => MetricName::SiteSlamJitterRcvMs,
            SlaKind::FwdLossRatio => MetricName::SiteSlamLossFwdPct,
            SlaKind::RevLossRatio => MetricName::SiteSlamLossRcvPct,
        }
    }
}

// ── Drivers ────────────────────────────────────────────────────────

fn sites_availability(tenant: &Tenant, raw: &RawObservation) -> Vec<Sample> {
    let family = MetricFamily::SitesAvailability;
    let sites = match decode_availability(raw) {
        Ok(sites) => sites,
        Err(e) => {
            debug!(%family, %tenant, error = %e, "discarding undecodable response");
            return Vec::new();
        }
    };

    sites
        .into_iter()
        .filter_map(|site| {
            site.and_then(|s| {
                sample(
                    MetricName::SitesAvailabilityPercent,
                    s.mean,
                    [tenant.name(), s.site.as_str()],
                )
            })
            .map_err(|e| debug!(%family, %tenant, error = %e, "skipping site"))
            .ok()
        })
        .collect()
}

/// Decode a time-series payload and run `per_record` on every record.
///
/// `per_record` returns `Ok(None)` for records that carry no data, fall
/// under a filter, or have a kind the family does not export.
fn series_samples<F>(
    family: MetricFamily,
    tenant: &Tenant,
    raw: &RawObservation,
    per_record: F,
) -> Vec<Sample>
where
    F: Fn(&Tenant, &SeriesRecord) -> DecodeResult<Option<Sample>>,
{
    let records = match decode_series(raw) {
        Ok(records) => records,
        Err(e) => {
            debug!(%family, %tenant, error = %e, "discarding undecodable response");
            return Vec::new();
        }
    };

    records
        .into_iter()
        .filter_map(|record| {
            record
                .and_then(|r| per_record(tenant, &r))
                .unwrap_or_else(|e| {
                    debug!(%family, %tenant, error = %e, "skipping record");
                    None
                })
        })
        .collect()
}

fn sample<const N: usize>(
    metric: MetricName,
    value: f64,
    labels: [&str; N],
) -> DecodeResult<Sample> {
    Sample::new(metric, value, labels).ok_or(DecodeError::LabelArity(metric.as_str()))
}

fn unrecognized(family: MetricFamily, tenant: &Tenant, record: &SeriesRecord) -> Option<Sample> {
    debug!(%family, %tenant, tag = %record.metric, "dropping unrecognized metric kind");
    None
}

// ── Per-family record transforms ───────────────────────────────────

fn application_rate_record(tenant: &Tenant, record: &SeriesRecord) -> DecodeResult<Option<Sample>> {
    let Some(value) = record.first_value()? else {
        return Ok(None);
    };
    let [site, app, client_ip, circuit] = parse_identity::<4>(&record.name)?;

    if value < APP_RATE_FLOOR_BPS {
        return Ok(None);
    }

    let metric = match Direction::bandwidth(&record.metric) {
        Some(Direction::Rx) => MetricName::ApplicationUsageBandwidthRxBps,
        Some(Direction::Tx) => MetricName::ApplicationUsageBandwidthTxBps,
        None => return Ok(unrecognized(MetricFamily::ApplicationUsageRate, tenant, record)),
    };

    sample(metric, value, [tenant.name(), site, app, client_ip, circuit]).map(Some)
}

fn application_volume_record(
    tenant: &Tenant,
    record: &SeriesRecord,
) -> DecodeResult<Option<Sample>> {
    let Some(value) = record.first_value()? else {
        return Ok(None);
    };
    let [site, app, client_ip, circuit] = parse_identity::<4>(&record.name)?;

    if value < APP_VOLUME_FLOOR_BYTES {
        return Ok(None);
    }

    let metric = match Direction::volume(&record.metric) {
        Some(Direction::Rx) => MetricName::ApplicationUsageVolumeRxBytes,
        Some(Direction::Tx) => MetricName::ApplicationUsageVolumeTxBytes,
        None => return Ok(unrecognized(MetricFamily::ApplicationUsageVolume, tenant, record)),
    };

    sample(metric, value, [tenant.name(), site, app, client_ip, circuit]).map(Some)
}

fn circuit_bandwidth_record(
    tenant: &Tenant,
    record: &SeriesRecord,
) -> DecodeResult<Option<Sample>> {
    let Some(value) = record.first_value()? else {
        return Ok(None);
    };
    let [site, circuit] = parse_identity::<2>(&record.name)?;

    if value == 0.0 {
        return Ok(None);
    }

    let metric = match Direction::bandwidth(&record.metric) {
        Some(Direction::Rx) => MetricName::SiteCircuitUsageBandwidthRxBps,
        Some(Direction::Tx) => MetricName::SiteCircuitUsageBandwidthTxBps,
        None => return Ok(unrecognized(MetricFamily::SiteCircuitBandwidth, tenant, record)),
    };

    sample(metric, value, [tenant.name(), site, circuit]).map(Some)
}

fn appliance_record(tenant: &Tenant, record: &SeriesRecord) -> DecodeResult<Option<Sample>> {
    let Some(value) = record.first_value()? else {
        return Ok(None);
    };

    if value == 0.0 {
        return Ok(None);
    }

    let Some(kind) = ApplianceKind::parse(&record.metric) else {
        return Ok(unrecognized(MetricFamily::ApplianceCompute, tenant, record));
    };

    // Appliance reports are keyed by the bare site name.
    sample(kind.metric(), value, [tenant.name(), record.name.as_str()]).map(Some)
}

fn sla_record(tenant: &Tenant, record: &SeriesRecord) -> DecodeResult<Option<Sample>> {
    let [source_site, destination_site, source_circuit, destination_circuit] =
        parse_identity::<4>(&record.name)?;

    if !sla_destination_allowed(destination_site) {
        return Ok(None);
    }

    let Some(value) = record.first_value()? else {
        return Ok(None);
    };

    let Some(kind) = SlaKind::parse(&record.metric) else {
        return Ok(unrecognized(MetricFamily::SiteSla, tenant, record));
    };

    sample(
        kind.metric(),
        value,
        [
            tenant.name(),
            source_site,
            destination_site,
            source_circuit,
            destination_circuit,
        ],
    )
    .map(Some)
}
