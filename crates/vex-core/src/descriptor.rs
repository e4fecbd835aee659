//! Declared metric descriptors.
//!
//! The names and label schemas below are the exporter's external
//! contract. Label order is significant and fixed per metric.

use std::fmt;

use serde::Serialize;

use crate::types::ValueKind;

/// Static description of one exported metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricDesc {
    pub name: &'static str,
    pub help: &'static str,
    pub labels: &'static [&'static str],
    pub kind: ValueKind,
}

const SITE_LABELS: &[&str] = &["tenant", "site"];
const APP_LABELS: &[&str] = &["tenant", "site", "app_name", "client_ip", "circuit"];
const CIRCUIT_LABELS: &[&str] = &["tenant", "site", "circuit"];
const SLA_LABELS: &[&str] = &[
    "tenant",
    "source_site",
    "destination_site",
    "source_circuit",
    "destination_circuit",
];

/// Every metric the exporter may publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(into = "&'static str")]
pub enum MetricName {
    SitesAvailabilityPercent,
    ApplicationUsageBandwidthRxBps,
    ApplicationUsageBandwidthTxBps,
    ApplicationUsageVolumeRxBytes,
    ApplicationUsageVolumeTxBytes,
    SiteCircuitUsageBandwidthRxBps,
    SiteCircuitUsageBandwidthTxBps,
    ApplianceCpuLoadPct,
    ApplianceMemoryLoadPct,
    ApplianceDiskLoadPct,
    ApplianceSessionsLoad,
    SiteSlamDelayMs,
    SiteSlamJitterFwdMs,
    SiteSlamJitterRcvMs,
    SiteSlamLossFwdPct,
    SiteSlamLossRcvPct,
}

impl MetricName {
    /// Declaration order, which is also the exposition order.
    pub const ALL: [MetricName; 16] = [
        MetricName::SitesAvailabilityPercent,
        MetricName::ApplicationUsageBandwidthRxBps,
        MetricName::ApplicationUsageBandwidthTxBps,
        MetricName::ApplicationUsageVolumeRxBytes,
        MetricName::ApplicationUsageVolumeTxBytes,
        MetricName::SiteCircuitUsageBandwidthRxBps,
        MetricName::SiteCircuitUsageBandwidthTxBps,
        MetricName::ApplianceCpuLoadPct,
        MetricName::ApplianceMemoryLoadPct,
        MetricName::ApplianceDiskLoadPct,
        MetricName::ApplianceSessionsLoad,
        MetricName::SiteSlamDelayMs,
        MetricName::SiteSlamJitterFwdMs,
        MetricName::SiteSlamJitterRcvMs,
        MetricName::SiteSlamLossFwdPct,
        MetricName::SiteSlamLossRcvPct,
    ];

    pub fn desc(&self) -> &'static MetricDesc {
        match self {
            MetricName::SitesAvailabilityPercent => &SITES_AVAILABILITY_PERCENT,
            MetricName::ApplicationUsageBandwidthRxBps => &APP_BANDWIDTH_RX,
            MetricName::ApplicationUsageBandwidthTxBps => &APP_BANDWIDTH_TX,
            MetricName::ApplicationUsageVolumeRxBytes => &APP_VOLUME_RX,
            MetricName::ApplicationUsageVolumeTxBytes => &APP_VOLUME_TX,
            MetricName::SiteCircuitUsageBandwidthRxBps => &CIRCUIT_BANDWIDTH_RX,
            MetricName::SiteCircuitUsageBandwidthTxBps => &CIRCUIT_BANDWIDTH_TX,
            MetricName::ApplianceCpuLoadPct => &APPLIANCE_CPU,
            MetricName::ApplianceMemoryLoadPct => &APPLIANCE_MEMORY,
            MetricName::ApplianceDiskLoadPct => &APPLIANCE_DISK,
            MetricName::ApplianceSessionsLoad => &APPLIANCE_SESSIONS,
            MetricName::SiteSlamDelayMs => &SLA_DELAY,
            MetricName::SiteSlamJitterFwdMs => &SLA_JITTER_FWD,
            MetricName::SiteSlamJitterRcvMs => &SLA_JITTER_RCV,
            MetricName::SiteSlamLossFwdPct => &SLA_LOSS_FWD,
            MetricName::SiteSlamLossRcvPct => &SLA_LOSS_RCV,
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.desc().name
    }
}

impl From<MetricName> for &'static str {
    fn from(metric: MetricName) -> Self {
        metric.as_str()
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static SITES_AVAILABILITY_PERCENT: MetricDesc = MetricDesc {
    name: "sites_availability_percent",
    help: "The availability percentage for the particular site",
    labels: SITE_LABELS,
    kind: ValueKind::Gauge,
};

static APP_BANDWIDTH_RX: MetricDesc = MetricDesc {
    name: "application_usage_bandwidth_rx_bps",
    help: "The application RX bandwidth usage rate in bits per second",
    labels: APP_LABELS,
    kind: ValueKind::Gauge,
};

static APP_BANDWIDTH_TX: MetricDesc = MetricDesc {
    name: "application_usage_bandwidth_tx_bps",
    help: "The application TX bandwidth usage rate in bits per second",
    labels: APP_LABELS,
    kind: ValueKind::Gauge,
};

static APP_VOLUME_RX: MetricDesc = MetricDesc {
    name: "application_usage_volume_rx_bytes",
    help: "The application RX volume usage in bytes",
    labels: APP_LABELS,
    kind: ValueKind::Counter,
};

static APP_VOLUME_TX: MetricDesc = MetricDesc {
    name: "application_usage_volume_tx_bytes",
    help: "The application TX volume usage in bytes",
    labels: APP_LABELS,
    kind: ValueKind::Counter,
};

static CIRCUIT_BANDWIDTH_RX: MetricDesc = MetricDesc {
    name: "site_circuit_usage_bandwidth_rx_bps",
    help: "The site circuit RX bandwidth usage rate in bits per second",
    labels: CIRCUIT_LABELS,
    kind: ValueKind::Gauge,
};

static CIRCUIT_BANDWIDTH_TX: MetricDesc = MetricDesc {
    name: "site_circuit_usage_bandwidth_tx_bps",
    help: "The site circuit TX bandwidth usage rate in bits per second",
    labels: CIRCUIT_LABELS,
    kind: ValueKind::Gauge,
};

static APPLIANCE_CPU: MetricDesc = MetricDesc {
    name: "appliance_cpu_load_pct",
    help: "The appliance CPU load in percentage",
    labels: SITE_LABELS,
    kind: ValueKind::Gauge,
};

static APPLIANCE_MEMORY: MetricDesc = MetricDesc {
    name: "appliance_memory_load_pct",
    help: "The appliance memory load in percentage",
    labels: SITE_LABELS,
    kind: ValueKind::Gauge,
};

static APPLIANCE_DISK: MetricDesc = MetricDesc {
    name: "appliance_disk_load_pct",
    help: "The appliance disk load in percentage",
    labels: SITE_LABELS,
    kind: ValueKind::Gauge,
};

static APPLIANCE_SESSIONS: MetricDesc = MetricDesc {
    name: "appliance_sessions_load",
    help: "The appliance current sessions",
    labels: SITE_LABELS,
    kind: ValueKind::Gauge,
};

static SLA_DELAY: MetricDesc = MetricDesc {
    name: "site_slam_delay_ms",
    help: "The SLA probe delay reported in milliseconds",
    labels: SLA_LABELS,
    kind: ValueKind::Gauge,
};

static SLA_JITTER_FWD: MetricDesc = MetricDesc {
    name: "site_slam_jitter_fwd_ms",
    help: "The SLA probe forward jitter reported in milliseconds",
    labels: SLA_LABELS,
    kind: ValueKind::Gauge,
};

static SLA_JITTER_RCV: MetricDesc = MetricDesc {
    name: "site_slam_jitter_rcv_ms",
    help: "The SLA probe reverse jitter reported in milliseconds",
    labels: SLA_LABELS,
    kind: ValueKind::Gauge,
};

static SLA_LOSS_FWD: MetricDesc = MetricDesc {
    name: "site_slam_loss_fwd_pct",
    help: "The SLA probe forward loss reported in percent",
    labels: SLA_LABELS,
    kind: ValueKind::Gauge,
};

static SLA_LOSS_RCV: MetricDesc = MetricDesc {
    name: "site_slam_loss_rcv_pct",
    help: "The SLA probe reverse loss reported in percent",
    labels: SLA_LABELS,
    kind: ValueKind::Gauge,
};
