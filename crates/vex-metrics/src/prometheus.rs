//! Prometheus text exposition format (0.0.4).
//!
//! Declared metrics come first, in declaration order, each with one
//! HELP/TYPE header. Metrics without samples in this cycle are left out
//! entirely. Self-metrics describing the cycle itself follow.

use std::collections::BTreeMap;
use std::fmt::Write;

use vex_collector::ScrapeReport;
use vex_core::{MetricName, Sample};

/// Content type of the rendered body.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Render one cycle's report, prefixing every metric with `namespace`.
pub fn render_prometheus(namespace: &str, report: &ScrapeReport) -> String {
    let mut out = String::new();

    let mut grouped: BTreeMap<MetricName, Vec<&Sample>> = BTreeMap::new();
    for sample in &report.samples {
        grouped.entry(sample.metric()).or_default().push(sample);
    }

    for (metric, samples) in &grouped {
        let desc = metric.desc();
        header(&mut out, namespace, desc.name, desc.help, desc.kind.as_str());
        for sample in samples {
            let labels: Vec<(&str, &str)> = sample
                .labels()
                .iter()
                .map(|l| (l.name, l.value.as_str()))
                .collect();
            line(&mut out, namespace, desc.name, &labels, sample.value());
        }
    }

    render_self_metrics(&mut out, namespace, report);
    out
}

// ── Self-metrics ───────────────────────────────────────────────────

fn render_self_metrics(out: &mut String, namespace: &str, report: &ScrapeReport) {
    header(
        out,
        namespace,
        "exporter_scrape_success",
        "Whether the last scrape cycle logged in and discovered tenants (1) or was aborted (0).",
        "gauge",
    );
    let success = if report.is_success() { 1.0 } else { 0.0 };
    line(out, namespace, "exporter_scrape_success", &[], success);

    header(
        out,
        namespace,
        "exporter_scrape_duration_seconds",
        "Wall-clock duration of the last scrape cycle.",
        "gauge",
    );
    line(
        out,
        namespace,
        "exporter_scrape_duration_seconds",
        &[],
        report.duration.as_secs_f64(),
    );

    header(
        out,
        namespace,
        "exporter_scrape_samples",
        "Samples published by the last scrape cycle.",
        "gauge",
    );
    line(
        out,
        namespace,
        "exporter_scrape_samples",
        &[],
        report.samples.len() as f64,
    );

    if report.families.is_empty() {
        return;
    }

    header(
        out,
        namespace,
        "exporter_family_errors",
        "Tenants whose query failed during the last scrape cycle, per metric family.",
        "gauge",
    );
    for family in &report.families {
        line(
            out,
            namespace,
            "exporter_family_errors",
            &[("family", family.family.as_str())],
            family.failed_tenants as f64,
        );
    }
}

// ── Formatting ─────────────────────────────────────────────────────

fn header(out: &mut String, namespace: &str, name: &str, help: &str, kind: &str) {
    let _ = writeln!(out, "# HELP {namespace}_{name} {help}");
    let _ = writeln!(out, "# TYPE {namespace}_{name} {kind}");
}

fn line(out: &mut String, namespace: &str, name: &str, labels: &[(&str, &str)], value: f64) {
    let _ = write!(out, "{namespace}_{name}");
    if !labels.is_empty() {
        out.push('{');
        for (i, (key, value)) in labels.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            let _ = write!(out, "{key}=\"{}\"", escape_label_value(value));
        }
        out.push('}');
    }
    let _ = writeln!(out, " {}", format_value(value));
}

fn escape_label_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str(r"\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str(r"\n"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "+Inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use vex_collector::{CycleError, FamilyReport};
    use vex_core::{AuthError, MetricFamily};

    fn report(samples: Vec<Sample>) -> ScrapeReport {
        ScrapeReport {
            samples,
            outcome: Ok(()),
            tenants: 1,
            duration: Duration::from_millis(1500),
            families: vec![
                FamilyReport {
                    family: MetricFamily::SitesAvailability,
                    samples: 2,
                    failed_tenants: 0,
                },
                FamilyReport {
                    family: MetricFamily::SiteSla,
                    samples: 0,
                    failed_tenants: 1,
                },
            ],
        }
    }

    fn availability(site: &str, value: f64) -> Sample {
        Sample::new(MetricName::SitesAvailabilityPercent, value, ["acme", site]).unwrap()
    }

    #[test]
    fn render_declared_metric_with_labels() {
        let output = render_prometheus(
            "versa_analytics",
            &report(vec![availability("NYC", 99.95), availability("SFO", 100.0)]),
        );

        assert!(output.contains("# HELP versa_analytics_sites_availability_percent "));
        assert!(output.contains("# TYPE versa_analytics_sites_availability_percent gauge"));
        assert!(output.contains(
            "versa_analytics_sites_availability_percent{tenant=\"acme\",site=\"NYC\"} 99.95\n"
        ));
        assert!(output.contains(
            "versa_analytics_sites_availability_percent{tenant=\"acme\",site=\"SFO\"} 100\n"
        ));
    }

    #[test]
    fn header_appears_once_per_metric() {
        let output = render_prometheus(
            "versa_analytics",
            &report(vec![availability("NYC", 1.0), availability("SFO", 2.0)]),
        );
        let headers = output
            .lines()
            .filter(|l| *l == "# TYPE versa_analytics_sites_availability_percent gauge")
            .count();
        assert_eq!(headers, 1);
    }

    #[test]
    fn metrics_without_samples_are_omitted() {
        let output = render_prometheus("versa_analytics", &report(vec![]));
        assert!(!output.contains("sites_availability_percent"));
        assert!(!output.contains("site_slam_delay_ms"));
    }

    #[test]
    fn counters_are_typed_as_counters() {
        let volume = Sample::new(
            MetricName::ApplicationUsageVolumeRxBytes,
            4096.0,
            ["acme", "NYC", "o365", "10.0.0.1", "MPLS"],
        )
        .unwrap();
        let output = render_prometheus("vx", &report(vec![volume]));
        let kind = MetricName::ApplicationUsageVolumeRxBytes.desc().kind.as_str();
        assert!(output.contains(&format!(
            "# TYPE vx_application_usage_volume_rx_bytes {kind}"
        )));
    }

    #[test]
    fn label_values_are_escaped() {
        let output = render_prometheus(
            "versa_analytics",
            &report(vec![availability("a\"b\\c\nd", 5.0)]),
        );
        assert!(output.contains(r#"site="a\"b\\c\nd""#));
    }

    #[test]
    fn self_metrics_for_successful_cycle() {
        let output = render_prometheus(
            "versa_analytics",
            &report(vec![availability("NYC", 1.0), availability("SFO", 2.0)]),
        );

        assert!(output.contains("versa_analytics_exporter_scrape_success 1\n"));
        assert!(output.contains("versa_analytics_exporter_scrape_duration_seconds 1.5\n"));
        assert!(output.contains("versa_analytics_exporter_scrape_samples 2\n"));
        assert!(output.contains(
            "versa_analytics_exporter_family_errors{family=\"sites_availability\"} 0\n"
        ));
        assert!(output.contains("versa_analytics_exporter_family_errors{family=\"site_sla\"} 1\n"));
    }

    #[test]
    fn aborted_cycle_reports_failure_only() {
        let aborted = ScrapeReport {
            samples: Vec::new(),
            outcome: Err(CycleError::Auth(AuthError::Rejected(401))),
            tenants: 0,
            duration: Duration::from_millis(20),
            families: Vec::new(),
        };
        let output = render_prometheus("versa_analytics", &aborted);

        assert!(output.contains("versa_analytics_exporter_scrape_success 0\n"));
        assert!(output.contains("versa_analytics_exporter_scrape_samples 0\n"));
        assert!(!output.contains("exporter_family_errors"));
    }

    #[test]
    fn special_float_values() {
        assert_eq!(format_value(f64::NAN), "NaN");
        assert_eq!(format_value(f64::INFINITY), "+Inf");
        assert_eq!(format_value(f64::NEG_INFINITY), "-Inf");
        assert_eq!(format_value(0.25), "0.25");
    }

    #[test]
    fn render_format_is_prometheus_compatible() {
        let output = render_prometheus("versa_analytics", &report(vec![availability("NYC", 1.0)]));

        for line in output.lines() {
            if line.starts_with('#') {
                continue;
            }
            let (series, value) = line.rsplit_once(' ').unwrap();
            assert!(series.starts_with("versa_analytics_"), "bad line: {line}");
            assert!(value.parse::<f64>().is_ok(), "bad value: {line}");
        }
    }
}
