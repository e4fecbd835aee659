//! vex-metrics — exposition of scrape results.
//!
//! Turns the [`ScrapeReport`](vex_collector::ScrapeReport) of one cycle
//! into the Prometheus text format served on `/metrics`.
//!
//! # Architecture
//!
//! ```text
//! CollectionEngine::scrape() → ScrapeReport
//!   └── render_prometheus(namespace, &report)
//!         ├── declared metrics, grouped by name, HELP/TYPE per group
//!         └── exporter self-metrics (success, duration, samples, family errors)
//! ```

pub mod prometheus;

pub use prometheus::{CONTENT_TYPE, render_prometheus};
