//! vex-core — shared vocabulary for the Versa Analytics exporter.
//!
//! Everything the collector, the HTTP client, and the exposition layer
//! agree on lives here: tenants, metric families, samples, the declared
//! metric descriptors, the per-family upstream queries, configuration,
//! and the error taxonomy.

pub mod config;
pub mod descriptor;
pub mod error;
pub mod query;
pub mod types;

pub use config::ExporterConfig;
pub use descriptor::{MetricDesc, MetricName};
pub use error::*;
pub use query::{Feature, QuerySpec, QueryType, ReportPrecision};
pub use types::*;
