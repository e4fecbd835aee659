//! vex-collector — the collection engine of the Versa exporter.
//!
//! One scrape cycle logs in, discovers tenants, fans out one fetch per
//! tenant per metric family, transforms every response into flat
//! samples, and hands the result to the caller.
//!
//! # Architecture
//!
//! ```text
//! CollectionEngine::scrape()
//!   ├── AnalyticsClient::login()          ─┐ abort cycle on failure
//!   ├── AnalyticsClient::list_tenants()   ─┘
//!   ├── FanOut::run()
//!   │   └── per family ── per tenant: fetch → transform → SampleAccumulator
//!   └── SampleAccumulator::drain() → ScrapeReport
//! ```
//!
//! Fetch and decode failures are contained by the task that hit them;
//! only login and discovery failures abort a cycle.

pub mod accumulator;
pub mod engine;
pub mod fanout;
pub mod record;
pub mod transform;

pub use accumulator::SampleAccumulator;
pub use engine::{CollectionEngine, CycleError, EngineState, ScrapeReport};
pub use fanout::{FamilyReport, FanOut};
pub use transform::transform;
