//! The collection engine: one pull trigger drives one full cycle.
//!
//! ```text
//! Idle → LoggingIn → DiscoveringTenants → FanningOut → Publishing → Idle
//!            │                │
//!            └── failure ─────┴──→ Idle (no samples)
//! ```
//!
//! Cycles are serialized. A trigger that arrives while a cycle is running
//! waits for it to finish and then runs its own, so every cycle starts
//! from a fresh login, a fresh tenant list, and an empty accumulator.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use vex_client::AnalyticsClient;
use vex_core::{AuthError, DiscoveryError, MetricFamily, Sample, Tenant};

use crate::accumulator::SampleAccumulator;
use crate::fanout::{FamilyReport, FanOut};

// ── State ──────────────────────────────────────────────────────────

/// Where the engine currently is within a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    Idle,
    LoggingIn,
    DiscoveringTenants,
    FanningOut,
    Publishing,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EngineState::Idle => "idle",
            EngineState::LoggingIn => "logging_in",
            EngineState::DiscoveringTenants => "discovering_tenants",
            EngineState::FanningOut => "fanning_out",
            EngineState::Publishing => "publishing",
        };
        f.write_str(s)
    }
}

/// The only failures that abort a cycle.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("tenant discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),
}

// ── Report ─────────────────────────────────────────────────────────

/// Everything one cycle produced.
#[derive(Debug)]
pub struct ScrapeReport {
    /// Published samples, in no particular order. Empty when the cycle
    /// was aborted.
    pub samples: Vec<Sample>,
    pub outcome: Result<(), CycleError>,
    /// Distinct tenants discovered this cycle.
    pub tenants: usize,
    pub duration: Duration,
    pub families: Vec<FamilyReport>,
}

impl ScrapeReport {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    fn aborted(err: CycleError, duration: Duration) -> Self {
        Self {
            samples: Vec::new(),
            outcome: Err(err),
            tenants: 0,
            duration,
            families: Vec::new(),
        }
    }
}

// ── Engine ─────────────────────────────────────────────────────────

pub struct CollectionEngine {
    client: Arc<dyn AnalyticsClient>,
    fanout: FanOut,
    cycle: Mutex<()>,
    state: watch::Sender<EngineState>,
}

impl CollectionEngine {
    /// Engine with an unbounded fan-out.
    pub fn new(client: Arc<dyn AnalyticsClient>) -> Self {
        Self::with_max_in_flight(client, 0)
    }

    /// Engine that never has more than `max_in_flight` upstream queries
    /// outstanding. Zero means unbounded.
    pub fn with_max_in_flight(client: Arc<dyn AnalyticsClient>, max_in_flight: usize) -> Self {
        let fanout = FanOut::new(Arc::clone(&client), max_in_flight);
        let (state, _) = watch::channel(EngineState::Idle);
        Self {
            client,
            fanout,
            cycle: Mutex::new(()),
            state,
        }
    }

    /// Observe state transitions.
    pub fn subscribe(&self) -> watch::Receiver<EngineState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> EngineState {
        *self.state.borrow()
    }

    /// Run one complete cycle and return what it produced.
    pub async fn scrape(&self) -> ScrapeReport {
        let _cycle = self.cycle.lock().await;
        let _idle = IdleOnDrop(&self.state);

        let started = Instant::now();
        info!("scrape cycle started");

        self.transition(EngineState::LoggingIn);
        if let Err(e) = self.client.login().await {
            return self.abort(e.into(), started);
        }

        self.transition(EngineState::DiscoveringTenants);
        let tenants = match self.client.list_tenants().await {
            Ok(tenants) => dedup(tenants),
            Err(e) => return self.abort(e.into(), started),
        };
        info!(tenants = tenants.len(), "tenant discovery complete");

        self.transition(EngineState::FanningOut);
        let acc = SampleAccumulator::new();
        let families = self
            .fanout
            .run(&MetricFamily::ALL, Arc::clone(&tenants), &acc)
            .await;

        self.transition(EngineState::Publishing);
        let samples = acc.drain().await;
        let duration = started.elapsed();

        info!(
            samples = samples.len(),
            tenants = tenants.len(),
            duration_ms = duration.as_millis() as u64,
            "scrape cycle complete"
        );

        ScrapeReport {
            samples,
            outcome: Ok(()),
            tenants: tenants.len(),
            duration,
            families,
        }
    }

    fn abort(&self, err: CycleError, started: Instant) -> ScrapeReport {
        let duration = started.elapsed();
        warn!(
            error = %err,
            duration_ms = duration.as_millis() as u64,
            "scrape cycle aborted, publishing nothing"
        );
        ScrapeReport::aborted(err, duration)
    }

    fn transition(&self, next: EngineState) {
        let prev = self.state.send_replace(next);
        debug!(from = %prev, to = %next, "engine state");
    }
}

/// Returns the engine to `Idle` however the cycle ends, including when
/// the caller drops the scrape future.
struct IdleOnDrop<'a>(&'a watch::Sender<EngineState>);

impl Drop for IdleOnDrop<'_> {
    fn drop(&mut self) {
        self.0.send_replace(EngineState::Idle);
    }
}

/// Duplicate names in the tenant list would double-count samples.
fn dedup(tenants: Vec<Tenant>) -> Arc<[Tenant]> {
    let discovered = tenants.len();
    let unique: BTreeSet<Tenant> = tenants.into_iter().collect();
    if unique.len() != discovered {
        debug!(discovered, unique = unique.len(), "dropped duplicate tenants");
    }
    unique.into_iter().collect()
}
