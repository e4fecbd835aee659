//! Two-level fan-out: one task per family, one task per tenant inside
//! each family.
//!
//! Every task is joined before `run` returns. The number of upstream
//! requests in flight can be capped with a semaphore shared across all
//! families of the cycle.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use vex_client::AnalyticsClient;
use vex_core::{MetricFamily, Tenant};

use crate::accumulator::SampleAccumulator;
use crate::transform::transform;

/// Outcome of one family across all tenants of a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FamilyReport {
    pub family: MetricFamily,
    /// Samples contributed to the accumulator.
    pub samples: usize,
    /// Tenants whose fetch failed or whose task died.
    pub failed_tenants: usize,
}

/// What a single tenant task contributed.
struct TenantOutcome {
    samples: usize,
    failed: bool,
}

/// Runs fetch + transform for every (family, tenant) pair of a cycle.
#[derive(Clone)]
pub struct FanOut {
    client: Arc<dyn AnalyticsClient>,
    limit: Option<Arc<Semaphore>>,
}

impl FanOut {
    /// `max_in_flight == 0` leaves the fan-out unbounded.
    pub fn new(client: Arc<dyn AnalyticsClient>, max_in_flight: usize) -> Self {
        let limit = (max_in_flight > 0).then(|| Arc::new(Semaphore::new(max_in_flight)));
        Self { client, limit }
    }

    /// Fan out over `families × tenants`, appending into `acc`.
    ///
    /// Returns one report per family that ran to completion, in launch
    /// order.
    pub async fn run(
        &self,
        families: &[MetricFamily],
        tenants: Arc<[Tenant]>,
        acc: &SampleAccumulator,
    ) -> Vec<FamilyReport> {
        let mut tasks = JoinSet::new();

        for &family in families {
            let fanout = self.clone();
            let tenants = Arc::clone(&tenants);
            let acc = acc.clone();
            tasks.spawn(async move { fanout.run_family(family, tenants, acc).await });
        }

        let mut reports = Vec::with_capacity(families.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(report) => reports.push(report),
                Err(e) => error!(error = %e, "family task failed"),
            }
        }

        reports.sort_by_key(|r| {
            families
                .iter()
                .position(|f| *f == r.family)
                .unwrap_or(usize::MAX)
        });
        reports
    }

    async fn run_family(
        &self,
        family: MetricFamily,
        tenants: Arc<[Tenant]>,
        acc: SampleAccumulator,
    ) -> FamilyReport {
        debug!(%family, tenants = tenants.len(), "family fan-out started");

        let mut tasks = JoinSet::new();
        for tenant in tenants.iter().cloned() {
            let fanout = self.clone();
            let acc = acc.clone();
            tasks.spawn(async move { fanout.run_tenant(family, tenant, acc).await });
        }

        let mut report = FamilyReport {
            family,
            samples: 0,
            failed_tenants: 0,
        };
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => {
                    report.samples += outcome.samples;
                    if outcome.failed {
                        report.failed_tenants += 1;
                    }
                }
                Err(e) => {
                    error!(%family, error = %e, "tenant task failed");
                    report.failed_tenants += 1;
                }
            }
        }

        debug!(
            %family,
            samples = report.samples,
            failed_tenants = report.failed_tenants,
            "family fan-out complete"
        );
        report
    }

    async fn run_tenant(
        &self,
        family: MetricFamily,
        tenant: Tenant,
        acc: SampleAccumulator,
    ) -> TenantOutcome {
        let fetched = {
            // Held for the request only, released before transforming.
            let _permit = match &self.limit {
                Some(limit) => Arc::clone(limit).acquire_owned().await.ok(),
                None => None,
            };
            self.client.fetch(family, &tenant, family.query()).await
        };

        let raw = match fetched {
            Ok(raw) => raw,
            Err(e) => {
                warn!(%family, %tenant, error = %e, "fetch failed, no samples for this tenant");
                return TenantOutcome {
                    samples: 0,
                    failed: true,
                };
            }
        };

        let samples = transform(family, &tenant, &raw);
        let count = samples.len();
        acc.extend(samples).await;

        TenantOutcome {
            samples: count,
            failed: false,
        }
    }
}
