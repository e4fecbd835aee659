//! The capability the collection engine consumes.

use async_trait::async_trait;

use vex_core::{
    AuthError, DiscoveryError, FetchResult, MetricFamily, QuerySpec, RawObservation, Tenant,
};

/// Upstream analytics access for one scrape cycle.
///
/// `login` must succeed before any other call in the cycle. A failing
/// `fetch` only affects its own tenant/family pair.
#[async_trait]
pub trait AnalyticsClient: Send + Sync {
    /// Establish a session usable by the rest of the cycle.
    async fn login(&self) -> Result<(), AuthError>;

    /// Discover the tenants to fan out over.
    async fn list_tenants(&self) -> Result<Vec<Tenant>, DiscoveryError>;

    /// Issue one family's query for one tenant.
    async fn fetch(
        &self,
        family: MetricFamily,
        tenant: &Tenant,
        query: &QuerySpec,
    ) -> FetchResult<RawObservation>;
}
