//! Exporter endpoint regression tests.
//!
//! Drives the full router with an in-memory analytics backend: every
//! `/metrics` request must run a cycle and render its samples.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;
use vex_api::build_router;
use vex_client::AnalyticsClient;
use vex_collector::CollectionEngine;
use vex_core::{
    AuthError, DiscoveryError, FetchError, FetchResult, MetricFamily, QuerySpec, RawObservation,
    Tenant,
};

struct Backend {
    login_ok: bool,
    logins: AtomicUsize,
}

impl Backend {
    fn new(login_ok: bool) -> Arc<Self> {
        Arc::new(Self {
            login_ok,
            logins: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl AnalyticsClient for Backend {
    async fn login(&self) -> Result<(), AuthError> {
        self.logins.fetch_add(1, Ordering::SeqCst);
        if self.login_ok {
            Ok(())
        } else {
            Err(AuthError::Rejected(401))
        }
    }

    async fn list_tenants(&self) -> Result<Vec<Tenant>, DiscoveryError> {
        Ok(vec![Tenant::new("acme"), Tenant::new("beta")])
    }

    async fn fetch(
        &self,
        family: MetricFamily,
        tenant: &Tenant,
        _query: &QuerySpec,
    ) -> FetchResult<RawObservation> {
        let body = match (family, tenant.name()) {
            (MetricFamily::SitesAvailability, "acme") => {
                json!({ "stats": { "NYC": { "mean": 99.95 } } })
            }
            (MetricFamily::SiteSla, "acme") => json!({
                "data": [{
                    "name": "NYC,CTLR-1,MPLS,INET",
                    "metric": "delay",
                    "data": [[1_700_000_000, 12.0]]
                }]
            }),
            (MetricFamily::SiteSla, "beta") => return Err(FetchError::Status(500)),
            _ => json!({ "data": [] }),
        };
        Ok(RawObservation::new(body))
    }
}

fn router(backend: Arc<Backend>) -> axum::Router {
    let engine = Arc::new(CollectionEngine::new(backend));
    build_router(engine, "versa_analytics")
}

async fn get(router: axum::Router, uri: &str) -> (StatusCode, Option<String>, String) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let resp = router.oneshot(req).await.unwrap();

    let status = resp.status();
    let content_type = resp
        .headers()
        .get("content-type")
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, content_type, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn metrics_serves_one_cycle() {
    let (status, content_type, body) = get(router(Backend::new(true)), "/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some(vex_metrics::CONTENT_TYPE));
    assert!(body.contains(
        "versa_analytics_sites_availability_percent{tenant=\"acme\",site=\"NYC\"} 99.95\n"
    ));
    assert!(body.contains(concat!(
        "versa_analytics_site_slam_delay_ms{tenant=\"acme\",source_site=\"NYC\",",
        "destination_site=\"CTLR-1\",source_circuit=\"MPLS\",destination_circuit=\"INET\"} 12\n"
    )));
    assert!(body.contains("versa_analytics_exporter_scrape_success 1\n"));
    assert!(body.contains("versa_analytics_exporter_family_errors{family=\"site_sla\"} 1\n"));
}

#[tokio::test]
async fn metrics_reports_aborted_cycle_with_ok_status() {
    let (status, _, body) = get(router(Backend::new(false)), "/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("versa_analytics_exporter_scrape_success 0\n"));
    assert!(body.contains("versa_analytics_exporter_scrape_samples 0\n"));
    assert!(!body.contains("sites_availability_percent"));
}

#[tokio::test]
async fn every_scrape_runs_a_fresh_cycle() {
    let backend = Backend::new(true);
    let router = router(backend.clone());

    let (_, _, first) = get(router.clone(), "/metrics").await;
    let (_, _, second) = get(router, "/metrics").await;

    assert_eq!(backend.logins.load(Ordering::SeqCst), 2);
    let series = |body: &str| {
        body.lines()
            .filter(|l| l.contains("sites_availability_percent{"))
            .count()
    };
    assert_eq!(series(&first), 1);
    assert_eq!(series(&second), 1);
}

#[tokio::test]
async fn landing_page_links_to_metrics() {
    let (status, content_type, body) = get(router(Backend::new(true)), "/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().starts_with("text/html"));
    assert!(body.contains("/metrics"));
}

#[tokio::test]
async fn healthz_does_not_trigger_a_cycle() {
    let backend = Backend::new(true);
    let (status, _, body) = get(router(backend.clone()), "/healthz").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
    assert_eq!(backend.logins.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let (status, _, _) = get(router(Backend::new(true)), "/api/v1/deployments").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
