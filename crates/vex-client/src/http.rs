//! reqwest-backed analytics client.
//!
//! One `reqwest::Client` with a cookie jar carries the session from
//! `login()` to every later call of the cycle. Timeouts are owned here,
//! not by the collector.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use tracing::debug;

use vex_core::config::AnalyticsConfig;
use vex_core::{
    AuthError, DiscoveryError, FetchError, FetchResult, MetricFamily, QuerySpec, RawObservation,
    Tenant,
};

use crate::client::AnalyticsClient;

const API_PREFIX: [&str; 5] = ["versa", "analytics", "v1.0.0", "data", "provider"];

/// Production [`AnalyticsClient`] talking to a Versa Analytics node.
#[derive(Clone)]
pub struct HttpAnalyticsClient {
    http: Client,
    base: Url,
    username: String,
    password: String,
}

impl HttpAnalyticsClient {
    /// Build a client from the `[analytics]` config section.
    pub fn new(config: &AnalyticsConfig) -> Result<Self, FetchError> {
        let base = Url::parse(&config.base_url())
            .map_err(|e| FetchError::Transport(format!("invalid analytics base URL: {e}")))?;

        let http = Client::builder()
            .cookie_store(true)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .timeout(config.timeout())
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base,
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    /// Base URL with `segments` appended as properly escaped path segments.
    fn url<'a, I>(&self, segments: I) -> Result<Url, String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| format!("{} cannot carry a path", self.base))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn tenants_url(&self) -> Result<Url, String> {
        self.url(API_PREFIX.into_iter().chain(["features", "SDWAN", "tenants"]))
    }

    fn data_url(&self, tenant: &Tenant, query: &QuerySpec) -> Result<Url, String> {
        self.url(
            API_PREFIX
                .into_iter()
                .chain(["tenants", tenant.name(), "features"])
                .chain(query.feature.path_segment().split('/')),
        )
    }
}

#[async_trait]
impl AnalyticsClient for HttpAnalyticsClient {
    async fn login(&self) -> Result<(), AuthError> {
        let url = self.url(["versa", "login"]).map_err(AuthError::Transport)?;

        let resp = self
            .http
            .post(url)
            .query(&[("username", &self.username), ("password", &self.password)])
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        if resp.status() != StatusCode::OK {
            return Err(AuthError::Rejected(resp.status().as_u16()));
        }

        debug!(host = %self.base, "analytics login succeeded");
        Ok(())
    }

    async fn list_tenants(&self) -> Result<Vec<Tenant>, DiscoveryError> {
        let url = self.tenants_url().map_err(DiscoveryError::Transport)?;

        let resp = self
            .http
            .get(url)
            .query(&[("count", "-1")])
            .header("content-type", "application/json")
            .send()
            .await
            .map_err(|e| DiscoveryError::Transport(e.to_string()))?;

        if resp.status() != StatusCode::OK {
            return Err(DiscoveryError::Status(resp.status().as_u16()));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| DiscoveryError::Transport(e.to_string()))?;
        serde_json::from_slice(&body).map_err(|e| DiscoveryError::Decode(e.to_string()))
    }

    async fn fetch(
        &self,
        family: MetricFamily,
        tenant: &Tenant,
        query: &QuerySpec,
    ) -> FetchResult<RawObservation> {
        let url = self.data_url(tenant, query).map_err(FetchError::Transport)?;

        debug!(%family, %tenant, "querying analytics");

        let resp = self
            .http
            .get(url)
            .query(&query.to_pairs())
            .header("content-type", "application/json")
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        if resp.status() != StatusCode::OK {
            return Err(FetchError::Status(resp.status().as_u16()));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        let value: serde_json::Value =
            serde_json::from_slice(&body).map_err(|e| FetchError::Body(e.to_string()))?;

        Ok(RawObservation::new(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::net::SocketAddr;

    use axum::Router;
    use axum::extract::{Path, Query};
    use axum::http::{HeaderMap, StatusCode as AxumStatus, header};
    use axum::response::IntoResponse;
    use axum::routing::{get, post};

    const SESSION: &str = "VSESSION=abc123";

    fn has_session(headers: &HeaderMap) -> bool {
        headers
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains(SESSION))
    }

    async fn login(Query(params): Query<Vec<(String, String)>>) -> impl IntoResponse {
        let ok = params.contains(&("username".into(), "monitor".into()))
            && params.contains(&("password".into(), "s3cret&more".into()));
        if ok {
            (
                AxumStatus::OK,
                [(header::SET_COOKIE, format!("{SESSION}; Path=/"))],
            )
                .into_response()
        } else {
            AxumStatus::UNAUTHORIZED.into_response()
        }
    }

    async fn tenants(headers: HeaderMap) -> impl IntoResponse {
        if !has_session(&headers) {
            return AxumStatus::UNAUTHORIZED.into_response();
        }
        axum::Json(serde_json::json!([{ "name": "acme" }, { "name": "beta" }])).into_response()
    }

    async fn sdwan(
        Path(tenant): Path<String>,
        headers: HeaderMap,
        Query(params): Query<Vec<(String, String)>>,
    ) -> impl IntoResponse {
        if !has_session(&headers) {
            return AxumStatus::UNAUTHORIZED.into_response();
        }
        if tenant == "beta" {
            return AxumStatus::INTERNAL_SERVER_ERROR.into_response();
        }
        if tenant == "garbled" {
            return "not json".into_response();
        }
        let metrics: Vec<&str> = params
            .iter()
            .filter(|(k, _)| k == "metrics")
            .map(|(_, v)| v.as_str())
            .collect();
        axum::Json(serde_json::json!({ "tenant": tenant, "metrics": metrics })).into_response()
    }

    async fn system(Path(tenant): Path<String>) -> impl IntoResponse {
        axum::Json(serde_json::json!({ "system": tenant }))
    }

    async fn spawn_backend() -> SocketAddr {
        let app = Router::new()
            .route("/versa/login", post(login))
            .route(
                "/versa/analytics/v1.0.0/data/provider/features/SDWAN/tenants",
                get(tenants),
            )
            .route(
                "/versa/analytics/v1.0.0/data/provider/tenants/{tenant}/features/SDWAN/",
                get(sdwan),
            )
            .route(
                "/versa/analytics/v1.0.0/data/provider/tenants/{tenant}/features/SYSTEM",
                get(system),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    fn client_for(addr: SocketAddr, password: &str) -> HttpAnalyticsClient {
        let config = AnalyticsConfig {
            hostname: addr.to_string(),
            scheme: "http".to_string(),
            username: "monitor".to_string(),
            password: password.to_string(),
            timeout_secs: 5,
            accept_invalid_certs: true,
        };
        HttpAnalyticsClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn login_then_discover_tenants() {
        let addr = spawn_backend().await;
        let client = client_for(addr, "s3cret&more");

        client.login().await.unwrap();
        let tenants = client.list_tenants().await.unwrap();
        assert_eq!(tenants, vec![Tenant::new("acme"), Tenant::new("beta")]);
    }

    #[tokio::test]
    async fn login_rejected_reports_status() {
        let addr = spawn_backend().await;
        let client = client_for(addr, "wrong");

        let err = client.login().await.unwrap_err();
        assert!(matches!(err, AuthError::Rejected(401)));
    }

    #[tokio::test]
    async fn discovery_without_session_fails() {
        let addr = spawn_backend().await;
        let client = client_for(addr, "s3cret&more");

        let err = client.list_tenants().await.unwrap_err();
        assert!(matches!(err, DiscoveryError::Status(401)));
    }

    #[tokio::test]
    async fn fetch_sends_family_query() {
        let addr = spawn_backend().await;
        let client = client_for(addr, "s3cret&more");
        client.login().await.unwrap();

        let family = MetricFamily::SiteCircuitBandwidth;
        let raw = client
            .fetch(family, &Tenant::new("acme"), family.query())
            .await
            .unwrap();

        assert_eq!(
            raw.as_value(),
            &serde_json::json!({ "tenant": "acme", "metrics": ["bw-rx", "bw-tx"] })
        );
    }

    #[tokio::test]
    async fn fetch_system_feature_path() {
        let addr = spawn_backend().await;
        let client = client_for(addr, "s3cret&more");
        client.login().await.unwrap();

        let family = MetricFamily::ApplianceCompute;
        let raw = client
            .fetch(family, &Tenant::new("acme"), family.query())
            .await
            .unwrap();
        assert_eq!(raw.as_value(), &serde_json::json!({ "system": "acme" }));
    }

    #[tokio::test]
    async fn fetch_errors_are_typed() {
        let addr = spawn_backend().await;
        let client = client_for(addr, "s3cret&more");
        client.login().await.unwrap();

        let family = MetricFamily::SiteSla;
        let err = client
            .fetch(family, &Tenant::new("beta"), family.query())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status(500)));

        let err = client
            .fetch(family, &Tenant::new("garbled"), family.query())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Body(_)));
    }

    #[tokio::test]
    async fn unreachable_backend_is_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client_for(addr, "s3cret&more");
        assert!(matches!(
            client.login().await.unwrap_err(),
            AuthError::Transport(_)
        ));
    }
}
