//! Request handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use tracing::debug;

use crate::ApiState;

const LANDING_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Versa Analytics Exporter</title></head>
<body>
<h1>Versa Analytics Exporter</h1>
<p><a href="/metrics">Metrics</a></p>
</body>
</html>
"#;

/// Runs one scrape cycle per request.
///
/// Always answers 200: an aborted cycle is visible as
/// `exporter_scrape_success 0` rather than as an HTTP error.
pub async fn prometheus_metrics(State(state): State<ApiState>) -> impl IntoResponse {
    let report = state.engine.scrape().await;
    debug!(
        samples = report.samples.len(),
        success = report.is_success(),
        "serving scrape"
    );

    let body = vex_metrics::render_prometheus(&state.namespace, &report);
    (
        StatusCode::OK,
        [("content-type", vex_metrics::CONTENT_TYPE)],
        body,
    )
}

pub async fn landing_page() -> Html<&'static str> {
    Html(LANDING_PAGE)
}

pub async fn healthz() -> &'static str {
    "ok"
}
