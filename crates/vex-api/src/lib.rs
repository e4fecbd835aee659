//! vex-api — HTTP surface of the Versa exporter.
//!
//! A scrape of `/metrics` is the pull trigger: every request runs one
//! full collection cycle and answers with its samples.
//!
//! # Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/metrics` | Run one cycle, Prometheus exposition |
//! | GET | `/` | Landing page |
//! | GET | `/healthz` | Liveness probe |

pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use vex_collector::CollectionEngine;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub engine: Arc<CollectionEngine>,
    /// Prefix of every exposed metric name.
    pub namespace: Arc<str>,
}

/// Build the complete router.
pub fn build_router(engine: Arc<CollectionEngine>, namespace: impl Into<Arc<str>>) -> Router {
    let state = ApiState {
        engine,
        namespace: namespace.into(),
    };

    Router::new()
        .route("/", get(handlers::landing_page))
        .route("/healthz", get(handlers::healthz))
        .route("/metrics", get(handlers::prometheus_metrics))
        .with_state(state)
}
