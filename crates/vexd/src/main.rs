//! vexd — the Versa Analytics exporter daemon.
//!
//! Serves Versa Analytics telemetry in the Prometheus text format. Each
//! scrape of `/metrics` logs in to the analytics backend, discovers the
//! tenants, queries every metric family for every tenant, and answers
//! with the samples of that single cycle.
//!
//! # Usage
//!
//! ```text
//! vexd serve --config /etc/vexd/vexd.toml --listen 0.0.0.0:2112
//! ```
//!
//! Credentials may also come from `PEPPAMON_VERSA_ANALYTICS_HOSTNAME`,
//! `PEPPAMON_VERSA_ANALYTICS_USERNAME` and `PEPPAMON_VERSA_ANALYTICS_PASSWORD`.
//! The same names without the `PEPPAMON_` prefix, plus
//! `VERSA_ANALYTICS_SCHEME`, are accepted as well.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use vex_client::{AnalyticsClient, HttpAnalyticsClient};
use vex_collector::CollectionEngine;
use vex_core::ExporterConfig;

#[derive(Parser)]
#[command(name = "vexd", version, about = "Versa Analytics Prometheus exporter")]
struct Cli {
    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve `/metrics`, collecting from the analytics backend on every scrape.
    Serve {
        /// TOML config file. Without one, everything comes from the
        /// environment and flags.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Address to listen on, overriding the config file.
        #[arg(long)]
        listen: Option<SocketAddr>,

        /// Upper bound on concurrent upstream queries (0 = unbounded).
        #[arg(long)]
        max_in_flight: Option<usize>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match cli.command {
        Command::Serve {
            config,
            listen,
            max_in_flight,
        } => {
            let config = load_config(config, listen, max_in_flight)?;
            run_serve(config).await
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,vexd=debug,vex=debug"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// File, then environment, then flags.
fn load_config(
    path: Option<PathBuf>,
    listen: Option<SocketAddr>,
    max_in_flight: Option<usize>,
) -> anyhow::Result<ExporterConfig> {
    let mut config = match &path {
        Some(path) => ExporterConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => ExporterConfig::default(),
    };

    config.apply_env();

    if let Some(listen) = listen {
        config.server.listen = listen;
    }
    if let Some(max_in_flight) = max_in_flight {
        config.collector.max_in_flight = max_in_flight;
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}

async fn run_serve(config: ExporterConfig) -> anyhow::Result<()> {
    info!(version = env!("CARGO_PKG_VERSION"), "Versa Analytics exporter starting");

    // ── Initialize subsystems ──────────────────────────────────

    let client: Arc<dyn AnalyticsClient> = Arc::new(
        HttpAnalyticsClient::new(&config.analytics).context("building analytics client")?,
    );
    info!(
        host = %config.analytics.hostname,
        scheme = %config.analytics.scheme,
        timeout_secs = config.analytics.timeout_secs,
        "analytics client initialized"
    );

    let engine = Arc::new(CollectionEngine::with_max_in_flight(
        client,
        config.collector.max_in_flight,
    ));
    info!(
        max_in_flight = config.collector.max_in_flight,
        namespace = %config.collector.namespace,
        "collection engine initialized"
    );

    // ── Start exporter server ──────────────────────────────────

    let router = vex_api::build_router(engine, config.collector.namespace.as_str());
    let addr = config.server.listen;

    info!(%addr, "exporter listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    // Graceful shutdown on Ctrl-C.
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            info!("shutdown signal received");
        })
        .await?;

    info!("Versa Analytics exporter stopped");
    Ok(())
}
