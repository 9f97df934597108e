//! feed-curator binary: load config, open the history store, run the pipeline
//! once or on a schedule, and optionally serve the reporting routes.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use feed_curator::api::{self, AppState};
use feed_curator::config::CuratorConfig;
use feed_curator::history::HistoryStore;
use feed_curator::ingest::providers;
use feed_curator::metrics::Metrics;
use feed_curator::notify::{self, DeliveryReport, DeliveryTracker};
use feed_curator::pipeline::Curator;
use feed_curator::scheduler;

fn env_flag(key: &str) -> bool {
    std::env::var(key).ok().is_some_and(|v| v == "1")
}

/// Compact logs by default; `CURATOR_LOG_JSON=1` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("feed_curator=info,warn"));

    let registry = tracing_subscriber::registry().with(filter);
    if env_flag("CURATOR_LOG_JSON") {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = CuratorConfig::load_default().context("loading curator config")?;
    let store = HistoryStore::open(&cfg.storage.path)
        .with_context(|| format!("opening history store at {}", cfg.storage.path.display()))?;

    let connectors = providers::from_config(&cfg)?;
    if connectors.is_empty() {
        tracing::warn!("no [[sources]] configured; runs will find nothing");
    }
    let client = feed_curator::ai::build_client_from_config(&cfg.ai);
    tracing::info!(
        sources = connectors.len(),
        ai = client.as_ref().map(|c| c.provider_name()).unwrap_or("none"),
        threshold = cfg.relevance.threshold,
        max_output = cfg.selection.max_output,
        "feed-curator starting"
    );

    let curator = Arc::new(Curator::from_config(&cfg, store.clone(), connectors, client));
    let tracker = DeliveryTracker::new(store.clone());
    let notifier = notify::from_env();

    if env_flag("CURATOR_RUN_ONCE") {
        let outcome = scheduler::run_cycle(&curator, &tracker, &notifier).await?;
        if let DeliveryReport::Failed { error } = &outcome.delivery {
            anyhow::bail!("delivery failed: {error:#}");
        }
        return Ok(());
    }

    // Reporting server is opt-in: CURATOR_HTTP_ADDR=0.0.0.0:8080
    let server = match std::env::var("CURATOR_HTTP_ADDR") {
        Ok(addr) => {
            let addr: SocketAddr = addr.parse().context("parsing CURATOR_HTTP_ADDR")?;
            let metrics = Metrics::init(cfg.selection.max_output)?;
            let app = api::router(AppState { store }).merge(metrics.router());
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .with_context(|| format!("binding {addr}"))?;
            tracing::info!(%addr, "reporting server listening");
            Some(tokio::spawn(async move {
                if let Err(e) = axum::serve(listener, app).await {
                    tracing::error!(error = %e, "reporting server stopped");
                }
            }))
        }
        Err(_) => None,
    };

    let ticker = scheduler::spawn_scheduler(curator, tracker, notifier, cfg.schedule.interval_secs);

    tokio::signal::ctrl_c().await.context("waiting for ctrl-c")?;
    tracing::info!("shutting down");
    ticker.abort();
    if let Some(s) = server {
        s.abort();
    }
    Ok(())
}
