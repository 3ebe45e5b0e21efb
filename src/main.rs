//! Job Feed Aggregator — Binary Entrypoint
//! Boots the Axum HTTP server, wiring the source registry, the snapshot
//! cache, and the metrics exporter.

use std::sync::Arc;

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use jobfeed_aggregator::api::{self, AppState};
use jobfeed_aggregator::cache::{JobService, SystemClock, SNAPSHOT_TTL};
use jobfeed_aggregator::ingest::fetcher::FeedClient;
use jobfeed_aggregator::ingest::registry::SourceRegistry;
use jobfeed_aggregator::metrics::Metrics;

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - JOBFEED_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("JOBFEED_DEV_LOG")
        .ok()
        .is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    if !(dev_flag && is_dev_env) {
        return;
    }

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("jobfeed=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments. This enables
    // FEEDS_CONFIG_PATH / JOBFEED_DEV_LOG from .env.
    let _ = dotenvy::dotenv();

    enable_dev_tracing();

    let registry = SourceRegistry::load_default().expect("Failed to load feeds config");
    let service = Arc::new(JobService::new(
        registry,
        FeedClient::http(),
        SNAPSHOT_TTL,
        Arc::new(SystemClock),
    ));

    let metrics = Metrics::init(SNAPSHOT_TTL.as_millis() as u64);
    let router = api::create_router(AppState { service }).merge(metrics.router());

    Ok(router.into())
}
