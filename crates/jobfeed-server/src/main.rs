//! Entry point for the job feed query service.
//!
//! The service keeps the latest job records in memory and serves them over
//! HTTP behind a shared API key. A background scheduler re-reads the store
//! on a fixed cadence and atomically swaps in each new snapshot.
//!
//! # Architecture
//!
//! ```text
//! PostgreSQL --> Refresher (every 500ms) --> SnapshotCache --> GET /jobs
//! ```
//!
//! A store outage never takes the service down: readers keep getting the
//! last good snapshot until a refresh succeeds again.

mod config;
mod error;

use std::sync::Arc;

use jobfeed_api::{ApiKey, AppState};
use jobfeed_core::{RefreshConfig, Refresher, SnapshotCache, SnapshotSource};
use jobfeed_db::{JobStore, PostgresPool};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::ServiceConfig;
use crate::error::ServiceError;

/// Application entry point.
///
/// Initializes logging, loads configuration from environment variables,
/// performs one refresh before accepting traffic, then serves until
/// `SIGINT` or `SIGTERM`.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the listener cannot be
/// bound.
#[tokio::main]
async fn main() -> Result<(), ServiceError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    info!("jobfeed-server starting");

    let config = ServiceConfig::from_env()?;
    info!(
        host = config.server.host,
        port = config.server.port,
        refresh_interval_ms = config.refresh.interval.as_millis(),
        refresh_timeout_ms = config.refresh.timeout.as_millis(),
        db_max_connections = config.db_max_connections,
        "configuration loaded"
    );

    // The pool connects on first use, so an unreachable database at startup
    // only means an empty snapshot until the store comes back.
    let pool = PostgresPool::connect_lazy(&config.postgres_config()?);
    let listener = jobfeed_api::bind(&config.server).await?;
    let (refresher, state) =
        prepare(JobStore::new(pool.clone()), config.refresh, &config.api_key).await;

    let shutdown = CancellationToken::new();
    let scheduler = tokio::spawn(refresher.run(shutdown.child_token()));
    tokio::spawn(wait_for_signal(shutdown.clone()));

    info!(
        addr = format!("{}:{}", config.server.host, config.server.port),
        "endpoints: GET /jobs (current snapshot), GET /health (liveness); X-API-KEY required"
    );

    let served = jobfeed_api::serve(listener, state, shutdown.clone().cancelled_owned()).await;

    shutdown.cancel();
    if let Err(e) = scheduler.await {
        warn!(error = %e, "refresh scheduler ended abnormally");
    }
    pool.close().await;

    if let Err(e) = served {
        error!(error = %e, "HTTP server exited with an error");
        return Err(e.into());
    }
    info!("jobfeed-server stopped");
    Ok(())
}

/// Build the cache, load the first snapshot, and assemble the API state.
///
/// A failed first load is logged and the service starts on the empty
/// snapshot; the scheduler picks the store up once it is reachable.
async fn prepare<S: SnapshotSource>(
    source: S,
    refresh: RefreshConfig,
    api_key: &str,
) -> (Refresher<S>, Arc<AppState>) {
    let cache = Arc::new(SnapshotCache::new());
    let refresher = Refresher::new(source, Arc::clone(&cache), refresh);

    match refresher.refresh_once().await {
        Ok(outcome) => info!(count = outcome.count, "initial snapshot loaded"),
        Err(e) => warn!(error = %e, "initial snapshot load failed, serving empty snapshot"),
    }

    let state = Arc::new(AppState::new(cache, ApiKey::new(api_key)));
    (refresher, state)
}

/// Cancel `token` on `SIGINT` or, on Unix, `SIGTERM`.
async fn wait_for_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received Ctrl+C, shutting down"),
        () = terminate => info!("received SIGTERM, shutting down"),
        () = token.cancelled() => return,
    }

    token.cancel();
}
