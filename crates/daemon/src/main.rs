//! Jobmatch Daemon - Main Entry Point
//! Periodic aggregation over the configured sources

mod scheduler;

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

// Import workspace crates
use jobmatch_core::application::{cancellation_channel, AggregationPipeline};
use jobmatch_core::port::id_provider::UuidProvider;
use jobmatch_core::port::time_provider::SystemTimeProvider;
use jobmatch_infra_http::HttpAdapterFactory;
use jobmatch_infra_sqlite::{open_database, run_migrations, SqliteJobRepository};
use jobmatch_settings::{init_tracing, AppConfig, CONFIG_ENV_VAR};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load configuration
    let config_path = std::env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from);
    let config = AppConfig::load(config_path.as_deref()).context("Failed to load configuration")?;

    // 2. Initialize logging (guard flushes the file sink on exit)
    let _log_guard = init_tracing(config.log_dir().as_deref());

    info!("Jobmatch daemon v{} starting...", VERSION);

    // 3. Initialize database
    let db_path = config.database_path();
    info!(db_path = %db_path.display(), "Initializing database...");

    let pool = open_database(&db_path)
        .await
        .map_err(|e| anyhow::anyhow!("DB pool creation failed: {}", e))?;
    run_migrations(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;

    // 4. Setup dependencies (DI wiring)
    let time_provider = Arc::new(SystemTimeProvider);
    let id_provider = Arc::new(UuidProvider);
    let repository = Arc::new(SqliteJobRepository::new(pool, time_provider.clone()));

    let pipeline = Arc::new(
        AggregationPipeline::new(
            repository,
            Arc::new(HttpAdapterFactory),
            id_provider,
            time_provider,
        )
        .with_max_concurrency(config.max_concurrency),
    );

    // 5. Start the cycle loop
    let (cancel_handle, cancel_token) = cancellation_channel();
    let interval = Duration::from_secs(config.cycle_interval_secs);
    let sources = config.sources.clone();

    info!(
        sources = sources.len(),
        interval_secs = config.cycle_interval_secs,
        "Starting scheduler..."
    );
    let scheduler_handle = tokio::spawn(async move {
        scheduler::run_periodic(&pipeline, &sources, interval, cancel_token).await
    });

    info!("Press Ctrl+C to shutdown");

    // 6. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received. Cancelling in-flight cycle...");

    // 7. Graceful shutdown
    cancel_handle.cancel();
    if tokio::time::timeout(SHUTDOWN_GRACE, scheduler_handle).await.is_err() {
        tracing::warn!("Cycle did not stop within the grace period");
    }

    info!("Shutdown complete.");

    Ok(())
}
