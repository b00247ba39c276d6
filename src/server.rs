use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use crate::api::{self, ApiState};
use crate::config::ServerConfig;
use crate::lifecycle::LifecycleDriver;
use crate::scheduler::SchedulerEngine;
use crate::shutdown;

/// Run the full server until a shutdown signal arrives.
///
/// Starts every subsystem:
/// 1. Builds the shared engine behind its lock
/// 2. Spawns the lifecycle driver that advances task status
/// 3. Serves the REST API (blocking until shutdown)
///
/// # Errors
///
/// Returns an error if the listen address cannot be bound or the HTTP server
/// fails. The driver runs as a spawned task and logs its own progress.
pub async fn run(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let engine = Arc::new(RwLock::new(SchedulerEngine::new(config.initial_scheduler)));
    let shutdown = shutdown::shutdown_token();

    let driver = LifecycleDriver::new(engine.clone(), config.tick_interval(), shutdown.clone());
    let driver_handle = tokio::spawn(driver.run());

    let app = api::router(ApiState { engine });
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    info!(
        addr = %config.listen_addr,
        scheduler = %config.initial_scheduler,
        tick_interval_ms = config.tick_interval_ms,
        "Starting API server"
    );

    let drain = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { drain.cancelled().await })
        .await?;

    // Stop the driver even when serve returned on an error instead of the
    // signal path.
    shutdown.cancel();
    let _ = driver_handle.await;

    info!("Shutdown complete");
    Ok(())
}
