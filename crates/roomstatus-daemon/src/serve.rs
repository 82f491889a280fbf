//! Runs the service: refresh scheduler plus query endpoint.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use roomstatus_providers::{IcsCalendarSource, SourceConfig};
use roomstatus_server::{
    AvailabilityStore, RoomRefresher, Scheduler, SchedulerConfig, ServerError, SignalHandler,
};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::DaemonConfig;
use crate::error::DaemonResult;

/// How long to wait for the scheduler after the listener has stopped.
const SCHEDULER_STOP_GRACE: Duration = Duration::from_secs(5);

/// Binds the configured address and runs until SIGTERM or SIGINT.
pub async fn run(config: DaemonConfig) -> DaemonResult<()> {
    let addr = config.server.bind_addr;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::bind(addr, e))?;

    let signals = SignalHandler::new();
    signals.spawn_listener();

    run_until(config, listener, signals.shutdown().wait()).await
}

/// Runs on an already bound listener until `shutdown` completes.
///
/// The first refresh cycle starts immediately; until it finishes, queries
/// answer with the unknown-room text.
pub async fn run_until<F>(
    config: DaemonConfig,
    listener: TcpListener,
    shutdown: F,
) -> DaemonResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let DaemonConfig {
        timezone,
        server,
        rooms,
    } = config;

    // The HTTP client timeout backs up the per-room timeout in the refresher
    let source = IcsCalendarSource::new(
        SourceConfig::new(timezone).with_timeout(server.fetch_timeout),
    )?;
    let refresher = RoomRefresher::new(Arc::new(source), timezone, server.fetch_timeout);

    for room in &rooms {
        info!(room = %room.id, name = %room.display_name, "Room registered");
    }

    let store = AvailabilityStore::new();
    let scheduler = Scheduler::new(SchedulerConfig::new(server.refresh_period));
    let scheduler_handle = scheduler.handle();
    let scheduler_task = tokio::spawn(scheduler.run(refresher, rooms, store.clone()));

    roomstatus_server::serve(listener, store, shutdown).await?;

    info!("Shutting down...");
    if let Err(e) = scheduler_handle.stop().await {
        warn!(error = %e, "Failed to send stop command to scheduler");
    }
    if tokio::time::timeout(SCHEDULER_STOP_GRACE, scheduler_task)
        .await
        .is_err()
    {
        warn!("Scheduler did not stop in time, abandoning it");
    }

    info!("Server stopped");
    Ok(())
}
