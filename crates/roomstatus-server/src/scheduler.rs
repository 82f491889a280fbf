//! Background scheduler for room refreshes.
//!
//! Every period the scheduler refreshes all configured rooms, each in its own
//! task, and writes the results to the store:
//! - Fixed period, first cycle immediately
//! - A failing or panicking room only affects its own record
//! - No backoff; a failed room is simply retried next cycle

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use roomstatus_core::{RoomConfig, RoomState, StatusRecord};
use tokio::sync::{RwLock, mpsc};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::refresher::RoomRefresher;
use crate::store::AvailabilityStore;

/// Detail shown for a room whose refresh task died.
const INTERNAL_ERROR_DETAIL: &str = "internal error";

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Time between the starts of consecutive cycles.
    pub refresh_period: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            refresh_period: Duration::from_secs(10),
        }
    }
}

impl SchedulerConfig {
    /// Creates a new scheduler config with the given period.
    pub fn new(refresh_period: Duration) -> Self {
        Self { refresh_period }
    }
}

/// Commands that can be sent to the scheduler.
#[derive(Debug, Clone)]
pub enum SchedulerCommand {
    /// Run an extra cycle now.
    RefreshNow,
    /// Stop the scheduler.
    Stop,
}

/// Scheduler state.
#[derive(Debug, Clone, Default)]
pub struct SchedulerState {
    /// Number of completed cycles.
    pub cycles: u64,
    /// When the last cycle completed.
    pub last_cycle: Option<DateTime<Utc>>,
    /// How long the last cycle took.
    pub last_cycle_duration: Option<Duration>,
    /// Rooms that ended the last cycle with an error record.
    pub last_cycle_errors: usize,
}

impl SchedulerState {
    /// Creates a new scheduler state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a completed cycle.
    pub fn record_cycle(&mut self, errors: usize, took: Duration) {
        self.cycles += 1;
        self.last_cycle = Some(Utc::now());
        self.last_cycle_duration = Some(took);
        self.last_cycle_errors = errors;
    }

    /// Returns the time since the last completed cycle.
    pub fn time_since_cycle(&self) -> Option<Duration> {
        self.last_cycle.map(|last| {
            let elapsed = Utc::now() - last;
            Duration::from_secs(elapsed.num_seconds().max(0) as u64)
        })
    }
}

/// Shared scheduler state.
pub type SharedSchedulerState = Arc<RwLock<SchedulerState>>;

/// Creates a new shared scheduler state.
pub fn new_scheduler_state() -> SharedSchedulerState {
    Arc::new(RwLock::new(SchedulerState::new()))
}

/// Drives the periodic refresh of every room.
pub struct Scheduler {
    config: SchedulerConfig,
    state: SharedSchedulerState,
    command_tx: mpsc::Sender<SchedulerCommand>,
    command_rx: mpsc::Receiver<SchedulerCommand>,
}

impl Scheduler {
    /// Creates a new scheduler with the given configuration.
    pub fn new(config: SchedulerConfig) -> Self {
        let (command_tx, command_rx) = mpsc::channel(16);
        Self {
            config,
            state: new_scheduler_state(),
            command_tx,
            command_rx,
        }
    }

    /// Returns a handle for sending commands to the scheduler.
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            command_tx: self.command_tx.clone(),
            state: self.state.clone(),
        }
    }

    /// Returns the shared state.
    pub fn state(&self) -> SharedSchedulerState {
        self.state.clone()
    }

    /// Runs the refresh loop until stopped.
    ///
    /// The room list is fixed for the lifetime of the loop.
    pub async fn run(
        self,
        refresher: RoomRefresher,
        rooms: Vec<RoomConfig>,
        store: AvailabilityStore,
    ) {
        // The sender stays alive here so recv() only ends on Stop
        let Self {
            config,
            state,
            command_tx: _command_tx,
            mut command_rx,
        } = self;

        // interval() panics on a zero period
        let period = config.refresh_period.max(Duration::from_millis(1));

        info!(
            period_secs = period.as_secs(),
            rooms = rooms.len(),
            "Scheduler started"
        );

        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    run_cycle(&state, period, &refresher, &rooms, &store).await;
                }
                cmd = command_rx.recv() => {
                    match cmd {
                        Some(SchedulerCommand::RefreshNow) => {
                            debug!("Received RefreshNow command");
                            run_cycle(&state, period, &refresher, &rooms, &store).await;
                        }
                        Some(SchedulerCommand::Stop) | None => {
                            info!("Scheduler stopping");
                            break;
                        }
                    }
                }
            }
        }
    }
}

/// Refreshes every room once, each in its own task.
async fn run_cycle(
    state: &SharedSchedulerState,
    period: Duration,
    refresher: &RoomRefresher,
    rooms: &[RoomConfig],
    store: &AvailabilityStore,
) {
    let started = Instant::now();
    let now = Utc::now();
    debug!(rooms = rooms.len(), "Starting refresh cycle");

    let tasks = rooms.iter().cloned().map(|room| {
        let refresher = refresher.clone();
        let store = store.clone();
        let id = room.id.clone();
        let display_name = room.display_name.clone();

        let task = tokio::spawn(async move {
            let record = refresher.refresh(&room, now).await;
            let failed = record.state == RoomState::Error;
            store.set(room.id, record).await;
            failed
        });

        async move { (id, display_name, task.await) }
    });

    let mut errors = 0;
    for (id, display_name, outcome) in join_all(tasks).await {
        match outcome {
            Ok(false) => {}
            Ok(true) => errors += 1,
            Err(e) => {
                error!(
                    kind = "refresh_task",
                    room = %id,
                    error = %e,
                    "Room refresh task died"
                );
                store
                    .set(id, StatusRecord::error(display_name, INTERNAL_ERROR_DETAIL))
                    .await;
                errors += 1;
            }
        }
    }

    let took = started.elapsed();
    if took > period {
        warn!(
            took_ms = took.as_millis() as u64,
            period_ms = period.as_millis() as u64,
            "Refresh cycle overran its period"
        );
    }

    state.write().await.record_cycle(errors, took);
    debug!(
        rooms = rooms.len(),
        errors = errors,
        took_ms = took.as_millis() as u64,
        "Refresh cycle complete"
    );
}

/// Handle for sending commands to a running scheduler.
#[derive(Clone, Debug)]
pub struct SchedulerHandle {
    command_tx: mpsc::Sender<SchedulerCommand>,
    state: SharedSchedulerState,
}

impl SchedulerHandle {
    /// Triggers an extra refresh cycle.
    pub async fn refresh_now(&self) -> Result<(), mpsc::error::SendError<SchedulerCommand>> {
        self.command_tx.send(SchedulerCommand::RefreshNow).await
    }

    /// Stops the scheduler.
    pub async fn stop(&self) -> Result<(), mpsc::error::SendError<SchedulerCommand>> {
        self.command_tx.send(SchedulerCommand::Stop).await
    }

    /// Returns the current scheduler state.
    pub async fn state(&self) -> SchedulerState {
        self.state.read().await.clone()
    }
}
