//! Availability store, refresh scheduler, HTTP query server.
//!
//! This crate provides the running parts of the room status service:
//! - An in-memory store of the latest status per room
//! - A refresher that turns one room's calendar into a status record
//! - A fixed-period scheduler that refreshes every room, isolating failures
//! - The HTTP endpoint display devices poll
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use roomstatus_core::RoomConfig;
//! use roomstatus_providers::{IcsCalendarSource, SourceConfig};
//! use roomstatus_server::{
//!     AvailabilityStore, RoomRefresher, Scheduler, SchedulerConfig, SignalHandler,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let tz = chrono_tz::Europe::London;
//!     let source = Arc::new(IcsCalendarSource::new(SourceConfig::new(tz))?);
//!     let refresher = RoomRefresher::new(source, tz, Duration::from_secs(5));
//!     let rooms = vec![RoomConfig::new("aa:bb", "Board Room", "https://example.com/b.ics")];
//!
//!     let store = AvailabilityStore::new();
//!     let scheduler = Scheduler::new(SchedulerConfig::default());
//!     tokio::spawn(scheduler.run(refresher, rooms, store.clone()));
//!
//!     let signals = SignalHandler::new();
//!     signals.spawn_listener();
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:5000").await?;
//!     roomstatus_server::serve(listener, store, signals.shutdown().wait()).await?;
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod http;
mod refresher;
mod scheduler;
mod signals;
mod store;

pub use config::{DEFAULT_BIND_ADDR, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use http::{router, serve};
pub use refresher::{RefreshError, RoomRefresher};
pub use scheduler::{
    Scheduler, SchedulerCommand, SchedulerConfig, SchedulerHandle, SchedulerState,
    SharedSchedulerState, new_scheduler_state,
};
pub use signals::{ShutdownSignal, SignalHandler};
pub use store::{AvailabilityStore, StatusEntry};
