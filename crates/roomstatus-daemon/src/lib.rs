//! Configuration loading, CLI and wiring for `roomstatusd`.
//!
//! The binary reads one TOML file at startup, refreshes every room's
//! calendar on a fixed period and answers `GET /rooms/{id}` with the room's
//! three-line status.

pub mod cli;
pub mod config;
pub mod error;
pub mod serve;

pub use cli::Cli;
pub use config::{ConfigError, ConfigLoader, DaemonConfig};
pub use error::{DaemonError, DaemonResult};
