//! Daemon error types.

use roomstatus_core::TracingError;
use roomstatus_providers::ProviderError;
use roomstatus_server::ServerError;
use thiserror::Error;

use crate::config::ConfigError;

/// Result type for daemon operations.
pub type DaemonResult<T> = Result<T, DaemonError>;

/// Errors that stop the daemon.
///
/// All of these happen at startup or while serving; refresh failures never
/// surface here.
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Logging could not be set up.
    #[error("logging setup failed: {0}")]
    Tracing(#[from] TracingError),

    /// The calendar source could not be created.
    #[error("calendar source setup failed: {0}")]
    Provider(#[from] ProviderError),

    /// The query server failed.
    #[error(transparent)]
    Server(#[from] ServerError),
}
