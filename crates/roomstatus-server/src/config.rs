//! Server configuration.

use std::net::SocketAddr;
use std::time::Duration;

/// Address the query server listens on when none is configured.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address of the HTTP query endpoint.
    pub bind_addr: SocketAddr,

    /// Time between refresh cycles.
    pub refresh_period: Duration,

    /// Upper bound on one room's calendar fetch.
    pub fetch_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            refresh_period: Duration::from_secs(10),
            fetch_timeout: Duration::from_secs(5),
        }
    }
}

impl ServerConfig {
    /// Creates a new server configuration listening on the given address.
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            ..Default::default()
        }
    }

    /// Builder: set refresh period.
    pub fn with_refresh_period(mut self, period: Duration) -> Self {
        self.refresh_period = period;
        self
    }

    /// Builder: set fetch timeout.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }
}
