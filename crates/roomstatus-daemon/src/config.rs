//! Daemon configuration.
//!
//! Everything lives in one TOML file, `~/.config/roomstatus/config.toml` by
//! default:
//!
//! ```toml
//! timezone = "Europe/London"
//!
//! [server]
//! bind = "0.0.0.0:5000"
//! refresh_interval_secs = 10
//! fetch_timeout_secs = 5
//!
//! [[rooms]]
//! mac_address = "aa:bb:cc:dd:ee:ff"
//! name = "Board Room"
//! ical_url = "https://example.com/board.ics"
//! ```
//!
//! The file is read once at startup. [`FileConfig`] mirrors the file as
//! written; [`FileConfig::validate`] turns it into a [`DaemonConfig`] or
//! names the first field that is wrong.

use std::collections::HashSet;
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono_tz::Tz;
use roomstatus_core::{RoomConfig, RoomId};
use roomstatus_server::{DEFAULT_BIND_ADDR, ServerConfig};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

/// Errors raised while loading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file is not valid TOML or has the wrong shape.
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A value is present but unusable.
    #[error("invalid `{field}`: {message}")]
    Invalid { field: String, message: String },
}

impl ConfigError {
    fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// The configuration file as written.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// IANA zone used for end of day and rendered times.
    pub timezone: String,

    /// Server settings.
    #[serde(default)]
    pub server: ServerSettings,

    /// Tracked rooms.
    #[serde(default)]
    pub rooms: Vec<RoomSettings>,
}

/// `[server]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSettings {
    /// Listen address of the query endpoint.
    pub bind: String,

    /// Seconds between refresh cycles.
    pub refresh_interval_secs: u64,

    /// Seconds one calendar fetch may take.
    pub fetch_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND_ADDR.to_string(),
            refresh_interval_secs: 10,
            fetch_timeout_secs: 5,
        }
    }
}

/// One `[[rooms]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoomSettings {
    /// Identifier the display device sends, usually its MAC address.
    pub mac_address: String,

    /// Name shown on the device.
    pub name: String,

    /// iCalendar feed of the room.
    pub ical_url: String,
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// Zone rooms are evaluated in.
    pub timezone: Tz,

    /// Query endpoint and refresh settings.
    pub server: ServerConfig,

    /// Tracked rooms, in file order.
    pub rooms: Vec<RoomConfig>,
}

impl FileConfig {
    /// Checks every value and converts to the runtime configuration.
    pub fn validate(self) -> Result<DaemonConfig, ConfigError> {
        let timezone: Tz = self.timezone.trim().parse().map_err(|_| {
            ConfigError::invalid(
                "timezone",
                format!("unknown time zone '{}'", self.timezone),
            )
        })?;

        let server = self.server.validate()?;

        if self.rooms.is_empty() {
            return Err(ConfigError::invalid(
                "rooms",
                "at least one room must be configured",
            ));
        }

        let mut seen = HashSet::new();
        let mut rooms = Vec::with_capacity(self.rooms.len());
        for (index, room) in self.rooms.into_iter().enumerate() {
            let room = room.validate(index)?;
            if !seen.insert(room.id.clone()) {
                return Err(ConfigError::invalid(
                    format!("rooms[{index}].mac_address"),
                    format!("duplicate room identifier {}", room.id),
                ));
            }
            rooms.push(room);
        }

        Ok(DaemonConfig {
            timezone,
            server,
            rooms,
        })
    }
}

impl ServerSettings {
    fn validate(&self) -> Result<ServerConfig, ConfigError> {
        let bind_addr: SocketAddr = self.bind.trim().parse().map_err(|_| {
            ConfigError::invalid(
                "server.bind",
                format!("'{}' is not a socket address", self.bind),
            )
        })?;

        if self.refresh_interval_secs == 0 {
            return Err(ConfigError::invalid(
                "server.refresh_interval_secs",
                "must be greater than zero",
            ));
        }
        if self.fetch_timeout_secs == 0 {
            return Err(ConfigError::invalid(
                "server.fetch_timeout_secs",
                "must be greater than zero",
            ));
        }

        Ok(ServerConfig::new(bind_addr)
            .with_refresh_period(Duration::from_secs(self.refresh_interval_secs))
            .with_fetch_timeout(Duration::from_secs(self.fetch_timeout_secs)))
    }
}

impl RoomSettings {
    fn validate(self, index: usize) -> Result<RoomConfig, ConfigError> {
        let field = |name: &str| format!("rooms[{index}].{name}");

        if self.mac_address.trim().is_empty() {
            return Err(ConfigError::invalid(field("mac_address"), "must not be empty"));
        }
        if self.name.trim().is_empty() {
            return Err(ConfigError::invalid(field("name"), "must not be empty"));
        }

        let url = Url::parse(&self.ical_url)
            .map_err(|e| ConfigError::invalid(field("ical_url"), e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::invalid(
                field("ical_url"),
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }

        Ok(RoomConfig::new(
            RoomId::new(&self.mac_address),
            self.name,
            self.ical_url,
        ))
    }
}

/// Reads and validates the configuration file.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    path: PathBuf,
}

impl ConfigLoader {
    /// Creates a loader for the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a loader for [`default_path`].
    pub fn from_default_location() -> Self {
        Self::new(default_path())
    }

    /// Returns the file this loader reads.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads and validates the configuration.
    pub fn load(&self) -> Result<DaemonConfig, ConfigError> {
        debug!(path = %self.path.display(), "Loading configuration");

        let content = std::fs::read_to_string(&self.path).map_err(|source| ConfigError::Read {
            path: self.path.clone(),
            source,
        })?;
        let file: FileConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: self.path.clone(),
            source,
        })?;
        let config = file.validate()?;

        info!(
            path = %self.path.display(),
            rooms = config.rooms.len(),
            timezone = %config.timezone,
            "Configuration loaded"
        );
        Ok(config)
    }
}

/// Returns the default configuration file path.
pub fn default_path() -> PathBuf {
    default_config_dir().join("config.toml")
}

/// Returns the default configuration directory.
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("roomstatus")
}
