//! Command-line interface definition.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use roomstatus_core::{TracingConfig, TracingOutputFormat};

use crate::config::default_path;

/// roomstatusd - Meeting room availability for door displays
#[derive(Debug, Parser)]
#[command(name = "roomstatusd")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "ROOMSTATUS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    /// Log output format (pretty, compact, json)
    #[arg(long, env = "ROOMSTATUS_LOG_FORMAT", value_parser = parse_log_format)]
    pub log_format: Option<TracingOutputFormat>,

    /// Listen address, overriding `server.bind` from the configuration
    #[arg(long)]
    pub bind: Option<SocketAddr>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Returns the configuration file to read.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(default_path)
    }

    /// Returns the logging setup selected by the flags.
    ///
    /// Serving with neither `--debug` nor `--log-format` logs JSON.
    pub fn tracing_config(&self) -> TracingConfig {
        if !self.debug && self.log_format.is_none() && self.is_serving() {
            return TracingConfig::daemon();
        }
        let config = if self.debug {
            TracingConfig::debug()
        } else {
            TracingConfig::default()
        };
        match self.log_format {
            Some(format) => config.with_format(format),
            None => config,
        }
    }

    fn is_serving(&self) -> bool {
        matches!(self.command, None | Some(Command::Serve))
    }
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the service in the foreground (default)
    Serve,

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Validate configuration and list the rooms
    Validate,

    /// Show configuration file path
    Path,
}

fn parse_log_format(s: &str) -> Result<TracingOutputFormat, String> {
    s.parse().map_err(|e: roomstatus_core::TracingError| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tracing::Level;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["roomstatusd"]).unwrap();
        assert!(!cli.debug);
        assert!(cli.command.is_none());
        assert!(cli.bind.is_none());
        let tracing = cli.tracing_config();
        assert_eq!(tracing.default_level, Level::INFO);
        assert_eq!(tracing.output_format, TracingOutputFormat::Json);
    }

    #[test]
    fn log_format_overrides_service_default() {
        let cli = Cli::try_parse_from(["roomstatusd", "--log-format", "compact", "serve"]);
        let tracing = cli.unwrap().tracing_config();
        assert_eq!(tracing.default_level, Level::INFO);
        assert_eq!(tracing.output_format, TracingOutputFormat::Compact);
    }

    #[test]
    fn config_commands_keep_human_output() {
        let cli = Cli::try_parse_from(["roomstatusd", "config", "path"]).unwrap();
        assert_ne!(cli.tracing_config().output_format, TracingOutputFormat::Json);
    }

    #[test]
    fn debug_and_format_flags() {
        let cli = Cli::try_parse_from(["roomstatusd", "--debug", "--log-format", "json"]).unwrap();
        let tracing = cli.tracing_config();
        assert_eq!(tracing.default_level, Level::DEBUG);
        assert_eq!(tracing.output_format, TracingOutputFormat::Json);
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        assert!(Cli::try_parse_from(["roomstatusd", "--log-format", "xml"]).is_err());
    }

    #[test]
    fn explicit_config_and_bind() {
        let cli = Cli::try_parse_from([
            "roomstatusd",
            "--config",
            "/etc/roomstatus.toml",
            "--bind",
            "127.0.0.1:8080",
            "config",
            "validate",
        ])
        .unwrap();

        assert_eq!(cli.config_path(), PathBuf::from("/etc/roomstatus.toml"));
        assert_eq!(cli.bind, Some("127.0.0.1:8080".parse().unwrap()));
        assert!(matches!(
            cli.command,
            Some(Command::Config {
                action: ConfigAction::Validate
            })
        ));
    }
}
