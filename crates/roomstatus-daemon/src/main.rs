//! roomstatusd entry point.

use std::process::ExitCode;

use clap::Parser;
use roomstatus_core::init_tracing;
use tracing::error;

use roomstatus_daemon::cli::{Cli, Command, ConfigAction};
use roomstatus_daemon::config::ConfigLoader;
use roomstatus_daemon::error::DaemonResult;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.tracing_config()) {
        eprintln!("error: {}", e);
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "roomstatusd failed");
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> DaemonResult<()> {
    let loader = ConfigLoader::new(cli.config_path());

    match cli.command {
        Some(Command::Config {
            action: ConfigAction::Path,
        }) => {
            println!("config: {}", loader.path().display());
            Ok(())
        }
        Some(Command::Config {
            action: ConfigAction::Validate,
        }) => {
            let config = loader.load()?;
            println!("Configuration is valid.");
            println!("timezone: {}", config.timezone);
            for room in &config.rooms {
                println!("  {}  {}  {}", room.id, room.display_name, room.calendar_url);
            }
            Ok(())
        }
        Some(Command::Serve) | None => {
            let mut config = loader.load()?;
            if let Some(bind) = cli.bind {
                config.server.bind_addr = bind;
            }
            roomstatus_daemon::serve::run(config).await
        }
    }
}
