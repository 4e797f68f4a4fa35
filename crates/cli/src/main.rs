//! churn - command line console for the churn analytics API

mod commands;
mod config;
mod logging;
mod state_dir;

use anyhow::Result;
use churn_http::ClientError;
use clap::{Parser, ValueEnum};
use commands::Commands;
use config::ConsoleConfig;
use state_dir::StateDir;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{Level, debug, error};

#[derive(Parser)]
#[command(name = "churn")]
#[command(about = "Client churn analytics console")]
#[command(version)]
struct Cli {
    /// Set logging level
    #[arg(short = 'l', long, global = true, default_value = "warn")]
    log_level: LogLevel,

    /// Configuration file (TOML, YAML or JSON)
    #[arg(short = 'c', long, global = true, env = "CHURN_CONFIG")]
    config: Option<PathBuf>,

    /// Directory for the session file, logs and default config
    #[arg(short = 'd', long, global = true, env = "CHURN_STATE_DIR")]
    state_dir: Option<PathBuf>,

    /// Timeout for the whole command in seconds (0 = no timeout)
    #[arg(short = 't', long, global = true, default_value = "60")]
    timeout: u64,

    /// Disable file logging (only log to stderr)
    #[arg(long, global = true)]
    no_file_log: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let state = cli
        .state_dir
        .map_or_else(StateDir::new, StateDir::with_override);

    let log_dir = (!cli.no_file_log).then(|| state.log_dir());
    logging::init_logging(cli.log_level.into(), log_dir.as_deref())?;

    let config_file = cli.config.or_else(|| state.default_config_file());
    let config = ConsoleConfig::load(config_file.as_deref())?;
    debug!(base_url = %config.api.base_url, "Loaded configuration");

    let run = cli.command.execute(config, state);

    // Execute command with optional timeout
    let outcome = if cli.timeout == 0 {
        run.await
    } else {
        match tokio::time::timeout(Duration::from_secs(cli.timeout), run).await {
            Ok(outcome) => outcome,
            Err(_) => {
                error!("Command timed out after {} seconds", cli.timeout);
                std::process::exit(1);
            }
        }
    };

    if let Err(e) = outcome {
        error!("Command failed: {e:#}");
        eprintln!("error: {e:#}");
        if e
            .downcast_ref::<ClientError>()
            .is_some_and(ClientError::is_unauthorized)
        {
            eprintln!("hint: the session has ended, run `churn login` again");
        }
        std::process::exit(1);
    }

    Ok(())
}

#[derive(Clone, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(log_level: LogLevel) -> Self {
        match log_level {
            LogLevel::Error => Self::ERROR,
            LogLevel::Warn => Self::WARN,
            LogLevel::Info => Self::INFO,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Trace => Self::TRACE,
        }
    }
}
