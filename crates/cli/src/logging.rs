use anyhow::Result;
use std::fs::OpenOptions;
use std::path::Path;
use tracing::Level;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_FILE: &str = "churn.log";

/// Initialize logging for the CLI
///
/// Logs go to stderr so command output on stdout stays clean. Unless
/// `log_dir` is `None`, they are also appended to `<log_dir>/churn.log`.
pub fn init_logging(log_level: Level, log_dir: Option<&Path>) -> Result<()> {
    let env_filter = default_filter(log_level);

    match log_dir {
        None => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let log_file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(dir.join(LOG_FILE))?;

            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(log_file)
                        .with_ansi(false),
                )
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    Ok(())
}

/// `RUST_LOG` wins over the `--log-level` flag
fn default_filter(level: Level) -> EnvFilter {
    let level_str = level.as_str().to_lowercase();
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("churn={level_str},churn_http={level_str},churn_session={level_str}").into()
    })
}
