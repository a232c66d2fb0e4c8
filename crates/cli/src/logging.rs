use anyhow::Result;
use std::fs::OpenOptions;
use std::path::Path;
use tracing::Level;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging for the CLI
///
/// `RUST_LOG` takes precedence over `log_level`. Unless `log_file` is `None`
/// the log is also written there, without colors.
pub fn init_logging(log_level: Level, log_file: Option<&Path>) -> Result<()> {
    match log_file {
        Some(log_file_path) => {
            if let Some(parent) = log_file_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let log_file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_file_path)?;

            tracing_subscriber::registry()
                .with(env_filter(log_level))
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(log_file)
                        .with_ansi(false),
                )
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
        None => init_stderr_logging(log_level),
    }

    Ok(())
}

/// Initialize logging to stderr only
pub fn init_stderr_logging(log_level: Level) {
    tracing_subscriber::registry()
        .with(env_filter(log_level))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn env_filter(log_level: Level) -> EnvFilter {
    let level_str = log_level.as_str().to_lowercase();
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("whatsexpense={level_str},whatsexpense_http={level_str}").into()
    })
}
