//! WhatsExpense CLI - expense tracking by chat

mod commands;
mod config;
mod logging;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use crate::commands::Commands;
use crate::config::CliConfig;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{Level, debug};
use whatsexpense_http::{ClientError, ExpenseClient, FileTokenStore};

/// Exit code used when the session ended and the user must sign in again
const EXIT_SESSION_EXPIRED: u8 = 2;
const EXIT_FAILURE: u8 = 1;

#[derive(Parser)]
#[command(name = "whatsexpense")]
#[command(about = "Track expenses by chatting with WhatsExpense")]
#[command(version)]
struct Cli {
    /// Set logging level
    #[arg(short = 'l', long, global = true, default_value = "warn")]
    log_level: LogLevel,

    /// Configuration file (defaults to config.toml in the platform config directory)
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// Disable file logging (only log to stderr)
    #[arg(long, global = true)]
    no_file_log: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_file = (!cli.no_file_log).then(|| crate::config::data_dir().join("whatsexpense.log"));
    if let Err(e) = logging::init_logging(cli.log_level.into(), log_file.as_deref()) {
        eprintln!("Failed to open log file, logging to stderr only: {e}");
        logging::init_stderr_logging(cli.log_level.into());
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report(&e),
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = CliConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    debug!(base_url = %config.base_url, "Loaded configuration");

    let mut builder = ExpenseClient::builder()
        .base_url(&config.base_url)
        .token_store(Arc::new(FileTokenStore::new(config.token_file())));
    if let Some(timeout) = config.timeout() {
        builder = builder.timeout(timeout);
    }
    let client = builder.build()?;

    cli.command.execute(&client).await
}

/// Map a failed command to the process exit code
fn exit_code(error: &anyhow::Error) -> u8 {
    match error.downcast_ref::<ClientError>() {
        Some(client_error) if client_error.is_session_expired() => EXIT_SESSION_EXPIRED,
        _ => EXIT_FAILURE,
    }
}

/// The CLI's stand-in for redirecting to the sign-in page
fn report(error: &anyhow::Error) -> ExitCode {
    let code = exit_code(error);
    if code == EXIT_SESSION_EXPIRED {
        eprintln!("Your session has ended. Run `whatsexpense sign-in` to continue.");
    } else {
        debug!("Command failed: {error:?}");
        eprintln!("Something went wrong: {error:#}");
    }
    ExitCode::from(code)
}

#[derive(Clone, Copy, Debug, ValueEnum)]
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expired_session_exits_with_sign_in_code() {
        let error = Err::<(), _>(ClientError::AuthenticationExpired("renewal failed".into()))
            .context("Failed to list messages")
            .unwrap_err();

        assert_eq!(exit_code(&error), EXIT_SESSION_EXPIRED);
    }

    #[test]
    fn rejected_request_is_a_generic_failure() {
        let error = anyhow::Error::from(ClientError::RequestRejected {
            status: 401,
            body: "Invalid credentials".into(),
        });

        assert_eq!(exit_code(&error), EXIT_FAILURE);
    }

    #[test]
    fn other_errors_are_generic_failures() {
        let error = anyhow::anyhow!("Failed to load configuration");
        assert_eq!(exit_code(&error), EXIT_FAILURE);
    }

    #[test]
    fn cli_parses_with_log_level() {
        let cli = Cli::try_parse_from(["whatsexpense", "--log-level", "debug", "me"]).unwrap();
        assert!(matches!(cli.log_level, LogLevel::Debug));
        assert!(matches!(cli.command, Commands::Me));
    }
}
