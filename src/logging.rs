// src/logging.rs

//! Logging setup for `eye` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `EYE_LOG` environment variable (e.g. "info", "debug")
//! 3. `error` in quiet mode, `info` otherwise
//!
//! Logs are sent to STDERR so that stdout carries only the command's output.

use anyhow::Result;
use tracing::Level;
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

/// Initialise global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>, quiet: bool) -> Result<()> {
    let level = resolve_level(cli_level, std::env::var("EYE_LOG").ok().as_deref(), quiet);

    fmt()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialise logging: {e}"))?;

    Ok(())
}

fn resolve_level(cli_level: Option<LogLevel>, env: Option<&str>, quiet: bool) -> Level {
    cli_level
        .map(Level::from)
        .or_else(|| env.and_then(|raw| raw.trim().parse().ok()))
        .unwrap_or(if quiet { Level::ERROR } else { Level::INFO })
}

impl From<LogLevel> for Level {
    fn from(lvl: LogLevel) -> Self {
        match lvl {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}
