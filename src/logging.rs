use anyhow::{Context, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Variable that overrides the configured log filter
pub const LOG_ENV: &str = "FLOWCHAT_LOG";

/// Install a file-backed subscriber. The terminal belongs to the UI, so
/// nothing is written to stdout or stderr.
///
/// Keep the returned guard alive for the life of the program; dropping it
/// flushes pending lines.
pub fn init(log_dir: &Path, default_filter: &str) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir).context("Failed to create log directory")?;

    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(default_filter))
        .context("Invalid log filter")?;

    let appender = tracing_appender::rolling::daily(log_dir, "flowchat.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false).with_target(false))
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}
