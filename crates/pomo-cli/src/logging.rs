use anyhow::{Context, Result, anyhow};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Routes `tracing` output to a daily-rolling file under `logs_dir`, leaving
/// the terminal to the timer.
///
/// # Arguments
///
/// * `level` - Explicit filter; otherwise `RUST_LOG`, otherwise `info`
///
/// # Returns
///
/// A guard that flushes buffered log lines when dropped. Keep it alive for
/// the whole run.
pub fn init(logs_dir: &Path, level: Option<&str>) -> Result<WorkerGuard> {
    std::fs::create_dir_all(logs_dir)
        .with_context(|| format!("Failed to create log directory {}", logs_dir.display()))?;

    let appender = tracing_appender::rolling::daily(logs_dir, "pomo.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = match level {
        Some(level) => EnvFilter::try_new(level).with_context(|| format!("Invalid log level '{}'", level))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    Ok(guard)
}
