//! File logging.
//!
//! The terminal belongs to the status line, so diagnostics go to a log file
//! through a non-blocking `tracing_appender` writer. The filter is read from
//! `BLINKCTL_LOG` using `EnvFilter` syntax and defaults to `info`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "BLINKCTL_LOG";

fn filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the global subscriber writing to `log_file`.
///
/// Keep the returned guard alive until exit; dropping it flushes pending lines.
///
/// # Errors
/// Returns an error if the log directory cannot be created or a subscriber
/// is already installed.
pub fn init(log_file: &Path) -> Result<WorkerGuard> {
    let dir = log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = log_file
        .file_name()
        .with_context(|| format!("Log path {} has no file name", log_file.display()))?;
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_writer(writer)
        .with_ansi(false)
        .with_thread_names(true)
        .try_init()
        .map_err(|e| anyhow!("Failed to install log subscriber: {e}"))?;

    Ok(guard)
}
