//! Logging for Batch Coder.
//!
//! Components receive a [`Logger`] instead of writing to a global sink, so a
//! caller (or a test) can read back what the store, the supervisors and the
//! orchestrator reported. Every record is also forwarded to `tracing`, whose
//! subscriber is installed here.
//!
//! # Example
//!
//! ```no_run
//! use coder_core::logging::{init_tracing, Logger, LogLevel};
//!
//! init_tracing(LogLevel::Info);
//!
//! let logger = Logger::new("store");
//! logger.info("Loaded 3 jobs");
//! logger.warn("Ignoring unknown job 'x'");
//! ```

mod logger;
mod types;

pub use logger::{Logger, DEFAULT_TAIL_CAPACITY};
pub use types::{LogCallback, LogLevel, LogRecord};

use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Name of the application log file inside the logs folder.
pub const APP_LOG_FILE: &str = "batch-coder.log";

/// Install the global subscriber, writing to stderr.
///
/// `RUST_LOG` wins over `default_level` when set. Call once, early in `main`.
pub fn init_tracing(default_level: LogLevel) {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(io::stderr))
        .with(env_filter(default_level))
        .init();
}

/// Like [`init_tracing`], plus an uncoloured copy in `logs_dir/batch-coder.log`.
///
/// Hold the returned guard until exit or buffered lines are lost.
pub fn init_tracing_with_file(default_level: LogLevel, logs_dir: &Path) -> io::Result<WorkerGuard> {
    std::fs::create_dir_all(logs_dir)?;

    let file_appender = tracing_appender::rolling::never(logs_dir, APP_LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(io::stderr))
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .with(env_filter(default_level))
        .init();

    Ok(guard)
}

/// Warnings and errors only, captured by the test harness. Safe to call repeatedly.
#[cfg(test)]
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}

fn env_filter(default_level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level.as_filter_str()))
}
