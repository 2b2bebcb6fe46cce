//! Record and level types shared by [`Logger`](super::Logger) and the
//! subscriber setup.

use std::sync::Arc;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Severity of a [`LogRecord`]; also the `[logging] level` setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Lowercase name, as written in settings and accepted by `EnvFilter`.
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

/// One message recorded by a [`Logger`](super::Logger).
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub level: LogLevel,
    /// Component that emitted the message (e.g. "store", "encode").
    pub component: String,
    pub message: String,
    pub timestamp: DateTime<Local>,
}

impl LogRecord {
    /// Render as a single display line.
    pub fn format(&self) -> String {
        format!(
            "[{}] {:<5} {}: {}",
            self.timestamp.format("%H:%M:%S"),
            self.level.as_filter_str().to_uppercase(),
            self.component,
            self.message
        )
    }
}

/// Callback receiving every record that passes the level filter.
///
/// Front ends use this to route messages into their own display; it is
/// called from whichever thread logged the record.
pub type LogCallback = Arc<dyn Fn(&LogRecord) + Send + Sync>;
