//! Injectable logger with tracing forwarding and a tail buffer.
//!
//! Each component gets a `Logger` handed to it instead of reaching for a
//! process-wide logger. Every record:
//! - is forwarded to `tracing`
//! - is sent to the callback (if any)
//! - is kept in a bounded tail buffer shared by all child loggers

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::Local;
use parking_lot::Mutex;

use super::types::{LogCallback, LogLevel, LogRecord};

/// Default number of records kept in the tail buffer.
pub const DEFAULT_TAIL_CAPACITY: usize = 200;

/// Cloneable logging capability.
#[derive(Clone)]
pub struct Logger {
    /// Component name attached to each record.
    component: Arc<str>,
    /// Minimum level recorded.
    level: LogLevel,
    /// Optional sink for front ends.
    callback: Option<LogCallback>,
    /// Recent records, shared between a logger and its children.
    tail: Arc<Mutex<VecDeque<LogRecord>>>,
    /// Maximum records kept in `tail`.
    tail_capacity: usize,
}

impl Logger {
    /// Create a logger for a component.
    pub fn new(component: impl AsRef<str>) -> Self {
        Self {
            component: Arc::from(component.as_ref()),
            level: LogLevel::Info,
            callback: None,
            tail: Arc::new(Mutex::new(VecDeque::with_capacity(DEFAULT_TAIL_CAPACITY))),
            tail_capacity: DEFAULT_TAIL_CAPACITY,
        }
    }

    /// Set the minimum level.
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Set the callback.
    pub fn with_callback(mut self, callback: LogCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    /// Set how many records the tail buffer keeps.
    pub fn with_tail_capacity(mut self, capacity: usize) -> Self {
        self.tail_capacity = capacity.max(1);
        self
    }

    /// Create a logger for a sub-component sharing level, callback and tail.
    pub fn child(&self, component: impl AsRef<str>) -> Self {
        Self {
            component: Arc::from(component.as_ref()),
            ..self.clone()
        }
    }

    /// Get the component name.
    pub fn component(&self) -> &str {
        &self.component
    }

    /// Record `message` if `level` passes the filter.
    pub fn log(&self, level: LogLevel, message: &str) {
        if level < self.level {
            return;
        }

        let component: &str = &self.component;
        match level {
            LogLevel::Trace => tracing::trace!(component = %component, "{}", message),
            LogLevel::Debug => tracing::debug!(component = %component, "{}", message),
            LogLevel::Info => tracing::info!(component = %component, "{}", message),
            LogLevel::Warn => tracing::warn!(component = %component, "{}", message),
            LogLevel::Error => tracing::error!(component = %component, "{}", message),
        }

        let record = LogRecord {
            level,
            component: component.to_string(),
            message: message.to_string(),
            timestamp: Local::now(),
        };

        if let Some(ref callback) = self.callback {
            callback(&record);
        }

        let mut tail = self.tail.lock();
        if tail.len() >= self.tail_capacity {
            tail.pop_front();
        }
        tail.push_back(record);
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message);
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }

    /// Get the current tail buffer contents, oldest first.
    pub fn records(&self) -> Vec<LogRecord> {
        self.tail.lock().iter().cloned().collect()
    }

    /// Get recorded messages at exactly `level`.
    pub fn messages_at(&self, level: LogLevel) -> Vec<String> {
        self.tail
            .lock()
            .iter()
            .filter(|r| r.level == level)
            .map(|r| r.message.clone())
            .collect()
    }

    /// Drop every buffered record (shared with children).
    pub fn clear(&self) {
        self.tail.lock().clear();
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new("coder")
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("component", &self.component)
            .field("level", &self.level)
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex as TestMutex;

    #[test]
    fn records_messages_above_level() {
        let logger = Logger::new("test").with_level(LogLevel::Info);

        logger.debug("hidden");
        logger.info("shown");
        logger.error("broken");

        let records = logger.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].message, "shown");
        assert_eq!(logger.messages_at(LogLevel::Error), vec!["broken"]);
    }

    #[test]
    fn callback_sees_filtered_records_with_component() {
        let seen = Arc::new(TestMutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callback: LogCallback = Arc::new(move |record: &LogRecord| {
            sink.lock().push(format!("{}:{}", record.component, record.message));
        });

        let logger = Logger::new("store")
            .with_level(LogLevel::Warn)
            .with_callback(callback);
        logger.info("loaded");
        logger.child("encode").warn("skipped");

        assert_eq!(*seen.lock(), vec!["encode:skipped".to_string()]);
    }

    #[test]
    fn children_share_tail() {
        let parent = Logger::new("parent");
        let child = parent.child("child");

        child.warn("from child");

        let records = parent.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].component, "child");
    }

    #[test]
    fn tail_keeps_newest_records() {
        let logger = Logger::new("supervisor").with_tail_capacity(3);
        for job in ["a", "b", "c", "d"] {
            logger.info(&format!("job {} done", job));
        }

        let messages: Vec<_> = logger.records().into_iter().map(|r| r.message).collect();
        assert_eq!(messages, ["job b done", "job c done", "job d done"]);

        logger.clear();
        assert!(logger.records().is_empty());
    }
}
