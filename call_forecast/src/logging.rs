//! Process-wide logging for the data tank and the strategies
//!
//! Components do not call `tracing` directly. They hold an [`ErrorLog`]
//! handle, which forwards to a [`LogSink`]. The default sink emits `tracing`
//! events; tests swap in a [`MemorySink`] to capture lines or a [`NullSink`]
//! to mute them.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

/// Severity channel of a log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Debug,
    Info,
}

/// One log line, tagged with where it came from
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub level: LogLevel,
    /// Component that emitted the line, e.g. `data_tank`
    pub component: String,
    /// Operation inside the component, e.g. `DataTank::load_data`
    pub operation: String,
    /// Short summary
    pub message: String,
    /// Underlying error, ERROR channel only
    pub detail: Option<String>,
}

/// Destination for log lines
pub trait LogSink: Send + Sync + fmt::Debug {
    fn emit(&self, entry: LogEntry);
}

/// Forwards every line to the `tracing` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn emit(&self, entry: LogEntry) {
        let LogEntry {
            level,
            component,
            operation,
            message,
            detail,
        } = entry;

        match (level, detail) {
            (LogLevel::Error, Some(detail)) => tracing::error!(
                component = %component,
                operation = %operation,
                detail = %detail,
                "{}",
                message
            ),
            (LogLevel::Error, None) => {
                tracing::error!(component = %component, operation = %operation, "{}", message)
            }
            (LogLevel::Debug, _) => {
                tracing::debug!(component = %component, operation = %operation, "{}", message)
            }
            (LogLevel::Info, _) => {
                tracing::info!(component = %component, operation = %operation, "{}", message)
            }
        }
    }
}

/// Keeps every line in memory
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the captured lines
    pub fn entries(&self) -> Vec<LogEntry> {
        match self.entries.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Captured lines of one severity
    pub fn entries_at(&self, level: LogLevel) -> Vec<LogEntry> {
        self.entries()
            .into_iter()
            .filter(|entry| entry.level == level)
            .collect()
    }
}

impl LogSink for MemorySink {
    fn emit(&self, entry: LogEntry) {
        match self.entries.lock() {
            Ok(mut guard) => guard.push(entry),
            Err(poisoned) => poisoned.into_inner().push(entry),
        }
    }
}

/// Drops every line
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl LogSink for NullSink {
    fn emit(&self, _entry: LogEntry) {}
}

/// Cloneable logging handle injected into components
#[derive(Debug, Clone)]
pub struct ErrorLog {
    sink: Arc<dyn LogSink>,
}

impl Default for ErrorLog {
    fn default() -> Self {
        Self::new(TracingSink)
    }
}

impl ErrorLog {
    /// Create a handle writing to `sink`
    pub fn new<S: LogSink + 'static>(sink: S) -> Self {
        Self {
            sink: Arc::new(sink),
        }
    }

    /// A handle that discards everything
    pub fn muted() -> Self {
        Self::new(NullSink)
    }

    pub fn error(
        &self,
        component: &str,
        operation: &str,
        message: &str,
        detail: Option<&dyn fmt::Display>,
    ) {
        self.emit(
            LogLevel::Error,
            component,
            operation,
            message,
            detail.map(|d| d.to_string()),
        );
    }

    pub fn debug(&self, component: &str, operation: &str, message: &str) {
        self.emit(LogLevel::Debug, component, operation, message, None);
    }

    pub fn info(&self, component: &str, operation: &str, message: &str) {
        self.emit(LogLevel::Info, component, operation, message, None);
    }

    /// Pass `result` through, logging an ERROR line with the error as detail
    /// when it failed
    pub fn trap<T>(
        &self,
        component: &str,
        operation: &str,
        message: &str,
        result: Result<T>,
    ) -> Result<T> {
        if let Err(err) = &result {
            self.error(component, operation, message, Some(err));
        }
        result
    }

    fn emit(
        &self,
        level: LogLevel,
        component: &str,
        operation: &str,
        message: &str,
        detail: Option<String>,
    ) {
        self.sink.emit(LogEntry {
            level,
            component: component.to_string(),
            operation: operation.to_string(),
            message: message.to_string(),
            detail,
        });
    }
}

/// Settings for the global `tracing` subscriber
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive, e.g. `info` or `call_forecast=debug`
    pub level: String,
    /// Colourised output
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            ansi: false,
        }
    }
}

/// Install the global fmt subscriber.
///
/// `RUST_LOG` wins over `config.level` when set. Returns `false` when a
/// subscriber was already installed; the existing one stays in place.
pub fn init_tracing(config: &LogConfig) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(config.ansi)
        .try_init()
        .is_ok()
}
