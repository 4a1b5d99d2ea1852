//! Structured logging for plugit.
//!
//! Every bootstrap step is emitted through `tracing` and also kept in a
//! bounded in-memory journal so a host can dump what happened during
//! composition after the fact.

use crate::core::{now, Timestamp};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use tracing_subscriber::EnvFilter;

/// Log level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level (most verbose)
    Trace = 0,
    /// Debug level
    Debug = 1,
    /// Info level
    Info = 2,
    /// Warning level
    Warn = 3,
    /// Error level
    Error = 4,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "TRACE"),
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// A structured log entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LogEntry {
    /// Timestamp
    pub timestamp: Timestamp,
    /// Log level
    pub level: LogLevel,
    /// Message
    pub message: String,
    /// Structured fields
    pub fields: HashMap<String, serde_json::Value>,
}

impl LogEntry {
    /// Create a new log entry.
    pub fn new(level: LogLevel, message: &str) -> Self {
        Self {
            timestamp: now(),
            level,
            message: message.to_string(),
            fields: HashMap::new(),
        }
    }

    /// Add a field.
    pub fn with_field(mut self, key: &str, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.fields.insert(key.to_string(), v);
        }
        self
    }

    /// Format as JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Format as text.
    pub fn to_text(&self) -> String {
        let mut keys: Vec<_> = self.fields.keys().collect();
        keys.sort();
        let fields_str: String = keys
            .into_iter()
            .map(|k| format!(" {}={}", k, self.fields[k]))
            .collect();

        format!(
            "{} {} {}{}",
            self.timestamp.to_rfc3339(),
            self.level,
            self.message,
            fields_str
        )
    }
}

/// Log output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Plain text
    Text,
    /// JSON
    Json,
}

/// Journal configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Minimum level kept in the journal
    pub level: LogLevel,
    /// Format used by `dump`
    pub format: LogFormat,
    /// Maximum number of kept entries
    pub max_entries: usize,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Debug,
            format: LogFormat::Text,
            max_entries: 1000,
        }
    }
}

/// Bounded journal of bootstrap activity.
#[derive(Debug)]
pub struct BootstrapLog {
    /// Configuration
    config: LoggerConfig,
    /// Kept entries, oldest first
    buffer: RefCell<VecDeque<LogEntry>>,
}

impl BootstrapLog {
    /// Create a new journal.
    pub fn new(config: LoggerConfig) -> Self {
        Self {
            config,
            buffer: RefCell::new(VecDeque::new()),
        }
    }

    /// Record an entry and forward it to `tracing`.
    pub fn log(&self, entry: LogEntry) {
        match entry.level {
            LogLevel::Trace => tracing::trace!(fields = ?entry.fields, "{}", entry.message),
            LogLevel::Debug => tracing::debug!(fields = ?entry.fields, "{}", entry.message),
            LogLevel::Info => tracing::info!(fields = ?entry.fields, "{}", entry.message),
            LogLevel::Warn => tracing::warn!(fields = ?entry.fields, "{}", entry.message),
            LogLevel::Error => tracing::error!(fields = ?entry.fields, "{}", entry.message),
        }

        if entry.level < self.config.level || self.config.max_entries == 0 {
            return;
        }

        let mut buffer = self.buffer.borrow_mut();
        if buffer.len() >= self.config.max_entries {
            buffer.pop_front();
        }
        buffer.push_back(entry);
    }

    /// Log at debug level.
    pub fn debug(&self, message: &str) {
        self.log(LogEntry::new(LogLevel::Debug, message));
    }

    /// Log at info level.
    pub fn info(&self, message: &str) {
        self.log(LogEntry::new(LogLevel::Info, message));
    }

    /// Log at warn level.
    pub fn warn(&self, message: &str) {
        self.log(LogEntry::new(LogLevel::Warn, message));
    }

    /// Get kept entries.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.buffer.borrow().iter().cloned().collect()
    }

    /// Get kept entries at or above a level.
    pub fn entries_at_level(&self, min_level: LogLevel) -> Vec<LogEntry> {
        self.buffer
            .borrow()
            .iter()
            .filter(|e| e.level >= min_level)
            .cloned()
            .collect()
    }

    /// Render kept entries in the configured format.
    pub fn dump(&self) -> Vec<String> {
        self.buffer
            .borrow()
            .iter()
            .map(|entry| match self.config.format {
                LogFormat::Text => entry.to_text(),
                LogFormat::Json => entry.to_json(),
            })
            .collect()
    }

    /// Clear the journal.
    pub fn clear(&self) {
        self.buffer.borrow_mut().clear();
    }
}

impl Default for BootstrapLog {
    fn default() -> Self {
        Self::new(LoggerConfig::default())
    }
}

/// Install a global `tracing` subscriber writing to stderr.
///
/// `RUST_LOG` takes precedence over `default_directive`. Does nothing if a
/// subscriber is already installed.
pub fn init_tracing(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
