//! Monitoring Module
//!
//! Provides observability for plugit:
//! - Structured logging through `tracing`
//! - In-memory bootstrap journal

pub mod logging;

pub use logging::{init_tracing, BootstrapLog, LogEntry, LogFormat, LogLevel, LoggerConfig};
