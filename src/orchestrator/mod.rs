//! Orchestrator Module
//!
//! Drives the plugin bootstrap:
//! - Registration and dependency resolution
//! - Resume sequence (start, extend, connect)
//! - Cross-plugin event routing

pub mod config;
pub mod engine;
pub mod handle;
pub mod phase;

pub use config::BootstrapConfig;
pub use engine::{Orchestrator, LOG_MANAGER_POINT};
pub use handle::{BroadcastReport, CoreHandle, RemoteEventOutcome, RemoteEventRequest};
pub use phase::Phase;
