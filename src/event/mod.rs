//! Event Module
//!
//! Observable mixin shared by every plugin and by the orchestrator.

pub mod bus;

pub use bus::{EventBus, EventCallback, EventPayload};
