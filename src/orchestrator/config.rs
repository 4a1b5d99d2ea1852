//! Bootstrap configuration.

use crate::core::{Result, DEFAULT_CORE_ID};
use crate::monitoring::LoggerConfig;
use serde::{Deserialize, Serialize};

/// Configuration handed to the orchestrator at construction.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Id of the orchestrator; plugins connect to it under this id
    pub core_id: String,
    /// Enables `reset()`
    pub debug_mode: bool,
    /// Opaque host data exposed to plugins through the core handle
    pub data: serde_json::Value,
    /// Bootstrap journal settings
    pub log: LoggerConfig,
}

impl BootstrapConfig {
    /// Parse from JSON; missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Enable or disable debug mode.
    pub fn with_debug_mode(mut self, debug_mode: bool) -> Self {
        self.debug_mode = debug_mode;
        self
    }

    /// Set host data.
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            core_id: DEFAULT_CORE_ID.to_string(),
            debug_mode: false,
            data: serde_json::Value::Null,
            log: LoggerConfig::default(),
        }
    }
}
