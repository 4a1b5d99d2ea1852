//! Bootstrap phases.

use serde::{Deserialize, Serialize};

/// Bootstrap phase, in the order phases are entered.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Plugins are being registered
    #[default]
    Load,
    /// Dependencies resolved
    Compiled,
    /// Every plugin received `start`
    Started,
    /// Declared connections attached
    Extended,
    /// Connect handshake delivered
    Connected,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Load => write!(f, "LOAD"),
            Phase::Compiled => write!(f, "COMPILE"),
            Phase::Started => write!(f, "START"),
            Phase::Extended => write!(f, "EXTEND"),
            Phase::Connected => write!(f, "CONNECT"),
        }
    }
}
