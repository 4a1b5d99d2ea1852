//! Plugin Module
//!
//! Provides the plugin base abstraction:
//! - Plugin interface
//! - Extension points and declared connections
//! - Connection contracts

pub mod contract;
pub mod extensible;
pub mod interface;

pub use contract::{
    Capability, CapabilityKind, ConnectionRequest, ConnectionResponse, ContractRequirement,
};
pub use extensible::{Arity, Attachment, DeclaredConnection, Extensible, ExtensionPointSpec};
pub use interface::{Plugin, PluginRef};
