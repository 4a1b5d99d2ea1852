//! Plugin interface definition.
//!
//! Defines the interface plugins must implement.

use crate::core::{Error, Result};
use crate::orchestrator::CoreHandle;
use crate::plugin::contract::{ConnectionRequest, ConnectionResponse};
use crate::plugin::extensible::Extensible;
use std::rc::Rc;

/// Shared reference to a registered plugin.
pub type PluginRef = Rc<dyn Plugin>;

/// Plugin trait that all plugins must implement.
///
/// Hooks take `&self`; plugins keep mutable state behind `Cell`/`RefCell`
/// since the orchestrator and other plugins hold shared references.
pub trait Plugin {
    /// Extension points, connections, dependencies and events of this plugin.
    fn extensible(&self) -> &Extensible;

    /// Plugin id.
    fn id(&self) -> &str {
        self.extensible().id()
    }

    /// Called once by the orchestrator during the resume sequence.
    ///
    /// This is the only moment the orchestrator presents itself to the
    /// plugin; keep the handle to reach other plugins' events later.
    fn start(&self, _core: CoreHandle) -> Result<()> {
        Err(Error::NotImplemented {
            plugin: self.id().to_string(),
            hook: "start",
        })
    }

    /// Called by the owner of an extension point this plugin is attached to.
    fn connect(&self, _request: &ConnectionRequest) -> Result<Option<ConnectionResponse>> {
        Err(Error::NotImplemented {
            plugin: self.id().to_string(),
            hook: "connect",
        })
    }
}
