//! Plugin base: extension points, declared connections and dependencies.
//!
//! An extension point is a named slot on a plugin where other plugins
//! attach. A plugin may only attach to a point it declared a connection to,
//! and every attached plugin receives the point's interface exactly once
//! through [`Plugin::connect`].

use crate::core::{Error, Result};
use crate::event::EventBus;
use crate::plugin::contract::{ConnectionRequest, ConnectionResponse, ContractRequirement};
use crate::plugin::interface::{Plugin, PluginRef};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tracing::{debug, warn};

/// How many plugins an extension point accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arity {
    /// One plugin; a later attachment replaces the earlier one
    Single,
    /// Any number of plugins, in attachment order
    Multi,
}

/// Definition of an extension point.
#[derive(Clone, Debug)]
pub struct ExtensionPointSpec {
    /// Point name
    pub name: String,
    /// Accepted number of plugins
    pub arity: Arity,
    /// Interface handed to attached plugins
    pub interface: ConnectionRequest,
}

impl ExtensionPointSpec {
    /// Create a definition.
    pub fn new(name: &str, arity: Arity, interface: ConnectionRequest) -> Self {
        Self {
            name: name.to_string(),
            arity,
            interface,
        }
    }
}

/// Intent to attach to `extension_point` on `target_plugin_id`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredConnection {
    /// Plugin to extend
    pub target_plugin_id: String,
    /// Extension point on that plugin
    pub extension_point: String,
    /// Contract expected from the point's interface
    #[serde(default)]
    pub requirement: Option<ContractRequirement>,
}

impl DeclaredConnection {
    /// Create a declaration without contract requirement.
    pub fn new(target_plugin_id: &str, extension_point: &str) -> Self {
        Self {
            target_plugin_id: target_plugin_id.to_string(),
            extension_point: extension_point.to_string(),
            requirement: None,
        }
    }

    /// Require a contract shape from the target interface.
    pub fn with_requirement(mut self, requirement: ContractRequirement) -> Self {
        self.requirement = Some(requirement);
        self
    }

    fn matches(&self, target_plugin_id: &str, extension_point: &str) -> bool {
        self.target_plugin_id == target_plugin_id && self.extension_point == extension_point
    }
}

/// Plugins currently attached to an extension point.
#[derive(Clone)]
pub enum Attachment {
    /// Single point, possibly empty
    Single(Option<PluginRef>),
    /// Multi point, in attachment order
    Multi(Vec<PluginRef>),
}

impl Attachment {
    /// Attached plugins as a list.
    pub fn plugins(&self) -> Vec<PluginRef> {
        match self {
            Attachment::Single(plugin) => plugin.iter().cloned().collect(),
            Attachment::Multi(plugins) => plugins.clone(),
        }
    }

    /// Ids of the attached plugins.
    pub fn ids(&self) -> Vec<String> {
        self.plugins().iter().map(|p| p.id().to_string()).collect()
    }

    /// Check whether nothing is attached.
    pub fn is_empty(&self) -> bool {
        match self {
            Attachment::Single(plugin) => plugin.is_none(),
            Attachment::Multi(plugins) => plugins.is_empty(),
        }
    }
}

impl std::fmt::Debug for Attachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Attachment::Single(_) => f.debug_tuple("Single").field(&self.ids()).finish(),
            Attachment::Multi(_) => f.debug_tuple("Multi").field(&self.ids()).finish(),
        }
    }
}

struct AttachedPlugin {
    plugin: PluginRef,
    connected: bool,
}

impl AttachedPlugin {
    fn is(&self, plugin: &PluginRef) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.plugin), Rc::as_ptr(plugin))
    }
}

struct ExtensionPoint {
    arity: Arity,
    interface: ConnectionRequest,
    attachments: Vec<AttachedPlugin>,
    connected: bool,
    responses: Vec<ConnectionResponse>,
}

impl ExtensionPoint {
    fn new(spec: ExtensionPointSpec) -> Self {
        Self {
            arity: spec.arity,
            interface: spec.interface,
            attachments: Vec::new(),
            connected: false,
            responses: Vec::new(),
        }
    }

    fn live(&self) -> Vec<PluginRef> {
        self.attachments.iter().map(|a| Rc::clone(&a.plugin)).collect()
    }

    fn view(&self) -> Attachment {
        match self.arity {
            Arity::Single => Attachment::Single(self.live().into_iter().next()),
            Arity::Multi => Attachment::Multi(self.live()),
        }
    }
}

/// Composition state every plugin carries.
pub struct Extensible {
    /// Plugin id
    id: String,
    /// Events owned by the plugin
    events: EventBus,
    /// Extension points by name
    points: RefCell<IndexMap<String, ExtensionPoint>>,
    /// Outgoing connections, in declaration order
    connections: RefCell<Vec<DeclaredConnection>>,
    /// Ids of required plugins
    dependency_ids: RefCell<Vec<String>>,
    /// Required plugins, delivered at compile time
    dependencies: RefCell<Vec<Weak<dyn Plugin>>>,
}

impl Extensible {
    /// Create the base state for plugin `id`.
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            events: EventBus::new(id),
            points: RefCell::new(IndexMap::new()),
            connections: RefCell::new(Vec::new()),
            dependency_ids: RefCell::new(Vec::new()),
            dependencies: RefCell::new(Vec::new()),
        }
    }

    /// Plugin id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Event bus of this plugin.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Define an extension point, replacing any point with the same name.
    pub fn define_extension_point(&self, spec: ExtensionPointSpec) -> Result<()> {
        if spec.name.is_empty() {
            return Err(Error::invalid_argument(
                &self.id,
                "extension point has no name",
            ));
        }
        if spec.interface.owner_id.is_empty() || spec.interface.extension_point.is_empty() {
            return Err(Error::invalid_argument(
                &self.id,
                format!("extension point '{}' has an incomplete interface", spec.name),
            ));
        }
        if spec.interface.extension_point != spec.name {
            return Err(Error::invalid_argument(
                &self.id,
                format!(
                    "extension point '{}' is given the interface of '{}'",
                    spec.name, spec.interface.extension_point
                ),
            ));
        }

        debug!(
            plugin = %self.id,
            point = %spec.name,
            arity = ?spec.arity,
            "defining extension point"
        );
        self.points
            .borrow_mut()
            .insert(spec.name.clone(), ExtensionPoint::new(spec));
        Ok(())
    }

    /// Attachments of every extension point, in definition order.
    pub fn extension_points(&self) -> IndexMap<String, Attachment> {
        self.points
            .borrow()
            .iter()
            .map(|(name, point)| (name.clone(), point.view()))
            .collect()
    }

    /// Attachments of one extension point.
    pub fn plugins_at_extension_point(&self, name: &str) -> Result<Attachment> {
        self.points
            .borrow()
            .get(name)
            .map(ExtensionPoint::view)
            .ok_or_else(|| self.unknown_point(name))
    }

    /// Check whether an extension point exists.
    pub fn has_extension_point(&self, name: &str) -> bool {
        self.points.borrow().contains_key(name)
    }

    /// Check whether any extension point exists.
    pub fn has_extension_points(&self) -> bool {
        !self.points.borrow().is_empty()
    }

    /// Check whether an extension point has an interface.
    pub fn has_extension_point_interface(&self, name: &str) -> bool {
        self.extension_point_interface(name).is_some()
    }

    /// Interface of an extension point.
    pub fn extension_point_interface(&self, name: &str) -> Option<ConnectionRequest> {
        self.points.borrow().get(name).map(|p| p.interface.clone())
    }

    /// Arity of an extension point.
    pub fn extension_point_arity(&self, name: &str) -> Option<Arity> {
        self.points.borrow().get(name).map(|p| p.arity)
    }

    /// Check whether the handshake ran on an extension point.
    pub fn is_extension_point_connected(&self, name: &str) -> bool {
        self.points
            .borrow()
            .get(name)
            .is_some_and(|p| p.connected)
    }

    /// Responses returned by plugins connected to an extension point.
    pub fn connection_responses(&self, name: &str) -> Vec<ConnectionResponse> {
        self.points
            .borrow()
            .get(name)
            .map(|p| p.responses.clone())
            .unwrap_or_default()
    }

    /// Declare that this plugin extends `connection.extension_point` on
    /// `connection.target_plugin_id`.
    pub fn declare_connection(&self, connection: DeclaredConnection) -> Result<()> {
        if connection.target_plugin_id.is_empty() || connection.extension_point.is_empty() {
            return Err(Error::invalid_argument(
                &self.id,
                "connection needs a target plugin id and an extension point",
            ));
        }
        self.connections.borrow_mut().push(connection);
        Ok(())
    }

    /// Check for a declaration matching both fields exactly.
    pub fn has_declared_connection(&self, target_plugin_id: &str, extension_point: &str) -> bool {
        self.connections
            .borrow()
            .iter()
            .any(|c| c.matches(target_plugin_id, extension_point))
    }

    /// Declared connections, in declaration order.
    pub fn declared_connections(&self) -> Vec<DeclaredConnection> {
        self.connections.borrow().clone()
    }

    /// Attach `plugin` to one of this plugin's extension points.
    pub fn add_extension(&self, plugin: &PluginRef, extension_point: &str) -> Result<bool> {
        let interface = self
            .extension_point_interface(extension_point)
            .ok_or_else(|| self.unknown_point(extension_point))?;

        let declaration = plugin
            .extensible()
            .connections
            .borrow()
            .iter()
            .find(|c| c.matches(&self.id, extension_point))
            .cloned()
            .ok_or_else(|| Error::UndeclaredConnection {
                plugin: plugin.id().to_string(),
                target: self.id.clone(),
                extension_point: extension_point.to_string(),
            })?;

        if let Some(reason) = declaration
            .requirement
            .as_ref()
            .and_then(|req| req.mismatch(&interface))
        {
            return Err(Error::ContractMismatch {
                target: self.id.clone(),
                extension_point: extension_point.to_string(),
                reason,
            });
        }

        let mut points = self.points.borrow_mut();
        let point = points
            .get_mut(extension_point)
            .ok_or_else(|| self.unknown_point(extension_point))?;

        if point.connected {
            warn!(
                plugin = %plugin.id(),
                target = %self.id,
                point = extension_point,
                "late attachment, connect() runs on the next handshake"
            );
        }

        let attached = AttachedPlugin {
            plugin: Rc::clone(plugin),
            connected: false,
        };
        match point.arity {
            Arity::Single => {
                point.attachments.clear();
                point.attachments.push(attached);
            }
            Arity::Multi => point.attachments.push(attached),
        }

        debug!(
            plugin = %plugin.id(),
            target = %self.id,
            point = extension_point,
            "extension added"
        );
        Ok(true)
    }

    /// Run the connect handshake for attachments that have not received it.
    ///
    /// A point without attachments stays unconnected.
    pub fn call_connect_on_extension_point(&self, name: &str) -> Result<()> {
        let (interface, pending) = {
            let points = self.points.borrow();
            let point = points.get(name).ok_or_else(|| self.unknown_point(name))?;
            let pending: Vec<(usize, PluginRef)> = point
                .attachments
                .iter()
                .enumerate()
                .filter(|(_, a)| !a.connected)
                .map(|(idx, a)| (idx, Rc::clone(&a.plugin)))
                .collect();
            (point.interface.clone(), pending)
        };

        for (idx, plugin) in pending {
            debug!(plugin = %plugin.id(), target = %self.id, point = name, "calling connect()");
            let response = plugin.connect(&interface)?;

            let mut points = self.points.borrow_mut();
            if let Some(point) = points.get_mut(name) {
                // connect() may have re-entered and reshuffled the list
                let slot = match point.attachments.get(idx) {
                    Some(a) if a.is(&plugin) && !a.connected => Some(idx),
                    _ => point
                        .attachments
                        .iter()
                        .position(|a| a.is(&plugin) && !a.connected),
                };
                if let Some(slot) = slot {
                    point.attachments[slot].connected = true;
                }
                point.connected = true;
                point.responses.extend(response);
            }
        }
        Ok(())
    }

    /// Run the connect handshake on every extension point.
    pub fn call_connect_on_extension_points(&self) -> Result<()> {
        let names: Vec<String> = self.points.borrow().keys().cloned().collect();
        for name in names {
            self.call_connect_on_extension_point(&name)?;
        }
        Ok(())
    }

    /// Detach every plugin and forget handshake state, keeping the points.
    pub fn clear_attachments(&self) {
        for point in self.points.borrow_mut().values_mut() {
            point.attachments.clear();
            point.connected = false;
            point.responses.clear();
        }
    }

    /// Require the plugin with id `plugin_id`.
    pub fn depend_on(&self, plugin_id: &str) -> Result<()> {
        if plugin_id.is_empty() {
            return Err(Error::invalid_argument(&self.id, "dependency has no id"));
        }
        self.dependency_ids.borrow_mut().push(plugin_id.to_string());
        Ok(())
    }

    /// Ids of required plugins.
    pub fn dependency_ids(&self) -> Vec<String> {
        self.dependency_ids.borrow().clone()
    }

    /// Store references to the required plugins.
    pub fn deliver_dependencies(&self, plugins: &[PluginRef]) {
        *self.dependencies.borrow_mut() = plugins.iter().map(Rc::downgrade).collect();
    }

    /// Delivered dependencies that are still alive.
    pub fn resolved_dependencies(&self) -> Vec<PluginRef> {
        self.dependencies
            .borrow()
            .iter()
            .filter_map(Weak::upgrade)
            .collect()
    }

    /// Delivered dependency with id `plugin_id`.
    pub fn dependency(&self, plugin_id: &str) -> Option<PluginRef> {
        self.resolved_dependencies()
            .into_iter()
            .find(|p| p.id() == plugin_id)
    }

    /// Forget delivered dependencies.
    pub fn clear_dependencies(&self) {
        self.dependencies.borrow_mut().clear();
    }

    fn unknown_point(&self, name: &str) -> Error {
        Error::UnknownExtensionPoint {
            plugin: self.id.clone(),
            extension_point: name.to_string(),
        }
    }
}

impl std::fmt::Debug for Extensible {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extensible")
            .field("id", &self.id)
            .field("extension_points", &self.extension_points())
            .field("connections", &self.connections.borrow())
            .field("dependency_ids", &self.dependency_ids.borrow())
            .finish()
    }
}
