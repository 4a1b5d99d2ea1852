//! # plugit - plugin composition and lifecycle engine
//!
//! Independently authored plugins are wired together through declared
//! extension points and brought to life in a fixed bootstrap:
//! - **Extensible**: extension points, declared connections, dependencies
//! - **EventBus**: per-plugin publish/subscribe
//! - **Orchestrator**: registry, phases, cross-plugin event routing
//!
//! ## Quick Start
//!
//! ```rust
//! use plugit::orchestrator::{BootstrapConfig, CoreHandle, Orchestrator};
//! use plugit::plugin::{
//!     Arity, ConnectionRequest, ConnectionResponse, DeclaredConnection, Extensible,
//!     ExtensionPointSpec, Plugin,
//! };
//! use std::rc::Rc;
//!
//! struct Map {
//!     base: Extensible,
//! }
//!
//! impl Plugin for Map {
//!     fn extensible(&self) -> &Extensible {
//!         &self.base
//!     }
//!     fn start(&self, _core: CoreHandle) -> plugit::Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! struct Layers {
//!     base: Extensible,
//! }
//!
//! impl Plugin for Layers {
//!     fn extensible(&self) -> &Extensible {
//!         &self.base
//!     }
//!     fn start(&self, _core: CoreHandle) -> plugit::Result<()> {
//!         Ok(())
//!     }
//!     fn connect(
//!         &self,
//!         request: &ConnectionRequest,
//!     ) -> plugit::Result<Option<ConnectionResponse>> {
//!         println!("connected to {}", request.owner_id);
//!         Ok(None)
//!     }
//! }
//!
//! fn main() -> plugit::Result<()> {
//!     let map = Map { base: Extensible::new("map") };
//!     map.base.define_extension_point(ExtensionPointSpec::new(
//!         "layers",
//!         Arity::Multi,
//!         ConnectionRequest::new("map", "layers"),
//!     ))?;
//!
//!     let layers = Layers { base: Extensible::new("layers") };
//!     layers
//!         .base
//!         .declare_connection(DeclaredConnection::new("map", "layers"))?;
//!
//!     let core = Orchestrator::new(BootstrapConfig::default())?;
//!     core.register_plugin(Rc::new(map))?;
//!     core.register_plugin(Rc::new(layers))?;
//!     core.compile()?;
//!     core.resume()
//! }
//! ```

pub mod core;
pub mod event;
pub mod monitoring;
pub mod orchestrator;
pub mod plugin;

pub use crate::core::error::{Error, ErrorKind, Result};
pub use event::{EventBus, EventCallback};
pub use orchestrator::{BootstrapConfig, CoreHandle, Orchestrator};
pub use plugin::{Extensible, Plugin, PluginRef};
