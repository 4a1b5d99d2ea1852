//! Orchestrator: plugin registry and bootstrap driver.
//!
//! Handles registration, dependency resolution, and the resume sequence
//! (start, extend, connect). Phases run strictly in order and iterate the
//! registry in registration order.

use crate::core::{validate_plugin_id, Error, Result, ANY_PLUGIN};
use crate::event::EventBus;
use crate::monitoring::{BootstrapLog, LogEntry, LogLevel};
use crate::orchestrator::config::BootstrapConfig;
use crate::orchestrator::handle::{
    BroadcastReport, CoreHandle, RemoteEventOutcome, RemoteEventRequest,
};
use crate::orchestrator::phase::Phase;
use crate::plugin::{
    Arity, Capability, ConnectionRequest, Extensible, ExtensionPointSpec, PluginRef,
};
use indexmap::IndexMap;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::debug;

/// Extension point on the orchestrator offering the bootstrap journal.
pub const LOG_MANAGER_POINT: &str = "logManager";

/// State shared between the orchestrator and the handles it gives out.
pub(crate) struct CoreState {
    /// Orchestrator's own extension points and events
    base: Extensible,
    /// Enables reset
    debug_mode: bool,
    /// Host data
    data: serde_json::Value,
    /// Registered plugins, in registration order
    registry: RefCell<IndexMap<String, PluginRef>>,
    /// Current phase
    phase: Cell<Phase>,
    /// Bootstrap journal
    journal: Rc<BootstrapLog>,
}

impl CoreState {
    pub(crate) fn id(&self) -> &str {
        self.base.id()
    }

    pub(crate) fn data(&self) -> &serde_json::Value {
        &self.data
    }

    fn plugins(&self) -> Vec<PluginRef> {
        self.registry.borrow().values().cloned().collect()
    }

    fn lookup(&self, plugin_id: &str) -> Result<PluginRef> {
        self.registry
            .borrow()
            .get(plugin_id)
            .cloned()
            .ok_or_else(|| Error::PluginNotFound(plugin_id.to_string()))
    }

    fn record(&self, entry: LogEntry) {
        self.journal.log(entry);
    }

    /// Apply `request` to the addressed bus(es); unknown ids yield `NotFound`.
    fn route(
        &self,
        request: &RemoteEventRequest,
        apply: impl Fn(&EventBus) -> bool,
    ) -> RemoteEventOutcome {
        if request.plugin_id == ANY_PLUGIN {
            let mut report = BroadcastReport::default();
            for plugin in self.plugins() {
                let events = plugin.extensible().events();
                if !events.has_event(&request.event_name) {
                    continue;
                }
                if apply(events) {
                    report.applied.push(plugin.id().to_string());
                } else {
                    report.not_applied.push(plugin.id().to_string());
                }
            }
            return RemoteEventOutcome::Broadcast(report);
        }

        if request.plugin_id == self.id() {
            return RemoteEventOutcome::from_applied(apply(self.base.events()));
        }

        match self.lookup(&request.plugin_id) {
            Ok(plugin) => RemoteEventOutcome::from_applied(apply(plugin.extensible().events())),
            Err(err) => {
                debug!(error = %err, event = %request.event_name, "remote event lookup failed");
                RemoteEventOutcome::NotFound
            }
        }
    }

    pub(crate) fn observe_remote_event(&self, request: &RemoteEventRequest) -> RemoteEventOutcome {
        self.route(request, |events| {
            events.observe(&request.event_name, request.callback.clone())
        })
    }

    pub(crate) fn stop_observing_remote_event(
        &self,
        request: &RemoteEventRequest,
    ) -> RemoteEventOutcome {
        self.route(request, |events| {
            events.stop_observing(&request.event_name, &request.callback)
        })
    }
}

/// Owns the plugin registry and drives the bootstrap.
pub struct Orchestrator {
    state: Rc<CoreState>,
}

impl Orchestrator {
    /// Create an orchestrator with an empty registry.
    pub fn new(config: BootstrapConfig) -> Result<Self> {
        validate_plugin_id(&config.core_id)?;

        let journal = Rc::new(BootstrapLog::new(config.log.clone()));
        let base = Extensible::new(&config.core_id);
        base.define_extension_point(ExtensionPointSpec::new(
            LOG_MANAGER_POINT,
            Arity::Single,
            ConnectionRequest::new(&config.core_id, LOG_MANAGER_POINT)
                .with_api(Capability::object(Rc::clone(&journal))),
        ))?;

        Ok(Self {
            state: Rc::new(CoreState {
                base,
                debug_mode: config.debug_mode,
                data: config.data,
                registry: RefCell::new(IndexMap::new()),
                phase: Cell::new(Phase::Load),
                journal,
            }),
        })
    }

    /// Id of the orchestrator.
    pub fn id(&self) -> &str {
        self.state.id()
    }

    /// Orchestrator's own extension points, connections and events.
    pub fn extensible(&self) -> &Extensible {
        &self.state.base
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.state.phase.get()
    }

    /// Whether `reset()` is permitted.
    pub fn is_debug_mode(&self) -> bool {
        self.state.debug_mode
    }

    /// Handle given to plugins on start.
    pub fn handle(&self) -> CoreHandle {
        CoreHandle::new(Rc::downgrade(&self.state))
    }

    /// Host data from the configuration.
    pub fn defined_data(&self) -> serde_json::Value {
        self.state.data.clone()
    }

    /// Bootstrap journal.
    pub fn journal(&self) -> Rc<BootstrapLog> {
        Rc::clone(&self.state.journal)
    }

    /// Render the bootstrap journal.
    pub fn dump_logs(&self) -> Vec<String> {
        self.state.journal.dump()
    }

    /// Register a plugin.
    pub fn register_plugin(&self, plugin: PluginRef) -> Result<()> {
        if self.phase() != Phase::Load {
            return Err(self.out_of_order("register plugins"));
        }

        let id = plugin.id().to_string();
        validate_plugin_id(&id)?;
        if id == self.id() || self.state.registry.borrow().contains_key(&id) {
            return Err(Error::DuplicateId(id));
        }

        self.state.registry.borrow_mut().insert(id.clone(), plugin);
        self.state
            .record(LogEntry::new(LogLevel::Info, "plugin registered").with_field("plugin", &id));
        Ok(())
    }

    /// Resolve and deliver every plugin's dependencies.
    ///
    /// Nothing is delivered unless every dependency resolves, so a failed
    /// compile can be retried after registering the missing plugin.
    pub fn compile(&self) -> Result<()> {
        if self.phase() != Phase::Load {
            return Err(Error::AlreadyCompiled);
        }
        self.state.journal.info("compile phase started");

        let plugins = self.state.plugins();
        let own = self.resolve(&self.state.base)?;
        let mut resolved = Vec::with_capacity(plugins.len());
        for plugin in &plugins {
            resolved.push(self.resolve(plugin.extensible())?);
        }

        self.state.base.deliver_dependencies(&own);
        for (plugin, dependencies) in plugins.iter().zip(resolved) {
            if !dependencies.is_empty() {
                self.state.record(
                    LogEntry::new(LogLevel::Debug, "delivering dependencies")
                        .with_field("plugin", plugin.id())
                        .with_field("dependencies", plugin.extensible().dependency_ids()),
                );
            }
            plugin.extensible().deliver_dependencies(&dependencies);
        }

        self.state.phase.set(Phase::Compiled);
        Ok(())
    }

    /// Call `start` on every plugin, once.
    pub fn start(&self) -> Result<()> {
        match self.phase() {
            Phase::Load => return Err(self.out_of_order("start plugins")),
            Phase::Compiled => {}
            _ => return Err(Error::AlreadyStarted),
        }
        self.state.phase.set(Phase::Started);
        self.state.journal.info("start phase started");

        for plugin in self.state.plugins() {
            debug!(plugin = %plugin.id(), "calling start()");
            plugin.start(self.handle())?;
        }
        Ok(())
    }

    /// Attach every plugin to the extension points it declared.
    pub fn plug_extensions(&self) -> Result<()> {
        match self.phase() {
            Phase::Load | Phase::Compiled => {
                return Err(self.out_of_order("plug extensions"))
            }
            Phase::Started => {}
            Phase::Extended | Phase::Connected => return Err(Error::AlreadyExtended),
        }
        self.state.journal.info("extend phase started");

        if let Err(err) = self.attach_declared() {
            self.detach_all();
            self.state
                .journal
                .warn(&format!("extend phase rolled back: {}", err));
            return Err(err);
        }
        self.state.phase.set(Phase::Extended);
        Ok(())
    }

    fn attach_declared(&self) -> Result<()> {
        for plugin in self.state.plugins() {
            for connection in plugin.extensible().declared_connections() {
                let target = &connection.target_plugin_id;
                if target == ANY_PLUGIN {
                    return Err(Error::WildcardTarget {
                        plugin: plugin.id().to_string(),
                    });
                }

                if target == self.id() {
                    self.state
                        .base
                        .add_extension(&plugin, &connection.extension_point)?;
                } else {
                    let host = self.state.lookup(target).map_err(|_| {
                        Error::UnknownTargetPlugin {
                            plugin: plugin.id().to_string(),
                            target: target.clone(),
                        }
                    })?;
                    host.extensible()
                        .add_extension(&plugin, &connection.extension_point)?;
                }

                self.state.record(
                    LogEntry::new(LogLevel::Debug, "plugin extended")
                        .with_field("plugin", plugin.id())
                        .with_field("target", target)
                        .with_field("point", &connection.extension_point),
                );
            }
        }
        Ok(())
    }

    fn detach_all(&self) {
        self.state.base.clear_attachments();
        for plugin in self.state.plugins() {
            plugin.extensible().clear_attachments();
        }
    }

    /// Run the connect handshake on the orchestrator, then on every plugin.
    ///
    /// May be repeated; later calls only reach attachments that have not
    /// been connected yet.
    pub fn connect_all(&self) -> Result<()> {
        if self.phase() < Phase::Extended {
            return Err(self.out_of_order("connect plugins"));
        }
        self.state.journal.info("connect phase started");

        self.state.base.call_connect_on_extension_points()?;
        for plugin in self.state.plugins() {
            plugin.extensible().call_connect_on_extension_points()?;
        }

        self.state.phase.set(Phase::Connected);
        Ok(())
    }

    /// Start, extend and connect.
    pub fn resume(&self) -> Result<()> {
        self.start()?;
        self.plug_extensions()?;
        self.connect_all()
    }

    /// Subscribe to a plugin's event; `"any"` subscribes to every plugin
    /// defining it.
    pub fn observe_remote_event(&self, request: &RemoteEventRequest) -> RemoteEventOutcome {
        self.state.observe_remote_event(request)
    }

    /// Unsubscribe from a plugin's event; `"any"` unsubscribes everywhere.
    pub fn stop_observing_remote_event(&self, request: &RemoteEventRequest) -> RemoteEventOutcome {
        self.state.stop_observing_remote_event(request)
    }

    /// Drop every plugin and return to the load phase. Debug mode only.
    pub fn reset(&self) -> Result<()> {
        if !self.state.debug_mode {
            return Err(Error::ResetNotPermitted);
        }

        for plugin in self.state.plugins() {
            plugin.extensible().clear_attachments();
            plugin.extensible().clear_dependencies();
        }
        self.state.registry.borrow_mut().clear();
        self.state.base.clear_attachments();
        self.state.base.clear_dependencies();
        self.state.phase.set(Phase::Load);
        self.state.journal.warn("registry reset");
        Ok(())
    }

    /// Ids of registered plugins, in registration order.
    pub fn list_plugins(&self) -> Vec<String> {
        self.state.registry.borrow().keys().cloned().collect()
    }

    /// Registered plugin with id `plugin_id`.
    pub fn plugin(&self, plugin_id: &str) -> Result<PluginRef> {
        self.state.lookup(plugin_id)
    }

    /// Events declared by each plugin.
    pub fn plugin_events(&self) -> IndexMap<String, Vec<String>> {
        self.state
            .plugins()
            .into_iter()
            .map(|p| (p.id().to_string(), p.extensible().events().list_events()))
            .collect()
    }

    fn resolve(&self, base: &Extensible) -> Result<Vec<PluginRef>> {
        base.dependency_ids()
            .iter()
            .map(|dependency| {
                self.state
                    .lookup(dependency)
                    .map_err(|_| Error::UnresolvedDependency {
                        plugin: base.id().to_string(),
                        dependency: dependency.clone(),
                    })
            })
            .collect()
    }

    fn out_of_order(&self, operation: &'static str) -> Error {
        Error::PhaseOutOfOrder {
            operation,
            phase: self.phase().to_string(),
        }
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("id", &self.id())
            .field("phase", &self.phase())
            .field("plugins", &self.list_plugins())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventCallback;
    use crate::plugin::{ConnectionResponse, DeclaredConnection, Plugin};
    use std::cell::Cell;

    struct TestPlugin {
        base: Extensible,
        starts: Cell<u32>,
        connects: RefCell<Vec<String>>,
        core: RefCell<Option<CoreHandle>>,
    }

    impl TestPlugin {
        fn new(id: &str) -> Rc<Self> {
            Rc::new(Self {
                base: Extensible::new(id),
                starts: Cell::new(0),
                connects: RefCell::new(Vec::new()),
                core: RefCell::new(None),
            })
        }
    }

    impl Plugin for TestPlugin {
        fn extensible(&self) -> &Extensible {
            &self.base
        }

        fn start(&self, core: CoreHandle) -> Result<()> {
            self.starts.set(self.starts.get() + 1);
            *self.core.borrow_mut() = Some(core);
            Ok(())
        }

        fn connect(&self, request: &ConnectionRequest) -> Result<Option<ConnectionResponse>> {
            self.connects
                .borrow_mut()
                .push(format!("{}.{}", request.owner_id, request.extension_point));
            Ok(None)
        }
    }

    fn orchestrator() -> Orchestrator {
        Orchestrator::new(BootstrapConfig::default()).unwrap()
    }

    fn register(core: &Orchestrator, plugin: &Rc<TestPlugin>) {
        core.register_plugin(Rc::clone(plugin) as PluginRef).unwrap();
    }

    fn noop() -> EventCallback {
        EventCallback::new(|_| {})
    }

    #[test]
    fn test_register_plugin() {
        let core = orchestrator();
        register(&core, &TestPlugin::new("map"));

        assert_eq!(core.list_plugins(), vec!["map"]);
        assert!(core.plugin("map").is_ok());
        assert!(matches!(core.plugin("nope"), Err(Error::PluginNotFound(_))));
    }

    #[test]
    fn test_register_rejects_bad_ids() {
        let core = orchestrator();
        register(&core, &TestPlugin::new("map"));

        let dup = core.register_plugin(TestPlugin::new("map"));
        assert!(matches!(dup, Err(Error::DuplicateId(_))));

        let own = core.register_plugin(TestPlugin::new("corePlugin"));
        assert!(matches!(own, Err(Error::DuplicateId(_))));

        let any = core.register_plugin(TestPlugin::new("any"));
        assert!(matches!(any, Err(Error::ReservedId(_))));

        let empty = core.register_plugin(TestPlugin::new(""));
        assert!(matches!(empty, Err(Error::MissingId)));
    }

    #[test]
    fn test_invalid_core_id() {
        let config = BootstrapConfig {
            core_id: "any".to_string(),
            ..Default::default()
        };
        assert!(Orchestrator::new(config).is_err());
    }

    #[test]
    fn test_register_after_compile_fails() {
        let core = orchestrator();
        core.compile().unwrap();

        let late = core.register_plugin(TestPlugin::new("late"));
        assert!(matches!(late, Err(Error::PhaseOutOfOrder { .. })));
    }

    #[test]
    fn test_compile_twice_fails() {
        let core = orchestrator();
        core.compile().unwrap();
        assert!(matches!(core.compile(), Err(Error::AlreadyCompiled)));
    }

    #[test]
    fn test_compile_delivers_dependencies() {
        let core = orchestrator();
        let provider = TestPlugin::new("provider");
        let consumer = TestPlugin::new("consumer");
        consumer.base.depend_on("provider").unwrap();
        core.extensible().depend_on("provider").unwrap();
        register(&core, &provider);
        register(&core, &consumer);

        core.compile().unwrap();

        assert_eq!(core.phase(), Phase::Compiled);
        assert!(consumer.base.dependency("provider").is_some());
        assert!(core.extensible().dependency("provider").is_some());
        assert!(provider.base.resolved_dependencies().is_empty());
    }

    #[test]
    fn test_compile_unresolved_dependency() {
        let core = orchestrator();
        let provider = TestPlugin::new("provider");
        let consumer = TestPlugin::new("consumer");
        provider.base.depend_on("consumer").unwrap();
        consumer.base.depend_on("missing").unwrap();
        register(&core, &provider);
        register(&core, &consumer);

        let err = core.compile().unwrap_err();
        assert!(matches!(
            err,
            Error::UnresolvedDependency { ref dependency, .. } if dependency == "missing"
        ));
        assert_eq!(core.phase(), Phase::Load);
        assert!(provider.base.resolved_dependencies().is_empty());

        register(&core, &TestPlugin::new("missing"));
        core.compile().unwrap();
        assert!(provider.base.dependency("consumer").is_some());
    }

    #[test]
    fn test_start_requires_compile() {
        let core = orchestrator();
        assert!(matches!(core.start(), Err(Error::PhaseOutOfOrder { .. })));
    }

    #[test]
    fn test_start_calls_each_plugin_once() {
        let core = orchestrator();
        let a = TestPlugin::new("a");
        let b = TestPlugin::new("b");
        register(&core, &a);
        register(&core, &b);
        core.compile().unwrap();

        core.start().unwrap();
        assert!(matches!(core.start(), Err(Error::AlreadyStarted)));

        assert_eq!(a.starts.get(), 1);
        assert_eq!(b.starts.get(), 1);
        assert_eq!(
            a.core.borrow().as_ref().and_then(CoreHandle::core_id),
            Some("corePlugin".to_string())
        );
    }

    #[test]
    fn test_start_not_implemented() {
        struct Lazy {
            base: Extensible,
        }
        impl Plugin for Lazy {
            fn extensible(&self) -> &Extensible {
                &self.base
            }
        }

        let core = orchestrator();
        core.register_plugin(Rc::new(Lazy {
            base: Extensible::new("lazy"),
        }))
        .unwrap();
        core.compile().unwrap();

        let err = core.start().unwrap_err();
        assert!(matches!(err, Error::NotImplemented { hook: "start", .. }));
    }

    #[test]
    fn test_plug_extensions_into_core() {
        let core = orchestrator();
        let logger = TestPlugin::new("logger");
        logger
            .base
            .declare_connection(DeclaredConnection::new("corePlugin", LOG_MANAGER_POINT))
            .unwrap();
        register(&core, &logger);
        core.compile().unwrap();
        core.resume().unwrap();

        let attached = core
            .extensible()
            .plugins_at_extension_point(LOG_MANAGER_POINT)
            .unwrap();
        assert_eq!(attached.ids(), vec!["logger"]);
        assert_eq!(*logger.connects.borrow(), vec!["corePlugin.logManager"]);
    }

    #[test]
    fn test_log_manager_receives_journal() {
        struct LogManager {
            base: Extensible,
            journal: RefCell<Option<Rc<BootstrapLog>>>,
        }
        impl Plugin for LogManager {
            fn extensible(&self) -> &Extensible {
                &self.base
            }
            fn start(&self, _core: CoreHandle) -> Result<()> {
                Ok(())
            }
            fn connect(
                &self,
                request: &ConnectionRequest,
            ) -> Result<Option<ConnectionResponse>> {
                *self.journal.borrow_mut() = request.api.downcast::<BootstrapLog>();
                Ok(None)
            }
        }

        let core = orchestrator();
        let manager = Rc::new(LogManager {
            base: Extensible::new("logs"),
            journal: RefCell::new(None),
        });
        manager
            .base
            .declare_connection(DeclaredConnection::new("corePlugin", LOG_MANAGER_POINT))
            .unwrap();
        core.register_plugin(Rc::clone(&manager) as PluginRef).unwrap();
        core.compile().unwrap();
        core.resume().unwrap();

        let journal = manager.journal.borrow().clone().unwrap();
        assert!(journal
            .entries()
            .iter()
            .any(|e| e.message == "plugin registered"));
        assert!(!core.dump_logs().is_empty());
    }

    #[test]
    fn test_plug_extensions_unknown_target() {
        let core = orchestrator();
        let a = TestPlugin::new("a");
        a.base
            .declare_connection(DeclaredConnection::new("ghost", "ext1"))
            .unwrap();
        register(&core, &a);
        core.compile().unwrap();
        core.start().unwrap();

        let err = core.plug_extensions().unwrap_err();
        assert!(matches!(err, Error::UnknownTargetPlugin { ref target, .. } if target == "ghost"));
    }

    #[test]
    fn test_failed_extend_rolls_back() {
        let core = orchestrator();
        let host = TestPlugin::new("host");
        host.base
            .define_extension_point(ExtensionPointSpec::new(
                "tools",
                Arity::Multi,
                ConnectionRequest::new("host", "tools"),
            ))
            .unwrap();
        let good = TestPlugin::new("good");
        good.base
            .declare_connection(DeclaredConnection::new("host", "tools"))
            .unwrap();
        let bad = TestPlugin::new("bad");
        bad.base
            .declare_connection(DeclaredConnection::new("ghost", "tools"))
            .unwrap();
        register(&core, &host);
        register(&core, &good);
        register(&core, &bad);
        core.compile().unwrap();
        core.start().unwrap();

        assert!(core.plug_extensions().is_err());
        assert_eq!(core.phase(), Phase::Started);
        assert!(host
            .base
            .plugins_at_extension_point("tools")
            .unwrap()
            .is_empty());

        assert!(matches!(
            core.connect_all(),
            Err(Error::PhaseOutOfOrder { .. })
        ));
        assert!(good.connects.borrow().is_empty());
    }

    #[test]
    fn test_plug_extensions_wildcard_target() {
        let core = orchestrator();
        let a = TestPlugin::new("a");
        a.base
            .declare_connection(DeclaredConnection::new("any", "ext1"))
            .unwrap();
        register(&core, &a);
        core.compile().unwrap();
        core.start().unwrap();

        assert!(matches!(
            core.plug_extensions(),
            Err(Error::WildcardTarget { .. })
        ));
    }

    #[test]
    fn test_phase_order_enforced() {
        let core = orchestrator();
        assert!(matches!(
            core.plug_extensions(),
            Err(Error::PhaseOutOfOrder { .. })
        ));
        assert!(matches!(core.connect_all(), Err(Error::PhaseOutOfOrder { .. })));

        core.compile().unwrap();
        core.resume().unwrap();
        assert_eq!(core.phase(), Phase::Connected);
        assert!(matches!(core.plug_extensions(), Err(Error::AlreadyExtended)));
        assert!(core.connect_all().is_ok());
    }

    #[test]
    fn test_observe_remote_event_unknown_plugin() {
        let core = orchestrator();
        let request = RemoteEventRequest::new("nonexistent", "x", noop());
        assert_eq!(core.observe_remote_event(&request), RemoteEventOutcome::NotFound);
        assert_eq!(
            core.stop_observing_remote_event(&request),
            RemoteEventOutcome::NotFound
        );
    }

    #[test]
    fn test_observe_remote_event_named_plugin() {
        let core = orchestrator();
        let map = TestPlugin::new("map");
        map.base.events().define_event("moved");
        register(&core, &map);

        let cb = noop();
        let moved = RemoteEventRequest::new("map", "moved", cb.clone());
        assert_eq!(core.observe_remote_event(&moved), RemoteEventOutcome::Applied);

        let zoomed = RemoteEventRequest::new("map", "zoomed", cb.clone());
        assert_eq!(core.observe_remote_event(&zoomed), RemoteEventOutcome::NotApplied);

        assert_eq!(
            core.stop_observing_remote_event(&moved),
            RemoteEventOutcome::Applied
        );
        assert_eq!(
            core.stop_observing_remote_event(&moved),
            RemoteEventOutcome::NotApplied
        );
    }

    #[test]
    fn test_observe_remote_event_any() {
        let core = orchestrator();
        let a = TestPlugin::new("a");
        let b = TestPlugin::new("b");
        let c = TestPlugin::new("c");
        a.base.events().define_event("x");
        c.base.events().define_event("x");
        for plugin in [&a, &b, &c] {
            register(&core, plugin);
        }

        let request = RemoteEventRequest::new("any", "x", noop());
        let outcome = core.observe_remote_event(&request);

        assert_eq!(
            outcome,
            RemoteEventOutcome::Broadcast(BroadcastReport {
                applied: vec!["a".to_string(), "c".to_string()],
                not_applied: Vec::new(),
            })
        );
        assert_eq!(a.base.events().subscriber_count("x"), 1);
        assert!(!b.base.events().has_event("x"));
        assert_eq!(c.base.events().subscriber_count("x"), 1);

        let stop = core.stop_observing_remote_event(&request);
        assert_eq!(stop.applied_count(), 2);
        assert_eq!(a.base.events().subscriber_count("x"), 0);
    }

    #[test]
    fn test_remote_event_on_core() {
        let core = orchestrator();
        core.extensible().events().define_event("ready");

        let hits = Rc::new(Cell::new(0));
        let seen = Rc::clone(&hits);
        let request = RemoteEventRequest::new(
            "corePlugin",
            "ready",
            EventCallback::new(move |_| seen.set(seen.get() + 1)),
        );

        assert!(core.observe_remote_event(&request).is_applied());
        core.extensible()
            .events()
            .fire("ready", &serde_json::Value::Null)
            .unwrap();
        assert!(core.stop_observing_remote_event(&request).is_applied());
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_handle_routes_through_core() {
        let core = orchestrator();
        let map = TestPlugin::new("map");
        let layers = TestPlugin::new("layers");
        map.base.events().define_event("moved");
        register(&core, &map);
        register(&core, &layers);
        core.compile().unwrap();
        core.start().unwrap();

        let handle = layers.core.borrow().clone().unwrap();
        let request = RemoteEventRequest::new("map", "moved", noop());
        assert!(handle.observe_remote_event(&request).is_applied());
        assert_eq!(map.base.events().subscriber_count("moved"), 1);

        drop(core);
        assert_eq!(handle.observe_remote_event(&request), RemoteEventOutcome::NotFound);
    }

    #[test]
    fn test_reset_requires_debug_mode() {
        let core = orchestrator();
        register(&core, &TestPlugin::new("map"));
        assert!(matches!(core.reset(), Err(Error::ResetNotPermitted)));
        assert_eq!(core.list_plugins().len(), 1);
    }

    #[test]
    fn test_reset_in_debug_mode() {
        let core =
            Orchestrator::new(BootstrapConfig::default().with_debug_mode(true)).unwrap();
        let logger = TestPlugin::new("logger");
        logger
            .base
            .declare_connection(DeclaredConnection::new("corePlugin", LOG_MANAGER_POINT))
            .unwrap();
        register(&core, &logger);
        core.compile().unwrap();
        core.resume().unwrap();

        core.reset().unwrap();

        assert!(core.list_plugins().is_empty());
        assert_eq!(core.phase(), Phase::Load);
        assert!(core
            .extensible()
            .plugins_at_extension_point(LOG_MANAGER_POINT)
            .unwrap()
            .is_empty());
        core.compile().unwrap();
    }

    #[test]
    fn test_plugin_events_and_defined_data() {
        let core = Orchestrator::new(
            BootstrapConfig::default().with_data(serde_json::json!({"startzoom": 5})),
        )
        .unwrap();
        let map = TestPlugin::new("map");
        map.base.events().define_event("moved");
        map.base.events().define_event("zoomed");
        register(&core, &map);
        register(&core, &TestPlugin::new("quiet"));

        let events = core.plugin_events();
        assert_eq!(events["map"], vec!["moved", "zoomed"]);
        assert!(events["quiet"].is_empty());
        assert_eq!(core.defined_data()["startzoom"], 5);
        assert_eq!(core.handle().defined_data()["startzoom"], 5);
    }
}
