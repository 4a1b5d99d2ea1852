//! The orchestrator as plugins see it.

use crate::event::EventCallback;
use crate::orchestrator::engine::CoreState;
use std::rc::Weak;

/// Request to (un)subscribe to an event owned by another plugin.
#[derive(Clone, Debug)]
pub struct RemoteEventRequest {
    /// Owner of the event; `"any"` targets every plugin defining it
    pub plugin_id: String,
    /// Event name
    pub event_name: String,
    /// Subscriber
    pub callback: EventCallback,
}

impl RemoteEventRequest {
    /// Create a request.
    pub fn new(plugin_id: &str, event_name: &str, callback: EventCallback) -> Self {
        Self {
            plugin_id: plugin_id.to_string(),
            event_name: event_name.to_string(),
            callback,
        }
    }
}

/// Per-plugin results of a wildcard request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Plugins where the request took effect
    pub applied: Vec<String>,
    /// Plugins defining the event where it did not
    pub not_applied: Vec<String>,
}

/// Result of a remote event request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RemoteEventOutcome {
    /// The subscription was added or removed
    Applied,
    /// The plugin exists but the request had no effect
    NotApplied,
    /// No plugin with the requested id
    NotFound,
    /// Wildcard request over every plugin defining the event
    Broadcast(BroadcastReport),
}

impl RemoteEventOutcome {
    pub(crate) fn from_applied(applied: bool) -> Self {
        if applied {
            RemoteEventOutcome::Applied
        } else {
            RemoteEventOutcome::NotApplied
        }
    }

    /// True if the request took effect everywhere it was attempted.
    ///
    /// A wildcard request that matched no plugin counts as applied.
    pub fn is_applied(&self) -> bool {
        match self {
            RemoteEventOutcome::Applied => true,
            RemoteEventOutcome::Broadcast(report) => report.not_applied.is_empty(),
            RemoteEventOutcome::NotApplied | RemoteEventOutcome::NotFound => false,
        }
    }

    /// Number of plugins where the request took effect.
    pub fn applied_count(&self) -> usize {
        match self {
            RemoteEventOutcome::Applied => 1,
            RemoteEventOutcome::Broadcast(report) => report.applied.len(),
            RemoteEventOutcome::NotApplied | RemoteEventOutcome::NotFound => 0,
        }
    }
}

/// Handle passed to [`Plugin::start`](crate::plugin::Plugin::start).
///
/// Holds a weak reference; once the orchestrator is gone every request
/// reports [`RemoteEventOutcome::NotFound`].
#[derive(Clone)]
pub struct CoreHandle {
    core: Weak<CoreState>,
}

impl CoreHandle {
    pub(crate) fn new(core: Weak<CoreState>) -> Self {
        Self { core }
    }

    /// Subscribe to an event of another plugin.
    pub fn observe_remote_event(&self, request: &RemoteEventRequest) -> RemoteEventOutcome {
        match self.core.upgrade() {
            Some(core) => core.observe_remote_event(request),
            None => RemoteEventOutcome::NotFound,
        }
    }

    /// Unsubscribe from an event of another plugin.
    pub fn stop_observing_remote_event(&self, request: &RemoteEventRequest) -> RemoteEventOutcome {
        match self.core.upgrade() {
            Some(core) => core.stop_observing_remote_event(request),
            None => RemoteEventOutcome::NotFound,
        }
    }

    /// Id of the orchestrator.
    pub fn core_id(&self) -> Option<String> {
        self.core.upgrade().map(|core| core.id().to_string())
    }

    /// Host data from the bootstrap configuration.
    pub fn defined_data(&self) -> serde_json::Value {
        self.core
            .upgrade()
            .map(|core| core.data().clone())
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for CoreHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreHandle")
            .field("core_id", &self.core_id())
            .finish()
    }
}
