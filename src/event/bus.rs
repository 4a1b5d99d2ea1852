//! Per-owner publish/subscribe bus.
//!
//! Every plugin owns one bus. Events must be defined before they can be
//! observed or fired.

use crate::core::{Error, Result};
use indexmap::IndexMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use tracing::trace;

/// Payload delivered to subscribers.
pub type EventPayload = serde_json::Value;

/// Subscriber handle, compared by identity.
///
/// Keep a clone of the handle to be able to stop observing later.
#[derive(Clone)]
pub struct EventCallback(Rc<dyn Fn(&EventPayload)>);

impl EventCallback {
    /// Wrap a closure.
    pub fn new(f: impl Fn(&EventPayload) + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Invoke the subscriber.
    pub fn call(&self, payload: &EventPayload) {
        (self.0)(payload)
    }

    /// Whether both handles refer to the same subscriber.
    pub fn same_as(&self, other: &EventCallback) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.0), Rc::as_ptr(&other.0))
    }
}

impl PartialEq for EventCallback {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl fmt::Debug for EventCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventCallback({:p})", Rc::as_ptr(&self.0))
    }
}

/// Subscriber slots; unsubscribed entries become `None`.
type Slots = Vec<Option<EventCallback>>;

/// Event bus owned by a single plugin.
#[derive(Default)]
pub struct EventBus {
    /// Owner id, used in error messages
    owner: String,
    /// Event name -> subscriber slots
    events: RefCell<IndexMap<String, Slots>>,
}

impl EventBus {
    /// Create an empty bus for `owner`.
    pub fn new(owner: &str) -> Self {
        Self {
            owner: owner.to_string(),
            events: RefCell::new(IndexMap::new()),
        }
    }

    /// Define an event. Defining it again keeps its subscribers.
    pub fn define_event(&self, name: &str) {
        self.events
            .borrow_mut()
            .entry(name.to_string())
            .or_default();
    }

    /// Subscribe to a defined event. Returns `false` if it is not defined.
    pub fn observe(&self, name: &str, callback: EventCallback) -> bool {
        match self.events.borrow_mut().get_mut(name) {
            Some(slots) => {
                slots.push(Some(callback));
                true
            }
            None => false,
        }
    }

    /// Unsubscribe every slot holding `callback`.
    ///
    /// Slots are vacated, not removed, so positions stay stable.
    pub fn stop_observing(&self, name: &str, callback: &EventCallback) -> bool {
        let mut events = self.events.borrow_mut();
        let Some(slots) = events.get_mut(name) else {
            return false;
        };

        let mut removed = false;
        for slot in slots.iter_mut() {
            if slot.as_ref().is_some_and(|cb| cb.same_as(callback)) {
                *slot = None;
                removed = true;
            }
        }
        removed
    }

    /// Fire an event, calling subscribers in registration order.
    ///
    /// The subscriber list is captured before the first call, so callbacks
    /// may (un)subscribe or fire again without disturbing this delivery.
    pub fn fire(&self, name: &str, payload: &EventPayload) -> Result<()> {
        let snapshot: Slots = self
            .events
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::InvalidEvent {
                owner: self.owner.clone(),
                event: name.to_string(),
            })?;

        trace!(owner = %self.owner, event = name, slots = snapshot.len(), "firing event");
        for callback in snapshot.iter().flatten() {
            callback.call(payload);
        }
        Ok(())
    }

    /// Check whether an event is defined.
    pub fn has_event(&self, name: &str) -> bool {
        self.events.borrow().contains_key(name)
    }

    /// Defined event names, in definition order.
    pub fn list_events(&self) -> Vec<String> {
        self.events.borrow().keys().cloned().collect()
    }

    /// Number of live subscribers of an event.
    pub fn subscriber_count(&self, name: &str) -> usize {
        self.events
            .borrow()
            .get(name)
            .map(|slots| slots.iter().flatten().count())
            .unwrap_or(0)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("owner", &self.owner)
            .field("events", &self.list_events())
            .finish()
    }
}
