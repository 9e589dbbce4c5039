//! Named-event registry shared by the event channel and SDK resources.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde_json::Value;

use crate::protocol::{AdminEvent, SubscriptionScope, scoped_event_key};

/// Callback invoked with an event's `data` payload.
pub type EventCallback = Arc<dyn Fn(Value) + Send + Sync>;

/// Handle that removes one listener registration.
///
/// Dropping the handle without calling [`Unsubscribe::unsubscribe`] leaves the
/// listener registered.
#[must_use = "dropping an Unsubscribe keeps the listener registered forever"]
pub struct Unsubscribe {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Unsubscribe {
    /// Wrap an arbitrary release action.
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// A handle that does nothing when released.
    pub fn noop() -> Self {
        Self { release: None }
    }

    /// Remove the listener this handle was returned for.
    pub fn unsubscribe(mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl std::fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Unsubscribe")
            .field("active", &self.release.is_some())
            .finish()
    }
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: HashMap<String, Vec<(u64, EventCallback)>>,
}

impl Registry {
    fn remove(&mut self, event: &str, id: u64) {
        if let Some(list) = self.listeners.get_mut(event) {
            list.retain(|(listener_id, _)| *listener_id != id);
            if list.is_empty() {
                self.listeners.remove(event);
            }
        }
    }
}

/// Event emitter keyed by event name.
///
/// Clones share the same registry.
#[derive(Clone, Default)]
pub struct EventEmitter {
    registry: Arc<Mutex<Registry>>,
}

impl EventEmitter {
    /// Create an emitter with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for `event`.
    pub fn on(&self, event: &str, callback: EventCallback) -> Unsubscribe {
        let id = {
            let mut registry = self.registry.lock();
            registry.next_id += 1;
            let id = registry.next_id;
            registry
                .listeners
                .entry(event.to_string())
                .or_default()
                .push((id, callback));
            id
        };
        tracing::trace!(event, listener = id, "Listener registered");

        let registry: Weak<Mutex<Registry>> = Arc::downgrade(&self.registry);
        let event = event.to_string();
        Unsubscribe::new(move || {
            if let Some(registry) = registry.upgrade() {
                registry.lock().remove(&event, id);
                tracing::trace!(event = %event, listener = id, "Listener removed");
            }
        })
    }

    /// Invoke every listener of `event` with a clone of `data`.
    ///
    /// Returns the number of listeners invoked.
    pub fn emit(&self, event: &str, data: &Value) -> usize {
        // Snapshot so callbacks can (un)register without holding the lock.
        let listeners: Vec<EventCallback> = self
            .registry
            .lock()
            .listeners
            .get(event)
            .map(|list| list.iter().map(|(_, cb)| Arc::clone(cb)).collect())
            .unwrap_or_default();

        for callback in &listeners {
            callback(data.clone());
        }
        listeners.len()
    }

    /// Deliver an envelope to its listeners.
    ///
    /// Resource-scoped envelopes go only to the composite
    /// `resource:id:event` key; everything else goes to the plain name.
    pub fn dispatch(&self, envelope: &AdminEvent) -> usize {
        let scoped = !envelope.resource.is_empty()
            && envelope.resource != SubscriptionScope::Global.as_str()
            && !envelope.resource_id.is_empty();
        let delivered = if scoped {
            let key = scoped_event_key(&envelope.resource, &envelope.resource_id, &envelope.event);
            self.emit(&key, &envelope.data)
        } else {
            self.emit(&envelope.event, &envelope.data)
        };

        tracing::debug!(event = %envelope.event, delivered, "Event dispatched");
        delivered
    }

    /// Number of listeners registered for `event`.
    pub fn listener_count(&self, event: &str) -> usize {
        self.registry
            .lock()
            .listeners
            .get(event)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.registry.lock();
        f.debug_struct("EventEmitter")
            .field("events", &registry.listeners.keys().collect::<Vec<_>>())
            .finish()
    }
}
