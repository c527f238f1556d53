//! Process lifecycle notifications.
//!
//! Caches subscribe to an event source and are told, synchronously, when the
//! inspected process stops, loads a new object file, or exits.

use std::fmt;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    /// Execution halted (breakpoint, step, signal)
    Stopped,
    /// An executable or shared library was loaded
    NewObjfile,
    /// The inspected process instance is gone
    Exited,
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleEvent::Stopped => "stop",
            LifecycleEvent::NewObjfile => "new_objfile",
            LifecycleEvent::Exited => "exit",
        };
        f.write_str(name)
    }
}

/// Something that reacts to lifecycle events
pub trait LifecycleListener: Send {
    fn on_event(&mut self, event: LifecycleEvent);
}

/// Anything that can deliver lifecycle events to listeners
pub trait LifecycleEvents {
    fn subscribe(&mut self, listener: Arc<Mutex<dyn LifecycleListener>>);
}

/// In-process event source that fans each event out to its subscribers in
/// registration order
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<Arc<Mutex<dyn LifecycleListener>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `event` to every subscriber
    pub fn fire(&self, event: LifecycleEvent) {
        tracing::debug!(%event, listeners = self.listeners.len(), "Dispatching lifecycle event");
        for listener in &self.listeners {
            let mut guard = listener.lock().unwrap_or_else(|e| e.into_inner());
            guard.on_event(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl LifecycleEvents for EventBus {
    fn subscribe(&mut self, listener: Arc<Mutex<dyn LifecycleListener>>) {
        self.listeners.push(listener);
    }
}
