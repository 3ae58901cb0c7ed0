//! Listener entries and the propagation contract.

use std::sync::Arc;

use crate::error::BoxError;

/// Wildcard usable both as an event name and as an identifier.
///
/// A listener attached to event `"*"` receives every event raised for its
/// identifier; a listener attached under identifier `"*"` receives the event
/// regardless of which identifier raised it.
pub const WILDCARD: &str = "*";

/// Implemented by event payloads that carry a stop-propagation flag.
///
/// The pipeline clears the flag when a trigger starts and checks it after
/// every listener call.
pub trait Propagation {
    /// Returns `true` once a listener asked to halt the current trigger.
    fn is_propagation_stopped(&self) -> bool;

    /// Sets or clears the stop-propagation flag.
    fn set_propagation_stopped(&mut self, stopped: bool);

    /// Convenience for `set_propagation_stopped(true)`.
    fn stop_propagation(&mut self) {
        self.set_propagation_stopped(true);
    }
}

/// A type-erased listener callback.
///
/// Errors are not caught by the pipeline: the first `Err` aborts the trigger
/// and is returned to the caller.
pub type ListenerFn<E, R> = Arc<dyn Fn(&mut E) -> Result<R, BoxError> + Send + Sync>;

/// Opaque handle identifying one attached listener.
///
/// Handles are allocated in increasing order, so they also record the
/// registration order used to break priority ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerHandle(pub(crate) u64);

impl ListenerHandle {
    /// Returns the registration sequence number.
    pub fn sequence(&self) -> u64 {
        self.0
    }
}

/// One listener attached to an event under an identifier scope.
pub struct ListenerEntry<E, R> {
    pub(crate) handle: ListenerHandle,
    pub(crate) identifier: String,
    pub(crate) event: String,
    pub(crate) priority: i32,
    pub(crate) callback: ListenerFn<E, R>,
}

impl<E, R> ListenerEntry<E, R> {
    /// Returns the handle used to detach this listener.
    pub fn handle(&self) -> ListenerHandle {
        self.handle
    }

    /// Returns the identifier scope the listener was attached under.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Returns the event name (possibly [`WILDCARD`]).
    pub fn event(&self) -> &str {
        &self.event
    }

    /// Returns the priority; higher runs first.
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Returns `true` if this listener fires for `event`.
    pub(crate) fn listens_to(&self, event: &str) -> bool {
        self.event == event || self.event == WILDCARD
    }

    pub(crate) fn call(&self, payload: &mut E) -> Result<R, BoxError> {
        (self.callback)(payload)
    }
}

impl<E, R> std::fmt::Debug for ListenerEntry<E, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerEntry")
            .field("handle", &self.handle)
            .field("identifier", &self.identifier)
            .field("event", &self.event)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}
