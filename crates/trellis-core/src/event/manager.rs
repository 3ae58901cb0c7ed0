//! Priority-ordered, identifier-scoped listener registry.
//!
//! # Ordering
//!
//! For a trigger raised under identifier `id`, the participating scopes are
//! `id`, then its declared chain (see [`EventManager::declare_chain`]), then
//! the [`WILDCARD`] scope.  Listeners from all scopes are merged and run by:
//!
//! 1. priority, highest first;
//! 2. scope precedence, most specific first;
//! 3. registration order.
//!
//! # Snapshots
//!
//! Every trigger copies the matching entries before calling the first
//! listener and releases the registry lock.  Listeners may therefore attach
//! or detach freely; the change only affects later triggers.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::{debug, trace};

use super::listener::{ListenerEntry, ListenerHandle, Propagation, WILDCARD};
use super::response::{ResponseCollection, StopCause};
use crate::error::{BoxError, EventResult, ListenerError};

struct Registry<E, R> {
    /// Per identifier, sorted by priority descending then registration order.
    listeners: HashMap<String, Vec<Arc<ListenerEntry<E, R>>>>,
    /// Identifier → less specific identifiers it also answers to.
    chains: HashMap<String, Vec<String>>,
}

/// The listener registry that drives an application's lifecycle.
///
/// `E` is the event payload handed to each listener by mutable reference;
/// `R` is the value each listener returns.
///
/// # Thread Safety
///
/// `EventManager` is `Send + Sync`.  Registration normally happens at boot;
/// runtime registration is safe because triggers operate on snapshots.
pub struct EventManager<E, R = ()> {
    registry: RwLock<Registry<E, R>>,
    next_handle: AtomicU64,
}

impl<E, R> Default for EventManager<E, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E, R> EventManager<E, R> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            registry: RwLock::new(Registry {
                listeners: HashMap::new(),
                chains: HashMap::new(),
            }),
            next_handle: AtomicU64::new(0),
        }
    }

    /// Declares the less specific identifiers that `identifier` also answers to.
    ///
    /// Chains are followed transitively, so declaring `"AlbumController"` →
    /// `["ActionController"]` and `"ActionController"` → `["Dispatchable"]`
    /// makes a trigger under `"AlbumController"` reach listeners of all three.
    pub fn declare_chain<I, S>(&self, identifier: impl Into<String>, parents: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let parents = parents.into_iter().map(Into::into).collect();
        self.registry.write().chains.insert(identifier.into(), parents);
    }

    /// Returns the scopes a trigger under `identifier` visits, most specific first.
    pub fn identifier_chain(&self, identifier: &str) -> Vec<String> {
        let registry = self.registry.read();
        let mut chain: Vec<String> = vec![identifier.to_string()];
        let mut cursor = 0;
        while cursor < chain.len() {
            if let Some(parents) = registry.chains.get(&chain[cursor]) {
                for parent in parents {
                    if !chain.contains(parent) {
                        chain.push(parent.clone());
                    }
                }
            }
            cursor += 1;
        }
        if !chain.iter().any(|id| id == WILDCARD) {
            chain.push(WILDCARD.to_string());
        }
        chain
    }

    /// Attaches `callback` to `event` under `identifier`.
    ///
    /// Higher priorities run first; equal priorities run in attach order.
    pub fn attach<F>(
        &self,
        identifier: impl Into<String>,
        event: impl Into<String>,
        priority: i32,
        callback: F,
    ) -> ListenerHandle
    where
        F: Fn(&mut E) -> Result<R, BoxError> + Send + Sync + 'static,
    {
        let handle = ListenerHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        let entry = Arc::new(ListenerEntry {
            handle,
            identifier: identifier.into(),
            event: event.into(),
            priority,
            callback: Arc::new(callback),
        });

        trace!(
            identifier = %entry.identifier,
            event = %entry.event,
            priority,
            handle = handle.0,
            "Listener attached"
        );

        let mut registry = self.registry.write();
        let scoped = registry
            .listeners
            .entry(entry.identifier.clone())
            .or_default();
        let position = scoped
            .iter()
            .position(|existing| existing.priority < priority)
            .unwrap_or(scoped.len());
        scoped.insert(position, entry);
        handle
    }

    /// Removes the listener identified by `handle` from `identifier`.
    ///
    /// Returns `false` if no such listener was attached.
    pub fn detach(&self, identifier: &str, handle: ListenerHandle) -> bool {
        let mut registry = self.registry.write();
        let Some(scoped) = registry.listeners.get_mut(identifier) else {
            return false;
        };
        let before = scoped.len();
        scoped.retain(|entry| entry.handle != handle);
        let removed = scoped.len() != before;
        if removed {
            trace!(identifier, handle = handle.0, "Listener detached");
        }
        removed
    }

    /// Removes every listener for `event` under `identifier`.
    pub fn clear_listeners(&self, identifier: &str, event: &str) {
        if let Some(scoped) = self.registry.write().listeners.get_mut(identifier) {
            scoped.retain(|entry| entry.event != event);
        }
    }

    /// Returns `true` if a trigger of `event` under `identifier` would reach a listener.
    pub fn has_listeners(&self, identifier: &str, event: &str) -> bool {
        !self.listeners(identifier, event).is_empty()
    }

    /// Returns the ordered snapshot a trigger of `event` under `identifier` would run.
    pub fn listeners(&self, identifier: &str, event: &str) -> Vec<Arc<ListenerEntry<E, R>>> {
        let chain = self.identifier_chain(identifier);
        let registry = self.registry.read();

        let mut ranked: Vec<(usize, Arc<ListenerEntry<E, R>>)> = Vec::new();
        for (rank, id) in chain.iter().enumerate() {
            if let Some(scoped) = registry.listeners.get(id) {
                ranked.extend(
                    scoped
                        .iter()
                        .filter(|entry| entry.listens_to(event))
                        .map(|entry| (rank, Arc::clone(entry))),
                );
            }
        }

        ranked.sort_by_key(|(rank, entry)| (Reverse(entry.priority), *rank, entry.handle));
        ranked.into_iter().map(|(_, entry)| entry).collect()
    }
}

impl<E: Propagation, R> EventManager<E, R> {
    /// Runs every listener for `event` under `identifier`.
    ///
    /// Iteration still halts early if a listener stops propagation.
    pub fn trigger(
        &self,
        identifier: &str,
        event: &str,
        payload: &mut E,
    ) -> EventResult<ResponseCollection<R>> {
        self.trigger_until(identifier, event, payload, |_| false)
    }

    /// Runs listeners until `until` returns `true` for one of their values.
    ///
    /// The matching value is still recorded, and the collection reports the
    /// listener that produced it via [`ResponseCollection::stopped_by`].
    pub fn trigger_until<F>(
        &self,
        identifier: &str,
        event: &str,
        payload: &mut E,
        until: F,
    ) -> EventResult<ResponseCollection<R>>
    where
        F: Fn(&R) -> bool,
    {
        payload.set_propagation_stopped(false);
        let snapshot = self.listeners(identifier, event);
        let mut responses = ResponseCollection::new();

        trace!(
            identifier,
            event,
            listeners = snapshot.len(),
            "Triggering event"
        );

        for entry in snapshot {
            let value = entry.call(payload).map_err(|source| ListenerError {
                event: event.to_string(),
                source,
            })?;

            let matched = until(&value);
            responses.push(value);

            if matched {
                debug!(
                    identifier,
                    event,
                    handle = entry.handle.0,
                    "Stop condition matched, halting listeners"
                );
                responses.mark_stopped(entry.handle, StopCause::Condition);
                break;
            }

            if payload.is_propagation_stopped() {
                debug!(
                    identifier,
                    event,
                    handle = entry.handle.0,
                    "Propagation stopped, halting listeners"
                );
                responses.mark_stopped(entry.handle, StopCause::Propagation);
                break;
            }
        }

        Ok(responses)
    }
}

impl<E, R> std::fmt::Debug for EventManager<E, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.registry.read();
        f.debug_struct("EventManager")
            .field(
                "listeners",
                &registry.listeners.values().map(Vec::len).sum::<usize>(),
            )
            .field("chains", &registry.chains.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Probe {
        log: Vec<&'static str>,
        stopped: bool,
    }

    impl Propagation for Probe {
        fn is_propagation_stopped(&self) -> bool {
            self.stopped
        }

        fn set_propagation_stopped(&mut self, stopped: bool) {
            self.stopped = stopped;
        }
    }

    type Manager = EventManager<Probe, &'static str>;

    fn logging(name: &'static str) -> impl Fn(&mut Probe) -> Result<&'static str, BoxError> {
        move |probe: &mut Probe| {
            probe.log.push(name);
            Ok(name)
        }
    }

    fn abcd() -> (Manager, Vec<ListenerHandle>) {
        let em = Manager::new();
        let handles = vec![
            em.attach("app", "route", 10, logging("A")),
            em.attach("app", "route", 5, logging("B")),
            em.attach("app", "route", 5, logging("C")),
            em.attach("app", "route", 1, logging("D")),
        ];
        (em, handles)
    }

    #[test]
    fn test_priority_then_registration_order() {
        let em = Manager::new();
        em.attach("app", "route", 1, logging("D"));
        em.attach("app", "route", 5, logging("B"));
        em.attach("app", "route", 10, logging("A"));
        em.attach("app", "route", 5, logging("C"));

        let mut probe = Probe::default();
        let responses = em.trigger("app", "route", &mut probe).unwrap();

        assert_eq!(probe.log, vec!["A", "B", "C", "D"]);
        assert_eq!(responses.into_vec(), vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn test_trigger_collects_all_values() {
        let (em, _) = abcd();
        let mut probe = Probe::default();
        let responses = em.trigger("app", "route", &mut probe).unwrap();

        assert_eq!(probe.log, vec!["A", "B", "C", "D"]);
        assert_eq!(responses.first(), Some(&"A"));
        assert_eq!(responses.last(), Some(&"D"));
        assert!(!responses.stopped());
        assert_eq!(responses.stopped_by(), None);
    }

    #[test]
    fn test_trigger_until_halts_on_match() {
        let (em, handles) = abcd();
        let mut probe = Probe::default();
        let responses = em
            .trigger_until("app", "route", &mut probe, |value| *value == "B")
            .unwrap();

        assert_eq!(probe.log, vec!["A", "B"]);
        assert!(responses.stopped());
        assert_eq!(responses.stopped_by(), Some(handles[1]));
        assert_eq!(responses.stop_cause(), Some(StopCause::Condition));
        assert_eq!(responses.last(), Some(&"B"));
    }

    #[test]
    fn test_stop_propagation_halts_and_is_reset() {
        let em = Manager::new();
        em.attach("app", "finish", 10, |probe: &mut Probe| {
            probe.log.push("stopper");
            probe.stop_propagation();
            Ok("stopper")
        });
        let after = em.attach("app", "finish", 1, logging("after"));

        let mut probe = Probe::default();
        let responses = em.trigger("app", "finish", &mut probe).unwrap();
        assert_eq!(probe.log, vec!["stopper"]);
        assert_eq!(responses.stop_cause(), Some(StopCause::Propagation));
        assert!(probe.is_propagation_stopped());

        // The flag is cleared at the start of the next trigger.
        em.detach("app", after);
        let responses = em.trigger("app", "finish", &mut probe).unwrap();
        assert_eq!(responses.len(), 1);
    }

    #[test]
    fn test_detach_removes_listener() {
        let (em, handles) = abcd();
        assert!(em.detach("app", handles[2]));
        assert!(!em.detach("app", handles[2]));
        assert!(!em.detach("other", handles[0]));

        let mut probe = Probe::default();
        em.trigger("app", "route", &mut probe).unwrap();
        assert_eq!(probe.log, vec!["A", "B", "D"]);
    }

    #[test]
    fn test_other_identifiers_do_not_fire() {
        let em = Manager::new();
        em.attach("app", "route", 1, logging("app"));
        em.attach("controller", "route", 1, logging("controller"));

        let mut probe = Probe::default();
        em.trigger("app", "route", &mut probe).unwrap();
        assert_eq!(probe.log, vec!["app"]);
    }

    #[test]
    fn test_identifier_chain_precedence() {
        let em = Manager::new();
        em.declare_chain("AlbumController", ["ActionController"]);
        em.declare_chain("ActionController", ["Dispatchable"]);

        em.attach("Dispatchable", "dispatch", 1, logging("dispatchable"));
        em.attach(WILDCARD, "dispatch", 1, logging("any"));
        em.attach("ActionController", "dispatch", 1, logging("action"));
        em.attach("AlbumController", "dispatch", 1, logging("album"));
        em.attach("ActionController", "dispatch", 2, logging("action-high"));

        assert_eq!(
            em.identifier_chain("AlbumController"),
            vec!["AlbumController", "ActionController", "Dispatchable", "*"]
        );

        let mut probe = Probe::default();
        em.trigger("AlbumController", "dispatch", &mut probe).unwrap();
        assert_eq!(
            probe.log,
            vec!["action-high", "album", "action", "dispatchable", "any"]
        );
    }

    #[test]
    fn test_wildcard_event() {
        let em = Manager::new();
        em.attach("app", WILDCARD, 0, logging("every"));
        em.attach("app", "route", 0, logging("route"));

        let mut probe = Probe::default();
        em.trigger("app", "finish", &mut probe).unwrap();
        assert_eq!(probe.log, vec!["every"]);
        assert!(em.has_listeners("app", "route"));
    }

    #[test]
    fn test_listener_error_propagates() {
        let em = Manager::new();
        em.attach("app", "dispatch", 5, |_: &mut Probe| Err("boom".into()));
        em.attach("app", "dispatch", 1, logging("never"));

        let mut probe = Probe::default();
        let err = em.trigger("app", "dispatch", &mut probe).unwrap_err();
        assert_eq!(err.event, "dispatch");
        assert_eq!(err.source.to_string(), "boom");
        assert!(probe.log.is_empty());
    }

    #[test]
    fn test_attach_during_trigger_uses_snapshot() {
        let em = Arc::new(Manager::new());
        let weak = Arc::downgrade(&em);
        em.attach("app", "route", 10, move |probe: &mut Probe| {
            probe.log.push("first");
            if let Some(em) = weak.upgrade() {
                em.attach("app", "route", 5, logging("late"));
            }
            Ok("first")
        });
        em.attach("app", "route", 1, logging("last"));

        let mut probe = Probe::default();
        em.trigger("app", "route", &mut probe).unwrap();
        assert_eq!(probe.log, vec!["first", "last"]);

        let mut probe = Probe::default();
        em.trigger("app", "route", &mut probe).unwrap();
        assert_eq!(probe.log, vec!["first", "late", "last"]);
    }

    #[test]
    fn test_detach_during_trigger_uses_snapshot() {
        let em = Arc::new(Manager::new());
        let weak = Arc::downgrade(&em);
        let victim = Arc::new(parking_lot::Mutex::new(None::<ListenerHandle>));
        let target = Arc::clone(&victim);
        em.attach("app", "route", 10, move |probe: &mut Probe| {
            probe.log.push("first");
            if let (Some(em), Some(handle)) = (weak.upgrade(), *target.lock()) {
                em.detach("app", handle);
            }
            Ok("first")
        });
        *victim.lock() = Some(em.attach("app", "route", 1, logging("victim")));

        let mut probe = Probe::default();
        em.trigger("app", "route", &mut probe).unwrap();
        assert_eq!(probe.log, vec!["first", "victim"]);

        let mut probe = Probe::default();
        em.trigger("app", "route", &mut probe).unwrap();
        assert_eq!(probe.log, vec!["first"]);
    }
}
