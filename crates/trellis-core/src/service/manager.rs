//! The default [`ServiceRegistry`] implementation.
//!
//! [`ServiceManager`] maps string identifiers to pre-built instances or lazy
//! factories.  It is assembled once at boot through [`ServiceManagerBuilder`]
//! and its identifier set is frozen afterwards; only the lazily created
//! instances change over its lifetime.
//!
//! # Example
//!
//! ```rust,ignore
//! let services = ServiceManager::builder()
//!     .service("config", Arc::new(config_json))
//!     .factory("AlbumTable", |sm| {
//!         let db = sm.get_as::<Database>("Database")?;
//!         Ok(Arc::new(AlbumTable::new(db)))
//!     })
//!     .alias("album.table", "AlbumTable")
//!     .build();
//!
//! assert!(services.has("album.table"));
//! ```

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use super::registry::{ServiceArc, ServiceRegistry, downcast, erase};
use crate::error::{BoxError, ServiceError, ServiceResult};

/// Type-erased factory stored by the manager.
pub type FactoryFn = Arc<dyn Fn(&ServiceManager) -> Result<ServiceArc, BoxError> + Send + Sync>;

thread_local! {
    /// Identifiers currently being created on this thread, outermost first.
    static RESOLVING: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

/// Pops the resolution stack when a factory call finishes, even on error.
struct ResolvingGuard;

impl ResolvingGuard {
    fn enter(id: &str) -> ServiceResult<Self> {
        RESOLVING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.iter().any(|entry| entry == id) {
                let mut chain = stack.clone();
                chain.push(id.to_string());
                return Err(ServiceError::CircularDependency {
                    id: id.to_string(),
                    chain,
                });
            }
            stack.push(id.to_string());
            Ok(ResolvingGuard)
        })
    }
}

impl Drop for ResolvingGuard {
    fn drop(&mut self) {
        RESOLVING.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

enum Entry {
    Instance(ServiceArc),
    Factory {
        factory: FactoryFn,
        shared: bool,
        instance: Mutex<Option<ServiceArc>>,
    },
}

// =============================================================================
// ServiceManager
// =============================================================================

/// A frozen, lazily-populated service registry.
///
/// # Thread Safety
///
/// `ServiceManager` is `Send + Sync`.  Shared services are created on first
/// access; if two threads race on the same identifier the first stored
/// instance wins and both callers receive it.
pub struct ServiceManager {
    entries: HashMap<String, Entry>,
    aliases: HashMap<String, String>,
}

impl ServiceManager {
    /// Starts building a new manager.
    pub fn builder() -> ServiceManagerBuilder {
        ServiceManagerBuilder::new()
    }

    /// Creates an empty manager with no services.
    pub fn empty() -> Self {
        ServiceManagerBuilder::new().build()
    }

    /// Resolves `id` and downcasts it to `Arc<T>`.
    pub fn get_as<T>(&self, id: &str) -> ServiceResult<Arc<T>>
    where
        T: ?Sized + 'static,
    {
        let service = self.get(id)?;
        downcast::<T>(&service).ok_or_else(|| ServiceError::TypeMismatch {
            id: id.to_string(),
            expected: std::any::type_name::<T>(),
        })
    }

    /// Returns every registered identifier and alias, sorted.
    pub fn identifiers(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .entries
            .keys()
            .chain(self.aliases.keys())
            .map(String::as_str)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Returns `true` if the shared instance for `id` has already been created.
    pub fn is_instantiated(&self, id: &str) -> bool {
        let Ok(canonical) = self.resolve_alias(id) else {
            return false;
        };
        match self.entries.get(canonical) {
            Some(Entry::Instance(_)) => true,
            Some(Entry::Factory { instance, .. }) => instance.lock().is_some(),
            None => false,
        }
    }

    /// Follows the alias chain starting at `id`.
    fn resolve_alias<'a>(&'a self, id: &'a str) -> ServiceResult<&'a str> {
        let mut current = id;
        let mut seen: HashSet<&str> = HashSet::new();
        while let Some(target) = self.aliases.get(current) {
            if !seen.insert(current) {
                return Err(ServiceError::AliasCycle { id: id.to_string() });
            }
            current = target;
        }
        Ok(current)
    }

    fn create(&self, id: &str, factory: &FactoryFn) -> ServiceResult<ServiceArc> {
        let _guard = ResolvingGuard::enter(id)?;
        trace!(service = %id, "Creating service");
        factory(self).map_err(|source| match source.downcast::<ServiceError>() {
            // Keep the original error when a nested lookup inside the factory failed on a cycle.
            Ok(inner) if matches!(*inner, ServiceError::CircularDependency { .. }) => *inner,
            Ok(inner) => ServiceError::Creation {
                id: id.to_string(),
                source: inner,
            },
            Err(source) => ServiceError::Creation {
                id: id.to_string(),
                source,
            },
        })
    }
}

impl ServiceRegistry for ServiceManager {
    fn has(&self, id: &str) -> bool {
        self.resolve_alias(id)
            .map(|canonical| self.entries.contains_key(canonical))
            .unwrap_or(false)
    }

    fn get(&self, id: &str) -> ServiceResult<ServiceArc> {
        let canonical = self.resolve_alias(id)?;
        let entry = self
            .entries
            .get(canonical)
            .ok_or_else(|| ServiceError::not_found(id))?;

        match entry {
            Entry::Instance(service) => Ok(Arc::clone(service)),
            Entry::Factory {
                factory,
                shared: false,
                ..
            } => self.create(canonical, factory),
            Entry::Factory {
                factory,
                shared: true,
                instance,
            } => {
                if let Some(existing) = instance.lock().as_ref() {
                    return Ok(Arc::clone(existing));
                }
                let created = self.create(canonical, factory)?;
                let mut slot = instance.lock();
                Ok(Arc::clone(slot.get_or_insert(created)))
            }
        }
    }
}

impl std::fmt::Debug for ServiceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceManager")
            .field("services", &self.entries.len())
            .field("aliases", &self.aliases.len())
            .finish()
    }
}

// =============================================================================
// ServiceManagerBuilder
// =============================================================================

/// Builder for [`ServiceManager`].
///
/// Later registrations under the same identifier replace earlier ones.
pub struct ServiceManagerBuilder {
    instances: HashMap<String, ServiceArc>,
    factories: HashMap<String, FactoryFn>,
    aliases: HashMap<String, String>,
    shared: HashMap<String, bool>,
    shared_by_default: bool,
}

impl Default for ServiceManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceManagerBuilder {
    /// Creates an empty builder.  Factories are shared by default.
    pub fn new() -> Self {
        Self {
            instances: HashMap::new(),
            factories: HashMap::new(),
            aliases: HashMap::new(),
            shared: HashMap::new(),
            shared_by_default: true,
        }
    }

    /// Registers a pre-built instance.
    pub fn service<T>(self, id: impl Into<String>, service: Arc<T>) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.erased_service(id, erase(service))
    }

    /// Registers a pre-built, already erased instance.
    pub fn erased_service(mut self, id: impl Into<String>, service: ServiceArc) -> Self {
        let id = id.into();
        self.factories.remove(&id);
        self.instances.insert(id, service);
        self
    }

    /// Registers a lazy factory producing `Arc<T>`.
    pub fn factory<T, F>(self, id: impl Into<String>, factory: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&ServiceManager) -> Result<Arc<T>, BoxError> + Send + Sync + 'static,
    {
        self.erased_factory(id, move |sm| factory(sm).map(erase))
    }

    /// Registers a lazy factory that already returns an erased handle.
    pub fn erased_factory<F>(mut self, id: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&ServiceManager) -> Result<ServiceArc, BoxError> + Send + Sync + 'static,
    {
        let id = id.into();
        self.instances.remove(&id);
        self.factories.insert(id, Arc::new(factory));
        self
    }

    /// Makes `alias` resolve to whatever `target` resolves to.
    pub fn alias(mut self, alias: impl Into<String>, target: impl Into<String>) -> Self {
        self.aliases.insert(alias.into(), target.into());
        self
    }

    /// Overrides whether the factory for `id` caches its instance.
    pub fn shared(mut self, id: impl Into<String>, shared: bool) -> Self {
        self.shared.insert(id.into(), shared);
        self
    }

    /// Sets whether factories cache their instance unless overridden.
    pub fn shared_by_default(mut self, shared: bool) -> Self {
        self.shared_by_default = shared;
        self
    }

    /// Freezes the identifier set and returns the manager.
    pub fn build(self) -> ServiceManager {
        let mut entries: HashMap<String, Entry> = self
            .instances
            .into_iter()
            .map(|(id, service)| (id, Entry::Instance(service)))
            .collect();

        for (id, factory) in self.factories {
            let shared = self
                .shared
                .get(&id)
                .copied()
                .unwrap_or(self.shared_by_default);
            entries.insert(
                id,
                Entry::Factory {
                    factory,
                    shared,
                    instance: Mutex::new(None),
                },
            );
        }

        debug!(
            services = entries.len(),
            aliases = self.aliases.len(),
            "Service manager built"
        );

        ServiceManager {
            entries,
            aliases: self.aliases,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_instance_round_trip() {
        let config = Arc::new(String::from("cfg"));
        let sm = ServiceManager::builder()
            .service("config", Arc::clone(&config))
            .build();

        assert!(sm.has("config"));
        let got = sm.get_as::<String>("config").unwrap();
        assert!(Arc::ptr_eq(&config, &got));
    }

    #[test]
    fn test_unknown_identifier_is_not_found() {
        let sm = ServiceManager::empty();
        assert!(!sm.has("missing"));
        assert!(sm.get("missing").unwrap_err().is_not_found());
    }

    #[test]
    fn test_shared_factory_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let sm = ServiceManager::builder()
            .factory("counter", move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Arc::new(7_u32))
            })
            .build();

        assert!(!sm.is_instantiated("counter"));
        let a = sm.get_as::<u32>("counter").unwrap();
        let b = sm.get_as::<u32>("counter").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(sm.is_instantiated("counter"));
    }

    #[test]
    fn test_unshared_factory_runs_every_time() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let sm = ServiceManager::builder()
            .factory("fresh", move |_| {
                Ok(Arc::new(counter.fetch_add(1, Ordering::SeqCst)))
            })
            .shared("fresh", false)
            .build();

        assert_eq!(*sm.get_as::<usize>("fresh").unwrap(), 0);
        assert_eq!(*sm.get_as::<usize>("fresh").unwrap(), 1);
    }

    #[test]
    fn test_alias_chain_resolves() {
        let sm = ServiceManager::builder()
            .service("ValidatorManager", Arc::new(1_u8))
            .alias("validators", "ValidatorManager")
            .alias("v", "validators")
            .build();

        assert!(sm.has("v"));
        assert_eq!(*sm.get_as::<u8>("v").unwrap(), 1);
    }

    #[test]
    fn test_alias_cycle_is_reported() {
        let sm = ServiceManager::builder()
            .alias("a", "b")
            .alias("b", "a")
            .build();

        assert!(!sm.has("a"));
        assert!(matches!(sm.get("a"), Err(ServiceError::AliasCycle { .. })));
    }

    #[test]
    fn test_factory_cycle_is_detected() {
        let sm = ServiceManager::builder()
            .factory("a", |sm| sm.get_as::<u8>("b").map_err(Into::into))
            .factory("b", |sm| sm.get_as::<u8>("a").map_err(Into::into))
            .build();

        match sm.get("a") {
            Err(ServiceError::CircularDependency { id, chain }) => {
                assert_eq!(id, "a");
                assert_eq!(chain, vec!["a", "b", "a"]);
            }
            other => panic!("expected circular dependency, got {other:?}"),
        }
    }

    #[test]
    fn test_factory_error_is_wrapped() {
        let sm = ServiceManager::builder()
            .factory::<u8, _>("broken", |_| Err("database offline".into()))
            .build();

        match sm.get("broken") {
            Err(ServiceError::Creation { id, source }) => {
                assert_eq!(id, "broken");
                assert_eq!(source.to_string(), "database offline");
            }
            other => panic!("expected creation error, got {other:?}"),
        }
    }

    #[test]
    fn test_type_mismatch() {
        let sm = ServiceManager::builder()
            .service("n", Arc::new(1_i32))
            .build();
        assert!(matches!(
            sm.get_as::<String>("n"),
            Err(ServiceError::TypeMismatch { .. })
        ));
    }
}
