//! The service registry boundary.

use std::any::Any;
use std::sync::Arc;

use crate::error::ServiceResult;

/// Type-erased service handle stored in a registry.
///
/// The inner `dyn Any` is always an `Arc<T>` (where `T` may be a trait
/// object), upcast to `Any` by [`erase`].  Consumers call [`downcast`] to get
/// the typed `Arc<T>` back without copying the service.
pub type ServiceArc = Arc<dyn Any + Send + Sync>;

/// Erases a typed service handle into a [`ServiceArc`].
///
/// ```rust,ignore
/// let store: Arc<dyn AlbumStore> = Arc::new(MemoryStore::default());
/// let erased = erase(store);
/// let back = downcast::<dyn AlbumStore>(&erased).unwrap();
/// ```
pub fn erase<T>(service: Arc<T>) -> ServiceArc
where
    T: ?Sized + Send + Sync + 'static,
{
    Arc::new(service)
}

/// Recovers the typed handle from a [`ServiceArc`] produced by [`erase`].
///
/// Returns `None` when the erased value holds a different type.
pub fn downcast<T>(service: &ServiceArc) -> Option<Arc<T>>
where
    T: ?Sized + 'static,
{
    service.downcast_ref::<Arc<T>>().map(Arc::clone)
}

/// A string-keyed resolver of shared or factory-constructed objects.
///
/// The registry is process-wide and its identifier set is fixed after boot;
/// individual entries may still be instantiated lazily on first `get`.
pub trait ServiceRegistry: Send + Sync {
    /// Returns `true` if `id` can be resolved by [`get`](Self::get).
    fn has(&self, id: &str) -> bool;

    /// Resolves `id`, instantiating it if needed.
    ///
    /// Fails with [`ServiceError::NotFound`](crate::ServiceError::NotFound)
    /// when the identifier is unknown.
    fn get(&self, id: &str) -> ServiceResult<ServiceArc>;
}

impl<R: ServiceRegistry + ?Sized> ServiceRegistry for Arc<R> {
    fn has(&self, id: &str) -> bool {
        (**self).has(id)
    }

    fn get(&self, id: &str) -> ServiceResult<ServiceArc> {
        (**self).get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    struct English;

    impl Greeter for English {
        fn greet(&self) -> String {
            "hello".into()
        }
    }

    #[test]
    fn test_erase_and_downcast_trait_object() {
        let greeter: Arc<dyn Greeter> = Arc::new(English);
        let erased = erase(greeter);

        let back = downcast::<dyn Greeter>(&erased).unwrap();
        assert_eq!(back.greet(), "hello");
    }

    #[test]
    fn test_downcast_wrong_type_is_none() {
        let erased = erase(Arc::new(42_i64));
        assert!(downcast::<String>(&erased).is_none());
        assert_eq!(*downcast::<i64>(&erased).unwrap(), 42);
    }

    #[test]
    fn test_downcast_preserves_identity() {
        let value = Arc::new(String::from("shared"));
        let erased = erase(Arc::clone(&value));
        let back = downcast::<String>(&erased).unwrap();
        assert!(Arc::ptr_eq(&value, &back));
    }
}
