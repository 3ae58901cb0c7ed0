//! Resolved constructor arguments.

use std::sync::Arc;

use trellis_core::{ServiceArc, downcast};

use crate::error::{InjectionError, InjectionResult};

/// The resolved values for a constructor, positionally aligned with its
/// parameter list. `None` marks a parameter that resolved as null.
#[derive(Debug, Clone)]
pub struct Arguments {
    handler: String,
    values: Vec<(String, Option<ServiceArc>)>,
}

impl Arguments {
    /// Creates an argument list for `handler`.
    pub fn new(handler: impl Into<String>, values: Vec<(String, Option<ServiceArc>)>) -> Self {
        Self {
            handler: handler.into(),
            values,
        }
    }

    /// An empty argument list, used for zero-parameter constructors.
    pub fn empty(handler: impl Into<String>) -> Self {
        Self::new(handler, Vec::new())
    }

    /// The controller these arguments are for.
    pub fn handler(&self) -> &str {
        &self.handler
    }

    /// Number of positional arguments.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if there are no arguments.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Parameter names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(name, _)| name.as_str())
    }

    /// The erased value for `name`; `None` if absent or null.
    pub fn raw(&self, name: &str) -> Option<ServiceArc> {
        self.slot(name).and_then(Clone::clone)
    }

    /// The erased value at `index`; `None` if out of range or null.
    pub fn raw_at(&self, index: usize) -> Option<ServiceArc> {
        self.values.get(index).and_then(|(_, value)| value.clone())
    }

    /// A required service argument.
    pub fn service<T>(&self, name: &str) -> InjectionResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.optional_service(name)?
            .ok_or_else(|| InjectionError::MissingArgument {
                handler: self.handler.clone(),
                parameter: name.to_string(),
            })
    }

    /// A service argument that may have resolved as null.
    pub fn optional_service<T>(&self, name: &str) -> InjectionResult<Option<Arc<T>>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        match self.raw(name) {
            None => Ok(None),
            Some(value) => downcast::<T>(&value)
                .map(Some)
                .ok_or_else(|| self.mismatch::<T>(name)),
        }
    }

    /// A scalar argument; scalars are stored as `Arc<S>` and cloned out.
    pub fn scalar<S>(&self, name: &str) -> InjectionResult<Option<S>>
    where
        S: Clone + Send + Sync + 'static,
    {
        Ok(self.optional_service::<S>(name)?.map(|value| (*value).clone()))
    }

    fn slot(&self, name: &str) -> Option<&Option<ServiceArc>> {
        self.values
            .iter()
            .find(|(param, _)| param == name)
            .map(|(_, value)| value)
    }

    fn mismatch<T: ?Sized>(&self, name: &str) -> InjectionError {
        InjectionError::TypeMismatch {
            handler: self.handler.clone(),
            parameter: name.to_string(),
            expected: std::any::type_name::<T>(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_core::erase;

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    struct English;

    impl Greeter for English {
        fn greet(&self) -> String {
            "hello".into()
        }
    }

    fn arguments() -> Arguments {
        let greeter: Arc<dyn Greeter> = Arc::new(English);
        Arguments::new(
            "Home",
            vec![
                ("greeter".into(), Some(erase(greeter))),
                ("limit".into(), Some(erase(Arc::new(10_i64)))),
                ("missing".into(), None),
            ],
        )
    }

    #[test]
    fn test_trait_object_service() {
        let greeter = arguments().service::<dyn Greeter>("greeter").unwrap();
        assert_eq!(greeter.greet(), "hello");
    }

    #[test]
    fn test_null_argument() {
        let args = arguments();
        assert!(args.optional_service::<String>("missing").unwrap().is_none());
        assert!(matches!(
            args.service::<String>("missing"),
            Err(InjectionError::MissingArgument { parameter, .. }) if parameter == "missing"
        ));
    }

    #[test]
    fn test_scalar_and_mismatch() {
        let args = arguments();
        assert_eq!(args.scalar::<i64>("limit").unwrap(), Some(10));
        assert!(matches!(
            args.scalar::<String>("limit"),
            Err(InjectionError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_positional_access() {
        let args = arguments();
        assert_eq!(args.len(), 3);
        assert_eq!(args.names().collect::<Vec<_>>(), vec!["greeter", "limit", "missing"]);
        assert!(args.raw_at(1).is_some());
        assert!(args.raw_at(2).is_none());
    }
}
