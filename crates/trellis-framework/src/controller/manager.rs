//! The lazy controller factory.
//!
//! [`ControllerManager`] keeps a catalog of controller blueprints keyed by
//! name. Creating a controller resolves its constructor parameters against
//! the service registry and builds a fresh instance; nothing is cached here.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, trace};
use trellis_core::ServiceRegistry;

use super::{ActionController, ActionDispatcher, Dispatchable};
use crate::error::{InjectionError, InjectionResult};
use crate::injection::{Arguments, Injectable, ParameterResolver, ParameterSpec, WellKnownAliases};

type BuildFn = Arc<dyn Fn(Arguments) -> InjectionResult<Box<dyn Dispatchable>> + Send + Sync>;

enum Blueprint {
    Controller {
        type_name: &'static str,
        parameters: Vec<ParameterSpec>,
        build: BuildFn,
    },
    /// A known name with no concrete implementation.
    Abstract,
}

/// Catalog of dispatchable controllers and the factory that builds them.
pub struct ControllerManager {
    blueprints: HashMap<String, Blueprint>,
    resolver: ParameterResolver,
}

impl Default for ControllerManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ControllerManager {
    /// Creates an empty catalog using the built-in alias table.
    pub fn new() -> Self {
        Self {
            blueprints: HashMap::new(),
            resolver: ParameterResolver::default(),
        }
    }

    /// Replaces the parameter resolver.
    pub fn resolver(mut self, resolver: ParameterResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Replaces the alias table used by the resolver.
    pub fn aliases(self, aliases: WellKnownAliases) -> Self {
        self.resolver(ParameterResolver::new(aliases))
    }

    /// Registers a controller under `name`.
    pub fn controller<T>(mut self, name: impl Into<String>) -> Self
    where
        T: Injectable + Dispatchable + 'static,
    {
        self.insert::<T, _>(name.into(), |controller| Box::new(controller));
        self
    }

    /// Registers an action controller under `name`, wrapped in an
    /// [`ActionDispatcher`].
    pub fn action_controller<T>(mut self, name: impl Into<String>) -> Self
    where
        T: Injectable + ActionController,
    {
        self.insert::<T, _>(name.into(), |controller| {
            Box::new(ActionDispatcher::new(controller))
        });
        self
    }

    /// Declares `name` as known but not instantiable.
    pub fn abstract_controller(mut self, name: impl Into<String>) -> Self {
        self.blueprints.insert(name.into(), Blueprint::Abstract);
        self
    }

    fn insert<T, W>(&mut self, name: String, wrap: W)
    where
        T: Injectable + 'static,
        W: Fn(T) -> Box<dyn Dispatchable> + Send + Sync + 'static,
    {
        debug!(controller = %name, type_name = T::type_name(), "Registering controller");
        let build: BuildFn = Arc::new(move |arguments| T::construct(arguments).map(&wrap));
        self.blueprints.insert(
            name,
            Blueprint::Controller {
                type_name: T::type_name(),
                parameters: T::parameters(),
                build,
            },
        );
    }

    /// Returns `true` if `name` is a registered, instantiable controller.
    pub fn can_create(&self, _registry: &dyn ServiceRegistry, name: &str) -> bool {
        matches!(self.blueprints.get(name), Some(Blueprint::Controller { .. }))
    }

    /// Builds a new instance of `name`.
    ///
    /// Zero-parameter controllers are built without consulting the resolver
    /// or the registry. Resolution errors are returned unchanged and name the
    /// controller's type, not the name it was registered under.
    pub fn create(
        &self,
        registry: &dyn ServiceRegistry,
        name: &str,
    ) -> InjectionResult<Box<dyn Dispatchable>> {
        let Some(Blueprint::Controller {
            type_name,
            parameters,
            build,
        }) = self.blueprints.get(name)
        else {
            return Err(InjectionError::NotCreatable {
                handler: name.to_string(),
            });
        };

        if parameters.is_empty() {
            trace!(controller = name, type_name, "Constructing without parameters");
            return build(Arguments::empty(*type_name));
        }

        let arguments = self.resolver.resolve(type_name, parameters, registry)?;
        trace!(controller = name, type_name, arguments = arguments.len(), "Constructing");
        build(arguments)
    }

    /// Registered names (concrete and abstract), sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.blueprints.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for ControllerManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerManager")
            .field("controllers", &self.names())
            .field("resolver", &self.resolver)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;
    use trellis_core::{BoxError, ServiceArc, ServiceManager, ServiceResult};

    use super::*;
    use crate::http::{ActionResult, Request, Response};

    /// Counts every registry query.
    #[derive(Default)]
    struct CountingRegistry {
        inner: Option<ServiceManager>,
        queries: AtomicUsize,
    }

    impl ServiceRegistry for CountingRegistry {
        fn has(&self, id: &str) -> bool {
            self.queries.fetch_add(1, Ordering::SeqCst);
            self.inner.as_ref().is_some_and(|inner| inner.has(id))
        }

        fn get(&self, id: &str) -> ServiceResult<ServiceArc> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            match &self.inner {
                Some(inner) => inner.get(id),
                None => Err(trellis_core::ServiceError::not_found(id)),
            }
        }
    }

    struct BarController;

    impl Injectable for BarController {
        fn type_name() -> &'static str {
            "BarController"
        }

        fn parameters() -> Vec<ParameterSpec> {
            Vec::new()
        }

        fn construct(_: Arguments) -> InjectionResult<Self> {
            Ok(Self)
        }
    }

    impl Dispatchable for BarController {
        fn dispatch(&mut self, _: &Request, _: &mut Response) -> Result<ActionResult, BoxError> {
            Ok(json!("bar").into())
        }
    }

    trait Sample: Send + Sync {}

    struct SampleController {
        _sample: Arc<dyn Sample>,
    }

    impl Injectable for SampleController {
        fn type_name() -> &'static str {
            "SampleController"
        }

        fn parameters() -> Vec<ParameterSpec> {
            vec![ParameterSpec::service("sample", "SampleInterface")]
        }

        fn construct(arguments: Arguments) -> InjectionResult<Self> {
            Ok(Self {
                _sample: arguments.service("sample")?,
            })
        }
    }

    impl Dispatchable for SampleController {
        fn dispatch(&mut self, _: &Request, _: &mut Response) -> Result<ActionResult, BoxError> {
            Ok(json!(null).into())
        }
    }

    fn manager() -> ControllerManager {
        ControllerManager::new()
            .controller::<BarController>("BarController")
            .controller::<SampleController>("SampleController")
            .abstract_controller("AbstractController")
    }

    #[test]
    fn test_zero_parameter_skips_resolver() {
        let registry = CountingRegistry::default();
        let mut controller = manager().create(&registry, "BarController").unwrap();

        assert_eq!(registry.queries.load(Ordering::SeqCst), 0);
        let result = controller
            .dispatch(&Request::default(), &mut Response::default())
            .unwrap();
        assert_eq!(result.as_value(), Some(&json!("bar")));
    }

    #[test]
    fn test_can_create() {
        let registry = CountingRegistry::default();
        let manager = manager();
        assert!(manager.can_create(&registry, "BarController"));
        assert!(!manager.can_create(&registry, "AbstractController"));
        assert!(!manager.can_create(&registry, "Unknown"));
    }

    #[test]
    fn test_abstract_and_unknown_not_creatable() {
        let registry = CountingRegistry::default();
        for name in ["AbstractController", "Unknown"] {
            assert!(matches!(
                manager().create(&registry, name),
                Err(InjectionError::NotCreatable { handler }) if handler == name
            ));
        }
    }

    #[test]
    fn test_unresolved_service_names_parameter_and_type() {
        let registry = CountingRegistry::default();
        let Err(err) = manager().create(&registry, "SampleController") else {
            panic!("expected failure");
        };
        assert!(matches!(
            &err,
            InjectionError::UnresolvedService { handler, parameter, type_name }
                if handler == "SampleController"
                    && parameter == "sample"
                    && type_name == "SampleInterface"
        ));
    }

    #[test]
    fn test_errors_name_type_not_registration() {
        let registry = CountingRegistry::default();
        let manager = ControllerManager::new().controller::<SampleController>("Sample");
        let Err(err) = manager.create(&registry, "Sample") else {
            panic!("expected failure");
        };
        assert_eq!(err.handler(), "SampleController");
        assert!(err.to_string().contains("SampleController"));
    }

    #[test]
    fn test_resolved_via_registry() {
        struct Impl;
        impl Sample for Impl {}

        let sample: Arc<dyn Sample> = Arc::new(Impl);
        let registry = CountingRegistry {
            inner: Some(
                ServiceManager::builder()
                    .service("SampleInterface", sample)
                    .build(),
            ),
            ..Default::default()
        };
        assert!(manager().create(&registry, "SampleController").is_ok());
    }

    #[test]
    fn test_new_instance_per_create() {
        static BUILT: AtomicUsize = AtomicUsize::new(0);

        struct Counted;

        impl Injectable for Counted {
            fn type_name() -> &'static str {
                "Counted"
            }

            fn parameters() -> Vec<ParameterSpec> {
                Vec::new()
            }

            fn construct(_: Arguments) -> InjectionResult<Self> {
                BUILT.fetch_add(1, Ordering::SeqCst);
                Ok(Self)
            }
        }

        impl Dispatchable for Counted {
            fn dispatch(
                &mut self,
                _: &Request,
                _: &mut Response,
            ) -> Result<ActionResult, BoxError> {
                Ok(json!(null).into())
            }
        }

        let manager = ControllerManager::new().controller::<Counted>("Counted");
        let registry = CountingRegistry::default();
        manager.create(&registry, "Counted").unwrap();
        manager.create(&registry, "Counted").unwrap();
        assert_eq!(BUILT.load(Ordering::SeqCst), 2);
    }
}
