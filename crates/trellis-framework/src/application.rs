//! The application: wiring plus the request entry points.
//!
//! # Tower Service Integration
//!
//! `Application` implements `tower::Service<Request>`, so a transport layer
//! can mount it directly or wrap it in middleware:
//!
//! ```rust,ignore
//! use tower::ServiceExt;
//!
//! let app = Application::builder()
//!     .router(RouteStack::from_config(&routes)?)
//!     .controllers(ControllerManager::new().controller::<AlbumController>("Album"))
//!     .build()?;
//!
//! let response = app.oneshot(request).await?;
//! ```

use std::sync::Arc;
use std::task::{Context, Poll};

use futures::future::{Ready, ready};
use tower::Service;
use tracing::{debug, info, info_span};
use trellis_core::{BoxError, ServiceManager, ServiceRegistry};

use crate::context::{APPLICATION_IDENTIFIER, EVENT_BOOTSTRAP, RequestContext};
use crate::controller::{ControllerManager, PluginManager};
use crate::dispatch::{DispatchCoordinator, DispatchReport};
use crate::error::ApplicationError;
use crate::http::{ActionResult, Request, Response};
use crate::listener::{
    ExceptionStrategy, ListenerAggregate, LogSender, MvcEventManager, ResponseSender,
    RouteListener, RouteNotFoundStrategy, SendResponseListener, ViewManagerOptions,
};
use crate::router::{RouteStack, Router};

type DeferredListener = Box<dyn FnOnce(&MvcEventManager, &str) + Send>;

// =============================================================================
// Application
// =============================================================================

/// A bootstrapped application.
///
/// Cheap to clone; clones share listeners, registry and controllers.
#[derive(Clone)]
pub struct Application {
    coordinator: Arc<DispatchCoordinator>,
    router: Arc<dyn Router>,
}

impl Application {
    /// Starts building an application.
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::new()
    }

    /// The lifecycle event manager. Listeners may be attached at any time;
    /// they apply from the next trigger on.
    pub fn events(&self) -> &Arc<MvcEventManager> {
        self.coordinator.events()
    }

    /// The service registry.
    pub fn services(&self) -> &Arc<dyn ServiceRegistry> {
        self.coordinator.registry()
    }

    /// The router.
    pub fn router(&self) -> &Arc<dyn Router> {
        &self.router
    }

    /// The controller factory.
    pub fn controllers(&self) -> &Arc<ControllerManager> {
        self.coordinator.controllers()
    }

    /// Runs `request` through the lifecycle and reports the path it took.
    pub fn handle(&self, request: Request) -> Result<DispatchReport, ApplicationError> {
        let span = info_span!(
            "dispatch",
            method = %request.method(),
            path = %request.uri().path(),
        );
        let _guard = span.enter();

        let ctx = RequestContext::new(request, Arc::clone(&self.router));
        let report = self.coordinator.run(ctx)?;
        debug!(
            outcome = ?report.outcome(),
            status = report.context().response().status().as_u16(),
            "Request handled"
        );
        Ok(report)
    }

    /// Runs `request` through the lifecycle and returns the emitted response.
    pub fn run(&self, request: Request) -> Result<Response, ApplicationError> {
        Ok(self.handle(request)?.into_response())
    }
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("coordinator", &self.coordinator)
            .finish_non_exhaustive()
    }
}

impl Service<Request> for Application {
    type Response = Response;
    type Error = ApplicationError;
    type Future = Ready<Result<Response, ApplicationError>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        ready(self.run(request))
    }
}

// =============================================================================
// ApplicationBuilder
// =============================================================================

/// Builder for [`Application`].
///
/// Unset parts default to an empty registry, an empty route stack, an empty
/// controller catalog, the built-in plugins and a logging response sender.
pub struct ApplicationBuilder {
    identifier: String,
    registry: Option<Arc<dyn ServiceRegistry>>,
    router: Option<Arc<dyn Router>>,
    controllers: ControllerManager,
    plugins: Arc<PluginManager>,
    view_manager: ViewManagerOptions,
    sender: Arc<dyn ResponseSender>,
    default_listeners: bool,
    aggregates: Vec<Arc<dyn AttachAggregate>>,
    listeners: Vec<DeferredListener>,
}

/// Object-safe bridge for `Arc<dyn ListenerAggregate>`-like storage.
trait AttachAggregate: Send + Sync {
    fn attach_to(self: Arc<Self>, events: &MvcEventManager, identifier: &str);
}

impl<L: ListenerAggregate> AttachAggregate for L {
    fn attach_to(self: Arc<Self>, events: &MvcEventManager, identifier: &str) {
        ListenerAggregate::attach(self, events, identifier);
    }
}

impl Default for ApplicationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicationBuilder {
    /// Creates a builder with defaults.
    pub fn new() -> Self {
        Self {
            identifier: APPLICATION_IDENTIFIER.to_string(),
            registry: None,
            router: None,
            controllers: ControllerManager::new(),
            plugins: Arc::new(PluginManager::with_builtins()),
            view_manager: ViewManagerOptions::default(),
            sender: Arc::new(LogSender),
            default_listeners: true,
            aggregates: Vec::new(),
            listeners: Vec::new(),
        }
    }

    /// Sets the identifier lifecycle events are raised under.
    pub fn identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = identifier.into();
        self
    }

    /// Sets the service registry.
    pub fn services(mut self, registry: impl ServiceRegistry + 'static) -> Self {
        self.registry = Some(Arc::new(registry));
        self
    }

    /// Sets an already shared service registry.
    pub fn shared_services(mut self, registry: Arc<dyn ServiceRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Sets the router.
    pub fn router(mut self, router: impl Router + 'static) -> Self {
        self.router = Some(Arc::new(router));
        self
    }

    /// Sets an already shared router.
    pub fn shared_router(mut self, router: Arc<dyn Router>) -> Self {
        self.router = Some(router);
        self
    }

    /// Sets the controller catalog.
    pub fn controllers(mut self, controllers: ControllerManager) -> Self {
        self.controllers = controllers;
        self
    }

    /// Sets the controller plugins.
    pub fn plugins(mut self, plugins: PluginManager) -> Self {
        self.plugins = Arc::new(plugins);
        self
    }

    /// Sets already shared controller plugins, e.g. the instance also
    /// registered as a service.
    pub fn shared_plugins(mut self, plugins: Arc<PluginManager>) -> Self {
        self.plugins = plugins;
        self
    }

    /// Sets the error page options.
    pub fn view_manager(mut self, options: ViewManagerOptions) -> Self {
        self.view_manager = options;
        self
    }

    /// Sets the transport sender used by the default `finish` listener.
    pub fn sender(mut self, sender: impl ResponseSender + 'static) -> Self {
        self.sender = Arc::new(sender);
        self
    }

    /// Sets an already shared transport sender.
    pub fn shared_sender(mut self, sender: Arc<dyn ResponseSender>) -> Self {
        self.sender = sender;
        self
    }

    /// Skips attaching the default listeners.
    pub fn without_default_listeners(mut self) -> Self {
        self.default_listeners = false;
        self
    }

    /// Attaches a listener aggregate at build time.
    pub fn aggregate<L: ListenerAggregate>(mut self, aggregate: L) -> Self {
        self.aggregates.push(Arc::new(aggregate));
        self
    }

    /// Attaches a callback at build time, before `bootstrap` is raised.
    pub fn listener<F>(mut self, event: impl Into<String>, priority: i32, callback: F) -> Self
    where
        F: Fn(&mut RequestContext) -> Result<Option<ActionResult>, BoxError>
            + Send
            + Sync
            + 'static,
    {
        let event = event.into();
        self.listeners.push(Box::new(move |events, identifier| {
            events.attach(identifier, event, priority, callback);
        }));
        self
    }

    /// Wires the listeners, raises `bootstrap` once and returns the
    /// application. A failing `bootstrap` listener is fatal.
    pub fn build(self) -> Result<Application, ApplicationError> {
        let events = Arc::new(MvcEventManager::new());
        let identifier = self.identifier;

        if self.default_listeners {
            Arc::new(RouteListener).attach(&events, &identifier);
            Arc::new(RouteNotFoundStrategy::new(self.view_manager)).attach(&events, &identifier);
            Arc::new(ExceptionStrategy::new(self.view_manager)).attach(&events, &identifier);
            Arc::new(SendResponseListener::new(self.sender)).attach(&events, &identifier);
        }
        for aggregate in self.aggregates {
            aggregate.attach_to(&events, &identifier);
        }
        for listener in self.listeners {
            listener(&events, &identifier);
        }

        let registry = self
            .registry
            .unwrap_or_else(|| Arc::new(ServiceManager::empty()));
        let router = self.router.unwrap_or_else(|| Arc::new(RouteStack::new()));
        let controllers = Arc::new(self.controllers);

        info!(
            identifier = %identifier,
            controllers = controllers.names().len(),
            "Bootstrapping application"
        );

        let coordinator = Arc::new(DispatchCoordinator::new(
            identifier.clone(),
            Arc::clone(&events),
            registry,
            controllers,
            self.plugins,
        ));

        let mut ctx = RequestContext::new(Request::default(), Arc::clone(&router));
        ctx.set_name(EVENT_BOOTSTRAP);
        events.trigger(&identifier, EVENT_BOOTSTRAP, &mut ctx)?;

        Ok(Application {
            coordinator,
            router,
        })
    }
}

impl std::fmt::Debug for ApplicationBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationBuilder")
            .field("identifier", &self.identifier)
            .field("controllers", &self.controllers)
            .field("plugins", &self.plugins)
            .field("view_manager", &self.view_manager)
            .field("default_listeners", &self.default_listeners)
            .finish_non_exhaustive()
    }
}
