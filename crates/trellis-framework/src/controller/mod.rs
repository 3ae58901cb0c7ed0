//! Controllers and their optional capabilities.
//!
//! A controller is anything implementing [`Dispatchable`]. Extra behaviour is
//! opt-in through small capability traits, queried at dispatch time:
//!
//! - [`ContextAware`] receives the route match and router before dispatch.
//! - [`PluginAware`] receives the shared [`PluginManager`].
//!
//! [`ActionController`] plus [`ActionDispatcher`] cover the common "one
//! method per action" shape.

mod action;
mod manager;
pub mod plugin;

use std::sync::Arc;

use trellis_core::BoxError;

use crate::http::{ActionResult, Request, Response};
use crate::router::{RouteMatch, Router};

pub use action::{Action, ActionController, ActionDispatcher, DEFAULT_ACTION};
pub use manager::ControllerManager;
pub use plugin::{ControllerPlugin, Params, PluginManager, Redirect, Url};

/// The single operation a controller exposes.
pub trait Dispatchable: Send {
    /// Handles the request, returning a value or a complete response.
    fn dispatch(
        &mut self,
        request: &Request,
        response: &mut Response,
    ) -> Result<ActionResult, BoxError>;

    /// Returns the context-injection capability, if supported.
    fn as_context_aware(&mut self) -> Option<&mut dyn ContextAware> {
        None
    }

    /// Returns the plugin-access capability, if supported.
    fn as_plugin_aware(&mut self) -> Option<&mut dyn PluginAware> {
        None
    }
}

/// Routing state handed to a [`ContextAware`] controller.
#[derive(Clone)]
pub struct ControllerContext {
    route_match: Option<RouteMatch>,
    router: Arc<dyn Router>,
}

impl ControllerContext {
    /// Creates a context.
    pub fn new(route_match: Option<RouteMatch>, router: Arc<dyn Router>) -> Self {
        Self {
            route_match,
            router,
        }
    }

    /// The route match of the current request.
    pub fn route_match(&self) -> Option<&RouteMatch> {
        self.route_match.as_ref()
    }

    /// The application router.
    pub fn router(&self) -> &Arc<dyn Router> {
        &self.router
    }
}

impl std::fmt::Debug for ControllerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerContext")
            .field("route_match", &self.route_match)
            .finish_non_exhaustive()
    }
}

/// Controllers that want the route match and router.
pub trait ContextAware {
    /// Called once before dispatch.
    fn set_context(&mut self, context: ControllerContext);
}

/// Controllers that want access to controller plugins.
pub trait PluginAware {
    /// Called once before dispatch.
    fn set_plugins(&mut self, plugins: Arc<PluginManager>);
}
