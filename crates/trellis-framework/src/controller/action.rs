//! Action controllers: one handler per `action` route parameter.

use std::sync::Arc;

use http::StatusCode;
use tracing::{debug, warn};
use trellis_core::BoxError;

use super::{ContextAware, ControllerContext, Dispatchable, PluginAware, PluginManager};
use crate::http::{ActionResult, Request, Response, text_response};

/// Action used when the route match carries none.
pub const DEFAULT_ACTION: &str = "index";

/// Body of the response for unknown actions.
const NOT_FOUND_BODY: &str = "Page not found";

/// A handler for one action.
pub type Action<T> = fn(&mut T, &Request, &mut Response) -> Result<ActionResult, BoxError>;

/// A controller exposing named actions.
///
/// ```rust,ignore
/// impl ActionController for AlbumController {
///     fn actions() -> Vec<(&'static str, Action<Self>)> {
///         vec![
///             ("index", Self::index as Action<Self>),
///             ("edit", Self::edit as Action<Self>),
///         ]
///     }
/// }
/// ```
pub trait ActionController: Send + Sized + 'static {
    /// Action name to handler table.
    fn actions() -> Vec<(&'static str, Action<Self>)>;

    /// Receives the routing context before dispatch.
    fn set_context(&mut self, _context: ControllerContext) {}

    /// Receives the plugin manager before dispatch.
    fn set_plugins(&mut self, _plugins: Arc<PluginManager>) {}
}

/// Adapts an [`ActionController`] to [`Dispatchable`].
///
/// The action is read from the route match; an unknown action yields a
/// `404 Page not found` response instead of an error.
pub struct ActionDispatcher<T> {
    controller: T,
    context: Option<ControllerContext>,
}

impl<T: ActionController> ActionDispatcher<T> {
    /// Wraps `controller`.
    pub fn new(controller: T) -> Self {
        Self {
            controller,
            context: None,
        }
    }

    /// The wrapped controller.
    pub fn inner(&self) -> &T {
        &self.controller
    }

    /// The action the current route match asks for.
    pub fn action_name(&self) -> &str {
        self.context
            .as_ref()
            .and_then(ControllerContext::route_match)
            .and_then(|route_match| route_match.action())
            .unwrap_or(DEFAULT_ACTION)
    }
}

impl<T: ActionController> Dispatchable for ActionDispatcher<T> {
    fn dispatch(
        &mut self,
        request: &Request,
        response: &mut Response,
    ) -> Result<ActionResult, BoxError> {
        let action = self.action_name().to_string();
        let handler = T::actions()
            .into_iter()
            .find_map(|(name, handler)| (name == action).then_some(handler));

        match handler {
            Some(handler) => {
                debug!(action = %action, "Dispatching action");
                handler(&mut self.controller, request, response)
            }
            None => {
                warn!(action = %action, "Unknown action");
                *response.status_mut() = StatusCode::NOT_FOUND;
                Ok(text_response(StatusCode::NOT_FOUND, NOT_FOUND_BODY).into())
            }
        }
    }

    fn as_context_aware(&mut self) -> Option<&mut dyn ContextAware> {
        Some(self)
    }

    fn as_plugin_aware(&mut self) -> Option<&mut dyn PluginAware> {
        Some(self)
    }
}

impl<T: ActionController> ContextAware for ActionDispatcher<T> {
    fn set_context(&mut self, context: ControllerContext) {
        self.controller.set_context(context.clone());
        self.context = Some(context);
    }
}

impl<T: ActionController> PluginAware for ActionDispatcher<T> {
    fn set_plugins(&mut self, plugins: Arc<PluginManager>) {
        self.controller.set_plugins(plugins);
    }
}
