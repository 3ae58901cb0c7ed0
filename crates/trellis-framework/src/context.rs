//! The per-request context carried through every lifecycle event.

use std::sync::Arc;

use trellis_core::Propagation;

use crate::error::ErrorReason;
use crate::http::{ActionResult, Request, Response, empty_response};
use crate::router::{RouteMatch, Router};

// =============================================================================
// Event names
// =============================================================================

/// Raised once when the application is built.
pub const EVENT_BOOTSTRAP: &str = "bootstrap";
/// Resolves the route match.
pub const EVENT_ROUTE: &str = "route";
/// Runs before the controller; a response result short-circuits it.
pub const EVENT_DISPATCH: &str = "dispatch";
/// Raised when routing or dispatch failed.
pub const EVENT_DISPATCH_ERROR: &str = "dispatch.error";
/// Always raised last; emits the response.
pub const EVENT_FINISH: &str = "finish";

/// Identifier under which the application raises lifecycle events.
pub const APPLICATION_IDENTIFIER: &str = "Application";

// =============================================================================
// RequestContext
// =============================================================================

/// Mutable state for one in-flight request.
///
/// A context is created per request, owned by the dispatch coordinator, and
/// handed by `&mut` to every listener in turn. It is never shared across
/// requests.
pub struct RequestContext {
    name: String,
    request: Request,
    response: Response,
    router: Arc<dyn Router>,
    route_match: Option<RouteMatch>,
    result: Option<ActionResult>,
    error: Option<ErrorReason>,
    controller: Option<String>,
    propagation_stopped: bool,
}

impl RequestContext {
    /// Creates a context for `request` with an empty `200 OK` response.
    pub fn new(request: Request, router: Arc<dyn Router>) -> Self {
        Self {
            name: String::new(),
            request,
            response: empty_response(),
            router,
            route_match: None,
            result: None,
            error: None,
            controller: None,
            propagation_stopped: false,
        }
    }

    /// The event currently being raised.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: &str) {
        name.clone_into(&mut self.name);
    }

    /// The request being served.
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Borrows the request and the response together, for handing both to a
    /// controller.
    pub fn request_and_response_mut(&mut self) -> (&Request, &mut Response) {
        (&self.request, &mut self.response)
    }

    /// The response being built.
    pub fn response(&self) -> &Response {
        &self.response
    }

    /// Mutable access to the response being built.
    pub fn response_mut(&mut self) -> &mut Response {
        &mut self.response
    }

    /// Replaces the response.
    pub fn set_response(&mut self, response: Response) {
        self.response = response;
    }

    /// Takes the response, leaving an empty one behind.
    pub fn take_response(&mut self) -> Response {
        std::mem::replace(&mut self.response, empty_response())
    }

    /// The application router.
    pub fn router(&self) -> &Arc<dyn Router> {
        &self.router
    }

    /// The route match, once routing succeeded.
    pub fn route_match(&self) -> Option<&RouteMatch> {
        self.route_match.as_ref()
    }

    /// Mutable access to the route match.
    pub fn route_match_mut(&mut self) -> Option<&mut RouteMatch> {
        self.route_match.as_mut()
    }

    /// Stores the route match.
    pub fn set_route_match(&mut self, route_match: RouteMatch) {
        self.route_match = Some(route_match);
    }

    /// The value produced by the most recent handler.
    pub fn result(&self) -> Option<&ActionResult> {
        self.result.as_ref()
    }

    /// Stores a result, replacing any previous one.
    pub fn set_result(&mut self, result: impl Into<ActionResult>) {
        self.result = Some(result.into());
    }

    /// Takes the result out of the context.
    pub fn take_result(&mut self) -> Option<ActionResult> {
        self.result.take()
    }

    /// Why the request entered the error stage, if it did.
    pub fn error(&self) -> Option<&ErrorReason> {
        self.error.as_ref()
    }

    /// Records the failure reason.
    pub fn set_error(&mut self, error: ErrorReason) {
        self.error = Some(error);
    }

    /// Returns `true` once an error reason is recorded.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// The controller name resolved from the route match.
    pub fn controller(&self) -> Option<&str> {
        self.controller.as_deref()
    }

    pub(crate) fn set_controller(&mut self, controller: impl Into<String>) {
        self.controller = Some(controller.into());
    }

    /// Splits the context into the response and result it produced.
    pub fn into_parts(self) -> (Response, Option<ActionResult>) {
        (self.response, self.result)
    }
}

impl Propagation for RequestContext {
    fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    fn set_propagation_stopped(&mut self, stopped: bool) {
        self.propagation_stopped = stopped;
    }
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("name", &self.name)
            .field("method", self.request.method())
            .field("uri", self.request.uri())
            .field("status", &self.response.status())
            .field("route_match", &self.route_match)
            .field("result", &self.result)
            .field("error", &self.error)
            .field("controller", &self.controller)
            .field("propagation_stopped", &self.propagation_stopped)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::RouteStack;
    use serde_json::json;

    fn context() -> RequestContext {
        RequestContext::new(Request::default(), Arc::new(RouteStack::new()))
    }

    #[test]
    fn test_new_context_is_blank() {
        let ctx = context();
        assert!(ctx.route_match().is_none());
        assert!(ctx.result().is_none());
        assert!(!ctx.is_error());
        assert!(!ctx.is_propagation_stopped());
        assert_eq!(ctx.response().status(), http::StatusCode::OK);
    }

    #[test]
    fn test_result_slot() {
        let mut ctx = context();
        ctx.set_result(json!({"a": 1}));
        assert_eq!(ctx.result().and_then(ActionResult::as_value), Some(&json!({"a": 1})));
        assert!(ctx.take_result().is_some());
        assert!(ctx.result().is_none());
    }

    #[test]
    fn test_stop_propagation() {
        let mut ctx = context();
        ctx.stop_propagation();
        assert!(ctx.is_propagation_stopped());
        ctx.set_propagation_stopped(false);
        assert!(!ctx.is_propagation_stopped());
    }
}
