//! 404 rendering for routing and controller-lookup failures.

use std::sync::Arc;

use http::StatusCode;
use serde_json::{Value, json};
use tracing::debug;
use trellis_core::ListenerHandle;

use super::{ListenerAggregate, MvcEventManager, ViewManagerOptions};
use crate::context::{EVENT_DISPATCH_ERROR, RequestContext};

/// Message used on every not-found page.
pub const NOT_FOUND_MESSAGE: &str = "Page not found.";

/// Turns `NotFound` and `ControllerNotFound` errors into a 404 result.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteNotFoundStrategy {
    display_reason: bool,
}

impl RouteNotFoundStrategy {
    /// Creates the strategy.
    pub fn new(options: ViewManagerOptions) -> Self {
        Self {
            display_reason: options.display_not_found_reason,
        }
    }

    /// Renders the 404 result if the context holds a not-found error and no
    /// complete response yet.
    pub fn on_dispatch_error(&self, ctx: &mut RequestContext) {
        let Some(error) = ctx.error() else {
            return;
        };
        if !error.is_not_found() || ctx.result().is_some_and(|r| r.is_response()) {
            return;
        }

        let mut body = json!({ "message": NOT_FOUND_MESSAGE });
        if self.display_reason {
            body["reason"] = Value::from(error.code());
            if let Some(controller) = ctx.controller().filter(|c| !c.is_empty()) {
                body["controller"] = Value::from(controller);
            }
        }

        debug!(reason = error.code(), "Rendering not-found result");
        *ctx.response_mut().status_mut() = StatusCode::NOT_FOUND;
        ctx.set_result(body);
    }
}

impl ListenerAggregate for RouteNotFoundStrategy {
    fn attach(
        self: Arc<Self>,
        events: &MvcEventManager,
        identifier: &str,
    ) -> Vec<ListenerHandle> {
        vec![events.attach(identifier, EVENT_DISPATCH_ERROR, 0, move |ctx| {
            self.on_dispatch_error(ctx);
            Ok(None)
        })]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorReason;
    use crate::http::{ActionResult, Request};
    use crate::router::RouteStack;

    fn context(error: ErrorReason) -> RequestContext {
        let mut ctx = RequestContext::new(Request::default(), Arc::new(RouteStack::new()));
        ctx.set_error(error);
        ctx
    }

    #[test]
    fn test_renders_404() {
        let mut ctx = context(ErrorReason::NotFound);
        RouteNotFoundStrategy::default().on_dispatch_error(&mut ctx);

        assert_eq!(ctx.response().status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ctx.result().and_then(ActionResult::as_value),
            Some(&json!({ "message": NOT_FOUND_MESSAGE }))
        );
    }

    #[test]
    fn test_reason_when_enabled() {
        let mut ctx = context(ErrorReason::ControllerNotFound {
            controller: "Missing".into(),
        });
        ctx.set_controller("Missing");
        let strategy = RouteNotFoundStrategy::new(ViewManagerOptions {
            display_not_found_reason: true,
            ..Default::default()
        });
        strategy.on_dispatch_error(&mut ctx);

        let body = ctx.result().and_then(ActionResult::as_value).unwrap();
        assert_eq!(body["reason"], "error-controller-not-found");
        assert_eq!(body["controller"], "Missing");
    }

    #[test]
    fn test_ignores_other_errors() {
        let mut ctx = context(ErrorReason::Exception {
            event: "dispatch".into(),
            source: "boom".into(),
        });
        RouteNotFoundStrategy::default().on_dispatch_error(&mut ctx);
        assert!(ctx.result().is_none());
        assert_eq!(ctx.response().status(), StatusCode::OK);
    }
}
