//! Resolves the route match.

use std::sync::Arc;

use tracing::{debug, warn};
use trellis_core::ListenerHandle;

use super::{ListenerAggregate, MvcEventManager};
use crate::context::{EVENT_ROUTE, RequestContext};

/// Runs the router and stores the match on the context.
///
/// Leaves the context untouched when nothing matches; the coordinator turns
/// a missing match into a not-found error.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteListener;

impl RouteListener {
    /// Priority on the `route` event.
    pub const PRIORITY: i32 = 1;

    /// Routes the request held by `ctx`.
    pub fn on_route(&self, ctx: &mut RequestContext) {
        match ctx.router().match_request(ctx.request()) {
            Some(route_match) => {
                debug!(
                    route = route_match.matched_route_name(),
                    controller = route_match.controller().unwrap_or_default(),
                    "Route matched"
                );
                ctx.set_route_match(route_match);
            }
            None => warn!(path = ctx.request().uri().path(), "No route matched"),
        }
    }
}

impl ListenerAggregate for RouteListener {
    fn attach(
        self: Arc<Self>,
        events: &MvcEventManager,
        identifier: &str,
    ) -> Vec<ListenerHandle> {
        vec![events.attach(identifier, EVENT_ROUTE, Self::PRIORITY, move |ctx| {
            self.on_route(ctx);
            Ok(None)
        })]
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::http::Request;
    use crate::router::{RouteConfig, RouteStack};

    fn context(path: &str) -> RequestContext {
        let stack = RouteStack::from_config(&[
            RouteConfig::literal("home", "/").default_param("controller", "Index")
        ])
        .unwrap();
        let request = ::http::Request::builder().uri(path).body(Bytes::new()).unwrap();
        RequestContext::new(request, Arc::new(stack))
    }

    #[test]
    fn test_sets_route_match() {
        let mut ctx = context("/");
        RouteListener.on_route(&mut ctx);
        assert_eq!(ctx.route_match().and_then(|m| m.controller()), Some("Index"));
    }

    #[test]
    fn test_no_match_leaves_context() {
        let mut ctx = context("/missing");
        RouteListener.on_route(&mut ctx);
        assert!(ctx.route_match().is_none());
        assert!(!ctx.is_error());
    }
}
