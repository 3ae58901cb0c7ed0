//! A priority-ordered list of routes.

use std::collections::HashMap;

use tracing::{debug, trace};

use super::{Route, RouteConfig, RouteMatch, Router};
use crate::error::{RouterError, RouterResult};
use crate::http::Request;

struct StackEntry {
    priority: i32,
    route: Box<dyn Route>,
}

/// Tries routes in priority order (highest first, then registration order)
/// and returns the first match.
#[derive(Default)]
pub struct RouteStack {
    entries: Vec<StackEntry>,
}

impl RouteStack {
    /// Creates an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a stack from route definitions.
    pub fn from_config(routes: &[RouteConfig]) -> RouterResult<Self> {
        let mut stack = Self::new();
        for config in routes {
            stack.add_route(config.build()?, config.priority)?;
        }
        Ok(stack)
    }

    /// Adds a route. Names must be unique within the stack.
    pub fn add_route(&mut self, route: Box<dyn Route>, priority: i32) -> RouterResult<()> {
        if self.entries.iter().any(|e| e.route.name() == route.name()) {
            return Err(RouterError::DuplicateRoute(route.name().to_string()));
        }

        debug!(route = route.name(), priority, "Adding route");

        // Insert after every entry with priority >= ours to keep ties stable.
        let position = self
            .entries
            .iter()
            .position(|e| e.priority < priority)
            .unwrap_or(self.entries.len());
        self.entries.insert(position, StackEntry { priority, route });
        Ok(())
    }

    /// Returns the route names in matching order.
    pub fn route_names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.route.name()).collect()
    }

    /// Number of routes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no route is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Matches a bare path.
    pub fn match_path(&self, path: &str) -> Option<RouteMatch> {
        self.entries.iter().find_map(|entry| {
            let params = entry.route.match_path(path)?;
            trace!(route = entry.route.name(), path, "Route matched");
            Some(RouteMatch::new(entry.route.name(), params))
        })
    }
}

impl Router for RouteStack {
    fn match_request(&self, request: &Request) -> Option<RouteMatch> {
        self.match_path(request.uri().path())
    }

    fn assemble(&self, name: &str, params: &HashMap<String, String>) -> RouterResult<String> {
        self.entries
            .iter()
            .find(|e| e.route.name() == name)
            .ok_or_else(|| RouterError::RouteNotFound(name.to_string()))?
            .route
            .assemble(params)
    }
}

impl std::fmt::Debug for RouteStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteStack")
            .field("routes", &self.route_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn stack() -> RouteStack {
        RouteStack::from_config(&[
            RouteConfig::segment("catch", "/:controller").priority(-1),
            RouteConfig::literal("home", "/").default_param("controller", "Index"),
            RouteConfig::segment("user", "/user/:id").default_param("controller", "User"),
            RouteConfig::literal("about", "/about")
                .default_param("controller", "About")
                .priority(10),
        ])
        .unwrap()
    }

    #[test]
    fn test_priority_then_registration_order() {
        assert_eq!(stack().route_names(), vec!["about", "home", "user", "catch"]);
    }

    #[test]
    fn test_higher_priority_wins() {
        let stack = stack();
        let route_match = stack.match_path("/about").unwrap();
        assert_eq!(route_match.matched_route_name(), "about");
        assert_eq!(route_match.controller(), Some("About"));

        let route_match = stack.match_path("/Blog").unwrap();
        assert_eq!(route_match.matched_route_name(), "catch");
        assert_eq!(route_match.controller(), Some("Blog"));
    }

    #[test]
    fn test_match_request_uses_path_only() {
        let request = ::http::Request::builder()
            .uri("/user/5?tab=posts")
            .body(Bytes::new())
            .unwrap();
        let route_match = stack().match_request(&request).unwrap();
        assert_eq!(route_match.param("id"), Some("5"));
    }

    #[test]
    fn test_assemble_by_name() {
        let stack = stack();
        let params = HashMap::from([("id".to_string(), "9".to_string())]);
        assert_eq!(stack.assemble("user", &params).unwrap(), "/user/9");
        assert!(matches!(
            stack.assemble("nope", &params),
            Err(RouterError::RouteNotFound(_))
        ));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let err = RouteStack::from_config(&[
            RouteConfig::literal("home", "/"),
            RouteConfig::literal("home", "/index"),
        ])
        .unwrap_err();
        assert!(matches!(err, RouterError::DuplicateRoute(name) if name == "home"));
    }
}
