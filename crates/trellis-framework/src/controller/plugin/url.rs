//! The `url` plugin: assembles URLs through the application router.

use std::collections::HashMap;

use super::ControllerPlugin;
use crate::controller::ControllerContext;
use crate::error::{RouterError, RouterResult};

/// Builds URLs from route names.
#[derive(Debug, Clone, Copy, Default)]
pub struct Url;

impl ControllerPlugin for Url {
    const NAME: &'static str = "url";
}

impl Url {
    /// Assembles the route `name`, or the currently matched route when `None`.
    pub fn from_route(
        &self,
        context: &ControllerContext,
        name: Option<&str>,
        params: &HashMap<String, String>,
    ) -> RouterResult<String> {
        let name = match name {
            Some(name) => name,
            None => context
                .route_match()
                .map(|route_match| route_match.matched_route_name())
                .ok_or_else(|| RouterError::RouteNotFound(String::new()))?,
        };
        context.router().assemble(name, params)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::router::{RouteConfig, RouteMatch, RouteStack};

    fn context(route_match: Option<RouteMatch>) -> ControllerContext {
        let stack = RouteStack::from_config(&[
            RouteConfig::segment("album", "/album[/:action[/:id]]").default_param("action", "index"),
        ])
        .unwrap();
        ControllerContext::new(route_match, Arc::new(stack))
    }

    #[test]
    fn test_named_route() {
        let params = HashMap::from([
            ("action".to_string(), "edit".to_string()),
            ("id".to_string(), "3".to_string()),
        ]);
        let url = Url.from_route(&context(None), Some("album"), &params).unwrap();
        assert_eq!(url, "/album/edit/3");
    }

    #[test]
    fn test_current_route() {
        let ctx = context(Some(RouteMatch::new("album", HashMap::new())));
        assert_eq!(Url.from_route(&ctx, None, &HashMap::new()).unwrap(), "/album");

        assert!(matches!(
            Url.from_route(&context(None), None, &HashMap::new()),
            Err(RouterError::RouteNotFound(_))
        ));
    }
}
