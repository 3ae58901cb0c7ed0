//! The `params` plugin: uniform access to route and query parameters.

use url::form_urlencoded;

use super::ControllerPlugin;
use crate::controller::ControllerContext;
use crate::http::Request;

/// Reads request parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct Params;

impl ControllerPlugin for Params {
    const NAME: &'static str = "params";
}

impl Params {
    /// A route parameter from the current route match.
    pub fn from_route(&self, context: &ControllerContext, name: &str) -> Option<String> {
        context
            .route_match()
            .and_then(|route_match| route_match.param(name))
            .map(str::to_owned)
    }

    /// A query-string parameter, percent-decoded. The first occurrence wins.
    pub fn from_query(&self, request: &Request, name: &str) -> Option<String> {
        let query = request.uri().query()?;
        form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    /// A route parameter, falling back to the query string.
    pub fn get(&self, context: &ControllerContext, request: &Request, name: &str) -> Option<String> {
        self.from_route(context, name)
            .or_else(|| self.from_query(request, name))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use bytes::Bytes;

    use super::*;
    use crate::router::{RouteMatch, RouteStack};

    fn context() -> ControllerContext {
        ControllerContext::new(
            Some(RouteMatch::new("album", HashMap::new()).with_param("id", "7")),
            Arc::new(RouteStack::new()),
        )
    }

    #[test]
    fn test_route_then_query() {
        let request = ::http::Request::builder()
            .uri("/album/7?id=9&q=blue%20train&q=other")
            .body(Bytes::new())
            .unwrap();

        assert_eq!(Params.from_route(&context(), "id").as_deref(), Some("7"));
        assert_eq!(Params.from_query(&request, "id").as_deref(), Some("9"));
        assert_eq!(Params.get(&context(), &request, "q").as_deref(), Some("blue train"));
        assert_eq!(Params.get(&context(), &request, "none"), None);
    }
}
