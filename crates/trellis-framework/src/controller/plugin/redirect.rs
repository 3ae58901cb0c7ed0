//! The `redirect` plugin: `302 Found` responses.

use std::collections::HashMap;

use bytes::Bytes;
use http::{HeaderValue, StatusCode, header};

use super::{ControllerPlugin, Url};
use crate::controller::ControllerContext;
use crate::error::{RouterError, RouterResult};
use crate::http::Response;

/// Builds redirect responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct Redirect;

impl ControllerPlugin for Redirect {
    const NAME: &'static str = "redirect";
}

impl Redirect {
    /// Redirects to `url`.
    ///
    /// Fails with [`RouterError::InvalidPattern`] if `url` is not a valid
    /// header value.
    pub fn to_url(&self, url: &str) -> RouterResult<Response> {
        let location = HeaderValue::from_str(url).map_err(|err| RouterError::InvalidPattern {
            route: url.to_string(),
            reason: err.to_string(),
        })?;

        let mut response = Response::new(Bytes::new());
        *response.status_mut() = StatusCode::FOUND;
        response.headers_mut().insert(header::LOCATION, location);
        Ok(response)
    }

    /// Redirects to the assembled route `name`.
    pub fn to_route(
        &self,
        context: &ControllerContext,
        name: &str,
        params: &HashMap<String, String>,
    ) -> RouterResult<Response> {
        let url = Url.from_route(context, Some(name), params)?;
        self.to_url(&url)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::router::{RouteConfig, RouteStack};

    #[test]
    fn test_redirect_to_route() {
        let stack = RouteStack::from_config(&[RouteConfig::literal("home", "/")]).unwrap();
        let context = ControllerContext::new(None, Arc::new(stack));

        let response = Redirect.to_route(&context, "home", &HashMap::new()).unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/");
    }

    #[test]
    fn test_redirect_rejects_bad_header() {
        assert!(Redirect.to_url("/bad\nurl").is_err());
    }
}
