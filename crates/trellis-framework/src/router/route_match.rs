//! The result of matching a request against a router.

use std::collections::HashMap;

/// Parameter naming the controller to dispatch to.
pub const CONTROLLER_PARAM: &str = "controller";

/// Parameter naming the action within the controller.
pub const ACTION_PARAM: &str = "action";

/// A matched route: its name plus the merged defaults and captured parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteMatch {
    matched_route_name: String,
    params: HashMap<String, String>,
}

impl RouteMatch {
    /// Creates a match for `route_name` with the given parameters.
    pub fn new(route_name: impl Into<String>, params: HashMap<String, String>) -> Self {
        Self {
            matched_route_name: route_name.into(),
            params,
        }
    }

    /// Builder-style [`set_param`](Self::set_param).
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_param(name, value);
        self
    }

    /// Sets or overwrites a parameter.
    pub fn set_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.params.insert(name.into(), value.into());
    }

    /// Returns the parameter `name`, if present.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Returns all parameters.
    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    /// Returns the name of the route that matched.
    pub fn matched_route_name(&self) -> &str {
        &self.matched_route_name
    }

    /// Returns the `controller` parameter.
    pub fn controller(&self) -> Option<&str> {
        self.param(CONTROLLER_PARAM)
    }

    /// Returns the `action` parameter.
    pub fn action(&self) -> Option<&str> {
        self.param(ACTION_PARAM)
    }
}
