//! Routing: mapping a request to a [`RouteMatch`].
//!
//! The dispatch coordinator only depends on the [`Router`] trait. The
//! [`RouteStack`] provided here covers literal and segment routes, which is
//! what configuration-driven applications need.

mod config;
mod literal;
mod route_match;
mod segment;
mod stack;

use std::collections::HashMap;

use crate::error::RouterResult;
use crate::http::Request;

pub use config::{RouteConfig, RouteKind};
pub use literal::LiteralRoute;
pub use route_match::{ACTION_PARAM, CONTROLLER_PARAM, RouteMatch};
pub use segment::SegmentRoute;
pub use stack::RouteStack;

/// Maps requests to route matches and assembles URLs from route names.
pub trait Router: Send + Sync {
    /// Returns the match for `request`, or `None` if no route applies.
    fn match_request(&self, request: &Request) -> Option<RouteMatch>;

    /// Builds the path for the route `name` from `params`.
    fn assemble(&self, name: &str, params: &HashMap<String, String>) -> RouterResult<String>;
}

/// A single route inside a [`RouteStack`].
pub trait Route: Send + Sync {
    /// The unique route name.
    fn name(&self) -> &str;

    /// Returns the parameters (defaults merged with captures) if `path` matches.
    fn match_path(&self, path: &str) -> Option<HashMap<String, String>>;

    /// Builds a path from `params`, falling back to the route defaults.
    fn assemble(&self, params: &HashMap<String, String>) -> RouterResult<String>;
}
