//! Declarative route definitions.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{LiteralRoute, Route, SegmentRoute};
use crate::error::RouterResult;

/// Which route implementation a [`RouteConfig`] builds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteKind {
    /// Exact path match.
    Literal,
    /// Pattern with placeholders and optional groups.
    #[default]
    Segment,
}

/// One route as it appears under `router.routes` in configuration.
///
/// ```yaml
/// router:
///   routes:
///     - name: album
///       route: "/album[/:action[/:id]]"
///       constraints:
///         id: "[0-9]+"
///       defaults:
///         controller: AlbumController
///         action: index
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteConfig {
    /// Route name, used for assembly.
    pub name: String,

    /// Route implementation.
    #[serde(rename = "type", default)]
    pub kind: RouteKind,

    /// The path or pattern.
    pub route: String,

    /// Regex constraints per placeholder.
    #[serde(default)]
    pub constraints: HashMap<String, String>,

    /// Parameters present on every match unless captured.
    #[serde(default)]
    pub defaults: HashMap<String, String>,

    /// Higher priorities are tried first.
    #[serde(default)]
    pub priority: i32,
}

impl RouteConfig {
    /// Creates a segment route definition with no constraints or defaults.
    pub fn segment(name: impl Into<String>, route: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: RouteKind::Segment,
            route: route.into(),
            constraints: HashMap::new(),
            defaults: HashMap::new(),
            priority: 0,
        }
    }

    /// Creates a literal route definition.
    pub fn literal(name: impl Into<String>, route: impl Into<String>) -> Self {
        Self {
            kind: RouteKind::Literal,
            ..Self::segment(name, route)
        }
    }

    /// Adds a default parameter.
    pub fn default_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.defaults.insert(name.into(), value.into());
        self
    }

    /// Adds a constraint.
    pub fn constraint(mut self, name: impl Into<String>, regex: impl Into<String>) -> Self {
        self.constraints.insert(name.into(), regex.into());
        self
    }

    /// Sets the priority.
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Compiles the definition into a route.
    pub fn build(&self) -> RouterResult<Box<dyn Route>> {
        Ok(match self.kind {
            RouteKind::Literal => Box::new(LiteralRoute::new(
                self.name.clone(),
                self.route.clone(),
                self.defaults.clone(),
            )),
            RouteKind::Segment => Box::new(SegmentRoute::new(
                self.name.clone(),
                &self.route,
                &self.constraints,
                self.defaults.clone(),
            )?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_defaults_to_segment() {
        let config: RouteConfig = serde_json::from_value(json!({
            "name": "album",
            "route": "/album[/:id]",
            "defaults": { "controller": "AlbumController" }
        }))
        .unwrap();

        assert_eq!(config.kind, RouteKind::Segment);
        assert_eq!(config.priority, 0);
        assert!(config.constraints.is_empty());
        assert!(config.build().unwrap().match_path("/album/3").is_some());
    }

    #[test]
    fn test_deserialize_literal() {
        let config: RouteConfig = serde_json::from_value(json!({
            "name": "home",
            "type": "literal",
            "route": "/",
            "priority": 5
        }))
        .unwrap();

        assert_eq!(config, RouteConfig::literal("home", "/").priority(5));
    }
}
