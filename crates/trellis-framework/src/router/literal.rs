//! Exact-path routes.

use std::collections::HashMap;

use super::Route;
use crate::error::RouterResult;

/// Matches one path exactly and yields its defaults as parameters.
#[derive(Debug, Clone)]
pub struct LiteralRoute {
    name: String,
    path: String,
    defaults: HashMap<String, String>,
}

impl LiteralRoute {
    /// Creates a literal route.
    pub fn new(
        name: impl Into<String>,
        path: impl Into<String>,
        defaults: HashMap<String, String>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            defaults,
        }
    }
}

impl Route for LiteralRoute {
    fn name(&self) -> &str {
        &self.name
    }

    fn match_path(&self, path: &str) -> Option<HashMap<String, String>> {
        (path == self.path).then(|| self.defaults.clone())
    }

    fn assemble(&self, _params: &HashMap<String, String>) -> RouterResult<String> {
        Ok(self.path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match_only() {
        let route = LiteralRoute::new(
            "home",
            "/",
            HashMap::from([("controller".to_string(), "Index".to_string())]),
        );

        let params = route.match_path("/").unwrap();
        assert_eq!(params.get("controller").map(String::as_str), Some("Index"));
        assert!(route.match_path("/other").is_none());
        assert_eq!(route.assemble(&HashMap::new()).unwrap(), "/");
    }
}
