//! Controller plugins: shared helpers controllers look up by name.
//!
//! The [`PluginManager`] is a small registry of plugin objects. It ships with
//! [`Params`], [`Url`] and [`Redirect`]; applications add their own with
//! [`PluginManager::register`].
//!
//! ```rust,ignore
//! impl PluginAware for AlbumController {
//!     fn set_plugins(&mut self, plugins: Arc<PluginManager>) {
//!         self.plugins = Some(plugins);
//!     }
//! }
//!
//! let redirect = plugins.plugin::<Redirect>().unwrap();
//! return Ok(redirect.to_route(&ctx, "album", &HashMap::new())?.into());
//! ```

mod params;
mod redirect;
mod url;

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;
use trellis_core::{ServiceArc, ServiceError, ServiceRegistry, ServiceResult, downcast, erase};

pub use self::params::Params;
pub use self::redirect::Redirect;
pub use self::url::Url;

/// Registry identifier under which applications conventionally expose the
/// plugin manager.
pub const PLUGIN_MANAGER_SERVICE: &str = "ControllerPluginManager";

/// A plugin registered under a fixed name.
pub trait ControllerPlugin: Any + Send + Sync {
    /// Lookup name, e.g. `"redirect"`.
    const NAME: &'static str;
}

/// Name-keyed registry of controller plugins.
pub struct PluginManager {
    plugins: HashMap<String, ServiceArc>,
}

impl Default for PluginManager {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl PluginManager {
    /// A manager with no plugins.
    pub fn empty() -> Self {
        Self {
            plugins: HashMap::new(),
        }
    }

    /// A manager holding `params`, `url` and `redirect`.
    pub fn with_builtins() -> Self {
        Self::empty()
            .with(Params::default())
            .with(Url::default())
            .with(Redirect::default())
    }

    /// Registers `plugin` under [`ControllerPlugin::NAME`].
    pub fn register<P: ControllerPlugin>(&mut self, plugin: P) {
        self.register_as(P::NAME, Arc::new(plugin));
    }

    /// Builder-style [`register`](Self::register).
    pub fn with<P: ControllerPlugin>(mut self, plugin: P) -> Self {
        self.register(plugin);
        self
    }

    /// Registers any shared value under `name`, replacing an existing entry.
    pub fn register_as<T>(&mut self, name: impl Into<String>, plugin: Arc<T>)
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let name = name.into();
        debug!(plugin = %name, "Registering controller plugin");
        self.plugins.insert(name, erase(plugin));
    }

    /// Returns the plugin registered under `P::NAME`.
    pub fn plugin<P: ControllerPlugin>(&self) -> Option<Arc<P>> {
        self.get_as(P::NAME)
    }

    /// Returns the plugin under `name` as `T`.
    pub fn get_as<T>(&self, name: &str) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.plugins.get(name).and_then(downcast::<T>)
    }

    /// Registered plugin names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.plugins.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl ServiceRegistry for PluginManager {
    fn has(&self, id: &str) -> bool {
        self.plugins.contains_key(id)
    }

    fn get(&self, id: &str) -> ServiceResult<ServiceArc> {
        self.plugins
            .get(id)
            .cloned()
            .ok_or_else(|| ServiceError::not_found(id))
    }
}

impl std::fmt::Debug for PluginManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginManager")
            .field("plugins", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct FlashMessenger {
        namespace: String,
    }

    impl ControllerPlugin for FlashMessenger {
        const NAME: &'static str = "flashMessenger";
    }

    #[test]
    fn test_builtins_present() {
        let plugins = PluginManager::with_builtins();
        assert_eq!(plugins.names(), vec!["params", "redirect", "url"]);
        assert!(plugins.plugin::<Redirect>().is_some());
        assert!(plugins.has("url"));
    }

    #[test]
    fn test_custom_plugin() {
        let mut plugins = PluginManager::empty();
        plugins.register(FlashMessenger {
            namespace: "default".into(),
        });

        let flash = plugins.plugin::<FlashMessenger>().unwrap();
        assert_eq!(flash.namespace, "default");
        assert!(plugins.get_as::<Params>("flashMessenger").is_none());
        assert!(plugins.get("missing").unwrap_err().is_not_found());
    }
}
