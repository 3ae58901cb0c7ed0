//! Configuration-driven application bootstrap.
//!
//! ```rust,ignore
//! use trellis_runtime::Bootstrap;
//!
//! let app = Bootstrap::new()
//!     .services(ServiceManager::builder().factory("AlbumTable", album_table))
//!     .controllers(ControllerManager::new().action_controller::<AlbumController>("Album"))
//!     .build()?;
//!
//! let response = app.run(request)?;
//! ```

use std::sync::Arc;

use serde_json::Value;
use tracing::info;
use trellis_core::ServiceManagerBuilder;
use trellis_framework::controller::plugin::PLUGIN_MANAGER_SERVICE;
use trellis_framework::injection::CONFIG_SERVICE;
use trellis_framework::{
    Application, ApplicationBuilder, ControllerManager, PluginManager, ResponseSender, RouteStack,
};

use crate::config::{ConfigLoader, TrellisConfig, validate_config};
use crate::error::RuntimeResult;
use crate::logging;

type Configure = Box<dyn FnOnce(ApplicationBuilder) -> ApplicationBuilder + Send>;

/// Builds an [`Application`] from configuration.
///
/// `build` loads and validates the configuration, initializes logging,
/// registers the raw configuration as the `"config"` service and the plugin
/// manager as `"ControllerPluginManager"`, builds the route stack and the
/// alias table, then bootstraps the application.
pub struct Bootstrap {
    loader: ConfigLoader,
    config: Option<TrellisConfig>,
    services: ServiceManagerBuilder,
    controllers: ControllerManager,
    plugins: PluginManager,
    sender: Option<Arc<dyn ResponseSender>>,
    init_logging: bool,
    configure: Vec<Configure>,
}

impl Default for Bootstrap {
    fn default() -> Self {
        Self::new()
    }
}

impl Bootstrap {
    /// Creates a bootstrap using the default configuration loader.
    pub fn new() -> Self {
        Self {
            loader: ConfigLoader::new(),
            config: None,
            services: ServiceManagerBuilder::new(),
            controllers: ControllerManager::new(),
            plugins: PluginManager::with_builtins(),
            sender: None,
            init_logging: true,
            configure: Vec::new(),
        }
    }

    /// Replaces the configuration loader.
    pub fn config_loader(mut self, loader: ConfigLoader) -> Self {
        self.loader = loader;
        self
    }

    /// Uses `config` as-is instead of loading it.
    pub fn config(mut self, config: TrellisConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the application services.
    pub fn services(mut self, services: ServiceManagerBuilder) -> Self {
        self.services = services;
        self
    }

    /// Sets the controller catalog.
    pub fn controllers(mut self, controllers: ControllerManager) -> Self {
        self.controllers = controllers;
        self
    }

    /// Sets the controller plugins.
    pub fn plugins(mut self, plugins: PluginManager) -> Self {
        self.plugins = plugins;
        self
    }

    /// Sets the transport sender.
    pub fn sender(mut self, sender: impl ResponseSender + 'static) -> Self {
        self.sender = Some(Arc::new(sender));
        self
    }

    /// Leaves logging initialization to the caller.
    pub fn without_logging(mut self) -> Self {
        self.init_logging = false;
        self
    }

    /// Adjusts the application builder before it is built, e.g. to attach
    /// listeners.
    pub fn configure<F>(mut self, configure: F) -> Self
    where
        F: FnOnce(ApplicationBuilder) -> ApplicationBuilder + Send + 'static,
    {
        self.configure.push(Box::new(configure));
        self
    }

    fn load(&mut self) -> RuntimeResult<(TrellisConfig, Value)> {
        match self.config.take() {
            Some(config) => {
                let raw = config.to_value();
                Ok((config, raw))
            }
            None => {
                let loader = std::mem::take(&mut self.loader);
                Ok(loader.load_with_raw()?)
            }
        }
    }

    /// Loads configuration and builds the application.
    pub fn build(mut self) -> RuntimeResult<Application> {
        let (config, raw) = self.load()?;
        validate_config(&config)?;

        if self.init_logging {
            logging::init_from_config(&config.logging);
        }

        let plugins = Arc::new(self.plugins);
        let services = self
            .services
            .service(CONFIG_SERVICE, Arc::new(raw))
            .service(PLUGIN_MANAGER_SERVICE, Arc::clone(&plugins))
            .build();

        let router = RouteStack::from_config(&config.router.routes)?;
        let routes = router.len();
        let controllers = self.controllers.aliases(config.aliases());

        let mut builder = Application::builder()
            .services(services)
            .router(router)
            .controllers(controllers)
            .shared_plugins(plugins)
            .view_manager(config.view_manager);
        if let Some(sender) = self.sender {
            builder = builder.shared_sender(sender);
        }
        for configure in self.configure {
            builder = configure(builder);
        }

        let application = builder.build()?;
        info!(routes, "Application bootstrapped");
        Ok(application)
    }
}

impl std::fmt::Debug for Bootstrap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bootstrap")
            .field("config", &self.config)
            .field("controllers", &self.controllers)
            .field("plugins", &self.plugins)
            .field("init_logging", &self.init_logging)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use http::StatusCode;
    use serde_json::json;
    use trellis_core::BoxError;
    use trellis_framework::prelude::*;
    use trellis_framework::{EVENT_BOOTSTRAP, RouteConfig};

    use super::*;
    use crate::config::ConfigError;
    use crate::error::RuntimeError;

    #[derive(Injectable)]
    struct GreetingController {
        config: Option<Arc<Value>>,
        #[inject(service = "PluginManager")]
        plugins: Arc<PluginManager>,
    }

    impl Dispatchable for GreetingController {
        fn dispatch(&mut self, _: &Request, _: &mut Response) -> Result<ActionResult, BoxError> {
            let greeting = self
                .config
                .as_ref()
                .map(|config| config["greeting"].clone())
                .unwrap_or_default();
            Ok(json!({
                "greeting": greeting,
                "has_params": self.plugins.plugin::<Params>().is_some(),
            })
            .into())
        }
    }

    fn config() -> TrellisConfig {
        let mut config = TrellisConfig::default();
        config.router.routes.push(
            RouteConfig::literal("greet", "/greet").default_param("controller", "Greeting"),
        );
        config.extra.insert("greeting".into(), json!("hello"));
        config
    }

    fn bootstrap(config: TrellisConfig) -> Bootstrap {
        Bootstrap::new()
            .config(config)
            .without_logging()
            .controllers(ControllerManager::new().controller::<GreetingController>("Greeting"))
    }

    #[test]
    fn test_config_and_plugins_injected() {
        let app = bootstrap(config()).build().unwrap();

        let request = http::Request::builder()
            .uri("/greet")
            .body(Bytes::new())
            .unwrap();
        let response = app.run(request).unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body, json!({ "greeting": "hello", "has_params": true }));
    }

    #[test]
    fn test_registers_config_service() {
        let app = bootstrap(config()).build().unwrap();
        let services = app.services();

        assert!(services.has(CONFIG_SERVICE));
        assert!(services.has(PLUGIN_MANAGER_SERVICE));
        let raw = trellis_core::downcast::<Value>(&services.get(CONFIG_SERVICE).unwrap()).unwrap();
        assert_eq!(raw["greeting"], "hello");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = config();
        config.router.routes.push(config.router.routes[0].clone());

        let err = bootstrap(config).build().unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Config(ConfigError::DuplicateRoute(name)) if name == "greet"
        ));
    }

    #[test]
    fn test_configure_hook_runs_before_bootstrap() {
        let err = bootstrap(config())
            .configure(|builder| {
                builder.listener(EVENT_BOOTSTRAP, 0, |_| Err("no database".into()))
            })
            .build()
            .unwrap_err();
        assert!(matches!(err, RuntimeError::Application(_)));
    }
}
