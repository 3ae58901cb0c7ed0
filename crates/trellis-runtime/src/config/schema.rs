//! Configuration schema definitions.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use trellis_framework::{RouteConfig, ViewManagerOptions, WellKnownAliases};

/// Root configuration structure.
///
/// Keys the framework does not know about are kept in [`extra`](Self::extra)
/// so application code can still read them through the `"config"` service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrellisConfig {
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Route definitions.
    #[serde(default)]
    pub router: RouterConfig,

    /// Error page options.
    #[serde(default)]
    pub view_manager: ViewManagerOptions,

    /// Constructor injection settings.
    #[serde(default)]
    pub injection: InjectionConfig,

    /// Application-specific keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TrellisConfig {
    /// The whole configuration as a JSON value, extras included.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Map::new()))
    }

    /// The built-in alias table extended with the configured entries.
    pub fn aliases(&self) -> WellKnownAliases {
        let mut aliases = WellKnownAliases::builtin();
        aliases.extend(self.injection.aliases.clone());
        aliases
    }
}

/// `router` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Routes, tried by priority then in order.
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
}

/// `injection` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InjectionConfig {
    /// Extra type name → service identifier aliases.
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
}

// =============================================================================
// Logging
// =============================================================================

/// `logging` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Global level; `RUST_LOG` overrides it.
    pub level: LogLevel,
    /// Output format.
    pub format: LogFormat,
    /// Output destination.
    pub output: LogOutput,
    /// Which span lifecycle events to log.
    pub span_events: SpanEventConfig,
    /// Include thread ids.
    pub thread_ids: bool,
    /// Include file and line.
    pub file_location: bool,
    /// Log file, for [`LogOutput::File`].
    pub file_path: Option<PathBuf>,
    /// File rotation, for [`LogOutput::File`].
    pub rotation: LogRotation,
    /// Per-module levels, e.g. `trellis_framework = "debug"`.
    pub filters: HashMap<String, LogLevel>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Compact,
            output: LogOutput::Stdout,
            span_events: SpanEventConfig::default(),
            thread_ids: false,
            file_location: false,
            file_path: None,
            rotation: LogRotation::Never,
            filters: HashMap::new(),
        }
    }
}

/// Log level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Lowercase name, as accepted by `EnvFilter` directives.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// The matching `tracing` level.
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Needs the `json-log` feature; falls back to `full` without it.
    Json,
}

/// Log destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

/// Log file rotation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    #[default]
    Never,
    Hourly,
    Daily,
}

/// Span events to log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpanEventConfig {
    pub new: bool,
    pub enter: bool,
    pub exit: bool,
    pub close: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_from_empty_document() {
        let config: TrellisConfig = serde_json::from_value(json!({})).unwrap();
        assert_eq!(config.logging.level, LogLevel::Info);
        assert!(config.router.routes.is_empty());
        assert!(!config.view_manager.display_exceptions);
        assert!(config.extra.is_empty());
    }

    #[test]
    fn test_extra_keys_kept() {
        let config: TrellisConfig = serde_json::from_value(json!({
            "db": { "dsn": "sqlite::memory:" },
            "view_manager": { "display_exceptions": true },
        }))
        .unwrap();

        assert!(config.view_manager.display_exceptions);
        let value = config.to_value();
        assert_eq!(value["db"]["dsn"], "sqlite::memory:");
        assert_eq!(value["view_manager"]["display_exceptions"], true);
    }

    #[test]
    fn test_aliases_extend_builtin() {
        let mut config = TrellisConfig::default();
        config
            .injection
            .aliases
            .insert("Mailer".into(), "mail.transport".into());

        let aliases = config.aliases();
        assert_eq!(aliases.get("Mailer"), Some("mail.transport"));
        assert_eq!(aliases.get("PluginManager"), Some("ControllerPluginManager"));
    }

    #[test]
    fn test_route_entries() {
        let config: TrellisConfig = serde_json::from_value(json!({
            "router": { "routes": [
                { "name": "home", "type": "literal", "route": "/",
                  "defaults": { "controller": "Index" } }
            ]}
        }))
        .unwrap();
        let route = &config.router.routes[0];
        assert_eq!(route.name, "home");
        assert_eq!(route.defaults["controller"], "Index");
    }
}
