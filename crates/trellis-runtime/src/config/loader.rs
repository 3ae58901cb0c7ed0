//! Layered configuration loading on top of figment.
//!
//! Sources, lowest precedence first:
//!
//! 1. [`TrellisConfig::default`]
//! 2. the profile file beside the main file (`trellis.production.toml`)
//! 3. the main file (`trellis.toml`, `config.toml`, `trellis.yaml`, ...)
//! 4. `TRELLIS_*` environment variables, `__` separating nested keys
//! 5. programmatic overrides ([`ConfigLoader::merge`], [`ConfigLoader::set`])
//!
//! File formats follow the `toml-config` (default) and `yaml-config`
//! features.
//!
//! Environment keys are lowercased segment by segment, except the entry
//! names under `injection.aliases`, which are type names:
//!
//! - `TRELLIS_LOGGING__LEVEL=debug` → `logging.level = "debug"`
//! - `TRELLIS_VIEW_MANAGER__DISPLAY_EXCEPTIONS=true` → `view_manager.display_exceptions = true`
//! - `TRELLIS_INJECTION__ALIASES__Mailer=mail` → `injection.aliases.Mailer = "mail"`
//!
//! ```rust,ignore
//! use trellis_runtime::config::ConfigLoader;
//!
//! let (config, raw) = ConfigLoader::new()
//!     .profile("production")
//!     .set("view_manager.display_exceptions", false)
//!     .load_with_raw()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(any(feature = "toml-config", feature = "yaml-config"))]
use figment::providers::Format;
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use figment::providers::{Env, Serialized};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, trace, warn};

use super::error::{ConfigError, ConfigResult};
use super::schema::TrellisConfig;

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "TRELLIS_";

/// Environment variable selecting the profile.
pub const PROFILE_ENV: &str = "TRELLIS_PROFILE";

/// Profile used when none is set.
pub const DEFAULT_PROFILE: &str = "development";

/// Main file names, in lookup order, for the enabled formats.
fn file_names() -> Vec<&'static str> {
    let mut names = Vec::new();
    #[cfg(feature = "toml-config")]
    names.extend(["trellis.toml", "config.toml"]);
    #[cfg(feature = "yaml-config")]
    names.extend(["trellis.yaml", "trellis.yml", "config.yaml", "config.yml"]);
    names
}

/// Maps short profile names to their canonical form.
pub fn normalize_profile(name: &str) -> String {
    match name.trim().to_lowercase().as_str() {
        "prod" | "production" => "production".to_string(),
        "dev" | "development" | "" => DEFAULT_PROFILE.to_string(),
        other => other.to_string(),
    }
}

/// The profile named by `TRELLIS_PROFILE`, or `development`.
pub fn profile_from_env() -> String {
    std::env::var(PROFILE_ENV)
        .map(|name| normalize_profile(&name))
        .unwrap_or_else(|_| DEFAULT_PROFILE.to_string())
}

/// Turns a prefix-stripped environment key into a figment key path.
fn env_key(key: &str) -> String {
    let segments: Vec<&str> = key.split("__").collect();
    let keeps_case = |index: usize| {
        index == 2
            && segments[0].eq_ignore_ascii_case("injection")
            && segments[1].eq_ignore_ascii_case("aliases")
    };
    segments
        .iter()
        .enumerate()
        .map(|(index, segment)| {
            if keeps_case(index) {
                (*segment).to_string()
            } else {
                segment.to_lowercase()
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// One layer of the configuration, in merge order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Built-in defaults.
    Defaults,
    /// Profile-specific file.
    ProfileFile(PathBuf),
    /// Main configuration file.
    File(PathBuf),
    /// `TRELLIS_*` environment variables.
    Env,
    /// Values given to the loader in code.
    Overrides,
}

/// Loads [`TrellisConfig`] from defaults, files, environment and overrides.
pub struct ConfigLoader {
    profile: String,
    search_paths: Vec<PathBuf>,
    file: Option<PathBuf>,
    env: bool,
    overrides: Figment,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// A loader searching the working directory and the user config
    /// directory, with environment variables enabled.
    pub fn new() -> Self {
        Self {
            profile: profile_from_env(),
            search_paths: Vec::new(),
            file: None,
            env: true,
            overrides: Figment::new(),
        }
    }

    /// Sets the profile (`prod` and `dev` are accepted as short names).
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.profile = normalize_profile(profile.as_ref());
        self
    }

    /// The active profile.
    pub fn active_profile(&self) -> &str {
        &self.profile
    }

    /// Adds a directory to search. Setting any replaces the default
    /// directories.
    pub fn search_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.search_paths.push(path.into());
        self
    }

    /// Loads exactly this file; it must exist.
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Enables or disables `TRELLIS_*` environment variables.
    pub fn env(mut self, enabled: bool) -> Self {
        self.env = enabled;
        self
    }

    /// Ignores environment variables.
    pub fn without_env(self) -> Self {
        self.env(false)
    }

    /// Overrides every field with `config`, above all other sources.
    pub fn merge(mut self, config: TrellisConfig) -> Self {
        self.overrides = self.overrides.merge(Serialized::defaults(config));
        self
    }

    /// Overrides one dotted key path, e.g. `"logging.level"`, above all
    /// other sources.
    pub fn set<T: Serialize>(mut self, key: &str, value: T) -> Self {
        self.overrides = self.overrides.merge(Serialized::default(key, value));
        self
    }

    /// Loads the typed configuration.
    pub fn load(self) -> ConfigResult<TrellisConfig> {
        self.load_with_raw().map(|(config, _)| config)
    }

    /// Loads the typed configuration and the merged raw document that is
    /// registered as the `"config"` service.
    pub fn load_with_raw(self) -> ConfigResult<(TrellisConfig, Value)> {
        let sources = self.sources()?;
        let profile = self.profile.clone();
        let figment = self.into_figment(&sources)?;

        let config: TrellisConfig = figment.extract()?;
        let raw: Value = figment.extract()?;

        debug!(
            profile = %profile,
            sources = sources.len(),
            level = %config.logging.level,
            routes = config.router.routes.len(),
            "Configuration loaded"
        );
        Ok((config, raw))
    }

    /// The layers `load` merges, lowest precedence first.
    pub fn sources(&self) -> ConfigResult<Vec<ConfigSource>> {
        let mut sources = vec![ConfigSource::Defaults];

        let main = match &self.file {
            Some(path) if path.exists() => Some(path.clone()),
            Some(path) => return Err(ConfigError::FileNotFound(path.clone())),
            None => self.find_main_file(),
        };
        match main {
            Some(path) => {
                if let Some(profile_path) = self.profile_file(&path) {
                    sources.push(ConfigSource::ProfileFile(profile_path));
                }
                sources.push(ConfigSource::File(path));
            }
            None => warn!("No configuration file found, using defaults"),
        }

        if self.env {
            sources.push(ConfigSource::Env);
        }
        sources.push(ConfigSource::Overrides);
        Ok(sources)
    }

    fn into_figment(self, sources: &[ConfigSource]) -> ConfigResult<Figment> {
        let mut figment = Figment::new();
        for source in sources {
            trace!(source = ?source, "Merging configuration source");
            figment = match source {
                ConfigSource::Defaults => {
                    figment.merge(Serialized::defaults(TrellisConfig::default()))
                }
                ConfigSource::ProfileFile(path) | ConfigSource::File(path) => {
                    info!(path = %path.display(), "Loading configuration file");
                    merge_file(figment, path)?
                }
                ConfigSource::Env => figment.merge(
                    Env::prefixed(ENV_PREFIX)
                        .lowercase(false)
                        .map(|key| env_key(key.as_str()).into()),
                ),
                ConfigSource::Overrides => figment.merge(self.overrides.clone()),
            };
        }
        Ok(figment)
    }

    fn search_dirs(&self) -> Vec<PathBuf> {
        if !self.search_paths.is_empty() {
            return self.search_paths.clone();
        }
        std::env::current_dir()
            .ok()
            .into_iter()
            .chain(dirs::config_dir().map(|dir| dir.join("trellis")))
            .collect()
    }

    /// First main file found; directories are tried in order, file names
    /// in lookup order within each.
    fn find_main_file(&self) -> Option<PathBuf> {
        let names = file_names();
        self.search_dirs().into_iter().find_map(|dir| {
            names
                .iter()
                .map(|name| dir.join(name))
                .find(|path| path.is_file())
        })
    }

    /// `<stem>.<profile>.<ext>` beside `main`, when it exists.
    fn profile_file(&self, main: &Path) -> Option<PathBuf> {
        let stem = main.file_stem()?.to_str()?;
        let ext = main.extension()?.to_str()?;
        let path = main.with_file_name(format!("{stem}.{}.{ext}", self.profile));
        path.is_file().then_some(path)
    }
}

impl std::fmt::Debug for ConfigLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigLoader")
            .field("profile", &self.profile)
            .field("search_paths", &self.search_paths)
            .field("file", &self.file)
            .field("env", &self.env)
            .finish_non_exhaustive()
    }
}

/// Merges a file, picking the provider from its extension.
fn merge_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
    match path.extension().and_then(|ext| ext.to_str()).unwrap_or("") {
        #[cfg(feature = "toml-config")]
        "toml" => Ok(figment.merge(Toml::file(path))),
        #[cfg(feature = "yaml-config")]
        "yaml" | "yml" => Ok(figment.merge(Yaml::file(path))),
        ext => Err(ConfigError::ParseError(format!(
            "Unsupported or disabled configuration file format: .{ext}"
        ))),
    }
}

/// Loads the configuration from the default locations.
pub fn load_config() -> ConfigResult<TrellisConfig> {
    ConfigLoader::new().load()
}

// =============================================================================
// Tests
// =============================================================================
