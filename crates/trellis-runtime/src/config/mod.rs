//! Configuration module for the Trellis runtime.
//!
//! This module provides figment-based configuration loading and validation
//! for logging, routes, error pages and injection aliases.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, ConfigSource, load_config};
pub use schema::{
    InjectionConfig, LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig, RouterConfig,
    SpanEventConfig, TrellisConfig,
};
pub use validation::validate_config;
