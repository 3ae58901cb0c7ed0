//! Configuration validation utilities.

use std::collections::HashSet;

use trellis_framework::RouteConfig;
use trellis_framework::router::CONTROLLER_PARAM;

use super::error::{ConfigError, ConfigResult};
use super::schema::{LogOutput, LoggingConfig, TrellisConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &TrellisConfig) -> ConfigResult<()> {
    validate_logging_config(&config.logging)?;
    validate_routes(&config.router.routes)?;
    validate_aliases(config)?;
    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }
    Ok(())
}

/// Validates all route definitions.
fn validate_routes(routes: &[RouteConfig]) -> ConfigResult<()> {
    let mut seen = HashSet::new();

    for route in routes {
        if route.name.is_empty() {
            return Err(ConfigError::missing_field("router.routes[].name"));
        }
        if !seen.insert(route.name.as_str()) {
            return Err(ConfigError::DuplicateRoute(route.name.clone()));
        }
        validate_route(route)?;
    }

    Ok(())
}

fn validate_route(route: &RouteConfig) -> ConfigResult<()> {
    if !route.route.starts_with('/') {
        return Err(ConfigError::invalid_route(
            &route.name,
            "pattern must start with '/'",
        ));
    }

    if route
        .defaults
        .get(CONTROLLER_PARAM)
        .is_none_or(|controller| controller.is_empty())
    {
        return Err(ConfigError::invalid_route(
            &route.name,
            "missing a `controller` default",
        ));
    }

    // Catches bad constraints and unbalanced groups before the stack is built.
    route
        .build()
        .map(drop)
        .map_err(|err| ConfigError::invalid_route(&route.name, err.to_string()))
}

fn validate_aliases(config: &TrellisConfig) -> ConfigResult<()> {
    for (type_name, identifier) in &config.injection.aliases {
        if type_name.is_empty() || identifier.is_empty() {
            return Err(ConfigError::validation(format!(
                "Invalid injection alias '{type_name}' -> '{identifier}': both sides must be non-empty"
            )));
        }
    }
    Ok(())
}
