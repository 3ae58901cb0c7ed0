//! Parameter resolution against a service registry.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, trace};
use trellis_core::{ServiceArc, ServiceRegistry, erase};

use super::{Arguments, DefaultValue, ParamType, ParameterSpec, WellKnownAliases};
use crate::error::{InjectionError, InjectionResult};

/// Registry identifier and parameter name of the application configuration.
pub const CONFIG_SERVICE: &str = "config";

/// The outcome of resolving one parameter.
#[derive(Debug)]
pub enum ResolutionOutcome {
    /// The parameter has a value.
    Resolved(ServiceArc),
    /// The parameter is intentionally passed as absent.
    ResolvedAsNull,
    /// The parameter cannot be resolved; construction must abort.
    Failed(InjectionError),
}

impl ResolutionOutcome {
    /// Returns `true` for [`Failed`](Self::Failed).
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl From<Option<&DefaultValue>> for ResolutionOutcome {
    fn from(default: Option<&DefaultValue>) -> Self {
        match default {
            Some(DefaultValue::Value(value)) => Self::Resolved(Arc::clone(value)),
            Some(DefaultValue::Null) | None => Self::ResolvedAsNull,
        }
    }
}

/// Resolves constructor parameters to arguments.
///
/// Rules, in precedence order:
///
/// 1. untyped, no default, not named `config` → null;
/// 2. named `config` (untyped or structured) → the `"config"` service, or null;
/// 3. union type → [`InjectionError::AmbiguousType`], whatever the registry holds;
/// 4. single type → the service under the type name, then under its
///    well-known alias, then the default, else
///    [`InjectionError::UnresolvedService`];
/// 5. scalar → the default, or null. Scalars never fail.
///
/// Structured parameters with another name resolve to their default or to an
/// empty object.
#[derive(Debug, Clone, Default)]
pub struct ParameterResolver {
    aliases: WellKnownAliases,
}

impl ParameterResolver {
    /// Creates a resolver with the given alias table.
    pub fn new(aliases: WellKnownAliases) -> Self {
        Self { aliases }
    }

    /// The alias table.
    pub fn aliases(&self) -> &WellKnownAliases {
        &self.aliases
    }

    /// Resolves every parameter, stopping at the first failure.
    pub fn resolve(
        &self,
        handler: &str,
        specs: &[ParameterSpec],
        registry: &dyn ServiceRegistry,
    ) -> InjectionResult<Arguments> {
        let mut values = Vec::with_capacity(specs.len());
        for spec in specs {
            let value = match self.resolve_parameter(handler, spec, registry) {
                ResolutionOutcome::Resolved(value) => Some(value),
                ResolutionOutcome::ResolvedAsNull => None,
                ResolutionOutcome::Failed(err) => {
                    debug!(handler, parameter = spec.name(), error = %err, "Parameter resolution failed");
                    return Err(err);
                }
            };
            values.push((spec.name().to_string(), value));
        }
        Ok(Arguments::new(handler, values))
    }

    /// Resolves a single parameter.
    pub fn resolve_parameter(
        &self,
        handler: &str,
        spec: &ParameterSpec,
        registry: &dyn ServiceRegistry,
    ) -> ResolutionOutcome {
        let outcome = self.resolve_inner(handler, spec, registry);
        trace!(
            handler,
            parameter = spec.name(),
            outcome = outcome_label(&outcome),
            "Resolved parameter"
        );
        outcome
    }

    fn resolve_inner(
        &self,
        handler: &str,
        spec: &ParameterSpec,
        registry: &dyn ServiceRegistry,
    ) -> ResolutionOutcome {
        let is_config = spec.name() == CONFIG_SERVICE;

        match spec.ty() {
            ParamType::Untyped if !is_config && !spec.has_default() => {
                ResolutionOutcome::ResolvedAsNull
            }
            ParamType::Untyped | ParamType::Structured if is_config => {
                if registry.has(CONFIG_SERVICE) {
                    self.fetch(handler, spec, registry, CONFIG_SERVICE)
                } else {
                    ResolutionOutcome::ResolvedAsNull
                }
            }
            ParamType::Untyped => spec.default_value().into(),
            ParamType::Structured => match spec.default_value() {
                Some(default) => Some(default).into(),
                None => ResolutionOutcome::Resolved(erase(Arc::new(Value::Object(Map::new())))),
            },
            ParamType::Union(candidates) => {
                ResolutionOutcome::Failed(InjectionError::AmbiguousType {
                    handler: handler.to_string(),
                    parameter: spec.name().to_string(),
                    candidates: candidates.clone(),
                })
            }
            ParamType::Service(type_name) => {
                if registry.has(type_name) {
                    return self.fetch(handler, spec, registry, type_name);
                }
                if let Some(alias) = self.aliases.get(type_name)
                    && registry.has(alias)
                {
                    return self.fetch(handler, spec, registry, alias);
                }
                if spec.has_default() {
                    return spec.default_value().into();
                }
                ResolutionOutcome::Failed(InjectionError::UnresolvedService {
                    handler: handler.to_string(),
                    parameter: spec.name().to_string(),
                    type_name: type_name.clone(),
                })
            }
            ParamType::Scalar(_) => spec.default_value().into(),
        }
    }

    fn fetch(
        &self,
        handler: &str,
        spec: &ParameterSpec,
        registry: &dyn ServiceRegistry,
        id: &str,
    ) -> ResolutionOutcome {
        match registry.get(id) {
            Ok(service) => ResolutionOutcome::Resolved(service),
            Err(source) => ResolutionOutcome::Failed(InjectionError::Service {
                handler: handler.to_string(),
                parameter: spec.name().to_string(),
                source,
            }),
        }
    }
}

fn outcome_label(outcome: &ResolutionOutcome) -> &'static str {
    match outcome {
        ResolutionOutcome::Resolved(_) => "resolved",
        ResolutionOutcome::ResolvedAsNull => "null",
        ResolutionOutcome::Failed(_) => "failed",
    }
}
