//! Constructor parameter descriptors.

use std::sync::Arc;

use trellis_core::{ServiceArc, erase};

/// Scalar categories a parameter may be declared as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    /// Text.
    String,
    /// Signed or unsigned integer.
    Integer,
    /// Floating point.
    Float,
    /// Boolean.
    Bool,
}

/// The declared type of a constructor parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    /// No declared type.
    Untyped,
    /// Generic structured data (a JSON value).
    Structured,
    /// A scalar; never looked up in the registry.
    Scalar(ScalarKind),
    /// A single class or interface, looked up by name.
    Service(String),
    /// More than one acceptable type.
    Union(Vec<String>),
}

/// The default a parameter falls back to.
#[derive(Debug, Clone)]
pub enum DefaultValue {
    /// The parameter defaults to absence.
    Null,
    /// A concrete default, erased like a registry entry.
    Value(ServiceArc),
}

/// One constructor parameter: name, declared type and optional default.
#[derive(Debug, Clone)]
pub struct ParameterSpec {
    name: String,
    ty: ParamType,
    default: Option<DefaultValue>,
}

impl ParameterSpec {
    /// Creates a parameter of the given type with no default.
    pub fn new(name: impl Into<String>, ty: ParamType) -> Self {
        Self {
            name: name.into(),
            ty,
            default: None,
        }
    }

    /// An untyped parameter.
    pub fn untyped(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Untyped)
    }

    /// A structured-data parameter.
    pub fn structured(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Structured)
    }

    /// A scalar parameter.
    pub fn scalar(name: impl Into<String>, kind: ScalarKind) -> Self {
        Self::new(name, ParamType::Scalar(kind))
    }

    /// A parameter typed as a single service.
    pub fn service(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Service(type_name.into()))
    }

    /// A parameter typed as a union of services.
    pub fn union<I, S>(name: impl Into<String>, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            name,
            ParamType::Union(types.into_iter().map(Into::into).collect()),
        )
    }

    /// Sets a `null` default.
    pub fn with_null_default(mut self) -> Self {
        self.default = Some(DefaultValue::Null);
        self
    }

    /// Sets a concrete default.
    pub fn with_default<T: Send + Sync + 'static>(mut self, value: T) -> Self {
        self.default = Some(DefaultValue::Value(erase(Arc::new(value))));
        self
    }

    /// The parameter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared type.
    pub fn ty(&self) -> &ParamType {
        &self.ty
    }

    /// The default, if any.
    pub fn default_value(&self) -> Option<&DefaultValue> {
        self.default.as_ref()
    }

    /// Returns `true` if a default is declared.
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}
