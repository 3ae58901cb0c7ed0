//! Error types for the Trellis framework.

use thiserror::Error;
use trellis_core::{BoxError, ListenerError, ServiceError};

/// Errors raised while resolving constructor parameters or building a controller.
///
/// These are configuration errors: they name the offending controller and
/// parameter so the registration can be fixed.
#[derive(Debug, Error)]
pub enum InjectionError {
    /// A parameter declares more than one acceptable type.
    #[error(
        "unable to create controller \"{handler}\"; unable to resolve parameter \"{parameter}\" \
         with union type hint ({})",
        .candidates.join(" | ")
    )]
    AmbiguousType {
        /// The controller being constructed.
        handler: String,
        /// The parameter name.
        parameter: String,
        /// The declared alternatives.
        candidates: Vec<String>,
    },

    /// A typed parameter without a default has no matching service.
    #[error(
        "unable to create controller \"{handler}\"; unable to resolve parameter \"{parameter}\" \
         using type hint \"{type_name}\""
    )]
    UnresolvedService {
        /// The controller being constructed.
        handler: String,
        /// The parameter name.
        parameter: String,
        /// The declared type.
        type_name: String,
    },

    /// The registry reported the service but failed to produce it.
    #[error("unable to create controller \"{handler}\"; parameter \"{parameter}\": {source}")]
    Service {
        /// The controller being constructed.
        handler: String,
        /// The parameter name.
        parameter: String,
        /// The registry error.
        #[source]
        source: ServiceError,
    },

    /// The constructor asked for more arguments than were resolved, or a
    /// required argument resolved to nothing.
    #[error("controller \"{handler}\" is missing argument \"{parameter}\"")]
    MissingArgument {
        /// The controller being constructed.
        handler: String,
        /// The parameter name.
        parameter: String,
    },

    /// A resolved argument does not hold the type the constructor expects.
    #[error("controller \"{handler}\" received argument \"{parameter}\" of the wrong type; expected {expected}")]
    TypeMismatch {
        /// The controller being constructed.
        handler: String,
        /// The parameter name.
        parameter: String,
        /// The Rust type the constructor asked for.
        expected: &'static str,
    },

    /// The factory does not know how to build the requested name.
    #[error("controller \"{handler}\" is not registered or is not instantiable")]
    NotCreatable {
        /// The requested name.
        handler: String,
    },
}

impl InjectionError {
    /// Returns the name of the parameter this error is about, if any.
    pub fn parameter(&self) -> Option<&str> {
        match self {
            Self::AmbiguousType { parameter, .. }
            | Self::UnresolvedService { parameter, .. }
            | Self::Service { parameter, .. }
            | Self::MissingArgument { parameter, .. }
            | Self::TypeMismatch { parameter, .. } => Some(parameter),
            Self::NotCreatable { .. } => None,
        }
    }

    /// Returns the controller this error is about.
    pub fn handler(&self) -> &str {
        match self {
            Self::AmbiguousType { handler, .. }
            | Self::UnresolvedService { handler, .. }
            | Self::Service { handler, .. }
            | Self::MissingArgument { handler, .. }
            | Self::TypeMismatch { handler, .. }
            | Self::NotCreatable { handler } => handler,
        }
    }
}

/// Errors raised by routers.
#[derive(Debug, Clone, Error)]
pub enum RouterError {
    /// No route is registered under the name.
    #[error("route '{0}' not found")]
    RouteNotFound(String),

    /// Assembling a route requires a parameter that was not supplied.
    #[error("missing parameter '{parameter}' while assembling route '{route}'")]
    MissingParameter {
        /// The route being assembled.
        route: String,
        /// The missing parameter.
        parameter: String,
    },

    /// A route pattern or constraint could not be compiled.
    #[error("invalid pattern for route '{route}': {reason}")]
    InvalidPattern {
        /// The offending route.
        route: String,
        /// Why compilation failed.
        reason: String,
    },

    /// Two routes were registered under the same name.
    #[error("duplicate route name '{0}'")]
    DuplicateRoute(String),
}

/// The category of an [`ErrorReason`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`ErrorReason::NotFound`].
    NotFound,
    /// See [`ErrorReason::ControllerNotFound`].
    ControllerNotFound,
    /// See [`ErrorReason::ConstructionFailed`].
    ConstructionFailed,
    /// See [`ErrorReason::Exception`].
    Exception,
}

impl ErrorKind {
    /// Stable machine-readable code.
    pub fn code(self) -> &'static str {
        match self {
            Self::NotFound => "error-router-no-match",
            Self::ControllerNotFound => "error-controller-not-found",
            Self::ConstructionFailed => "error-controller-construction",
            Self::Exception => "error-exception",
        }
    }
}

/// Why a request entered the error stage of the dispatch lifecycle.
#[derive(Debug, Error)]
pub enum ErrorReason {
    /// Routing did not produce a route match.
    #[error("no route matched the request")]
    NotFound,

    /// The route match named a controller the factory cannot create.
    #[error("controller '{controller}' is not registered as dispatchable")]
    ControllerNotFound {
        /// The controller name from the route match (empty when absent).
        controller: String,
    },

    /// The factory failed while building the controller.
    #[error(transparent)]
    ConstructionFailed(InjectionError),

    /// A listener or the controller returned an error.
    #[error("error during '{event}': {source}")]
    Exception {
        /// The lifecycle stage that failed.
        event: String,
        /// The underlying error.
        #[source]
        source: BoxError,
    },
}

impl ErrorReason {
    /// The category of this reason.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound => ErrorKind::NotFound,
            Self::ControllerNotFound { .. } => ErrorKind::ControllerNotFound,
            Self::ConstructionFailed(_) => ErrorKind::ConstructionFailed,
            Self::Exception { .. } => ErrorKind::Exception,
        }
    }

    /// Stable machine-readable code for the reason.
    pub fn code(&self) -> &'static str {
        self.kind().code()
    }

    /// Returns `true` for the reasons that mean "nothing to serve here".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound | Self::ControllerNotFound { .. })
    }
}

impl From<ListenerError> for ErrorReason {
    fn from(err: ListenerError) -> Self {
        Self::Exception {
            event: err.event,
            source: err.source,
        }
    }
}

/// Fatal errors surfaced by [`Application::run`](crate::Application::run).
///
/// Routing and dispatch failures never reach this type; they go through the
/// `dispatch.error` stage instead.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// A listener failed during a stage that has no recovery path
    /// (`bootstrap`, `dispatch.error` or `finish`).
    #[error(transparent)]
    Listener(#[from] ListenerError),
}

/// Result type for injection operations.
pub type InjectionResult<T> = Result<T, InjectionError>;

/// Result type for routing operations.
pub type RouterResult<T> = Result<T, RouterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_injection_error_accessors() {
        let unresolved = InjectionError::UnresolvedService {
            handler: "SampleController".into(),
            parameter: "sample".into(),
            type_name: "SampleInterface".into(),
        };
        assert_eq!(unresolved.handler(), "SampleController");
        assert_eq!(unresolved.parameter(), Some("sample"));

        let missing = InjectionError::NotCreatable {
            handler: "Ghost".into(),
        };
        assert_eq!(missing.handler(), "Ghost");
        assert_eq!(missing.parameter(), None);
    }

    #[test]
    fn test_listener_error_becomes_exception() {
        let reason = ErrorReason::from(ListenerError {
            event: "route".into(),
            source: "boom".into(),
        });
        assert_eq!(reason.kind(), ErrorKind::Exception);
        assert_eq!(reason.to_string(), "error during 'route': boom");
    }
}
