//! Unified error types for the Trellis core.
//!
//! Framework-level errors (injection, routing, dispatch) are defined in
//! `trellis-framework`; this module only covers the service registry and the
//! event pipeline.

use thiserror::Error;

/// Boxed error returned by listeners, controllers and service factories.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

// =============================================================================
// Service Errors
// =============================================================================

/// Errors raised by a [`ServiceRegistry`](crate::service::ServiceRegistry).
#[derive(Debug, Error)]
pub enum ServiceError {
    /// No service, factory or alias is registered under the identifier.
    #[error("service '{id}' not found")]
    NotFound {
        /// The requested identifier.
        id: String,
    },

    /// The factory for the identifier returned an error.
    #[error("failed to create service '{id}': {source}")]
    Creation {
        /// The identifier whose factory failed.
        id: String,
        /// The factory error.
        #[source]
        source: BoxError,
    },

    /// A factory requested, directly or indirectly, the service it is building.
    #[error("circular dependency while creating service '{id}': {}", .chain.join(" -> "))]
    CircularDependency {
        /// The identifier that was requested twice.
        id: String,
        /// The resolution chain, outermost first.
        chain: Vec<String>,
    },

    /// The service exists but holds a different type than requested.
    #[error("service '{id}' is not of type '{expected}'")]
    TypeMismatch {
        /// The requested identifier.
        id: String,
        /// The type the caller asked for.
        expected: &'static str,
    },

    /// An alias points back to itself through other aliases.
    #[error("alias cycle detected at '{id}'")]
    AliasCycle {
        /// The alias where the cycle was detected.
        id: String,
    },
}

impl ServiceError {
    /// Creates a not-found error for the given identifier.
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Returns `true` if this is a [`ServiceError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

// =============================================================================
// Event Errors
// =============================================================================

/// A listener failed while an event was being triggered.
///
/// The pipeline never swallows listener errors; it stops iterating and hands
/// the failure back to the caller of `trigger` together with the event name.
#[derive(Debug, Error)]
#[error("listener for event '{event}' failed: {source}")]
pub struct ListenerError {
    /// The event being triggered.
    pub event: String,
    /// The error returned by the listener.
    #[source]
    pub source: BoxError,
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for service registry operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Result type for event triggering.
pub type EventResult<T> = Result<T, ListenerError>;
