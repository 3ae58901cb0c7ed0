//! Runtime error types.

use thiserror::Error;
use trellis_framework::{ApplicationError, RouterError};

use crate::config::ConfigError;

/// Errors that can occur while bootstrapping an application.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The route stack could not be built.
    #[error("Failed to build routes: {0}")]
    Router(#[from] RouterError),

    /// A `bootstrap` listener failed.
    #[error(transparent)]
    Application(#[from] ApplicationError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
