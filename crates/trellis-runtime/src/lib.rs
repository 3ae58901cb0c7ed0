//! Trellis Runtime - configuration, logging and bootstrap.
//!
//! This crate provides:
//! - Layered configuration loading (`ConfigLoader`, `TrellisConfig`)
//! - Configuration validation
//! - Logging setup (`LoggingBuilder`)
//! - `Bootstrap`, which turns configuration into a ready `Application`
//!
//! ```ignore
//! use trellis_runtime::Bootstrap;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads trellis.toml, TRELLIS_* variables, initializes logging.
//!     let app = Bootstrap::new()
//!         .controllers(ControllerManager::new().action_controller::<AlbumController>("Album"))
//!         .build()?;
//!
//!     let response = app.run(request)?;
//!     Ok(())
//! }
//! ```

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod logging;

// Re-exports
pub use bootstrap::Bootstrap;
pub use config::{ConfigError, ConfigLoader, ConfigResult, TrellisConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};

// Re-export tracing for use by applications
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
///
/// This provides all the commonly used logging macros:
/// - `trace!`, `debug!`, `info!`, `warn!`, `error!`
/// - `span`, `event`
/// - `instrument` attribute
/// - `Level` for span creation
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
