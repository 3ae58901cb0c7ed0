//! Constructor injection.
//!
//! A type describes its constructor through [`Injectable`]: a parameter list
//! and a function that builds the value from resolved [`Arguments`]. The
//! [`ParameterResolver`] turns the parameter list into arguments by querying
//! a [`ServiceRegistry`](trellis_core::ServiceRegistry).
//!
//! Most types derive the descriptor:
//!
//! ```rust,ignore
//! #[derive(Injectable)]
//! struct AlbumController {
//!     albums: Arc<dyn AlbumStore>,          // service "AlbumStore"
//!     mailer: Option<Arc<Mailer>>,          // service "Mailer", null default
//!     config: Option<Arc<Value>>,           // the "config" service
//!     page_size: Option<i64>,               // scalar
//!     #[inject(default = 20)]
//!     limit: i64,                           // scalar with default
//! }
//! ```

mod aliases;
mod arguments;
mod parameter;
mod resolver;

pub use aliases::WellKnownAliases;
pub use arguments::Arguments;
pub use parameter::{DefaultValue, ParamType, ParameterSpec, ScalarKind};
pub use resolver::{CONFIG_SERVICE, ParameterResolver, ResolutionOutcome};

use crate::error::InjectionResult;

/// A type whose constructor is described by a parameter list.
pub trait Injectable: Sized {
    /// Name used in error messages and logs.
    fn type_name() -> &'static str;

    /// The constructor parameters, in order.
    fn parameters() -> Vec<ParameterSpec>;

    /// Builds the value from arguments aligned with [`parameters`](Self::parameters).
    fn construct(arguments: Arguments) -> InjectionResult<Self>;
}
