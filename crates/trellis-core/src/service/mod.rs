//! Service registry boundary and its default implementation.

pub mod manager;
pub mod registry;

pub use manager::{FactoryFn, ServiceManager, ServiceManagerBuilder};
pub use registry::{ServiceArc, ServiceRegistry, downcast, erase};
