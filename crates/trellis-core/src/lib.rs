//! # Trellis Core
//!
//! The core engine of the Trellis MVC framework.
//!
//! This crate provides the two process-wide building blocks every request
//! relies on:
//!
//! - **Service registry**: string-keyed, lazily populated shared objects
//!   ([`ServiceRegistry`], [`ServiceManager`]).
//! - **Event pipeline**: priority-ordered listeners scoped by identifier,
//!   with short-circuit rules ([`EventManager`], [`ResponseCollection`]).
//!
//! ```text
//! ┌──────────────┐  trigger   ┌──────────────┐  &mut E   ┌──────────┐
//! │  Dispatcher  │───────────▶│ EventManager │──────────▶│ Listener │
//! └──────────────┘            └──────────────┘           └──────────┘
//!        │ get("config")
//!        ▼
//! ┌──────────────┐
//! │ServiceManager│
//! └──────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use trellis_core::{EventManager, Propagation};
//!
//! #[derive(Default)]
//! struct Ping { stopped: bool }
//!
//! impl Propagation for Ping {
//!     fn is_propagation_stopped(&self) -> bool { self.stopped }
//!     fn set_propagation_stopped(&mut self, stopped: bool) { self.stopped = stopped; }
//! }
//!
//! let events: EventManager<Ping, &'static str> = EventManager::new();
//! events.attach("app", "ping", 10, |_| Ok("pong"));
//!
//! let responses = events.trigger("app", "ping", &mut Ping::default())?;
//! assert_eq!(responses.last(), Some(&"pong"));
//! ```

pub mod error;
pub mod event;
pub mod service;

pub use error::{
    BoxError, EventResult, ListenerError, ServiceError, ServiceResult,
};
pub use event::{
    EventManager, ListenerEntry, ListenerFn, ListenerHandle, Propagation, ResponseCollection,
    StopCause, WILDCARD,
};
pub use service::{
    FactoryFn, ServiceArc, ServiceManager, ServiceManagerBuilder, ServiceRegistry, downcast,
    erase,
};

/// Prelude for common imports.
pub mod prelude {
    pub use super::event::{EventManager, Propagation, ResponseCollection};
    pub use super::service::{ServiceArc, ServiceManager, ServiceRegistry, downcast, erase};
    pub use super::{BoxError, ServiceError};
}
