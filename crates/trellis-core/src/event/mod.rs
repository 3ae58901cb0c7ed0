//! The event pipeline.
//!
//! An [`EventManager`] keeps listeners per identifier scope and runs them in
//! priority order against a mutable payload.  Triggers can stop early either
//! through a caller-supplied condition ([`EventManager::trigger_until`]) or
//! because a listener stopped propagation on the payload ([`Propagation`]).

pub mod listener;
pub mod manager;
pub mod response;

pub use listener::{ListenerEntry, ListenerFn, ListenerHandle, Propagation, WILDCARD};
pub use manager::EventManager;
pub use response::{ResponseCollection, StopCause};
