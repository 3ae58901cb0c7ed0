//! Default lifecycle listeners.
//!
//! | listener | event | priority |
//! |---|---|---|
//! | [`RouteListener`] | `route` | 1 |
//! | [`RouteNotFoundStrategy`] | `dispatch.error` | 0 |
//! | [`ExceptionStrategy`] | `dispatch.error` | 0 |
//! | [`SendResponseListener`] | `finish` | -10000 |

mod exception;
mod not_found;
mod route;
mod send_response;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use trellis_core::{EventManager, ListenerHandle};

use crate::context::RequestContext;
use crate::http::ActionResult;

pub use exception::{EXCEPTION_MESSAGE, ExceptionStrategy};
pub use not_found::{NOT_FOUND_MESSAGE, RouteNotFoundStrategy};
pub use route::RouteListener;
pub use send_response::{LogSender, ResponseSender, SendResponseListener};

/// The event manager type driving the request lifecycle.
///
/// Listeners receive the [`RequestContext`] and may return an
/// [`ActionResult`]; a response result short-circuits `route` and `dispatch`.
pub type MvcEventManager = EventManager<RequestContext, Option<ActionResult>>;

/// A listener that attaches one or more callbacks at once.
pub trait ListenerAggregate: Send + Sync + 'static {
    /// Attaches the callbacks under `identifier`, returning their handles.
    fn attach(self: Arc<Self>, events: &MvcEventManager, identifier: &str)
    -> Vec<ListenerHandle>;
}

/// How error pages are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewManagerOptions {
    /// Include the reason code on 404 pages.
    pub display_not_found_reason: bool,
    /// Include error details on 500 pages.
    pub display_exceptions: bool,
}

/// Returns `true` for a listener value that is a complete response.
pub fn is_response(value: &Option<ActionResult>) -> bool {
    matches!(value, Some(ActionResult::Response(_)))
}
