//! Emits the final response.

use std::sync::Arc;

use tracing::debug;
use trellis_core::{BoxError, ListenerHandle};

use super::{ListenerAggregate, MvcEventManager};
use crate::context::{EVENT_FINISH, RequestContext};
use crate::http::Response;

/// The transport boundary: hands a finished response to the client.
pub trait ResponseSender: Send + Sync {
    /// Sends `response`. Errors abort the request as fatal.
    fn send(&self, response: &Response) -> Result<(), BoxError>;
}

/// A sender that only logs; the response is returned to the caller of
/// [`Application::run`](crate::Application::run).
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSender;

impl ResponseSender for LogSender {
    fn send(&self, response: &Response) -> Result<(), BoxError> {
        debug!(
            status = response.status().as_u16(),
            bytes = response.body().len(),
            "Response ready"
        );
        Ok(())
    }
}

/// Folds the result into the response and hands it to a [`ResponseSender`].
pub struct SendResponseListener {
    sender: Arc<dyn ResponseSender>,
}

impl Default for SendResponseListener {
    fn default() -> Self {
        Self::new(Arc::new(LogSender))
    }
}

impl SendResponseListener {
    /// Priority on the `finish` event; runs after ordinary finish listeners.
    pub const PRIORITY: i32 = -10000;

    /// Creates the listener.
    pub fn new(sender: Arc<dyn ResponseSender>) -> Self {
        Self { sender }
    }

    /// Renders the result into the response and sends it.
    pub fn on_finish(&self, ctx: &mut RequestContext) -> Result<(), BoxError> {
        let mut response = ctx.take_response();
        if let Some(result) = ctx.result() {
            result.render_into(&mut response);
        }
        ctx.set_response(response);
        self.sender.send(ctx.response())
    }
}

impl std::fmt::Debug for SendResponseListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SendResponseListener").finish_non_exhaustive()
    }
}

impl ListenerAggregate for SendResponseListener {
    fn attach(
        self: Arc<Self>,
        events: &MvcEventManager,
        identifier: &str,
    ) -> Vec<ListenerHandle> {
        vec![events.attach(identifier, EVENT_FINISH, Self::PRIORITY, move |ctx| {
            self.on_finish(ctx)?;
            Ok(None)
        })]
    }
}
