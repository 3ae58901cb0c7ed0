//! 500 rendering for construction failures and listener or controller errors.

use std::sync::Arc;

use http::StatusCode;
use serde_json::{Value, json};
use tracing::error;
use trellis_core::ListenerHandle;

use super::{ListenerAggregate, MvcEventManager, ViewManagerOptions};
use crate::context::{EVENT_DISPATCH_ERROR, RequestContext};
use crate::error::ErrorKind;

/// Message used on every error page.
pub const EXCEPTION_MESSAGE: &str = "An error occurred during execution; please try again later.";

/// Turns `ConstructionFailed` and `Exception` errors into a 500 result.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExceptionStrategy {
    display_exceptions: bool,
}

impl ExceptionStrategy {
    /// Creates the strategy.
    pub fn new(options: ViewManagerOptions) -> Self {
        Self {
            display_exceptions: options.display_exceptions,
        }
    }

    /// Renders the 500 result if the context holds a failure and no complete
    /// response yet.
    pub fn on_dispatch_error(&self, ctx: &mut RequestContext) {
        let Some(reason) = ctx.error() else {
            return;
        };
        if !matches!(reason.kind(), ErrorKind::ConstructionFailed | ErrorKind::Exception)
            || ctx.result().is_some_and(|r| r.is_response())
        {
            return;
        }

        error!(reason = reason.code(), error = %reason, "Request failed");

        let mut body = json!({ "message": EXCEPTION_MESSAGE });
        if self.display_exceptions {
            body["reason"] = Value::from(reason.code());
            body["exception"] = Value::from(reason.to_string());
        }

        *ctx.response_mut().status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        ctx.set_result(body);
    }
}

impl ListenerAggregate for ExceptionStrategy {
    fn attach(
        self: Arc<Self>,
        events: &MvcEventManager,
        identifier: &str,
    ) -> Vec<ListenerHandle> {
        vec![events.attach(identifier, EVENT_DISPATCH_ERROR, 0, move |ctx| {
            self.on_dispatch_error(ctx);
            Ok(None)
        })]
    }
}
