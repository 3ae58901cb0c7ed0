//! The dispatch coordinator: one request through the lifecycle.
//!
//! ```text
//! Idle ─► Routing ─► Dispatching ─► Completed ─┐
//!            │            │                    ├─► Finished
//!            └────────────┴──► Error(kind) ────┘
//! ```
//!
//! Routing and dispatch failures are recoverable: they move the request to
//! the error state, where `dispatch.error` listeners may render a degraded
//! response. Listener errors raised while handling `dispatch.error` or
//! `finish` are fatal and returned to the caller.
//!
//! A listener that stops propagation makes the coordinator skip straight to
//! `Finished` once the current stage ends.

use std::sync::Arc;

use tracing::{debug, error, trace, warn};
use trellis_core::{EventResult, Propagation, ResponseCollection, ServiceRegistry, StopCause};

use crate::context::{
    EVENT_DISPATCH, EVENT_DISPATCH_ERROR, EVENT_FINISH, EVENT_ROUTE, RequestContext,
};
use crate::controller::{ControllerContext, ControllerManager, PluginManager};
use crate::error::{ApplicationError, ErrorKind, ErrorReason};
use crate::http::{ActionResult, Response};
use crate::listener::{MvcEventManager, is_response};

// =============================================================================
// States and report
// =============================================================================

/// A state of the per-request state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    /// Not started.
    Idle,
    /// Raising `route`.
    Routing,
    /// Building the controller, raising `dispatch`, calling the controller.
    Dispatching,
    /// A result was produced.
    Completed,
    /// Routing or dispatch failed.
    Error(ErrorKind),
    /// `finish` was raised.
    Finished,
}

/// The trail a request took and the context it ended with.
#[derive(Debug)]
pub struct DispatchReport {
    context: RequestContext,
    transitions: Vec<DispatchState>,
}

impl DispatchReport {
    /// Every state visited, starting with [`DispatchState::Idle`].
    pub fn transitions(&self) -> &[DispatchState] {
        &self.transitions
    }

    /// The state reached before `Finished`: `Completed`, `Error(..)`, or the
    /// stage that stopped propagation.
    pub fn outcome(&self) -> DispatchState {
        self.transitions
            .iter()
            .rev()
            .find(|state| **state != DispatchState::Finished)
            .copied()
            .unwrap_or(DispatchState::Idle)
    }

    /// The final request context.
    pub fn context(&self) -> &RequestContext {
        &self.context
    }

    /// The value left in the result slot.
    pub fn result(&self) -> Option<&ActionResult> {
        self.context.result()
    }

    /// Consumes the report, returning the context.
    pub fn into_context(self) -> RequestContext {
        self.context
    }

    /// Consumes the report, returning the emitted response.
    pub fn into_response(self) -> Response {
        self.context.into_parts().0
    }
}

// =============================================================================
// Coordinator
// =============================================================================

enum Stage {
    /// Move to the next stage.
    Continue,
    /// A result was produced; skip to `Completed`.
    Completed,
    /// Propagation was stopped; skip to `Finished`.
    Halt,
    /// Enter the error state.
    Failed(ErrorReason),
}

/// Drives requests through `route`, `dispatch`, `dispatch.error` and `finish`.
pub struct DispatchCoordinator {
    identifier: String,
    events: Arc<MvcEventManager>,
    registry: Arc<dyn ServiceRegistry>,
    controllers: Arc<ControllerManager>,
    plugins: Arc<PluginManager>,
}

impl DispatchCoordinator {
    /// Creates a coordinator raising events under `identifier`.
    pub fn new(
        identifier: impl Into<String>,
        events: Arc<MvcEventManager>,
        registry: Arc<dyn ServiceRegistry>,
        controllers: Arc<ControllerManager>,
        plugins: Arc<PluginManager>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            events,
            registry,
            controllers,
            plugins,
        }
    }

    /// The event manager.
    pub fn events(&self) -> &Arc<MvcEventManager> {
        &self.events
    }

    /// The service registry controllers are built from.
    pub fn registry(&self) -> &Arc<dyn ServiceRegistry> {
        &self.registry
    }

    /// The controller factory.
    pub fn controllers(&self) -> &Arc<ControllerManager> {
        &self.controllers
    }

    /// Runs `ctx` through the full lifecycle.
    pub fn run(&self, mut ctx: RequestContext) -> Result<DispatchReport, ApplicationError> {
        let mut transitions = vec![DispatchState::Idle];

        transitions.push(DispatchState::Routing);
        let mut stage = self.route(&mut ctx);

        if matches!(stage, Stage::Continue) {
            transitions.push(DispatchState::Dispatching);
            stage = self.dispatch(&mut ctx);
        }

        match stage {
            Stage::Continue | Stage::Completed => transitions.push(DispatchState::Completed),
            Stage::Halt => debug!("Propagation stopped, skipping to finish"),
            Stage::Failed(reason) => {
                transitions.push(DispatchState::Error(reason.kind()));
                self.fail(&mut ctx, reason)?;
            }
        }

        transitions.push(DispatchState::Finished);
        self.trigger(&mut ctx, EVENT_FINISH)?;

        trace!(?transitions, "Request finished");
        Ok(DispatchReport {
            context: ctx,
            transitions,
        })
    }

    fn route(&self, ctx: &mut RequestContext) -> Stage {
        let responses = match self.trigger_until_response(ctx, EVENT_ROUTE) {
            Ok(responses) => responses,
            Err(err) => return Stage::Failed(err.into()),
        };
        if let Some(stage) = short_circuit(ctx, responses) {
            return stage;
        }
        if ctx.route_match().is_none() {
            return Stage::Failed(ErrorReason::NotFound);
        }
        Stage::Continue
    }

    fn dispatch(&self, ctx: &mut RequestContext) -> Stage {
        let name = ctx
            .route_match()
            .and_then(|route_match| route_match.controller())
            .unwrap_or_default()
            .to_string();
        ctx.set_controller(name.as_str());

        if !self.controllers.can_create(self.registry.as_ref(), &name) {
            warn!(controller = %name, "Controller is not dispatchable");
            return Stage::Failed(ErrorReason::ControllerNotFound { controller: name });
        }

        let mut controller = match self.controllers.create(self.registry.as_ref(), &name) {
            Ok(controller) => controller,
            Err(err) => {
                error!(controller = %name, error = %err, "Controller construction failed");
                return Stage::Failed(ErrorReason::ConstructionFailed(err));
            }
        };

        if let Some(aware) = controller.as_context_aware() {
            aware.set_context(ControllerContext::new(
                ctx.route_match().cloned(),
                Arc::clone(ctx.router()),
            ));
        }
        if let Some(aware) = controller.as_plugin_aware() {
            aware.set_plugins(Arc::clone(&self.plugins));
        }

        let responses = match self.trigger_until_response(ctx, EVENT_DISPATCH) {
            Ok(responses) => responses,
            Err(err) => return Stage::Failed(err.into()),
        };
        if let Some(stage) = short_circuit(ctx, responses) {
            return stage;
        }

        debug!(controller = %name, "Dispatching controller");
        let (request, response) = ctx.request_and_response_mut();
        match controller.dispatch(request, response) {
            Ok(result) => {
                ctx.set_result(result);
                Stage::Completed
            }
            Err(source) => Stage::Failed(ErrorReason::Exception {
                event: EVENT_DISPATCH.to_string(),
                source,
            }),
        }
    }

    fn fail(&self, ctx: &mut RequestContext, reason: ErrorReason) -> Result<(), ApplicationError> {
        debug!(reason = reason.code(), error = %reason, "Entering error state");
        ctx.set_error(reason);

        let responses = self.trigger(ctx, EVENT_DISPATCH_ERROR)?;
        if ctx.result().is_none()
            && let Some(result) = responses.into_iter().flatten().last()
        {
            ctx.set_result(result);
        }
        Ok(())
    }

    fn trigger(
        &self,
        ctx: &mut RequestContext,
        event: &str,
    ) -> EventResult<ResponseCollection<Option<ActionResult>>> {
        ctx.set_name(event);
        self.events.trigger(&self.identifier, event, ctx)
    }

    fn trigger_until_response(
        &self,
        ctx: &mut RequestContext,
        event: &str,
    ) -> EventResult<ResponseCollection<Option<ActionResult>>> {
        ctx.set_name(event);
        self.events
            .trigger_until(&self.identifier, event, ctx, is_response)
    }
}

/// Applies a `route`/`dispatch` short-circuit: a response result completes
/// the request, a stopped propagation halts it.
fn short_circuit(
    ctx: &mut RequestContext,
    responses: ResponseCollection<Option<ActionResult>>,
) -> Option<Stage> {
    match responses.stop_cause() {
        Some(StopCause::Condition) => {
            if let Some(Some(result)) = responses.into_iter().last() {
                debug!(event = ctx.name(), "Listener returned a response, short-circuiting");
                ctx.set_result(result);
            }
            Some(Stage::Completed)
        }
        Some(StopCause::Propagation) => Some(Stage::Halt),
        None if ctx.is_propagation_stopped() => Some(Stage::Halt),
        None => None,
    }
}

impl std::fmt::Debug for DispatchCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchCoordinator")
            .field("identifier", &self.identifier)
            .field("events", &self.events)
            .field("controllers", &self.controllers)
            .finish_non_exhaustive()
    }
}
