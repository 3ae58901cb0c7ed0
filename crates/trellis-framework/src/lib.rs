//! # Trellis Framework
//!
//! MVC request dispatch on top of the Trellis core.
//!
//! This layer provides:
//! - Routing: literal and segment routes in a priority-ordered [`RouteStack`]
//! - Constructor injection: [`ParameterResolver`] and `#[derive(Injectable)]`
//! - A lazy controller factory ([`ControllerManager`]) and controller plugins
//! - The default lifecycle listeners (routing, 404/500 pages, response emission)
//! - The [`DispatchCoordinator`] state machine and the [`Application`] that
//!   wires it all behind a `tower::Service`
//!
//! ```text
//! bootstrap (once)
//!     │
//! route ──► dispatch ──► controller ──► finish
//!   │          │             │            ▲
//!   └──────────┴─────────────┴► dispatch.error
//! ```

extern crate self as trellis_framework;

pub mod application;
pub mod context;
pub mod controller;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod injection;
pub mod listener;
pub mod router;

pub use application::{Application, ApplicationBuilder};
pub use context::{
    APPLICATION_IDENTIFIER, EVENT_BOOTSTRAP, EVENT_DISPATCH, EVENT_DISPATCH_ERROR, EVENT_FINISH,
    EVENT_ROUTE, RequestContext,
};
pub use controller::{
    Action, ActionController, ActionDispatcher, ContextAware, ControllerContext,
    ControllerManager, ControllerPlugin, Dispatchable, PluginAware, PluginManager,
};
pub use dispatch::{DispatchCoordinator, DispatchReport, DispatchState};
pub use error::{
    ApplicationError, ErrorKind, ErrorReason, InjectionError, InjectionResult, RouterError,
    RouterResult,
};
pub use http::{ActionResult, Request, Response};
pub use injection::{
    Arguments, DefaultValue, Injectable, ParamType, ParameterResolver, ParameterSpec, ScalarKind,
    WellKnownAliases,
};
pub use listener::{ListenerAggregate, MvcEventManager, ResponseSender, ViewManagerOptions};
pub use router::{RouteConfig, RouteKind, RouteMatch, RouteStack, Router};

pub use trellis_macros::Injectable;

/// Prelude for common imports.
pub mod prelude {
    pub use super::controller::{Params, Redirect, Url};
    pub use super::{
        ActionController, ActionResult, Application, Arguments, ContextAware, ControllerContext,
        ControllerManager, Dispatchable, Injectable, InjectionResult, PluginAware, Request,
        RequestContext, Response, RouteConfig, RouteStack,
    };
    pub use trellis_core::BoxError;
}
