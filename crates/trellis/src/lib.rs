//! # Trellis
//!
//! An MVC request-dispatch framework for Rust.
//!
//! ## Overview
//!
//! Every request walks a fixed lifecycle of events. Listeners attached to
//! those events route the request, render error pages and emit the response;
//! in between, a controller is built on demand with its constructor
//! dependencies resolved from the service registry.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌──────────────────────┐   route    ┌────────────┐
//! │ Transport │──▶│ Application          │──────────▶│ RouteStack │
//! │ (tower)   │   │  DispatchCoordinator │            └────────────┘
//! └───────────┘   │                      │  create    ┌───────────────────┐   resolve   ┌────────────────┐
//!                 │                      │──────────▶│ ControllerManager │───────────▶│ ServiceManager │
//!                 └──────────────────────┘            └───────────────────┘             └────────────────┘
//! ```
//!
//! - **Core**: the service registry and the event pipeline
//! - **Framework**: routing, injection, controllers, listeners, dispatch
//! - **Runtime**: configuration, logging and `Bootstrap`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use trellis::prelude::*;
//!
//! #[derive(Injectable)]
//! #[injectable(crate = "trellis::framework")]
//! struct AlbumController {
//!     albums: Arc<dyn AlbumStore>,
//! }
//!
//! impl ActionController for AlbumController {
//!     fn actions() -> Vec<(&'static str, Action<Self>)> {
//!         vec![("index", Self::index as Action<Self>)]
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let app = Bootstrap::new()
//!         .services(ServiceManager::builder().service("AlbumStore", store))
//!         .controllers(ControllerManager::new().action_controller::<AlbumController>("Album"))
//!         .build()?;
//!
//!     let response = app.run(request)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config`: TOML configuration files (default)
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log output

pub use trellis_core as core;
pub use trellis_framework as framework;
pub use trellis_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use trellis::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use trellis_runtime::{Bootstrap, ConfigLoader, TrellisConfig};

    // Framework
    pub use trellis_framework::prelude::*;
    pub use trellis_framework::{Action, ApplicationBuilder, ViewManagerOptions};

    // Core
    pub use trellis_core::{ServiceManager, ServiceRegistry};

    // Logging
    pub use trellis_runtime::prelude::*;

    pub use std::sync::Arc;
}
