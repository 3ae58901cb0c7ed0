//! Procedural macros for the Trellis framework.
//!
//! This crate provides:
//!
//! - `#[derive(Injectable)]` - Describes a struct's constructor as a parameter
//!   list so the controller factory can build it from the service registry
//!
//! # Injectable Derive Macro
//!
//! Each named field becomes one constructor parameter, named after the field.
//! The parameter type is read from the field type:
//!
//! | Field type | Parameter |
//! |---|---|
//! | `Arc<T>` / `Arc<dyn T>` | service `"T"`, required |
//! | `Option<Arc<T>>` | service `"T"`, null default |
//! | `Arc<Value>` / `Option<Arc<Value>>` | structured (JSON) |
//! | `Option<ServiceArc>` | untyped |
//! | `Option<S>` for a scalar `S` | scalar |
//! | `S` for a scalar `S` | scalar, needs `#[inject(default = ...)]` |
//!
//! ```rust,ignore
//! use trellis_framework::Injectable;
//!
//! #[derive(Injectable)]
//! pub struct AlbumController {
//!     albums: Arc<dyn AlbumStore>,
//!     #[inject(service = "Mailer")]
//!     mailer: Option<Arc<SmtpMailer>>,
//!     config: Option<Arc<Value>>,
//!     #[inject(default = 20)]
//!     page_size: i64,
//!     #[inject(skip)]
//!     context: Option<ControllerContext>,
//! }
//! ```

mod injectable;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Derives `trellis_framework::Injectable` for a struct with named fields.
///
/// # Attributes
///
/// Struct level, `#[injectable(...)]`:
///
/// - `name = "..."` - Override the type name used in errors and logs
/// - `crate = "..."` - Path to the framework crate (default: `::trellis_framework`)
///
/// Field level, `#[inject(...)]`:
///
/// - `name = "..."` - Override the parameter name
/// - `service = "..."` - Override the service type name looked up in the registry
/// - `union = ["A", "B"]` - Declare several acceptable types
/// - `default = <expr>` - Default for a scalar parameter
/// - `skip` - Not a parameter; initialized with `Default::default()`
#[proc_macro_derive(Injectable, attributes(injectable, inject))]
pub fn derive_injectable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match injectable::derive_injectable(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
