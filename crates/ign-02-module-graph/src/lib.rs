//! # IGN-02 Module Graph - Declarative Deployment Modules
//!
//! A module definition declares futures through a [`ModuleBuilder`]. Building
//! runs the definition once, resolves every [`FutureToken`] into a shared
//! [`Future`], and caches the resulting [`IgnitionModule`] by id so a
//! submodule used from several places is one object.
//!
//! ## Components
//!
//! | Component | Location | Purpose |
//! |-----------|----------|---------|
//! | Domain | `domain/` | Futures, arguments, runtime values, modules |
//! | Builder | `builder.rs` | Factory methods, id rules, type checks |
//! | Constructor | `constructor.rs` | Definitions, per-id cache, cycle detection |
//! | Resolution | `resolution.rs` | Token → future replacement |
//! | Graph | `graph.rs` | Flattening, dependency edges, topological batches |
//! | Serialization | `serialization.rs` | Flat JSON form and its reader |
//!
//! ## Usage Example
//!
//! ```ignore
//! use ign_02_module_graph::prelude::*;
//!
//! let module = build(&build_module("Token", |m| {
//!     let token = m.contract("Token", vec!["Name".into()], ContractOptions::default())?;
//!     m.call(&token, "mint", vec![m.get_account(0).into()], CallOptions::default())?;
//!     Ok(ModuleResults::from([("token".to_string(), token)]))
//! }))?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

// =============================================================================
// MODULES
// =============================================================================

pub mod builder;
pub mod constructor;
pub mod domain;
pub mod errors;
pub mod graph;
mod resolution;
pub mod serialization;

pub use builder::{
    After, CallOptions, ContractAtOptions, ContractOptions, EncodeFunctionCallOptions, FutureToken,
    LibraryOptions, ModuleBuilder, ModuleHandle, ReadEventArgumentOptions, SendOptions,
    StaticCallOptions,
};
pub use constructor::{build, build_module, ModuleConstructor, ModuleDefinition, ModuleResults};
pub use domain::*;
pub use errors::{BuildError, SerializationError};
pub use graph::{collect_futures, collect_modules, module_parameter_bindings, DependencyGraph};
pub use serialization::{deserialize, from_json, serialize, to_json, SerializedModuleGraph};

// =============================================================================
// PRELUDE
// =============================================================================

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::builder::*;
    pub use crate::constructor::*;
    pub use crate::domain::*;
    pub use crate::errors::{BuildError, SerializationError};
    pub use crate::graph::DependencyGraph;
}

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
