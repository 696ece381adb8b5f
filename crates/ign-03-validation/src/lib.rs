//! # IGN-03 Validation - Pre-Flight Checks
//!
//! Checks a built module against the artifacts, the deployment parameters
//! and, when known, the accounts, before anything is sent. Every future is
//! visited and every problem is collected, so one run reports them all.
//!
//! ## Components
//!
//! | Component | Location | Purpose |
//! |-----------|----------|---------|
//! | Context | `context.rs` | Artifact store, parameter resolution, accounts |
//! | Checks | `checks.rs` | Accounts, parameters, amounts, addresses, senders |
//! | Validators | `validators/` | One validator per future kind |
//! | Service | `service.rs` | Walks the module tree, builds the report |
//!
//! ## What is checked
//!
//! - Artifacts exist for every contract and library.
//! - Functions and events resolve, overloads are disambiguated, argument
//!   counts match.
//! - Static calls target `view`/`pure` functions and select an existing
//!   return value. Event reads select an existing event argument.
//! - Libraries cover exactly the artifact's link references.
//! - Parameters resolve and have the right type where the type matters.
//! - Account indexes are non-negative and in range; senders are known.
//! - Value is never sent to a non-payable constructor or function.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

mod checks;
pub mod context;
pub mod errors;
pub mod service;
pub mod validators;

#[cfg(test)]
mod fixtures;

pub use context::ValidationContext;
pub use errors::{FutureValidationError, ValidationError, ValidationIssue};
pub use service::{validate, validate_module, ValidationReport};
pub use validators::validate_future;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::context::ValidationContext;
    pub use crate::errors::{FutureValidationError, ValidationError, ValidationIssue};
    pub use crate::service::{validate, validate_module, ValidationReport};
}

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
