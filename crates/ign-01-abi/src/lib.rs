//! # IGN-01 ABI - Encoding and Decoding Helpers
//!
//! Type-normalizing wrapper over `alloy-json-abi` and `alloy-dyn-abi`.
//! Codec-specific value types never leave this crate: integers cross as
//! [`num_bigint::BigInt`], byte-like values as `0x` lowercase hex strings and
//! tuples as [`EvmTuple`].
//!
//! ## Components
//!
//! | Component | Location | Purpose |
//! |-----------|----------|---------|
//! | Value model | `values.rs` | [`EvmValue`], [`EvmTuple`], param encoding |
//! | Fragments | `fragments.rs` | Name/signature resolution, overload listings |
//! | Libraries | `libraries.rs` | Link reference matching and bytecode linking |
//! | Codec | `codec.rs` | Deployment data, call data, result decoding |
//! | Reverts | `revert.rs` | Ordered revert classification |
//! | Events | `events.rs` | Log decoding and argument extraction |
//!
//! ## Usage Example
//!
//! ```ignore
//! use ign_01_abi::prelude::*;
//!
//! let data = encode_function_call(&artifact.abi, "Token", "transfer", &[to.into(), amount.into()])?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

// =============================================================================
// MODULES
// =============================================================================

pub mod codec;
pub mod errors;
pub mod events;
pub mod fragments;
pub mod libraries;
pub mod revert;
pub mod values;

pub use codec::{decode_function_result, encode_call, encode_deployment_data, encode_function_call};
pub use errors::AbiError;
pub use events::{decode_event_log, extract_event_argument};
pub use fragments::{
    is_signature, resolve_event, resolve_function, resolve_read_only_function,
    validate_constructor_args, validate_event_argument, validate_function_output,
};
pub use libraries::{link_bytecode, resolve_library_names};
pub use revert::{decode_call_result, decode_error, panic_name, EvmExecutionError};
pub use values::{decode_params, encode_params, EvmTuple, EvmValue};

// =============================================================================
// PRELUDE
// =============================================================================

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::codec::*;
    pub use crate::errors::AbiError;
    pub use crate::events::*;
    pub use crate::fragments::*;
    pub use crate::libraries::*;
    pub use crate::revert::{decode_call_result, decode_error, EvmExecutionError};
    pub use crate::values::{EvmTuple, EvmValue};
}

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
