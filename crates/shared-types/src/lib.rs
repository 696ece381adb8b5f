//! # Shared Types Crate
//!
//! Value objects and boundary types used by every deployment crate.
//!
//! ## Contents
//!
//! - **Value objects**: [`Address`] (EIP-55), [`Hash`], hex helpers and
//!   CREATE address computation.
//! - **Parameters**: [`ParameterValue`] and the `$global` fallback scope.
//! - **Artifacts**: [`Artifact`] and the async [`ArtifactResolver`] port.
//! - **Chain records**: [`EventLog`].
//!
//! Arbitrary-precision integers cross every JSON boundary as decimal strings
//! (see [`bigint_ser`]).

pub mod artifacts;
pub mod bigint_ser;
pub mod chain;
pub mod errors;
pub mod parameters;
pub mod value_objects;

pub use artifacts::{Artifact, ArtifactResolver, InMemoryArtifacts, LinkReference, LinkReferences};
pub use chain::{EventLog, RawStaticCallResult};
pub use errors::*;
pub use parameters::{
    DeploymentParameters, ModuleParameters, NameOrIndex, ParameterValue, GLOBAL_PARAMETERS_KEY,
};
pub use value_objects::*;

/// Re-exported so dependants name the same integer type.
pub use num_bigint::BigInt;
