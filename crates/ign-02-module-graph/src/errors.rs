//! # Error Types
//!
//! Build errors abort module construction; no partially built module is ever
//! returned. Serialization errors cover malformed persisted graphs.

use crate::domain::futures::FutureType;
use thiserror::Error;

// =============================================================================
// BUILD ERRORS
// =============================================================================

/// Errors raised while constructing a module.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// Module id or explicit future id contains characters other than `[A-Za-z0-9_]`.
    #[error("The id \"{0}\" is invalid. Ids can only contain alphanumerics or underscores, and they must contain at least one character.")]
    InvalidId(String),

    /// Two futures in the same module share an id.
    #[error("Duplicated id {id} found in module {module}, ensure that all future ids are unique. Use the `id` option to provide a unique id for this future.")]
    DuplicateFutureId {
        /// Owning module.
        module: String,
        /// The colliding full future id.
        id: String,
    },

    /// A submodule result that is not a contract future.
    #[error("The result '{key}' of module {module} is a {future_type} future; only contract futures can be module results")]
    NonCallableResult {
        /// Module returning the result.
        module: String,
        /// Result key.
        key: String,
        /// Actual future type.
        future_type: FutureType,
    },

    /// A submodule used twice with different bound parameters.
    #[error("Module {module} is used more than once with different parameters")]
    ConflictingModuleParameters {
        /// Submodule id.
        module: String,
    },

    /// A module that (transitively) uses itself.
    #[error("Module {module} uses itself through {}", path.join(" -> "))]
    CyclicModule {
        /// Module id.
        module: String,
        /// Modules under construction when the cycle was found.
        path: Vec<String>,
    },

    /// A future token created by a different module and not exported to this
    /// one through `use_module`.
    #[error("Future {future} does not belong to module {module} or any of its submodules")]
    ForeignFuture {
        /// Module being built.
        module: String,
        /// Offending future id.
        future: String,
    },

    /// A future used where its type cannot supply what is needed.
    #[error("Invalid {role} in {module}: {future} is a {future_type} future")]
    InvalidFutureType {
        /// Module being built.
        module: String,
        /// Argument role, e.g. "call target".
        role: String,
        /// Offending future id.
        future: String,
        /// Its type.
        future_type: FutureType,
    },

    /// A negative literal `value`.
    #[error("Invalid value {value} for {future}: value must be a non-negative integer")]
    InvalidValue {
        /// Future being built.
        future: String,
        /// The literal.
        value: String,
    },

    /// Lookup of a submodule result that does not exist.
    #[error("Module {module} has no result named '{key}'")]
    UnknownResult {
        /// Submodule id.
        module: String,
        /// Requested key.
        key: String,
    },

    /// A token that was never registered. Indicates a builder bug.
    #[error("internal error: unresolved future token {0}")]
    UnresolvedToken(String),
}

// =============================================================================
// SERIALIZATION ERRORS
// =============================================================================

/// Errors raised when reading a serialized module graph.
#[derive(Debug, Error)]
pub enum SerializationError {
    /// Malformed JSON or shape.
    #[error("invalid module JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Reference to a future that is not in the document.
    #[error("unknown future id {0}")]
    UnknownFuture(String),

    /// Reference to a module that is not in the document.
    #[error("unknown module id {0}")]
    UnknownModule(String),

    /// A future or module that depends on itself.
    #[error("cyclic reference through {0}")]
    Cycle(String),

    /// A tagged value that is not allowed in this position.
    #[error("invalid {field} in {future}")]
    InvalidValue {
        /// Future id.
        future: String,
        /// Field name.
        field: String,
    },
}
