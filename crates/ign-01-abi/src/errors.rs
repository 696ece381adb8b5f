//! # Error Types
//!
//! Errors raised while resolving ABI fragments or encoding/decoding values.
//! Messages are user-facing: validators surface them verbatim.

use thiserror::Error;

/// ABI helper errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbiError {
    /// No function with this name or signature.
    #[error("Contract '{contract}' doesn't have a function {function}")]
    FunctionNotFound {
        /// Contract name.
        contract: String,
        /// Requested name or signature.
        function: String,
    },

    /// No event with this name or signature.
    #[error("Contract '{contract}' doesn't have an event {event}")]
    EventNotFound {
        /// Contract name.
        contract: String,
        /// Requested name or signature.
        event: String,
    },

    /// A bare function name matched several overloads and the argument count
    /// did not single one out.
    #[error(
        "Function '{name}' of contract '{contract}' is overloaded and no single overload takes {given} arguments. Use one of these signatures instead: {}",
        candidates.join(", ")
    )]
    OverloadedFunction {
        /// Contract name.
        contract: String,
        /// Bare function name.
        name: String,
        /// Number of arguments supplied.
        given: usize,
        /// Every overload signature, in ABI declaration order.
        candidates: Vec<String>,
    },

    /// A bare event name matched several overloads.
    #[error(
        "Event '{name}' of contract '{contract}' is overloaded. Use one of these signatures instead: {}",
        candidates.join(", ")
    )]
    OverloadedEvent {
        /// Contract name.
        contract: String,
        /// Bare event name.
        name: String,
        /// Every overload signature, in ABI declaration order.
        candidates: Vec<String>,
    },

    /// Wrong number of function arguments.
    #[error("Function '{function}' of contract '{contract}' expects {expected} arguments but {given} were given")]
    ArgumentCount {
        /// Contract name.
        contract: String,
        /// Function signature.
        function: String,
        /// Declared input count.
        expected: usize,
        /// Supplied argument count.
        given: usize,
    },

    /// Wrong number of constructor arguments.
    #[error("The constructor of the contract '{contract}' expects {expected} arguments but {given} were given")]
    ConstructorArgumentCount {
        /// Contract name.
        contract: String,
        /// Declared input count.
        expected: usize,
        /// Supplied argument count.
        given: usize,
    },

    /// A positional selection past the end of an argument or return list.
    #[error("{fragment} of contract '{contract}' has {count} values, index {index} is out of range")]
    IndexOutOfRange {
        /// Contract name.
        contract: String,
        /// Event or function description.
        fragment: String,
        /// Requested index.
        index: usize,
        /// Number of available values.
        count: usize,
    },

    /// A named selection that matches no argument or return value.
    #[error("{fragment} of contract '{contract}' has no value named '{name}'")]
    NameNotFound {
        /// Contract name.
        contract: String,
        /// Event or function description.
        fragment: String,
        /// Requested name.
        name: String,
    },

    /// A static call targeting a state-mutating function.
    #[error("Function '{function}' of contract '{contract}' is not 'pure' or 'view' and cannot be statically called")]
    NotReadOnly {
        /// Contract name.
        contract: String,
        /// Function signature.
        function: String,
    },

    /// A fragment type string that the codec cannot parse.
    #[error("invalid ABI type '{ty}': {reason}")]
    InvalidType {
        /// Declared type.
        ty: String,
        /// Parser message.
        reason: String,
    },

    /// A value whose shape does not match the declared type.
    #[error("cannot encode {value} as {ty}")]
    TypeMismatch {
        /// Declared type.
        ty: String,
        /// Description of the supplied value.
        value: String,
    },

    /// An integer outside the range of its declared type.
    #[error("integer {value} does not fit in {ty}")]
    IntegerOutOfRange {
        /// Declared type.
        ty: String,
        /// The value, in decimal.
        value: String,
    },

    /// The codec rejected the payload.
    #[error("failed to decode data: {0}")]
    Decoding(String),

    /// Bytecode is not valid hex once placeholders are linked.
    #[error("invalid bytecode for contract '{contract}': {reason}")]
    InvalidBytecode {
        /// Contract name.
        contract: String,
        /// Decoder message.
        reason: String,
    },

    /// Libraries the bytecode needs but were not provided.
    #[error("Contract '{contract}' is missing links for the following libraries: {}", libraries.join(", "))]
    MissingLibraries {
        /// Contract name.
        contract: String,
        /// Fully qualified library names.
        libraries: Vec<String>,
    },

    /// A provided library the bytecode does not reference.
    #[error("Contract '{contract}' doesn't need a library named '{library}'")]
    UnneededLibrary {
        /// Contract name.
        contract: String,
        /// Library name as provided.
        library: String,
    },

    /// A bare library name that matches libraries from several sources.
    #[error(
        "Library name '{library}' of contract '{contract}' is ambiguous. Use one of these fully qualified names instead: {}",
        candidates.join(", ")
    )]
    AmbiguousLibrary {
        /// Contract name.
        contract: String,
        /// Bare library name.
        library: String,
        /// Matching fully qualified names.
        candidates: Vec<String>,
    },

    /// The same library given under two names.
    #[error("Library '{library}' of contract '{contract}' is provided more than once")]
    DuplicateLibrary {
        /// Contract name.
        contract: String,
        /// Fully qualified library name.
        library: String,
    },

    /// No log of the requested event was emitted by the expected contract.
    #[error("Event '{event}' #{index} was not emitted by {emitter} (found {found} matching logs)")]
    EventLogNotFound {
        /// Event signature.
        event: String,
        /// Expected emitter.
        emitter: String,
        /// Requested occurrence.
        index: usize,
        /// Number of matching logs found.
        found: usize,
    },
}
