//! # Error Types
//!
//! [`ValidationIssue`]s are user errors in a module and are collected, never
//! thrown. [`ValidationError`] aborts validation: the artifact store failed
//! or the module graph broke an invariant the builder guarantees.

use ign_01_abi::AbiError;
use ign_02_module_graph::FutureType;
use shared_types::ArtifactError;
use std::fmt;
use thiserror::Error;

/// A problem with one future.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationIssue {
    /// No artifact is registered under the contract's name.
    #[error("Artifact for contract '{label}' is invalid or missing")]
    InvalidArtifact {
        /// Contract name used for the lookup.
        label: String,
    },

    /// Fragment resolution, argument count or library linking failed.
    #[error(transparent)]
    Abi(#[from] AbiError),

    /// Parameter with no supplied value and no default.
    #[error("Module parameter '{name}' of module '{module_id}' requires a value but was given none")]
    MissingParameter {
        /// Declaring module.
        module_id: String,
        /// Parameter name.
        name: String,
    },

    /// Parameter holding the wrong kind of value.
    #[error("Module parameter '{name}' of module '{module_id}' must be of type {expected} but is {actual}")]
    ParameterType {
        /// Declaring module.
        module_id: String,
        /// Parameter name.
        name: String,
        /// Expected parameter kind or ABI type.
        expected: String,
        /// Actual type name.
        actual: &'static str,
    },

    /// `get_account` with a negative index.
    #[error("Account index cannot be a negative number, got {index}")]
    NegativeAccountIndex {
        /// Requested index.
        index: i64,
    },

    /// `get_account` past the end of the accounts list.
    #[error("Requested account index '{index}' is greater than the total number of available accounts ({count})")]
    AccountIndexOutOfRange {
        /// Requested index.
        index: i64,
        /// Number of accounts.
        count: usize,
    },

    /// Malformed or badly checksummed address.
    #[error("Invalid address {value}")]
    InvalidAddress {
        /// The string given.
        value: String,
    },

    /// Literal `from` address that is not one of the accounts.
    #[error("Sender {address} is not one of the available accounts")]
    UnknownSender {
        /// The address given.
        address: String,
    },

    /// Library entry pointing at a future that is not a contract.
    #[error("Library '{name}' must reference a contract or library future, but {future} is a {future_type} future")]
    InvalidLibrary {
        /// Library name.
        name: String,
        /// Referenced future.
        future: String,
        /// Its type.
        future_type: FutureType,
    },

    /// Negative value.
    #[error("Value must be a non-negative integer, got {value}")]
    InvalidValue {
        /// The value given.
        value: String,
    },

    /// Positive value sent to a non-payable constructor or function.
    #[error("{fragment} of contract '{contract}' is not payable, so it can't receive a value")]
    NotPayable {
        /// Contract name.
        contract: String,
        /// "The constructor" or "Function 'sig'".
        fragment: String,
    },

    /// Send data that is not `0x` hex.
    #[error("Invalid data {data}, expected 0x-prefixed hex")]
    InvalidData {
        /// The string given.
        data: String,
    },
}

/// A [`ValidationIssue`] tagged with the future it was found in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FutureValidationError {
    /// Future id.
    pub future_id: String,
    /// The problem.
    pub issue: ValidationIssue,
}

impl fmt::Display for FutureValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.future_id, self.issue)
    }
}

impl std::error::Error for FutureValidationError {}

/// Errors that stop validation.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The module graph broke a builder invariant.
    #[error("internal validation error: {0}")]
    Internal(String),

    /// The artifact store failed.
    #[error("artifact lookup failed: {0}")]
    Artifacts(#[from] ArtifactError),
}
