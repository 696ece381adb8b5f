//! # Error Types
//!
//! On-chain failures (reverts, failed simulations, strategy errors) are not
//! errors here: they are recorded as an
//! [`ExecutionResult`](crate::domain::ExecutionResult) of the future and the
//! run goes on. The types below abort a run.

use crate::config::ConfigError;
use shared_types::ArtifactError;
use thiserror::Error;

// =============================================================================
// CHAIN ERRORS
// =============================================================================

/// Errors returned by a [`ChainClient`](crate::ports::ChainClient).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    /// The node could not be reached.
    #[error("connection error: {0}")]
    Connection(String),

    /// The node answered with a JSON-RPC error.
    #[error("JSON-RPC error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code.
        code: i64,
        /// Error message.
        message: String,
    },

    /// The node answered with something that is not a valid response.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The node refused the transaction (nonce too low, underpriced
    /// replacement, insufficient funds).
    #[error("transaction rejected: {0}")]
    Rejected(String),
}

impl ChainError {
    /// JSON-RPC internal error code, used by nodes for transient failures.
    pub const INTERNAL_ERROR: i64 = -32603;

    /// True for failures that may go away if the request is repeated.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection(_) | Self::MalformedResponse(_) => true,
            Self::Rpc { code, .. } => *code == Self::INTERNAL_ERROR,
            Self::Rejected(_) => false,
        }
    }
}

// =============================================================================
// JOURNAL ERRORS
// =============================================================================

/// Errors reading or appending to a journal.
#[derive(Debug, Error)]
pub enum JournalError {
    /// Underlying file error.
    #[error("journal I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A message could not be encoded.
    #[error("journal serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored line could not be decoded.
    #[error("journal line {line} is corrupt: {reason}")]
    Corrupt {
        /// 1-based line number.
        line: usize,
        /// Decoder message.
        reason: String,
    },
}

// =============================================================================
// STATE ERRORS
// =============================================================================

/// A journal message that does not fit the state it is applied to.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// The message names a future with no execution state.
    #[error("no execution state for future {0}")]
    UnknownFuture(String),

    /// The future already has an execution state.
    #[error("future {0} is already initialized")]
    AlreadyInitialized(String),

    /// The message names an interaction the future does not have, or one of
    /// the wrong kind.
    #[error("future {future_id} has no {expected} interaction {interaction_id}")]
    UnknownInteraction {
        /// Future id.
        future_id: String,
        /// Interaction id.
        interaction_id: u32,
        /// Expected interaction kind.
        expected: &'static str,
    },

    /// The message is not allowed in the future's current status.
    #[error("future {future_id} cannot apply {message} while {status}")]
    InvalidTransition {
        /// Future id.
        future_id: String,
        /// Message type.
        message: &'static str,
        /// Current status.
        status: String,
    },
}

// =============================================================================
// EXECUTION ERRORS
// =============================================================================

/// A previously journaled future that no longer matches the module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationFailure {
    /// Future id.
    pub future_id: String,
    /// What changed.
    pub reason: String,
}

/// Errors that abort a deployment run.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The chain client kept failing after the configured retries, or failed
    /// with an error that cannot be retried.
    #[error("infrastructure error while executing {future_id} ({operation}): {source}")]
    Infrastructure {
        /// Future being processed, or `run` outside any future.
        future_id: String,
        /// Chain operation that failed.
        operation: &'static str,
        /// Last error returned by the client.
        source: ChainError,
    },

    /// The journal could not be read or written.
    #[error(transparent)]
    Journal(#[from] JournalError),

    /// The journal is inconsistent with itself.
    #[error("invalid journal: {0}")]
    State(#[from] StateError),

    /// The journal belongs to another chain.
    #[error("the journal was recorded on chain {journal} but the client is connected to chain {chain}")]
    ChainMismatch {
        /// Chain id in the journal.
        journal: u64,
        /// Chain id reported by the client.
        chain: u64,
    },

    /// Journaled futures that were changed in the module since.
    #[error("the module does not match the journal: {}", format_failures(.0))]
    Reconciliation(Vec<ReconciliationFailure>),

    /// A runtime value could not be resolved.
    #[error("cannot resolve {what} of {future_id}: {reason}")]
    Resolution {
        /// Future being started.
        future_id: String,
        /// The value being resolved.
        what: String,
        /// Why it failed.
        reason: String,
    },

    /// An artifact could not be loaded.
    #[error(transparent)]
    Artifacts(#[from] ArtifactError),

    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A run needs at least one account.
    #[error("no accounts were provided")]
    NoAccounts,
}

fn format_failures(failures: &[ReconciliationFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{}: {}", f.future_id, f.reason))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result alias for execution operations.
pub type Result<T> = std::result::Result<T, ExecutionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(ChainError::Connection("reset".into()).is_retryable());
        assert!(ChainError::Rpc {
            code: ChainError::INTERNAL_ERROR,
            message: "busy".into()
        }
        .is_retryable());
        assert!(!ChainError::Rpc {
            code: -32000,
            message: "nonce too low".into()
        }
        .is_retryable());
        assert!(!ChainError::Rejected("underpriced".into()).is_retryable());
    }

    #[test]
    fn test_reconciliation_message_lists_every_future() {
        let error = ExecutionError::Reconciliation(vec![
            ReconciliationFailure {
                future_id: "M#A".into(),
                reason: "contract name changed".into(),
            },
            ReconciliationFailure {
                future_id: "M#B".into(),
                reason: "dependencies changed".into(),
            },
        ]);
        assert_eq!(
            error.to_string(),
            "the module does not match the journal: M#A: contract name changed; M#B: dependencies changed"
        );
    }
}
