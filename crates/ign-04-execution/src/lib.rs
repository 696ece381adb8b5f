//! # IGN-04 Execution - Journaled Deployment Engine
//!
//! Executes a built module against a chain. Every future is a small state
//! machine driven by an [`ExecutionStrategy`]; every state change is a
//! [`JournalMessage`] written before it is applied, so an interrupted
//! deployment resumes exactly where it stopped.
//!
//! ## Execution Policy
//!
//! | Concern | Rule | Enforcement |
//! |---------|------|-------------|
//! | Ordering | A future starts once every dependency succeeded | `engine.rs` |
//! | Failures | Dependents of failed futures are skipped | `engine.rs` |
//! | Simulation | Transactions are simulated before they are sent | `processor.rs` |
//! | Nonces | Highest used nonce + 1, or the node's pending count if higher | `nonce.rs` |
//! | Dropped transactions | Resent at the same nonce | `processor.rs` |
//! | Fee bumps | Pending too long → replaced with higher fees, then TIMEOUT | `processor.rs`, `domain/fees.rs` |
//! | Resumption | Journal replay, chain id check, module reconciliation | `engine.rs`, `reconciliation.rs` |
//!
//! ## Components
//!
//! | Component | Location | Purpose |
//! |-----------|----------|---------|
//! | Domain | `domain/` | Execution states, journal messages, reducer, fee bumps |
//! | Ports | `ports/` | `ChainClient` and `Journal` traits |
//! | Adapters | `adapters/` | In-memory chain, memory and JSON-lines journals |
//! | Strategy | `strategy/` | Strategy protocol and the basic strategy |
//! | Processor | `processor.rs` | One step of one future |
//! | Engine | `engine.rs` | Scheduling, resumption, run results |
//!
//! ## Usage Example
//!
//! ```ignore
//! use ign_04_execution::prelude::*;
//!
//! let engine = ExecutionEngine::new(chain, Arc::new(FileJournal::new("journal.jsonl")), artifacts, ExecutionConfig::from_env()?);
//! let result = engine.execute(&module, &parameters, &accounts).await?;
//! for (id, address) in result.contracts() {
//!     println!("{id}: {address}");
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

// =============================================================================
// MODULES
// =============================================================================

pub mod adapters;
pub mod config;
pub mod domain;
pub mod engine;
pub mod errors;
pub mod nonce;
pub mod ports;
pub mod processor;
pub mod reconciliation;
mod resolve;
pub mod strategy;

#[cfg(test)]
mod test_support;

pub use adapters::{FileJournal, InMemoryChain, MemoryJournal, ScriptedResponse, DEFAULT_CHAIN_ID};
pub use config::{ConfigError, ExecutionConfig};
pub use domain::{
    DeploymentState, ExecutionRequest, ExecutionResult, ExecutionState, ExecutionStatus, JournalMessage,
    NetworkFees, NetworkInteraction, SuccessValue, TransactionReceipt,
};
pub use engine::{DeploymentResult, DeploymentStatus, ExecutionEngine, FutureOutcome, HaltHandle};
pub use errors::{ChainError, ExecutionError, JournalError, ReconciliationFailure, StateError};
pub use nonce::NonceManager;
pub use ports::{BlockInfo, BlockTag, CallRequest, ChainClient, Journal, TransactionInfo, TransactionRequest};
pub use processor::{FutureProcessor, Progress};
pub use reconciliation::reconcile;
pub use strategy::{BasicStrategy, ExecutionStrategy, InteractionRequest, StrategyStep};

// =============================================================================
// PRELUDE
// =============================================================================

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::adapters::*;
    pub use crate::config::ExecutionConfig;
    pub use crate::domain::*;
    pub use crate::engine::*;
    pub use crate::errors::{ChainError, ExecutionError, JournalError, StateError};
    pub use crate::ports::*;
    pub use crate::strategy::{BasicStrategy, ExecutionStrategy, InteractionRequest, StrategyStep};
}

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
