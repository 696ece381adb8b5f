//! # Execution Strategies
//!
//! A strategy decides, from the journaled state of a future, what the next
//! network interaction is or what the final result is. The engine performs
//! the interactions and records them; the strategy never talks to the chain.

pub mod basic;

pub use basic::BasicStrategy;

use crate::domain::{ExecutionResult, ExecutionState};
use async_trait::async_trait;
use ign_01_abi::decode_error;
use num_bigint::BigInt;
use shared_types::{Address, Artifact, RawStaticCallResult};

/// An interaction the strategy wants performed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionRequest {
    /// Send a transaction.
    Onchain {
        /// Recipient; `None` deploys.
        to: Option<Address>,
        /// Calldata or deployment data.
        data: Vec<u8>,
        /// Value in wei.
        value: BigInt,
    },
    /// Perform an `eth_call`.
    StaticCall {
        /// Target.
        to: Address,
        /// Calldata.
        data: Vec<u8>,
        /// Value in wei.
        value: BigInt,
    },
}

/// What the strategy decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyStep {
    /// Perform another interaction.
    Request(InteractionRequest),
    /// The future is done.
    Complete(ExecutionResult),
    /// Pause the future until a later run.
    Hold {
        /// Why.
        reason: String,
    },
}

/// Drives one future through its interactions.
#[async_trait]
pub trait ExecutionStrategy: Send + Sync {
    /// Name journaled with each future. A future started by one strategy is
    /// never continued by another.
    fn name(&self) -> &str;

    /// Next step for a future with no pending interaction. `artifact` is the
    /// artifact of the deployed or called contract.
    async fn next_step(&self, state: &ExecutionState, artifact: Option<&Artifact>) -> StrategyStep;

    /// Outcome of the simulation run before the first transaction of an
    /// onchain interaction. `None` lets the transaction be sent.
    fn simulation_outcome(
        &self,
        _state: &ExecutionState,
        artifact: Option<&Artifact>,
        result: &RawStaticCallResult,
    ) -> Option<ExecutionResult> {
        if result.success {
            return None;
        }
        Some(ExecutionResult::SimulationError {
            error: decode_error(
                &result.return_data,
                artifact.map(|a| &a.abi),
                result.custom_error_reported,
            ),
        })
    }
}
