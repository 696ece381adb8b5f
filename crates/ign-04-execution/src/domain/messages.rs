//! # Journal Messages
//!
//! The journal is the only persistent state of a deployment. Every state
//! change is first written as one of these messages, then applied.

use super::state::{
    ExecutionRequest, ExecutionResult, NetworkInteraction, SentTransaction, TransactionReceipt,
};
use ign_02_module_graph::FutureType;
use serde::{Deserialize, Serialize};
use shared_types::{Address, RawStaticCallResult};
use std::collections::BTreeSet;
use uuid::Uuid;

/// One journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE", rename_all_fields = "camelCase")]
pub enum JournalMessage {
    /// A run began.
    RunStart {
        /// Run id.
        run_id: Uuid,
        /// Chain the run is connected to.
        chain_id: u64,
    },

    /// A future started executing.
    ExecutionStateInitialize {
        /// Future id.
        future_id: String,
        /// Future type.
        future_type: FutureType,
        /// Strategy name.
        strategy: String,
        /// Direct dependencies.
        dependencies: BTreeSet<String>,
        /// Sender, for futures that send.
        from: Option<Address>,
        /// Resolved inputs.
        request: ExecutionRequest,
    },

    /// The strategy asked for a new interaction.
    NetworkInteractionRequest {
        /// Future id.
        future_id: String,
        /// The interaction, not yet performed.
        interaction: NetworkInteraction,
    },

    /// A transaction was sent for an onchain interaction.
    TransactionSend {
        /// Future id.
        future_id: String,
        /// Interaction id.
        interaction_id: u32,
        /// Nonce it was sent with.
        nonce: u64,
        /// The transaction.
        transaction: SentTransaction,
    },

    /// A transaction of the interaction has enough confirmations.
    TransactionConfirm {
        /// Future id.
        future_id: String,
        /// Interaction id.
        interaction_id: u32,
        /// Its receipt.
        receipt: TransactionReceipt,
    },

    /// A static call returned.
    StaticCallComplete {
        /// Future id.
        future_id: String,
        /// Interaction id.
        interaction_id: u32,
        /// Raw result.
        result: RawStaticCallResult,
    },

    /// No transaction of the interaction is known to the node any more.
    OnchainInteractionDropped {
        /// Future id.
        future_id: String,
        /// Interaction id.
        interaction_id: u32,
    },

    /// The interaction ran out of fee bumps.
    OnchainInteractionTimeout {
        /// Future id.
        future_id: String,
        /// Interaction id.
        interaction_id: u32,
    },

    /// A timed out or held future is driven again.
    ExecutionStateResume {
        /// Future id.
        future_id: String,
    },

    /// The strategy paused the future.
    ExecutionStateHold {
        /// Future id.
        future_id: String,
        /// Why.
        reason: String,
    },

    /// The future finished.
    ExecutionStateComplete {
        /// Future id.
        future_id: String,
        /// Final result.
        result: ExecutionResult,
    },
}

impl JournalMessage {
    /// Future the message is about, if any.
    #[must_use]
    pub fn future_id(&self) -> Option<&str> {
        match self {
            Self::RunStart { .. } => None,
            Self::ExecutionStateInitialize { future_id, .. }
            | Self::NetworkInteractionRequest { future_id, .. }
            | Self::TransactionSend { future_id, .. }
            | Self::TransactionConfirm { future_id, .. }
            | Self::StaticCallComplete { future_id, .. }
            | Self::OnchainInteractionDropped { future_id, .. }
            | Self::OnchainInteractionTimeout { future_id, .. }
            | Self::ExecutionStateResume { future_id }
            | Self::ExecutionStateHold { future_id, .. }
            | Self::ExecutionStateComplete { future_id, .. } => Some(future_id),
        }
    }

    /// Wire name of the message type.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::RunStart { .. } => "RUN_START",
            Self::ExecutionStateInitialize { .. } => "EXECUTION_STATE_INITIALIZE",
            Self::NetworkInteractionRequest { .. } => "NETWORK_INTERACTION_REQUEST",
            Self::TransactionSend { .. } => "TRANSACTION_SEND",
            Self::TransactionConfirm { .. } => "TRANSACTION_CONFIRM",
            Self::StaticCallComplete { .. } => "STATIC_CALL_COMPLETE",
            Self::OnchainInteractionDropped { .. } => "ONCHAIN_INTERACTION_DROPPED",
            Self::OnchainInteractionTimeout { .. } => "ONCHAIN_INTERACTION_TIMEOUT",
            Self::ExecutionStateResume { .. } => "EXECUTION_STATE_RESUME",
            Self::ExecutionStateHold { .. } => "EXECUTION_STATE_HOLD",
            Self::ExecutionStateComplete { .. } => "EXECUTION_STATE_COMPLETE",
        }
    }
}
