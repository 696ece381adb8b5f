//! # Execution State
//!
//! Per-future records of what has been sent to the chain and what came back.
//! They are never mutated directly: the reducer in
//! [`reducer`](super::reducer) applies journal messages to them.

use ign_01_abi::{EvmExecutionError, EvmValue};
use ign_02_module_graph::FutureType;
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};
use shared_types::{bigint_ser, hex_bytes, Address, EventLog, Hash, NameOrIndex, RawStaticCallResult};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// =============================================================================
// STATUS
// =============================================================================

/// Lifecycle of one future.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    /// Initialized and being driven.
    Started,
    /// A transaction stayed unconfirmed after every fee bump. A later run
    /// resumes it.
    Timeout,
    /// Completed successfully.
    Success,
    /// Completed with a failure result.
    Failed,
    /// Paused by the strategy. A later run resumes it.
    Held,
}

impl ExecutionStatus {
    /// True for `Success` and `Failed`.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Started => "STARTED",
            Self::Timeout => "TIMEOUT",
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
            Self::Held => "HELD",
        })
    }
}

// =============================================================================
// TRANSACTIONS
// =============================================================================

/// EIP-1559 fee caps, in wei per gas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkFees {
    /// `maxFeePerGas`.
    pub max_fee_per_gas: u64,
    /// `maxPriorityFeePerGas`.
    pub max_priority_fee_per_gas: u64,
}

/// One transaction sent for an interaction's nonce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentTransaction {
    /// Transaction hash.
    pub hash: Hash,
    /// Fees it was sent with.
    pub fees: NetworkFees,
}

/// Outcome of a mined transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReceiptStatus {
    /// Executed.
    Success,
    /// Reverted.
    Failure,
}

/// Receipt of a mined transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    /// Hash of the mined transaction.
    pub transaction_hash: Hash,
    /// Block it was mined in.
    pub block_number: u64,
    /// Hash of that block.
    pub block_hash: Hash,
    /// Execution outcome.
    pub status: ReceiptStatus,
    /// Created contract, for deployments.
    pub contract_address: Option<Address>,
    /// Emitted logs.
    pub logs: Vec<EventLog>,
}

// =============================================================================
// NETWORK INTERACTIONS
// =============================================================================

/// A transaction-backed interaction. Every transaction shares the nonce;
/// later ones replace earlier ones with higher fees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnchainInteraction {
    /// 1-based id within the future.
    pub id: u32,
    /// Recipient; `None` deploys a contract.
    pub to: Option<Address>,
    /// Calldata or deployment data.
    #[serde(with = "hex_bytes")]
    pub data: Vec<u8>,
    /// Value in wei.
    #[serde(with = "bigint_ser")]
    pub value: BigInt,
    /// Sender.
    pub from: Address,
    /// Assigned when the first transaction is sent.
    pub nonce: Option<u64>,
    /// Transactions sent for the nonce, oldest first.
    pub transactions: Vec<SentTransaction>,
    /// Receipt once confirmed.
    pub receipt: Option<TransactionReceipt>,
    /// Every transaction disappeared from the node; send again.
    pub should_be_resent: bool,
}

/// An `eth_call` interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticCallInteraction {
    /// 1-based id within the future.
    pub id: u32,
    /// Recipient.
    pub to: Option<Address>,
    /// Calldata.
    #[serde(with = "hex_bytes")]
    pub data: Vec<u8>,
    /// Value in wei.
    #[serde(with = "bigint_ser")]
    pub value: BigInt,
    /// Sender.
    pub from: Address,
    /// Raw result once performed.
    pub result: Option<RawStaticCallResult>,
}

/// An interaction with the chain, in the order the strategy requested them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NetworkInteraction {
    /// Transaction.
    OnchainInteraction(OnchainInteraction),
    /// `eth_call`.
    StaticCall(StaticCallInteraction),
}

impl NetworkInteraction {
    /// Interaction id.
    #[must_use]
    pub fn id(&self) -> u32 {
        match self {
            Self::OnchainInteraction(i) => i.id,
            Self::StaticCall(i) => i.id,
        }
    }

    /// True once the chain answered.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        match self {
            Self::OnchainInteraction(i) => i.receipt.is_some(),
            Self::StaticCall(i) => i.result.is_some(),
        }
    }
}

// =============================================================================
// REQUESTS
// =============================================================================

/// Resolved inputs of a future, fixed when its execution starts. Artifacts
/// are not stored: they are loaded again from the module on every run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE", rename_all_fields = "camelCase")]
pub enum ExecutionRequest {
    /// Contract or library deployment.
    Deployment {
        /// Contract name.
        contract_name: String,
        /// Constructor arguments.
        constructor_args: Vec<EvmValue>,
        /// Library name → deployed address.
        libraries: BTreeMap<String, Address>,
        /// Value in wei.
        #[serde(with = "bigint_ser")]
        value: BigInt,
    },
    /// Function call transaction.
    Call {
        /// Contract name.
        contract_name: String,
        /// Target address.
        contract_address: Address,
        /// Function name or signature.
        function_name: String,
        /// Arguments.
        args: Vec<EvmValue>,
        /// Value in wei.
        #[serde(with = "bigint_ser")]
        value: BigInt,
    },
    /// Read-only call.
    StaticCall {
        /// Contract name.
        contract_name: String,
        /// Target address.
        contract_address: Address,
        /// Function name or signature.
        function_name: String,
        /// Arguments.
        args: Vec<EvmValue>,
        /// Selected return value.
        name_or_index: NameOrIndex,
    },
    /// Raw transfer.
    SendData {
        /// Recipient.
        to: Address,
        /// Calldata.
        #[serde(with = "hex_bytes")]
        data: Vec<u8>,
        /// Value in wei.
        #[serde(with = "bigint_ser")]
        value: BigInt,
    },
    /// Existing contract.
    ContractAt {
        /// Contract name.
        contract_name: String,
        /// Its address.
        address: Address,
    },
    /// Calldata encoding.
    EncodeFunctionCall {
        /// Contract name.
        contract_name: String,
        /// Function name or signature.
        function_name: String,
        /// Arguments.
        args: Vec<EvmValue>,
    },
    /// Event argument read.
    ReadEventArgument {
        /// Future whose receipt is read.
        future_to_read_from: String,
        /// Emitting contract address.
        emitter: Address,
        /// Event name or signature.
        event_name: String,
        /// Selected argument.
        name_or_index: NameOrIndex,
        /// Which matching log.
        event_index: usize,
    },
}

impl ExecutionRequest {
    /// Contract name, for requests that have one.
    #[must_use]
    pub fn contract_name(&self) -> Option<&str> {
        match self {
            Self::Deployment { contract_name, .. }
            | Self::Call { contract_name, .. }
            | Self::StaticCall { contract_name, .. }
            | Self::ContractAt { contract_name, .. }
            | Self::EncodeFunctionCall { contract_name, .. } => Some(contract_name),
            Self::SendData { .. } | Self::ReadEventArgument { .. } => None,
        }
    }

    /// Function or event name, for requests that have one.
    #[must_use]
    pub fn fragment_name(&self) -> Option<&str> {
        match self {
            Self::Call { function_name, .. }
            | Self::StaticCall { function_name, .. }
            | Self::EncodeFunctionCall { function_name, .. } => Some(function_name),
            Self::ReadEventArgument { event_name, .. } => Some(event_name),
            Self::Deployment { .. } | Self::SendData { .. } | Self::ContractAt { .. } => None,
        }
    }
}

// =============================================================================
// RESULTS
// =============================================================================

/// Kind-specific payload of a successful future.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE", rename_all_fields = "camelCase")]
pub enum SuccessValue {
    /// Deployed contract or library.
    Deployment {
        /// Its address.
        address: Address,
    },
    /// Confirmed call.
    Call,
    /// Selected return value.
    StaticCall {
        /// The value.
        value: EvmValue,
    },
    /// Confirmed transfer.
    SendData,
    /// Existing contract.
    ContractAt {
        /// Its address.
        address: Address,
    },
    /// Encoded calldata.
    EncodeFunctionCall {
        /// The calldata.
        #[serde(with = "hex_bytes")]
        data: Vec<u8>,
    },
    /// Selected event argument.
    ReadEventArgument {
        /// The value.
        value: EvmValue,
    },
}

impl SuccessValue {
    /// Address of a deployed or existing contract.
    #[must_use]
    pub fn address(&self) -> Option<Address> {
        match self {
            Self::Deployment { address } | Self::ContractAt { address } => Some(*address),
            _ => None,
        }
    }

    /// The value this future contributes when used as an argument.
    #[must_use]
    pub fn as_value(&self) -> Option<EvmValue> {
        match self {
            Self::Deployment { address } | Self::ContractAt { address } => Some(EvmValue::from(*address)),
            Self::StaticCall { value } | Self::ReadEventArgument { value } => Some(value.clone()),
            Self::EncodeFunctionCall { data } => Some(EvmValue::String(shared_types::to_hex(data))),
            Self::Call | Self::SendData => None,
        }
    }
}

/// Final result of a future.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE", rename_all_fields = "camelCase")]
pub enum ExecutionResult {
    /// Completed.
    Success {
        /// Payload.
        value: SuccessValue,
    },
    /// The strategy or the environment behaved unexpectedly.
    StrategyError {
        /// Description.
        message: String,
    },
    /// A static call reverted or returned invalid data.
    StaticCallError {
        /// Decoded failure.
        error: EvmExecutionError,
    },
    /// The pre-send simulation reverted; nothing was sent.
    SimulationError {
        /// Decoded failure.
        error: EvmExecutionError,
    },
    /// The strategy rejected a successful simulation; nothing was sent.
    StrategySimulationError {
        /// Description.
        message: String,
    },
    /// The transaction was mined and reverted.
    Revert {
        /// Hash of the reverted transaction.
        transaction_hash: Hash,
    },
}

impl ExecutionResult {
    /// Wraps a success payload.
    #[must_use]
    pub fn success(value: SuccessValue) -> Self {
        Self::Success { value }
    }

    /// Wraps a strategy error message.
    pub fn strategy_error(message: impl Into<String>) -> Self {
        Self::StrategyError {
            message: message.into(),
        }
    }

    /// True for `Success`.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Stable discriminant string.
    #[must_use]
    pub fn discriminant(&self) -> &'static str {
        match self {
            Self::Success { .. } => "SUCCESS",
            Self::StrategyError { .. } => "STRATEGY_ERROR",
            Self::StaticCallError { .. } => "STATIC_CALL_ERROR",
            Self::SimulationError { .. } => "SIMULATION_ERROR",
            Self::StrategySimulationError { .. } => "STRATEGY_SIMULATION_ERROR",
            Self::Revert { .. } => "REVERT",
        }
    }
}

impl fmt::Display for ExecutionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success { .. } => f.write_str("SUCCESS"),
            Self::StrategyError { message } | Self::StrategySimulationError { message } => {
                write!(f, "{}: {message}", self.discriminant())
            }
            Self::StaticCallError { error } | Self::SimulationError { error } => {
                write!(f, "{}: {error}", self.discriminant())
            }
            Self::Revert { transaction_hash } => {
                write!(f, "REVERT: transaction {transaction_hash} reverted")
            }
        }
    }
}

// =============================================================================
// EXECUTION STATE
// =============================================================================

/// Everything journaled about one future.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionState {
    /// Future id.
    pub id: String,
    /// Future type.
    pub future_type: FutureType,
    /// Strategy that drives it.
    pub strategy: String,
    /// Lifecycle status.
    pub status: ExecutionStatus,
    /// Direct dependencies, with module dependencies expanded.
    pub dependencies: BTreeSet<String>,
    /// Sender of its interactions.
    pub from: Option<Address>,
    /// Resolved inputs.
    pub request: ExecutionRequest,
    /// Interactions so far.
    pub network_interactions: Vec<NetworkInteraction>,
    /// Set once terminal.
    pub result: Option<ExecutionResult>,
    /// Why the strategy paused it.
    pub hold_reason: Option<String>,
}

impl ExecutionState {
    /// The last interaction if the chain has not answered it yet.
    #[must_use]
    pub fn pending_interaction(&self) -> Option<&NetworkInteraction> {
        self.network_interactions.last().filter(|i| !i.is_complete())
    }

    /// Id for the next interaction.
    #[must_use]
    pub fn next_interaction_id(&self) -> u32 {
        u32::try_from(self.network_interactions.len()).map_or(u32::MAX, |n| n + 1)
    }

    pub(crate) fn onchain_interaction_mut(&mut self, id: u32) -> Option<&mut OnchainInteraction> {
        self.network_interactions.iter_mut().find_map(|i| match i {
            NetworkInteraction::OnchainInteraction(o) if o.id == id => Some(o),
            _ => None,
        })
    }

    pub(crate) fn static_call_mut(&mut self, id: u32) -> Option<&mut StaticCallInteraction> {
        self.network_interactions.iter_mut().find_map(|i| match i {
            NetworkInteraction::StaticCall(s) if s.id == id => Some(s),
            _ => None,
        })
    }

    /// Receipt of the last confirmed transaction.
    #[must_use]
    pub fn last_receipt(&self) -> Option<&TransactionReceipt> {
        self.network_interactions.iter().rev().find_map(|i| match i {
            NetworkInteraction::OnchainInteraction(o) => o.receipt.as_ref(),
            NetworkInteraction::StaticCall(_) => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_result_wire_shape() {
        let result = ExecutionResult::success(SuccessValue::Deployment {
            address: Address::new([0x11; 20]),
        });
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "type": "SUCCESS",
                "value": {"kind": "DEPLOYMENT", "address": "0x1111111111111111111111111111111111111111"}
            })
        );

        let revert = ExecutionResult::Revert {
            transaction_hash: Hash::new([0xab; 32]),
        };
        let value = serde_json::to_value(&revert).unwrap();
        assert_eq!(value["type"], "REVERT");
        assert!(value.get("transactionHash").is_some());
        assert_eq!(serde_json::from_value::<ExecutionResult>(value).unwrap(), revert);
    }

    #[test]
    fn test_discriminants() {
        assert_eq!(ExecutionResult::strategy_error("x").discriminant(), "STRATEGY_ERROR");
        assert_eq!(
            ExecutionResult::SimulationError {
                error: EvmExecutionError::RevertWithoutReason
            }
            .discriminant(),
            "SIMULATION_ERROR"
        );
        assert!(!ExecutionResult::strategy_error("x").is_success());
    }

    #[test]
    fn test_success_value_as_argument() {
        let address = Address::new([0x22; 20]);
        assert_eq!(
            SuccessValue::Deployment { address }.as_value(),
            Some(EvmValue::from(address))
        );
        assert_eq!(
            SuccessValue::EncodeFunctionCall { data: vec![0xde, 0xad] }.as_value(),
            Some(EvmValue::String("0xdead".to_string()))
        );
        assert_eq!(SuccessValue::Call.as_value(), None);
    }

    #[test]
    fn test_request_with_large_value_survives_json() {
        let request = ExecutionRequest::SendData {
            to: Address::new([0x33; 20]),
            data: vec![],
            value: "123456789012345678901234567890".parse().unwrap(),
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"123456789012345678901234567890\""));
        assert_eq!(serde_json::from_str::<ExecutionRequest>(&json).unwrap(), request);
    }
}
