//! # Chain Port
//!
//! What the engine needs from a node. Implementations map their transport
//! errors to [`ChainError`]; retrying is the engine's concern.

use crate::domain::{NetworkFees, TransactionReceipt};
use crate::errors::ChainError;
use async_trait::async_trait;
use num_bigint::BigInt;
use shared_types::{Address, Hash, RawStaticCallResult};

/// Block used for account queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockTag {
    /// Last mined block.
    Latest,
    /// Including the node's pending transactions.
    Pending,
}

/// An `eth_call`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    /// Caller.
    pub from: Address,
    /// Target; `None` simulates a deployment.
    pub to: Option<Address>,
    /// Calldata.
    pub data: Vec<u8>,
    /// Value in wei.
    pub value: BigInt,
}

/// A transaction to sign and broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRequest {
    /// Sender; the node holds its key.
    pub from: Address,
    /// Recipient; `None` deploys a contract.
    pub to: Option<Address>,
    /// Calldata or deployment data.
    pub data: Vec<u8>,
    /// Value in wei.
    pub value: BigInt,
    /// Nonce.
    pub nonce: u64,
    /// Fee caps.
    pub fees: NetworkFees,
}

/// Header data the engine cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
    /// Block number.
    pub number: u64,
    /// Block hash.
    pub hash: Hash,
}

/// A transaction the node knows, mined or pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionInfo {
    /// Transaction hash.
    pub hash: Hash,
    /// Its nonce.
    pub nonce: u64,
    /// Block it was mined in, if mined.
    pub block_number: Option<u64>,
}

/// Node access - outbound port.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Chain id.
    async fn chain_id(&self) -> Result<u64, ChainError>;

    /// Current fee suggestion.
    async fn network_fees(&self) -> Result<NetworkFees, ChainError>;

    /// Performs an `eth_call` against the latest block. A revert is a
    /// successful request returning an unsuccessful result.
    async fn call(&self, request: &CallRequest) -> Result<RawStaticCallResult, ChainError>;

    /// Broadcasts a transaction and returns its hash.
    async fn send_transaction(&self, request: &TransactionRequest) -> Result<Hash, ChainError>;

    /// Transaction count of `address` at `block`.
    async fn transaction_count(&self, address: Address, block: BlockTag) -> Result<u64, ChainError>;

    /// Last mined block.
    async fn latest_block(&self) -> Result<BlockInfo, ChainError>;

    /// Looks a transaction up by hash.
    async fn get_transaction(&self, hash: Hash) -> Result<Option<TransactionInfo>, ChainError>;

    /// Receipt of a mined transaction.
    async fn get_receipt(&self, hash: Hash) -> Result<Option<TransactionReceipt>, ChainError>;
}
