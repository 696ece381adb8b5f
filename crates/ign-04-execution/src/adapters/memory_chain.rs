//! # In-Memory Chain
//!
//! A scripted development chain. It keeps nonces, mines blocks, computes
//! CREATE addresses and answers calls from a table of scripted responses
//! keyed by calldata prefix. Failure injection covers connection errors,
//! dropped transactions and stalled mining.

use crate::domain::{NetworkFees, ReceiptStatus, TransactionReceipt};
use crate::errors::ChainError;
use crate::ports::{BlockInfo, BlockTag, CallRequest, ChainClient, TransactionInfo, TransactionRequest};
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{compute_contract_address, keccak256, Address, EventLog, Hash, RawStaticCallResult};
use std::collections::HashMap;
use tracing::debug;

/// Chain id of the in-memory chain unless configured otherwise.
pub const DEFAULT_CHAIN_ID: u64 = 31337;

/// What a call or transaction whose data starts with a given prefix does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedResponse {
    /// Result of `eth_call`; an unsuccessful result also makes transactions
    /// revert.
    pub result: RawStaticCallResult,
    /// Logs of a successful transaction. A zero address stands for the
    /// called or created contract.
    pub logs: Vec<EventLog>,
}

impl ScriptedResponse {
    /// Successful call returning `data`.
    #[must_use]
    pub fn returns(data: Vec<u8>) -> Self {
        Self {
            result: RawStaticCallResult::success(data),
            logs: Vec::new(),
        }
    }

    /// Reverting call with revert payload `data`.
    #[must_use]
    pub fn reverts(data: Vec<u8>) -> Self {
        Self {
            result: RawStaticCallResult::revert(data),
            logs: Vec::new(),
        }
    }

    /// Adds logs emitted by the transaction.
    #[must_use]
    pub fn with_logs(mut self, logs: Vec<EventLog>) -> Self {
        self.logs = logs;
        self
    }
}

#[derive(Debug, Clone)]
struct PendingTransaction {
    hash: Hash,
    request: TransactionRequest,
}

#[derive(Debug, Clone)]
struct MinedTransaction {
    info: TransactionInfo,
    receipt: TransactionReceipt,
}

#[derive(Debug)]
struct ChainState {
    chain_id: u64,
    fees: NetworkFees,
    block_number: u64,
    auto_mine: bool,
    nonces: HashMap<Address, u64>,
    pending: Vec<PendingTransaction>,
    mined: HashMap<Hash, MinedTransaction>,
    responses: Vec<(Vec<u8>, ScriptedResponse)>,
    failures: u32,
    sent: Vec<TransactionRequest>,
    sequence: u64,
}

impl ChainState {
    fn response_for(&self, data: &[u8]) -> Option<&ScriptedResponse> {
        self.responses
            .iter()
            .rev()
            .filter(|(prefix, _)| data.starts_with(prefix))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, response)| response)
    }

    fn take_failure(&mut self) -> Result<(), ChainError> {
        if self.failures > 0 {
            self.failures -= 1;
            return Err(ChainError::Connection("injected connection failure".to_string()));
        }
        Ok(())
    }

    fn mine_block(&mut self) -> usize {
        self.block_number += 1;
        let block_number = self.block_number;
        let block_hash = block_hash(block_number);
        let mut mined = 0;

        loop {
            let next = self.pending.iter().position(|tx| {
                tx.request.nonce == self.nonces.get(&tx.request.from).copied().unwrap_or(0)
            });
            let Some(index) = next else { break };
            let tx = self.pending.remove(index);
            let request = &tx.request;
            self.nonces.insert(request.from, request.nonce + 1);

            let response = self.response_for(&request.data).cloned();
            let succeeded = response.as_ref().map_or(true, |r| r.result.success);
            let contract_address = match request.to {
                None if succeeded => Some(compute_contract_address(request.from, request.nonce)),
                _ => None,
            };
            let target = request.to.or(contract_address).unwrap_or(Address::ZERO);
            let logs = match response {
                Some(response) if succeeded => response
                    .logs
                    .into_iter()
                    .map(|mut log| {
                        if log.address.is_zero() {
                            log.address = target;
                        }
                        log
                    })
                    .collect(),
                _ => Vec::new(),
            };

            self.mined.insert(
                tx.hash,
                MinedTransaction {
                    info: TransactionInfo {
                        hash: tx.hash,
                        nonce: request.nonce,
                        block_number: Some(block_number),
                    },
                    receipt: TransactionReceipt {
                        transaction_hash: tx.hash,
                        block_number,
                        block_hash,
                        status: if succeeded {
                            ReceiptStatus::Success
                        } else {
                            ReceiptStatus::Failure
                        },
                        contract_address,
                        logs,
                    },
                },
            );
            mined += 1;
        }

        debug!(block = block_number, transactions = mined, "mined block");
        mined
    }
}

fn block_hash(number: u64) -> Hash {
    keccak256(&[b"block".as_slice(), &number.to_be_bytes()].concat())
}

/// Scripted in-memory [`ChainClient`].
#[derive(Debug)]
pub struct InMemoryChain {
    state: Mutex<ChainState>,
}

impl Default for InMemoryChain {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryChain {
    /// An automining chain with id [`DEFAULT_CHAIN_ID`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ChainState {
                chain_id: DEFAULT_CHAIN_ID,
                fees: NetworkFees {
                    max_fee_per_gas: 2_000_000_000,
                    max_priority_fee_per_gas: 1_000_000_000,
                },
                block_number: 0,
                auto_mine: true,
                nonces: HashMap::new(),
                pending: Vec::new(),
                mined: HashMap::new(),
                responses: Vec::new(),
                failures: 0,
                sent: Vec::new(),
                sequence: 0,
            }),
        }
    }

    /// Sets the chain id.
    #[must_use]
    pub fn with_chain_id(self, chain_id: u64) -> Self {
        self.state.lock().chain_id = chain_id;
        self
    }

    /// Scripts calls and transactions whose data starts with `prefix`. The
    /// longest matching prefix wins; among equal ones the latest.
    pub fn respond(&self, prefix: impl Into<Vec<u8>>, response: ScriptedResponse) {
        self.state.lock().responses.push((prefix.into(), response));
    }

    /// Turns mining on every send on or off.
    pub fn set_auto_mine(&self, enabled: bool) {
        self.state.lock().auto_mine = enabled;
    }

    /// Changes the suggested fees.
    pub fn set_fees(&self, fees: NetworkFees) {
        self.state.lock().fees = fees;
    }

    /// Makes the next `count` requests fail with a connection error.
    pub fn fail_next(&self, count: u32) {
        self.state.lock().failures = count;
    }

    /// Mines one block with every minable pending transaction and returns
    /// how many were included.
    pub fn mine(&self) -> usize {
        self.state.lock().mine_block()
    }

    /// Mines `count` empty blocks.
    pub fn advance_blocks(&self, count: u64) {
        let mut state = self.state.lock();
        state.block_number += count;
    }

    /// Forgets every pending transaction, as a node evicting them would.
    /// Returns how many were dropped.
    pub fn drop_pending(&self) -> usize {
        let mut state = self.state.lock();
        let dropped = state.pending.len();
        state.pending.clear();
        dropped
    }

    /// Sends a transaction outside the engine, consuming `from`'s next
    /// nonce.
    pub fn send_external(&self, from: Address) -> Hash {
        let mut state = self.state.lock();
        let nonce = state.nonces.get(&from).copied().unwrap_or(0)
            + state.pending.iter().filter(|tx| tx.request.from == from).count() as u64;
        let fees = state.fees;
        let request = TransactionRequest {
            from,
            to: Some(from),
            data: Vec::new(),
            value: 0.into(),
            nonce,
            fees,
        };
        insert_transaction(&mut state, request)
    }

    /// Every transaction sent so far, replacements included.
    #[must_use]
    pub fn sent_transactions(&self) -> Vec<TransactionRequest> {
        self.state.lock().sent.clone()
    }

    /// Number of pending transactions.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Current block number.
    #[must_use]
    pub fn block_number(&self) -> u64 {
        self.state.lock().block_number
    }
}

fn insert_transaction(state: &mut ChainState, request: TransactionRequest) -> Hash {
    state.sequence += 1;
    let hash = keccak256(
        &[
            request.from.as_bytes().as_slice(),
            &request.nonce.to_be_bytes(),
            &request.fees.max_fee_per_gas.to_be_bytes(),
            &state.sequence.to_be_bytes(),
            &request.data,
        ]
        .concat(),
    );
    state
        .pending
        .retain(|tx| !(tx.request.from == request.from && tx.request.nonce == request.nonce));
    state.sent.push(request.clone());
    state.pending.push(PendingTransaction { hash, request });
    if state.auto_mine {
        state.mine_block();
    }
    hash
}

#[async_trait]
impl ChainClient for InMemoryChain {
    async fn chain_id(&self) -> Result<u64, ChainError> {
        let mut state = self.state.lock();
        state.take_failure()?;
        Ok(state.chain_id)
    }

    async fn network_fees(&self) -> Result<NetworkFees, ChainError> {
        let mut state = self.state.lock();
        state.take_failure()?;
        Ok(state.fees)
    }

    async fn call(&self, request: &CallRequest) -> Result<RawStaticCallResult, ChainError> {
        let mut state = self.state.lock();
        state.take_failure()?;
        Ok(state
            .response_for(&request.data)
            .map_or_else(|| RawStaticCallResult::success(Vec::new()), |r| r.result.clone()))
    }

    async fn send_transaction(&self, request: &TransactionRequest) -> Result<Hash, ChainError> {
        let mut state = self.state.lock();
        state.take_failure()?;

        let mined_nonce = state.nonces.get(&request.from).copied().unwrap_or(0);
        if request.nonce < mined_nonce {
            return Err(ChainError::Rejected(format!(
                "nonce too low: next nonce {mined_nonce}, tx nonce {}",
                request.nonce
            )));
        }
        if let Some(existing) = state
            .pending
            .iter()
            .find(|tx| tx.request.from == request.from && tx.request.nonce == request.nonce)
        {
            if request.fees.max_fee_per_gas <= existing.request.fees.max_fee_per_gas {
                return Err(ChainError::Rejected("replacement transaction underpriced".to_string()));
            }
        }

        Ok(insert_transaction(&mut state, request.clone()))
    }

    async fn transaction_count(&self, address: Address, block: BlockTag) -> Result<u64, ChainError> {
        let mut state = self.state.lock();
        state.take_failure()?;
        let mined = state.nonces.get(&address).copied().unwrap_or(0);
        Ok(match block {
            BlockTag::Latest => mined,
            BlockTag::Pending => {
                mined + state.pending.iter().filter(|tx| tx.request.from == address).count() as u64
            }
        })
    }

    async fn latest_block(&self) -> Result<BlockInfo, ChainError> {
        let mut state = self.state.lock();
        state.take_failure()?;
        Ok(BlockInfo {
            number: state.block_number,
            hash: block_hash(state.block_number),
        })
    }

    async fn get_transaction(&self, hash: Hash) -> Result<Option<TransactionInfo>, ChainError> {
        let mut state = self.state.lock();
        state.take_failure()?;
        if let Some(mined) = state.mined.get(&hash) {
            return Ok(Some(mined.info));
        }
        Ok(state.pending.iter().find(|tx| tx.hash == hash).map(|tx| TransactionInfo {
            hash,
            nonce: tx.request.nonce,
            block_number: None,
        }))
    }

    async fn get_receipt(&self, hash: Hash) -> Result<Option<TransactionReceipt>, ChainError> {
        let mut state = self.state.lock();
        state.take_failure()?;
        Ok(state.mined.get(&hash).map(|m| m.receipt.clone()))
    }
}
