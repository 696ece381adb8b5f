//! # Test Fixtures
//!
//! Hardhat-style artifacts for a small token system and helpers to script
//! the in-memory chain's responses.

use ign_04_execution::prelude::*;
use serde_json::json;
use shared_types::{keccak256, Address, Artifact, EventLog, Hash, InMemoryArtifacts};
use std::sync::Arc;
use std::time::Duration;

// =============================================================================
// ACCOUNTS
// =============================================================================

/// Deployer.
pub const ALICE: Address = Address::new([0xa1; 20]);

/// Second signer.
pub const BOB: Address = Address::new([0xb0; 20]);

/// Both signers, deployer first.
pub fn accounts() -> Vec<Address> {
    vec![ALICE, BOB]
}

// =============================================================================
// ARTIFACTS
// =============================================================================

/// Bytecode of `Token`; deployments are matched on it.
pub const TOKEN_BYTECODE: [u8; 4] = [0x60, 0x01, 0x60, 0x00];

/// `Token(uint256 supply)` with `mint`, `balanceOf` and a `Transfer` event.
pub fn token() -> Artifact {
    serde_json::from_value(json!({
        "contractName": "Token",
        "sourceName": "contracts/Token.sol",
        "abi": [
            {"type": "constructor", "stateMutability": "nonpayable", "inputs": [
                {"name": "supply", "type": "uint256"}
            ]},
            {"type": "function", "name": "mint", "stateMutability": "nonpayable", "outputs": [], "inputs": [
                {"name": "to", "type": "address"},
                {"name": "amount", "type": "uint256"}
            ]},
            {"type": "function", "name": "balanceOf", "stateMutability": "view",
                "inputs": [{"name": "owner", "type": "address"}],
                "outputs": [{"name": "balance", "type": "uint256"}]},
            {"type": "event", "name": "Transfer", "anonymous": false, "inputs": [
                {"name": "from", "type": "address", "indexed": true},
                {"name": "to", "type": "address", "indexed": true},
                {"name": "value", "type": "uint256", "indexed": false}
            ]}
        ],
        "bytecode": "0x60016000",
        "linkReferences": {}
    }))
    .expect("token artifact")
}

/// `Exchange(address token)` with `addToken(address)`.
pub fn exchange() -> Artifact {
    serde_json::from_value(json!({
        "contractName": "Exchange",
        "sourceName": "contracts/Exchange.sol",
        "abi": [
            {"type": "constructor", "stateMutability": "nonpayable", "inputs": [
                {"name": "token", "type": "address"}
            ]},
            {"type": "function", "name": "addToken", "stateMutability": "nonpayable", "outputs": [], "inputs": [
                {"name": "token", "type": "address"}
            ]}
        ],
        "bytecode": "0x60026000",
        "linkReferences": {}
    }))
    .expect("exchange artifact")
}

/// `Another()` with a payable `deposit()`.
pub fn another() -> Artifact {
    serde_json::from_value(json!({
        "contractName": "Another",
        "sourceName": "contracts/Another.sol",
        "abi": [
            {"type": "constructor", "stateMutability": "nonpayable", "inputs": []},
            {"type": "function", "name": "deposit", "stateMutability": "payable", "outputs": [], "inputs": []}
        ],
        "bytecode": "0x60036000",
        "linkReferences": {}
    }))
    .expect("another artifact")
}

/// Store holding every fixture artifact.
pub fn artifacts() -> Arc<InMemoryArtifacts> {
    Arc::new(InMemoryArtifacts::new().with(token()).with(exchange()).with(another()))
}

// =============================================================================
// CHAIN
// =============================================================================

/// Engine settings for the in-memory chain: one confirmation, fast polling.
pub fn fast_config() -> ExecutionConfig {
    ExecutionConfig {
        block_polling_interval: Duration::from_millis(5),
        ..ExecutionConfig::local()
    }
}

/// Four-byte selector of `signature`.
pub fn selector(signature: &str) -> Vec<u8> {
    keccak256(signature.as_bytes()).as_bytes()[..4].to_vec()
}

/// 32-byte big-endian word holding `value`.
pub fn word(value: u64) -> Vec<u8> {
    let mut word = vec![0u8; 24];
    word.extend_from_slice(&value.to_be_bytes());
    word
}

/// 32-byte word holding `address`, left padded.
pub fn address_word(address: Address) -> Vec<u8> {
    let mut word = vec![0u8; 12];
    word.extend_from_slice(address.as_bytes());
    word
}

/// `Transfer(from, to, value)`; the chain stamps the emitter address.
pub fn transfer_log(from: Address, to: Address, value: u64) -> EventLog {
    let topic = |address: Address| {
        let mut bytes = [0u8; 32];
        bytes[12..].copy_from_slice(address.as_bytes());
        Hash::new(bytes)
    };
    EventLog {
        address: Address::ZERO,
        topics: vec![keccak256(b"Transfer(address,address,uint256)"), topic(from), topic(to)],
        data: word(value),
    }
}

/// Every `Token` deployment emits a mint `Transfer` of `amount` to `holder`.
pub fn script_token_mint(chain: &InMemoryChain, holder: Address, amount: u64) {
    chain.respond(
        TOKEN_BYTECODE.to_vec(),
        ScriptedResponse::returns(vec![]).with_logs(vec![transfer_log(Address::ZERO, holder, amount)]),
    );
}
