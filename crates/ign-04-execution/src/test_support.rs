//! Artifacts and chain helpers shared by the tests in this crate.

use crate::adapters::{InMemoryChain, ScriptedResponse};
use serde_json::json;
use shared_types::{keccak256, Address, Artifact, EventLog, Hash, InMemoryArtifacts};

pub(crate) fn token() -> Artifact {
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
            {"type": "function", "name": "owner", "stateMutability": "view",
                "inputs": [], "outputs": [{"name": "", "type": "address"}]},
            {"type": "event", "name": "Transfer", "anonymous": false, "inputs": [
                {"name": "from", "type": "address", "indexed": true},
                {"name": "to", "type": "address", "indexed": true},
                {"name": "value", "type": "uint256", "indexed": false}
            ]},
            {"type": "error", "name": "InsufficientBalance", "inputs": [
                {"name": "available", "type": "uint256"},
                {"name": "required", "type": "uint256"}
            ]}
        ],
        "bytecode": "0x60016000",
        "deployedBytecode": "0x60016000",
        "linkReferences": {}
    }))
    .unwrap()
}

pub(crate) fn exchange() -> Artifact {
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
    .unwrap()
}

pub(crate) fn store() -> InMemoryArtifacts {
    InMemoryArtifacts::new().with(token()).with(exchange())
}

/// Four-byte selector of `signature`.
pub(crate) fn selector(signature: &str) -> Vec<u8> {
    keccak256(signature.as_bytes()).as_bytes()[..4].to_vec()
}

/// 32-byte big-endian word holding `value`.
pub(crate) fn word(value: u64) -> Vec<u8> {
    let mut word = vec![0u8; 24];
    word.extend_from_slice(&value.to_be_bytes());
    word
}

/// `Transfer(from, to, value)` emitted by the called or created contract.
pub(crate) fn transfer_log(from: Address, to: Address, value: u64) -> EventLog {
    let topic = |address: Address| {
        let mut bytes = [0u8; 32];
        bytes[12..].copy_from_slice(address.as_bytes());
        Hash::new(bytes)
    };
    EventLog {
        address: Address::ZERO,
        topics: vec![
            keccak256(b"Transfer(address,address,uint256)"),
            topic(from),
            topic(to),
        ],
        data: word(value),
    }
}

/// Makes every `Token` deployment emit a mint `Transfer` to `holder`.
pub(crate) fn script_token_mint(chain: &InMemoryChain, holder: Address, amount: u64) {
    chain.respond(
        vec![0x60, 0x01, 0x60, 0x00],
        ScriptedResponse::returns(vec![]).with_logs(vec![transfer_log(Address::ZERO, holder, amount)]),
    );
}
