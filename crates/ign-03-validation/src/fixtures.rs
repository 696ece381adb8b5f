//! Artifacts shared by the tests in this crate.

use serde_json::json;
use shared_types::{Artifact, InMemoryArtifacts};

pub(crate) fn token() -> Artifact {
    serde_json::from_value(json!({
        "contractName": "Token",
        "sourceName": "contracts/Token.sol",
        "abi": [
            {"type": "constructor", "stateMutability": "nonpayable", "inputs": [
                {"name": "name", "type": "string"},
                {"name": "supply", "type": "uint256"}
            ]},
            {"type": "function", "name": "mint", "stateMutability": "nonpayable", "outputs": [], "inputs": [
                {"name": "to", "type": "address"},
                {"name": "amount", "type": "uint256"}
            ]},
            {"type": "function", "name": "deposit", "stateMutability": "payable", "inputs": [], "outputs": []},
            {"type": "function", "name": "approveAll", "stateMutability": "nonpayable", "outputs": [],
                "inputs": [{"name": "spenders", "type": "address[]"}]},
            {"type": "function", "name": "balanceOf", "stateMutability": "view",
                "inputs": [{"name": "owner", "type": "address"}],
                "outputs": [{"name": "balance", "type": "uint256"}]},
            {"type": "function", "name": "foo", "stateMutability": "nonpayable", "outputs": [],
                "inputs": [{"name": "x", "type": "uint256"}]},
            {"type": "function", "name": "foo", "stateMutability": "nonpayable", "outputs": [],
                "inputs": [{"name": "x", "type": "bool"}]},
            {"type": "function", "name": "foo", "stateMutability": "nonpayable", "outputs": [],
                "inputs": [{"name": "x", "type": "uint256"}, {"name": "y", "type": "uint256"}]},
            {"type": "event", "name": "Transfer", "anonymous": false, "inputs": [
                {"name": "from", "type": "address", "indexed": true},
                {"name": "to", "type": "address", "indexed": true},
                {"name": "value", "type": "uint256", "indexed": false}
            ]}
        ],
        "bytecode": "0x6080",
        "deployedBytecode": "0x6080",
        "linkReferences": {}
    }))
    .unwrap()
}

pub(crate) fn math() -> Artifact {
    serde_json::from_value(json!({
        "contractName": "Math",
        "sourceName": "contracts/Math.sol",
        "abi": [],
        "bytecode": "0x6080"
    }))
    .unwrap()
}

pub(crate) fn vault() -> Artifact {
    serde_json::from_value(json!({
        "contractName": "Vault",
        "sourceName": "contracts/Vault.sol",
        "abi": [{"type": "constructor", "stateMutability": "payable", "inputs": []}],
        "bytecode": "0x6080",
        "linkReferences": {"contracts/Math.sol": {"Math": [{"start": 1, "length": 20}]}}
    }))
    .unwrap()
}

pub(crate) fn store() -> InMemoryArtifacts {
    InMemoryArtifacts::new().with(token()).with(math()).with(vault())
}
