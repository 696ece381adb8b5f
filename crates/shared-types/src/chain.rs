//! # Chain Records
//!
//! Shapes returned by the chain that more than one crate needs to read.

use crate::value_objects::{hex_bytes, Address, Hash};
use serde::{Deserialize, Serialize};

/// A log emitted during transaction execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLog {
    /// Emitting contract.
    pub address: Address,
    /// Indexed topics; `topics[0]` is the event selector for non-anonymous events.
    pub topics: Vec<Hash>,
    /// Non-indexed payload.
    #[serde(with = "hex_bytes")]
    pub data: Vec<u8>,
}

impl EventLog {
    /// Event selector, if present.
    #[must_use]
    pub fn selector(&self) -> Option<&Hash> {
        self.topics.first()
    }
}

/// Outcome of an `eth_call`, before any ABI decoding.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStaticCallResult {
    /// Return data on success, revert data on failure.
    #[serde(with = "hex_bytes")]
    pub return_data: Vec<u8>,
    /// False if the call reverted.
    pub success: bool,
    /// The node's error message said a custom error was raised.
    pub custom_error_reported: bool,
}

impl RawStaticCallResult {
    /// A successful call returning `data`.
    #[must_use]
    pub fn success(data: Vec<u8>) -> Self {
        Self {
            return_data: data,
            success: true,
            custom_error_reported: false,
        }
    }

    /// A reverted call with revert payload `data`.
    #[must_use]
    pub fn revert(data: Vec<u8>) -> Self {
        Self {
            return_data: data,
            success: false,
            custom_error_reported: false,
        }
    }
}
