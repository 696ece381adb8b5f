//! # Revert Decoding
//!
//! Classifies `eth_call` and transaction failures from their return data.
//!
//! The classification order is:
//!
//! 1. empty data → [`EvmExecutionError::RevertWithoutReason`]
//! 2. `Error(string)` → [`EvmExecutionError::RevertWithReason`]
//! 3. `Panic(uint256)` → [`EvmExecutionError::RevertWithPanicCode`], unknown
//!    codes → [`EvmExecutionError::RevertWithInvalidData`]
//! 4. a custom error declared in the ABI →
//!    [`EvmExecutionError::RevertWithCustomError`], undecodable payload →
//!    [`EvmExecutionError::RevertWithInvalidData`]
//! 5. the node reported a custom error →
//!    [`EvmExecutionError::RevertWithUnknownCustomError`]
//! 6. anything else →
//!    [`EvmExecutionError::RevertWithInvalidDataOrUnknownCustomError`]
//!
//! A successful call that returns no data to a function declaring outputs is
//! an [`EvmExecutionError::InvalidResult`], never a revert.

use crate::codec::decode_function_result;
use crate::values::{decode_params, EvmTuple};
use alloy_dyn_abi::{DynSolType, DynSolValue};
use alloy_json_abi::{Function, JsonAbi};
use serde::{Deserialize, Serialize};
use shared_types::{to_hex, RawStaticCallResult};
use thiserror::Error;
use tracing::debug;

/// `bytes4(keccak256("Error(string)"))`
pub const ERROR_STRING_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

/// `bytes4(keccak256("Panic(uint256)"))`
pub const PANIC_SELECTOR: [u8; 4] = [0x4e, 0x48, 0x7b, 0x71];

/// Decoded failure of an EVM call.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE", rename_all_fields = "camelCase")]
pub enum EvmExecutionError {
    /// Reverted with empty data.
    #[error("Transaction reverted without a reason")]
    RevertWithoutReason,

    /// `revert("...")` / `require(cond, "...")`.
    #[error("Transaction reverted with reason '{message}'")]
    RevertWithReason {
        /// Revert message, possibly empty.
        message: String,
    },

    /// Solidity panic.
    #[error("Transaction reverted with panic code {panic_code:#x} ({panic_name})")]
    RevertWithPanicCode {
        /// Panic code.
        panic_code: u64,
        /// Well-known name of the code.
        panic_name: String,
    },

    /// A custom error declared in the contract's ABI.
    #[error("Transaction reverted with custom error '{error_name}'")]
    RevertWithCustomError {
        /// Error name.
        error_name: String,
        /// Decoded error arguments.
        args: EvmTuple,
    },

    /// The node says a custom error was raised but its selector is unknown.
    #[error("Transaction reverted with unknown custom error (selector {signature}, data {data})")]
    RevertWithUnknownCustomError {
        /// `0x` hex selector.
        signature: String,
        /// Full revert data.
        data: String,
    },

    /// Revert data that matched a known shape but could not be decoded.
    #[error("Transaction reverted with invalid data {data}")]
    RevertWithInvalidData {
        /// Full revert data.
        data: String,
    },

    /// Unrecognised revert data.
    #[error("Transaction reverted with invalid data or an unknown custom error {data}")]
    RevertWithInvalidDataOrUnknownCustomError {
        /// `0x` hex selector.
        signature: String,
        /// Full revert data.
        data: String,
    },

    /// A successful call whose return data does not match the function outputs.
    #[error("Call returned invalid data {data}")]
    InvalidResult {
        /// Full return data.
        data: String,
    },
}

/// Name of a well-known Solidity panic code.
#[must_use]
pub fn panic_name(code: u64) -> Option<&'static str> {
    Some(match code {
        0x00 => "GENERIC_PANIC",
        0x01 => "ASSERT_FALSE",
        0x11 => "OVERFLOW",
        0x12 => "DIVIDE_BY_ZERO",
        0x21 => "ENUM_CONVERSION_OUT_OF_BOUNDS",
        0x22 => "INCORRECTLY_ENCODED_STORAGE_BYTE_ARRAY",
        0x31 => "POP_ON_EMPTY_ARRAY",
        0x32 => "ARRAY_ACCESS_OUT_OF_BOUNDS",
        0x41 => "TOO_MUCH_MEMORY_ALLOCATED",
        0x51 => "ZERO_INITIALIZED_VARIABLE",
        _ => return None,
    })
}

/// Classifies revert data. `abi` supplies custom error declarations.
#[must_use]
pub fn decode_error(data: &[u8], abi: Option<&JsonAbi>, custom_error_reported: bool) -> EvmExecutionError {
    if data.is_empty() {
        return EvmExecutionError::RevertWithoutReason;
    }

    let invalid = || EvmExecutionError::RevertWithInvalidData { data: to_hex(data) };
    if data.len() < 4 {
        return invalid();
    }

    let (selector, payload) = data.split_at(4);

    if selector == ERROR_STRING_SELECTOR {
        return match decode_single(&DynSolType::String, payload) {
            Some(DynSolValue::String(message)) => EvmExecutionError::RevertWithReason { message },
            _ => invalid(),
        };
    }

    if selector == PANIC_SELECTOR {
        let code = match decode_single(&DynSolType::Uint(256), payload) {
            Some(DynSolValue::Uint(code, _)) => u64::try_from(code).ok(),
            _ => None,
        };
        return match code.and_then(|c| panic_name(c).map(|name| (c, name))) {
            Some((panic_code, name)) => EvmExecutionError::RevertWithPanicCode {
                panic_code,
                panic_name: name.to_string(),
            },
            None => invalid(),
        };
    }

    if let Some(error) = abi.and_then(|abi| abi.errors().find(|e| e.selector().as_slice() == selector)) {
        return match decode_params(&error.inputs, payload) {
            Ok(args) => EvmExecutionError::RevertWithCustomError {
                error_name: error.name.clone(),
                args,
            },
            Err(e) => {
                debug!(error = %error.name, reason = %e, "Custom error payload did not decode");
                invalid()
            }
        };
    }

    if custom_error_reported {
        return EvmExecutionError::RevertWithUnknownCustomError {
            signature: to_hex(selector),
            data: to_hex(data),
        };
    }

    EvmExecutionError::RevertWithInvalidDataOrUnknownCustomError {
        signature: to_hex(selector),
        data: to_hex(data),
    }
}

fn decode_single(ty: &DynSolType, payload: &[u8]) -> Option<DynSolValue> {
    match DynSolType::Tuple(vec![ty.clone()]).abi_decode_params(payload) {
        Ok(DynSolValue::Tuple(mut values)) if values.len() == 1 => values.pop(),
        _ => None,
    }
}

/// Decodes the result of calling `function`, classifying failures.
pub fn decode_call_result(
    function: &Function,
    abi: &JsonAbi,
    raw: &RawStaticCallResult,
) -> Result<EvmTuple, EvmExecutionError> {
    if !raw.success {
        return Err(decode_error(&raw.return_data, Some(abi), raw.custom_error_reported));
    }

    if raw.return_data.is_empty() && !function.outputs.is_empty() {
        return Err(EvmExecutionError::InvalidResult {
            data: to_hex(&raw.return_data),
        });
    }

    decode_function_result(function, &raw.return_data).map_err(|_| EvmExecutionError::InvalidResult {
        data: to_hex(&raw.return_data),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values::{encode_params, EvmValue};
    use alloy_json_abi::Param;
    use num_bigint::BigInt;

    fn abi() -> JsonAbi {
        serde_json::from_str(
            r#"[
                {"type": "error", "name": "InsufficientBalance", "inputs": [
                    {"name": "available", "type": "uint256"},
                    {"name": "required", "type": "uint256"}
                ]},
                {"type": "function", "name": "ping", "inputs": [], "outputs": [], "stateMutability": "nonpayable"},
                {"type": "function", "name": "count", "inputs": [], "outputs": [{"name": "", "type": "uint256"}], "stateMutability": "view"}
            ]"#,
        )
        .unwrap()
    }

    fn string_param() -> Param {
        serde_json::from_value(serde_json::json!({ "name": "", "type": "string" })).unwrap()
    }

    fn error_string(message: &str) -> Vec<u8> {
        let mut data = ERROR_STRING_SELECTOR.to_vec();
        data.extend(encode_params(&[string_param()], &[EvmValue::from(message)]).unwrap());
        data
    }

    #[test]
    fn test_empty_data_reverts_without_reason() {
        let abi = abi();
        let ping = &abi.functions["ping"][0];
        let err = decode_call_result(ping, &abi, &RawStaticCallResult::revert(vec![])).unwrap_err();
        assert_eq!(err, EvmExecutionError::RevertWithoutReason);
    }

    #[test]
    fn test_reason_string() {
        assert_eq!(
            decode_error(&error_string("reason"), None, false),
            EvmExecutionError::RevertWithReason {
                message: "reason".to_string()
            }
        );
    }

    #[test]
    fn test_empty_reason_string() {
        assert_eq!(
            decode_error(&error_string(""), None, false),
            EvmExecutionError::RevertWithReason {
                message: String::new()
            }
        );
    }

    #[test]
    fn test_panic_code() {
        let mut data = PANIC_SELECTOR.to_vec();
        let mut word = [0u8; 32];
        word[31] = 0x12;
        data.extend_from_slice(&word);

        let err = decode_error(&data, None, false);
        assert_eq!(
            err,
            EvmExecutionError::RevertWithPanicCode {
                panic_code: 0x12,
                panic_name: "DIVIDE_BY_ZERO".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_panic_code_is_invalid_data() {
        let mut data = PANIC_SELECTOR.to_vec();
        let mut word = [0u8; 32];
        word[31] = 0x99;
        data.extend_from_slice(&word);

        assert!(matches!(
            decode_error(&data, None, false),
            EvmExecutionError::RevertWithInvalidData { .. }
        ));
    }

    #[test]
    fn test_custom_error() {
        let abi = abi();
        let error = &abi.errors["InsufficientBalance"][0];
        let mut data = error.selector().to_vec();
        data.extend(encode_params(&error.inputs, &[EvmValue::from(1), EvmValue::from(2)]).unwrap());

        let EvmExecutionError::RevertWithCustomError { error_name, args } =
            decode_error(&data, Some(&abi), false)
        else {
            panic!("expected custom error");
        };
        assert_eq!(error_name, "InsufficientBalance");
        assert_eq!(args.named["required"], EvmValue::Int(BigInt::from(2)));
        assert_eq!(args.positional[0], EvmValue::Int(BigInt::from(1)));
    }

    #[test]
    fn test_custom_error_with_bad_payload_is_invalid_data() {
        let abi = abi();
        let error = &abi.errors["InsufficientBalance"][0];
        let mut data = error.selector().to_vec();
        data.push(1);

        assert!(matches!(
            decode_error(&data, Some(&abi), false),
            EvmExecutionError::RevertWithInvalidData { .. }
        ));
    }

    #[test]
    fn test_unknown_selector() {
        let data = vec![0xde, 0xad, 0xbe, 0xef];
        assert_eq!(
            decode_error(&data, Some(&abi()), true),
            EvmExecutionError::RevertWithUnknownCustomError {
                signature: "0xdeadbeef".to_string(),
                data: "0xdeadbeef".to_string(),
            }
        );
        assert!(matches!(
            decode_error(&data, Some(&abi()), false),
            EvmExecutionError::RevertWithInvalidDataOrUnknownCustomError { .. }
        ));
    }

    #[test]
    fn test_empty_success_with_outputs_is_invalid_result() {
        let abi = abi();
        let count = &abi.functions["count"][0];
        let err = decode_call_result(count, &abi, &RawStaticCallResult::success(vec![])).unwrap_err();
        assert!(matches!(err, EvmExecutionError::InvalidResult { .. }));

        let ping = &abi.functions["ping"][0];
        let ok = decode_call_result(ping, &abi, &RawStaticCallResult::success(vec![])).unwrap();
        assert!(ok.is_empty());
    }

    #[test]
    fn test_serialized_discriminant() {
        let json = serde_json::to_value(EvmExecutionError::RevertWithPanicCode {
            panic_code: 0x11,
            panic_name: "OVERFLOW".to_string(),
        })
        .unwrap();
        assert_eq!(json["type"], "REVERT_WITH_PANIC_CODE");
        assert_eq!(json["panicName"], "OVERFLOW");
    }
}
