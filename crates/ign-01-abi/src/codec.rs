//! # Call and Deployment Encoding

use crate::errors::AbiError;
use crate::fragments::{resolve_function, validate_constructor_args};
use crate::libraries::link_bytecode;
use crate::values::{decode_params, encode_params, EvmTuple, EvmValue};
use alloy_json_abi::{Function, JsonAbi};
use shared_types::{Address, Artifact};
use std::collections::BTreeMap;

/// Linked bytecode followed by the ABI-encoded constructor arguments.
pub fn encode_deployment_data(
    artifact: &Artifact,
    libraries: &BTreeMap<String, Address>,
    args: &[EvmValue],
) -> Result<Vec<u8>, AbiError> {
    validate_constructor_args(&artifact.abi, &artifact.contract_name, args.len())?;

    let mut data = link_bytecode(artifact, libraries)?;
    if let Some(constructor) = &artifact.abi.constructor {
        data.extend(encode_params(&constructor.inputs, args)?);
    }
    Ok(data)
}

/// Selector followed by the ABI-encoded arguments.
pub fn encode_function_call(
    abi: &JsonAbi,
    contract: &str,
    function_name: &str,
    args: &[EvmValue],
) -> Result<Vec<u8>, AbiError> {
    let function = resolve_function(abi, contract, function_name, args.len())?;
    encode_call(function, args)
}

/// Encodes a call to an already resolved function.
pub fn encode_call(function: &Function, args: &[EvmValue]) -> Result<Vec<u8>, AbiError> {
    let mut data = function.selector().to_vec();
    data.extend(encode_params(&function.inputs, args)?);
    Ok(data)
}

/// Decodes a function's return data into the dual positional/named record.
pub fn decode_function_result(function: &Function, data: &[u8]) -> Result<EvmTuple, AbiError> {
    decode_params(&function.outputs, data)
}
