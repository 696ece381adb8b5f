//! Calls, static calls and encoded calls. All three resolve a function on
//! the target contract's ABI.

use crate::checks::{check_amount, check_arguments, check_sender, is_positive};
use crate::context::ValidationContext;
use crate::errors::{ValidationError, ValidationIssue};
use alloy_json_abi::{JsonAbi, StateMutability};
use ign_01_abi::{resolve_function, resolve_read_only_function, validate_function_output};
use ign_02_module_graph::{ContractCall, EncodeFunctionCall, Future, FutureRef, StaticCall};

/// ABI of the call target and its display name, or the issue explaining why
/// there is none.
async fn target_abi(
    ctx: &ValidationContext<'_>,
    contract: &Future,
) -> Result<Result<(JsonAbi, String), ValidationIssue>, ValidationError> {
    let name = contract.kind.contract_name().unwrap_or(&contract.id).to_string();
    Ok(match ctx.contract_artifact(contract).await? {
        Some(artifact) => Ok((artifact.abi, name)),
        None => Err(ValidationIssue::InvalidArtifact { label: name }),
    })
}

pub(crate) async fn validate_call(
    ctx: &ValidationContext<'_>,
    call: &ContractCall<FutureRef>,
) -> Result<Vec<ValidationIssue>, ValidationError> {
    let (abi, contract) = match target_abi(ctx, &call.contract).await? {
        Ok(found) => found,
        Err(issue) => return Ok(vec![issue]),
    };

    let mut issues = Vec::new();
    let inputs = match resolve_function(&abi, &contract, &call.function_name, call.args.len()) {
        Ok(function) => {
            if function.state_mutability != StateMutability::Payable && is_positive(ctx, &call.value) {
                issues.push(ValidationIssue::NotPayable {
                    contract: contract.clone(),
                    fragment: format!("Function '{}'", function.signature()),
                });
            }
            Some(function.inputs.as_slice())
        }
        Err(e) => {
            issues.push(e.into());
            None
        }
    };

    issues.extend(check_arguments(ctx, &call.args, inputs));
    issues.extend(check_amount(ctx, &call.value));
    issues.extend(check_sender(ctx, call.from.as_ref()));
    Ok(issues)
}

pub(crate) async fn validate_static_call(
    ctx: &ValidationContext<'_>,
    call: &StaticCall<FutureRef>,
) -> Result<Vec<ValidationIssue>, ValidationError> {
    let (abi, contract) = match target_abi(ctx, &call.contract).await? {
        Ok(found) => found,
        Err(issue) => return Ok(vec![issue]),
    };

    let mut issues = Vec::new();
    let inputs = match resolve_read_only_function(&abi, &contract, &call.function_name, call.args.len()) {
        Ok(function) => {
            if let Err(e) = validate_function_output(function, &contract, &call.name_or_index) {
                issues.push(e.into());
            }
            Some(function.inputs.as_slice())
        }
        Err(e) => {
            issues.push(e.into());
            None
        }
    };

    issues.extend(check_arguments(ctx, &call.args, inputs));
    issues.extend(check_sender(ctx, call.from.as_ref()));
    Ok(issues)
}

pub(crate) async fn validate_encode_function_call(
    ctx: &ValidationContext<'_>,
    call: &EncodeFunctionCall<FutureRef>,
) -> Result<Vec<ValidationIssue>, ValidationError> {
    let (abi, contract) = match target_abi(ctx, &call.contract).await? {
        Ok(found) => found,
        Err(issue) => return Ok(vec![issue]),
    };

    let mut issues = Vec::new();
    let inputs = match resolve_function(&abi, &contract, &call.function_name, call.args.len()) {
        Ok(function) => Some(function.inputs.as_slice()),
        Err(e) => {
            issues.push(e.into());
            None
        }
    };
    issues.extend(check_arguments(ctx, &call.args, inputs));
    Ok(issues)
}
