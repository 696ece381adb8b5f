//! Contract and library deployments.

use crate::checks::{check_amount, check_arguments, check_libraries, check_sender, is_positive};
use crate::context::ValidationContext;
use crate::errors::{ValidationError, ValidationIssue};
use alloy_json_abi::StateMutability;
use ign_01_abi::{resolve_library_names, validate_constructor_args};
use ign_02_module_graph::{ContractDeployment, Future, FutureRef, LibraryDeployment};

pub(crate) async fn validate_contract_deployment(
    ctx: &ValidationContext<'_>,
    future: &Future,
    deployment: &ContractDeployment<FutureRef>,
) -> Result<Vec<ValidationIssue>, ValidationError> {
    let Some(artifact) = ctx.contract_artifact(future).await? else {
        return Ok(vec![ValidationIssue::InvalidArtifact {
            label: deployment.contract_name.clone(),
        }]);
    };

    let mut issues = Vec::new();
    if let Err(e) = validate_constructor_args(
        &artifact.abi,
        &deployment.contract_name,
        deployment.constructor_args.len(),
    ) {
        issues.push(e.into());
    }

    issues.extend(check_libraries(&deployment.libraries));
    if let Err(e) = resolve_library_names(&artifact, deployment.libraries.keys().map(String::as_str)) {
        issues.push(e.into());
    }

    let payable = artifact
        .abi
        .constructor
        .as_ref()
        .is_some_and(|c| c.state_mutability == StateMutability::Payable);
    if !payable && is_positive(ctx, &deployment.value) {
        issues.push(ValidationIssue::NotPayable {
            contract: deployment.contract_name.clone(),
            fragment: "The constructor".to_string(),
        });
    }

    let inputs = artifact.abi.constructor.as_ref().map(|c| c.inputs.as_slice());
    issues.extend(check_arguments(ctx, &deployment.constructor_args, inputs));
    issues.extend(check_amount(ctx, &deployment.value));
    issues.extend(check_sender(ctx, deployment.from.as_ref()));
    Ok(issues)
}

pub(crate) async fn validate_library_deployment(
    ctx: &ValidationContext<'_>,
    future: &Future,
    deployment: &LibraryDeployment<FutureRef>,
) -> Result<Vec<ValidationIssue>, ValidationError> {
    let Some(artifact) = ctx.contract_artifact(future).await? else {
        return Ok(vec![ValidationIssue::InvalidArtifact {
            label: deployment.contract_name.clone(),
        }]);
    };

    let mut issues = check_libraries(&deployment.libraries);
    if let Err(e) = resolve_library_names(&artifact, deployment.libraries.keys().map(String::as_str)) {
        issues.push(e.into());
    }
    issues.extend(check_sender(ctx, deployment.from.as_ref()));
    Ok(issues)
}
