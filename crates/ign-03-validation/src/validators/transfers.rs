//! Existing contracts, raw sends and event reads.

use crate::checks::{check_address, check_amount, check_sender};
use crate::context::ValidationContext;
use crate::errors::{ValidationError, ValidationIssue};
use ign_01_abi::{resolve_event, validate_event_argument};
use ign_02_module_graph::{ContractAt, DataArgument, Future, FutureRef, ReadEventArgument, SendData};
use shared_types::is_hex;

pub(crate) async fn validate_contract_at(
    ctx: &ValidationContext<'_>,
    future: &Future,
    contract_at: &ContractAt<FutureRef>,
) -> Result<Vec<ValidationIssue>, ValidationError> {
    if ctx.contract_artifact(future).await?.is_none() {
        return Ok(vec![ValidationIssue::InvalidArtifact {
            label: contract_at.contract_name.clone(),
        }]);
    }
    Ok(check_address(ctx, &contract_at.address))
}

pub(crate) fn validate_send_data(ctx: &ValidationContext<'_>, send: &SendData<FutureRef>) -> Vec<ValidationIssue> {
    let mut issues = check_address(ctx, &send.to);
    issues.extend(check_amount(ctx, &send.value));
    if let Some(DataArgument::Hex(data)) = &send.data {
        if !is_hex(data) {
            issues.push(ValidationIssue::InvalidData { data: data.clone() });
        }
    }
    issues.extend(check_sender(ctx, send.from.as_ref()));
    issues
}

pub(crate) async fn validate_read_event_argument(
    ctx: &ValidationContext<'_>,
    read: &ReadEventArgument<FutureRef>,
) -> Result<Vec<ValidationIssue>, ValidationError> {
    let emitter = read.emitter.kind.contract_name().unwrap_or(&read.emitter.id).to_string();
    let Some(artifact) = ctx.contract_artifact(&read.emitter).await? else {
        return Ok(vec![ValidationIssue::InvalidArtifact { label: emitter }]);
    };

    let checked = resolve_event(&artifact.abi, &emitter, &read.event_name)
        .and_then(|event| validate_event_argument(event, &emitter, &read.name_or_index));
    Ok(checked.err().map(ValidationIssue::from).into_iter().collect())
}
