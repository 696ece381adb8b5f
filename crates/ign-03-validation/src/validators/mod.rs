//! Per-kind validators and the dispatcher over them.

mod calls;
mod deployment;
mod transfers;

use crate::context::ValidationContext;
use crate::errors::{ValidationError, ValidationIssue};
use ign_02_module_graph::{Future, FutureKind};

/// Validates one future. Issues are returned; only fatal problems are `Err`.
pub async fn validate_future(
    ctx: &ValidationContext<'_>,
    future: &Future,
) -> Result<Vec<ValidationIssue>, ValidationError> {
    match &future.kind {
        FutureKind::ContractDeployment(d) => deployment::validate_contract_deployment(ctx, future, d).await,
        FutureKind::LibraryDeployment(d) => deployment::validate_library_deployment(ctx, future, d).await,
        FutureKind::ContractAt(c) => transfers::validate_contract_at(ctx, future, c).await,
        FutureKind::Call(c) => calls::validate_call(ctx, c).await,
        FutureKind::StaticCall(c) => calls::validate_static_call(ctx, c).await,
        FutureKind::EncodeFunctionCall(e) => calls::validate_encode_function_call(ctx, e).await,
        FutureKind::SendData(s) => Ok(transfers::validate_send_data(ctx, s)),
        FutureKind::ReadEventArgument(r) => transfers::validate_read_event_argument(ctx, r).await,
    }
}
