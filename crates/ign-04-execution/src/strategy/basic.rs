//! Basic strategy: one interaction per future, no retries.
//!
//! Custom errors and other revert data are decoded when the transaction is
//! simulated before sending. A transaction that reverts once mined only
//! becomes `Revert { transaction_hash }`.

use super::{ExecutionStrategy, InteractionRequest, StrategyStep};
use crate::domain::{
    ExecutionRequest, ExecutionResult, ExecutionState, NetworkInteraction, OnchainInteraction, ReceiptStatus,
    StaticCallInteraction, SuccessValue,
};
use async_trait::async_trait;
use ign_01_abi::{decode_call_result, encode_deployment_data, encode_function_call, resolve_function};
use num_bigint::BigInt;
use shared_types::Artifact;
use tracing::debug;

/// Name journaled for futures driven by [`BasicStrategy`].
pub const BASIC_STRATEGY_NAME: &str = "basic";

/// Sends exactly one transaction or static call per future and derives the
/// result from its receipt or return data.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicStrategy;

impl BasicStrategy {
    fn first_request(state: &ExecutionState, artifact: Option<&Artifact>) -> StrategyStep {
        let encoded = match &state.request {
            ExecutionRequest::Deployment {
                constructor_args,
                libraries,
                value,
                ..
            } => {
                let Some(artifact) = artifact else {
                    return missing_artifact(state);
                };
                encode_deployment_data(artifact, libraries, constructor_args).map(|data| InteractionRequest::Onchain {
                    to: None,
                    data,
                    value: value.clone(),
                })
            }

            ExecutionRequest::Call {
                contract_name,
                contract_address,
                function_name,
                args,
                value,
            } => {
                let Some(artifact) = artifact else {
                    return missing_artifact(state);
                };
                encode_function_call(&artifact.abi, contract_name, function_name, args).map(|data| {
                    InteractionRequest::Onchain {
                        to: Some(*contract_address),
                        data,
                        value: value.clone(),
                    }
                })
            }

            ExecutionRequest::StaticCall {
                contract_name,
                contract_address,
                function_name,
                args,
                ..
            } => {
                let Some(artifact) = artifact else {
                    return missing_artifact(state);
                };
                encode_function_call(&artifact.abi, contract_name, function_name, args).map(|data| {
                    InteractionRequest::StaticCall {
                        to: *contract_address,
                        data,
                        value: BigInt::default(),
                    }
                })
            }

            ExecutionRequest::SendData { to, data, value } => Ok(InteractionRequest::Onchain {
                to: Some(*to),
                data: data.clone(),
                value: value.clone(),
            }),

            ExecutionRequest::ContractAt { .. }
            | ExecutionRequest::EncodeFunctionCall { .. }
            | ExecutionRequest::ReadEventArgument { .. } => {
                return StrategyStep::Complete(ExecutionResult::strategy_error(format!(
                    "{} futures do not send network interactions",
                    state.future_type
                )))
            }
        };

        match encoded {
            Ok(request) => StrategyStep::Request(request),
            Err(e) => StrategyStep::Complete(ExecutionResult::strategy_error(e.to_string())),
        }
    }

    fn onchain_result(state: &ExecutionState, interaction: &OnchainInteraction) -> ExecutionResult {
        let Some(receipt) = &interaction.receipt else {
            return ExecutionResult::strategy_error("the interaction has no receipt");
        };
        if receipt.status == ReceiptStatus::Failure {
            return ExecutionResult::Revert {
                transaction_hash: receipt.transaction_hash,
            };
        }

        match &state.request {
            ExecutionRequest::Deployment { contract_name, .. } => match receipt.contract_address {
                Some(address) => ExecutionResult::success(SuccessValue::Deployment { address }),
                None => ExecutionResult::strategy_error(format!(
                    "the deployment of {contract_name} was confirmed without a contract address"
                )),
            },
            ExecutionRequest::Call { .. } => ExecutionResult::success(SuccessValue::Call),
            ExecutionRequest::SendData { .. } => ExecutionResult::success(SuccessValue::SendData),
            _ => ExecutionResult::strategy_error(format!(
                "{} futures do not send transactions",
                state.future_type
            )),
        }
    }

    fn static_call_result(
        state: &ExecutionState,
        interaction: &StaticCallInteraction,
        artifact: Option<&Artifact>,
    ) -> ExecutionResult {
        let ExecutionRequest::StaticCall {
            contract_name,
            function_name,
            args,
            name_or_index,
            ..
        } = &state.request
        else {
            return ExecutionResult::strategy_error(format!(
                "{} futures do not perform static calls",
                state.future_type
            ));
        };
        let (Some(artifact), Some(raw)) = (artifact, &interaction.result) else {
            return ExecutionResult::strategy_error("the static call has no artifact or result");
        };

        let function = match resolve_function(&artifact.abi, contract_name, function_name, args.len()) {
            Ok(function) => function,
            Err(e) => return ExecutionResult::strategy_error(e.to_string()),
        };

        match decode_call_result(function, &artifact.abi, raw) {
            Err(error) => ExecutionResult::StaticCallError { error },
            Ok(values) => match values.get(name_or_index) {
                Some(value) => ExecutionResult::success(SuccessValue::StaticCall { value: value.clone() }),
                None => ExecutionResult::strategy_error(format!(
                    "function '{function_name}' of contract '{contract_name}' returned no value {name_or_index}"
                )),
            },
        }
    }
}

fn missing_artifact(state: &ExecutionState) -> StrategyStep {
    StrategyStep::Complete(ExecutionResult::strategy_error(format!(
        "no artifact is available for {}",
        state.request.contract_name().unwrap_or(&state.id)
    )))
}

#[async_trait]
impl ExecutionStrategy for BasicStrategy {
    fn name(&self) -> &str {
        BASIC_STRATEGY_NAME
    }

    async fn next_step(&self, state: &ExecutionState, artifact: Option<&Artifact>) -> StrategyStep {
        let step = match state.network_interactions.last() {
            None => Self::first_request(state, artifact),
            Some(interaction) if !interaction.is_complete() => StrategyStep::Complete(
                ExecutionResult::strategy_error("the last interaction is still pending"),
            ),
            Some(NetworkInteraction::OnchainInteraction(interaction)) => {
                StrategyStep::Complete(Self::onchain_result(state, interaction))
            }
            Some(NetworkInteraction::StaticCall(interaction)) => {
                StrategyStep::Complete(Self::static_call_result(state, interaction, artifact))
            }
        };
        debug!(future = %state.id, ?step, "strategy step");
        step
    }
}
