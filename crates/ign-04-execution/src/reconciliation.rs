//! # Reconciliation
//!
//! Before a journal is resumed, every future it recorded must still mean the
//! same thing in the module being deployed. A future whose type, dependencies,
//! strategy or target changed cannot be continued from its journaled state.

use crate::domain::{DeploymentState, ExecutionRequest, ExecutionState};
use crate::errors::ReconciliationFailure;
use ign_02_module_graph::{DependencyGraph, Future, FutureKind};
use tracing::warn;

/// Compares the journaled futures with `graph`.
///
/// Returns every mismatch. Journaled futures the module no longer has are
/// logged and left alone.
pub fn reconcile(state: &DeploymentState, graph: &DependencyGraph, strategy: &str) -> Vec<ReconciliationFailure> {
    let mut failures = Vec::new();

    for (id, execution) in &state.execution_states {
        let Some(future) = graph.future(id) else {
            warn!(future = %id, "journaled future is not part of the module");
            continue;
        };
        let mut fail = |reason: String| {
            failures.push(ReconciliationFailure {
                future_id: id.clone(),
                reason,
            });
        };

        if execution.future_type != future.future_type() {
            fail(format!(
                "future type changed from {} to {}",
                execution.future_type,
                future.future_type()
            ));
            continue;
        }

        if execution.strategy != strategy {
            fail(format!(
                "strategy changed from {} to {strategy}",
                execution.strategy
            ));
        }

        let current = graph.dependencies_of(id).cloned().unwrap_or_default();
        if !current.is_subset(&execution.dependencies) {
            let added: Vec<_> = current.difference(&execution.dependencies).cloned().collect();
            fail(format!("new dependencies {}", added.join(", ")));
        }

        if let Some(reason) = target_change(execution, future) {
            fail(reason);
        }
    }

    failures
}

fn target_change(execution: &ExecutionState, future: &Future) -> Option<String> {
    let journaled_contract = execution.request.contract_name();
    let current_contract = current_contract_name(future);
    if journaled_contract.is_some() && journaled_contract != current_contract.as_deref() {
        return Some(format!(
            "contract changed from {} to {}",
            journaled_contract.unwrap_or_default(),
            current_contract.unwrap_or_default()
        ));
    }

    let current_fragment = match &future.kind {
        FutureKind::Call(c) => Some(c.function_name.as_str()),
        FutureKind::StaticCall(c) => Some(c.function_name.as_str()),
        FutureKind::EncodeFunctionCall(e) => Some(e.function_name.as_str()),
        FutureKind::ReadEventArgument(r) => Some(r.event_name.as_str()),
        _ => None,
    };
    let journaled_fragment = execution.request.fragment_name();
    if journaled_fragment != current_fragment {
        let what = match execution.request {
            ExecutionRequest::ReadEventArgument { .. } => "event",
            _ => "function",
        };
        return Some(format!(
            "{what} changed from {} to {}",
            journaled_fragment.unwrap_or_default(),
            current_fragment.unwrap_or_default()
        ));
    }
    None
}

fn current_contract_name(future: &Future) -> Option<String> {
    let target = match &future.kind {
        FutureKind::Call(c) => &c.contract,
        FutureKind::StaticCall(c) => &c.contract,
        FutureKind::EncodeFunctionCall(e) => &e.contract,
        kind => return kind.contract_name().map(str::to_string),
    };
    Some(target.kind.contract_name().unwrap_or(&target.id).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ExecutionStatus, JournalMessage};
    use ign_01_abi::EvmValue;
    use ign_02_module_graph::{build, build_module, CallOptions, ContractOptions, ModuleResults};
    use num_bigint::BigInt;
    use shared_types::Address;
    use std::collections::{BTreeMap, BTreeSet};

    const SENDER: Address = Address::new([0xaa; 20]);

    fn graph(contract: &'static str, function: &'static str) -> DependencyGraph {
        let module = build(&build_module("Recon", move |m| {
            let token = m.contract(contract, vec![], ContractOptions::default())?;
            m.call(&token, function, vec![], CallOptions::default())?;
            Ok(ModuleResults::from([("token".to_string(), token)]))
        }))
        .unwrap();
        DependencyGraph::new(&module)
    }

    fn journaled(contract: &str, function: &str, dependencies: &[&str]) -> DeploymentState {
        let deployment = JournalMessage::ExecutionStateInitialize {
            future_id: format!("Recon#{contract}"),
            future_type: ign_02_module_graph::FutureType::ContractDeployment,
            strategy: "basic".into(),
            dependencies: BTreeSet::new(),
            from: Some(SENDER),
            request: ExecutionRequest::Deployment {
                contract_name: contract.into(),
                constructor_args: vec![],
                libraries: BTreeMap::new(),
                value: BigInt::from(0),
            },
        };
        let call = JournalMessage::ExecutionStateInitialize {
            future_id: format!("Recon#{contract}.{function}"),
            future_type: ign_02_module_graph::FutureType::ContractCall,
            strategy: "basic".into(),
            dependencies: dependencies.iter().map(|d| d.to_string()).collect(),
            from: Some(SENDER),
            request: ExecutionRequest::Call {
                contract_name: contract.into(),
                contract_address: Address::new([0x70; 20]),
                function_name: function.into(),
                args: vec![EvmValue::from(1i64)],
                value: BigInt::from(0),
            },
        };
        DeploymentState::from_messages(&[deployment, call]).unwrap()
    }

    #[test]
    fn test_unchanged_module_reconciles() {
        let state = journaled("Token", "pause", &["Recon#Token"]);
        assert!(state.get("Recon#Token").is_some_and(|s| s.status == ExecutionStatus::Started));
        assert!(reconcile(&state, &graph("Token", "pause"), "basic").is_empty());
    }

    #[test]
    fn test_changed_function_is_reported() {
        let state = journaled("Token", "pause", &["Recon#Token"]);
        let mut module = graph("Token", "unpause");
        // The call id follows the function name, so the renamed call is a
        // new future and the journaled one is simply gone.
        assert!(reconcile(&state, &module, "basic").is_empty());

        module = graph("Token", "pause");
        let mut renamed = state.clone();
        if let Some(execution) = renamed.execution_states.get_mut("Recon#Token.pause") {
            if let ExecutionRequest::Call { function_name, .. } = &mut execution.request {
                *function_name = "pause(uint256)".into();
            }
        }
        let failures = reconcile(&renamed, &module, "basic");
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].reason, "function changed from pause(uint256) to pause");
    }

    #[test]
    fn test_new_dependency_and_strategy_are_reported() {
        let state = journaled("Token", "pause", &[]);
        let failures = reconcile(&state, &graph("Token", "pause"), "custom");
        let reasons: Vec<_> = failures.iter().map(|f| f.reason.as_str()).collect();
        assert!(reasons.contains(&"strategy changed from basic to custom"));
        assert!(reasons.contains(&"new dependencies Recon#Token"));
    }
}
