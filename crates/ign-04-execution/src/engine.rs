//! # Execution Engine
//!
//! Runs a built module against a chain:
//!
//! 1. Replays the journal and checks it belongs to this chain and module
//! 2. Resumes timed out and held futures
//! 3. Starts futures in topological order once their dependencies succeeded
//! 4. Drives started futures through the [`FutureProcessor`] until none can
//!    make progress
//!
//! Failures of individual futures are part of the [`DeploymentResult`];
//! only infrastructure, journal and consistency problems abort a run.

use crate::config::ExecutionConfig;
use crate::domain::{
    DeploymentState, ExecutionRequest, ExecutionResult, ExecutionState, ExecutionStatus, JournalMessage, SuccessValue,
};
use crate::errors::{ExecutionError, Result, StateError};
use crate::ports::{ChainClient, Journal};
use crate::processor::{FutureProcessor, Progress};
use crate::reconciliation::reconcile;
use crate::resolve::{build_request, Resolver};
use crate::strategy::{BasicStrategy, ExecutionStrategy};
use ign_01_abi::{encode_function_call, extract_event_argument, resolve_event};
use ign_02_module_graph::{
    module_parameter_bindings, DependencyGraph, Future, FutureKind, IgnitionModule, ParameterResolver,
};
use shared_types::{Address, Artifact, ArtifactResolver, DeploymentParameters, NameOrIndex};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

// =============================================================================
// RESULTS
// =============================================================================

/// How a future ended in a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FutureOutcome {
    /// Succeeded with this payload.
    Success(SuccessValue),
    /// Failed with this result.
    Failed(ExecutionResult),
    /// Ran out of fee bumps; resumed by the next run.
    Timeout,
    /// Paused by the strategy; resumed by the next run.
    Held {
        /// Reason given by the strategy.
        reason: String,
    },
    /// Not started because dependencies failed.
    Skipped {
        /// The failed or skipped dependencies.
        failed_dependencies: Vec<String>,
    },
    /// Not started in this run.
    NotStarted,
}

/// Overall status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentStatus {
    /// Every future succeeded.
    Success,
    /// Some futures failed, timed out, were held or skipped.
    ExecutionErrors,
    /// The run was halted before every future started.
    Halted,
}

/// Result of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentResult {
    /// Correlation id of the run.
    pub run_id: Uuid,
    /// Overall status.
    pub status: DeploymentStatus,
    /// Outcome of every future of the module.
    pub futures: BTreeMap<String, FutureOutcome>,
}

impl DeploymentResult {
    /// Addresses of the deployed and referenced contracts by future id.
    #[must_use]
    pub fn contracts(&self) -> BTreeMap<String, Address> {
        self.futures
            .iter()
            .filter_map(|(id, outcome)| match outcome {
                FutureOutcome::Success(value) => value.address().map(|a| (id.clone(), a)),
                _ => None,
            })
            .collect()
    }

    /// True when every future succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == DeploymentStatus::Success
    }
}

fn outcome_of(state: &ExecutionState) -> Option<FutureOutcome> {
    match (state.status, &state.result) {
        (ExecutionStatus::Success, Some(ExecutionResult::Success { value })) => {
            Some(FutureOutcome::Success(value.clone()))
        }
        (ExecutionStatus::Failed, Some(result)) => Some(FutureOutcome::Failed(result.clone())),
        (ExecutionStatus::Timeout, _) => Some(FutureOutcome::Timeout),
        (ExecutionStatus::Held, _) => Some(FutureOutcome::Held {
            reason: state.hold_reason.clone().unwrap_or_default(),
        }),
        _ => None,
    }
}

// =============================================================================
// HALT HANDLE
// =============================================================================

/// Stops a running deployment from starting new futures.
#[derive(Debug, Clone, Default)]
pub struct HaltHandle(Arc<AtomicBool>);

impl HaltHandle {
    /// Requests the halt. Started futures still run to completion.
    pub fn halt(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// True once a halt was requested.
    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// =============================================================================
// ENGINE
// =============================================================================

/// Executes modules.
pub struct ExecutionEngine {
    chain: Arc<dyn ChainClient>,
    journal: Arc<dyn Journal>,
    artifacts: Arc<dyn ArtifactResolver>,
    strategy: Arc<dyn ExecutionStrategy>,
    config: ExecutionConfig,
    halt: HaltHandle,
}

/// Mutable bookkeeping of one run.
struct Run<'a> {
    graph: DependencyGraph,
    parameters: ParameterResolver<'a>,
    accounts: &'a [Address],
    processor: FutureProcessor,
    pending: Vec<String>,
    running: Vec<String>,
    loaded: HashMap<String, Option<Artifact>>,
    outcomes: BTreeMap<String, FutureOutcome>,
}

impl ExecutionEngine {
    /// Engine using the basic strategy.
    pub fn new(
        chain: Arc<dyn ChainClient>,
        journal: Arc<dyn Journal>,
        artifacts: Arc<dyn ArtifactResolver>,
        config: ExecutionConfig,
    ) -> Self {
        Self {
            chain,
            journal,
            artifacts,
            strategy: Arc::new(BasicStrategy),
            config,
            halt: HaltHandle::default(),
        }
    }

    /// Replaces the execution strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: Arc<dyn ExecutionStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    /// Handle to halt runs of this engine.
    #[must_use]
    pub fn halt_handle(&self) -> HaltHandle {
        self.halt.clone()
    }

    /// Deploys `module`, continuing whatever the journal already recorded.
    pub async fn execute(
        &self,
        module: &IgnitionModule,
        parameters: &DeploymentParameters,
        accounts: &[Address],
    ) -> Result<DeploymentResult> {
        self.run(Uuid::new_v4(), module, parameters, accounts).await
    }

    #[instrument(skip_all, fields(module = %module.id, run_id = %run_id))]
    async fn run(
        &self,
        run_id: Uuid,
        module: &IgnitionModule,
        parameters: &DeploymentParameters,
        accounts: &[Address],
    ) -> Result<DeploymentResult> {
        self.config.validate()?;
        if accounts.is_empty() {
            return Err(ExecutionError::NoAccounts);
        }

        let messages = self.journal.read().await?;
        let state = DeploymentState::from_messages(&messages)?;
        info!(journaled_messages = messages.len(), "starting deployment run");

        let mut processor = FutureProcessor::new(
            self.chain.clone(),
            self.journal.clone(),
            self.strategy.clone(),
            self.config.clone(),
            state,
        );

        let chain_id = processor.retry("run", "eth_chainId", || self.chain.chain_id()).await?;
        if let Some(journal) = processor.state().chain_id {
            if journal != chain_id {
                return Err(ExecutionError::ChainMismatch { journal, chain: chain_id });
            }
        }

        let graph = DependencyGraph::new(module);
        let failures = reconcile(processor.state(), &graph, self.strategy.name());
        if !failures.is_empty() {
            return Err(ExecutionError::Reconciliation(failures));
        }

        processor.record(JournalMessage::RunStart { run_id, chain_id }).await?;

        let paused: Vec<String> = processor
            .state()
            .execution_states
            .values()
            .filter(|s| matches!(s.status, ExecutionStatus::Timeout | ExecutionStatus::Held))
            .filter(|s| graph.future(&s.id).is_some())
            .map(|s| s.id.clone())
            .collect();
        for future_id in paused {
            info!(future = %future_id, "resuming future");
            processor.record(JournalMessage::ExecutionStateResume { future_id }).await?;
        }

        let pending = graph.topological_order();
        let mut run = Run {
            parameters: ParameterResolver::new(parameters, module_parameter_bindings(module)),
            graph,
            accounts,
            processor,
            pending,
            running: Vec::new(),
            loaded: HashMap::new(),
            outcomes: BTreeMap::new(),
        };

        loop {
            let scheduled = self.schedule(&mut run).await?;
            if run.running.is_empty() {
                if scheduled {
                    continue;
                }
                break;
            }
            if !self.drive(&mut run).await? {
                tokio::time::sleep(self.config.block_polling_interval).await;
            }
        }

        for id in run.pending.drain(..) {
            run.outcomes.insert(id, FutureOutcome::NotStarted);
        }

        let halted = self.halt.is_halted() && run.outcomes.values().any(|o| *o == FutureOutcome::NotStarted);
        let status = if halted {
            DeploymentStatus::Halted
        } else if run.outcomes.values().all(|o| matches!(o, FutureOutcome::Success(_))) {
            DeploymentStatus::Success
        } else {
            DeploymentStatus::ExecutionErrors
        };
        info!(?status, futures = run.outcomes.len(), "deployment run finished");

        Ok(DeploymentResult {
            run_id,
            status,
            futures: run.outcomes,
        })
    }

    /// Settles or starts pending futures. Returns true if any changed.
    async fn schedule(&self, run: &mut Run<'_>) -> Result<bool> {
        let mut changed = false;
        let candidates = std::mem::take(&mut run.pending);

        for id in candidates {
            if let Some(state) = run.processor.state().get(&id) {
                match outcome_of(state) {
                    Some(outcome) => {
                        run.outcomes.insert(id, outcome);
                    }
                    None => {
                        let artifact = self.load_artifact(&run.graph, &id).await?;
                        run.loaded.insert(id.clone(), artifact);
                        run.running.push(id);
                    }
                }
                changed = true;
                continue;
            }

            let dependencies = run.graph.dependencies_of(&id).cloned().unwrap_or_default();
            let failed: Vec<String> = dependencies
                .iter()
                .filter(|d| {
                    matches!(
                        run.outcomes.get(*d),
                        Some(FutureOutcome::Failed(_) | FutureOutcome::Skipped { .. })
                    )
                })
                .cloned()
                .collect();
            if !failed.is_empty() {
                warn!(future = %id, dependencies = ?failed, "skipping future after failed dependencies");
                run.outcomes.insert(
                    id,
                    FutureOutcome::Skipped {
                        failed_dependencies: failed,
                    },
                );
                changed = true;
                continue;
            }

            let ready = dependencies
                .iter()
                .all(|d| matches!(run.outcomes.get(d), Some(FutureOutcome::Success(_))));
            if !ready || self.halt.is_halted() || run.running.len() >= self.config.max_concurrent_futures {
                run.pending.push(id);
                continue;
            }

            self.start(run, &id).await?;
            changed = true;
        }

        Ok(changed)
    }

    /// Initializes `id` and completes it at once if it needs no network.
    async fn start(&self, run: &mut Run<'_>, id: &str) -> Result<()> {
        let artifact = self.load_artifact(&run.graph, id).await?;
        let future = run
            .graph
            .future(id)
            .cloned()
            .ok_or_else(|| StateError::UnknownFuture(id.to_string()))?;

        let (request, from) = {
            let resolver = Resolver::new(id, run.processor.state(), run.accounts, &run.parameters);
            build_request(&future, &resolver)?
        };
        debug!(future = %id, kind = %future.future_type(), "starting future");

        run.processor
            .record(JournalMessage::ExecutionStateInitialize {
                future_id: id.to_string(),
                future_type: future.future_type(),
                strategy: self.strategy.name().to_string(),
                dependencies: run.graph.dependencies_of(id).cloned().unwrap_or_default(),
                from,
                request: request.clone(),
            })
            .await?;

        match immediate_result(run.processor.state(), &request, artifact.as_ref()) {
            Some(result) => {
                if !result.is_success() {
                    warn!(future = %id, %result, "future failed");
                }
                run.processor
                    .record(JournalMessage::ExecutionStateComplete {
                        future_id: id.to_string(),
                        result,
                    })
                    .await?;
                if let Some(outcome) = run.processor.state().get(id).and_then(outcome_of) {
                    run.outcomes.insert(id.to_string(), outcome);
                }
            }
            None => {
                run.loaded.insert(id.to_string(), artifact);
                run.running.push(id.to_string());
            }
        }
        Ok(())
    }

    /// Processes every running future once. Returns true if any advanced.
    async fn drive(&self, run: &mut Run<'_>) -> Result<bool> {
        let mut advanced = false;
        for id in run.running.clone() {
            let artifact = run.loaded.get(&id).and_then(Option::as_ref);
            if run.processor.process(&id, artifact).await? == Progress::Advanced {
                advanced = true;
            }
            if let Some(outcome) = run.processor.state().get(&id).and_then(outcome_of) {
                run.running.retain(|r| *r != id);
                run.loaded.remove(&id);
                run.outcomes.insert(id, outcome);
            }
        }
        Ok(advanced)
    }

    /// Artifact the strategy needs for `id`: the deployed contract's own, or
    /// that of the called contract or the event emitter.
    async fn load_artifact(&self, graph: &DependencyGraph, id: &str) -> Result<Option<Artifact>> {
        let Some(future) = graph.future(id) else {
            return Ok(None);
        };
        let target = match &future.kind {
            FutureKind::ContractDeployment(_) | FutureKind::LibraryDeployment(_) => future,
            FutureKind::Call(c) => &c.contract,
            FutureKind::StaticCall(c) => &c.contract,
            FutureKind::EncodeFunctionCall(e) => &e.contract,
            FutureKind::ReadEventArgument(r) => &r.emitter,
            FutureKind::ContractAt(_) | FutureKind::SendData(_) => return Ok(None),
        };
        self.contract_artifact(target).await.map(Some)
    }

    async fn contract_artifact(&self, future: &Future) -> Result<Artifact> {
        if let Some(artifact) = future.kind.artifact() {
            return Ok(artifact.clone());
        }
        let name = future.kind.contract_name().unwrap_or(&future.id);
        Ok(self.artifacts.get_artifact(name).await?)
    }
}

/// Result of the requests that complete without network interactions.
fn immediate_result(
    state: &DeploymentState,
    request: &ExecutionRequest,
    artifact: Option<&Artifact>,
) -> Option<ExecutionResult> {
    let missing = |name: &str| ExecutionResult::strategy_error(format!("no artifact is available for {name}"));
    match request {
        ExecutionRequest::ContractAt { address, .. } => {
            Some(ExecutionResult::success(SuccessValue::ContractAt { address: *address }))
        }
        ExecutionRequest::EncodeFunctionCall {
            contract_name,
            function_name,
            args,
        } => Some(match artifact {
            Some(artifact) => match encode_function_call(&artifact.abi, contract_name, function_name, args) {
                Ok(data) => ExecutionResult::success(SuccessValue::EncodeFunctionCall { data }),
                Err(error) => ExecutionResult::strategy_error(error.to_string()),
            },
            None => missing(contract_name),
        }),
        ExecutionRequest::ReadEventArgument {
            future_to_read_from,
            emitter,
            event_name,
            name_or_index,
            event_index,
        } => Some(match artifact {
            Some(artifact) => {
                read_event(state, artifact, future_to_read_from, *emitter, event_name, name_or_index, *event_index)
            }
            None => missing(future_to_read_from),
        }),
        _ => None,
    }
}

fn read_event(
    state: &DeploymentState,
    artifact: &Artifact,
    source: &str,
    emitter: Address,
    event_name: &str,
    name_or_index: &NameOrIndex,
    event_index: usize,
) -> ExecutionResult {
    let Some(receipt) = state.get(source).and_then(ExecutionState::last_receipt) else {
        return ExecutionResult::strategy_error(format!("{source} has no confirmed transaction to read events from"));
    };
    let value = resolve_event(&artifact.abi, &artifact.contract_name, event_name)
        .and_then(|event| extract_event_argument(event, emitter, event_index, name_or_index, &receipt.logs));
    match value {
        Ok(value) => ExecutionResult::success(SuccessValue::ReadEventArgument { value }),
        Err(error) => ExecutionResult::strategy_error(error.to_string()),
    }
}
