//! # Future Processor
//!
//! Advances one started future by at most one step per call: performs the
//! pending interaction, checks on sent transactions or asks the strategy
//! what to do next. Every change goes through the journal first.

use crate::config::ExecutionConfig;
use crate::domain::{
    bump_fees, DeploymentState, ExecutionResult, ExecutionState, ExecutionStatus, JournalMessage, NetworkFees,
    NetworkInteraction, OnchainInteraction, SentTransaction, StaticCallInteraction,
};
use crate::errors::{ChainError, ExecutionError, Result, StateError};
use crate::nonce::NonceManager;
use crate::ports::{BlockTag, CallRequest, ChainClient, Journal, TransactionRequest};
use crate::strategy::{ExecutionStrategy, InteractionRequest, StrategyStep};
use shared_types::{Address, Artifact};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// What one processing step achieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// Something was journaled.
    Advanced,
    /// Waiting on the chain.
    Waiting,
    /// The future is not started, so there is nothing to do.
    Idle,
}

/// Per-run bookkeeping of a pending onchain interaction.
#[derive(Debug, Clone, Copy)]
struct Tracker {
    last_sent: Instant,
    bumps: u32,
}

/// Drives started futures and owns the deployment state of a run.
pub struct FutureProcessor {
    chain: Arc<dyn ChainClient>,
    journal: Arc<dyn Journal>,
    strategy: Arc<dyn ExecutionStrategy>,
    config: ExecutionConfig,
    state: DeploymentState,
    nonces: NonceManager,
    trackers: HashMap<(String, u32), Tracker>,
}

impl FutureProcessor {
    /// Processor continuing from `state`.
    pub fn new(
        chain: Arc<dyn ChainClient>,
        journal: Arc<dyn Journal>,
        strategy: Arc<dyn ExecutionStrategy>,
        config: ExecutionConfig,
        state: DeploymentState,
    ) -> Self {
        let nonces = NonceManager::from_state(&state);
        Self {
            chain,
            journal,
            strategy,
            config,
            state,
            nonces,
            trackers: HashMap::new(),
        }
    }

    /// Current deployment state.
    #[must_use]
    pub fn state(&self) -> &DeploymentState {
        &self.state
    }

    /// Journals `message`, then applies it.
    pub async fn record(&mut self, message: JournalMessage) -> Result<()> {
        // Validate against a copy first so a message that does not apply is
        // never written.
        let mut next = self.state.clone();
        next.apply(&message)?;
        self.journal.record(&message).await?;
        self.state = next;
        Ok(())
    }

    /// Calls the chain, retrying retryable failures.
    pub(crate) async fn retry<T, F, Fut>(&self, future_id: &str, operation: &'static str, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, ChainError>>,
    {
        let mut attempt = 0;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(error) if error.is_retryable() && attempt < self.config.max_infrastructure_retries => {
                    attempt += 1;
                    warn!(future = future_id, operation, attempt, %error, "retrying chain request");
                    tokio::time::sleep(self.config.block_polling_interval).await;
                }
                Err(source) => {
                    return Err(ExecutionError::Infrastructure {
                        future_id: future_id.to_string(),
                        operation,
                        source,
                    })
                }
            }
        }
    }

    /// Advances `future_id` by one step.
    pub async fn process(&mut self, future_id: &str, artifact: Option<&Artifact>) -> Result<Progress> {
        let state = self
            .state
            .get(future_id)
            .cloned()
            .ok_or_else(|| StateError::UnknownFuture(future_id.to_string()))?;
        if state.status != ExecutionStatus::Started {
            return Ok(Progress::Idle);
        }

        match state.pending_interaction() {
            Some(NetworkInteraction::OnchainInteraction(interaction)) => {
                self.drive_onchain(&state, interaction, artifact).await
            }
            Some(NetworkInteraction::StaticCall(call)) => self.perform_static_call(&state, call).await,
            None => self.ask_strategy(&state, artifact).await,
        }
    }

    async fn ask_strategy(&mut self, state: &ExecutionState, artifact: Option<&Artifact>) -> Result<Progress> {
        let message = match self.strategy.next_step(state, artifact).await {
            StrategyStep::Request(request) => {
                let from = state.from.ok_or_else(|| ExecutionError::Resolution {
                    future_id: state.id.clone(),
                    what: "the sender".to_string(),
                    reason: "no sender was recorded".to_string(),
                })?;
                JournalMessage::NetworkInteractionRequest {
                    future_id: state.id.clone(),
                    interaction: new_interaction(state.next_interaction_id(), from, request),
                }
            }
            StrategyStep::Complete(result) => {
                log_result(&state.id, &result);
                JournalMessage::ExecutionStateComplete {
                    future_id: state.id.clone(),
                    result,
                }
            }
            StrategyStep::Hold { reason } => {
                info!(future = %state.id, %reason, "future held");
                JournalMessage::ExecutionStateHold {
                    future_id: state.id.clone(),
                    reason,
                }
            }
        };
        self.record(message).await?;
        Ok(Progress::Advanced)
    }

    async fn perform_static_call(&mut self, state: &ExecutionState, call: &StaticCallInteraction) -> Result<Progress> {
        let request = CallRequest {
            from: call.from,
            to: call.to,
            data: call.data.clone(),
            value: call.value.clone(),
        };
        let result = self
            .retry(&state.id, "eth_call", || self.chain.call(&request))
            .await?;
        self.record(JournalMessage::StaticCallComplete {
            future_id: state.id.clone(),
            interaction_id: call.id,
            result,
        })
        .await?;
        Ok(Progress::Advanced)
    }

    async fn drive_onchain(
        &mut self,
        state: &ExecutionState,
        interaction: &OnchainInteraction,
        artifact: Option<&Artifact>,
    ) -> Result<Progress> {
        if interaction.transactions.is_empty() {
            let simulation = CallRequest {
                from: interaction.from,
                to: interaction.to,
                data: interaction.data.clone(),
                value: interaction.value.clone(),
            };
            let raw = self
                .retry(&state.id, "eth_call", || self.chain.call(&simulation))
                .await?;
            if let Some(result) = self.strategy.simulation_outcome(state, artifact, &raw) {
                log_result(&state.id, &result);
                self.record(JournalMessage::ExecutionStateComplete {
                    future_id: state.id.clone(),
                    result,
                })
                .await?;
                return Ok(Progress::Advanced);
            }
            return self.send(state, interaction, None).await;
        }

        if interaction.should_be_resent {
            info!(future = %state.id, interaction = interaction.id, "resending dropped transaction");
            let previous = interaction.transactions.last().map(|tx| tx.fees);
            return self.send(state, interaction, previous).await;
        }

        self.check_transactions(state, interaction).await
    }

    async fn send(
        &mut self,
        state: &ExecutionState,
        interaction: &OnchainInteraction,
        previous_fees: Option<NetworkFees>,
    ) -> Result<Progress> {
        let from = interaction.from;
        let nonce = match interaction.nonce {
            Some(nonce) => nonce,
            None => {
                let pending = self
                    .retry(&state.id, "eth_getTransactionCount", || {
                        self.chain.transaction_count(from, BlockTag::Pending)
                    })
                    .await?;
                self.nonces.next_nonce(from, pending)
            }
        };

        let current = self
            .retry(&state.id, "fee estimation", || self.chain.network_fees())
            .await?;
        let fees = match previous_fees {
            Some(previous) => bump_fees(previous, current, self.config.fee_bump_percent),
            None => current,
        };

        let request = TransactionRequest {
            from,
            to: interaction.to,
            data: interaction.data.clone(),
            value: interaction.value.clone(),
            nonce,
            fees,
        };
        let hash = self
            .retry(&state.id, "eth_sendTransaction", || self.chain.send_transaction(&request))
            .await?;
        self.nonces.record(from, nonce);

        info!(
            future = %state.id,
            interaction = interaction.id,
            %hash,
            nonce,
            max_fee_per_gas = fees.max_fee_per_gas,
            "transaction sent"
        );
        self.record(JournalMessage::TransactionSend {
            future_id: state.id.clone(),
            interaction_id: interaction.id,
            nonce,
            transaction: SentTransaction { hash, fees },
        })
        .await?;

        let now = Instant::now();
        self.trackers
            .entry((state.id.clone(), interaction.id))
            .and_modify(|t| t.last_sent = now)
            .or_insert(Tracker {
                last_sent: now,
                bumps: 0,
            });
        Ok(Progress::Advanced)
    }

    async fn check_transactions(&mut self, state: &ExecutionState, interaction: &OnchainInteraction) -> Result<Progress> {
        let latest = self
            .retry(&state.id, "eth_getBlockByNumber", || self.chain.latest_block())
            .await?;

        for tx in interaction.transactions.iter().rev() {
            let receipt = self
                .retry(&state.id, "eth_getTransactionReceipt", || self.chain.get_receipt(tx.hash))
                .await?;
            let Some(receipt) = receipt else { continue };

            let confirmations = (latest.number + 1).saturating_sub(receipt.block_number);
            if confirmations < self.config.required_confirmations {
                debug!(future = %state.id, confirmations, "waiting for confirmations");
                return Ok(Progress::Waiting);
            }
            self.trackers.remove(&(state.id.clone(), interaction.id));
            self.record(JournalMessage::TransactionConfirm {
                future_id: state.id.clone(),
                interaction_id: interaction.id,
                receipt,
            })
            .await?;
            return Ok(Progress::Advanced);
        }

        let mut known = false;
        for tx in &interaction.transactions {
            let found = self
                .retry(&state.id, "eth_getTransactionByHash", || self.chain.get_transaction(tx.hash))
                .await?;
            if found.is_some() {
                known = true;
                break;
            }
        }

        if !known {
            return self.handle_unknown_transactions(state, interaction).await;
        }

        self.maybe_bump(state, interaction).await
    }

    async fn handle_unknown_transactions(
        &mut self,
        state: &ExecutionState,
        interaction: &OnchainInteraction,
    ) -> Result<Progress> {
        let from = interaction.from;
        let mined = self
            .retry(&state.id, "eth_getTransactionCount", || {
                self.chain.transaction_count(from, BlockTag::Latest)
            })
            .await?;
        let nonce = interaction.nonce.unwrap_or_default();

        if mined > nonce {
            let result = ExecutionResult::strategy_error(format!(
                "the transaction with nonce {nonce} of {from} was replaced by a transaction not sent by this deployment"
            ));
            log_result(&state.id, &result);
            self.record(JournalMessage::ExecutionStateComplete {
                future_id: state.id.clone(),
                result,
            })
            .await?;
            return Ok(Progress::Advanced);
        }

        warn!(future = %state.id, interaction = interaction.id, nonce, "transaction dropped by the node");
        self.record(JournalMessage::OnchainInteractionDropped {
            future_id: state.id.clone(),
            interaction_id: interaction.id,
        })
        .await?;
        Ok(Progress::Advanced)
    }

    async fn maybe_bump(&mut self, state: &ExecutionState, interaction: &OnchainInteraction) -> Result<Progress> {
        let key = (state.id.clone(), interaction.id);
        let tracker = *self.trackers.entry(key.clone()).or_insert(Tracker {
            last_sent: Instant::now(),
            bumps: 0,
        });
        if tracker.last_sent.elapsed() < self.config.time_before_bumping_fees {
            return Ok(Progress::Waiting);
        }

        if tracker.bumps >= self.config.max_fee_bumps {
            warn!(
                future = %state.id,
                interaction = interaction.id,
                bumps = tracker.bumps,
                "transaction not confirmed after every fee bump"
            );
            self.trackers.remove(&key);
            self.record(JournalMessage::OnchainInteractionTimeout {
                future_id: state.id.clone(),
                interaction_id: interaction.id,
            })
            .await?;
            return Ok(Progress::Advanced);
        }

        if let Some(t) = self.trackers.get_mut(&key) {
            t.bumps += 1;
        }
        info!(
            future = %state.id,
            interaction = interaction.id,
            bump = tracker.bumps + 1,
            "bumping fees"
        );
        let previous = interaction.transactions.last().map(|tx| tx.fees);
        self.send(state, interaction, previous).await
    }
}

fn new_interaction(id: u32, from: Address, request: InteractionRequest) -> NetworkInteraction {
    match request {
        InteractionRequest::Onchain { to, data, value } => NetworkInteraction::OnchainInteraction(OnchainInteraction {
            id,
            to,
            data,
            value,
            from,
            nonce: None,
            transactions: Vec::new(),
            receipt: None,
            should_be_resent: false,
        }),
        InteractionRequest::StaticCall { to, data, value } => {
            NetworkInteraction::StaticCall(StaticCallInteraction {
                id,
                to: Some(to),
                data,
                value,
                from,
                result: None,
            })
        }
    }
}

fn log_result(future_id: &str, result: &ExecutionResult) {
    if result.is_success() {
        info!(future = future_id, "future succeeded");
    } else {
        warn!(future = future_id, result = %result, "future failed");
    }
}
