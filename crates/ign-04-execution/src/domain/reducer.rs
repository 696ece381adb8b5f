//! # Deployment State Reducer
//!
//! Folds journal messages into the per-future execution states. Replaying a
//! journal through [`DeploymentState::from_messages`] rebuilds exactly the
//! state the run that wrote it had after its last message.

use super::messages::JournalMessage;
use super::state::{ExecutionState, ExecutionStatus, OnchainInteraction};
use crate::errors::StateError;
use std::collections::BTreeMap;

/// State of a whole deployment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentState {
    /// Chain of the first run.
    pub chain_id: Option<u64>,
    /// Execution states by future id.
    pub execution_states: BTreeMap<String, ExecutionState>,
}

impl DeploymentState {
    /// Replays `messages` in order.
    pub fn from_messages<'a>(messages: impl IntoIterator<Item = &'a JournalMessage>) -> Result<Self, StateError> {
        let mut state = Self::default();
        for message in messages {
            state.apply(message)?;
        }
        Ok(state)
    }

    /// Execution state of `future_id`.
    #[must_use]
    pub fn get(&self, future_id: &str) -> Option<&ExecutionState> {
        self.execution_states.get(future_id)
    }

    /// Applies one message.
    pub fn apply(&mut self, message: &JournalMessage) -> Result<(), StateError> {
        match message {
            JournalMessage::RunStart { chain_id, .. } => {
                self.chain_id.get_or_insert(*chain_id);
            }

            JournalMessage::ExecutionStateInitialize {
                future_id,
                future_type,
                strategy,
                dependencies,
                from,
                request,
            } => {
                if self.execution_states.contains_key(future_id) {
                    return Err(StateError::AlreadyInitialized(future_id.clone()));
                }
                self.execution_states.insert(
                    future_id.clone(),
                    ExecutionState {
                        id: future_id.clone(),
                        future_type: *future_type,
                        strategy: strategy.clone(),
                        status: ExecutionStatus::Started,
                        dependencies: dependencies.clone(),
                        from: *from,
                        request: request.clone(),
                        network_interactions: Vec::new(),
                        result: None,
                        hold_reason: None,
                    },
                );
            }

            JournalMessage::NetworkInteractionRequest { future_id, interaction } => {
                let state = self.started(future_id, message)?;
                state.network_interactions.push(interaction.clone());
            }

            JournalMessage::TransactionSend {
                future_id,
                interaction_id,
                nonce,
                transaction,
            } => {
                let state = self.started(future_id, message)?;
                let interaction = onchain(state, *interaction_id)?;
                interaction.nonce = Some(*nonce);
                interaction.transactions.push(transaction.clone());
                interaction.should_be_resent = false;
            }

            JournalMessage::TransactionConfirm {
                future_id,
                interaction_id,
                receipt,
            } => {
                let state = self.started(future_id, message)?;
                onchain(state, *interaction_id)?.receipt = Some(receipt.clone());
            }

            JournalMessage::StaticCallComplete {
                future_id,
                interaction_id,
                result,
            } => {
                let state = self.started(future_id, message)?;
                let call = state
                    .static_call_mut(*interaction_id)
                    .ok_or_else(|| StateError::UnknownInteraction {
                        future_id: future_id.clone(),
                        interaction_id: *interaction_id,
                        expected: "static call",
                    })?;
                call.result = Some(result.clone());
            }

            JournalMessage::OnchainInteractionDropped {
                future_id,
                interaction_id,
            } => {
                let state = self.started(future_id, message)?;
                onchain(state, *interaction_id)?.should_be_resent = true;
            }

            JournalMessage::OnchainInteractionTimeout {
                future_id,
                interaction_id,
            } => {
                let state = self.started(future_id, message)?;
                onchain(state, *interaction_id)?;
                state.status = ExecutionStatus::Timeout;
            }

            JournalMessage::ExecutionStateResume { future_id } => {
                let state = self.state_mut(future_id)?;
                if !matches!(state.status, ExecutionStatus::Timeout | ExecutionStatus::Held) {
                    return Err(invalid(state, message));
                }
                state.status = ExecutionStatus::Started;
                state.hold_reason = None;
            }

            JournalMessage::ExecutionStateHold { future_id, reason } => {
                let state = self.started(future_id, message)?;
                state.status = ExecutionStatus::Held;
                state.hold_reason = Some(reason.clone());
            }

            JournalMessage::ExecutionStateComplete { future_id, result } => {
                let state = self.started(future_id, message)?;
                state.status = if result.is_success() {
                    ExecutionStatus::Success
                } else {
                    ExecutionStatus::Failed
                };
                state.result = Some(result.clone());
            }
        }
        Ok(())
    }

    fn state_mut(&mut self, future_id: &str) -> Result<&mut ExecutionState, StateError> {
        self.execution_states
            .get_mut(future_id)
            .ok_or_else(|| StateError::UnknownFuture(future_id.to_string()))
    }

    fn started(&mut self, future_id: &str, message: &JournalMessage) -> Result<&mut ExecutionState, StateError> {
        let state = self.state_mut(future_id)?;
        if state.status != ExecutionStatus::Started {
            return Err(invalid(state, message));
        }
        Ok(state)
    }
}

fn invalid(state: &ExecutionState, message: &JournalMessage) -> StateError {
    StateError::InvalidTransition {
        future_id: state.id.clone(),
        message: message.type_name(),
        status: state.status.to_string(),
    }
}

fn onchain(
    state: &mut ExecutionState,
    interaction_id: u32,
) -> Result<&mut OnchainInteraction, StateError> {
    let future_id = state.id.clone();
    state
        .onchain_interaction_mut(interaction_id)
        .ok_or(StateError::UnknownInteraction {
            future_id,
            interaction_id,
            expected: "onchain",
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::state::{
        ExecutionRequest, ExecutionResult, NetworkFees, NetworkInteraction, ReceiptStatus, SentTransaction,
        SuccessValue, TransactionReceipt,
    };
    use ign_02_module_graph::FutureType;
    use num_bigint::BigInt;
    use shared_types::{Address, Hash};
    use std::collections::BTreeSet;
    use uuid::Uuid;

    const SENDER: Address = Address::new([0xaa; 20]);

    fn initialize(id: &str) -> JournalMessage {
        JournalMessage::ExecutionStateInitialize {
            future_id: id.into(),
            future_type: FutureType::ContractDeployment,
            strategy: "basic".into(),
            dependencies: BTreeSet::new(),
            from: Some(SENDER),
            request: ExecutionRequest::Deployment {
                contract_name: "Token".into(),
                constructor_args: vec![],
                libraries: BTreeMap::new(),
                value: BigInt::from(0),
            },
        }
    }

    fn request(id: &str) -> JournalMessage {
        JournalMessage::NetworkInteractionRequest {
            future_id: id.into(),
            interaction: NetworkInteraction::OnchainInteraction(OnchainInteraction {
                id: 1,
                to: None,
                data: vec![0x60, 0x80],
                value: BigInt::from(0),
                from: SENDER,
                nonce: None,
                transactions: vec![],
                receipt: None,
                should_be_resent: false,
            }),
        }
    }

    fn send(id: &str, byte: u8) -> JournalMessage {
        JournalMessage::TransactionSend {
            future_id: id.into(),
            interaction_id: 1,
            nonce: 0,
            transaction: SentTransaction {
                hash: Hash::new([byte; 32]),
                fees: NetworkFees {
                    max_fee_per_gas: 100,
                    max_priority_fee_per_gas: 1,
                },
            },
        }
    }

    #[test]
    fn test_full_lifecycle() {
        let receipt = TransactionReceipt {
            transaction_hash: Hash::new([1; 32]),
            block_number: 1,
            block_hash: Hash::new([9; 32]),
            status: ReceiptStatus::Success,
            contract_address: Some(Address::new([0x11; 20])),
            logs: vec![],
        };
        let messages = vec![
            JournalMessage::RunStart {
                run_id: Uuid::new_v4(),
                chain_id: 31337,
            },
            initialize("M#Token"),
            request("M#Token"),
            send("M#Token", 1),
            JournalMessage::TransactionConfirm {
                future_id: "M#Token".into(),
                interaction_id: 1,
                receipt: receipt.clone(),
            },
            JournalMessage::ExecutionStateComplete {
                future_id: "M#Token".into(),
                result: ExecutionResult::success(SuccessValue::Deployment {
                    address: Address::new([0x11; 20]),
                }),
            },
        ];

        let state = DeploymentState::from_messages(&messages).unwrap();
        assert_eq!(state.chain_id, Some(31337));
        let token = state.get("M#Token").unwrap();
        assert_eq!(token.status, ExecutionStatus::Success);
        assert_eq!(token.last_receipt(), Some(&receipt));
        assert!(token.pending_interaction().is_none());
    }

    #[test]
    fn test_drop_and_resend_keeps_nonce() {
        let mut state = DeploymentState::from_messages(&[
            initialize("M#Token"),
            request("M#Token"),
            send("M#Token", 1),
        ])
        .unwrap();

        state
            .apply(&JournalMessage::OnchainInteractionDropped {
                future_id: "M#Token".into(),
                interaction_id: 1,
            })
            .unwrap();
        let NetworkInteraction::OnchainInteraction(interaction) = &state.get("M#Token").unwrap().network_interactions[0]
        else {
            panic!("expected an onchain interaction");
        };
        assert!(interaction.should_be_resent);

        state.apply(&send("M#Token", 2)).unwrap();
        let NetworkInteraction::OnchainInteraction(interaction) = &state.get("M#Token").unwrap().network_interactions[0]
        else {
            panic!("expected an onchain interaction");
        };
        assert!(!interaction.should_be_resent);
        assert_eq!(interaction.nonce, Some(0));
        assert_eq!(interaction.transactions.len(), 2);
    }

    #[test]
    fn test_timeout_then_resume() {
        let mut state =
            DeploymentState::from_messages(&[initialize("M#Token"), request("M#Token"), send("M#Token", 1)]).unwrap();
        state
            .apply(&JournalMessage::OnchainInteractionTimeout {
                future_id: "M#Token".into(),
                interaction_id: 1,
            })
            .unwrap();
        assert_eq!(state.get("M#Token").unwrap().status, ExecutionStatus::Timeout);

        // A timed out future accepts nothing but a resume.
        assert!(matches!(
            state.apply(&send("M#Token", 2)),
            Err(StateError::InvalidTransition { .. })
        ));

        state
            .apply(&JournalMessage::ExecutionStateResume {
                future_id: "M#Token".into(),
            })
            .unwrap();
        assert_eq!(state.get("M#Token").unwrap().status, ExecutionStatus::Started);
    }

    #[test]
    fn test_hold_records_reason() {
        let mut state = DeploymentState::from_messages(&[initialize("M#Token")]).unwrap();
        state
            .apply(&JournalMessage::ExecutionStateHold {
                future_id: "M#Token".into(),
                reason: "waiting for multisig".into(),
            })
            .unwrap();
        let token = state.get("M#Token").unwrap();
        assert_eq!(token.status, ExecutionStatus::Held);
        assert_eq!(token.hold_reason.as_deref(), Some("waiting for multisig"));
    }

    #[test]
    fn test_failure_result_marks_failed() {
        let mut state = DeploymentState::from_messages(&[initialize("M#Token")]).unwrap();
        state
            .apply(&JournalMessage::ExecutionStateComplete {
                future_id: "M#Token".into(),
                result: ExecutionResult::strategy_error("boom"),
            })
            .unwrap();
        assert_eq!(state.get("M#Token").unwrap().status, ExecutionStatus::Failed);
    }

    #[test]
    fn test_rejects_inconsistent_messages() {
        assert_eq!(
            DeploymentState::from_messages(&[request("M#Ghost")]),
            Err(StateError::UnknownFuture("M#Ghost".into()))
        );
        assert_eq!(
            DeploymentState::from_messages(&[initialize("M#A"), initialize("M#A")]),
            Err(StateError::AlreadyInitialized("M#A".into()))
        );
        assert!(matches!(
            DeploymentState::from_messages(&[initialize("M#A"), send("M#A", 1)]),
            Err(StateError::UnknownInteraction { interaction_id: 1, .. })
        ));
    }
}
