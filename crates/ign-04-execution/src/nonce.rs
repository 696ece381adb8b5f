//! Nonce assignment for new onchain interactions.

use crate::domain::{DeploymentState, NetworkInteraction};
use shared_types::Address;
use std::collections::HashMap;
use tracing::warn;

/// Tracks the highest nonce each sender used in this deployment.
#[derive(Debug, Clone, Default)]
pub struct NonceManager {
    max_used: HashMap<Address, u64>,
}

impl NonceManager {
    /// Seeds the manager from the journaled interactions.
    #[must_use]
    pub fn from_state(state: &DeploymentState) -> Self {
        let mut manager = Self::default();
        for execution in state.execution_states.values() {
            for interaction in &execution.network_interactions {
                if let NetworkInteraction::OnchainInteraction(onchain) = interaction {
                    if let Some(nonce) = onchain.nonce {
                        manager.record(onchain.from, nonce);
                    }
                }
            }
        }
        manager
    }

    /// Nonce for the next new interaction of `sender`, given the node's
    /// pending transaction count.
    pub fn next_nonce(&self, sender: Address, pending_count: u64) -> u64 {
        let Some(max_used) = self.max_used.get(&sender) else {
            return pending_count;
        };
        let expected = max_used + 1;
        if pending_count > expected {
            warn!(
                %sender,
                expected,
                pending_count,
                "the account sent transactions outside this deployment"
            );
        }
        expected.max(pending_count)
    }

    /// Marks `nonce` as used by `sender`.
    pub fn record(&mut self, sender: Address, nonce: u64) {
        self.max_used
            .entry(sender)
            .and_modify(|n| *n = (*n).max(nonce))
            .or_insert(nonce);
    }
}
