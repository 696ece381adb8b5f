//! # Resumption Flows
//!
//! Every run writes a JSON-lines journal. A new process pointed at the same
//! file continues the deployment:
//!
//! 1. **Timed-out transaction**: mined between runs, picked up without resending
//! 2. **Dropped transaction**: resent at the same nonce
//! 3. **Torn last line**: a crash mid-write loses only the unacknowledged message
//! 4. **Halt**: stopping before anything starts leaves nothing to undo

#[cfg(test)]
mod tests {
    use crate::fixtures::{accounts, artifacts, fast_config, ALICE};
    use ign_02_module_graph::prelude::*;
    use ign_04_execution::prelude::*;
    use shared_types::{compute_contract_address, DeploymentParameters};
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn token_and_exchange() -> Arc<IgnitionModule> {
        build(&build_module("Resumable", |m| {
            let token = m.contract("Token", vec![1000i64.into()], ContractOptions::default())?;
            let exchange = m.contract("Exchange", vec![(&token).into()], ContractOptions::default())?;
            Ok(ModuleResults::from([("token".to_string(), token), ("exchange".to_string(), exchange)]))
        }))
        .expect("module builds")
    }

    /// Gives up on the first pending transaction instead of bumping fees.
    fn impatient() -> ExecutionConfig {
        ExecutionConfig {
            time_before_bumping_fees: Duration::ZERO,
            max_fee_bumps: 0,
            ..fast_config()
        }
    }

    fn journal_path(dir: &TempDir) -> PathBuf {
        dir.path().join("deployments").join("chain-31337").join("journal.jsonl")
    }

    /// A fresh engine over the file, as a restarted process would build it.
    async fn run(chain: &Arc<InMemoryChain>, path: &Path, config: ExecutionConfig) -> DeploymentResult {
        ExecutionEngine::new(chain.clone(), Arc::new(FileJournal::new(path)), artifacts(), config)
            .execute(&token_and_exchange(), &DeploymentParameters::new(), &accounts())
            .await
            .expect("run completes")
    }

    async fn journal_types(path: &Path) -> Vec<&'static str> {
        FileJournal::new(path)
            .read()
            .await
            .expect("journal readable")
            .iter()
            .map(JournalMessage::type_name)
            .collect()
    }

    /// First run: the token deployment is sent but never mined.
    async fn interrupted_run(chain: &Arc<InMemoryChain>, path: &Path) {
        chain.set_auto_mine(false);
        let first = run(chain, path, impatient()).await;
        assert_eq!(first.status, DeploymentStatus::ExecutionErrors);
        assert_eq!(first.futures["Resumable#Token"], FutureOutcome::Timeout);
        assert_eq!(first.futures["Resumable#Exchange"], FutureOutcome::NotStarted);
    }

    // =============================================================================
    // FLOWS
    // =============================================================================

    #[tokio::test]
    async fn test_mined_transaction_is_picked_up() {
        ign_telemetry::init_test_logging();
        let dir = TempDir::new().unwrap();
        let path = journal_path(&dir);
        let chain = Arc::new(InMemoryChain::new());

        interrupted_run(&chain, &path).await;
        chain.mine();
        chain.set_auto_mine(true);

        let second = run(&chain, &path, fast_config()).await;
        assert!(second.is_success(), "{second:?}");
        assert_eq!(second.contracts()["Resumable#Token"], compute_contract_address(ALICE, 0));
        assert_eq!(chain.sent_transactions().len(), 2);

        let types = journal_types(&path).await;
        assert_eq!(types.iter().filter(|t| **t == "RUN_START").count(), 2);
        assert!(types.contains(&"ONCHAIN_INTERACTION_TIMEOUT"));
        assert!(types.contains(&"EXECUTION_STATE_RESUME"));
        assert_eq!(types.last(), Some(&"EXECUTION_STATE_COMPLETE"));
    }

    #[tokio::test]
    async fn test_dropped_transaction_is_resent_at_same_nonce() {
        ign_telemetry::init_test_logging();
        let dir = TempDir::new().unwrap();
        let path = journal_path(&dir);
        let chain = Arc::new(InMemoryChain::new());

        interrupted_run(&chain, &path).await;
        assert_eq!(chain.drop_pending(), 1);
        chain.set_auto_mine(true);

        let second = run(&chain, &path, fast_config()).await;
        assert!(second.is_success(), "{second:?}");

        let sent = chain.sent_transactions();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0].nonce, 0);
        assert_eq!(sent[1].nonce, 0);
        assert_eq!(second.contracts()["Resumable#Token"], compute_contract_address(ALICE, 0));
        assert!(journal_types(&path).await.contains(&"ONCHAIN_INTERACTION_DROPPED"));
    }

    #[tokio::test]
    async fn test_torn_last_line_is_cut_off() -> anyhow::Result<()> {
        ign_telemetry::init_test_logging();
        let dir = TempDir::new()?;
        let path = journal_path(&dir);
        let chain = Arc::new(InMemoryChain::new());

        let first = run(&chain, &path, fast_config()).await;
        assert!(first.is_success());
        let mut contents = tokio::fs::read_to_string(&path).await?;
        contents.push_str(r#"{"type":"TRANSACTION_SEND","futureId":"#);
        tokio::fs::write(&path, contents).await?;

        let second = run(&chain, &path, fast_config()).await;
        assert!(second.is_success());
        assert_eq!(second.contracts(), first.contracts());
        assert_eq!(chain.sent_transactions().len(), 2);

        // The second run's RUN_START landed on a line of its own.
        let types = journal_types(&path).await;
        assert_eq!(types.last(), Some(&"RUN_START"));
        Ok(())
    }

    #[tokio::test]
    async fn test_halted_run_leaves_nothing_started() {
        ign_telemetry::init_test_logging();
        let dir = TempDir::new().unwrap();
        let path = journal_path(&dir);
        let chain = Arc::new(InMemoryChain::new());

        let engine = ExecutionEngine::new(chain.clone(), Arc::new(FileJournal::new(&path)), artifacts(), fast_config());
        engine.halt_handle().halt();
        let halted = engine
            .execute(&token_and_exchange(), &DeploymentParameters::new(), &accounts())
            .await
            .unwrap();
        assert_eq!(halted.status, DeploymentStatus::Halted);
        assert_eq!(journal_types(&path).await, vec!["RUN_START"]);

        let resumed = run(&chain, &path, fast_config()).await;
        assert!(resumed.is_success());
    }

    #[tokio::test]
    async fn test_journal_is_bound_to_its_chain() {
        ign_telemetry::init_test_logging();
        let dir = TempDir::new().unwrap();
        let path = journal_path(&dir);

        run(&Arc::new(InMemoryChain::new()), &path, fast_config()).await;

        let other = Arc::new(InMemoryChain::new().with_chain_id(1));
        let error = ExecutionEngine::new(other, Arc::new(FileJournal::new(&path)), artifacts(), fast_config())
            .execute(&token_and_exchange(), &DeploymentParameters::new(), &accounts())
            .await
            .unwrap_err();
        assert!(matches!(error, ExecutionError::ChainMismatch { journal: 31337, chain: 1 }));
    }
}
