//! # Serialized Module Flows
//!
//! A module written to JSON and read back is the same deployment: it gets
//! the same addresses and reconciles against the original's journal.

#[cfg(test)]
mod tests {
    use crate::fixtures::{accounts, artifacts, fast_config, script_token_mint, ALICE};
    use ign_02_module_graph::prelude::*;
    use ign_02_module_graph::{from_json, to_json};
    use ign_04_execution::prelude::*;
    use shared_types::DeploymentParameters;
    use std::sync::Arc;

    fn module() -> Arc<IgnitionModule> {
        let tokens = build_module("Tokens", |m| {
            let token = m.contract("Token", vec![m.get_parameter_or("supply", 1000i64).into()], ContractOptions::default())?;
            Ok(ModuleResults::from([("token".to_string(), token)]))
        });
        build(&build_module("Serialized", move |m| {
            let token = m.use_module(&tokens)?.result("token")?;
            let exchange = m.contract("Exchange", vec![(&token).into()], ContractOptions::default())?;
            m.call(&exchange, "addToken", vec![(&token).into()], CallOptions::default())?;
            m.read_event_argument(&token, "Transfer", "value", ReadEventArgumentOptions::default())?;
            Ok(ModuleResults::from([("exchange".to_string(), exchange)]))
        }))
        .expect("module builds")
    }

    fn engine(chain: &Arc<InMemoryChain>, journal: &Arc<MemoryJournal>) -> ExecutionEngine {
        ExecutionEngine::new(chain.clone(), journal.clone(), artifacts(), fast_config())
    }

    fn chain() -> Arc<InMemoryChain> {
        let chain = Arc::new(InMemoryChain::new());
        script_token_mint(&chain, ALICE, 1000);
        chain
    }

    #[tokio::test]
    async fn test_restored_module_deploys_identically() -> anyhow::Result<()> {
        ign_telemetry::init_test_logging();
        let original = module();
        let restored = from_json(&to_json(&original)?)?;

        let direct = engine(&chain(), &Arc::new(MemoryJournal::new()))
            .execute(&original, &DeploymentParameters::new(), &accounts())
            .await?;
        let from_disk = engine(&chain(), &Arc::new(MemoryJournal::new()))
            .execute(&restored, &DeploymentParameters::new(), &accounts())
            .await?;

        assert!(from_disk.is_success(), "{from_disk:?}");
        assert_eq!(from_disk.futures, direct.futures);
        Ok(())
    }

    #[tokio::test]
    async fn test_restored_module_resumes_original_journal() -> anyhow::Result<()> {
        ign_telemetry::init_test_logging();
        let chain = chain();
        let journal = Arc::new(MemoryJournal::new());
        let original = module();

        engine(&chain, &journal)
            .execute(&original, &DeploymentParameters::new(), &accounts())
            .await?;
        let sent = chain.sent_transactions().len();

        let restored = from_json(&to_json(&original)?)?;
        let result = engine(&chain, &journal)
            .execute(&restored, &DeploymentParameters::new(), &accounts())
            .await?;
        assert!(result.is_success());
        assert_eq!(chain.sent_transactions().len(), sent);
        Ok(())
    }

    #[test]
    fn test_json_carries_every_future() -> anyhow::Result<()> {
        let text = to_json(&module())?;
        let _: serde_json::Value = serde_json::from_str(&text)?;
        for id in [
            "Tokens#Token",
            "Serialized#Exchange",
            "Serialized#Exchange.addToken",
            "Serialized#Token.Transfer.value.0",
        ] {
            assert!(text.contains(id), "{id} missing from {text}");
        }
        Ok(())
    }
}
