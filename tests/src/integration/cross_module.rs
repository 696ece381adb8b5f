//! # Cross-Module Flows
//!
//! Submodules share their futures with the modules that use them:
//!
//! 1. **Result tokens**: a parent deploys against a submodule's contract
//! 2. **`after` a module**: waits for every future of the submodule
//! 3. **Parameters**: deployment values override bindings, `$global` and defaults

#[cfg(test)]
mod tests {
    use crate::fixtures::{accounts, address_word, artifacts, fast_config, selector, word, ALICE};
    use ign_02_module_graph::prelude::*;
    use ign_04_execution::prelude::*;
    use shared_types::{
        compute_contract_address, DeploymentParameters, ModuleParameters, ParameterValue, GLOBAL_PARAMETERS_KEY,
    };
    use std::sync::Arc;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn token_module() -> ModuleDefinition {
        build_module("TokenModule", |m| {
            let supply = m.get_parameter_or("supply", 1000i64);
            let token = m.contract("Token", vec![supply.into()], ContractOptions::default())?;
            m.call(&token, "mint", vec![m.get_account(1).into(), 50i64.into()], CallOptions::default())?;
            Ok(ModuleResults::from([("token".to_string(), token)]))
        })
    }

    fn market(bound: ModuleParameters) -> Arc<IgnitionModule> {
        let tokens = token_module();
        build(&build_module("Market", move |m| {
            let handle = m.use_module_with(&tokens, bound.clone())?;
            let token = handle.result("token")?;
            let exchange = m.contract("Exchange", vec![(&token).into()], ContractOptions::default())?;
            let another = m.contract("Another", vec![], ContractOptions::default().after(&handle))?;
            Ok(ModuleResults::from([
                ("token".to_string(), token),
                ("exchange".to_string(), exchange),
                ("another".to_string(), another),
            ]))
        }))
        .expect("module builds")
    }

    async fn deploy(module: &IgnitionModule, parameters: &DeploymentParameters) -> (DeploymentResult, Arc<InMemoryChain>) {
        ign_telemetry::init_test_logging();
        let chain = Arc::new(InMemoryChain::new());
        let result = ExecutionEngine::new(chain.clone(), Arc::new(MemoryJournal::new()), artifacts(), fast_config())
            .execute(module, parameters, &accounts())
            .await
            .expect("run completes");
        (result, chain)
    }

    fn token_supply(chain: &InMemoryChain) -> Vec<u8> {
        let sent = chain.sent_transactions();
        let deploy = sent
            .iter()
            .find(|tx| tx.to.is_none() && tx.data.starts_with(&[0x60, 0x01, 0x60, 0x00]))
            .expect("token deployed");
        deploy.data[deploy.data.len() - 32..].to_vec()
    }

    fn module_parameters(entries: &[(&str, i64)]) -> ModuleParameters {
        entries
            .iter()
            .map(|(name, value)| ((*name).to_string(), ParameterValue::from(*value)))
            .collect()
    }

    // =============================================================================
    // FLOWS
    // =============================================================================

    #[tokio::test]
    async fn test_parent_uses_submodule_contract() {
        let (result, chain) = deploy(&market(ModuleParameters::new()), &DeploymentParameters::new()).await;

        assert!(result.is_success(), "{result:?}");
        let token = result.contracts()["TokenModule#Token"];
        assert_eq!(token, compute_contract_address(ALICE, 0));
        assert!(result.futures.contains_key("TokenModule#Token.mint"));

        let sent = chain.sent_transactions();
        let exchange = sent
            .iter()
            .find(|tx| tx.to.is_none() && tx.data.ends_with(&address_word(token)))
            .expect("exchange deployed");
        assert!(exchange.nonce > 0);
    }

    #[tokio::test]
    async fn test_after_module_waits_for_every_submodule_future() {
        let (result, chain) = deploy(&market(ModuleParameters::new()), &DeploymentParameters::new()).await;
        assert!(result.is_success());

        let sent = chain.sent_transactions();
        let mint = sent
            .iter()
            .position(|tx| tx.data.starts_with(&selector("mint(address,uint256)")))
            .expect("mint sent");
        let another = sent
            .iter()
            .position(|tx| tx.to.is_none() && tx.data.starts_with(&[0x60, 0x03, 0x60, 0x00]))
            .expect("another deployed");
        assert!(mint < another);
    }

    #[tokio::test]
    async fn test_default_parameter_value() {
        let (result, chain) = deploy(&market(ModuleParameters::new()), &DeploymentParameters::new()).await;
        assert!(result.is_success());
        assert_eq!(token_supply(&chain), word(1000));
    }

    #[tokio::test]
    async fn test_global_parameter_beats_default() {
        let parameters = DeploymentParameters::from([(
            GLOBAL_PARAMETERS_KEY.to_string(),
            module_parameters(&[("supply", 7)]),
        )]);
        let (result, chain) = deploy(&market(ModuleParameters::new()), &parameters).await;
        assert!(result.is_success());
        assert_eq!(token_supply(&chain), word(7));
    }

    #[tokio::test]
    async fn test_binding_beats_global() {
        let parameters = DeploymentParameters::from([(
            GLOBAL_PARAMETERS_KEY.to_string(),
            module_parameters(&[("supply", 7)]),
        )]);
        let (result, chain) = deploy(&market(module_parameters(&[("supply", 9)])), &parameters).await;
        assert!(result.is_success());
        assert_eq!(token_supply(&chain), word(9));
    }

    #[tokio::test]
    async fn test_deployment_parameter_beats_binding() {
        let parameters = DeploymentParameters::from([
            (GLOBAL_PARAMETERS_KEY.to_string(), module_parameters(&[("supply", 7)])),
            ("TokenModule".to_string(), module_parameters(&[("supply", 11)])),
        ]);
        let (result, chain) = deploy(&market(module_parameters(&[("supply", 9)])), &parameters).await;
        assert!(result.is_success());
        assert_eq!(token_supply(&chain), word(11));
    }
}
