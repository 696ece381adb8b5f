//! # Deployment Flows
//!
//! A module is built with the builder API and executed end to end against
//! the in-memory chain:
//!
//! 1. **Token → Exchange**: constructor arguments carry deployed addresses
//! 2. **`after` ordering**: `Another` waits for the exchange without using it
//! 3. **Calls, sends and reads**: payable call, plain transfer, event argument
//! 4. **Idempotence**: a finished deployment sends nothing when run again

#[cfg(test)]
mod tests {
    use crate::fixtures::{
        accounts, address_word, artifacts, fast_config, script_token_mint, selector, word, ALICE, BOB,
    };
    use ign_01_abi::EvmValue;
    use ign_02_module_graph::prelude::*;
    use ign_04_execution::prelude::*;
    use shared_types::{compute_contract_address, BigInt, DeploymentParameters};
    use std::sync::Arc;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn token_system() -> Arc<IgnitionModule> {
        build(&build_module("TokenSystem", |m| {
            let token = m.contract("Token", vec![1000i64.into()], ContractOptions::default())?;
            let exchange = m.contract("Exchange", vec![(&token).into()], ContractOptions::default())?;
            let another = m.contract("Another", vec![], ContractOptions::default().after(&exchange))?;

            m.call(&exchange, "addToken", vec![(&token).into()], CallOptions::default())?;
            m.call(&another, "deposit", vec![], CallOptions::default().value(10i64))?;
            m.send("fund", &exchange, 5i64, None, SendOptions::default())?;
            m.static_call(&token, "balanceOf", vec![m.get_account(0).into()], StaticCallOptions::default())?;
            m.read_event_argument(&token, "Transfer", "value", ReadEventArgumentOptions::default())?;

            Ok(ModuleResults::from([
                ("token".to_string(), token),
                ("exchange".to_string(), exchange),
                ("another".to_string(), another),
            ]))
        }))
        .expect("module builds")
    }

    struct Deployment {
        chain: Arc<InMemoryChain>,
        journal: Arc<MemoryJournal>,
    }

    impl Deployment {
        fn new() -> Self {
            ign_telemetry::init_test_logging();
            let chain = Arc::new(InMemoryChain::new());
            script_token_mint(&chain, ALICE, 1000);
            chain.respond(selector("balanceOf(address)"), ScriptedResponse::returns(word(1000)));
            Self {
                chain,
                journal: Arc::new(MemoryJournal::new()),
            }
        }

        async fn run(&self, module: &IgnitionModule) -> DeploymentResult {
            ExecutionEngine::new(self.chain.clone(), self.journal.clone(), artifacts(), fast_config())
                .execute(module, &DeploymentParameters::new(), &accounts())
                .await
                .expect("run completes")
        }
    }

    // =============================================================================
    // FLOWS
    // =============================================================================

    #[tokio::test]
    async fn test_token_system_deploys() {
        let deployment = Deployment::new();
        let result = deployment.run(&token_system()).await;

        assert!(result.is_success(), "{result:?}");
        let contracts = result.contracts();
        assert_eq!(contracts.len(), 3);
        assert_eq!(contracts["TokenSystem#Token"], compute_contract_address(ALICE, 0));
        assert_eq!(contracts["TokenSystem#Exchange"], compute_contract_address(ALICE, 1));

        // Deployments, two calls and the transfer.
        let sent = deployment.chain.sent_transactions();
        assert_eq!(sent.len(), 6);
        assert!(sent.iter().all(|tx| tx.from == ALICE));

        let exchange_deploy = &sent[1];
        assert!(exchange_deploy.to.is_none());
        assert!(exchange_deploy.data.ends_with(&address_word(contracts["TokenSystem#Token"])));

        let deposit = sent
            .iter()
            .find(|tx| tx.data == selector("deposit()"))
            .expect("deposit sent");
        assert_eq!(deposit.to, Some(contracts["TokenSystem#Another"]));
        assert_eq!(deposit.value, BigInt::from(10));

        let fund = sent
            .iter()
            .find(|tx| tx.data.is_empty() && tx.to.is_some())
            .expect("transfer sent");
        assert_eq!(fund.to, Some(contracts["TokenSystem#Exchange"]));
        assert_eq!(fund.value, BigInt::from(5));
    }

    #[tokio::test]
    async fn test_after_orders_independent_contracts() {
        let deployment = Deployment::new();
        let result = deployment.run(&token_system()).await;
        assert!(result.is_success());

        let sent = deployment.chain.sent_transactions();
        let position = |address: shared_types::Address| {
            sent.iter()
                .position(|tx| {
                    tx.to.is_none() && compute_contract_address(tx.from, tx.nonce) == address
                })
                .expect("deployment sent")
        };
        let contracts = result.contracts();
        assert!(position(contracts["TokenSystem#Exchange"]) < position(contracts["TokenSystem#Another"]));
    }

    #[tokio::test]
    async fn test_values_read_from_the_chain() {
        let deployment = Deployment::new();
        let result = deployment.run(&token_system()).await;

        assert_eq!(
            result.futures["TokenSystem#Token.balanceOf"],
            FutureOutcome::Success(SuccessValue::StaticCall {
                value: EvmValue::from(1000i64)
            })
        );
        assert_eq!(
            result.futures["TokenSystem#Token.Transfer.value.0"],
            FutureOutcome::Success(SuccessValue::ReadEventArgument {
                value: EvmValue::from(1000i64)
            })
        );
        assert_eq!(result.futures["TokenSystem#fund"], FutureOutcome::Success(SuccessValue::SendData));
        assert_eq!(
            result.futures["TokenSystem#Another.deposit"],
            FutureOutcome::Success(SuccessValue::Call)
        );
    }

    #[tokio::test]
    async fn test_finished_deployment_is_idempotent() {
        let deployment = Deployment::new();
        let first = deployment.run(&token_system()).await;
        let sent = deployment.chain.sent_transactions().len();
        let journaled = deployment.journal.len();

        let second = deployment.run(&token_system()).await;
        assert!(second.is_success());
        assert_eq!(second.contracts(), first.contracts());
        assert_eq!(deployment.chain.sent_transactions().len(), sent);
        // Only the second run's RUN_START was added.
        assert_eq!(deployment.journal.len(), journaled + 1);
    }

    #[tokio::test]
    async fn test_sender_account_is_respected() {
        let deployment = Deployment::new();
        let module = build(&build_module("Signers", |m| {
            let token = m.contract(
                "Token",
                vec![1i64.into()],
                ContractOptions::default().from(m.get_account(1)),
            )?;
            Ok(ModuleResults::from([("token".to_string(), token)]))
        }))
        .expect("module builds");

        let result = deployment.run(&module).await;
        assert!(result.is_success(), "{result:?}");
        assert_eq!(result.contracts()["Signers#Token"], compute_contract_address(BOB, 0));
    }
}
