//! # Validate-Then-Execute Flows
//!
//! A deploy script validates the module against the artifacts, the
//! parameters and the signer accounts, and only executes a clean module.

#[cfg(test)]
mod tests {
    use crate::fixtures::{accounts, artifacts, fast_config, word, ALICE};
    use ign_02_module_graph::prelude::*;
    use ign_03_validation::{validate, ValidationIssue};
    use ign_04_execution::prelude::*;
    use shared_types::{DeploymentParameters, ModuleParameters, ParameterValue};
    use std::sync::Arc;

    fn priced_token() -> Arc<IgnitionModule> {
        build(&build_module("Priced", |m| {
            let token = m.contract("Token", vec![m.get_parameter("supply").into()], ContractOptions::default())?;
            m.call(&token, "mint", vec![m.get_account(1).into(), 1i64.into()], CallOptions::default())?;
            Ok(ModuleResults::from([("token".to_string(), token)]))
        }))
        .expect("module builds")
    }

    fn supply(value: ParameterValue) -> DeploymentParameters {
        DeploymentParameters::from([(
            "Priced".to_string(),
            ModuleParameters::from([("supply".to_string(), value)]),
        )])
    }

    #[tokio::test]
    async fn test_missing_parameter_blocks_deployment() {
        let module = priced_token();
        let store = artifacts();

        let report = validate(&module, store.as_ref(), &DeploymentParameters::new(), Some(&accounts()))
            .await
            .unwrap();
        assert!(!report.is_valid());
        assert!(matches!(
            &report.errors[0].issue,
            ValidationIssue::MissingParameter { name, .. } if name == "supply"
        ));
        assert_eq!(report.by_future().keys().collect::<Vec<_>>(), vec!["Priced#Token"]);
    }

    #[tokio::test]
    async fn test_wrong_parameter_type_is_reported() {
        let module = build(&build_module("Tipping", |m| {
            m.send("tip", ALICE.to_checksum(), m.get_parameter("tip"), None, SendOptions::default())?;
            Ok(ModuleResults::new())
        }))
        .unwrap();
        let store = artifacts();
        let parameters = DeploymentParameters::from([(
            "Tipping".to_string(),
            ModuleParameters::from([("tip".to_string(), ParameterValue::from(true))]),
        )]);

        let report = validate(&module, store.as_ref(), &parameters, Some(&accounts()))
            .await
            .unwrap();
        assert!(matches!(
            &report.errors[0].issue,
            ValidationIssue::ParameterType { name, expected, .. } if name == "tip" && expected == "bigint"
        ));
    }

    #[tokio::test]
    async fn test_constructor_parameter_must_fit_abi_type() {
        let module = priced_token();
        let store = artifacts();

        let report = validate(&module, store.as_ref(), &supply(ParameterValue::from(true)), Some(&accounts()))
            .await
            .unwrap();
        assert!(matches!(
            report.errors.as_slice(),
            [error] if error.future_id == "Priced#Token"
                && matches!(&error.issue, ValidationIssue::ParameterType { expected, actual: "boolean", .. } if expected == "uint256")
        ));
    }

    #[tokio::test]
    async fn test_missing_signer_is_reported() {
        let module = priced_token();
        let store = artifacts();
        let accounts = accounts();
        let only_deployer = &accounts[..1];

        let report = validate(&module, store.as_ref(), &supply(ParameterValue::from(5)), Some(only_deployer))
            .await
            .unwrap();
        assert!(matches!(
            report.errors.as_slice(),
            [error] if error.future_id == "Priced#Token.mint"
                && matches!(error.issue, ValidationIssue::AccountIndexOutOfRange { index: 1, count: 1 })
        ));
    }

    #[tokio::test]
    async fn test_valid_module_executes() {
        ign_telemetry::init_test_logging();
        let module = priced_token();
        let store = artifacts();
        let parameters = supply(ParameterValue::from(5));

        let report = validate(&module, store.as_ref(), &parameters, Some(&accounts()))
            .await
            .unwrap();
        assert!(report.is_valid(), "{:?}", report.by_future());

        let chain = Arc::new(InMemoryChain::new());
        let result = ExecutionEngine::new(chain.clone(), Arc::new(MemoryJournal::new()), store, fast_config())
            .execute(&module, &parameters, &accounts())
            .await
            .unwrap();
        assert!(result.is_success(), "{result:?}");
        assert!(chain.sent_transactions()[0].data.ends_with(&word(5)));
    }
}
