//! # Validation Context
//!
//! Everything a validator may consult: the artifact store, the deployment
//! parameters (with the bindings made by `use_module_with`), and the
//! accounts when they are known.

use crate::errors::ValidationError;
use ign_02_module_graph::{module_parameter_bindings, Future, IgnitionModule, ModuleParameterRuntimeValue, ParameterResolver};
use shared_types::{Address, Artifact, ArtifactResolver, DeploymentParameters, ParameterValue};
use tracing::trace;

/// Inputs shared by every validator.
pub struct ValidationContext<'a> {
    artifacts: &'a dyn ArtifactResolver,
    parameters: ParameterResolver<'a>,
    accounts: Option<&'a [Address]>,
}

impl<'a> ValidationContext<'a> {
    /// Creates a context for `module`.
    #[must_use]
    pub fn new(
        artifacts: &'a dyn ArtifactResolver,
        parameters: &'a DeploymentParameters,
        module: &IgnitionModule,
    ) -> Self {
        Self {
            artifacts,
            parameters: ParameterResolver::new(parameters, module_parameter_bindings(module)),
            accounts: None,
        }
    }

    /// Enables account index bounds and sender checks.
    #[must_use]
    pub fn with_accounts(mut self, accounts: &'a [Address]) -> Self {
        self.accounts = Some(accounts);
        self
    }

    /// Known accounts.
    #[must_use]
    pub fn accounts(&self) -> Option<&'a [Address]> {
        self.accounts
    }

    /// Resolved value of a module parameter.
    #[must_use]
    pub fn parameter(&self, parameter: &ModuleParameterRuntimeValue) -> Option<ParameterValue> {
        self.parameters.resolve(parameter)
    }

    /// Loads the artifact registered under `label`, or `None` if there is none.
    pub async fn load_artifact(&self, label: &str) -> Result<Option<Artifact>, ValidationError> {
        if !self.artifacts.has_artifact(label).await? {
            trace!(label, "Artifact not found");
            return Ok(None);
        }
        Ok(Some(self.artifacts.get_artifact(label).await?))
    }

    /// Artifact of a contract future: the supplied one, or the one
    /// registered under its contract name.
    pub async fn contract_artifact(&self, contract: &Future) -> Result<Option<Artifact>, ValidationError> {
        if let Some(artifact) = contract.kind.artifact() {
            return Ok(Some(artifact.clone()));
        }
        match contract.kind.contract_name() {
            Some(name) => self.load_artifact(name).await,
            None => Err(ValidationError::Internal(format!(
                "{} is a {} future, not a contract",
                contract.id,
                contract.future_type()
            ))),
        }
    }
}
