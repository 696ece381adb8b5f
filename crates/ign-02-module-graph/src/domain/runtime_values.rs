//! # Runtime Values
//!
//! Values that are only known when a deployment runs: signer accounts and
//! module parameters.

use shared_types::{DeploymentParameters, ModuleParameters, ParameterValue, GLOBAL_PARAMETERS_KEY};
use std::collections::BTreeMap;
use std::fmt;

/// Index into the list of signer accounts.
///
/// The index is signed so that a negative index can be reported by
/// validation instead of being rejected by the type system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccountRuntimeValue {
    /// Position in the accounts list.
    pub account_index: i64,
}

impl fmt::Display for AccountRuntimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "account #{}", self.account_index)
    }
}

/// A named module parameter with an optional default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleParameterRuntimeValue {
    /// Module that declared the parameter.
    pub module_id: String,
    /// Parameter name.
    pub name: String,
    /// Used when no value is supplied.
    pub default_value: Option<ParameterValue>,
}

impl fmt::Display for ModuleParameterRuntimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.module_id, self.name)
    }
}

/// Looks up module parameters.
///
/// Precedence, highest first: the deployment's value for the module, the
/// value bound by `use_module_with`, the deployment's `$global` value, then
/// the parameter's default.
#[derive(Debug, Clone, Default)]
pub struct ParameterResolver<'a> {
    deployment: Option<&'a DeploymentParameters>,
    bound: BTreeMap<String, ModuleParameters>,
}

impl<'a> ParameterResolver<'a> {
    /// Creates a resolver over the deployment parameters and the parameters
    /// bound to each module in the graph.
    #[must_use]
    pub fn new(deployment: &'a DeploymentParameters, bound: BTreeMap<String, ModuleParameters>) -> Self {
        Self {
            deployment: Some(deployment),
            bound,
        }
    }

    /// Resolves `parameter`, returning `None` if no scope supplies a value.
    #[must_use]
    pub fn resolve(&self, parameter: &ModuleParameterRuntimeValue) -> Option<ParameterValue> {
        let from_deployment = |scope: &str| {
            self.deployment
                .and_then(|d| d.get(scope))
                .and_then(|m| m.get(&parameter.name))
                .cloned()
        };

        from_deployment(&parameter.module_id)
            .or_else(|| {
                self.bound
                    .get(&parameter.module_id)
                    .and_then(|m| m.get(&parameter.name))
                    .cloned()
            })
            .or_else(|| from_deployment(GLOBAL_PARAMETERS_KEY))
            .or_else(|| parameter.default_value.clone())
    }
}
