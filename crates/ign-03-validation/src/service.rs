//! # Validation Service
//!
//! Runs the validator for every future of a module tree and gathers the
//! issues. Futures are visited submodules first, in creation order, so the
//! report reads in the order the module was written.

use crate::context::ValidationContext;
use crate::errors::{FutureValidationError, ValidationError};
use crate::validators::validate_future;
use ign_02_module_graph::{collect_futures, IgnitionModule};
use shared_types::{Address, ArtifactResolver, DeploymentParameters};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Every issue found in a module tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Issues in visiting order.
    pub errors: Vec<FutureValidationError>,
}

impl ValidationReport {
    /// True if no issue was found.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Issue messages grouped by future id.
    #[must_use]
    pub fn by_future(&self) -> BTreeMap<String, Vec<String>> {
        let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for error in &self.errors {
            grouped
                .entry(error.future_id.clone())
                .or_default()
                .push(error.issue.to_string());
        }
        grouped
    }
}

/// Validates every future of `module` with a prepared context.
#[instrument(skip_all, fields(module = %module.id, run_id = %Uuid::new_v4()))]
pub async fn validate_module(
    module: &IgnitionModule,
    ctx: &ValidationContext<'_>,
) -> Result<ValidationReport, ValidationError> {
    let futures = collect_futures(module);
    let mut report = ValidationReport::default();

    for future in &futures {
        let issues = validate_future(ctx, future).await?;
        if !issues.is_empty() {
            debug!(future = %future.id, issues = issues.len(), "Future has validation issues");
        }
        report.errors.extend(issues.into_iter().map(|issue| FutureValidationError {
            future_id: future.id.clone(),
            issue,
        }));
    }

    info!(
        futures = futures.len(),
        errors = report.errors.len(),
        "Validation finished"
    );
    Ok(report)
}

/// Validates `module` against an artifact store, the deployment parameters
/// and, when given, the accounts.
pub async fn validate(
    module: &IgnitionModule,
    artifacts: &dyn ArtifactResolver,
    parameters: &DeploymentParameters,
    accounts: Option<&[Address]>,
) -> Result<ValidationReport, ValidationError> {
    let mut ctx = ValidationContext::new(artifacts, parameters, module);
    if let Some(accounts) = accounts {
        ctx = ctx.with_accounts(accounts);
    }
    validate_module(module, &ctx).await
}
