//! # Token Resolution
//!
//! Turns the pending futures of a builder into built futures. Tokens can
//! only refer to earlier futures, so a single pass in creation order
//! resolves everything.

use crate::builder::{FutureToken, TokenTarget};
use crate::domain::{Dependency, Future, FutureKind, FutureRef, IgnitionModule};
use crate::errors::BuildError;
use std::sync::Arc;

/// A future as registered by the builder.
pub(crate) struct PendingFuture {
    pub id: String,
    pub kind: FutureKind<FutureToken>,
    pub dependencies: Vec<PendingDependency>,
}

pub(crate) enum PendingDependency {
    Future(FutureToken),
    Module(Arc<IgnitionModule>),
}

/// Built futures of one builder, indexed by creation order.
pub(crate) struct ResolutionTable {
    module_id: String,
    builder_id: u64,
    resolved: Vec<FutureRef>,
}

impl ResolutionTable {
    pub fn new(module_id: String, builder_id: u64) -> Self {
        Self {
            module_id,
            builder_id,
            resolved: Vec::new(),
        }
    }

    pub fn resolve(&self, token: &FutureToken) -> Result<FutureRef, BuildError> {
        match &token.target {
            TokenTarget::Built(future) => Ok(Arc::clone(future)),
            TokenTarget::Pending { builder, index } if *builder == self.builder_id => self
                .resolved
                .get(*index)
                .cloned()
                .ok_or_else(|| BuildError::UnresolvedToken(token.id().to_string())),
            TokenTarget::Pending { .. } => Err(BuildError::ForeignFuture {
                module: self.module_id.clone(),
                future: token.id().to_string(),
            }),
        }
    }

    pub fn insert(&mut self, pending: PendingFuture) -> Result<FutureRef, BuildError> {
        let kind = pending.kind.try_map(&mut |token| self.resolve(&token))?;
        let dependencies = pending
            .dependencies
            .iter()
            .map(|dependency| match dependency {
                PendingDependency::Future(token) => self.resolve(token).map(Dependency::Future),
                PendingDependency::Module(module) => Ok(Dependency::Module(Arc::clone(module))),
            })
            .collect::<Result<Vec<_>, BuildError>>()?;

        let future = Arc::new(Future {
            id: pending.id,
            module_id: self.module_id.clone(),
            dependencies,
            kind,
        });
        self.resolved.push(Arc::clone(&future));
        Ok(future)
    }

    pub fn into_futures(self) -> Vec<FutureRef> {
        self.resolved
    }
}
