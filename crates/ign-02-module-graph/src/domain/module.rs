//! # Modules

use super::futures::{FutureRef, FutureType};
use shared_types::ModuleParameters;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A built module: its own futures, the submodules it used, and its results.
///
/// Futures are kept in creation order; that order is also a valid
/// topological order within the module.
#[derive(Debug, Clone, PartialEq)]
pub struct IgnitionModule {
    /// Module id.
    pub id: String,
    /// Futures created directly by this module.
    pub futures: Vec<FutureRef>,
    /// Modules pulled in with `use_module`.
    pub submodules: Vec<Arc<IgnitionModule>>,
    /// Exported contract futures.
    pub results: BTreeMap<String, FutureRef>,
    /// Parameters bound by the parent's `use_module_with`.
    pub parameters: ModuleParameters,
}

impl IgnitionModule {
    /// Finds a future created directly by this module.
    #[must_use]
    pub fn future(&self, id: &str) -> Option<&FutureRef> {
        self.futures.iter().find(|f| f.id == id)
    }

    /// Looks up an exported result.
    #[must_use]
    pub fn result(&self, key: &str) -> Option<&FutureRef> {
        self.results.get(key)
    }

    /// Number of futures per type, including submodules.
    #[must_use]
    pub fn future_type_counts(&self) -> BTreeMap<FutureType, usize> {
        let mut counts = BTreeMap::new();
        for future in crate::graph::collect_futures(self) {
            *counts.entry(future.future_type()).or_insert(0) += 1;
        }
        counts
    }
}
