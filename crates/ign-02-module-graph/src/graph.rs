//! # Dependency Graph
//!
//! Flattens a module tree into its futures and the edges between them.
//! A module dependency is expanded into an edge to every future of that
//! module, submodules included.

use crate::domain::{Dependency, FutureRef, IgnitionModule};
use shared_types::ModuleParameters;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Every future reachable from `module`, submodules first, each once.
#[must_use]
pub fn collect_futures(module: &IgnitionModule) -> Vec<FutureRef> {
    let mut seen_modules = HashSet::new();
    let mut seen_futures = HashSet::new();
    let mut out = Vec::new();
    collect_into(module, &mut seen_modules, &mut seen_futures, &mut out);
    out
}

fn collect_into(
    module: &IgnitionModule,
    seen_modules: &mut HashSet<String>,
    seen_futures: &mut HashSet<String>,
    out: &mut Vec<FutureRef>,
) {
    if !seen_modules.insert(module.id.clone()) {
        return;
    }
    for submodule in &module.submodules {
        collect_into(submodule, seen_modules, seen_futures, out);
    }
    for future in &module.futures {
        if seen_futures.insert(future.id.clone()) {
            out.push(future.clone());
        }
    }
}

/// Every module in the tree, root included, keyed by id.
#[must_use]
pub fn collect_modules(module: &IgnitionModule) -> BTreeMap<String, &IgnitionModule> {
    let mut out = BTreeMap::new();
    let mut stack = vec![module];
    while let Some(current) = stack.pop() {
        if out.insert(current.id.clone(), current).is_none() {
            stack.extend(current.submodules.iter().map(|m| &**m));
        }
    }
    out
}

/// Parameters bound with `use_module_with`, keyed by module id.
#[must_use]
pub fn module_parameter_bindings(module: &IgnitionModule) -> BTreeMap<String, ModuleParameters> {
    collect_modules(module)
        .into_iter()
        .filter(|(_, m)| !m.parameters.is_empty())
        .map(|(id, m)| (id, m.parameters.clone()))
        .collect()
}

/// Future-level dependency graph of a module tree.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    futures: BTreeMap<String, FutureRef>,
    dependencies: BTreeMap<String, BTreeSet<String>>,
    dependents: BTreeMap<String, BTreeSet<String>>,
}

impl DependencyGraph {
    /// Builds the graph for `module`.
    #[must_use]
    pub fn new(module: &IgnitionModule) -> Self {
        let all = collect_futures(module);
        let mut futures = BTreeMap::new();
        let mut dependencies: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        let mut dependents: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        for future in &all {
            futures.insert(future.id.clone(), future.clone());
            dependencies.entry(future.id.clone()).or_default();
            dependents.entry(future.id.clone()).or_default();
        }

        for future in &all {
            let mut targets = BTreeSet::new();
            for dependency in &future.dependencies {
                match dependency {
                    Dependency::Future(target) => {
                        targets.insert(target.id.clone());
                    }
                    Dependency::Module(submodule) => {
                        targets.extend(collect_futures(submodule).into_iter().map(|f| f.id.clone()));
                    }
                }
            }
            for target in &targets {
                dependents.entry(target.clone()).or_default().insert(future.id.clone());
            }
            dependencies.insert(future.id.clone(), targets);
        }

        Self {
            futures,
            dependencies,
            dependents,
        }
    }

    /// Number of futures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.futures.len()
    }

    /// True if the tree has no futures.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.futures.is_empty()
    }

    /// Looks up a future.
    #[must_use]
    pub fn future(&self, id: &str) -> Option<&FutureRef> {
        self.futures.get(id)
    }

    /// All futures ordered by id.
    pub fn futures(&self) -> impl Iterator<Item = &FutureRef> {
        self.futures.values()
    }

    /// Direct dependencies of `id`, with module dependencies expanded.
    #[must_use]
    pub fn dependencies_of(&self, id: &str) -> Option<&BTreeSet<String>> {
        self.dependencies.get(id)
    }

    /// Futures that depend directly on `id`.
    #[must_use]
    pub fn dependents_of(&self, id: &str) -> Option<&BTreeSet<String>> {
        self.dependents.get(id)
    }

    /// Every future that transitively depends on `id`.
    #[must_use]
    pub fn transitive_dependents(&self, id: &str) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        let mut stack = vec![id.to_string()];
        while let Some(current) = stack.pop() {
            if let Some(dependents) = self.dependents.get(&current) {
                for dependent in dependents {
                    if out.insert(dependent.clone()) {
                        stack.push(dependent.clone());
                    }
                }
            }
        }
        out
    }

    /// Kahn batches: each batch only depends on earlier batches. Ids within
    /// a batch are sorted.
    #[must_use]
    pub fn topological_batches(&self) -> Vec<Vec<String>> {
        let mut remaining: BTreeMap<&str, usize> = self
            .dependencies
            .iter()
            .map(|(id, deps)| (id.as_str(), deps.len()))
            .collect();
        let mut batches = Vec::new();

        loop {
            let ready: Vec<String> = remaining
                .iter()
                .filter(|(_, count)| **count == 0)
                .map(|(id, _)| (*id).to_string())
                .collect();
            if ready.is_empty() {
                break;
            }
            for id in &ready {
                remaining.remove(id.as_str());
                if let Some(dependents) = self.dependents.get(id) {
                    for dependent in dependents {
                        if let Some(count) = remaining.get_mut(dependent.as_str()) {
                            *count -= 1;
                        }
                    }
                }
            }
            batches.push(ready);
        }

        batches
    }

    /// Topological order, flattened from [`Self::topological_batches`].
    #[must_use]
    pub fn topological_order(&self) -> Vec<String> {
        self.topological_batches().into_iter().flatten().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{After, CallOptions, ContractOptions};
    use crate::constructor::{build, build_module, ModuleResults};

    #[test]
    fn test_module_dependency_expands_to_all_futures() {
        let inner = build_module("Inner", |m| {
            let a = m.contract("A", vec![], ContractOptions::default())?;
            m.call(&a, "init", vec![], CallOptions::default())?;
            Ok(ModuleResults::from([("a".to_string(), a)]))
        });
        let root = build_module("Root", move |m| {
            let handle = m.use_module(&inner)?;
            let b = m.contract("B", vec![], ContractOptions::default().after(After::from(&handle)))?;
            Ok(ModuleResults::from([("b".to_string(), b)]))
        });

        let module = build(&root).unwrap();
        let graph = DependencyGraph::new(&module);

        let deps: Vec<_> = graph.dependencies_of("Root#B").unwrap().iter().cloned().collect();
        assert_eq!(deps, vec!["Inner#A".to_string(), "Inner#A.init".to_string()]);
        assert_eq!(
            graph.topological_batches(),
            vec![
                vec!["Inner#A".to_string()],
                vec!["Inner#A.init".to_string()],
                vec!["Root#B".to_string()],
            ]
        );
    }

    #[test]
    fn test_transitive_dependents() {
        let root = build_module("Root", |m| {
            let a = m.contract("A", vec![], ContractOptions::default())?;
            let b = m.contract("B", vec![(&a).into()], ContractOptions::default())?;
            m.contract("C", vec![(&b).into()], ContractOptions::default())?;
            m.contract("D", vec![], ContractOptions::default())?;
            Ok(ModuleResults::new())
        });

        let module = build(&root).unwrap();
        let graph = DependencyGraph::new(&module);
        let dependents: Vec<_> = graph.transitive_dependents("Root#A").into_iter().collect();
        assert_eq!(dependents, vec!["Root#B".to_string(), "Root#C".to_string()]);
        assert_eq!(graph.topological_batches()[0], vec!["Root#A".to_string(), "Root#D".to_string()]);
    }

    #[test]
    fn test_shared_submodule_is_collected_once() {
        let shared = build_module("Shared", |m| {
            let s = m.contract("S", vec![], ContractOptions::default())?;
            Ok(ModuleResults::from([("s".to_string(), s)]))
        });
        let left_shared = shared.clone();
        let left = build_module("Left", move |m| {
            m.use_module(&left_shared)?;
            Ok(ModuleResults::new())
        });
        let root = build_module("Root", move |m| {
            m.use_module(&left)?;
            m.use_module(&shared)?;
            Ok(ModuleResults::new())
        });

        let module = build(&root).unwrap();
        assert_eq!(collect_futures(&module).len(), 1);
        assert_eq!(collect_modules(&module).len(), 3);
    }
}
