//! # Module Constructor
//!
//! Runs module definitions and caches the result per module id. A module
//! used several times in one graph is built once; every user gets the same
//! `Arc<IgnitionModule>`.

use crate::builder::{is_valid_id, FutureToken, ModuleBuilder};
use crate::domain::IgnitionModule;
use crate::errors::BuildError;
use shared_types::{keccak256, ModuleParameters};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Builder ids are unique per process so tokens from unrelated builds never
/// alias.
static NEXT_BUILDER_ID: AtomicU64 = AtomicU64::new(0);

/// Named results a module definition returns.
pub type ModuleResults = BTreeMap<String, FutureToken>;

type BuildFn = dyn Fn(&mut ModuleBuilder<'_>) -> Result<ModuleResults, BuildError> + Send + Sync;

/// A module id plus the function that declares its futures.
#[derive(Clone)]
pub struct ModuleDefinition {
    id: String,
    build: Arc<BuildFn>,
}

impl ModuleDefinition {
    /// Module id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Debug for ModuleDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleDefinition").field("id", &self.id).finish()
    }
}

/// Creates a module definition. Nothing runs until the module is built.
pub fn build_module<F>(id: impl Into<String>, build: F) -> ModuleDefinition
where
    F: Fn(&mut ModuleBuilder<'_>) -> Result<ModuleResults, BuildError> + Send + Sync + 'static,
{
    ModuleDefinition {
        id: id.into(),
        build: Arc::new(build),
    }
}

/// Builds a module and all of its submodules.
pub fn build(definition: &ModuleDefinition) -> Result<Arc<IgnitionModule>, BuildError> {
    ModuleConstructor::new().construct(definition)
}

struct CachedModule {
    parameters_hash: String,
    module: Arc<IgnitionModule>,
}

/// Builds modules, caching them by id for the lifetime of the constructor.
#[derive(Default)]
pub struct ModuleConstructor {
    cache: HashMap<String, CachedModule>,
    in_progress: Vec<String>,
}

impl ModuleConstructor {
    /// Creates an empty constructor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds `definition` without bound parameters.
    pub fn construct(&mut self, definition: &ModuleDefinition) -> Result<Arc<IgnitionModule>, BuildError> {
        self.construct_with(definition, ModuleParameters::new())
    }

    /// Builds `definition` with parameters bound by the caller, or returns
    /// the cached module. A cached module bound to different parameters is
    /// an error.
    pub fn construct_with(
        &mut self,
        definition: &ModuleDefinition,
        parameters: ModuleParameters,
    ) -> Result<Arc<IgnitionModule>, BuildError> {
        if !is_valid_id(&definition.id) {
            return Err(BuildError::InvalidId(definition.id.clone()));
        }

        let parameters_hash = parameters_hash(&parameters);
        if let Some(cached) = self.cache.get(&definition.id) {
            if cached.parameters_hash != parameters_hash {
                return Err(BuildError::ConflictingModuleParameters {
                    module: definition.id.clone(),
                });
            }
            return Ok(Arc::clone(&cached.module));
        }

        if self.in_progress.contains(&definition.id) {
            let mut path = self.in_progress.clone();
            path.push(definition.id.clone());
            return Err(BuildError::CyclicModule {
                module: definition.id.clone(),
                path,
            });
        }

        self.in_progress.push(definition.id.clone());
        let built = self.run(definition, parameters);
        self.in_progress.pop();

        let module = Arc::new(built?);
        debug!(
            module = %module.id,
            futures = module.futures.len(),
            submodules = module.submodules.len(),
            "Module built"
        );
        self.cache.insert(
            definition.id.clone(),
            CachedModule {
                parameters_hash,
                module: Arc::clone(&module),
            },
        );
        Ok(module)
    }

    fn run(&mut self, definition: &ModuleDefinition, parameters: ModuleParameters) -> Result<IgnitionModule, BuildError> {
        let builder_id = NEXT_BUILDER_ID.fetch_add(1, Ordering::Relaxed);

        let mut builder = ModuleBuilder::new(definition.id.clone(), builder_id, self);
        let results = (definition.build)(&mut builder)?;
        builder.finish(results, parameters)
    }
}

/// Hex keccak of the tagged parameters in key order.
fn parameters_hash(parameters: &ModuleParameters) -> String {
    let mut canonical = String::new();
    for (name, value) in parameters {
        canonical.push_str(&format!("{}:{name}={};", name.len(), value.to_tagged_json()));
    }
    keccak256(canonical.as_bytes()).to_string()
}
