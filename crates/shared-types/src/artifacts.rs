//! # Artifacts
//!
//! Compiled-contract descriptors and the port through which the deployment
//! core looks them up. The core never reads artifacts from disk; the build
//! system hands them over through an [`ArtifactResolver`].

use crate::errors::ArtifactError;
use alloy_json_abi::JsonAbi;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Position of a library address placeholder inside the bytecode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkReference {
    /// Byte offset into the bytecode.
    pub start: usize,
    /// Placeholder length in bytes (always 20).
    pub length: usize,
}

/// Placeholders keyed by source file, then by library name.
pub type LinkReferences = BTreeMap<String, BTreeMap<String, Vec<LinkReference>>>;

/// A compiled contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    /// Contract name as declared in source.
    pub contract_name: String,
    /// Source file the contract was compiled from.
    pub source_name: String,
    /// Contract ABI.
    pub abi: JsonAbi,
    /// Creation bytecode, `0x` hex, possibly with unlinked placeholders.
    pub bytecode: String,
    /// Runtime bytecode, `0x` hex.
    #[serde(default)]
    pub deployed_bytecode: String,
    /// Library placeholders in `bytecode`.
    #[serde(default)]
    pub link_references: LinkReferences,
}

impl Artifact {
    /// Fully qualified name, `source:Contract`.
    #[must_use]
    pub fn fully_qualified_name(&self) -> String {
        format!("{}:{}", self.source_name, self.contract_name)
    }

    /// Every library referenced by the bytecode as `(source, name)` pairs.
    pub fn library_references(&self) -> impl Iterator<Item = (&str, &str)> {
        self.link_references.iter().flat_map(|(source, libs)| {
            libs.keys()
                .map(move |name| (source.as_str(), name.as_str()))
        })
    }
}

/// Artifact lookup capability.
#[async_trait]
pub trait ArtifactResolver: Send + Sync {
    /// Returns true if an artifact named `name` is available.
    async fn has_artifact(&self, name: &str) -> Result<bool, ArtifactError>;

    /// Loads the artifact named `name`.
    async fn get_artifact(&self, name: &str) -> Result<Artifact, ArtifactError>;
}

#[async_trait]
impl<T: ArtifactResolver + ?Sized> ArtifactResolver for Arc<T> {
    async fn has_artifact(&self, name: &str) -> Result<bool, ArtifactError> {
        (**self).has_artifact(name).await
    }

    async fn get_artifact(&self, name: &str) -> Result<Artifact, ArtifactError> {
        (**self).get_artifact(name).await
    }
}

/// In-memory artifact store for tests and embedding.
///
/// Artifacts are registered under their contract name and their fully
/// qualified name.
#[derive(Debug, Default)]
pub struct InMemoryArtifacts {
    artifacts: RwLock<HashMap<String, Artifact>>,
}

impl InMemoryArtifacts {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an artifact.
    pub fn insert(&self, artifact: Artifact) {
        let mut artifacts = self.artifacts.write();
        artifacts.insert(artifact.fully_qualified_name(), artifact.clone());
        artifacts.insert(artifact.contract_name.clone(), artifact);
    }

    /// Builder-style registration.
    #[must_use]
    pub fn with(self, artifact: Artifact) -> Self {
        self.insert(artifact);
        self
    }
}

#[async_trait]
impl ArtifactResolver for InMemoryArtifacts {
    async fn has_artifact(&self, name: &str) -> Result<bool, ArtifactError> {
        Ok(self.artifacts.read().contains_key(name))
    }

    async fn get_artifact(&self, name: &str) -> Result<Artifact, ArtifactError> {
        self.artifacts
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| ArtifactError::NotFound(name.to_string()))
    }
}
