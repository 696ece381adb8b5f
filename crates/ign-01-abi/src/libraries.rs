//! # Library Linking
//!
//! Matches user-supplied library names against an artifact's link
//! references and substitutes deployed addresses into the bytecode.
//!
//! Library names may be bare (`Math`) or fully qualified
//! (`contracts/Math.sol:Math`). A bare name must match exactly one
//! referenced library.

use crate::errors::AbiError;
use shared_types::{from_hex, Address, Artifact};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Resolves each provided library name to a fully qualified name.
///
/// Fails if a name is unneeded, ambiguous, given twice, or if a referenced
/// library is left without a name.
pub fn resolve_library_names<'a, I>(
    artifact: &Artifact,
    provided: I,
) -> Result<BTreeMap<String, String>, AbiError>
where
    I: IntoIterator<Item = &'a str>,
{
    let contract = artifact.contract_name.as_str();
    let referenced: Vec<(String, &str)> = artifact
        .library_references()
        .map(|(source, name)| (format!("{source}:{name}"), name))
        .collect();

    let mut resolved = BTreeMap::new();
    let mut covered = BTreeSet::new();

    for given in provided {
        let fqn = if given.contains(':') {
            referenced
                .iter()
                .find(|(fqn, _)| fqn == given)
                .map(|(fqn, _)| fqn.clone())
                .ok_or_else(|| AbiError::UnneededLibrary {
                    contract: contract.to_string(),
                    library: given.to_string(),
                })?
        } else {
            let matches: Vec<&String> = referenced
                .iter()
                .filter(|(_, name)| *name == given)
                .map(|(fqn, _)| fqn)
                .collect();
            match matches.as_slice() {
                [] => {
                    return Err(AbiError::UnneededLibrary {
                        contract: contract.to_string(),
                        library: given.to_string(),
                    })
                }
                [one] => (*one).clone(),
                many => {
                    return Err(AbiError::AmbiguousLibrary {
                        contract: contract.to_string(),
                        library: given.to_string(),
                        candidates: many.iter().map(|s| (*s).clone()).collect(),
                    })
                }
            }
        };

        if !covered.insert(fqn.clone()) {
            return Err(AbiError::DuplicateLibrary {
                contract: contract.to_string(),
                library: fqn,
            });
        }
        resolved.insert(given.to_string(), fqn);
    }

    let missing: Vec<String> = referenced
        .into_iter()
        .map(|(fqn, _)| fqn)
        .filter(|fqn| !covered.contains(fqn))
        .collect();
    if !missing.is_empty() {
        return Err(AbiError::MissingLibraries {
            contract: contract.to_string(),
            libraries: missing,
        });
    }

    Ok(resolved)
}

/// Returns the artifact's creation bytecode with every placeholder replaced.
pub fn link_bytecode(
    artifact: &Artifact,
    libraries: &BTreeMap<String, Address>,
) -> Result<Vec<u8>, AbiError> {
    let names = resolve_library_names(artifact, libraries.keys().map(String::as_str))?;

    let hex_body = artifact
        .bytecode
        .strip_prefix("0x")
        .unwrap_or(&artifact.bytecode);
    let mut linked = hex_body.to_string();

    for (given, address) in libraries {
        let Some(fqn) = names.get(given) else {
            continue;
        };
        let Some((source, name)) = fqn.rsplit_once(':') else {
            continue;
        };
        let Some(references) = artifact
            .link_references
            .get(source)
            .and_then(|libs| libs.get(name))
        else {
            continue;
        };

        let replacement = hex::encode(address.as_bytes());
        for reference in references {
            let start = reference.start * 2;
            let end = start + reference.length * 2;
            if end > linked.len() || reference.length != 20 {
                return Err(AbiError::InvalidBytecode {
                    contract: artifact.contract_name.clone(),
                    reason: format!("link reference for {fqn} at {} is out of bounds", reference.start),
                });
            }
            linked.replace_range(start..end, &replacement);
        }
        debug!(library = %fqn, %address, "Linked library");
    }

    from_hex(&format!("0x{linked}")).map_err(|e| AbiError::InvalidBytecode {
        contract: artifact.contract_name.clone(),
        reason: e.to_string(),
    })
}
