//! # Futures
//!
//! A future is one node of the deployment graph: a deployment, a call, a
//! read, or a transfer that will happen when the deployment runs.
//!
//! Kinds are a closed sum type; every consumer matches on [`FutureKind`]
//! exhaustively.

use super::arguments::{AddressArgument, AmountArgument, Argument, DataArgument, SenderArgument};
use super::module::IgnitionModule;
use serde::{Deserialize, Serialize};
use shared_types::{Artifact, NameOrIndex};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Shared reference to a built future.
pub type FutureRef = Arc<Future>;

// =============================================================================
// FUTURE TYPE
// =============================================================================

/// Discriminant of a future, as persisted and reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FutureType {
    /// Deployment of a contract looked up by name.
    ContractDeployment,
    /// Deployment of a contract from a supplied artifact.
    ArtifactContractDeployment,
    /// Deployment of a library looked up by name.
    LibraryDeployment,
    /// Deployment of a library from a supplied artifact.
    ArtifactLibraryDeployment,
    /// Existing contract looked up by name.
    ContractAt,
    /// Existing contract with a supplied artifact.
    ArtifactContractAt,
    /// State-changing function call.
    #[serde(rename = "CALL")]
    ContractCall,
    /// Read-only function call.
    StaticCall,
    /// Raw transfer.
    SendData,
    /// Argument of an event emitted by an earlier transaction.
    ReadEventArgument,
    /// Calldata for a function call.
    EncodeFunctionCall,
}

impl FutureType {
    /// Deployments, libraries and existing contracts. These are the only
    /// futures a module may return and the only ones usable as libraries.
    #[must_use]
    pub fn is_contract(self) -> bool {
        matches!(
            self,
            Self::ContractDeployment
                | Self::ArtifactContractDeployment
                | Self::LibraryDeployment
                | Self::ArtifactLibraryDeployment
                | Self::ContractAt
                | Self::ArtifactContractAt
        )
    }

    /// Contracts whose functions can be called. Libraries are excluded.
    #[must_use]
    pub fn is_callable_contract(self) -> bool {
        matches!(
            self,
            Self::ContractDeployment
                | Self::ArtifactContractDeployment
                | Self::ContractAt
                | Self::ArtifactContractAt
        )
    }

    /// Futures that produce a value usable as an argument.
    #[must_use]
    pub fn produces_value(self) -> bool {
        self.is_contract()
            || matches!(
                self,
                Self::StaticCall | Self::ReadEventArgument | Self::EncodeFunctionCall
            )
    }

    /// Futures that can supply an address.
    #[must_use]
    pub fn produces_address(self) -> bool {
        self.is_contract() || matches!(self, Self::StaticCall | Self::ReadEventArgument)
    }

    /// Futures that send a transaction and therefore have a receipt.
    #[must_use]
    pub fn has_receipt(self) -> bool {
        matches!(
            self,
            Self::ContractDeployment
                | Self::ArtifactContractDeployment
                | Self::LibraryDeployment
                | Self::ArtifactLibraryDeployment
                | Self::ContractCall
                | Self::SendData
        )
    }

    /// Persisted name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ContractDeployment => "CONTRACT_DEPLOYMENT",
            Self::ArtifactContractDeployment => "ARTIFACT_CONTRACT_DEPLOYMENT",
            Self::LibraryDeployment => "LIBRARY_DEPLOYMENT",
            Self::ArtifactLibraryDeployment => "ARTIFACT_LIBRARY_DEPLOYMENT",
            Self::ContractAt => "CONTRACT_AT",
            Self::ArtifactContractAt => "ARTIFACT_CONTRACT_AT",
            Self::ContractCall => "CALL",
            Self::StaticCall => "STATIC_CALL",
            Self::SendData => "SEND_DATA",
            Self::ReadEventArgument => "READ_EVENT_ARGUMENT",
            Self::EncodeFunctionCall => "ENCODE_FUNCTION_CALL",
        }
    }
}

impl fmt::Display for FutureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// FUTURE KINDS
// =============================================================================

/// Deploys a contract.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractDeployment<F> {
    /// Contract name, also the artifact name when `artifact` is absent.
    pub contract_name: String,
    /// Supplied artifact.
    pub artifact: Option<Artifact>,
    /// Constructor arguments.
    pub constructor_args: Vec<Argument<F>>,
    /// Library name → library future.
    pub libraries: BTreeMap<String, F>,
    /// Wei sent with the deployment.
    pub value: AmountArgument<F>,
    /// Sender.
    pub from: Option<SenderArgument>,
}

/// Deploys a library.
#[derive(Debug, Clone, PartialEq)]
pub struct LibraryDeployment<F> {
    /// Library name, also the artifact name when `artifact` is absent.
    pub contract_name: String,
    /// Supplied artifact.
    pub artifact: Option<Artifact>,
    /// Library name → library future.
    pub libraries: BTreeMap<String, F>,
    /// Sender.
    pub from: Option<SenderArgument>,
}

/// Refers to a contract that already exists.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractAt<F> {
    /// Contract name, also the artifact name when `artifact` is absent.
    pub contract_name: String,
    /// Supplied artifact.
    pub artifact: Option<Artifact>,
    /// Where the contract lives.
    pub address: AddressArgument<F>,
}

/// Sends a transaction calling a contract function.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractCall<F> {
    /// Target contract future.
    pub contract: F,
    /// Bare function name or full signature.
    pub function_name: String,
    /// Function arguments.
    pub args: Vec<Argument<F>>,
    /// Wei sent with the call.
    pub value: AmountArgument<F>,
    /// Sender.
    pub from: Option<SenderArgument>,
}

/// Calls a `view`/`pure` function and keeps one return value.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticCall<F> {
    /// Target contract future.
    pub contract: F,
    /// Bare function name or full signature.
    pub function_name: String,
    /// Function arguments.
    pub args: Vec<Argument<F>>,
    /// Which return value to keep.
    pub name_or_index: NameOrIndex,
    /// Sender.
    pub from: Option<SenderArgument>,
}

/// Sends wei and/or raw data.
#[derive(Debug, Clone, PartialEq)]
pub struct SendData<F> {
    /// Recipient.
    pub to: AddressArgument<F>,
    /// Wei sent.
    pub value: AmountArgument<F>,
    /// Calldata.
    pub data: Option<DataArgument<F>>,
    /// Sender.
    pub from: Option<SenderArgument>,
}

/// Reads an argument of an event emitted by an earlier transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadEventArgument<F> {
    /// The deployment or call whose receipt holds the event.
    pub future_to_read_from: F,
    /// Bare event name or full signature.
    pub event_name: String,
    /// Which event argument to read.
    pub name_or_index: NameOrIndex,
    /// Contract that emitted the event.
    pub emitter: F,
    /// Which of the matching logs to read.
    pub event_index: usize,
}

/// Produces calldata without sending anything.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeFunctionCall<F> {
    /// Target contract future.
    pub contract: F,
    /// Bare function name or full signature.
    pub function_name: String,
    /// Function arguments.
    pub args: Vec<Argument<F>>,
}

/// Kind-specific data of a future.
#[derive(Debug, Clone, PartialEq)]
pub enum FutureKind<F = FutureRef> {
    /// See [`ContractDeployment`].
    ContractDeployment(ContractDeployment<F>),
    /// See [`LibraryDeployment`].
    LibraryDeployment(LibraryDeployment<F>),
    /// See [`ContractAt`].
    ContractAt(ContractAt<F>),
    /// See [`ContractCall`].
    Call(ContractCall<F>),
    /// See [`StaticCall`].
    StaticCall(StaticCall<F>),
    /// See [`SendData`].
    SendData(SendData<F>),
    /// See [`ReadEventArgument`].
    ReadEventArgument(ReadEventArgument<F>),
    /// See [`EncodeFunctionCall`].
    EncodeFunctionCall(EncodeFunctionCall<F>),
}

fn map_args<F, G, E>(
    args: Vec<Argument<F>>,
    f: &mut impl FnMut(F) -> Result<G, E>,
) -> Result<Vec<Argument<G>>, E> {
    args.into_iter().map(|a| a.try_map(f)).collect()
}

fn map_libraries<F, G, E>(
    libraries: BTreeMap<String, F>,
    f: &mut impl FnMut(F) -> Result<G, E>,
) -> Result<BTreeMap<String, G>, E> {
    libraries
        .into_iter()
        .map(|(name, lib)| Ok((name, f(lib)?)))
        .collect()
}

impl<F> FutureKind<F> {
    /// The persisted discriminant.
    #[must_use]
    pub fn future_type(&self) -> FutureType {
        match self {
            Self::ContractDeployment(d) if d.artifact.is_some() => FutureType::ArtifactContractDeployment,
            Self::ContractDeployment(_) => FutureType::ContractDeployment,
            Self::LibraryDeployment(d) if d.artifact.is_some() => FutureType::ArtifactLibraryDeployment,
            Self::LibraryDeployment(_) => FutureType::LibraryDeployment,
            Self::ContractAt(c) if c.artifact.is_some() => FutureType::ArtifactContractAt,
            Self::ContractAt(_) => FutureType::ContractAt,
            Self::Call(_) => FutureType::ContractCall,
            Self::StaticCall(_) => FutureType::StaticCall,
            Self::SendData(_) => FutureType::SendData,
            Self::ReadEventArgument(_) => FutureType::ReadEventArgument,
            Self::EncodeFunctionCall(_) => FutureType::EncodeFunctionCall,
        }
    }

    /// Contract name for contract futures.
    #[must_use]
    pub fn contract_name(&self) -> Option<&str> {
        match self {
            Self::ContractDeployment(d) => Some(&d.contract_name),
            Self::LibraryDeployment(d) => Some(&d.contract_name),
            Self::ContractAt(c) => Some(&c.contract_name),
            _ => None,
        }
    }

    /// Supplied artifact, for the artifact variants.
    #[must_use]
    pub fn artifact(&self) -> Option<&Artifact> {
        match self {
            Self::ContractDeployment(d) => d.artifact.as_ref(),
            Self::LibraryDeployment(d) => d.artifact.as_ref(),
            Self::ContractAt(c) => c.artifact.as_ref(),
            _ => None,
        }
    }

    /// Sender, for futures that send a transaction or static call.
    #[must_use]
    pub fn sender(&self) -> Option<&SenderArgument> {
        match self {
            Self::ContractDeployment(d) => d.from.as_ref(),
            Self::LibraryDeployment(d) => d.from.as_ref(),
            Self::Call(c) => c.from.as_ref(),
            Self::StaticCall(c) => c.from.as_ref(),
            Self::SendData(s) => s.from.as_ref(),
            Self::ContractAt(_) | Self::ReadEventArgument(_) | Self::EncodeFunctionCall(_) => None,
        }
    }

    /// Calls `visit` for every future referenced by this kind's data, in
    /// field order.
    pub fn visit_futures<'a>(&'a self, visit: &mut impl FnMut(&'a F)) {
        match self {
            Self::ContractDeployment(d) => {
                d.constructor_args.iter().for_each(|a| a.visit_futures(visit));
                d.libraries.values().for_each(&mut *visit);
                d.value.future().into_iter().for_each(&mut *visit);
            }
            Self::LibraryDeployment(d) => d.libraries.values().for_each(&mut *visit),
            Self::ContractAt(c) => c.address.future().into_iter().for_each(&mut *visit),
            Self::Call(c) => {
                visit(&c.contract);
                c.args.iter().for_each(|a| a.visit_futures(visit));
                c.value.future().into_iter().for_each(&mut *visit);
            }
            Self::StaticCall(c) => {
                visit(&c.contract);
                c.args.iter().for_each(|a| a.visit_futures(visit));
            }
            Self::SendData(s) => {
                s.to.future().into_iter().for_each(&mut *visit);
                s.value.future().into_iter().for_each(&mut *visit);
                if let Some(DataArgument::EncodedCall(f)) = &s.data {
                    visit(f);
                }
            }
            Self::ReadEventArgument(r) => {
                visit(&r.future_to_read_from);
                visit(&r.emitter);
            }
            Self::EncodeFunctionCall(e) => {
                visit(&e.contract);
                e.args.iter().for_each(|a| a.visit_futures(visit));
            }
        }
    }

    /// Converts every future reference.
    pub fn try_map<G, E>(self, f: &mut impl FnMut(F) -> Result<G, E>) -> Result<FutureKind<G>, E> {
        Ok(match self {
            Self::ContractDeployment(d) => FutureKind::ContractDeployment(ContractDeployment {
                contract_name: d.contract_name,
                artifact: d.artifact,
                constructor_args: map_args(d.constructor_args, f)?,
                libraries: map_libraries(d.libraries, f)?,
                value: d.value.try_map(f)?,
                from: d.from,
            }),
            Self::LibraryDeployment(d) => FutureKind::LibraryDeployment(LibraryDeployment {
                contract_name: d.contract_name,
                artifact: d.artifact,
                libraries: map_libraries(d.libraries, f)?,
                from: d.from,
            }),
            Self::ContractAt(c) => FutureKind::ContractAt(ContractAt {
                contract_name: c.contract_name,
                artifact: c.artifact,
                address: c.address.try_map(f)?,
            }),
            Self::Call(c) => FutureKind::Call(ContractCall {
                contract: f(c.contract)?,
                function_name: c.function_name,
                args: map_args(c.args, f)?,
                value: c.value.try_map(f)?,
                from: c.from,
            }),
            Self::StaticCall(c) => FutureKind::StaticCall(StaticCall {
                contract: f(c.contract)?,
                function_name: c.function_name,
                args: map_args(c.args, f)?,
                name_or_index: c.name_or_index,
                from: c.from,
            }),
            Self::SendData(s) => FutureKind::SendData(SendData {
                to: s.to.try_map(f)?,
                value: s.value.try_map(f)?,
                data: s.data.map(|d| d.try_map(f)).transpose()?,
                from: s.from,
            }),
            Self::ReadEventArgument(r) => FutureKind::ReadEventArgument(ReadEventArgument {
                future_to_read_from: f(r.future_to_read_from)?,
                event_name: r.event_name,
                name_or_index: r.name_or_index,
                emitter: f(r.emitter)?,
                event_index: r.event_index,
            }),
            Self::EncodeFunctionCall(e) => FutureKind::EncodeFunctionCall(EncodeFunctionCall {
                contract: f(e.contract)?,
                function_name: e.function_name,
                args: map_args(e.args, f)?,
            }),
        })
    }
}

// =============================================================================
// BUILT FUTURE
// =============================================================================

/// A dependency edge target.
#[derive(Clone, PartialEq)]
pub enum Dependency {
    /// Another future.
    Future(FutureRef),
    /// Every future of a module.
    Module(Arc<IgnitionModule>),
}

impl Dependency {
    /// Id of the future or module.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Future(f) => &f.id,
            Self::Module(m) => &m.id,
        }
    }
}

impl fmt::Debug for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Future(fut) => write!(f, "Future({})", fut.id),
            Self::Module(m) => write!(f, "Module({})", m.id),
        }
    }
}

/// A built, immutable future.
#[derive(Debug, Clone, PartialEq)]
pub struct Future {
    /// `ModuleId#LocalId`.
    pub id: String,
    /// Owning module id.
    pub module_id: String,
    /// Futures and modules that must succeed first. No duplicates.
    pub dependencies: Vec<Dependency>,
    /// Kind-specific data.
    pub kind: FutureKind,
}

impl Future {
    /// The persisted discriminant.
    #[must_use]
    pub fn future_type(&self) -> FutureType {
        self.kind.future_type()
    }

    /// Ids of the futures this one depends on directly.
    pub fn dependency_ids(&self) -> impl Iterator<Item = &str> {
        self.dependencies.iter().map(Dependency::id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_serializes_with_persisted_names() {
        assert_eq!(serde_json::to_string(&FutureType::ContractCall).unwrap(), "\"CALL\"");
        assert_eq!(
            serde_json::to_string(&FutureType::ArtifactContractAt).unwrap(),
            "\"ARTIFACT_CONTRACT_AT\""
        );
        assert_eq!(FutureType::ReadEventArgument.to_string(), "READ_EVENT_ARGUMENT");
    }

    #[test]
    fn test_type_classification() {
        assert!(FutureType::LibraryDeployment.is_contract());
        assert!(!FutureType::LibraryDeployment.is_callable_contract());
        assert!(!FutureType::ContractCall.produces_value());
        assert!(FutureType::StaticCall.produces_address());
        assert!(FutureType::SendData.has_receipt());
        assert!(!FutureType::ContractAt.has_receipt());
    }

    #[test]
    fn test_kind_type_tracks_artifact() {
        let kind: FutureKind<String> = FutureKind::ContractAt(ContractAt {
            contract_name: "Token".to_string(),
            artifact: None,
            address: AddressArgument::Literal("0x0".to_string()),
        });
        assert_eq!(kind.future_type(), FutureType::ContractAt);
        assert_eq!(kind.contract_name(), Some("Token"));
    }
}
