//! # Module Serialization
//!
//! A flat JSON form of a module tree. Futures and modules are stored once,
//! keyed by id, and refer to each other by id. Deserializing rebuilds the
//! shared `Arc` structure, so a future used by several dependants is one
//! object again.
//!
//! ```text
//! {
//!   "startModule": "Root",
//!   "modules": { "<id>": { id, futures, submodules, results, parameters } },
//!   "futures": { "<id>": { id, type, moduleId, dependencies, ...fields } }
//! }
//! ```
//!
//! Integers, including parameter values and defaults, are written as
//! `{"_kind": "bigint", "value": "<decimal>"}` so no precision is lost and a
//! string never reads back as a number. Futures, accounts and module parameters appear as
//! `_kind`-tagged objects; struct arguments are wrapped in
//! `{"_kind": "object", "value": {...}}` so they can never be mistaken for a
//! tagged value.

use crate::domain::{
    AccountRuntimeValue, AddressArgument, AmountArgument, Argument, ContractAt, ContractCall,
    ContractDeployment, DataArgument, Dependency, EncodeFunctionCall, Future, FutureKind, FutureRef,
    IgnitionModule, LibraryDeployment, ModuleParameterRuntimeValue, ReadEventArgument, SendData,
    SenderArgument, StaticCall,
};
use crate::errors::SerializationError;
use crate::graph::{collect_futures, collect_modules};
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};
use shared_types::{Artifact, ModuleParameters, NameOrIndex, ParameterValue};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::convert::Infallible;
use std::sync::Arc;

// =============================================================================
// DOCUMENT
// =============================================================================

/// Serialized module tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedModuleGraph {
    /// Root module id.
    pub start_module: String,
    /// Every module in the tree.
    pub modules: BTreeMap<String, SerializedModule>,
    /// Every future in the tree.
    pub futures: BTreeMap<String, SerializedFuture>,
}

/// Serialized module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedModule {
    /// Module id.
    pub id: String,
    /// Ids of the module's own futures, in creation order.
    pub futures: Vec<String>,
    /// Ids of used submodules.
    pub submodules: Vec<String>,
    /// Result key → future id.
    pub results: BTreeMap<String, String>,
    /// Parameters bound by the parent.
    #[serde(default, with = "shared_types::parameters::tagged")]
    pub parameters: ModuleParameters,
}

/// Serialized future.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedFuture {
    /// Future id.
    pub id: String,
    /// Owning module id.
    pub module_id: String,
    /// Dependency edges.
    pub dependencies: Vec<SerializedDependency>,
    /// Type tag plus kind-specific fields.
    #[serde(flatten)]
    pub kind: SerializedKind,
}

/// Dependency edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_kind", rename_all_fields = "camelCase")]
pub enum SerializedDependency {
    /// Edge to a future.
    FutureToken {
        /// Target future id.
        future_id: String,
    },
    /// Edge to every future of a module.
    ModuleToken {
        /// Target module id.
        module_id: String,
    },
}

/// Argument or option value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SerializedArgument {
    /// `bool`.
    Bool(bool),
    /// String, address or hex.
    String(String),
    /// Array or positional tuple.
    Array(Vec<SerializedArgument>),
    /// Any `_kind`-tagged value.
    Tagged(TaggedArgument),
}

/// Values that need a `_kind` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_kind", rename_all_fields = "camelCase")]
pub enum TaggedArgument {
    /// Integer as a decimal string.
    #[serde(rename = "bigint")]
    BigInt {
        /// Decimal digits, optionally signed.
        value: String,
    },
    /// Struct given by field name.
    #[serde(rename = "object")]
    Object {
        /// Fields.
        value: BTreeMap<String, SerializedArgument>,
    },
    /// Reference to a future.
    FutureToken {
        /// Future id.
        future_id: String,
    },
    /// Signer account.
    AccountRuntimeValue {
        /// Position in the accounts list.
        account_index: i64,
    },
    /// Module parameter.
    ModuleParameterRuntimeValue {
        /// Declaring module.
        module_id: String,
        /// Parameter name.
        name: String,
        /// Default value.
        #[serde(
            default,
            skip_serializing_if = "Option::is_none",
            with = "shared_types::parameters::tagged::option"
        )]
        default_value: Option<ParameterValue>,
    },
}

/// Kind-specific fields, tagged by the future type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE", rename_all_fields = "camelCase")]
#[allow(missing_docs)]
pub enum SerializedKind {
    ContractDeployment {
        contract_name: String,
        constructor_args: Vec<SerializedArgument>,
        libraries: BTreeMap<String, String>,
        value: SerializedArgument,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<SerializedArgument>,
    },
    ArtifactContractDeployment {
        contract_name: String,
        artifact: Box<Artifact>,
        constructor_args: Vec<SerializedArgument>,
        libraries: BTreeMap<String, String>,
        value: SerializedArgument,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<SerializedArgument>,
    },
    LibraryDeployment {
        contract_name: String,
        libraries: BTreeMap<String, String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<SerializedArgument>,
    },
    ArtifactLibraryDeployment {
        contract_name: String,
        artifact: Box<Artifact>,
        libraries: BTreeMap<String, String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<SerializedArgument>,
    },
    ContractAt {
        contract_name: String,
        address: SerializedArgument,
    },
    ArtifactContractAt {
        contract_name: String,
        artifact: Box<Artifact>,
        address: SerializedArgument,
    },
    #[serde(rename = "CALL")]
    ContractCall {
        contract: String,
        function_name: String,
        args: Vec<SerializedArgument>,
        value: SerializedArgument,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<SerializedArgument>,
    },
    StaticCall {
        contract: String,
        function_name: String,
        args: Vec<SerializedArgument>,
        name_or_index: NameOrIndex,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<SerializedArgument>,
    },
    SendData {
        to: SerializedArgument,
        value: SerializedArgument,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<SerializedArgument>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<SerializedArgument>,
    },
    ReadEventArgument {
        future_to_read_from: String,
        event_name: String,
        name_or_index: NameOrIndex,
        emitter: String,
        event_index: usize,
    },
    EncodeFunctionCall {
        contract: String,
        function_name: String,
        args: Vec<SerializedArgument>,
    },
}

// =============================================================================
// WRITING
// =============================================================================

/// Serializes a module tree.
#[must_use]
pub fn serialize(module: &IgnitionModule) -> SerializedModuleGraph {
    let modules = collect_modules(module)
        .into_iter()
        .map(|(id, m)| {
            let serialized = SerializedModule {
                id: m.id.clone(),
                futures: m.futures.iter().map(|f| f.id.clone()).collect(),
                submodules: m.submodules.iter().map(|s| s.id.clone()).collect(),
                results: m
                    .results
                    .iter()
                    .map(|(key, f)| (key.clone(), f.id.clone()))
                    .collect(),
                parameters: m.parameters.clone(),
            };
            (id, serialized)
        })
        .collect();

    let futures = collect_futures(module)
        .iter()
        .map(|f| (f.id.clone(), write_future(f)))
        .collect();

    SerializedModuleGraph {
        start_module: module.id.clone(),
        modules,
        futures,
    }
}

/// Serializes a module tree to a JSON string.
pub fn to_json(module: &IgnitionModule) -> Result<String, SerializationError> {
    Ok(serde_json::to_string(&serialize(module))?)
}

fn write_future(future: &Future) -> SerializedFuture {
    let dependencies = future
        .dependencies
        .iter()
        .map(|d| match d {
            Dependency::Future(f) => SerializedDependency::FutureToken { future_id: f.id.clone() },
            Dependency::Module(m) => SerializedDependency::ModuleToken { module_id: m.id.clone() },
        })
        .collect();

    let kind = match future.kind.clone().try_map(&mut |f| Ok::<_, Infallible>(f.id.clone())) {
        Ok(kind) => write_kind(kind),
        Err(never) => match never {},
    };

    SerializedFuture {
        id: future.id.clone(),
        module_id: future.module_id.clone(),
        dependencies,
        kind,
    }
}

fn write_kind(kind: FutureKind<String>) -> SerializedKind {
    match kind {
        FutureKind::ContractDeployment(d) => {
            let constructor_args = write_args(d.constructor_args);
            let value = write_amount(d.value);
            let from = d.from.map(write_sender);
            match d.artifact {
                Some(artifact) => SerializedKind::ArtifactContractDeployment {
                    contract_name: d.contract_name,
                    artifact: Box::new(artifact),
                    constructor_args,
                    libraries: d.libraries,
                    value,
                    from,
                },
                None => SerializedKind::ContractDeployment {
                    contract_name: d.contract_name,
                    constructor_args,
                    libraries: d.libraries,
                    value,
                    from,
                },
            }
        }
        FutureKind::LibraryDeployment(d) => {
            let from = d.from.map(write_sender);
            match d.artifact {
                Some(artifact) => SerializedKind::ArtifactLibraryDeployment {
                    contract_name: d.contract_name,
                    artifact: Box::new(artifact),
                    libraries: d.libraries,
                    from,
                },
                None => SerializedKind::LibraryDeployment {
                    contract_name: d.contract_name,
                    libraries: d.libraries,
                    from,
                },
            }
        }
        FutureKind::ContractAt(c) => {
            let address = write_address(c.address);
            match c.artifact {
                Some(artifact) => SerializedKind::ArtifactContractAt {
                    contract_name: c.contract_name,
                    artifact: Box::new(artifact),
                    address,
                },
                None => SerializedKind::ContractAt {
                    contract_name: c.contract_name,
                    address,
                },
            }
        }
        FutureKind::Call(c) => SerializedKind::ContractCall {
            contract: c.contract,
            function_name: c.function_name,
            args: write_args(c.args),
            value: write_amount(c.value),
            from: c.from.map(write_sender),
        },
        FutureKind::StaticCall(c) => SerializedKind::StaticCall {
            contract: c.contract,
            function_name: c.function_name,
            args: write_args(c.args),
            name_or_index: c.name_or_index,
            from: c.from.map(write_sender),
        },
        FutureKind::SendData(s) => SerializedKind::SendData {
            to: write_address(s.to),
            value: write_amount(s.value),
            data: s.data.map(|d| match d {
                DataArgument::Hex(hex) => SerializedArgument::String(hex),
                DataArgument::EncodedCall(id) => future_token(id),
            }),
            from: s.from.map(write_sender),
        },
        FutureKind::ReadEventArgument(r) => SerializedKind::ReadEventArgument {
            future_to_read_from: r.future_to_read_from,
            event_name: r.event_name,
            name_or_index: r.name_or_index,
            emitter: r.emitter,
            event_index: r.event_index,
        },
        FutureKind::EncodeFunctionCall(e) => SerializedKind::EncodeFunctionCall {
            contract: e.contract,
            function_name: e.function_name,
            args: write_args(e.args),
        },
    }
}

fn future_token(future_id: String) -> SerializedArgument {
    SerializedArgument::Tagged(TaggedArgument::FutureToken { future_id })
}

fn account(a: AccountRuntimeValue) -> SerializedArgument {
    SerializedArgument::Tagged(TaggedArgument::AccountRuntimeValue {
        account_index: a.account_index,
    })
}

fn parameter(p: ModuleParameterRuntimeValue) -> SerializedArgument {
    SerializedArgument::Tagged(TaggedArgument::ModuleParameterRuntimeValue {
        module_id: p.module_id,
        name: p.name,
        default_value: p.default_value,
    })
}

fn bigint(value: &BigInt) -> SerializedArgument {
    SerializedArgument::Tagged(TaggedArgument::BigInt {
        value: value.to_string(),
    })
}

fn write_args(args: Vec<Argument<String>>) -> Vec<SerializedArgument> {
    args.into_iter().map(write_arg).collect()
}

fn write_arg(arg: Argument<String>) -> SerializedArgument {
    match arg {
        Argument::Bool(b) => SerializedArgument::Bool(b),
        Argument::Int(i) => bigint(&i),
        Argument::String(s) => SerializedArgument::String(s),
        Argument::Array(items) => SerializedArgument::Array(write_args(items)),
        Argument::Object(fields) => SerializedArgument::Tagged(TaggedArgument::Object {
            value: fields.into_iter().map(|(k, v)| (k, write_arg(v))).collect(),
        }),
        Argument::Future(id) => future_token(id),
        Argument::Account(a) => account(a),
        Argument::Parameter(p) => parameter(p),
    }
}

fn write_amount(value: AmountArgument<String>) -> SerializedArgument {
    match value {
        AmountArgument::Amount(a) => bigint(&a),
        AmountArgument::Parameter(p) => parameter(p),
        AmountArgument::Future(id) => future_token(id),
    }
}

fn write_address(address: AddressArgument<String>) -> SerializedArgument {
    match address {
        AddressArgument::Literal(s) => SerializedArgument::String(s),
        AddressArgument::Future(id) => future_token(id),
        AddressArgument::Parameter(p) => parameter(p),
        AddressArgument::Account(a) => account(a),
    }
}

fn write_sender(sender: SenderArgument) -> SerializedArgument {
    match sender {
        SenderArgument::Address(s) => SerializedArgument::String(s),
        SenderArgument::Account(a) => account(a),
    }
}

// =============================================================================
// READING
// =============================================================================

/// Rebuilds a module tree from its JSON string.
pub fn from_json(json: &str) -> Result<Arc<IgnitionModule>, SerializationError> {
    deserialize(serde_json::from_str(json)?)
}

/// Rebuilds a module tree.
pub fn deserialize(graph: SerializedModuleGraph) -> Result<Arc<IgnitionModule>, SerializationError> {
    let mut reader = Reader {
        graph: &graph,
        futures: HashMap::new(),
        modules: HashMap::new(),
        visiting: HashSet::new(),
    };
    reader.module(&graph.start_module)
}

struct Reader<'a> {
    graph: &'a SerializedModuleGraph,
    futures: HashMap<String, FutureRef>,
    modules: HashMap<String, Arc<IgnitionModule>>,
    visiting: HashSet<String>,
}

impl Reader<'_> {
    fn enter(&mut self, key: String) -> Result<(), SerializationError> {
        if self.visiting.insert(key.clone()) {
            Ok(())
        } else {
            Err(SerializationError::Cycle(key))
        }
    }

    fn module(&mut self, id: &str) -> Result<Arc<IgnitionModule>, SerializationError> {
        if let Some(module) = self.modules.get(id) {
            return Ok(Arc::clone(module));
        }
        let graph = self.graph;
        let serialized = graph
            .modules
            .get(id)
            .ok_or_else(|| SerializationError::UnknownModule(id.to_string()))?;

        let key = format!("module:{id}");
        self.enter(key.clone())?;

        let submodules = serialized
            .submodules
            .iter()
            .map(|s| self.module(s))
            .collect::<Result<Vec<_>, _>>()?;
        let futures = serialized
            .futures
            .iter()
            .map(|f| self.future(f))
            .collect::<Result<Vec<_>, _>>()?;
        let results = serialized
            .results
            .iter()
            .map(|(k, f)| Ok((k.clone(), self.future(f)?)))
            .collect::<Result<BTreeMap<_, _>, SerializationError>>()?;

        self.visiting.remove(&key);
        let module = Arc::new(IgnitionModule {
            id: serialized.id.clone(),
            futures,
            submodules,
            results,
            parameters: serialized.parameters.clone(),
        });
        self.modules.insert(id.to_string(), Arc::clone(&module));
        Ok(module)
    }

    fn future(&mut self, id: &str) -> Result<FutureRef, SerializationError> {
        if let Some(future) = self.futures.get(id) {
            return Ok(Arc::clone(future));
        }
        let graph = self.graph;
        let serialized = graph
            .futures
            .get(id)
            .ok_or_else(|| SerializationError::UnknownFuture(id.to_string()))?;

        let key = format!("future:{id}");
        self.enter(key.clone())?;

        let kind = read_kind(id, serialized.kind.clone())?.try_map(&mut |f| self.future(&f))?;
        let dependencies = serialized
            .dependencies
            .iter()
            .map(|d| match d {
                SerializedDependency::FutureToken { future_id } => self.future(future_id).map(Dependency::Future),
                SerializedDependency::ModuleToken { module_id } => self.module(module_id).map(Dependency::Module),
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.visiting.remove(&key);
        let future = Arc::new(Future {
            id: serialized.id.clone(),
            module_id: serialized.module_id.clone(),
            dependencies,
            kind,
        });
        self.futures.insert(id.to_string(), Arc::clone(&future));
        Ok(future)
    }
}

fn invalid(future: &str, field: &str) -> SerializationError {
    SerializationError::InvalidValue {
        future: future.to_string(),
        field: field.to_string(),
    }
}

fn read_kind(id: &str, kind: SerializedKind) -> Result<FutureKind<String>, SerializationError> {
    Ok(match kind {
        SerializedKind::ContractDeployment {
            contract_name,
            constructor_args,
            libraries,
            value,
            from,
        } => FutureKind::ContractDeployment(ContractDeployment {
            contract_name,
            artifact: None,
            constructor_args: read_args(id, constructor_args)?,
            libraries,
            value: read_amount(id, value)?,
            from: read_sender(id, from)?,
        }),
        SerializedKind::ArtifactContractDeployment {
            contract_name,
            artifact,
            constructor_args,
            libraries,
            value,
            from,
        } => FutureKind::ContractDeployment(ContractDeployment {
            contract_name,
            artifact: Some(*artifact),
            constructor_args: read_args(id, constructor_args)?,
            libraries,
            value: read_amount(id, value)?,
            from: read_sender(id, from)?,
        }),
        SerializedKind::LibraryDeployment {
            contract_name,
            libraries,
            from,
        } => FutureKind::LibraryDeployment(LibraryDeployment {
            contract_name,
            artifact: None,
            libraries,
            from: read_sender(id, from)?,
        }),
        SerializedKind::ArtifactLibraryDeployment {
            contract_name,
            artifact,
            libraries,
            from,
        } => FutureKind::LibraryDeployment(LibraryDeployment {
            contract_name,
            artifact: Some(*artifact),
            libraries,
            from: read_sender(id, from)?,
        }),
        SerializedKind::ContractAt { contract_name, address } => FutureKind::ContractAt(ContractAt {
            contract_name,
            artifact: None,
            address: read_address(id, address)?,
        }),
        SerializedKind::ArtifactContractAt {
            contract_name,
            artifact,
            address,
        } => FutureKind::ContractAt(ContractAt {
            contract_name,
            artifact: Some(*artifact),
            address: read_address(id, address)?,
        }),
        SerializedKind::ContractCall {
            contract,
            function_name,
            args,
            value,
            from,
        } => FutureKind::Call(ContractCall {
            contract,
            function_name,
            args: read_args(id, args)?,
            value: read_amount(id, value)?,
            from: read_sender(id, from)?,
        }),
        SerializedKind::StaticCall {
            contract,
            function_name,
            args,
            name_or_index,
            from,
        } => FutureKind::StaticCall(StaticCall {
            contract,
            function_name,
            args: read_args(id, args)?,
            name_or_index,
            from: read_sender(id, from)?,
        }),
        SerializedKind::SendData { to, value, data, from } => FutureKind::SendData(SendData {
            to: read_address(id, to)?,
            value: read_amount(id, value)?,
            data: data
                .map(|d| match d {
                    SerializedArgument::String(hex) => Ok(DataArgument::Hex(hex)),
                    SerializedArgument::Tagged(TaggedArgument::FutureToken { future_id }) => {
                        Ok(DataArgument::EncodedCall(future_id))
                    }
                    _ => Err(invalid(id, "data")),
                })
                .transpose()?,
            from: read_sender(id, from)?,
        }),
        SerializedKind::ReadEventArgument {
            future_to_read_from,
            event_name,
            name_or_index,
            emitter,
            event_index,
        } => FutureKind::ReadEventArgument(ReadEventArgument {
            future_to_read_from,
            event_name,
            name_or_index,
            emitter,
            event_index,
        }),
        SerializedKind::EncodeFunctionCall {
            contract,
            function_name,
            args,
        } => FutureKind::EncodeFunctionCall(EncodeFunctionCall {
            contract,
            function_name,
            args: read_args(id, args)?,
        }),
    })
}

fn read_bigint(id: &str, field: &str, value: &str) -> Result<BigInt, SerializationError> {
    value.parse().map_err(|_| invalid(id, field))
}

fn read_args(id: &str, args: Vec<SerializedArgument>) -> Result<Vec<Argument<String>>, SerializationError> {
    args.into_iter().map(|a| read_arg(id, a)).collect()
}

fn read_arg(id: &str, arg: SerializedArgument) -> Result<Argument<String>, SerializationError> {
    Ok(match arg {
        SerializedArgument::Bool(b) => Argument::Bool(b),
        SerializedArgument::String(s) => Argument::String(s),
        SerializedArgument::Array(items) => Argument::Array(read_args(id, items)?),
        SerializedArgument::Tagged(tagged) => match tagged {
            TaggedArgument::BigInt { value } => Argument::Int(read_bigint(id, "args", &value)?),
            TaggedArgument::Object { value } => Argument::Object(
                value
                    .into_iter()
                    .map(|(k, v)| Ok((k, read_arg(id, v)?)))
                    .collect::<Result<BTreeMap<_, _>, SerializationError>>()?,
            ),
            TaggedArgument::FutureToken { future_id } => Argument::Future(future_id),
            TaggedArgument::AccountRuntimeValue { account_index } => {
                Argument::Account(AccountRuntimeValue { account_index })
            }
            TaggedArgument::ModuleParameterRuntimeValue {
                module_id,
                name,
                default_value,
            } => Argument::Parameter(ModuleParameterRuntimeValue {
                module_id,
                name,
                default_value,
            }),
        },
    })
}

fn read_amount(id: &str, value: SerializedArgument) -> Result<AmountArgument<String>, SerializationError> {
    match value {
        SerializedArgument::Tagged(TaggedArgument::BigInt { value }) => {
            Ok(AmountArgument::Amount(read_bigint(id, "value", &value)?))
        }
        SerializedArgument::Tagged(TaggedArgument::FutureToken { future_id }) => {
            Ok(AmountArgument::Future(future_id))
        }
        SerializedArgument::Tagged(TaggedArgument::ModuleParameterRuntimeValue {
            module_id,
            name,
            default_value,
        }) => Ok(AmountArgument::Parameter(ModuleParameterRuntimeValue {
            module_id,
            name,
            default_value,
        })),
        _ => Err(invalid(id, "value")),
    }
}

fn read_address(id: &str, address: SerializedArgument) -> Result<AddressArgument<String>, SerializationError> {
    match address {
        SerializedArgument::String(s) => Ok(AddressArgument::Literal(s)),
        SerializedArgument::Tagged(TaggedArgument::FutureToken { future_id }) => {
            Ok(AddressArgument::Future(future_id))
        }
        SerializedArgument::Tagged(TaggedArgument::AccountRuntimeValue { account_index }) => {
            Ok(AddressArgument::Account(AccountRuntimeValue { account_index }))
        }
        SerializedArgument::Tagged(TaggedArgument::ModuleParameterRuntimeValue {
            module_id,
            name,
            default_value,
        }) => Ok(AddressArgument::Parameter(ModuleParameterRuntimeValue {
            module_id,
            name,
            default_value,
        })),
        _ => Err(invalid(id, "address")),
    }
}

fn read_sender(id: &str, from: Option<SerializedArgument>) -> Result<Option<SenderArgument>, SerializationError> {
    from.map(|f| match f {
        SerializedArgument::String(s) => Ok(SenderArgument::Address(s)),
        SerializedArgument::Tagged(TaggedArgument::AccountRuntimeValue { account_index }) => {
            Ok(SenderArgument::Account(AccountRuntimeValue { account_index }))
        }
        _ => Err(invalid(id, "from")),
    })
    .transpose()
}
