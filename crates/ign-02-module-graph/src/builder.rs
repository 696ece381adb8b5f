//! # Module Builder
//!
//! The API a module definition uses to declare futures. Every factory method
//! registers a future and returns a [`FutureToken`] immediately; tokens are
//! swapped for built futures by the [`ResolutionTable`] once the definition
//! returns.
//!
//! ## Default ids
//!
//! | Method | Id after `Module#` |
//! |--------|--------------------|
//! | `contract`, `library`, `contract_at` | `ContractName` |
//! | `call`, `static_call` | `ContractName.functionName` |
//! | `read_event_argument` | `EmitterName.EventName.nameOrIndex.eventIndex` |
//! | `encode_function_call` | `encodeFunctionCall(ContractName.functionName)` |
//! | `send` | the explicit id |
//!
//! An explicit `id` option replaces the part after `#`.

use crate::constructor::{ModuleConstructor, ModuleDefinition, ModuleResults};
use crate::domain::{
    AccountRuntimeValue, AddressArgument, AmountArgument, Argument, ContractAt, ContractCall,
    ContractDeployment, DataArgument, EncodeFunctionCall, FutureKind, FutureRef, FutureType,
    IgnitionModule, LibraryDeployment, ModuleParameterRuntimeValue, ReadEventArgument, SendData,
    SenderArgument, StaticCall,
};
use crate::errors::BuildError;
use crate::resolution::{PendingDependency, PendingFuture, ResolutionTable};
use num_traits::Signed;
use shared_types::{Artifact, ModuleParameters, NameOrIndex, ParameterValue};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::trace;

// =============================================================================
// TOKENS
// =============================================================================

#[derive(Clone, PartialEq)]
pub(crate) enum TokenTarget {
    /// Registered in the builder with this id, at this index.
    Pending { builder: u64, index: usize },
    /// Exported by an already built submodule.
    Built(FutureRef),
}

/// Placeholder for a future declared during module construction.
#[derive(Clone, PartialEq)]
pub struct FutureToken {
    id: String,
    future_type: FutureType,
    pub(crate) target: TokenTarget,
}

impl FutureToken {
    /// Full future id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Type of the future behind the token.
    #[must_use]
    pub fn future_type(&self) -> FutureType {
        self.future_type
    }

    pub(crate) fn built(future: FutureRef) -> Self {
        Self {
            id: future.id.clone(),
            future_type: future.future_type(),
            target: TokenTarget::Built(future),
        }
    }
}

impl fmt::Debug for FutureToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FutureToken({}, {})", self.id, self.future_type)
    }
}

impl From<FutureToken> for Argument<FutureToken> {
    fn from(token: FutureToken) -> Self {
        Argument::Future(token)
    }
}

impl From<&FutureToken> for Argument<FutureToken> {
    fn from(token: &FutureToken) -> Self {
        Argument::Future(token.clone())
    }
}

impl From<&FutureToken> for AmountArgument<FutureToken> {
    fn from(token: &FutureToken) -> Self {
        AmountArgument::Future(token.clone())
    }
}

impl From<&FutureToken> for AddressArgument<FutureToken> {
    fn from(token: &FutureToken) -> Self {
        AddressArgument::Future(token.clone())
    }
}

impl From<&FutureToken> for DataArgument<FutureToken> {
    fn from(token: &FutureToken) -> Self {
        DataArgument::EncodedCall(token.clone())
    }
}

/// Explicit ordering dependency.
#[derive(Debug, Clone)]
pub enum After {
    /// Wait for a future.
    Future(FutureToken),
    /// Wait for every future of a submodule.
    Module(Arc<IgnitionModule>),
}

impl From<&FutureToken> for After {
    fn from(token: &FutureToken) -> Self {
        Self::Future(token.clone())
    }
}

impl From<FutureToken> for After {
    fn from(token: FutureToken) -> Self {
        Self::Future(token)
    }
}

impl From<&ModuleHandle> for After {
    fn from(handle: &ModuleHandle) -> Self {
        Self::Module(Arc::clone(&handle.module))
    }
}

/// A submodule used by the module being built.
#[derive(Debug, Clone)]
pub struct ModuleHandle {
    module: Arc<IgnitionModule>,
    results: BTreeMap<String, FutureToken>,
}

impl ModuleHandle {
    /// Submodule id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.module.id
    }

    /// The built submodule.
    #[must_use]
    pub fn module(&self) -> &Arc<IgnitionModule> {
        &self.module
    }

    /// Token for an exported result.
    pub fn result(&self, key: &str) -> Result<FutureToken, BuildError> {
        self.results
            .get(key)
            .cloned()
            .ok_or_else(|| BuildError::UnknownResult {
                module: self.module.id.clone(),
                key: key.to_string(),
            })
    }

    /// All exported results.
    #[must_use]
    pub fn results(&self) -> &BTreeMap<String, FutureToken> {
        &self.results
    }
}

// =============================================================================
// OPTIONS
// =============================================================================

/// Options for `contract` and `contract_from_artifact`.
#[derive(Debug, Clone, Default)]
pub struct ContractOptions {
    /// Replaces the default id.
    pub id: Option<String>,
    /// Extra ordering dependencies.
    pub after: Vec<After>,
    /// Library name → library future.
    pub libraries: BTreeMap<String, FutureToken>,
    /// Wei sent with the deployment.
    pub value: AmountArgument<FutureToken>,
    /// Sender.
    pub from: Option<SenderArgument>,
}

impl ContractOptions {
    /// Sets the id.
    #[must_use]
    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    /// Adds an ordering dependency.
    #[must_use]
    pub fn after(mut self, dependency: impl Into<After>) -> Self {
        self.after.push(dependency.into());
        self
    }

    /// Links a library.
    #[must_use]
    pub fn library(mut self, name: &str, library: &FutureToken) -> Self {
        self.libraries.insert(name.to_string(), library.clone());
        self
    }

    /// Sets the value.
    #[must_use]
    pub fn value(mut self, value: impl Into<AmountArgument<FutureToken>>) -> Self {
        self.value = value.into();
        self
    }

    /// Sets the sender.
    #[must_use]
    pub fn from(mut self, from: impl Into<SenderArgument>) -> Self {
        self.from = Some(from.into());
        self
    }
}

/// Options for `library` and `library_from_artifact`.
#[derive(Debug, Clone, Default)]
pub struct LibraryOptions {
    /// Replaces the default id.
    pub id: Option<String>,
    /// Extra ordering dependencies.
    pub after: Vec<After>,
    /// Library name → library future.
    pub libraries: BTreeMap<String, FutureToken>,
    /// Sender.
    pub from: Option<SenderArgument>,
}

/// Options for `contract_at` and `contract_at_from_artifact`.
#[derive(Debug, Clone, Default)]
pub struct ContractAtOptions {
    /// Replaces the default id.
    pub id: Option<String>,
    /// Extra ordering dependencies.
    pub after: Vec<After>,
}

/// Options for `call`.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// Replaces the default id.
    pub id: Option<String>,
    /// Extra ordering dependencies.
    pub after: Vec<After>,
    /// Wei sent with the call.
    pub value: AmountArgument<FutureToken>,
    /// Sender.
    pub from: Option<SenderArgument>,
}

impl CallOptions {
    /// Sets the id.
    #[must_use]
    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    /// Adds an ordering dependency.
    #[must_use]
    pub fn after(mut self, dependency: impl Into<After>) -> Self {
        self.after.push(dependency.into());
        self
    }

    /// Sets the value.
    #[must_use]
    pub fn value(mut self, value: impl Into<AmountArgument<FutureToken>>) -> Self {
        self.value = value.into();
        self
    }
}

/// Options for `static_call`.
#[derive(Debug, Clone, Default)]
pub struct StaticCallOptions {
    /// Replaces the default id.
    pub id: Option<String>,
    /// Extra ordering dependencies.
    pub after: Vec<After>,
    /// Which return value to keep. Defaults to the first.
    pub name_or_index: NameOrIndex,
    /// Sender.
    pub from: Option<SenderArgument>,
}

/// Options for `send`.
#[derive(Debug, Clone, Default)]
pub struct SendOptions {
    /// Extra ordering dependencies.
    pub after: Vec<After>,
    /// Sender.
    pub from: Option<SenderArgument>,
}

/// Options for `read_event_argument`.
#[derive(Debug, Clone, Default)]
pub struct ReadEventArgumentOptions {
    /// Replaces the default id.
    pub id: Option<String>,
    /// Emitting contract. Defaults to the deployed contract, or the target of
    /// the call being read.
    pub emitter: Option<FutureToken>,
    /// Which matching log to read. Defaults to the first.
    pub event_index: usize,
}

/// Options for `encode_function_call`.
#[derive(Debug, Clone, Default)]
pub struct EncodeFunctionCallOptions {
    /// Replaces the default id.
    pub id: Option<String>,
}

// =============================================================================
// BUILDER
// =============================================================================

/// Returns true for non-empty `[A-Za-z0-9_]` strings.
#[must_use]
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Collects the futures of one module while its definition runs.
pub struct ModuleBuilder<'a> {
    module_id: String,
    builder_id: u64,
    constructor: &'a mut ModuleConstructor,
    pending: Vec<PendingFuture>,
    ids: HashSet<String>,
    submodules: Vec<Arc<IgnitionModule>>,
    reachable_modules: HashSet<String>,
}

impl<'a> ModuleBuilder<'a> {
    pub(crate) fn new(module_id: String, builder_id: u64, constructor: &'a mut ModuleConstructor) -> Self {
        Self {
            module_id,
            builder_id,
            constructor,
            pending: Vec::new(),
            ids: HashSet::new(),
            submodules: Vec::new(),
            reachable_modules: HashSet::new(),
        }
    }

    /// Id of the module being built.
    #[must_use]
    pub fn module_id(&self) -> &str {
        &self.module_id
    }

    // -------------------------------------------------------------------------
    // Contracts
    // -------------------------------------------------------------------------

    /// Deploys the contract whose artifact is named `contract_name`.
    pub fn contract(
        &mut self,
        contract_name: &str,
        args: Vec<Argument<FutureToken>>,
        options: ContractOptions,
    ) -> Result<FutureToken, BuildError> {
        self.deploy_contract(contract_name, None, args, options)
    }

    /// Deploys a contract from a supplied artifact.
    pub fn contract_from_artifact(
        &mut self,
        contract_name: &str,
        artifact: Artifact,
        args: Vec<Argument<FutureToken>>,
        options: ContractOptions,
    ) -> Result<FutureToken, BuildError> {
        self.deploy_contract(contract_name, Some(artifact), args, options)
    }

    fn deploy_contract(
        &mut self,
        contract_name: &str,
        artifact: Option<Artifact>,
        args: Vec<Argument<FutureToken>>,
        options: ContractOptions,
    ) -> Result<FutureToken, BuildError> {
        let id = self.future_id(options.id.as_deref(), contract_name)?;
        self.check_libraries(&options.libraries)?;
        self.check_args(&args)?;
        self.check_amount(&id, &options.value)?;

        let kind = FutureKind::ContractDeployment(ContractDeployment {
            contract_name: contract_name.to_string(),
            artifact,
            constructor_args: args,
            libraries: options.libraries,
            value: options.value,
            from: options.from,
        });
        self.register(id, kind, options.after)
    }

    /// Deploys the library whose artifact is named `library_name`.
    pub fn library(&mut self, library_name: &str, options: LibraryOptions) -> Result<FutureToken, BuildError> {
        self.deploy_library(library_name, None, options)
    }

    /// Deploys a library from a supplied artifact.
    pub fn library_from_artifact(
        &mut self,
        library_name: &str,
        artifact: Artifact,
        options: LibraryOptions,
    ) -> Result<FutureToken, BuildError> {
        self.deploy_library(library_name, Some(artifact), options)
    }

    fn deploy_library(
        &mut self,
        library_name: &str,
        artifact: Option<Artifact>,
        options: LibraryOptions,
    ) -> Result<FutureToken, BuildError> {
        let id = self.future_id(options.id.as_deref(), library_name)?;
        self.check_libraries(&options.libraries)?;

        let kind = FutureKind::LibraryDeployment(LibraryDeployment {
            contract_name: library_name.to_string(),
            artifact,
            libraries: options.libraries,
            from: options.from,
        });
        self.register(id, kind, options.after)
    }

    /// Refers to an existing contract whose artifact is named `contract_name`.
    pub fn contract_at(
        &mut self,
        contract_name: &str,
        address: impl Into<AddressArgument<FutureToken>>,
        options: ContractAtOptions,
    ) -> Result<FutureToken, BuildError> {
        self.existing_contract(contract_name, None, address.into(), options)
    }

    /// Refers to an existing contract with a supplied artifact.
    pub fn contract_at_from_artifact(
        &mut self,
        contract_name: &str,
        artifact: Artifact,
        address: impl Into<AddressArgument<FutureToken>>,
        options: ContractAtOptions,
    ) -> Result<FutureToken, BuildError> {
        self.existing_contract(contract_name, Some(artifact), address.into(), options)
    }

    fn existing_contract(
        &mut self,
        contract_name: &str,
        artifact: Option<Artifact>,
        address: AddressArgument<FutureToken>,
        options: ContractAtOptions,
    ) -> Result<FutureToken, BuildError> {
        let id = self.future_id(options.id.as_deref(), contract_name)?;
        self.check_address(&address)?;

        let kind = FutureKind::ContractAt(ContractAt {
            contract_name: contract_name.to_string(),
            artifact,
            address,
        });
        self.register(id, kind, options.after)
    }

    // -------------------------------------------------------------------------
    // Calls
    // -------------------------------------------------------------------------

    /// Sends a transaction calling `function_name` on `contract`.
    pub fn call(
        &mut self,
        contract: &FutureToken,
        function_name: &str,
        args: Vec<Argument<FutureToken>>,
        options: CallOptions,
    ) -> Result<FutureToken, BuildError> {
        self.expect(contract, "call target", FutureType::is_callable_contract)?;
        let local = format!("{}.{function_name}", self.contract_name_of(contract));
        let id = self.future_id(options.id.as_deref(), &local)?;
        self.check_args(&args)?;
        self.check_amount(&id, &options.value)?;

        let kind = FutureKind::Call(ContractCall {
            contract: contract.clone(),
            function_name: function_name.to_string(),
            args,
            value: options.value,
            from: options.from,
        });
        self.register(id, kind, options.after)
    }

    /// Calls a read-only function and keeps one of its return values.
    pub fn static_call(
        &mut self,
        contract: &FutureToken,
        function_name: &str,
        args: Vec<Argument<FutureToken>>,
        options: StaticCallOptions,
    ) -> Result<FutureToken, BuildError> {
        self.expect(contract, "static call target", FutureType::is_callable_contract)?;
        let local = format!("{}.{function_name}", self.contract_name_of(contract));
        let id = self.future_id(options.id.as_deref(), &local)?;
        self.check_args(&args)?;

        let kind = FutureKind::StaticCall(StaticCall {
            contract: contract.clone(),
            function_name: function_name.to_string(),
            args,
            name_or_index: options.name_or_index,
            from: options.from,
        });
        self.register(id, kind, options.after)
    }

    /// Produces calldata for `function_name` without sending it.
    pub fn encode_function_call(
        &mut self,
        contract: &FutureToken,
        function_name: &str,
        args: Vec<Argument<FutureToken>>,
        options: EncodeFunctionCallOptions,
    ) -> Result<FutureToken, BuildError> {
        self.expect(contract, "encode target", FutureType::is_callable_contract)?;
        let local = format!(
            "encodeFunctionCall({}.{function_name})",
            self.contract_name_of(contract)
        );
        let id = self.future_id(options.id.as_deref(), &local)?;
        self.check_args(&args)?;

        let kind = FutureKind::EncodeFunctionCall(EncodeFunctionCall {
            contract: contract.clone(),
            function_name: function_name.to_string(),
            args,
        });
        self.register(id, kind, Vec::new())
    }

    /// Sends `value` wei and optional `data` to `to`. `id` is required.
    pub fn send(
        &mut self,
        id: &str,
        to: impl Into<AddressArgument<FutureToken>>,
        value: impl Into<AmountArgument<FutureToken>>,
        data: Option<DataArgument<FutureToken>>,
        options: SendOptions,
    ) -> Result<FutureToken, BuildError> {
        let id = self.future_id(Some(id), id)?;
        let to = to.into();
        let value = value.into();
        self.check_address(&to)?;
        self.check_amount(&id, &value)?;
        if let Some(DataArgument::EncodedCall(token)) = &data {
            self.expect(token, "send data", |t| t == FutureType::EncodeFunctionCall)?;
        }

        let kind = FutureKind::SendData(SendData {
            to,
            value,
            data,
            from: options.from,
        });
        self.register(id, kind, options.after)
    }

    /// Reads an argument of an event emitted while executing `future`.
    pub fn read_event_argument(
        &mut self,
        future: &FutureToken,
        event_name: &str,
        name_or_index: impl Into<NameOrIndex>,
        options: ReadEventArgumentOptions,
    ) -> Result<FutureToken, BuildError> {
        self.expect(future, "event source", |t| {
            matches!(
                t,
                FutureType::ContractDeployment
                    | FutureType::ArtifactContractDeployment
                    | FutureType::ContractCall
            )
        })?;

        let emitter = match options.emitter {
            Some(emitter) => emitter,
            None => self.default_emitter(future)?,
        };
        self.expect(&emitter, "event emitter", FutureType::is_contract)?;

        let name_or_index = name_or_index.into();
        let local = format!(
            "{}.{event_name}.{name_or_index}.{}",
            self.contract_name_of(&emitter),
            options.event_index
        );
        let id = self.future_id(options.id.as_deref(), &local)?;

        let kind = FutureKind::ReadEventArgument(ReadEventArgument {
            future_to_read_from: future.clone(),
            event_name: event_name.to_string(),
            name_or_index,
            emitter,
            event_index: options.event_index,
        });
        self.register(id, kind, Vec::new())
    }

    // -------------------------------------------------------------------------
    // Submodules and runtime values
    // -------------------------------------------------------------------------

    /// Uses a submodule, building it on first use.
    pub fn use_module(&mut self, definition: &ModuleDefinition) -> Result<ModuleHandle, BuildError> {
        self.use_module_with(definition, ModuleParameters::new())
    }

    /// Uses a submodule with bound parameters. Using the same submodule again
    /// with different parameters is an error.
    pub fn use_module_with(
        &mut self,
        definition: &ModuleDefinition,
        parameters: ModuleParameters,
    ) -> Result<ModuleHandle, BuildError> {
        let module = self.constructor.construct_with(definition, parameters)?;

        if !self.submodules.iter().any(|m| m.id == module.id) {
            self.submodules.push(Arc::clone(&module));
            mark_reachable(&module, &mut self.reachable_modules);
        }

        let results = module
            .results
            .iter()
            .map(|(key, future)| (key.clone(), FutureToken::built(Arc::clone(future))))
            .collect();

        Ok(ModuleHandle { module, results })
    }

    /// Declares a parameter of this module without a default.
    #[must_use]
    pub fn get_parameter(&self, name: &str) -> ModuleParameterRuntimeValue {
        ModuleParameterRuntimeValue {
            module_id: self.module_id.clone(),
            name: name.to_string(),
            default_value: None,
        }
    }

    /// Declares a parameter of this module with a default.
    #[must_use]
    pub fn get_parameter_or(&self, name: &str, default: impl Into<ParameterValue>) -> ModuleParameterRuntimeValue {
        ModuleParameterRuntimeValue {
            default_value: Some(default.into()),
            ..self.get_parameter(name)
        }
    }

    /// Refers to the signer account at `index`.
    #[must_use]
    pub fn get_account(&self, index: i64) -> AccountRuntimeValue {
        AccountRuntimeValue { account_index: index }
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn future_id(&mut self, explicit: Option<&str>, default_local: &str) -> Result<String, BuildError> {
        if let Some(explicit) = explicit {
            if !is_valid_id(explicit) {
                return Err(BuildError::InvalidId(explicit.to_string()));
            }
        }

        let id = format!("{}#{}", self.module_id, explicit.unwrap_or(default_local));
        if !self.ids.insert(id.clone()) {
            return Err(BuildError::DuplicateFutureId {
                module: self.module_id.clone(),
                id,
            });
        }
        Ok(id)
    }

    fn check_token(&self, token: &FutureToken) -> Result<(), BuildError> {
        let owned = match &token.target {
            TokenTarget::Pending { builder, .. } => *builder == self.builder_id,
            TokenTarget::Built(future) => self.reachable_modules.contains(&future.module_id),
        };
        if owned {
            Ok(())
        } else {
            Err(BuildError::ForeignFuture {
                module: self.module_id.clone(),
                future: token.id.clone(),
            })
        }
    }

    fn expect(
        &self,
        token: &FutureToken,
        role: &str,
        accepts: impl Fn(FutureType) -> bool,
    ) -> Result<(), BuildError> {
        self.check_token(token)?;
        if accepts(token.future_type) {
            Ok(())
        } else {
            Err(BuildError::InvalidFutureType {
                module: self.module_id.clone(),
                role: role.to_string(),
                future: token.id.clone(),
                future_type: token.future_type,
            })
        }
    }

    fn check_args(&self, args: &[Argument<FutureToken>]) -> Result<(), BuildError> {
        let mut tokens = Vec::new();
        for arg in args {
            arg.visit_futures(&mut |t| tokens.push(t));
        }
        tokens
            .into_iter()
            .try_for_each(|t| self.expect(t, "argument", FutureType::produces_value))
    }

    fn check_libraries(&self, libraries: &BTreeMap<String, FutureToken>) -> Result<(), BuildError> {
        libraries
            .values()
            .try_for_each(|t| self.expect(t, "library", FutureType::is_contract))
    }

    fn check_amount(&self, id: &str, value: &AmountArgument<FutureToken>) -> Result<(), BuildError> {
        match value {
            AmountArgument::Amount(amount) if amount.is_negative() => Err(BuildError::InvalidValue {
                future: id.to_string(),
                value: amount.to_string(),
            }),
            AmountArgument::Future(token) => self.expect(token, "value", |t| {
                matches!(t, FutureType::StaticCall | FutureType::ReadEventArgument)
            }),
            _ => Ok(()),
        }
    }

    fn check_address(&self, address: &AddressArgument<FutureToken>) -> Result<(), BuildError> {
        match address {
            AddressArgument::Future(token) => self.expect(token, "address", FutureType::produces_address),
            _ => Ok(()),
        }
    }

    fn pending_kind<'s>(&'s self, token: &'s FutureToken) -> Option<PendingKind<'s>> {
        match &token.target {
            TokenTarget::Pending { builder, index } if *builder == self.builder_id => {
                self.pending.get(*index).map(|p| PendingKind::Pending(&p.kind))
            }
            TokenTarget::Built(future) => Some(PendingKind::Built(future)),
            TokenTarget::Pending { .. } => None,
        }
    }

    fn contract_name_of(&self, token: &FutureToken) -> String {
        let name = match self.pending_kind(token) {
            Some(PendingKind::Pending(kind)) => kind.contract_name().map(str::to_string),
            Some(PendingKind::Built(future)) => future.kind.contract_name().map(str::to_string),
            None => None,
        };
        name.unwrap_or_else(|| token.id.clone())
    }

    fn default_emitter(&self, future: &FutureToken) -> Result<FutureToken, BuildError> {
        match self.pending_kind(future) {
            Some(PendingKind::Pending(FutureKind::Call(call))) => Ok(call.contract.clone()),
            Some(PendingKind::Built(built)) => match &built.kind {
                FutureKind::Call(call) => Ok(FutureToken::built(Arc::clone(&call.contract))),
                _ => Ok(future.clone()),
            },
            Some(PendingKind::Pending(_)) => Ok(future.clone()),
            None => Err(BuildError::ForeignFuture {
                module: self.module_id.clone(),
                future: future.id.clone(),
            }),
        }
    }

    fn register(
        &mut self,
        id: String,
        kind: FutureKind<FutureToken>,
        after: Vec<After>,
    ) -> Result<FutureToken, BuildError> {
        let mut seen = HashSet::new();
        let mut dependencies = Vec::new();

        let mut referenced = Vec::new();
        kind.visit_futures(&mut |t| referenced.push(t.clone()));
        for token in referenced {
            if seen.insert(token.id.clone()) {
                dependencies.push(PendingDependency::Future(token));
            }
        }

        for dependency in after {
            match dependency {
                After::Future(token) => {
                    self.check_token(&token)?;
                    if seen.insert(token.id.clone()) {
                        dependencies.push(PendingDependency::Future(token));
                    }
                }
                After::Module(module) => {
                    if !self.reachable_modules.contains(&module.id) {
                        return Err(BuildError::ForeignFuture {
                            module: self.module_id.clone(),
                            future: module.id.clone(),
                        });
                    }
                    if seen.insert(module.id.clone()) {
                        dependencies.push(PendingDependency::Module(module));
                    }
                }
            }
        }

        let token = FutureToken {
            id: id.clone(),
            future_type: kind.future_type(),
            target: TokenTarget::Pending {
                builder: self.builder_id,
                index: self.pending.len(),
            },
        };
        trace!(module = %self.module_id, future = %id, future_type = %token.future_type, "Registered future");

        self.pending.push(PendingFuture {
            id,
            kind,
            dependencies,
        });
        Ok(token)
    }

    /// Validates the results and swaps every token for its built future.
    pub(crate) fn finish(
        self,
        results: ModuleResults,
        parameters: ModuleParameters,
    ) -> Result<IgnitionModule, BuildError> {
        for (key, token) in &results {
            self.check_token(token)?;
            if !token.future_type.is_contract() {
                return Err(BuildError::NonCallableResult {
                    module: self.module_id.clone(),
                    key: key.clone(),
                    future_type: token.future_type,
                });
            }
        }

        let mut table = ResolutionTable::new(self.module_id.clone(), self.builder_id);
        for pending in self.pending {
            table.insert(pending)?;
        }

        let results = results
            .iter()
            .map(|(key, token)| Ok((key.clone(), table.resolve(token)?)))
            .collect::<Result<BTreeMap<_, _>, BuildError>>()?;

        Ok(IgnitionModule {
            id: self.module_id,
            futures: table.into_futures(),
            submodules: self.submodules,
            results,
            parameters,
        })
    }
}

enum PendingKind<'b> {
    Pending(&'b FutureKind<FutureToken>),
    Built(&'b FutureRef),
}

fn mark_reachable(module: &IgnitionModule, reachable: &mut HashSet<String>) {
    if reachable.insert(module.id.clone()) {
        for submodule in &module.submodules {
            mark_reachable(submodule, reachable);
        }
    }
}
