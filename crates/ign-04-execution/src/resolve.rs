//! # Runtime Value Resolution
//!
//! Turns the arguments of a future into concrete values once its
//! dependencies have succeeded: future results, accounts and module
//! parameters are substituted, and the request journaled for the future is
//! built from them.

use crate::domain::{DeploymentState, ExecutionRequest, ExecutionResult, ExecutionStatus, SuccessValue};
use crate::errors::{ExecutionError, Result};
use ign_01_abi::{EvmTuple, EvmValue};
use ign_02_module_graph::{
    AccountRuntimeValue, AddressArgument, AmountArgument, Argument, DataArgument, Future, FutureKind, FutureRef,
    ModuleParameterRuntimeValue, ParameterResolver, SenderArgument,
};
use num_bigint::BigInt;
use shared_types::{from_hex, Address, ParameterValue};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Resolves runtime values for one future.
pub(crate) struct Resolver<'a> {
    future_id: &'a str,
    state: &'a DeploymentState,
    accounts: &'a [Address],
    parameters: &'a ParameterResolver<'a>,
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(
        future_id: &'a str,
        state: &'a DeploymentState,
        accounts: &'a [Address],
        parameters: &'a ParameterResolver<'a>,
    ) -> Self {
        Self {
            future_id,
            state,
            accounts,
            parameters,
        }
    }

    fn error(&self, what: impl Into<String>, reason: impl Into<String>) -> ExecutionError {
        ExecutionError::Resolution {
            future_id: self.future_id.to_string(),
            what: what.into(),
            reason: reason.into(),
        }
    }

    /// Success payload of a dependency.
    pub(crate) fn success_of(&self, future: &Future) -> Result<&'a SuccessValue> {
        let state = self
            .state
            .get(&future.id)
            .ok_or_else(|| self.error(format!("the result of {}", future.id), "it has not been executed"))?;
        match (&state.status, &state.result) {
            (ExecutionStatus::Success, Some(ExecutionResult::Success { value })) => Ok(value),
            _ => Err(self.error(
                format!("the result of {}", future.id),
                format!("it is {}", state.status),
            )),
        }
    }

    fn value_of(&self, future: &Future) -> Result<EvmValue> {
        self.success_of(future)?
            .as_value()
            .ok_or_else(|| self.error(format!("the result of {}", future.id), "it has no value"))
    }

    fn address_of(&self, future: &Future) -> Result<Address> {
        let success = self.success_of(future)?;
        if let Some(address) = success.address() {
            return Ok(address);
        }
        let value = success.as_value();
        let text = value
            .as_ref()
            .and_then(EvmValue::as_str)
            .ok_or_else(|| self.error(format!("the address from {}", future.id), "the value is not an address"))?;
        self.parse_address(&format!("the address from {}", future.id), text)
    }

    fn parse_address(&self, what: &str, text: &str) -> Result<Address> {
        Address::from_str(text).map_err(|e| self.error(what, e.to_string()))
    }

    pub(crate) fn account(&self, account: AccountRuntimeValue) -> Result<Address> {
        usize::try_from(account.account_index)
            .ok()
            .and_then(|i| self.accounts.get(i).copied())
            .ok_or_else(|| {
                self.error(
                    account.to_string(),
                    format!("only {} accounts are available", self.accounts.len()),
                )
            })
    }

    fn parameter(&self, parameter: &ModuleParameterRuntimeValue) -> Result<ParameterValue> {
        self.parameters
            .resolve(parameter)
            .ok_or_else(|| self.error(format!("parameter {parameter}"), "no value was supplied"))
    }

    /// Constructor or function argument.
    pub(crate) fn argument(&self, argument: &Argument<FutureRef>) -> Result<EvmValue> {
        Ok(match argument {
            Argument::Bool(b) => EvmValue::Bool(*b),
            Argument::Int(i) => EvmValue::Int(i.clone()),
            Argument::String(s) => EvmValue::String(s.clone()),
            Argument::Array(items) => EvmValue::Array(self.arguments(items)?),
            Argument::Object(fields) => EvmValue::Tuple(EvmTuple {
                positional: Vec::new(),
                named: fields
                    .iter()
                    .map(|(name, arg)| Ok((name.clone(), self.argument(arg)?)))
                    .collect::<Result<_>>()?,
            }),
            Argument::Future(future) => self.value_of(future)?,
            Argument::Account(account) => EvmValue::from(self.account(*account)?),
            Argument::Parameter(parameter) => EvmValue::from(self.parameter(parameter)?),
        })
    }

    pub(crate) fn arguments(&self, arguments: &[Argument<FutureRef>]) -> Result<Vec<EvmValue>> {
        arguments.iter().map(|a| self.argument(a)).collect()
    }

    pub(crate) fn address(&self, argument: &AddressArgument<FutureRef>) -> Result<Address> {
        match argument {
            AddressArgument::Literal(text) => self.parse_address("the address", text),
            AddressArgument::Future(future) => self.address_of(future),
            AddressArgument::Parameter(parameter) => match self.parameter(parameter)? {
                ParameterValue::String(text) => self.parse_address(&format!("parameter {parameter}"), &text),
                other => Err(self.error(
                    format!("parameter {parameter}"),
                    format!("expected an address string, got a {}", other.type_name()),
                )),
            },
            AddressArgument::Account(account) => self.account(*account),
        }
    }

    pub(crate) fn amount(&self, argument: &AmountArgument<FutureRef>) -> Result<BigInt> {
        match argument {
            AmountArgument::Amount(amount) => Ok(amount.clone()),
            AmountArgument::Parameter(parameter) => match self.parameter(parameter)? {
                ParameterValue::Int(amount) => Ok(amount),
                other => Err(self.error(
                    format!("parameter {parameter}"),
                    format!("expected a bigint, got a {}", other.type_name()),
                )),
            },
            AmountArgument::Future(future) => match self.value_of(future)? {
                EvmValue::Int(amount) => Ok(amount),
                _ => Err(self.error(format!("the value from {}", future.id), "the value is not an integer")),
            },
        }
    }

    /// Explicit sender, or the first account.
    pub(crate) fn sender(&self, sender: Option<&SenderArgument>) -> Result<Address> {
        match sender {
            None => self
                .accounts
                .first()
                .copied()
                .ok_or_else(|| self.error("the sender", "no accounts are available")),
            Some(SenderArgument::Address(text)) => {
                let address = self.parse_address("the sender", text)?;
                if !self.accounts.contains(&address) {
                    return Err(self.error("the sender", format!("{address} is not one of the accounts")));
                }
                Ok(address)
            }
            Some(SenderArgument::Account(account)) => self.account(*account),
        }
    }

    pub(crate) fn data(&self, data: Option<&DataArgument<FutureRef>>) -> Result<Vec<u8>> {
        match data {
            None => Ok(Vec::new()),
            Some(DataArgument::Hex(text)) => from_hex(text).map_err(|e| self.error("the data", e.to_string())),
            Some(DataArgument::EncodedCall(future)) => match self.success_of(future)? {
                SuccessValue::EncodeFunctionCall { data } => Ok(data.clone()),
                _ => Err(self.error(format!("the data from {}", future.id), "it is not encoded calldata")),
            },
        }
    }
}

fn contract_name_of(future: &Future) -> String {
    future.kind.contract_name().unwrap_or(&future.id).to_string()
}

/// The journaled request of `future` and its sender, if it sends anything.
pub(crate) fn build_request(future: &Future, resolver: &Resolver<'_>) -> Result<(ExecutionRequest, Option<Address>)> {
    Ok(match &future.kind {
        FutureKind::ContractDeployment(d) => (
            ExecutionRequest::Deployment {
                contract_name: d.contract_name.clone(),
                constructor_args: resolver.arguments(&d.constructor_args)?,
                libraries: libraries(&d.libraries, resolver)?,
                value: resolver.amount(&d.value)?,
            },
            Some(resolver.sender(d.from.as_ref())?),
        ),
        FutureKind::LibraryDeployment(d) => (
            ExecutionRequest::Deployment {
                contract_name: d.contract_name.clone(),
                constructor_args: Vec::new(),
                libraries: libraries(&d.libraries, resolver)?,
                value: BigInt::default(),
            },
            Some(resolver.sender(d.from.as_ref())?),
        ),
        FutureKind::ContractAt(c) => (
            ExecutionRequest::ContractAt {
                contract_name: c.contract_name.clone(),
                address: resolver.address(&c.address)?,
            },
            None,
        ),
        FutureKind::Call(c) => (
            ExecutionRequest::Call {
                contract_name: contract_name_of(&c.contract),
                contract_address: resolver.address_of(&c.contract)?,
                function_name: c.function_name.clone(),
                args: resolver.arguments(&c.args)?,
                value: resolver.amount(&c.value)?,
            },
            Some(resolver.sender(c.from.as_ref())?),
        ),
        FutureKind::StaticCall(c) => (
            ExecutionRequest::StaticCall {
                contract_name: contract_name_of(&c.contract),
                contract_address: resolver.address_of(&c.contract)?,
                function_name: c.function_name.clone(),
                args: resolver.arguments(&c.args)?,
                name_or_index: c.name_or_index.clone(),
            },
            Some(resolver.sender(c.from.as_ref())?),
        ),
        FutureKind::SendData(s) => (
            ExecutionRequest::SendData {
                to: resolver.address(&s.to)?,
                data: resolver.data(s.data.as_ref())?,
                value: resolver.amount(&s.value)?,
            },
            Some(resolver.sender(s.from.as_ref())?),
        ),
        FutureKind::EncodeFunctionCall(e) => (
            ExecutionRequest::EncodeFunctionCall {
                contract_name: contract_name_of(&e.contract),
                function_name: e.function_name.clone(),
                args: resolver.arguments(&e.args)?,
            },
            None,
        ),
        FutureKind::ReadEventArgument(r) => (
            ExecutionRequest::ReadEventArgument {
                future_to_read_from: r.future_to_read_from.id.clone(),
                emitter: resolver.address_of(&r.emitter)?,
                event_name: r.event_name.clone(),
                name_or_index: r.name_or_index.clone(),
                event_index: r.event_index,
            },
            None,
        ),
    })
}

fn libraries(libraries: &BTreeMap<String, FutureRef>, resolver: &Resolver<'_>) -> Result<BTreeMap<String, Address>> {
    libraries
        .iter()
        .map(|(name, library)| Ok((name.clone(), resolver.address_of(library)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::JournalMessage;
    use ign_02_module_graph::{build, build_module, ContractOptions, ModuleResults, SendOptions};
    use shared_types::{DeploymentParameters, ModuleParameters, GLOBAL_PARAMETERS_KEY};
    use std::collections::BTreeSet;

    const ALICE: Address = Address::new([0xa1; 20]);
    const BOB: Address = Address::new([0xb0; 20]);

    fn completed(state: &mut DeploymentState, id: &str, value: SuccessValue) {
        state
            .apply(&JournalMessage::ExecutionStateInitialize {
                future_id: id.into(),
                future_type: ign_02_module_graph::FutureType::ContractDeployment,
                strategy: "basic".into(),
                dependencies: BTreeSet::new(),
                from: Some(ALICE),
                request: ExecutionRequest::ContractAt {
                    contract_name: "Token".into(),
                    address: Address::ZERO,
                },
            })
            .unwrap();
        state
            .apply(&JournalMessage::ExecutionStateComplete {
                future_id: id.into(),
                result: ExecutionResult::success(value),
            })
            .unwrap();
    }

    #[test]
    fn test_substitutes_futures_accounts_and_parameters() {
        let definition = build_module("Resolve", |m| {
            let token = m.contract("Token", vec![], ContractOptions::default())?;
            let owner = m.get_parameter("owner");
            let amount = m.get_parameter_or("amount", 5i64);
            let exchange = m.contract(
                "Exchange",
                vec![(&token).into(), m.get_account(1).into(), owner.into()],
                ContractOptions::default().value(amount),
            )?;
            Ok(ModuleResults::from([("exchange".to_string(), exchange)]))
        });
        let module = build(&definition).unwrap();
        let exchange = module.future("Resolve#Exchange").unwrap().clone();

        let mut state = DeploymentState::default();
        let token_address = Address::new([0x70; 20]);
        completed(&mut state, "Resolve#Token", SuccessValue::Deployment { address: token_address });

        let mut parameters = DeploymentParameters::new();
        parameters.insert(
            GLOBAL_PARAMETERS_KEY.to_string(),
            ModuleParameters::from([("owner".to_string(), ParameterValue::from(BOB.to_checksum().as_str()))]),
        );
        let resolver_params = ParameterResolver::new(&parameters, BTreeMap::new());
        let accounts = [ALICE, BOB];
        let resolver = Resolver::new(&exchange.id, &state, &accounts, &resolver_params);

        let (request, from) = build_request(&exchange, &resolver).unwrap();
        assert_eq!(from, Some(ALICE));
        let ExecutionRequest::Deployment {
            constructor_args, value, ..
        } = request
        else {
            panic!("expected a deployment request");
        };
        assert_eq!(
            constructor_args,
            vec![
                EvmValue::from(token_address),
                EvmValue::from(BOB),
                EvmValue::String(BOB.to_checksum())
            ]
        );
        assert_eq!(value, BigInt::from(5));
    }

    #[test]
    fn test_unfinished_dependency_is_an_error() {
        let definition = build_module("Pending", |m| {
            let token = m.contract("Token", vec![], ContractOptions::default())?;
            m.send("pay", &token, 1i64, None, SendOptions::default())?;
            Ok(ModuleResults::from([("token".to_string(), token)]))
        });
        let module = build(&definition).unwrap();
        let pay = module.future("Pending#pay").unwrap().clone();

        let state = DeploymentState::default();
        let parameters = DeploymentParameters::new();
        let resolver_params = ParameterResolver::new(&parameters, BTreeMap::new());
        let accounts = [ALICE];
        let resolver = Resolver::new(&pay.id, &state, &accounts, &resolver_params);

        let error = build_request(&pay, &resolver).unwrap_err();
        assert!(matches!(error, ExecutionError::Resolution { .. }));
        assert!(error.to_string().contains("Pending#Token"));
    }

    #[test]
    fn test_account_out_of_range() {
        let state = DeploymentState::default();
        let parameters = DeploymentParameters::new();
        let resolver_params = ParameterResolver::new(&parameters, BTreeMap::new());
        let accounts = [ALICE];
        let resolver = Resolver::new("M#F", &state, &accounts, &resolver_params);

        assert_eq!(resolver.account(AccountRuntimeValue { account_index: 0 }).unwrap(), ALICE);
        assert!(resolver.account(AccountRuntimeValue { account_index: 1 }).is_err());
        assert!(resolver.account(AccountRuntimeValue { account_index: -1 }).is_err());
    }

    #[test]
    fn test_sender_must_be_an_account() {
        let state = DeploymentState::default();
        let parameters = DeploymentParameters::new();
        let resolver_params = ParameterResolver::new(&parameters, BTreeMap::new());
        let accounts = [ALICE];
        let resolver = Resolver::new("M#F", &state, &accounts, &resolver_params);

        assert_eq!(resolver.sender(None).unwrap(), ALICE);
        let bob = SenderArgument::Address(BOB.to_checksum());
        assert!(resolver.sender(Some(&bob)).is_err());
    }
}
