//! # Future Arguments
//!
//! Argument types are generic over the future reference `F`. While a module
//! is being built `F` is a [`FutureToken`](crate::builder::FutureToken); once
//! built it is an `Arc<Future>`; in serialized form it is the future id.
//! `try_map` converts between the three.

use super::runtime_values::{AccountRuntimeValue, ModuleParameterRuntimeValue};
use num_bigint::BigInt;
use std::collections::BTreeMap;

// =============================================================================
// CONSTRUCTOR / FUNCTION ARGUMENTS
// =============================================================================

/// A constructor or function argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument<F> {
    /// `bool`.
    Bool(bool),
    /// Any integer type.
    Int(BigInt),
    /// Strings, addresses and hex data.
    String(String),
    /// Arrays and positional tuples.
    Array(Vec<Argument<F>>),
    /// Structs given by field name.
    Object(BTreeMap<String, Argument<F>>),
    /// The value produced by another future.
    Future(F),
    /// A signer account address.
    Account(AccountRuntimeValue),
    /// A module parameter.
    Parameter(ModuleParameterRuntimeValue),
}

impl<F> Argument<F> {
    /// Converts every future reference.
    pub fn try_map<G, E>(self, f: &mut impl FnMut(F) -> Result<G, E>) -> Result<Argument<G>, E> {
        Ok(match self {
            Self::Bool(b) => Argument::Bool(b),
            Self::Int(i) => Argument::Int(i),
            Self::String(s) => Argument::String(s),
            Self::Array(items) => Argument::Array(
                items
                    .into_iter()
                    .map(|a| a.try_map(f))
                    .collect::<Result<Vec<_>, E>>()?,
            ),
            Self::Object(fields) => Argument::Object(
                fields
                    .into_iter()
                    .map(|(k, a)| Ok((k, a.try_map(f)?)))
                    .collect::<Result<BTreeMap<_, _>, E>>()?,
            ),
            Self::Future(fut) => Argument::Future(f(fut)?),
            Self::Account(a) => Argument::Account(a),
            Self::Parameter(p) => Argument::Parameter(p),
        })
    }

    /// Calls `visit` for every future referenced, recursively.
    pub fn visit_futures<'a>(&'a self, visit: &mut impl FnMut(&'a F)) {
        match self {
            Self::Array(items) => items.iter().for_each(|a| a.visit_futures(visit)),
            Self::Object(fields) => fields.values().for_each(|a| a.visit_futures(visit)),
            Self::Future(f) => visit(f),
            _ => {}
        }
    }

    /// Calls `visit` for every runtime value, recursively.
    pub fn visit_runtime_values<'a>(
        &'a self,
        accounts: &mut impl FnMut(&'a AccountRuntimeValue),
        parameters: &mut impl FnMut(&'a ModuleParameterRuntimeValue),
    ) {
        match self {
            Self::Array(items) => items
                .iter()
                .for_each(|a| a.visit_runtime_values(accounts, parameters)),
            Self::Object(fields) => fields
                .values()
                .for_each(|a| a.visit_runtime_values(accounts, parameters)),
            Self::Account(a) => accounts(a),
            Self::Parameter(p) => parameters(p),
            _ => {}
        }
    }
}

impl<F> From<bool> for Argument<F> {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl<F> From<i64> for Argument<F> {
    fn from(v: i64) -> Self {
        Self::Int(BigInt::from(v))
    }
}

impl<F> From<BigInt> for Argument<F> {
    fn from(v: BigInt) -> Self {
        Self::Int(v)
    }
}

impl<F> From<&str> for Argument<F> {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl<F> From<String> for Argument<F> {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl<F> From<AccountRuntimeValue> for Argument<F> {
    fn from(v: AccountRuntimeValue) -> Self {
        Self::Account(v)
    }
}

impl<F> From<ModuleParameterRuntimeValue> for Argument<F> {
    fn from(v: ModuleParameterRuntimeValue) -> Self {
        Self::Parameter(v)
    }
}

impl<F, T: Into<Argument<F>>> From<Vec<T>> for Argument<F> {
    fn from(v: Vec<T>) -> Self {
        Self::Array(v.into_iter().map(Into::into).collect())
    }
}

// =============================================================================
// VALUE (wei)
// =============================================================================

/// Amount of wei sent with a deployment, call or transfer.
#[derive(Debug, Clone, PartialEq)]
pub enum AmountArgument<F> {
    /// Literal amount.
    Amount(BigInt),
    /// Module parameter holding an integer.
    Parameter(ModuleParameterRuntimeValue),
    /// Result of a static call or event read.
    Future(F),
}

impl<F> Default for AmountArgument<F> {
    fn default() -> Self {
        Self::Amount(BigInt::default())
    }
}

impl<F> AmountArgument<F> {
    /// Converts the future reference, if any.
    pub fn try_map<G, E>(self, f: &mut impl FnMut(F) -> Result<G, E>) -> Result<AmountArgument<G>, E> {
        Ok(match self {
            Self::Amount(a) => AmountArgument::Amount(a),
            Self::Parameter(p) => AmountArgument::Parameter(p),
            Self::Future(fut) => AmountArgument::Future(f(fut)?),
        })
    }

    /// The future reference, if any.
    pub fn future(&self) -> Option<&F> {
        match self {
            Self::Future(f) => Some(f),
            _ => None,
        }
    }
}

impl<F> From<i64> for AmountArgument<F> {
    fn from(v: i64) -> Self {
        Self::Amount(BigInt::from(v))
    }
}

impl<F> From<BigInt> for AmountArgument<F> {
    fn from(v: BigInt) -> Self {
        Self::Amount(v)
    }
}

impl<F> From<ModuleParameterRuntimeValue> for AmountArgument<F> {
    fn from(v: ModuleParameterRuntimeValue) -> Self {
        Self::Parameter(v)
    }
}

// =============================================================================
// ADDRESSES
// =============================================================================

/// Target address of a `contract_at` or `send`.
#[derive(Debug, Clone, PartialEq)]
pub enum AddressArgument<F> {
    /// Literal address string.
    Literal(String),
    /// Address of a contract future, or an address-valued static call or event read.
    Future(F),
    /// Module parameter holding an address.
    Parameter(ModuleParameterRuntimeValue),
    /// A signer account.
    Account(AccountRuntimeValue),
}

impl<F> AddressArgument<F> {
    /// Converts the future reference, if any.
    pub fn try_map<G, E>(self, f: &mut impl FnMut(F) -> Result<G, E>) -> Result<AddressArgument<G>, E> {
        Ok(match self {
            Self::Literal(s) => AddressArgument::Literal(s),
            Self::Future(fut) => AddressArgument::Future(f(fut)?),
            Self::Parameter(p) => AddressArgument::Parameter(p),
            Self::Account(a) => AddressArgument::Account(a),
        })
    }

    /// The future reference, if any.
    pub fn future(&self) -> Option<&F> {
        match self {
            Self::Future(f) => Some(f),
            _ => None,
        }
    }
}

impl<F> From<&str> for AddressArgument<F> {
    fn from(v: &str) -> Self {
        Self::Literal(v.to_string())
    }
}

impl<F> From<String> for AddressArgument<F> {
    fn from(v: String) -> Self {
        Self::Literal(v)
    }
}

impl<F> From<ModuleParameterRuntimeValue> for AddressArgument<F> {
    fn from(v: ModuleParameterRuntimeValue) -> Self {
        Self::Parameter(v)
    }
}

impl<F> From<AccountRuntimeValue> for AddressArgument<F> {
    fn from(v: AccountRuntimeValue) -> Self {
        Self::Account(v)
    }
}

/// Explicit sender of a transaction. When absent the first account is used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SenderArgument {
    /// Literal address; must be one of the accounts.
    Address(String),
    /// A signer account.
    Account(AccountRuntimeValue),
}

impl From<&str> for SenderArgument {
    fn from(v: &str) -> Self {
        Self::Address(v.to_string())
    }
}

impl From<AccountRuntimeValue> for SenderArgument {
    fn from(v: AccountRuntimeValue) -> Self {
        Self::Account(v)
    }
}

// =============================================================================
// RAW DATA
// =============================================================================

/// Calldata of a `send`.
#[derive(Debug, Clone, PartialEq)]
pub enum DataArgument<F> {
    /// Literal `0x` hex.
    Hex(String),
    /// Output of an `encode_function_call` future.
    EncodedCall(F),
}

impl<F> DataArgument<F> {
    /// Converts the future reference, if any.
    pub fn try_map<G, E>(self, f: &mut impl FnMut(F) -> Result<G, E>) -> Result<DataArgument<G>, E> {
        Ok(match self {
            Self::Hex(h) => DataArgument::Hex(h),
            Self::EncodedCall(fut) => DataArgument::EncodedCall(f(fut)?),
        })
    }
}

impl<F> From<&str> for DataArgument<F> {
    fn from(v: &str) -> Self {
        Self::Hex(v.to_string())
    }
}
