//! Checks shared by several validators: runtime values, amounts, addresses
//! and senders. Each returns the issues it found.
//!
//! A parameter standing in an argument position is trial-encoded against
//! the ABI input there, so execution never fails on a value validation
//! could have rejected.

use crate::context::ValidationContext;
use crate::errors::ValidationIssue;
use alloy_json_abi::Param;
use ign_01_abi::{encode_params, EvmValue};
use ign_02_module_graph::{
    AccountRuntimeValue, AddressArgument, AmountArgument, Argument, FutureRef, ModuleParameterRuntimeValue,
    SenderArgument,
};
use num_bigint::BigInt;
use num_traits::{Signed, Zero};
use shared_types::{is_address, Address, ParameterValue};
use std::collections::BTreeMap;
use std::str::FromStr;

pub(crate) fn check_account(ctx: &ValidationContext<'_>, account: &AccountRuntimeValue) -> Option<ValidationIssue> {
    let index = account.account_index;
    if index < 0 {
        return Some(ValidationIssue::NegativeAccountIndex { index });
    }
    match ctx.accounts() {
        Some(accounts) if usize::try_from(index).map_or(true, |i| i >= accounts.len()) => {
            Some(ValidationIssue::AccountIndexOutOfRange {
                index,
                count: accounts.len(),
            })
        }
        _ => None,
    }
}

/// Resolves a parameter and checks its type when `expected` is given.
pub(crate) fn check_parameter(
    ctx: &ValidationContext<'_>,
    parameter: &ModuleParameterRuntimeValue,
    expected: Option<&'static str>,
) -> Result<ParameterValue, ValidationIssue> {
    let value = ctx
        .parameter(parameter)
        .ok_or_else(|| ValidationIssue::MissingParameter {
            module_id: parameter.module_id.clone(),
            name: parameter.name.clone(),
        })?;

    match expected {
        Some(expected) if value.type_name() != expected => Err(ValidationIssue::ParameterType {
            module_id: parameter.module_id.clone(),
            name: parameter.name.clone(),
            expected: expected.to_string(),
            actual: value.type_name(),
        }),
        _ => Ok(value),
    }
}

/// Runtime values nested anywhere in the arguments. With `inputs` of the
/// same arity, parameters are also checked against their ABI types.
pub(crate) fn check_arguments(
    ctx: &ValidationContext<'_>,
    args: &[Argument<FutureRef>],
    inputs: Option<&[Param]>,
) -> Vec<ValidationIssue> {
    let mut accounts = Vec::new();
    let mut parameters = Vec::new();
    for arg in args {
        arg.visit_runtime_values(&mut |a| accounts.push(a), &mut |p| parameters.push(p));
    }

    let mut issues: Vec<ValidationIssue> = accounts.into_iter().filter_map(|a| check_account(ctx, a)).collect();
    issues.extend(
        parameters
            .into_iter()
            .filter_map(|p| check_parameter(ctx, p, None).err()),
    );
    if let Some(inputs) = inputs.filter(|inputs| inputs.len() == args.len()) {
        for (arg, input) in args.iter().zip(inputs) {
            check_typed_argument(ctx, arg, input, &mut issues);
        }
    }
    issues
}

fn check_typed_argument(
    ctx: &ValidationContext<'_>,
    arg: &Argument<FutureRef>,
    input: &Param,
    issues: &mut Vec<ValidationIssue>,
) {
    let element = array_element(input);
    match (arg, element) {
        (Argument::Parameter(p), _) => {
            // Missing parameters are reported by check_parameter.
            let Some(value) = ctx.parameter(p) else {
                return;
            };
            let actual = value.type_name();
            if encode_params(std::slice::from_ref(input), &[EvmValue::from(value)]).is_err() {
                issues.push(ValidationIssue::ParameterType {
                    module_id: p.module_id.clone(),
                    name: p.name.clone(),
                    expected: input.ty.clone(),
                    actual,
                });
            }
        }
        (Argument::Array(items), Some(element)) => {
            for item in items {
                check_typed_argument(ctx, item, &element, issues);
            }
        }
        (Argument::Array(items), None) => {
            for (item, component) in items.iter().zip(&input.components) {
                check_typed_argument(ctx, item, component, issues);
            }
        }
        (Argument::Object(fields), None) => {
            for component in &input.components {
                if let Some(field) = fields.get(&component.name) {
                    check_typed_argument(ctx, field, component, issues);
                }
            }
        }
        _ => {}
    }
}

/// `T` for an input of type `T[]` or `T[N]`.
fn array_element(input: &Param) -> Option<Param> {
    let open = input.ty.strip_suffix(']')?.rfind('[')?;
    Some(Param {
        ty: input.ty[..open].to_string(),
        ..input.clone()
    })
}

/// Literal or parameter amount, when it can be known before execution.
pub(crate) fn known_amount(ctx: &ValidationContext<'_>, value: &AmountArgument<FutureRef>) -> Option<BigInt> {
    match value {
        AmountArgument::Amount(amount) => Some(amount.clone()),
        AmountArgument::Parameter(p) => ctx.parameter(p).and_then(|v| v.as_int().cloned()),
        AmountArgument::Future(_) => None,
    }
}

pub(crate) fn is_positive(ctx: &ValidationContext<'_>, value: &AmountArgument<FutureRef>) -> bool {
    known_amount(ctx, value).is_some_and(|v| v.is_positive())
}

pub(crate) fn check_amount(ctx: &ValidationContext<'_>, value: &AmountArgument<FutureRef>) -> Vec<ValidationIssue> {
    let amount = match value {
        AmountArgument::Amount(amount) => amount.clone(),
        AmountArgument::Parameter(p) => match check_parameter(ctx, p, Some("bigint")) {
            Ok(v) => v.as_int().cloned().unwrap_or_else(BigInt::zero),
            Err(issue) => return vec![issue],
        },
        AmountArgument::Future(_) => return Vec::new(),
    };

    if amount.is_negative() {
        vec![ValidationIssue::InvalidValue {
            value: amount.to_string(),
        }]
    } else {
        Vec::new()
    }
}

fn check_literal_address(value: &str) -> Option<ValidationIssue> {
    (!is_address(value)).then(|| ValidationIssue::InvalidAddress {
        value: value.to_string(),
    })
}

pub(crate) fn check_address(ctx: &ValidationContext<'_>, address: &AddressArgument<FutureRef>) -> Vec<ValidationIssue> {
    let issue = match address {
        AddressArgument::Literal(value) => check_literal_address(value),
        AddressArgument::Parameter(p) => match check_parameter(ctx, p, Some("string")) {
            Ok(value) => value.as_str().and_then(check_literal_address),
            Err(issue) => Some(issue),
        },
        AddressArgument::Account(a) => check_account(ctx, a),
        AddressArgument::Future(_) => None,
    };
    issue.into_iter().collect()
}

pub(crate) fn check_sender(ctx: &ValidationContext<'_>, from: Option<&SenderArgument>) -> Vec<ValidationIssue> {
    let issue = match from {
        None => None,
        Some(SenderArgument::Account(a)) => check_account(ctx, a),
        Some(SenderArgument::Address(value)) => match Address::from_str(value) {
            Err(_) => check_literal_address(value),
            Ok(address) => match ctx.accounts() {
                Some(accounts) if !accounts.contains(&address) => Some(ValidationIssue::UnknownSender {
                    address: value.clone(),
                }),
                _ => None,
            },
        },
    };
    issue.into_iter().collect()
}

pub(crate) fn check_libraries(libraries: &BTreeMap<String, FutureRef>) -> Vec<ValidationIssue> {
    libraries
        .iter()
        .filter(|(_, future)| !future.future_type().is_contract())
        .map(|(name, future)| ValidationIssue::InvalidLibrary {
            name: name.clone(),
            future: future.id.clone(),
            future_type: future.future_type(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(ty: &str) -> Param {
        Param {
            ty: ty.to_string(),
            name: "x".to_string(),
            components: Vec::new(),
            internal_type: None,
        }
    }

    #[test]
    fn test_array_element() {
        assert_eq!(array_element(&input("uint256[]")).unwrap().ty, "uint256");
        assert_eq!(array_element(&input("tuple[2][]")).unwrap().ty, "tuple[2]");
        assert!(array_element(&input("address")).is_none());
    }
}
