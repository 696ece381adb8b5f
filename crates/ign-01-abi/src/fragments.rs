//! # Fragment Resolution
//!
//! Looks up functions, events and constructors by bare name or full
//! signature, reporting every overload when a bare name is ambiguous.

use crate::errors::AbiError;
use alloy_json_abi::{Event, Function, JsonAbi, StateMutability};
use shared_types::NameOrIndex;

/// Returns true if `name` carries an explicit parameter list, e.g. `f(uint256)`.
#[must_use]
pub fn is_signature(name: &str) -> bool {
    name.contains('(')
}

/// Resolves a function by bare name or signature.
///
/// With a bare name and several overloads, `arg_count` selects the overload
/// if exactly one has that arity. With a single candidate the arity is
/// checked exactly.
pub fn resolve_function<'a>(
    abi: &'a JsonAbi,
    contract: &str,
    name: &str,
    arg_count: usize,
) -> Result<&'a Function, AbiError> {
    let not_found = || AbiError::FunctionNotFound {
        contract: contract.to_string(),
        function: name.to_string(),
    };

    let function = if is_signature(name) {
        abi.functions()
            .find(|f| f.signature() == name)
            .ok_or_else(not_found)?
    } else {
        let candidates = abi.functions.get(name).ok_or_else(not_found)?;
        match candidates.as_slice() {
            [] => return Err(not_found()),
            [only] => only,
            many => {
                let mut matching = many.iter().filter(|f| f.inputs.len() == arg_count);
                match (matching.next(), matching.next()) {
                    (Some(f), None) => f,
                    _ => {
                        return Err(AbiError::OverloadedFunction {
                            contract: contract.to_string(),
                            name: name.to_string(),
                            given: arg_count,
                            candidates: many.iter().map(Function::signature).collect(),
                        })
                    }
                }
            }
        }
    };

    if function.inputs.len() != arg_count {
        return Err(AbiError::ArgumentCount {
            contract: contract.to_string(),
            function: function.signature(),
            expected: function.inputs.len(),
            given: arg_count,
        });
    }

    Ok(function)
}

/// Resolves a function that must be callable with `eth_call`.
pub fn resolve_read_only_function<'a>(
    abi: &'a JsonAbi,
    contract: &str,
    name: &str,
    arg_count: usize,
) -> Result<&'a Function, AbiError> {
    let function = resolve_function(abi, contract, name, arg_count)?;
    match function.state_mutability {
        StateMutability::View | StateMutability::Pure => Ok(function),
        _ => Err(AbiError::NotReadOnly {
            contract: contract.to_string(),
            function: function.signature(),
        }),
    }
}

/// Resolves an event by bare name or signature.
pub fn resolve_event<'a>(abi: &'a JsonAbi, contract: &str, name: &str) -> Result<&'a Event, AbiError> {
    let not_found = || AbiError::EventNotFound {
        contract: contract.to_string(),
        event: name.to_string(),
    };

    if is_signature(name) {
        return abi
            .events()
            .find(|e| e.signature() == name)
            .ok_or_else(not_found);
    }

    let candidates = abi.events.get(name).ok_or_else(not_found)?;
    match candidates.as_slice() {
        [] => Err(not_found()),
        [only] => Ok(only),
        many => Err(AbiError::OverloadedEvent {
            contract: contract.to_string(),
            name: name.to_string(),
            candidates: many.iter().map(Event::signature).collect(),
        }),
    }
}

/// Checks the number of constructor arguments. A missing constructor takes none.
pub fn validate_constructor_args(abi: &JsonAbi, contract: &str, arg_count: usize) -> Result<(), AbiError> {
    let expected = abi.constructor.as_ref().map_or(0, |c| c.inputs.len());
    if expected != arg_count {
        return Err(AbiError::ConstructorArgumentCount {
            contract: contract.to_string(),
            expected,
            given: arg_count,
        });
    }
    Ok(())
}

/// Checks that `selector` names one of the event's arguments.
///
/// An index is valid when it is below the number of declared inputs.
pub fn validate_event_argument(
    event: &Event,
    contract: &str,
    selector: &NameOrIndex,
) -> Result<(), AbiError> {
    let fragment = format!("Event '{}'", event.signature());
    match selector {
        NameOrIndex::Index(index) if *index >= event.inputs.len() => Err(AbiError::IndexOutOfRange {
            contract: contract.to_string(),
            fragment,
            index: *index,
            count: event.inputs.len(),
        }),
        NameOrIndex::Index(_) => Ok(()),
        NameOrIndex::Name(name) if event.inputs.iter().any(|p| &p.name == name) => Ok(()),
        NameOrIndex::Name(name) => Err(AbiError::NameNotFound {
            contract: contract.to_string(),
            fragment,
            name: name.clone(),
        }),
    }
}

/// Checks that `selector` names one of the function's return values.
pub fn validate_function_output(
    function: &Function,
    contract: &str,
    selector: &NameOrIndex,
) -> Result<(), AbiError> {
    let fragment = format!("Function '{}'", function.signature());
    match selector {
        NameOrIndex::Index(index) if *index >= function.outputs.len() => {
            Err(AbiError::IndexOutOfRange {
                contract: contract.to_string(),
                fragment,
                index: *index,
                count: function.outputs.len(),
            })
        }
        NameOrIndex::Index(_) => Ok(()),
        NameOrIndex::Name(name) if function.outputs.iter().any(|p| &p.name == name) => Ok(()),
        NameOrIndex::Name(name) => Err(AbiError::NameNotFound {
            contract: contract.to_string(),
            fragment,
            name: name.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abi() -> JsonAbi {
        serde_json::from_str(
            r#"[
                {"type": "constructor", "inputs": [{"name": "owner", "type": "address"}], "stateMutability": "nonpayable"},
                {"type": "function", "name": "inc", "inputs": [], "outputs": [], "stateMutability": "nonpayable"},
                {"type": "function", "name": "inc", "inputs": [{"name": "by", "type": "uint256"}], "outputs": [], "stateMutability": "nonpayable"},
                {"type": "function", "name": "set", "inputs": [{"name": "v", "type": "uint256"}], "outputs": [], "stateMutability": "nonpayable"},
                {"type": "function", "name": "total", "inputs": [], "outputs": [{"name": "amount", "type": "uint256"}], "stateMutability": "view"},
                {"type": "event", "name": "Set", "inputs": [{"name": "who", "type": "address", "indexed": true}, {"name": "v", "type": "uint256", "indexed": false}], "anonymous": false}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_overload_selected_by_arity() {
        let abi = abi();
        let f = resolve_function(&abi, "Counter", "inc", 1).unwrap();
        assert_eq!(f.signature(), "inc(uint256)");
    }

    #[test]
    fn test_overload_without_match_lists_candidates_in_order() {
        let abi = abi();
        let err = resolve_function(&abi, "Counter", "inc", 2).unwrap_err();
        let AbiError::OverloadedFunction { candidates, .. } = &err else {
            panic!("unexpected error {err:?}");
        };
        assert_eq!(candidates, &vec!["inc()".to_string(), "inc(uint256)".to_string()]);
        assert!(err.to_string().contains("inc(), inc(uint256)"));
    }

    #[test]
    fn test_explicit_signature() {
        let abi = abi();
        assert!(resolve_function(&abi, "Counter", "inc()", 0).is_ok());
        assert!(matches!(
            resolve_function(&abi, "Counter", "inc(bool)", 1),
            Err(AbiError::FunctionNotFound { .. })
        ));
    }

    #[test]
    fn test_argument_count_mismatch() {
        let abi = abi();
        let err = resolve_function(&abi, "Counter", "set", 0).unwrap_err();
        assert!(err
            .to_string()
            .contains("expects 1 arguments but 0 were given"));
    }

    #[test]
    fn test_missing_function() {
        let abi = abi();
        let err = resolve_function(&abi, "Counter", "nope", 0).unwrap_err();
        assert_eq!(err.to_string(), "Contract 'Counter' doesn't have a function nope");
    }

    #[test]
    fn test_constructor_arity() {
        let abi = abi();
        assert!(validate_constructor_args(&abi, "Counter", 1).is_ok());
        let err = validate_constructor_args(&abi, "Counter", 2).unwrap_err();
        assert!(err.to_string().contains("expects 1 arguments but 2 were given"));
    }

    #[test]
    fn test_read_only_check() {
        let abi = abi();
        assert!(resolve_read_only_function(&abi, "Counter", "total", 0).is_ok());
        assert!(matches!(
            resolve_read_only_function(&abi, "Counter", "set", 1),
            Err(AbiError::NotReadOnly { .. })
        ));
    }

    #[test]
    fn test_event_argument_bounds() {
        let abi = abi();
        let event = resolve_event(&abi, "Counter", "Set").unwrap();
        assert!(validate_event_argument(event, "Counter", &NameOrIndex::Index(1)).is_ok());
        assert!(validate_event_argument(event, "Counter", &"who".into()).is_ok());
        assert!(matches!(
            validate_event_argument(event, "Counter", &NameOrIndex::Index(2)),
            Err(AbiError::IndexOutOfRange { index: 2, count: 2, .. })
        ));
    }
}
