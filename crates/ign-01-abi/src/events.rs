//! # Event Decoding
//!
//! Decodes logs against event fragments and extracts a single argument from
//! the n-th matching log of a receipt.

use crate::errors::AbiError;
use crate::values::{from_dyn, EvmTuple, EvmValue, Shape};
use alloy_dyn_abi::{DynSolType, DynSolValue};
use alloy_json_abi::Event;
use shared_types::{to_hex, Address, EventLog, NameOrIndex};

/// Decodes a log into the event's arguments, in declaration order.
///
/// Indexed arguments of dynamic type (strings, bytes, arrays, tuples) are
/// stored as their topic hash.
pub fn decode_event_log(event: &Event, log: &EventLog) -> Result<EvmTuple, AbiError> {
    let mut topics = log.topics.iter();
    if !event.anonymous {
        topics.next();
    }

    let mut body_fields = Vec::new();
    for input in event.inputs.iter().filter(|p| !p.indexed) {
        body_fields.push((input.name.clone(), Shape::of(&input.ty, &input.components)?));
    }
    let body_type = DynSolType::Tuple(body_fields.iter().map(|(_, s)| s.sol_type()).collect());
    let mut body = match body_type
        .abi_decode_params(&log.data)
        .map_err(|e| AbiError::Decoding(e.to_string()))?
    {
        DynSolValue::Tuple(values) => values.into_iter(),
        other => vec![other].into_iter(),
    };
    let mut body_shapes = body_fields.iter();

    let mut tuple = EvmTuple::default();
    for input in &event.inputs {
        let value = if input.indexed {
            let topic = topics
                .next()
                .ok_or_else(|| AbiError::Decoding(format!("missing topic for '{}'", input.name)))?;
            let shape = Shape::of(&input.ty, &input.components)?;
            if shape.sol_type().is_dynamic() || matches!(shape, Shape::Tuple(_) | Shape::Array(..)) {
                EvmValue::String(to_hex(topic.as_bytes()))
            } else {
                let decoded = shape
                    .sol_type()
                    .abi_decode(topic.as_bytes())
                    .map_err(|e| AbiError::Decoding(e.to_string()))?;
                from_dyn(Some(&shape), decoded)?
            }
        } else {
            let shape = body_shapes.next().map(|(_, s)| s);
            let decoded = body
                .next()
                .ok_or_else(|| AbiError::Decoding(format!("missing data for '{}'", input.name)))?;
            from_dyn(shape, decoded)?
        };

        if !input.name.is_empty() {
            tuple.named.insert(input.name.clone(), value.clone());
        }
        tuple.positional.push(value);
    }

    Ok(tuple)
}

/// Finds the `event_index`-th log of `event` emitted by `emitter` and returns
/// the selected argument.
pub fn extract_event_argument(
    event: &Event,
    emitter: Address,
    event_index: usize,
    selector: &NameOrIndex,
    logs: &[EventLog],
) -> Result<EvmValue, AbiError> {
    let topic = event.selector();
    let matching: Vec<&EventLog> = logs
        .iter()
        .filter(|log| log.address == emitter)
        .filter(|log| event.anonymous || log.selector().is_some_and(|t| t.as_bytes() == &topic.0))
        .collect();

    let log = matching.get(event_index).ok_or_else(|| AbiError::EventLogNotFound {
        event: event.signature(),
        emitter: emitter.to_checksum(),
        index: event_index,
        found: matching.len(),
    })?;

    let args = decode_event_log(event, log)?;
    let fragment = format!("Event '{}'", event.signature());
    args.get(selector).cloned().ok_or_else(|| match selector {
        NameOrIndex::Index(index) => AbiError::IndexOutOfRange {
            contract: emitter.to_checksum(),
            fragment,
            index: *index,
            count: args.len(),
        },
        NameOrIndex::Name(name) => AbiError::NameNotFound {
            contract: emitter.to_checksum(),
            fragment,
            name: name.clone(),
        },
    })
}
