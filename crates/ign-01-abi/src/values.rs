//! # EVM Values
//!
//! The codec-independent value model. Every integer type crosses as
//! [`BigInt`], every byte-like type (address, `bytesN`, `bytes`, `function`)
//! as a `0x` lowercase hex string, and every tuple as an [`EvmTuple`] exposing
//! both positional and named access.
//!
//! Conversion to and from `alloy-dyn-abi` values is driven by the declared
//! ABI parameters so that tuple component names survive decoding.

use crate::errors::AbiError;
use alloy_dyn_abi::{DynSolType, DynSolValue};
use alloy_json_abi::Param;
use alloy_primitives::{B256, I256, U256};
use num_bigint::{BigInt, Sign};
use num_traits::{One, Signed, Zero};
use serde::{Deserialize, Serialize};
use shared_types::{bigint_ser, from_hex, to_hex, Address, NameOrIndex, ParameterValue};
use std::collections::BTreeMap;
use std::fmt;

// =============================================================================
// VALUE MODEL
// =============================================================================

/// A decoded or to-be-encoded ABI value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum EvmValue {
    /// Any `intN`/`uintN`.
    Int(#[serde(with = "bigint_ser")] BigInt),
    /// `bool`.
    Bool(bool),
    /// `string`, or hex for byte-like types.
    String(String),
    /// `T[]` and `T[N]`.
    Array(Vec<EvmValue>),
    /// Struct or tuple.
    Tuple(EvmTuple),
}

/// Dual-access tuple. Unnamed components only appear in `positional`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EvmTuple {
    /// Components in declaration order.
    pub positional: Vec<EvmValue>,
    /// Named components.
    pub named: BTreeMap<String, EvmValue>,
}

impl EvmTuple {
    /// Tuple built from positional values only.
    #[must_use]
    pub fn from_positional(positional: Vec<EvmValue>) -> Self {
        Self {
            positional,
            named: BTreeMap::new(),
        }
    }

    /// Selects a component by name or position.
    #[must_use]
    pub fn get(&self, key: &NameOrIndex) -> Option<&EvmValue> {
        match key {
            NameOrIndex::Index(i) => self.positional.get(*i),
            NameOrIndex::Name(name) => self.named.get(name),
        }
    }

    /// Number of components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positional.len()
    }

    /// True if the tuple has no components.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty()
    }
}

/// Objects become tuples with named components only.
impl From<ParameterValue> for EvmValue {
    fn from(value: ParameterValue) -> Self {
        match value {
            ParameterValue::Bool(b) => Self::Bool(b),
            ParameterValue::Int(i) => Self::Int(i),
            ParameterValue::String(s) => Self::String(s),
            ParameterValue::Array(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            ParameterValue::Object(fields) => Self::Tuple(EvmTuple {
                positional: Vec::new(),
                named: fields.into_iter().map(|(k, v)| (k, Self::from(v))).collect(),
            }),
        }
    }
}

impl EvmValue {
    /// Returns the integer if this is an `Int`.
    #[must_use]
    pub fn as_int(&self) -> Option<&BigInt> {
        match self {
            Self::Int(i) => Some(i),
            _ => None,
        }
    }

    /// Returns the string if this is a `String`.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Int(i) => format!("integer {i}"),
            Self::Bool(b) => format!("boolean {b}"),
            Self::String(s) => format!("string \"{s}\""),
            Self::Array(items) => format!("array of {} items", items.len()),
            Self::Tuple(t) => format!("tuple of {} items", t.len()),
        }
    }
}

impl fmt::Display for EvmValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::String(s) => write!(f, "{s}"),
            Self::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Tuple(t) => {
                write!(f, "(")?;
                for (i, item) in t.positional.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
        }
    }
}

impl From<BigInt> for EvmValue {
    fn from(v: BigInt) -> Self {
        Self::Int(v)
    }
}

impl From<i64> for EvmValue {
    fn from(v: i64) -> Self {
        Self::Int(BigInt::from(v))
    }
}

impl From<bool> for EvmValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for EvmValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for EvmValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Address> for EvmValue {
    fn from(v: Address) -> Self {
        Self::String(v.to_lower_hex())
    }
}

// =============================================================================
// PARAMETER SHAPES
// =============================================================================

/// A declared parameter type with tuple component names attached.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Shape {
    Leaf(DynSolType),
    Array(Box<Shape>, Option<usize>),
    Tuple(Vec<(String, Shape)>),
}

impl Shape {
    pub(crate) fn of(ty: &str, components: &[Param]) -> Result<Self, AbiError> {
        let invalid = |reason: &str| AbiError::InvalidType {
            ty: ty.to_string(),
            reason: reason.to_string(),
        };

        if let Some(stripped) = ty.strip_suffix(']') {
            let open = stripped.rfind('[').ok_or_else(|| invalid("unbalanced brackets"))?;
            let size = &stripped[open + 1..];
            let size = if size.is_empty() {
                None
            } else {
                Some(size.parse::<usize>().map_err(|e| invalid(&e.to_string()))?)
            };
            let inner = Self::of(&stripped[..open], components)?;
            return Ok(Self::Array(Box::new(inner), size));
        }

        if ty == "tuple" {
            let fields = components
                .iter()
                .map(|c| Ok((c.name.clone(), Self::of(&c.ty, &c.components)?)))
                .collect::<Result<Vec<_>, AbiError>>()?;
            return Ok(Self::Tuple(fields));
        }

        DynSolType::parse(ty)
            .map(Self::Leaf)
            .map_err(|e| invalid(&e.to_string()))
    }

    pub(crate) fn of_params(params: &[Param]) -> Result<Vec<(String, Self)>, AbiError> {
        params
            .iter()
            .map(|p| Ok((p.name.clone(), Self::of(&p.ty, &p.components)?)))
            .collect()
    }

    pub(crate) fn sol_type(&self) -> DynSolType {
        match self {
            Self::Leaf(ty) => ty.clone(),
            Self::Array(inner, None) => DynSolType::Array(Box::new(inner.sol_type())),
            Self::Array(inner, Some(n)) => DynSolType::FixedArray(Box::new(inner.sol_type()), *n),
            Self::Tuple(fields) => DynSolType::Tuple(fields.iter().map(|(_, s)| s.sol_type()).collect()),
        }
    }

    fn type_name(&self) -> String {
        self.sol_type().sol_type_name().into_owned()
    }
}

// =============================================================================
// ENCODING
// =============================================================================

/// Encodes `values` against `params` (no selector).
pub fn encode_params(params: &[Param], values: &[EvmValue]) -> Result<Vec<u8>, AbiError> {
    let fields = Shape::of_params(params)?;
    let tuple = tuple_to_dyn(&fields, values)?;
    Ok(tuple.abi_encode_params())
}

fn tuple_to_dyn(fields: &[(String, Shape)], values: &[EvmValue]) -> Result<DynSolValue, AbiError> {
    if fields.len() != values.len() {
        return Err(AbiError::TypeMismatch {
            ty: Shape::Tuple(fields.to_vec()).type_name(),
            value: format!("{} values", values.len()),
        });
    }
    fields
        .iter()
        .zip(values)
        .map(|((_, shape), value)| to_dyn(shape, value))
        .collect::<Result<Vec<_>, _>>()
        .map(DynSolValue::Tuple)
}

fn to_dyn(shape: &Shape, value: &EvmValue) -> Result<DynSolValue, AbiError> {
    let mismatch = || AbiError::TypeMismatch {
        ty: shape.type_name(),
        value: value.describe(),
    };

    match shape {
        Shape::Leaf(ty) => leaf_to_dyn(ty, value),
        Shape::Array(inner, size) => {
            let items = match value {
                EvmValue::Array(items) => items,
                EvmValue::Tuple(t) => &t.positional,
                _ => return Err(mismatch()),
            };
            if size.is_some_and(|n| n != items.len()) {
                return Err(mismatch());
            }
            let encoded = items
                .iter()
                .map(|item| to_dyn(inner, item))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(match size {
                Some(_) => DynSolValue::FixedArray(encoded),
                None => DynSolValue::Array(encoded),
            })
        }
        Shape::Tuple(fields) => match value {
            EvmValue::Array(items) => tuple_to_dyn(fields, items),
            EvmValue::Tuple(t) if t.positional.len() == fields.len() => {
                tuple_to_dyn(fields, &t.positional)
            }
            EvmValue::Tuple(t) => {
                let by_name = fields
                    .iter()
                    .map(|(name, _)| t.named.get(name).cloned().ok_or_else(mismatch))
                    .collect::<Result<Vec<_>, _>>()?;
                tuple_to_dyn(fields, &by_name)
            }
            _ => Err(mismatch()),
        },
    }
}

fn leaf_to_dyn(ty: &DynSolType, value: &EvmValue) -> Result<DynSolValue, AbiError> {
    let mismatch = || AbiError::TypeMismatch {
        ty: ty.sol_type_name().into_owned(),
        value: value.describe(),
    };

    #[allow(unreachable_patterns)]
    match (ty, value) {
        (DynSolType::Bool, EvmValue::Bool(b)) => Ok(DynSolValue::Bool(*b)),
        (DynSolType::Int(bits), EvmValue::Int(i)) => {
            check_range(i, *bits, true, ty)?;
            Ok(DynSolValue::Int(bigint_to_i256(i), *bits))
        }
        (DynSolType::Uint(bits), EvmValue::Int(i)) => {
            check_range(i, *bits, false, ty)?;
            Ok(DynSolValue::Uint(bigint_to_u256(i), *bits))
        }
        (DynSolType::Address, EvmValue::String(s)) => {
            let address: Address = s.parse().map_err(|_| mismatch())?;
            Ok(DynSolValue::Address(alloy_primitives::Address::from(
                *address.as_bytes(),
            )))
        }
        (DynSolType::FixedBytes(size), EvmValue::String(s)) => {
            let bytes = from_hex(s).map_err(|_| mismatch())?;
            if bytes.len() != *size {
                return Err(mismatch());
            }
            let mut word = [0u8; 32];
            word[..*size].copy_from_slice(&bytes);
            Ok(DynSolValue::FixedBytes(B256::from(word), *size))
        }
        (DynSolType::Function, EvmValue::String(s)) => {
            let bytes = from_hex(s).map_err(|_| mismatch())?;
            let raw: [u8; 24] = bytes.as_slice().try_into().map_err(|_| mismatch())?;
            Ok(DynSolValue::Function(alloy_primitives::Function::from(raw)))
        }
        (DynSolType::Bytes, EvmValue::String(s)) => {
            Ok(DynSolValue::Bytes(from_hex(s).map_err(|_| mismatch())?))
        }
        (DynSolType::String, EvmValue::String(s)) => Ok(DynSolValue::String(s.clone())),
        _ => Err(mismatch()),
    }
}

fn check_range(value: &BigInt, bits: usize, signed: bool, ty: &DynSolType) -> Result<(), AbiError> {
    let (min, max) = if signed {
        let half = BigInt::one() << (bits - 1);
        (-&half, half - 1)
    } else {
        (BigInt::zero(), (BigInt::one() << bits) - 1)
    };

    if value < &min || value > &max {
        return Err(AbiError::IntegerOutOfRange {
            ty: ty.sol_type_name().into_owned(),
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Two's-complement conversion. Callers range-check first.
fn bigint_to_i256(value: &BigInt) -> I256 {
    let bytes = value.to_signed_bytes_be();
    let fill = if value.is_negative() { 0xff } else { 0x00 };
    let mut word = [fill; 32];
    let start = 32 - bytes.len().min(32);
    word[start..].copy_from_slice(&bytes[bytes.len().saturating_sub(32)..]);
    I256::from_be_bytes(word)
}

fn bigint_to_u256(value: &BigInt) -> U256 {
    let (_, bytes) = value.to_bytes_be();
    U256::from_be_slice(&bytes[bytes.len().saturating_sub(32)..])
}

// =============================================================================
// DECODING
// =============================================================================

/// Decodes `data` against `params` into a dual-access tuple.
pub fn decode_params(params: &[Param], data: &[u8]) -> Result<EvmTuple, AbiError> {
    let fields = Shape::of_params(params)?;
    let ty = Shape::Tuple(fields.clone()).sol_type();
    let decoded = ty
        .abi_decode_params(data)
        .map_err(|e| AbiError::Decoding(e.to_string()))?;

    match decoded {
        DynSolValue::Tuple(items) => tuple_from_dyn(&fields, items),
        other => tuple_from_dyn(&fields, vec![other]),
    }
}

pub(crate) fn tuple_from_dyn(
    fields: &[(String, Shape)],
    items: Vec<DynSolValue>,
) -> Result<EvmTuple, AbiError> {
    let mut tuple = EvmTuple::default();
    for (i, item) in items.into_iter().enumerate() {
        let field = fields.get(i);
        let value = from_dyn(field.map(|(_, s)| s), item)?;
        if let Some((name, _)) = field.filter(|(name, _)| !name.is_empty()) {
            tuple.named.insert(name.clone(), value.clone());
        }
        tuple.positional.push(value);
    }
    Ok(tuple)
}

pub(crate) fn from_dyn(shape: Option<&Shape>, value: DynSolValue) -> Result<EvmValue, AbiError> {
    #[allow(unreachable_patterns)]
    let converted = match value {
        DynSolValue::Bool(b) => EvmValue::Bool(b),
        DynSolValue::Int(i, _) => EvmValue::Int(BigInt::from_signed_bytes_be(&i.to_be_bytes::<32>())),
        DynSolValue::Uint(u, _) => {
            EvmValue::Int(BigInt::from_bytes_be(Sign::Plus, &u.to_be_bytes::<32>()))
        }
        DynSolValue::FixedBytes(word, size) => EvmValue::String(to_hex(&word[..size])),
        DynSolValue::Address(a) => EvmValue::String(to_hex(a.as_slice())),
        DynSolValue::Function(f) => EvmValue::String(to_hex(f.as_slice())),
        DynSolValue::Bytes(b) => EvmValue::String(to_hex(&b)),
        DynSolValue::String(s) => EvmValue::String(s),
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) => {
            let inner = match shape {
                Some(Shape::Array(inner, _)) => Some(inner.as_ref()),
                _ => None,
            };
            EvmValue::Array(
                items
                    .into_iter()
                    .map(|item| from_dyn(inner, item))
                    .collect::<Result<Vec<_>, _>>()?,
            )
        }
        DynSolValue::Tuple(items) => {
            let fields = match shape {
                Some(Shape::Tuple(fields)) => fields.as_slice(),
                _ => &[],
            };
            EvmValue::Tuple(tuple_from_dyn(fields, items)?)
        }
        other => {
            return Err(AbiError::Decoding(format!(
                "unsupported value {:?}",
                other.as_type()
            )))
        }
    };
    Ok(converted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(name: &str, ty: &str) -> Param {
        serde_json::from_value(serde_json::json!({ "name": name, "type": ty })).unwrap()
    }

    #[test]
    fn test_integer_round_trip_beyond_53_bits() {
        let params = vec![
            param("a", "uint8"),
            param("b", "int16"),
            param("c", "uint64"),
            param("d", "int128"),
            param("e", "uint256"),
            param("f", "int256"),
        ];
        let values: Vec<EvmValue> = vec![
            BigInt::from(255).into(),
            BigInt::from(-32768).into(),
            BigInt::from(9_007_199_254_740_993u64).into(),
            "-170141183460469231731687303715884105728"
                .parse::<BigInt>()
                .unwrap()
                .into(),
            "115792089237316195423570985008687907853269984665640564039457584007913129639935"
                .parse::<BigInt>()
                .unwrap()
                .into(),
            BigInt::from(-1).into(),
        ];

        let encoded = encode_params(&params, &values).unwrap();
        let decoded = decode_params(&params, &encoded).unwrap();

        assert_eq!(decoded.positional, values);
        assert_eq!(decoded.named["c"], values[2]);
    }

    #[test]
    fn test_integer_out_of_range_is_rejected() {
        let err = encode_params(&[param("x", "uint8")], &[BigInt::from(256).into()]).unwrap_err();
        assert!(matches!(err, AbiError::IntegerOutOfRange { .. }));

        let err = encode_params(&[param("x", "uint256")], &[BigInt::from(-1).into()]).unwrap_err();
        assert!(matches!(err, AbiError::IntegerOutOfRange { .. }));
    }

    #[test]
    fn test_bytes_and_addresses_decode_to_lowercase_hex() {
        let params = vec![
            param("who", "address"),
            param("tag", "bytes4"),
            param("blob", "bytes"),
        ];
        let values = vec![
            EvmValue::from("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"),
            EvmValue::from("0xDEADBEEF"),
            EvmValue::from("0x0102"),
        ];
        let decoded = decode_params(&params, &encode_params(&params, &values).unwrap()).unwrap();

        assert_eq!(
            decoded.positional[0],
            EvmValue::from("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed")
        );
        assert_eq!(decoded.positional[1], EvmValue::from("0xdeadbeef"));
        assert_eq!(decoded.positional[2], EvmValue::from("0x0102"));
    }

    #[test]
    fn test_struct_decodes_to_dual_record() {
        let point: Param = serde_json::from_value(serde_json::json!({
            "name": "p",
            "type": "tuple",
            "components": [
                { "name": "x", "type": "uint256" },
                { "name": "", "type": "bool" }
            ]
        }))
        .unwrap();
        let mut named = BTreeMap::new();
        named.insert("x".to_string(), EvmValue::from(7));
        let input = EvmValue::Array(vec![EvmValue::from(7), EvmValue::Bool(true)]);

        let encoded = encode_params(std::slice::from_ref(&point), &[input]).unwrap();
        let decoded = decode_params(&[point], &encoded).unwrap();

        let EvmValue::Tuple(inner) = &decoded.positional[0] else {
            panic!("expected tuple");
        };
        assert_eq!(inner.positional, vec![EvmValue::from(7), EvmValue::Bool(true)]);
        assert_eq!(inner.named, named);
    }

    #[test]
    fn test_shape_parses_nested_arrays() {
        let shape = Shape::of("uint256[2][]", &[]).unwrap();
        assert_eq!(shape.sol_type().sol_type_name(), "uint256[2][]");
    }

    #[test]
    fn test_value_serializes_big_integers_as_strings() {
        let value = EvmValue::from(BigInt::from(1) << 80);
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"{"kind":"int","value":"1208925819614629174706176"}"#);
    }
}
