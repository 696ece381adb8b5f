//! # Module Parameters
//!
//! Values supplied by the user for `get_parameter` lookups. Parameters arrive
//! as JSON; integers may be written either as JSON numbers or as decimal
//! strings with an `n` suffix (`"1000000000000000000000n"`) so that values
//! beyond the JSON safe-integer range can be expressed. Integers are always
//! written back in the suffixed form.
//!
//! The suffix is ambiguous with a string that happens to end in `n`, so
//! serialized modules use the [`tagged`] form instead, where integers and
//! objects carry a `_kind` tag and strings are always strings.

use crate::errors::ParameterValueError;
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;
use std::fmt;

/// Scope consulted when a module has no value for a parameter.
pub const GLOBAL_PARAMETERS_KEY: &str = "$global";

/// Parameters for a whole deployment: module id (or `$global`) → name → value.
pub type DeploymentParameters = BTreeMap<String, ModuleParameters>;

/// Parameters for a single module.
pub type ModuleParameters = BTreeMap<String, ParameterValue>;

/// A primitive, array or object parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "JsonValue", into = "JsonValue")]
pub enum ParameterValue {
    /// Boolean.
    Bool(bool),
    /// Arbitrary-precision integer.
    Int(BigInt),
    /// String (addresses, hex data, plain text).
    String(String),
    /// Ordered list.
    Array(Vec<ParameterValue>),
    /// Keyed record.
    Object(BTreeMap<String, ParameterValue>),
}

impl ParameterValue {
    /// Name of the value's type, as used in validation messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Int(_) => "bigint",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
        }
    }

    /// Returns the integer if this is an `Int`.
    #[must_use]
    pub fn as_int(&self) -> Option<&BigInt> {
        match self {
            Self::Int(v) => Some(v),
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
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", JsonValue::from(self.clone()))
    }
}

impl From<bool> for ParameterValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for ParameterValue {
    fn from(v: i64) -> Self {
        Self::Int(BigInt::from(v))
    }
}

impl From<BigInt> for ParameterValue {
    fn from(v: BigInt) -> Self {
        Self::Int(v)
    }
}

impl From<&str> for ParameterValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for ParameterValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

/// Parses `"123n"` into an integer; any other string stays a string.
fn parse_suffixed_int(s: &str) -> Option<BigInt> {
    let digits = s.strip_suffix('n')?;
    let unsigned = digits.strip_prefix('-').unwrap_or(digits);
    if unsigned.is_empty() || !unsigned.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

impl TryFrom<JsonValue> for ParameterValue {
    type Error = ParameterValueError;

    fn try_from(value: JsonValue) -> Result<Self, Self::Error> {
        match value {
            JsonValue::Null => Err(ParameterValueError::Null),
            JsonValue::Bool(b) => Ok(Self::Bool(b)),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Self::Int(BigInt::from(i)))
                } else if let Some(u) = n.as_u64() {
                    Ok(Self::Int(BigInt::from(u)))
                } else {
                    Err(ParameterValueError::NonInteger(n.to_string()))
                }
            }
            JsonValue::String(s) => Ok(match parse_suffixed_int(&s) {
                Some(i) => Self::Int(i),
                None => Self::String(s),
            }),
            JsonValue::Array(items) => items
                .into_iter()
                .map(Self::try_from)
                .collect::<Result<Vec<_>, _>>()
                .map(Self::Array),
            JsonValue::Object(map) => map
                .into_iter()
                .map(|(k, v)| Self::try_from(v).map(|v| (k, v)))
                .collect::<Result<BTreeMap<_, _>, _>>()
                .map(Self::Object),
        }
    }
}

impl From<ParameterValue> for JsonValue {
    fn from(value: ParameterValue) -> Self {
        match value {
            ParameterValue::Bool(b) => JsonValue::Bool(b),
            ParameterValue::Int(i) => JsonValue::String(format!("{i}n")),
            ParameterValue::String(s) => JsonValue::String(s),
            ParameterValue::Array(items) => {
                JsonValue::Array(items.into_iter().map(JsonValue::from).collect())
            }
            ParameterValue::Object(map) => JsonValue::Object(
                map.into_iter()
                    .map(|(k, v)| (k, JsonValue::from(v)))
                    .collect::<Map<_, _>>(),
            ),
        }
    }
}

// =============================================================================
// TAGGED FORM
// =============================================================================

const BIGINT_KIND: &str = "bigint";
const OBJECT_KIND: &str = "object";

impl ParameterValue {
    /// Lossless JSON: integers become `{"_kind": "bigint", "value": "<decimal>"}`
    /// and objects `{"_kind": "object", "value": {...}}`.
    #[must_use]
    pub fn to_tagged_json(&self) -> JsonValue {
        match self {
            Self::Bool(b) => JsonValue::Bool(*b),
            Self::Int(i) => tagged_json(BIGINT_KIND, JsonValue::String(i.to_string())),
            Self::String(s) => JsonValue::String(s.clone()),
            Self::Array(items) => JsonValue::Array(items.iter().map(Self::to_tagged_json).collect()),
            Self::Object(map) => tagged_json(
                OBJECT_KIND,
                JsonValue::Object(map.iter().map(|(k, v)| (k.clone(), v.to_tagged_json())).collect()),
            ),
        }
    }

    /// Reads the output of [`ParameterValue::to_tagged_json`]. Strings are
    /// never reinterpreted.
    pub fn from_tagged_json(value: JsonValue) -> Result<Self, ParameterValueError> {
        match value {
            JsonValue::Object(mut map) => {
                let kind = map.remove("_kind");
                let inner = map.remove("value");
                match (kind.as_ref().and_then(JsonValue::as_str), inner) {
                    (Some(BIGINT_KIND), Some(JsonValue::String(digits))) if map.is_empty() => digits
                        .parse()
                        .map(Self::Int)
                        .map_err(|_| ParameterValueError::Tagged(format!("invalid integer {digits:?}"))),
                    (Some(OBJECT_KIND), Some(JsonValue::Object(fields))) if map.is_empty() => fields
                        .into_iter()
                        .map(|(k, v)| Self::from_tagged_json(v).map(|v| (k, v)))
                        .collect::<Result<BTreeMap<_, _>, _>>()
                        .map(Self::Object),
                    _ => Err(ParameterValueError::Tagged(format!(
                        "object without a bigint or object tag: {kind:?}"
                    ))),
                }
            }
            JsonValue::String(s) => Ok(Self::String(s)),
            JsonValue::Array(items) => items
                .into_iter()
                .map(Self::from_tagged_json)
                .collect::<Result<Vec<_>, _>>()
                .map(Self::Array),
            other => Self::try_from(other),
        }
    }
}

fn tagged_json(kind: &str, value: JsonValue) -> JsonValue {
    let mut map = Map::new();
    map.insert("_kind".to_string(), JsonValue::String(kind.to_string()));
    map.insert("value".to_string(), value);
    JsonValue::Object(map)
}

/// `#[serde(with = "...")]` helpers writing [`ModuleParameters`] in the
/// tagged form.
pub mod tagged {
    use super::*;
    use serde::de::Error as _;
    use serde::{Deserializer, Serializer};

    /// Serializes parameters in the tagged form.
    pub fn serialize<S: Serializer>(parameters: &ModuleParameters, serializer: S) -> Result<S::Ok, S::Error> {
        parameters
            .iter()
            .map(|(name, value)| (name.clone(), value.to_tagged_json()))
            .collect::<Map<_, _>>()
            .serialize(serializer)
    }

    /// Deserializes parameters from the tagged form.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ModuleParameters, D::Error> {
        BTreeMap::<String, JsonValue>::deserialize(deserializer)?
            .into_iter()
            .map(|(name, value)| {
                ParameterValue::from_tagged_json(value)
                    .map(|value| (name, value))
                    .map_err(D::Error::custom)
            })
            .collect()
    }

    /// The same for an optional single value.
    pub mod option {
        use super::*;

        /// Serializes an optional value in the tagged form.
        pub fn serialize<S: Serializer>(value: &Option<ParameterValue>, serializer: S) -> Result<S::Ok, S::Error> {
            value.as_ref().map(ParameterValue::to_tagged_json).serialize(serializer)
        }

        /// Deserializes an optional value from the tagged form.
        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<ParameterValue>, D::Error> {
            Option::<JsonValue>::deserialize(deserializer)?
                .map(ParameterValue::from_tagged_json)
                .transpose()
                .map_err(D::Error::custom)
        }
    }
}

// =============================================================================
// RESULT SELECTION
// =============================================================================

/// Selects one value out of a decoded tuple, by name or by position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NameOrIndex {
    /// Position in the tuple.
    Index(usize),
    /// Field name.
    Name(String),
}

impl Default for NameOrIndex {
    fn default() -> Self {
        Self::Index(0)
    }
}

impl fmt::Display for NameOrIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "{i}"),
            Self::Name(n) => write!(f, "{n}"),
        }
    }
}

impl From<usize> for NameOrIndex {
    fn from(i: usize) -> Self {
        Self::Index(i)
    }
}

impl From<&str> for NameOrIndex {
    fn from(n: &str) -> Self {
        Self::Name(n.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_parameters_file() {
        let json = r#"{
            "$global": { "owner": "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed" },
            "Token": { "supply": "1000000000000000000000000n", "decimals": 18, "paused": false }
        }"#;
        let params: DeploymentParameters = serde_json::from_str(json).unwrap();

        let token = &params["Token"];
        assert_eq!(
            token["supply"],
            ParameterValue::Int("1000000000000000000000000".parse().unwrap())
        );
        assert_eq!(token["decimals"], ParameterValue::from(18));
        assert_eq!(token["paused"], ParameterValue::Bool(false));
        assert_eq!(
            params[GLOBAL_PARAMETERS_KEY]["owner"].type_name(),
            "string"
        );
    }

    #[test]
    fn test_tagged_form_keeps_suffixed_strings() {
        let values = [
            ParameterValue::from("42n"),
            ParameterValue::from(42),
            ParameterValue::Object(BTreeMap::from([
                ("_kind".to_string(), ParameterValue::from("bigint")),
                ("value".to_string(), ParameterValue::from("7")),
            ])),
        ];
        for value in values {
            let json = value.to_tagged_json();
            assert_eq!(ParameterValue::from_tagged_json(json).unwrap(), value);
        }
        assert_eq!(
            ParameterValue::from(42).to_tagged_json(),
            serde_json::json!({"_kind": "bigint", "value": "42"})
        );
        assert_eq!(ParameterValue::from("42n").to_tagged_json(), serde_json::json!("42n"));
    }

    #[test]
    fn test_untagged_object_is_rejected() {
        let error = ParameterValue::from_tagged_json(serde_json::json!({"a": 1})).unwrap_err();
        assert!(matches!(error, ParameterValueError::Tagged(_)));
    }

    #[test]
    fn test_integers_serialize_with_suffix() {
        let value = ParameterValue::from(42);
        assert_eq!(serde_json::to_string(&value).unwrap(), "\"42n\"");
    }

    #[test]
    fn test_rejects_floats_and_null() {
        assert!(serde_json::from_str::<ParameterValue>("1.5").is_err());
        assert!(serde_json::from_str::<ParameterValue>("null").is_err());
    }

    #[test]
    fn test_plain_n_string_is_not_an_integer() {
        let value: ParameterValue = serde_json::from_str("\"n\"").unwrap();
        assert_eq!(value, ParameterValue::String("n".to_string()));
    }

    #[test]
    fn test_name_or_index_serde() {
        assert_eq!(serde_json::to_string(&NameOrIndex::Index(2)).unwrap(), "2");
        assert_eq!(
            serde_json::from_str::<NameOrIndex>("\"owner\"").unwrap(),
            NameOrIndex::Name("owner".to_string())
        );
    }
}
