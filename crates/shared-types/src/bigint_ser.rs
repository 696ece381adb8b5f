//! Serde helpers for [`BigInt`] fields.
//!
//! Integers are written as decimal strings so values beyond 2^53 survive any
//! JSON consumer untouched.

use num_bigint::BigInt;
use serde::{Deserialize, Deserializer, Serializer};

/// Serializes a [`BigInt`] as a decimal string.
pub fn serialize<S>(value: &BigInt, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_string())
}

/// Deserializes a [`BigInt`] from a decimal string.
pub fn deserialize<'de, D>(deserializer: D) -> Result<BigInt, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.parse::<BigInt>().map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use num_bigint::BigInt;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Wrapper {
        #[serde(with = "super")]
        value: BigInt,
    }

    #[test]
    fn test_large_value_round_trip() {
        let value: BigInt = "-115792089237316195423570985008687907853269984665640564039457"
            .parse()
            .unwrap();
        let json = serde_json::to_string(&Wrapper {
            value: value.clone(),
        })
        .unwrap();
        assert!(json.contains("\"-115792089237316195423570985008687907853269984665640564039457\""));
        let back: Wrapper = serde_json::from_str(&json).unwrap();
        assert_eq!(back.value, value);
    }
}
