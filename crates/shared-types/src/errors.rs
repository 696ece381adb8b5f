//! # Error Types
//!
//! Errors raised while parsing shared value objects or resolving artifacts.

use thiserror::Error;

/// Errors produced when parsing an address string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// The string is not `0x` followed by 40 hex characters.
    #[error("invalid address format: {0}")]
    InvalidFormat(String),

    /// Mixed-case address whose casing does not match its EIP-55 checksum.
    #[error("invalid address checksum: {0}")]
    InvalidChecksum(String),
}

/// Errors produced when decoding hex strings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HexError {
    /// The string is missing its `0x` prefix.
    #[error("hex string must start with 0x: {0}")]
    MissingPrefix(String),

    /// The payload contains non-hex characters or has odd length.
    #[error("invalid hex string {value}: {reason}")]
    Invalid {
        /// The offending string.
        value: String,
        /// Decoder message.
        reason: String,
    },

    /// A fixed-size value had the wrong length.
    #[error("expected {expected} bytes, got {actual}")]
    WrongLength {
        /// Expected byte length.
        expected: usize,
        /// Actual byte length.
        actual: usize,
    },
}

/// Errors returned by an [`ArtifactResolver`](crate::artifacts::ArtifactResolver).
#[derive(Debug, Clone, Error)]
pub enum ArtifactError {
    /// No artifact is registered under this name.
    #[error("artifact not found: {0}")]
    NotFound(String),

    /// The artifact exists but could not be read or parsed.
    #[error("invalid artifact {name}: {reason}")]
    Invalid {
        /// Artifact name.
        name: String,
        /// Reason reported by the store.
        reason: String,
    },

    /// The backing store failed.
    #[error("artifact store unavailable: {0}")]
    Unavailable(String),
}

/// Errors converting JSON into a module parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParameterValueError {
    /// Floating point numbers cannot be used as parameters.
    #[error("parameter numbers must be integers, got {0}")]
    NonInteger(String),

    /// `null` is not a valid parameter value.
    #[error("parameter values cannot be null")]
    Null,

    /// Malformed value in the tagged module form.
    #[error("invalid tagged parameter value: {0}")]
    Tagged(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_error_display() {
        let err = AddressError::InvalidChecksum("0xAbC".to_string());
        assert_eq!(err.to_string(), "invalid address checksum: 0xAbC");
    }

    #[test]
    fn test_hex_error_display() {
        let err = HexError::WrongLength {
            expected: 32,
            actual: 4,
        };
        assert_eq!(err.to_string(), "expected 32 bytes, got 4");
    }
}
