//! Error types for decoding.

use recast_codec::CodecError;

use crate::expect::Expect;

/// A caller defect: the calls made do not follow the reader schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Violation {
    /// The caller asked for something other than what comes next.
    #[error("expected {expected}, caller requested {requested}")]
    OutOfStep {
        /// What the reader schema has next.
        expected: Expect,
        /// What the caller asked for.
        requested: Expect,
    },

    /// A raw data read asked for a different length than the size read
    /// announced.
    #[error("pending {kind} is {pending} bytes, caller requested {requested}")]
    RawLength {
        /// `StringData` or `BytesData`.
        kind: Expect,
        /// Length returned by the size read.
        pending: usize,
        /// Length the caller passed.
        requested: usize,
    },

    /// A raw data read with no preceding size read.
    #[error("{requested} requested without a preceding size read")]
    NoPendingData {
        /// `StringData` or `BytesData`.
        requested: Expect,
    },

    /// The destination slice cannot hold the requested bytes.
    #[error("destination of {available} bytes cannot hold {needed} bytes at offset {offset}")]
    Destination {
        /// Bytes to be written.
        needed: usize,
        /// Offset into the destination.
        offset: usize,
        /// Destination length.
        available: usize,
    },

    /// A fixed value was read into a slice of the wrong length.
    #[error("fixed value is {size} bytes, destination is {available}")]
    FixedLength {
        /// Size of the fixed type.
        size: usize,
        /// Destination length.
        available: usize,
    },
}

/// Errors that can occur while decoding.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The input ended before the value did.
    #[error("truncated input: needed {needed} bytes, {available} available")]
    Truncated {
        /// Bytes the read required.
        needed: usize,
        /// Bytes that were left.
        available: usize,
    },

    /// The input is not valid binary encoding.
    #[error("malformed input: {0}")]
    Malformed(CodecError),

    /// A union tag names no branch of the writer union.
    #[error("malformed input: union tag {tag} out of range for {branches} branches")]
    InvalidUnionTag {
        /// The tag read.
        tag: i64,
        /// Number of writer branches.
        branches: usize,
    },

    /// An enum ordinal names no writer symbol.
    #[error("malformed input: enum ordinal {ordinal} out of range")]
    InvalidEnumOrdinal {
        /// The ordinal read.
        ordinal: i64,
    },

    /// A string is not valid UTF-8.
    #[error("invalid UTF-8 in string: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// The data selects a writer branch or symbol the reader cannot accept.
    #[error("unresolvable data: {message}")]
    Unresolvable {
        /// Why the value cannot be read.
        message: String,
    },

    /// A length, block count, or nesting depth exceeds the configured limit.
    #[error("{what} of {value} exceeds the limit of {limit}")]
    LimitExceeded {
        /// Which limit.
        what: &'static str,
        /// The offending value.
        value: u64,
        /// The configured limit.
        limit: u64,
    },

    /// The caller's sequence of calls does not follow the reader schema.
    #[error("contract violation: {0}")]
    ContractViolation(Violation),
}

impl DecodeError {
    /// Returns `true` if the input ended early.
    pub fn is_truncation(&self) -> bool {
        matches!(self, DecodeError::Truncated { .. })
    }

    /// Returns `true` if the caller broke the call contract.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, DecodeError::ContractViolation(_))
    }

    /// Returns `true` if the input bytes are invalid.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            DecodeError::Malformed(_)
                | DecodeError::InvalidUnionTag { .. }
                | DecodeError::InvalidEnumOrdinal { .. }
                | DecodeError::InvalidUtf8(_)
        )
    }
}

impl From<CodecError> for DecodeError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Truncated { needed, available } => {
                DecodeError::Truncated { needed, available }
            }
            other => DecodeError::Malformed(other),
        }
    }
}

impl From<Violation> for DecodeError {
    fn from(violation: Violation) -> Self {
        DecodeError::ContractViolation(violation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_maps_from_codec() {
        let err = DecodeError::from(CodecError::Truncated {
            needed: 10,
            available: 3,
        });
        assert!(err.is_truncation());
        assert!(!err.is_contract_violation());
        assert_eq!(
            format!("{err}"),
            "truncated input: needed 10 bytes, 3 available"
        );
    }

    #[test]
    fn other_codec_errors_are_malformed() {
        let err = DecodeError::from(CodecError::InvalidVarint);
        assert!(err.is_malformed());
        assert!(!err.is_truncation());
    }

    #[test]
    fn display_violation() {
        let err = DecodeError::from(Violation::OutOfStep {
            expected: Expect::String,
            requested: Expect::Int,
        });
        assert!(err.is_contract_violation());
        assert_eq!(
            format!("{err}"),
            "contract violation: expected string, caller requested int"
        );
    }

    #[test]
    fn display_raw_length() {
        let violation = Violation::RawLength {
            kind: Expect::StringData,
            pending: 5,
            requested: 4,
        };
        assert_eq!(
            violation.to_string(),
            "pending string data is 5 bytes, caller requested 4"
        );
    }

    #[test]
    fn display_limit() {
        let err = DecodeError::LimitExceeded {
            what: "string length",
            value: 100,
            limit: 16,
        };
        assert_eq!(
            format!("{err}"),
            "string length of 100 exceeds the limit of 16"
        );
    }
}
