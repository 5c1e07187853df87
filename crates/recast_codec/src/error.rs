//! Error types for primitive reads.

/// Errors raised by a [`PrimitiveSource`](crate::PrimitiveSource).
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The source ended before the requested bytes were available.
    #[error("truncated input: needed {needed} bytes, {available} available")]
    Truncated {
        /// Bytes the read required.
        needed: usize,
        /// Bytes that were left in the source.
        available: usize,
    },

    /// A varint ran past the 10-byte maximum of a 64-bit value.
    #[error("varint longer than 10 bytes")]
    InvalidVarint,

    /// A boolean byte was neither 0 nor 1.
    #[error("invalid boolean byte {0:#04x}")]
    InvalidBoolean(u8),

    /// A long was read where an int was expected and it does not fit in 32 bits.
    #[error("value {0} does not fit in an int")]
    IntOutOfRange(i64),

    /// A length prefix was negative.
    #[error("negative length {0}")]
    NegativeLength(i64),

    /// The underlying reader failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_truncated() {
        let err = CodecError::Truncated {
            needed: 10,
            available: 3,
        };
        assert_eq!(
            format!("{err}"),
            "truncated input: needed 10 bytes, 3 available"
        );
    }

    #[test]
    fn display_invalid_boolean() {
        assert_eq!(
            format!("{}", CodecError::InvalidBoolean(7)),
            "invalid boolean byte 0x07"
        );
    }

    #[test]
    fn display_negative_length() {
        assert_eq!(format!("{}", CodecError::NegativeLength(-4)), "negative length -4");
    }

    #[test]
    fn io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err: CodecError = io_err.into();
        assert!(format!("{err}").starts_with("I/O error:"));
    }
}
