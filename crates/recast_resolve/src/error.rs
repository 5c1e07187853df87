//! Error types for schema resolution.

/// Why a writer schema cannot be read with a reader schema.
///
/// Every variant carries the path from the reader's root to the point of
/// failure, e.g. `com.acme.User.address.zip`. Resolution errors are never
/// cached: resolving the same pair again recompiles and fails the same way.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// The writer and reader types cannot be reconciled.
    #[error("{path}: writer type {writer} cannot be read as {reader}")]
    Incompatible {
        /// Location of the failure.
        path: String,
        /// Writer type label.
        writer: String,
        /// Reader type label.
        reader: String,
    },

    /// Two named types of the same kind have unrelated names.
    #[error("{path}: writer type {writer} does not match reader type {reader} or its aliases")]
    NameMismatch {
        /// Location of the failure.
        path: String,
        /// Writer full name.
        writer: String,
        /// Reader full name.
        reader: String,
    },

    /// Two fixed types have different sizes.
    #[error("{path}: fixed size mismatch, writer has {writer} bytes, reader has {reader}")]
    FixedSizeMismatch {
        /// Location of the failure.
        path: String,
        /// Writer size in bytes.
        writer: usize,
        /// Reader size in bytes.
        reader: usize,
    },

    /// A reader field is absent from the writer and declares no default.
    #[error("{path}: reader field '{field}' is missing from the writer and has no default")]
    MissingDefault {
        /// Location of the record.
        path: String,
        /// The reader field.
        field: String,
    },

    /// A reader field's default does not conform to the field's type.
    #[error("{path}: invalid default for field '{field}': {reason}")]
    InvalidDefault {
        /// Location of the record.
        path: String,
        /// The reader field.
        field: String,
        /// What is wrong with the default.
        reason: String,
    },

    /// A non-union writer type matches no branch of the reader union.
    #[error("{path}: no branch of the reader union accepts writer type {writer}")]
    NoMatchingBranch {
        /// Location of the union.
        path: String,
        /// Writer type label.
        writer: String,
    },
}

impl ResolveError {
    /// Returns the path at which resolution failed.
    pub fn path(&self) -> &str {
        match self {
            ResolveError::Incompatible { path, .. }
            | ResolveError::NameMismatch { path, .. }
            | ResolveError::FixedSizeMismatch { path, .. }
            | ResolveError::MissingDefault { path, .. }
            | ResolveError::InvalidDefault { path, .. }
            | ResolveError::NoMatchingBranch { path, .. } => path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_incompatible() {
        let err = ResolveError::Incompatible {
            path: "User.age".to_string(),
            writer: "string".to_string(),
            reader: "int".to_string(),
        };
        assert_eq!(
            format!("{err}"),
            "User.age: writer type string cannot be read as int"
        );
        assert_eq!(err.path(), "User.age");
    }

    #[test]
    fn display_missing_default() {
        let err = ResolveError::MissingDefault {
            path: "User".to_string(),
            field: "email".to_string(),
        };
        assert_eq!(
            format!("{err}"),
            "User: reader field 'email' is missing from the writer and has no default"
        );
    }

    #[test]
    fn display_fixed_size_mismatch() {
        let err = ResolveError::FixedSizeMismatch {
            path: "Packet.digest".to_string(),
            writer: 16,
            reader: 32,
        };
        let msg = format!("{err}");
        assert!(msg.contains("writer has 16 bytes"));
        assert!(msg.contains("reader has 32"));
    }

    #[test]
    fn display_invalid_default() {
        let err = ResolveError::InvalidDefault {
            path: "User".to_string(),
            field: "age".to_string(),
            reason: "\"x\" is not a valid int".to_string(),
        };
        assert!(format!("{err}").contains("invalid default for field 'age'"));
    }
}
