//! Error types for schema parsing and validation.

/// Errors that can occur while parsing or validating a schema document.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// The input is not well-formed JSON.
    #[error("invalid schema JSON: {0}")]
    InvalidJson(String),

    /// The JSON is well-formed but does not describe a schema.
    #[error("invalid schema: {reason}")]
    InvalidSchema {
        /// Description of what is wrong.
        reason: String,
    },

    /// A type name refers to neither a primitive nor a defined named type.
    #[error("unknown type '{name}'")]
    UnknownType {
        /// The unresolved type name.
        name: String,
    },

    /// A required attribute is missing from a schema object.
    #[error("missing attribute '{attribute}' in {context}")]
    MissingAttribute {
        /// The missing attribute name.
        attribute: &'static str,
        /// The kind of object it was expected in.
        context: String,
    },

    /// A name, namespace, or symbol is not a valid identifier.
    #[error("invalid name '{name}'")]
    InvalidName {
        /// The rejected name.
        name: String,
    },

    /// A named type is defined more than once.
    #[error("duplicate definition of named type '{name}'")]
    DuplicateName {
        /// The full name defined twice.
        name: String,
    },

    /// A record declares two fields with the same name.
    #[error("record '{record}' declares field '{field}' more than once")]
    DuplicateField {
        /// The record's full name.
        record: String,
        /// The repeated field name.
        field: String,
    },

    /// An enum declares the same symbol twice.
    #[error("enum '{name}' declares symbol '{symbol}' more than once")]
    DuplicateSymbol {
        /// The enum's full name.
        name: String,
        /// The repeated symbol.
        symbol: String,
    },

    /// An enum default is not one of the enum's symbols.
    #[error("enum '{name}' default '{symbol}' is not a declared symbol")]
    InvalidEnumDefault {
        /// The enum's full name.
        name: String,
        /// The offending default.
        symbol: String,
    },

    /// A union breaks the union rules (nested unions, duplicate branches).
    #[error("invalid union: {reason}")]
    InvalidUnion {
        /// Description of the violated rule.
        reason: String,
    },

    /// A fixed type has a missing or invalid size.
    #[error("fixed '{name}' has an invalid size")]
    InvalidSize {
        /// The fixed type's full name.
        name: String,
    },
}

impl From<serde_json::Error> for SchemaError {
    fn from(err: serde_json::Error) -> Self {
        SchemaError::InvalidJson(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_unknown_type() {
        let err = SchemaError::UnknownType {
            name: "com.example.Missing".to_string(),
        };
        assert_eq!(format!("{err}"), "unknown type 'com.example.Missing'");
    }

    #[test]
    fn display_missing_attribute() {
        let err = SchemaError::MissingAttribute {
            attribute: "fields",
            context: "record 'User'".to_string(),
        };
        assert_eq!(format!("{err}"), "missing attribute 'fields' in record 'User'");
    }

    #[test]
    fn display_duplicate_field() {
        let err = SchemaError::DuplicateField {
            record: "User".to_string(),
            field: "name".to_string(),
        };
        assert!(format!("{err}").contains("'name' more than once"));
    }

    #[test]
    fn from_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: SchemaError = json_err.into();
        assert!(matches!(err, SchemaError::InvalidJson(_)));
        assert!(format!("{err}").starts_with("invalid schema JSON:"));
    }
}
