//! A generic in-memory datum.

/// A decoded value shaped by the reader schema.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `null`.
    Null,
    /// `boolean`.
    Boolean(bool),
    /// `int`.
    Int(i32),
    /// `long`.
    Long(i64),
    /// `float`.
    Float(f32),
    /// `double`.
    Double(f64),
    /// `bytes`.
    Bytes(Vec<u8>),
    /// `string`.
    String(String),
    /// A fixed-size byte array.
    Fixed(Vec<u8>),
    /// An enum symbol with its reader ordinal.
    Enum {
        /// Reader ordinal.
        index: usize,
        /// Symbol name.
        symbol: String,
    },
    /// A union value with its reader branch.
    Union {
        /// Reader branch index.
        index: usize,
        /// The branch value.
        value: Box<Value>,
    },
    /// An array.
    Array(Vec<Value>),
    /// Map entries in the order they were decoded.
    Map(Vec<(String, Value)>),
    /// Record fields in reader declaration order.
    Record(Vec<(String, Value)>),
}

impl Value {
    /// Returns the named field of a record.
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Record(fields) => fields.iter().find(|(n, _)| n == name).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Returns the value inside a union, or the value itself otherwise.
    pub fn unwrap_union(&self) -> &Value {
        match self {
            Value::Union { value, .. } => value.unwrap_union(),
            other => other,
        }
    }
}
