//! What the decoder expects the caller to ask for next.

use std::fmt;

use recast_schema::Primitive;

/// One kind of decoder call, used to report contract violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Expect {
    /// `read_null`.
    Null,
    /// `read_boolean`.
    Boolean,
    /// `read_int`.
    Int,
    /// `read_long`.
    Long,
    /// `read_float`.
    Float,
    /// `read_double`.
    Double,
    /// `read_string`, `skip_string` or `read_string_size`.
    String,
    /// `read_bytes`, `skip_bytes` or `read_bytes_size`.
    Bytes,
    /// `read_fixed` or `skip_fixed`.
    Fixed,
    /// `read_enum`.
    Enum,
    /// `read_index`.
    UnionIndex,
    /// `read_array_start`.
    ArrayStart,
    /// `array_next`.
    ArrayNext,
    /// `read_map_start`.
    MapStart,
    /// `map_next`.
    MapNext,
    /// `read_field_order`.
    RecordStart,
    /// `read_string_data`.
    StringData,
    /// `read_bytes_data`.
    BytesData,
    /// `finish`.
    End,
}

impl From<Primitive> for Expect {
    fn from(primitive: Primitive) -> Self {
        match primitive {
            Primitive::Null => Expect::Null,
            Primitive::Boolean => Expect::Boolean,
            Primitive::Int => Expect::Int,
            Primitive::Long => Expect::Long,
            Primitive::Float => Expect::Float,
            Primitive::Double => Expect::Double,
            Primitive::Bytes => Expect::Bytes,
            Primitive::String => Expect::String,
        }
    }
}

impl fmt::Display for Expect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Expect::Null => "null",
            Expect::Boolean => "boolean",
            Expect::Int => "int",
            Expect::Long => "long",
            Expect::Float => "float",
            Expect::Double => "double",
            Expect::String => "string",
            Expect::Bytes => "bytes",
            Expect::Fixed => "fixed",
            Expect::Enum => "enum",
            Expect::UnionIndex => "union index",
            Expect::ArrayStart => "array start",
            Expect::ArrayNext => "next array block",
            Expect::MapStart => "map start",
            Expect::MapNext => "next map block",
            Expect::RecordStart => "record field order",
            Expect::StringData => "string data",
            Expect::BytesData => "bytes data",
            Expect::End => "end of datum",
        };
        f.write_str(s)
    }
}
