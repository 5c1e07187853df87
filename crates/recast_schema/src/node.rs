//! Schema graph nodes.

use std::fmt;

recast_common::define_id!(
    /// Opaque, copyable ID for a node in a [`Schema`](crate::Schema) graph.
    SchemaId
);

/// The eight primitive types of the binary encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// No value; encoded as zero bytes.
    Null,
    /// A single byte, 0 or 1.
    Boolean,
    /// 32-bit signed integer, zig-zag varint.
    Int,
    /// 64-bit signed integer, zig-zag varint.
    Long,
    /// IEEE 754 single precision, little-endian.
    Float,
    /// IEEE 754 double precision, little-endian.
    Double,
    /// Length-prefixed byte sequence.
    Bytes,
    /// Length-prefixed UTF-8 string.
    String,
}

impl Primitive {
    /// Returns the primitive's name as written in schema JSON.
    pub fn name(self) -> &'static str {
        match self {
            Primitive::Null => "null",
            Primitive::Boolean => "boolean",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Float => "float",
            Primitive::Double => "double",
            Primitive::Bytes => "bytes",
            Primitive::String => "string",
        }
    }

    /// Looks up a primitive by its JSON name.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "null" => Primitive::Null,
            "boolean" => Primitive::Boolean,
            "int" => Primitive::Int,
            "long" => Primitive::Long,
            "float" => Primitive::Float,
            "double" => Primitive::Double,
            "bytes" => Primitive::Bytes,
            "string" => Primitive::String,
            _ => return None,
        })
    }

    /// Returns `true` if a writer value of type `self` may be read as `reader`.
    ///
    /// Covers identity plus the standard promotions: int to long/float/double,
    /// long to float/double, float to double, and string to/from bytes.
    pub fn promotes_to(self, reader: Primitive) -> bool {
        use Primitive::*;
        self == reader
            || matches!(
                (self, reader),
                (Int, Long | Float | Double)
                    | (Long, Float | Double)
                    | (Float, Double)
                    | (String, Bytes)
                    | (Bytes, String)
            )
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The kind of a schema node, without its contents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    /// A primitive type.
    Primitive(Primitive),
    /// A record.
    Record,
    /// An enum.
    Enum,
    /// A fixed-size byte array.
    Fixed,
    /// An array.
    Array,
    /// A map with string keys.
    Map,
    /// A union.
    Union,
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaKind::Primitive(p) => f.write_str(p.name()),
            SchemaKind::Record => f.write_str("record"),
            SchemaKind::Enum => f.write_str("enum"),
            SchemaKind::Fixed => f.write_str("fixed"),
            SchemaKind::Array => f.write_str("array"),
            SchemaKind::Map => f.write_str("map"),
            SchemaKind::Union => f.write_str("union"),
        }
    }
}

/// A possibly namespace-qualified name of a record, enum, or fixed type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Name {
    /// The simple name, without namespace.
    pub name: String,
    /// The namespace, if any.
    pub namespace: Option<String>,
}

impl Name {
    /// Builds a name from a possibly dotted string and the enclosing namespace.
    ///
    /// A dotted name carries its own namespace and ignores the enclosing one.
    pub fn parse(raw: &str, enclosing: Option<&str>) -> Self {
        match raw.rsplit_once('.') {
            Some((ns, name)) => Self {
                name: name.to_string(),
                namespace: Some(ns.to_string()),
            },
            None => Self {
                name: raw.to_string(),
                namespace: enclosing.filter(|ns| !ns.is_empty()).map(str::to_string),
            },
        }
    }

    /// Returns the full name, `namespace.name` or just `name`.
    pub fn fullname(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{ns}.{}", self.name),
            None => self.name.clone(),
        }
    }

    /// Returns `true` if the simple names agree. Namespaces are not compared,
    /// so a type moved between namespaces still resolves.
    pub fn matches(&self, other: &Name) -> bool {
        self.name == other.name
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{ns}.{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// A field of a record.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    /// The field name.
    pub name: String,
    /// The field's type.
    pub schema: SchemaId,
    /// The default value used when a writer does not provide the field.
    pub default: Option<serde_json::Value>,
    /// Alternative names under which a writer may have written this field.
    pub aliases: Vec<String>,
    /// Zero-based declaration position within the record.
    pub position: usize,
}

/// A record type: an ordered list of named fields.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordSchema {
    /// The record's name.
    pub name: Name,
    /// Full names under which this record may have been written.
    pub aliases: Vec<String>,
    /// Fields in declaration order.
    pub fields: Vec<Field>,
}

impl RecordSchema {
    /// Returns the field with the given name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// An enum type.
#[derive(Clone, Debug, PartialEq)]
pub struct EnumSchema {
    /// The enum's name.
    pub name: Name,
    /// Full names under which this enum may have been written.
    pub aliases: Vec<String>,
    /// Symbols in ordinal order.
    pub symbols: Vec<String>,
    /// Symbol substituted for writer symbols this enum does not know.
    pub default: Option<String>,
}

impl EnumSchema {
    /// Returns the ordinal of `symbol`.
    pub fn symbol_index(&self, symbol: &str) -> Option<usize> {
        self.symbols.iter().position(|s| s == symbol)
    }
}

/// A fixed-size byte array type.
#[derive(Clone, Debug, PartialEq)]
pub struct FixedSchema {
    /// The fixed type's name.
    pub name: Name,
    /// Full names under which this type may have been written.
    pub aliases: Vec<String>,
    /// Number of bytes in every value.
    pub size: usize,
}

/// One node of a schema graph.
#[derive(Clone, Debug, PartialEq)]
pub enum SchemaNode {
    /// A primitive type.
    Primitive(Primitive),
    /// A record.
    Record(RecordSchema),
    /// An enum.
    Enum(EnumSchema),
    /// A fixed-size byte array.
    Fixed(FixedSchema),
    /// An array of `items`.
    Array {
        /// Element type.
        items: SchemaId,
    },
    /// A map from string keys to `values`.
    Map {
        /// Value type.
        values: SchemaId,
    },
    /// A tagged union of `branches`.
    Union {
        /// Branch types in tag order.
        branches: Vec<SchemaId>,
    },
}

impl SchemaNode {
    /// Returns this node's kind.
    pub fn kind(&self) -> SchemaKind {
        match self {
            SchemaNode::Primitive(p) => SchemaKind::Primitive(*p),
            SchemaNode::Record(_) => SchemaKind::Record,
            SchemaNode::Enum(_) => SchemaKind::Enum,
            SchemaNode::Fixed(_) => SchemaKind::Fixed,
            SchemaNode::Array { .. } => SchemaKind::Array,
            SchemaNode::Map { .. } => SchemaKind::Map,
            SchemaNode::Union { .. } => SchemaKind::Union,
        }
    }

    /// Returns the name of a named type.
    pub fn name(&self) -> Option<&Name> {
        match self {
            SchemaNode::Record(r) => Some(&r.name),
            SchemaNode::Enum(e) => Some(&e.name),
            SchemaNode::Fixed(f) => Some(&f.name),
            _ => None,
        }
    }

    /// Returns the aliases of a named type; empty for unnamed types.
    pub fn aliases(&self) -> &[String] {
        match self {
            SchemaNode::Record(r) => &r.aliases,
            SchemaNode::Enum(e) => &e.aliases,
            SchemaNode::Fixed(f) => &f.aliases,
            _ => &[],
        }
    }

    /// Returns a short human-readable label: the full name for named types,
    /// otherwise the kind.
    pub fn label(&self) -> String {
        match self.name() {
            Some(name) => name.fullname(),
            None => self.kind().to_string(),
        }
    }
}
