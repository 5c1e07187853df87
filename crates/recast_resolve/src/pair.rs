//! The cache key: an ordered writer/reader schema pair.

use std::fmt;

use recast_schema::Schema;

/// An ordered (writer, reader) pair of schemas.
///
/// Equality is structural on both components, so two pairs built from
/// separately parsed but identical schemas are the same key. Order matters:
/// `(A, B)` and `(B, A)` are different keys and hash differently.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SchemaPair {
    writer: Schema,
    reader: Schema,
}

impl SchemaPair {
    /// Creates a pair.
    pub fn new(writer: Schema, reader: Schema) -> Self {
        Self { writer, reader }
    }

    /// Returns the writer schema.
    pub fn writer(&self) -> &Schema {
        &self.writer
    }

    /// Returns the reader schema.
    pub fn reader(&self) -> &Schema {
        &self.reader
    }
}

impl fmt::Display for SchemaPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {}",
            self.writer.fingerprint(),
            self.reader.fingerprint()
        )
    }
}
