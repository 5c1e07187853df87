//! Schema model for the recast workspace.
//!
//! A [`Schema`] is an immutable, cheaply clonable graph of [`SchemaNode`]s.
//! Named types (records, enums, fixed) are defined once and referenced by
//! [`SchemaId`], so self-referential records are plain back-edges in the graph.
//! Schemas are parsed from the standard JSON notation and compared by a
//! deterministic normal form, which also feeds the 128-bit [`Fingerprint`]
//! used for hashing.
//!
//! [`Fingerprint`]: recast_common::Fingerprint

#![warn(missing_docs)]

pub mod error;
pub mod node;
mod normal_form;
mod parser;
pub mod schema;

pub use error::SchemaError;
pub use node::{
    EnumSchema, Field, FixedSchema, Name, Primitive, RecordSchema, SchemaId, SchemaKind,
    SchemaNode,
};
pub use schema::Schema;
