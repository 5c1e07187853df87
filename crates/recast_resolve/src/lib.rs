//! Schema resolution: compiling and caching writer/reader reconciliation programs.
//!
//! Resolving a writer schema against a reader schema walks both graphs and
//! produces a [`Program`]: an immutable arena of instructions telling a
//! decoder which writer bytes to read, promote, skip, or replace with a
//! default so the result has the reader's shape. Compilation is expensive,
//! so [`ProgramCache`] memoizes it per [`SchemaPair`] and hands out shared
//! [`ProgramHandle`]s that any number of decoders on any number of threads
//! can use at once.

#![warn(missing_docs)]

pub mod cache;
pub mod compiler;
mod defaults;
pub mod error;
pub mod pair;
pub mod program;

pub use cache::{CacheStats, ProgramCache};
pub use compiler::{ProgramCompiler, ResolvingCompiler};
pub use error::ResolveError;
pub use pair::SchemaPair;
pub use program::{
    Branch, EnumMapping, FieldStep, Node, NodeId, Program, ProgramHandle, ReaderField, RecordPlan,
};
