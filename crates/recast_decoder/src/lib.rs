//! Resolving decoder for the compact binary encoding.
//!
//! A [`Decoder`] executes a resolution program against a
//! [`PrimitiveSource`](recast_codec::PrimitiveSource). The caller asks for
//! values in the reader schema's terms (`read_int`, `read_field_order`,
//! `read_index`, ...) and the decoder reads the writer's bytes underneath,
//! widening numbers, remapping enum ordinals, skipping fields the reader
//! dropped, and replaying defaults for fields the writer never had.
//!
//! [`read_datum`] builds on the same calls to materialize a whole [`Value`].

#![warn(missing_docs)]

mod datum;
mod decoder;
pub mod error;
pub mod expect;
pub mod value;

pub use datum::read_datum;
pub use decoder::Decoder;
pub use error::{DecodeError, Violation};
pub use expect::Expect;
pub use value::Value;
