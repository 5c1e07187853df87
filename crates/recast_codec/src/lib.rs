//! Primitive byte-level reads and writes for the compact binary encoding.
//!
//! Lengths and integers are zig-zag varints, floats are little-endian IEEE 754,
//! strings and bytes are length-prefixed. The [`PrimitiveSource`] trait is the
//! only point of contact the decoder has with actual bytes; [`BufferSource`]
//! serves in-memory input and [`ReaderSource`] adapts any [`std::io::Read`].

#![warn(missing_docs)]

pub mod buffer;
pub mod encoder;
pub mod error;
pub mod reader;
pub mod source;

pub use buffer::BufferSource;
pub use encoder::BinaryEncoder;
pub use error::CodecError;
pub use reader::ReaderSource;
pub use source::{PrimitiveSource, SourceKind};
