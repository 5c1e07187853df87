//! Shared foundational types used across the recast workspace.
//!
//! This crate provides the dense ID-indexed [`Arena`] used by both the schema
//! graph and the compiled resolution program, and the [`Fingerprint`] content
//! hash used to key schemas.

#![warn(missing_docs)]

pub mod arena;
pub mod hash;

pub use arena::{Arena, ArenaId};
pub use hash::Fingerprint;
