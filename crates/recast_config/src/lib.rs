//! Parsing and validation of `recast.toml` configuration files.
//!
//! This crate reads the optional configuration file and produces a
//! strongly-typed [`RecastConfig`] holding the resolution cache settings and
//! the decoder's input limits. Every key has a default, so an empty file (or
//! no file at all, via [`RecastConfig::default`]) is a valid configuration.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, CONFIG_FILE_NAME};
pub use types::*;
