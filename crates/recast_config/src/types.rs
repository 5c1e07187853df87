//! Configuration types deserialized from `recast.toml`.

use serde::Deserialize;

/// The top-level configuration parsed from `recast.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecastConfig {
    /// Resolution cache settings.
    #[serde(default)]
    pub cache: CacheSettings,
    /// Decoder input limits.
    #[serde(default)]
    pub decoder: DecoderLimits,
}

/// Settings for the resolution program cache.
///
/// The cache never evicts. These settings only size the map up front and
/// control when growth is reported.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheSettings {
    /// Number of entries to preallocate.
    pub initial_capacity: usize,
    /// Entry count at which a one-time warning is logged. `None` disables it.
    pub size_warning_threshold: Option<usize>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            initial_capacity: 64,
            size_warning_threshold: Some(10_000),
        }
    }
}

/// Upper bounds the decoder enforces on untrusted input.
///
/// Length prefixes and block counts come straight from the byte stream, so
/// without bounds a corrupt or hostile input could request arbitrarily large
/// allocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DecoderLimits {
    /// Largest string or bytes value, in bytes.
    pub max_bytes_len: usize,
    /// Largest item count of a single array or map block.
    pub max_block_items: u64,
    /// Deepest nesting of records, arrays, maps, and defaults.
    pub max_depth: usize,
}

impl Default for DecoderLimits {
    fn default() -> Self {
        Self {
            max_bytes_len: 64 * 1024 * 1024,
            max_block_items: 16 * 1024 * 1024,
            max_depth: 512,
        }
    }
}
