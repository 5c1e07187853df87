//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::RecastConfig;
use std::path::Path;

/// Name of the configuration file looked up in a directory.
pub const CONFIG_FILE_NAME: &str = "recast.toml";

/// Loads and validates a `recast.toml` configuration from a directory.
///
/// Reads `<dir>/recast.toml`, parses it, and validates the limits.
pub fn load_config(dir: &Path) -> Result<RecastConfig, ConfigError> {
    let config_path = dir.join(CONFIG_FILE_NAME);
    let content = std::fs::read_to_string(&config_path)?;
    load_config_from_str(&content)
}

/// Parses and validates a `recast.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<RecastConfig, ConfigError> {
    let config: RecastConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Rejects limits that would make every decode fail.
fn validate_config(config: &RecastConfig) -> Result<(), ConfigError> {
    let limits = &config.decoder;
    if limits.max_depth == 0 {
        return Err(ConfigError::ValidationError(
            "decoder.max_depth must be positive".to_string(),
        ));
    }
    if limits.max_bytes_len == 0 {
        return Err(ConfigError::ValidationError(
            "decoder.max_bytes_len must be positive".to_string(),
        ));
    }
    if limits.max_block_items == 0 {
        return Err(ConfigError::ValidationError(
            "decoder.max_block_items must be positive".to_string(),
        ));
    }
    if config.cache.size_warning_threshold == Some(0) {
        return Err(ConfigError::ValidationError(
            "cache.size_warning_threshold must be positive when set".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_empty_config() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config, RecastConfig::default());
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[cache]
initial_capacity = 256
size_warning_threshold = 500

[decoder]
max_bytes_len = 1048576
max_block_items = 4096
max_depth = 32
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.cache.initial_capacity, 256);
        assert_eq!(config.cache.size_warning_threshold, Some(500));
        assert_eq!(config.decoder.max_bytes_len, 1_048_576);
        assert_eq!(config.decoder.max_block_items, 4096);
        assert_eq!(config.decoder.max_depth, 32);
    }

    #[test]
    fn zero_depth_rejected() {
        let err = load_config_from_str("[decoder]\nmax_depth = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn zero_bytes_len_rejected() {
        let err = load_config_from_str("[decoder]\nmax_bytes_len = 0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ValidationError(ref msg) if msg.contains("max_bytes_len")
        ));
    }

    #[test]
    fn zero_block_items_rejected() {
        let err = load_config_from_str("[decoder]\nmax_block_items = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn zero_warning_threshold_rejected() {
        let err = load_config_from_str("[cache]\nsize_warning_threshold = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn unknown_key_rejected() {
        let err = load_config_from_str("[cache]\nmax_entries = 10\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn invalid_toml_errors() {
        let err = load_config_from_str("this is not valid toml {{{}}}").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[decoder]\nmax_bytes_len = 16\n",
        )
        .unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.decoder.max_bytes_len, 16);
    }

    #[test]
    fn io_error_from_nonexistent_dir() {
        let err = load_config(Path::new("/nonexistent/dir")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
