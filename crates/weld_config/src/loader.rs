//! Configuration file loading, validation, and environment overrides.

use crate::error::ConfigError;
use crate::types::BuildConfig;
use std::path::Path;

/// Environment variable overriding the link-cache byte budget.
pub const LINK_CACHE_SIZE_VAR: &str = "WELD_LINK_CACHE_SIZE";

/// Environment variable enabling link-cache hit/miss counters.
pub const LINK_CACHE_STATS_VAR: &str = "WELD_LINK_CACHE_STATS";

/// Loads and validates a `weld.toml` configuration from a project directory.
///
/// Reads `<project_dir>/weld.toml`, parses it, validates it, and applies
/// environment overrides. A missing file yields the default configuration
/// (still subject to environment overrides).
pub fn load_config(project_dir: &Path) -> Result<BuildConfig, ConfigError> {
    let config_path = project_dir.join("weld.toml");
    let mut config = if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        load_config_from_str(&content)?
    } else {
        BuildConfig::default()
    };
    apply_env_overrides(&mut config)?;
    Ok(config)
}

/// Parses and validates a `weld.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies. Does not apply
/// environment overrides.
pub fn load_config_from_str(content: &str) -> Result<BuildConfig, ConfigError> {
    let config: BuildConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Applies environment-variable overrides to an already-loaded configuration.
pub fn apply_env_overrides(config: &mut BuildConfig) -> Result<(), ConfigError> {
    if let Ok(value) = std::env::var(LINK_CACHE_SIZE_VAR) {
        let bytes: u64 = value.parse().map_err(|_| ConfigError::InvalidEnvValue {
            variable: LINK_CACHE_SIZE_VAR,
            value: value.clone(),
        })?;
        config.cache.link_bytes = bytes;
    }
    if let Ok(value) = std::env::var(LINK_CACHE_STATS_VAR) {
        config.cache.track_stats = !value.is_empty() && value != "0";
    }
    validate_config(config)
}

/// Validates that configuration values are consistent.
fn validate_config(config: &BuildConfig) -> Result<(), ConfigError> {
    if config.cache.link_bytes == 0 {
        return Err(ConfigError::ValidationError(
            "cache.link_bytes must be positive".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DEFAULT_LINK_CACHE_BYTES;

    #[test]
    fn parse_empty_config() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.cache.link_bytes, DEFAULT_LINK_CACHE_BYTES);
    }

    #[test]
    fn parse_cache_section() {
        let toml = r#"
[cache]
link_bytes = 4096
track_stats = true
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.cache.link_bytes, 4096);
        assert!(config.cache.track_stats);
    }

    #[test]
    fn zero_budget_rejected() {
        let toml = r#"
[cache]
link_bytes = 0
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn malformed_toml_rejected() {
        let err = load_config_from_str("[cache").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }
}
