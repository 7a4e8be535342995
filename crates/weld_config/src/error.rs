//! Error types for configuration loading and validation.

/// Errors that can occur when loading or validating a `weld.toml`
/// configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An I/O error occurred while reading the configuration file.
    #[error("failed to read configuration: {0}")]
    IoError(#[from] std::io::Error),

    /// The TOML content could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// An environment override held a value of the wrong shape.
    #[error("invalid value for {variable}: {value}")]
    InvalidEnvValue {
        /// The environment variable name.
        variable: &'static str,
        /// The rejected value.
        value: String,
    },

    /// A configuration value failed validation.
    #[error("validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_parse_error() {
        let err = ConfigError::ParseError("expected '=' at line 3".to_string());
        assert_eq!(
            format!("{err}"),
            "failed to parse configuration: expected '=' at line 3"
        );
    }

    #[test]
    fn display_invalid_env_value() {
        let err = ConfigError::InvalidEnvValue {
            variable: "WELD_LINK_CACHE_SIZE",
            value: "lots".to_string(),
        };
        assert_eq!(format!("{err}"), "invalid value for WELD_LINK_CACHE_SIZE: lots");
    }

    #[test]
    fn display_validation_error() {
        let err = ConfigError::ValidationError("cache.link_bytes must be positive".to_string());
        assert_eq!(
            format!("{err}"),
            "validation error: cache.link_bytes must be positive"
        );
    }
}
