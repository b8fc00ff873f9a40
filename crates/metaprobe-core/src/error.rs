//! Core error types for metaprobe.
//!
//! `MetaprobeError` covers input the core types reject; `ConfigError` covers
//! loading the configuration file. Subsystem crates keep their own error
//! enums and wrap these at crate boundaries.

use thiserror::Error;

/// Central error type for metaprobe operations.
#[derive(Error, Debug)]
pub enum MetaprobeError {
    /// Scan target could not be turned into a crawlable origin
    #[error("invalid scan target '{target}': {reason}")]
    InvalidTarget {
        /// Target string as supplied by the caller
        target: String,
        /// Why it was rejected
        reason: String,
    },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to determine config directory path
    #[error("could not determine config directory (XDG base directories not available)")]
    NoConfigDir,

    /// Failed to parse TOML
    #[error("failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// I/O error reading config
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using `MetaprobeError`.
pub type Result<T> = std::result::Result<T, MetaprobeError>;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MetaprobeError::InvalidTarget {
            target: "ftp://x".to_string(),
            reason: "unsupported scheme".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid scan target 'ftp://x': unsupported scheme"
        );

        let err = ConfigError::NoConfigDir;
        assert_eq!(
            err.to_string(),
            "could not determine config directory (XDG base directories not available)"
        );
    }

    #[test]
    fn test_config_error_from_toml() {
        let parse_err = toml::from_str::<toml::Value>("crawler = [").unwrap_err();
        let err: ConfigError = parse_err.into();
        assert!(matches!(err, ConfigError::ParseError(_)));
        assert!(err.to_string().starts_with("failed to parse config TOML"));
    }
}
