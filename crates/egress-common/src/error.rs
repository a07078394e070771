//! Error types for configuration loading.

use thiserror::Error;

/// Errors that can occur while loading or validating a [`ClientConfig`](crate::ClientConfig).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid TOML or has unexpected fields.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// An environment override could not be parsed.
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue {
        /// The environment variable name.
        key: &'static str,
        /// The raw value that failed to parse.
        value: String,
    },

    /// The configuration parsed but is semantically invalid.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type alias using `ConfigError`.
pub type Result<T> = std::result::Result<T, ConfigError>;
