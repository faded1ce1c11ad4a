//! Error types for cloud-config-client.

/// Result type alias for cloud-config-client operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur while fetching, merging, decrypting or resolving configuration.
///
/// Every error raised during [`CloudConfigBuilder::build`](crate::core::CloudConfigBuilder::build)
/// is fatal: no [`CloudConfig`](crate::core::CloudConfig) is produced.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Application name, profiles or connection settings could not be determined.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The configuration server could not be reached or returned an unusable response.
    #[error("Failed to fetch remote configuration: {0}")]
    RemoteFetch(String),

    /// An encrypted property could not be decrypted.
    #[error("Failed to decrypt property '{key}': {reason}")]
    Decryption {
        /// Key of the property whose value failed to decrypt
        key: String,
        /// Why decryption failed (never contains the value itself)
        reason: String,
    },

    /// A `${...}` placeholder could not be resolved.
    #[error("Could not resolve placeholder '{0}'")]
    UnresolvablePlaceholder(String),

    /// Connection settings could not be loaded from file or environment.
    #[error("Failed to load connection settings: {0}")]
    Settings(String),

    /// Attempted to use a feature that is not enabled.
    #[error("Feature not enabled: {0}")]
    FeatureNotEnabled(&'static str),

    /// IO error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ConfigError {
    /// Create a decryption error for the given property key.
    pub fn decryption(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Decryption {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if this error was raised before any network call was made.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}
