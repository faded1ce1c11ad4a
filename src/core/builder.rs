//! Builder that runs the fetch, merge and decrypt pipeline.

use crate::core::{
    CloudConfig, ConfigOrigin, ConnectionSettings, HostInfo, NoFallback, PropertyResolver, merge,
};
use crate::crypto::DecryptionContext;
use crate::crypto::filter::decrypt_properties;
use crate::error::Result;
use crate::sources::SourceFetcher;
use std::time::Instant;
use tracing::{debug, info};

/// Builder for constructing a [`CloudConfig`].
///
/// The builder is the only "uninitialized" state: [`build`](Self::build) either
/// returns a complete configuration or an error, never something in between.
///
/// # Examples
///
/// ```rust,no_run
/// use cloud_config_client::prelude::*;
///
/// # async fn example() -> Result<()> {
/// let config = CloudConfig::builder()
///     .with_settings(
///         ConnectionSettings::new()
///             .with_application_name("orders")
///             .with_profiles("prod")
///             .with_encryption_key("0123456789abcdef"),
///     )
///     .build()
///     .await?;
///
/// println!("{} properties", config.len());
/// # Ok(())
/// # }
/// ```
pub struct CloudConfigBuilder {
    settings: ConnectionSettings,
    host: Option<HostInfo>,
    fetcher: Option<Box<dyn SourceFetcher>>,
    decryption: Option<DecryptionContext>,
    fallback: Box<dyn PropertyResolver>,
}

impl CloudConfigBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            settings: ConnectionSettings::new(),
            host: None,
            fetcher: None,
            decryption: None,
            fallback: Box::new(NoFallback),
        }
    }

    /// Set the connection settings.
    pub fn with_settings(mut self, settings: ConnectionSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Set the host identity used when settings omit application name or profiles.
    ///
    /// Defaults to [`HostInfo::detect`].
    pub fn with_host(mut self, host: HostInfo) -> Self {
        self.host = Some(host);
        self
    }

    /// Use a custom fetcher instead of the HTTP fetcher built from the settings.
    pub fn with_fetcher<F: SourceFetcher + 'static>(mut self, fetcher: F) -> Self {
        self.fetcher = Some(Box::new(fetcher));
        self
    }

    /// Use a custom decryption context instead of the one built from the settings.
    pub fn with_decryption(mut self, context: DecryptionContext) -> Self {
        self.decryption = Some(context);
        self
    }

    /// Set the resolver consulted for keys the server does not provide.
    pub fn with_fallback<R: PropertyResolver + 'static>(mut self, fallback: R) -> Self {
        self.fallback = Box::new(fallback);
        self
    }

    /// Fetch, merge and decrypt the configuration.
    ///
    /// Application name, profiles and decryption settings are validated before any
    /// request is made.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Application name or profiles cannot be determined ([`ConfigError::Configuration`])
    /// - The server cannot be reached or answers badly ([`ConfigError::RemoteFetch`])
    /// - Any marked value fails to decrypt ([`ConfigError::Decryption`])
    ///
    /// [`ConfigError::Configuration`]: crate::error::ConfigError::Configuration
    /// [`ConfigError::RemoteFetch`]: crate::error::ConfigError::RemoteFetch
    /// [`ConfigError::Decryption`]: crate::error::ConfigError::Decryption
    pub async fn build(self) -> Result<CloudConfig> {
        debug!(settings = ?self.settings, "Setting up configuration client");

        let host = self.host.unwrap_or_else(HostInfo::detect);
        let target = self.settings.fetch_target(&host)?;

        let decryption = match self.decryption {
            Some(context) => Some(context),
            None => self
                .settings
                .encryption()
                .map(DecryptionContext::new)
                .transpose()?,
        };
        if let Some(context) = &decryption {
            debug!(algorithm = context.algorithm(), mode = context.mode(), "Decryption enabled");
        }

        let fetcher = match self.fetcher {
            Some(fetcher) => fetcher,
            None => default_fetcher(&self.settings)?,
        };

        debug!(
            fetcher = %fetcher.name(),
            application = %target.application,
            profiles = %target.profiles_joined(),
            label = %target.label,
            "Fetching configuration"
        );
        let started = Instant::now();
        let document = fetcher.fetch(&target).await?;

        for source in document.property_sources.iter().rev() {
            debug!(source = %source.name, properties = source.values.len(), "Merging property source");
        }
        let mut properties = merge(&document.property_sources);
        let decrypted = decrypt_properties(&mut properties, decryption.as_ref())?;

        info!(
            application = %target.application,
            profiles = %target.profiles_joined(),
            sources = document.property_sources.len(),
            properties = properties.len(),
            decrypted,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Remote configuration loaded"
        );

        let origin = ConfigOrigin {
            source_names: document.property_sources.names(),
            application: target.application,
            profiles: target.profiles,
            label: target.label,
            version: document.version,
            state: document.state,
        };

        Ok(CloudConfig::from_parts(properties, origin, self.fallback))
    }
}

impl Default for CloudConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CloudConfig {
    /// Create a new builder for constructing a configuration.
    pub fn builder() -> CloudConfigBuilder {
        CloudConfigBuilder::new()
    }
}

#[cfg(feature = "http")]
fn default_fetcher(settings: &ConnectionSettings) -> Result<Box<dyn SourceFetcher>> {
    Ok(Box::new(crate::sources::HttpFetcher::from_settings(settings)?))
}

#[cfg(not(feature = "http"))]
fn default_fetcher(_settings: &ConnectionSettings) -> Result<Box<dyn SourceFetcher>> {
    Err(crate::error::ConfigError::FeatureNotEnabled("http"))
}
