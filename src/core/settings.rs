//! Connection settings and host identity.

use crate::crypto::EncryptionSettings;
use crate::error::{ConfigError, Result};
use crate::sources::FetchTarget;
use config::{Environment, File};
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Default configuration server URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8888/";

/// Default label (branch) to fetch.
pub const DEFAULT_LABEL: &str = "master";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default environment variable prefix for [`ConnectionSettings::load`].
pub const DEFAULT_ENV_PREFIX: &str = "CLOUD_CONFIG";

/// Everything needed to reach the configuration server.
///
/// # Examples
///
/// ```rust
/// use cloud_config_client::core::ConnectionSettings;
///
/// let settings = ConnectionSettings::new()
///     .with_base_url("https://config.example.com/")
///     .with_application_name("orders")
///     .with_profiles("prod, eu")
///     .with_basic_auth("reader", "s3cret");
///
/// assert_eq!(settings.profiles(), ["prod", "eu"]);
/// assert_eq!(settings.label(), "master");
/// ```
#[derive(Clone)]
pub struct ConnectionSettings {
    base_url: String,
    application_name: Option<String>,
    profiles: Vec<String>,
    label: String,
    username: Option<String>,
    password: Option<String>,
    encryption: Option<EncryptionSettings>,
    timeout: Duration,
}

impl ConnectionSettings {
    /// Create settings with all defaults.
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            application_name: None,
            profiles: Vec::new(),
            label: DEFAULT_LABEL.to_string(),
            username: None,
            password: None,
            encryption: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Load settings from an optional file, then environment variables.
    ///
    /// Environment variables use `prefix` followed by `_`, with `__` separating
    /// nested keys, e.g. `CLOUD_CONFIG_BASE_URL` or `CLOUD_CONFIG_ENCRYPTION__KEY`.
    /// Environment values override file values.
    ///
    /// Supported file formats: YAML (.yaml, .yml), TOML (.toml), JSON (.json)
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Settings`] if the file is missing, has an unsupported
    /// extension or cannot be parsed, and [`ConfigError::Configuration`] for an
    /// unknown algorithm or mode.
    pub fn load(path: Option<&Path>, prefix: &str) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            validate_extension(path)?;
            if !path.exists() {
                return Err(ConfigError::Settings(format!(
                    "Settings file not found: {}",
                    path.display()
                )));
            }
            builder = builder.add_source(File::from(path.to_path_buf()).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(prefix)
                .prefix_separator("_")
                .separator("__"),
        );

        let raw: RawSettings = builder
            .build()
            .map_err(|e| ConfigError::Settings(format!("Failed to read settings: {}", e)))?
            .try_deserialize()
            .map_err(|e| ConfigError::Settings(format!("Failed to parse settings: {}", e)))?;

        raw.into_settings()
    }

    /// Set the base URL of the configuration server.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the application name. Blank names fall back to the host identity.
    pub fn with_application_name(mut self, name: impl Into<String>) -> Self {
        self.application_name = non_blank(name.into());
        self
    }

    /// Set the profiles from a comma-separated list.
    pub fn with_profiles(mut self, profiles: &str) -> Self {
        self.profiles = split_list(profiles);
        self
    }

    /// Set the profiles from a list.
    pub fn with_profile_list<I, S>(mut self, profiles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.profiles = profiles
            .into_iter()
            .filter_map(|p| non_blank(p.into()))
            .collect();
        self
    }

    /// Set the label (branch, tag or revision).
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Set Basic authentication credentials.
    ///
    /// Credentials are only sent when both are non-empty.
    pub fn with_basic_auth(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Enable decryption with the default algorithm and mode. An empty key disables it.
    pub fn with_encryption_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.encryption = (!key.is_empty()).then(|| EncryptionSettings::new(key));
        self
    }

    /// Enable decryption with explicit settings. An empty key disables it.
    pub fn with_encryption(mut self, encryption: EncryptionSettings) -> Self {
        self.encryption = (!encryption.key.is_empty()).then_some(encryption);
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Base URL of the configuration server.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Configured application name, if any.
    pub fn application_name(&self) -> Option<&str> {
        self.application_name.as_deref()
    }

    /// Configured profiles, possibly empty.
    pub fn profiles(&self) -> &[String] {
        &self.profiles
    }

    /// Label to fetch.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Basic-auth credentials, present only when both are non-empty.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => Some((user, pass)),
            _ => None,
        }
    }

    /// Encryption settings; `Some` means decryption is enabled.
    pub fn encryption(&self) -> Option<&EncryptionSettings> {
        self.encryption.as_ref()
    }

    /// Request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Resolve the request coordinates, falling back to `host` for the
    /// application name and profiles.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Configuration`] if no application name or no profile
    /// can be determined, or the label is blank.
    pub fn fetch_target(&self, host: &HostInfo) -> Result<FetchTarget> {
        let application = self
            .application_name
            .clone()
            .or_else(|| host.application_id.clone().and_then(non_blank))
            .ok_or_else(|| {
                ConfigError::Configuration(
                    "Could not determine the application name: none configured and the host has no identifier"
                        .to_string(),
                )
            })?;

        let profiles = if self.profiles.is_empty() {
            host.active_profiles
                .iter()
                .filter_map(|p| non_blank(p.clone()))
                .collect()
        } else {
            self.profiles.clone()
        };
        if profiles.is_empty() {
            return Err(ConfigError::Configuration(
                "No profiles could be detected: none configured and the host has no active profiles"
                    .to_string(),
            ));
        }

        let label = non_blank(self.label.clone()).ok_or_else(|| {
            ConfigError::Configuration("Label must not be empty".to_string())
        })?;

        Ok(FetchTarget {
            application,
            profiles,
            label,
        })
    }
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("base_url", &self.base_url)
            .field("application_name", &self.application_name)
            .field("profiles", &self.profiles)
            .field("label", &self.label)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "****"))
            .field("encryption", &self.encryption)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Identity of the host application, used when settings leave gaps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostInfo {
    /// The host's own identifier, used as the application name fallback.
    pub application_id: Option<String>,
    /// The host's active profiles, used as the profiles fallback.
    pub active_profiles: Vec<String>,
}

impl HostInfo {
    /// Environment variable read by [`HostInfo::detect`] for active profiles.
    pub const PROFILES_ENV: &'static str = "APP_PROFILES_ACTIVE";

    /// Create host info with an application identifier and no profiles.
    pub fn new(application_id: impl Into<String>) -> Self {
        Self {
            application_id: non_blank(application_id.into()),
            active_profiles: Vec::new(),
        }
    }

    /// Set the active profiles.
    pub fn with_active_profiles<I, S>(mut self, profiles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.active_profiles = profiles.into_iter().map(Into::into).collect();
        self
    }

    /// Detect the running process: executable file stem and `APP_PROFILES_ACTIVE`.
    pub fn detect() -> Self {
        let application_id = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .and_then(non_blank);

        let active_profiles = std::env::var(Self::PROFILES_ENV)
            .map(|raw| split_list(&raw))
            .unwrap_or_default();

        Self {
            application_id,
            active_profiles,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSettings {
    base_url: Option<String>,
    application_name: Option<String>,
    profiles: Option<String>,
    label: Option<String>,
    username: Option<String>,
    password: Option<String>,
    timeout_secs: Option<u64>,
    encryption: Option<RawEncryption>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawEncryption {
    algorithm: Option<String>,
    mode: Option<String>,
    key: Option<String>,
    random_iv: Option<bool>,
}

impl RawSettings {
    fn into_settings(self) -> Result<ConnectionSettings> {
        let mut settings = ConnectionSettings::new();

        if let Some(url) = self.base_url {
            settings = settings.with_base_url(url);
        }
        if let Some(name) = self.application_name {
            settings = settings.with_application_name(name);
        }
        if let Some(profiles) = self.profiles {
            settings = settings.with_profiles(&profiles);
        }
        if let Some(label) = self.label {
            settings = settings.with_label(label);
        }
        if let (Some(username), Some(password)) = (self.username, self.password) {
            settings = settings.with_basic_auth(username, password);
        }
        if let Some(secs) = self.timeout_secs {
            settings = settings.with_timeout(Duration::from_secs(secs));
        }

        if let Some(raw) = self.encryption {
            let mut encryption = EncryptionSettings::new(raw.key.unwrap_or_default());
            if let Some(algorithm) = raw.algorithm {
                encryption.algorithm = algorithm.parse()?;
            }
            if let Some(mode) = raw.mode {
                encryption.mode = mode.parse()?;
            }
            encryption.random_iv = raw.random_iv.unwrap_or(false);
            settings = settings.with_encryption(encryption);
        }

        Ok(settings)
    }
}

fn validate_extension(path: &Path) -> Result<()> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .ok_or_else(|| {
            ConfigError::Settings(format!(
                "Unable to determine file format for: {}",
                path.display()
            ))
        })?;

    match extension {
        "yaml" | "yml" | "toml" | "json" => Ok(()),
        _ => Err(ConfigError::Settings(format!(
            "Unsupported file extension: {}. Supported: .yaml, .yml, .toml, .json",
            extension
        ))),
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .filter_map(|p| non_blank(p.to_string()))
        .collect()
}
