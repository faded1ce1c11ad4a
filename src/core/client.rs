//! The resolution facade over a fully initialized configuration.

use crate::core::{MergedConfig, NoFallback, PropertyResolver};
use crate::error::{ConfigError, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Nesting limit for placeholder expansion.
const MAX_PLACEHOLDER_DEPTH: usize = 32;

/// Where the configuration came from, as reported by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOrigin {
    /// Application name that was requested.
    pub application: String,
    /// Profiles that were requested.
    pub profiles: Vec<String>,
    /// Label that was requested.
    pub label: String,
    /// Repository revision, if the server reported one.
    pub version: Option<String>,
    /// Server state marker, if reported.
    pub state: Option<String>,
    /// Names of the merged property sources, highest priority first.
    pub source_names: Vec<String>,
}

struct Inner {
    properties: MergedConfig,
    origin: ConfigOrigin,
    fallback: Box<dyn PropertyResolver>,
}

/// Immutable, fully resolved configuration.
///
/// A `CloudConfig` only exists once fetching, merging and decryption have all
/// succeeded. It is cheap to clone and can be read from any number of threads.
///
/// # Examples
///
/// ```rust,no_run
/// use cloud_config_client::prelude::*;
///
/// # async fn example() -> Result<()> {
/// let settings = ConnectionSettings::new()
///     .with_base_url("https://config.example.com/")
///     .with_application_name("orders")
///     .with_profiles("prod");
///
/// let config = CloudConfig::builder()
///     .with_settings(settings)
///     .with_fallback(EnvResolver::new())
///     .build()
///     .await?;
///
/// let url = config.resolve_placeholders("postgres://${db.host}:${db.port:5432}/orders")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct CloudConfig {
    inner: Arc<Inner>,
}

impl CloudConfig {
    /// Create a configuration directly from merged properties.
    ///
    /// Properties are taken as they are; no decryption is applied.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cloud_config_client::prelude::*;
    /// use std::collections::BTreeMap;
    ///
    /// let mut map = BTreeMap::new();
    /// map.insert("db.host".to_string(), "prod-db".to_string());
    ///
    /// let config = CloudConfig::new(MergedConfig::from(map), |_: &str| Some("unset".to_string()));
    /// assert_eq!(config.resolve("db.host").as_deref(), Some("prod-db"));
    /// assert_eq!(config.resolve("missing.key").as_deref(), Some("unset"));
    /// ```
    pub fn new<R: PropertyResolver + 'static>(properties: MergedConfig, fallback: R) -> Self {
        Self::from_parts(properties, ConfigOrigin::default(), Box::new(fallback))
    }

    pub(crate) fn from_parts(
        properties: MergedConfig,
        origin: ConfigOrigin,
        fallback: Box<dyn PropertyResolver>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                properties,
                origin,
                fallback,
            }),
        }
    }

    /// Resolve `key`: the merged value if present, otherwise whatever the
    /// fallback resolver answers.
    pub fn resolve(&self, key: &str) -> Option<String> {
        match self.inner.properties.get(key) {
            Some(value) => Some(value.to_string()),
            None => self.inner.fallback.resolve(key),
        }
    }

    /// Merged value for `key`, without consulting the fallback.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.inner.properties.get(key)
    }

    /// Returns true if the server provided `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.properties.contains_key(key)
    }

    /// Number of merged properties.
    pub fn len(&self) -> usize {
        self.inner.properties.len()
    }

    /// Returns true if the server provided no properties.
    pub fn is_empty(&self) -> bool {
        self.inner.properties.is_empty()
    }

    /// Merged property keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.inner.properties.iter().map(|(k, _)| k)
    }

    /// The merged properties.
    pub fn properties(&self) -> &MergedConfig {
        &self.inner.properties
    }

    /// Request coordinates and server metadata.
    pub fn origin(&self) -> &ConfigOrigin {
        &self.inner.origin
    }

    /// Copy of every merged property, for debugging or auditing.
    ///
    /// Sensitive values are **not** filtered: decrypted secrets are returned in
    /// plaintext. Callers are responsible for access control.
    pub fn dump_all(&self) -> BTreeMap<String, String> {
        self.inner.properties.to_map()
    }

    /// Substitute `${key}` and `${key:default}` placeholders in `text`.
    ///
    /// Keys are looked up with [`resolve`](Self::resolve), and resolved values are
    /// expanded in turn.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnresolvablePlaceholder`] for a key without value or
    /// default, an unterminated placeholder, or a circular reference.
    pub fn resolve_placeholders(&self, text: &str) -> Result<String> {
        let mut visiting = Vec::new();
        self.expand(text, &mut visiting)
    }

    fn expand(&self, text: &str, visiting: &mut Vec<String>) -> Result<String> {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let end = find_top_level(after, b'}')
                .ok_or_else(|| ConfigError::UnresolvablePlaceholder(rest[start..].to_string()))?;

            let body = &after[..end];
            let (raw_key, default) = match find_top_level(body, b':') {
                Some(colon) => (&body[..colon], Some(&body[colon + 1..])),
                None => (body, None),
            };
            let key = self.expand(raw_key, visiting)?;
            let key = key.as_str();

            if visiting.len() >= MAX_PLACEHOLDER_DEPTH || visiting.iter().any(|k| k == key) {
                return Err(ConfigError::UnresolvablePlaceholder(key.to_string()));
            }

            let value = match self.resolve(key) {
                Some(value) => {
                    visiting.push(key.to_string());
                    let expanded = self.expand(&value, visiting);
                    visiting.pop();
                    expanded?
                }
                None => match default {
                    Some(default) => self.expand(default, visiting)?,
                    None => return Err(ConfigError::UnresolvablePlaceholder(key.to_string())),
                },
            };

            out.push_str(&value);
            rest = &after[end + 1..];
        }

        out.push_str(rest);
        Ok(out)
    }
}

impl fmt::Debug for CloudConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudConfig")
            .field("origin", &self.inner.origin)
            .field("properties", &self.inner.properties.len())
            .finish_non_exhaustive()
    }
}

impl From<MergedConfig> for CloudConfig {
    fn from(properties: MergedConfig) -> Self {
        Self::new(properties, NoFallback)
    }
}

/// Index of the first `target` byte outside any nested `${...}`.
fn find_top_level(s: &str, target: u8) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'$' if bytes.get(i + 1) == Some(&b'{') => {
                depth += 1;
                i += 2;
                continue;
            }
            b if b == target && depth == 0 => return Some(i),
            b'}' if depth > 0 => depth -= 1,
            _ => {}
        }
        i += 1;
    }

    None
}
