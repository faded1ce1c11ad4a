//! Fallback resolvers consulted for keys the server does not provide.

use std::collections::{BTreeMap, HashMap};

/// A placeholder-resolution chain supplied by the host.
///
/// [`CloudConfig::resolve`](crate::core::CloudConfig::resolve) delegates to it for
/// every key missing from the merged configuration and returns its answer as is.
pub trait PropertyResolver: Send + Sync {
    /// Resolve `key`, or `None` if this resolver does not know it.
    fn resolve(&self, key: &str) -> Option<String>;
}

impl<F> PropertyResolver for F
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    fn resolve(&self, key: &str) -> Option<String> {
        self(key)
    }
}

impl PropertyResolver for HashMap<String, String> {
    fn resolve(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl PropertyResolver for BTreeMap<String, String> {
    fn resolve(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Resolver that knows nothing. The default fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFallback;

impl PropertyResolver for NoFallback {
    fn resolve(&self, _key: &str) -> Option<String> {
        None
    }
}

/// Resolves keys from process environment variables.
///
/// A key such as `db.host` is looked up first verbatim, then as `DB_HOST`
/// (upper-cased, `.` and `-` replaced by `_`), each with the optional prefix.
///
/// # Examples
///
/// ```rust
/// use cloud_config_client::core::{EnvResolver, PropertyResolver};
///
/// let resolver = EnvResolver::with_prefix("ORDERS_");
/// // Looks up `ORDERS_db.host`, then `ORDERS_DB_HOST`.
/// let _ = resolver.resolve("db.host");
/// ```
#[derive(Debug, Clone, Default)]
pub struct EnvResolver {
    prefix: String,
}

impl EnvResolver {
    /// Resolver without a prefix.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver that prepends `prefix` to every variable name.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    fn env_name(&self, key: &str) -> String {
        let normalized: String = key
            .chars()
            .map(|c| match c {
                '.' | '-' => '_',
                c => c.to_ascii_uppercase(),
            })
            .collect();
        format!("{}{}", self.prefix, normalized)
    }
}

impl PropertyResolver for EnvResolver {
    fn resolve(&self, key: &str) -> Option<String> {
        std::env::var(format!("{}{}", self.prefix, key))
            .or_else(|_| std::env::var(self.env_name(key)))
            .ok()
    }
}
