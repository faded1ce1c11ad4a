//! Property sources as returned by the configuration server.

use crate::error::{ConfigError, Result};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// A named group of properties contributed by one origin on the server.
///
/// Typically one per profile/application/label overlay, e.g.
/// `https://git.example.com/config-repo/orders-prod.yml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySource {
    /// Name of the origin (usually a file path or URI in the backing repository).
    pub name: String,
    /// Flat key/value properties of this source.
    pub values: BTreeMap<String, String>,
}

impl PropertySource {
    /// Create a new property source.
    pub fn new(name: impl Into<String>, values: BTreeMap<String, String>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Add a single property, returning the source.
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

/// Ordered property sources. The first element has the highest priority.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceList(Vec<PropertySource>);

impl SourceList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sources.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no sources.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate from highest to lowest priority.
    pub fn iter(&self) -> std::slice::Iter<'_, PropertySource> {
        self.0.iter()
    }

    /// Source names, highest priority first.
    pub fn names(&self) -> Vec<String> {
        self.0.iter().map(|s| s.name.clone()).collect()
    }
}

impl From<Vec<PropertySource>> for SourceList {
    fn from(sources: Vec<PropertySource>) -> Self {
        Self(sources)
    }
}

impl<'a> IntoIterator for &'a SourceList {
    type Item = &'a PropertySource;
    type IntoIter = std::slice::Iter<'a, PropertySource>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// The `Environment` document served at `/{application}/{profiles}/{label}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentDocument {
    /// Application name echoed by the server.
    pub name: Option<String>,
    /// Profiles echoed by the server.
    pub profiles: Vec<String>,
    /// Label echoed by the server.
    pub label: Option<String>,
    /// Revision of the backing repository, if reported.
    pub version: Option<String>,
    /// Server-side state marker, if reported.
    pub state: Option<String>,
    /// Property sources, highest priority first.
    pub property_sources: SourceList,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDocument {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    profiles: Option<Vec<String>>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    state: Option<String>,
    property_sources: Vec<RawPropertySource>,
}

#[derive(Deserialize)]
struct RawPropertySource {
    name: String,
    source: BTreeMap<String, JsonValue>,
}

impl EnvironmentDocument {
    /// Parse a response body.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::RemoteFetch`] if the body is not JSON, lacks a
    /// `propertySources` array, or holds a property value that is not a scalar.
    pub fn from_json(body: &str) -> Result<Self> {
        let raw: RawDocument = serde_json::from_str(body)
            .map_err(|e| ConfigError::RemoteFetch(format!("Malformed response body: {}", e)))?;

        let mut sources = Vec::with_capacity(raw.property_sources.len());
        for raw_source in raw.property_sources {
            let mut values = BTreeMap::new();
            for (key, value) in raw_source.source {
                let value = scalar_to_string(value).ok_or_else(|| {
                    ConfigError::RemoteFetch(format!(
                        "Property '{}' in source '{}' is not a scalar value",
                        key, raw_source.name
                    ))
                })?;
                values.insert(key, value);
            }
            sources.push(PropertySource::new(raw_source.name, values));
        }

        Ok(Self {
            name: raw.name,
            profiles: raw.profiles.unwrap_or_default(),
            label: raw.label,
            version: raw.version,
            state: raw.state,
            property_sources: SourceList::from(sources),
        })
    }
}

/// Servers render YAML/properties scalars as JSON strings, numbers or booleans.
fn scalar_to_string(value: JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        JsonValue::Null | JsonValue::Array(_) | JsonValue::Object(_) => None,
    }
}
