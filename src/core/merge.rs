//! Precedence merge of property sources.

use crate::sources::SourceList;
use std::collections::BTreeMap;

/// The flat result of merging a [`SourceList`].
///
/// Keys are unique; for a key present in several sources the value of the
/// highest-priority (earliest) source is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedConfig(BTreeMap<String, String>);

impl MergedConfig {
    /// Value for `key`, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Returns true if `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no properties.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over properties in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// A copy of the underlying map.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.0.clone()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut String)> {
        self.0.iter_mut()
    }
}

impl From<BTreeMap<String, String>> for MergedConfig {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

/// Merge `sources` into one map.
///
/// Sources are applied from lowest to highest priority (last element first), so
/// an earlier source overwrites a later one for the same key. Values are not
/// inspected.
pub fn merge(sources: &SourceList) -> MergedConfig {
    let mut merged = BTreeMap::new();

    for source in sources.iter().rev() {
        for (key, value) in &source.values {
            merged.insert(key.clone(), value.clone());
        }
    }

    MergedConfig(merged)
}
