//! Persistent containers for the value tree.
//!
//! Both containers wrap their contents in an `Arc`; cloning is O(1) and every
//! `with_*` / `without_*` call copies on write, leaving the receiver untouched.

use indexmap::IndexMap;
use std::sync::Arc;

use crate::ConfigValue;

// ============================================================================
// OBJECT
// ============================================================================

/// Ordered string-keyed map of nodes.
///
/// Key order is kept for diagnostics and output; equality and lookups are by
/// key only.
#[derive(Debug, Clone, Default)]
pub struct ConfigObject {
    entries: Arc<IndexMap<String, ConfigValue>>,
}

impl ConfigObject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &ConfigValue> {
        self.entries.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The only entry of a single-key object
    pub fn single_entry(&self) -> Option<(&str, &ConfigValue)> {
        if self.entries.len() == 1 {
            self.iter().next()
        } else {
            None
        }
    }

    /// New object with `key` set to `value`.
    ///
    /// An existing key keeps its position; a new key is appended.
    pub fn with_value(&self, key: impl Into<String>, value: ConfigValue) -> Self {
        let mut entries = Arc::clone(&self.entries);
        Arc::make_mut(&mut entries).insert(key.into(), value);
        Self { entries }
    }

    /// New object without `key`. Remaining keys keep their relative order.
    pub fn without_key(&self, key: &str) -> Self {
        if !self.entries.contains_key(key) {
            return self.clone();
        }
        let mut entries = Arc::clone(&self.entries);
        Arc::make_mut(&mut entries).shift_remove(key);
        Self { entries }
    }

    /// Merge `fallback` underneath this object.
    ///
    /// Keys present here always win. When both sides hold an object under the
    /// same key the two objects are merged recursively with the same rule.
    /// Keys only present in `fallback` are appended in fallback order.
    pub fn with_fallback(&self, fallback: &ConfigObject) -> Self {
        if fallback.is_empty() {
            return self.clone();
        }
        let mut merged: IndexMap<String, ConfigValue> =
            IndexMap::with_capacity(self.len() + fallback.len());
        for (key, value) in self.entries.iter() {
            let value = match fallback.get(key) {
                Some(under) => value.with_fallback(under),
                None => value.clone(),
            };
            merged.insert(key.clone(), value);
        }
        for (key, value) in fallback.entries.iter() {
            if !merged.contains_key(key) {
                merged.insert(key.clone(), value.clone());
            }
        }
        Self {
            entries: Arc::new(merged),
        }
    }

    /// True when both objects share the same underlying storage
    pub fn ptr_eq(&self, other: &ConfigObject) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries)
    }
}

impl PartialEq for ConfigObject {
    fn eq(&self, other: &Self) -> bool {
        // IndexMap equality ignores insertion order
        self.ptr_eq(other) || self.entries == other.entries
    }
}

impl FromIterator<(String, ConfigValue)> for ConfigObject {
    fn from_iter<I: IntoIterator<Item = (String, ConfigValue)>>(iter: I) -> Self {
        Self {
            entries: Arc::new(iter.into_iter().collect()),
        }
    }
}

// ============================================================================
// LIST
// ============================================================================

/// Ordered sequence of nodes
#[derive(Debug, Clone, Default)]
pub struct ConfigList {
    items: Arc<Vec<ConfigValue>>,
}

impl ConfigList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, index: usize) -> Option<&ConfigValue> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ConfigValue> {
        self.items.iter()
    }
}

impl PartialEq for ConfigList {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.items, &other.items) || self.items == other.items
    }
}

impl From<Vec<ConfigValue>> for ConfigList {
    fn from(items: Vec<ConfigValue>) -> Self {
        Self {
            items: Arc::new(items),
        }
    }
}

impl FromIterator<ConfigValue> for ConfigList {
    fn from_iter<I: IntoIterator<Item = ConfigValue>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}

impl<'a> IntoIterator for &'a ConfigList {
    type Item = &'a ConfigValue;
    type IntoIter = std::slice::Iter<'a, ConfigValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
