//! Ordered key/value parameter bag passed between navigation steps.

use serde::{de::DeserializeOwned, ser::SerializeMap, Serialize, Serializer};
use serde_json::{Map, Value};

static EMPTY_PARAMETERS: NavigationParameters = NavigationParameters {
    entries: Vec::new(),
};

/// Ordered mapping from string keys to JSON values.
///
/// Insertion order is preserved for diagnostics while lookup is by key. Setting an existing key
/// replaces its value in place, so a key keeps the position of its first insertion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavigationParameters {
    entries: Vec<(String, Value)>,
}

impl NavigationParameters {
    /// Creates an empty, owned parameter bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the canonical immutable empty bag.
    ///
    /// Callers that need to mutate must clone it first, which keeps one navigation call from
    /// leaking keys into another.
    pub fn empty() -> &'static NavigationParameters {
        &EMPTY_PARAMETERS
    }

    /// Builder form of [`Self::set`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Inserts or overwrites `key`, returning the previous value when one existed.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Returns the raw value for `key`, or `None` when the key was not supplied.
    pub fn try_get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    /// Returns the value for `key` deserialized as `T`.
    ///
    /// Missing keys and values of a different shape both yield `None`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.try_get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Returns whether `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.try_get(key).is_some()
    }

    /// Removes `key`, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let index = self.entries.iter().position(|(existing, _)| existing == key)?;
        Some(self.entries.remove(index).1)
    }

    /// Number of entries.
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the bag holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copies every entry of `other` into `self`.
    ///
    /// Values from `other` win on key collisions; keys new to `self` are appended in the order
    /// they appear in `other`.
    pub fn merge(&mut self, other: &NavigationParameters) {
        for (key, value) in &other.entries {
            self.set(key.clone(), value.clone());
        }
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value))
    }

    /// Iterates keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for NavigationParameters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut parameters = Self::new();
        for (key, value) in iter {
            parameters.set(key, value);
        }
        parameters
    }
}

impl IntoIterator for NavigationParameters {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl From<Map<String, Value>> for NavigationParameters {
    fn from(map: Map<String, Value>) -> Self {
        map.into_iter().collect()
    }
}

impl Serialize for NavigationParameters {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
