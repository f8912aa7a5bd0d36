//! Concurrent string-keyed attribute store shared by plugins.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::slot::Slot;

/// Values plugins may stash in the [`AttributeStore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AttributeValue {
    /// A boolean switch.
    Flag(bool),
    /// A signed integer.
    Integer(i64),
    /// A single string.
    Text(String),
    /// A list of strings, e.g. class names.
    Texts(Vec<String>),
    /// A previously allocated slot.
    Slot(Slot),
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<String>> for AttributeValue {
    fn from(value: Vec<String>) -> Self {
        Self::Texts(value)
    }
}

impl From<Slot> for AttributeValue {
    fn from(value: Slot) -> Self {
        Self::Slot(value)
    }
}

/// Last-write-wins key/value map safe for concurrent use.
#[derive(Debug, Default)]
pub struct AttributeStore {
    entries: DashMap<String, AttributeValue>,
}

impl AttributeStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `key`, returning the value it replaced.
    pub fn set(
        &self,
        key: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Option<AttributeValue> {
        self.entries.insert(key.into(), value.into())
    }

    /// Returns a copy of the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<AttributeValue> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Removes and returns the value stored under `key`.
    pub fn remove(&self, key: &str) -> Option<AttributeValue> {
        self.entries.remove(key).map(|(_, value)| value)
    }

    /// Returns the number of stored attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
