//! In-memory store

use super::KeyValueStore;
use crate::error::EngineError;
use std::collections::BTreeMap;

/// In-process key-value store.
///
/// The whole document can be exported and re-imported as one JSON object,
/// which is how FFI hosts persist engine state between launches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Load a store from an exported JSON document
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self {
            entries: serde_json::from_str(json)?,
        })
    }

    /// Export the store as one JSON document
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.entries)
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn write(&mut self, key: &str, value: String) -> Result<(), EngineError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, keys: &[&str]) -> Result<(), EngineError> {
        for key in keys {
            self.entries.remove(*key);
        }
        Ok(())
    }
}
