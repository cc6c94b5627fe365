//! Persistence gateway
//!
//! The engine reads and writes its state only through [`KeyValueStore`], a
//! string-keyed store of serialized values. [`PersistenceGateway`] layers typed
//! get/set/append/clear on top of it and applies the "never fail on stale
//! local state" policy: a value that does not parse is treated as absent.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::EngineError;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Fixed keys of the persisted engine state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    /// Interaction event log
    Events,
    /// Vulnerability profile
    Profile,
    /// Distortion profile
    Distortion,
    /// Integrated pattern sequence
    Pattern,
    /// Analysis history
    History,
}

impl StorageKey {
    pub const ALL: [StorageKey; 5] = [
        StorageKey::Events,
        StorageKey::Profile,
        StorageKey::Distortion,
        StorageKey::Pattern,
        StorageKey::History,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StorageKey::Events => "boundier_events",
            StorageKey::Profile => "boundier_profile",
            StorageKey::Distortion => "boundier_distortion",
            StorageKey::Pattern => "boundier_pattern",
            StorageKey::History => "boundier_history",
        }
    }
}

/// Backing store of serialized values
pub trait KeyValueStore {
    /// Raw serialized value under `key`, if any
    fn read(&self, key: &str) -> Option<String>;

    /// Store a serialized value; last write wins
    fn write(&mut self, key: &str, value: String) -> Result<(), EngineError>;

    /// Remove every listed key in one operation
    fn remove(&mut self, keys: &[&str]) -> Result<(), EngineError>;

    /// Persist pending writes
    fn flush(&mut self) -> Result<(), EngineError> {
        Ok(())
    }
}

/// Typed access to a [`KeyValueStore`]
#[derive(Debug, Clone, Default)]
pub struct PersistenceGateway<S> {
    store: S,
}

impl<S: KeyValueStore> PersistenceGateway<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    /// Stored value, distinguishing corrupt from absent
    pub fn try_get<T: DeserializeOwned>(&self, key: StorageKey) -> Result<Option<T>, EngineError> {
        match self.store.read(key.as_str()) {
            None => Ok(None),
            Some(raw) => serde_json::from_str(&raw).map(Some).map_err(|e| {
                EngineError::StorageCorrupt {
                    key: key.as_str().to_string(),
                    reason: e.to_string(),
                }
            }),
        }
    }

    /// Stored value, or `default` when absent or corrupt
    pub fn get<T: DeserializeOwned>(&self, key: StorageKey, default: T) -> T {
        self.get_or_else(key, || default)
    }

    /// Stored value, or the result of `default` when absent or corrupt
    pub fn get_or_else<T: DeserializeOwned>(&self, key: StorageKey, default: impl FnOnce() -> T) -> T {
        match self.try_get(key) {
            Ok(Some(value)) => value,
            Ok(None) => default(),
            Err(e) => {
                tracing::warn!(error = %e, "falling back to default");
                default()
            }
        }
    }

    /// Serialize and store `value` under `key`
    pub fn set<T: Serialize + ?Sized>(&mut self, key: StorageKey, value: &T) -> Result<(), EngineError> {
        let raw = serde_json::to_string(value)?;
        self.store.write(key.as_str(), raw)
    }

    /// Push `item` onto the sequence stored under `key`
    pub fn append<T: Serialize + DeserializeOwned>(
        &mut self,
        key: StorageKey,
        item: T,
    ) -> Result<(), EngineError> {
        let mut items: Vec<T> = self.get_or_else(key, Vec::new);
        items.push(item);
        self.set(key, &items)
    }

    /// Remove every listed key in a single store operation
    pub fn clear(&mut self, keys: &[StorageKey]) -> Result<(), EngineError> {
        let names: Vec<&str> = keys.iter().map(|k| k.as_str()).collect();
        self.store.remove(&names)
    }

    pub fn flush(&mut self) -> Result<(), EngineError> {
        self.store.flush()
    }
}
