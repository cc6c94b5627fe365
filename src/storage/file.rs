//! File-backed store
//!
//! All keys live in one JSON document on disk. Writes are buffered in memory
//! and persisted on [`KeyValueStore::flush`] by writing a sibling temp file
//! and renaming it over the document, so readers never see a half-applied
//! update.

use super::KeyValueStore;
use crate::error::EngineError;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// JSON document store on the local filesystem
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
    dirty: bool,
    recovered: bool,
}

impl FileStore {
    /// Open the document at `path`.
    ///
    /// A missing file yields an empty store. A file that is not a valid
    /// document is logged and treated as empty; it is overwritten on the next
    /// flush.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, EngineError> {
        let path = path.into();

        let (entries, recovered) = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(entries) => (entries, false),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "store document is corrupt, starting empty");
                    (BTreeMap::new(), true)
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => (BTreeMap::new(), false),
            Err(e) => return Err(e.into()),
        };

        tracing::info!(path = %path.display(), keys = entries.len(), "opened store");

        Ok(Self {
            path,
            entries,
            dirty: false,
            recovered,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the on-disk document was unreadable when opened
    pub fn recovered_from_corruption(&self) -> bool {
        self.recovered
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl KeyValueStore for FileStore {
    fn read(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn write(&mut self, key: &str, value: String) -> Result<(), EngineError> {
        self.entries.insert(key.to_string(), value);
        self.dirty = true;
        Ok(())
    }

    fn remove(&mut self, keys: &[&str]) -> Result<(), EngineError> {
        for key in keys {
            if self.entries.remove(*key).is_some() {
                self.dirty = true;
            }
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), EngineError> {
        if !self.dirty {
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let document = serde_json::to_string_pretty(&self.entries)?;
        let temp = self.temp_path();
        fs::write(&temp, document)?;
        fs::rename(&temp, &self.path)?;

        self.dirty = false;
        self.recovered = false;
        tracing::debug!(path = %self.path.display(), keys = self.entries.len(), "flushed store");
        Ok(())
    }
}
