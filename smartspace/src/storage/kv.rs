//! Key-value backends behind the profile store

use std::collections::HashMap;
use std::sync::RwLock;

use crate::errors::SmartSpaceError;
use crate::filesys::dir::Dir;

/// A string key-value store, the persistence medium of the dashboard.
///
/// Reads and writes complete before returning, so a read always observes
/// the latest write.
pub trait KeyValueStore: Send + Sync {
    /// Get the raw value for a key
    fn get(&self, key: &str) -> Result<Option<String>, SmartSpaceError>;

    /// Set the raw value for a key
    fn set(&self, key: &str, value: &str) -> Result<(), SmartSpaceError>;

    /// Remove a key; removing an absent key is not an error
    fn remove(&self, key: &str) -> Result<(), SmartSpaceError>;
}

/// In-memory store, lost on drop
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, SmartSpaceError> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SmartSpaceError> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SmartSpaceError> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.remove(key);
        Ok(())
    }
}

/// File-backed store: one `<key>.json` document per key in a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: Dir,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating the directory
    pub fn open(dir: Dir) -> Result<Self, SmartSpaceError> {
        dir.create()?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Dir {
        &self.dir
    }

    fn file_for(&self, key: &str) -> Result<crate::filesys::file::File, SmartSpaceError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(SmartSpaceError::StorageError(format!(
                "Invalid storage key: {:?}",
                key
            )));
        }
        Ok(self.dir.file(&format!("{}.json", key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, SmartSpaceError> {
        self.file_for(key)?.read_string()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SmartSpaceError> {
        self.file_for(key)?.write_atomic(value.as_bytes())
    }

    fn remove(&self, key: &str) -> Result<(), SmartSpaceError> {
        self.file_for(key)?.delete()
    }
}
