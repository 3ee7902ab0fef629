//! Durable key-value storage for user preferences.
//!
//! The page persists exactly one value (the theme), but the store is a
//! small trait so the theme logic can be tested against memory and the CLI
//! can keep it in a TOML file next to other per-user data.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage errors. Callers persisting preferences are expected to absorb these.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Data directory not found")]
    NoDataDir,

    #[error("Storage unavailable")]
    Unavailable,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Durable preference storage.
pub trait PreferenceStore: Send + Sync {
    /// Reads the value stored under `key`, if any.
    fn load(&self, key: &str) -> StorageResult<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn save(&self, key: &str, value: &str) -> StorageResult<()>;
}

/// Preferences kept in a flat TOML table on disk.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store under the platform data directory.
    pub fn default_location() -> StorageResult<Self> {
        let data_dir = dirs::data_dir().ok_or(StorageError::NoDataDir)?;
        Ok(Self::new(data_dir.join("folio").join("preferences.toml")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_table(&self) -> StorageResult<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(toml::from_str(&content)?)
    }
}

impl PreferenceStore for FileStore {
    fn load(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.read_table()?.remove(key))
    }

    fn save(&self, key: &str, value: &str) -> StorageResult<()> {
        // A corrupt file is replaced rather than blocking the write
        let mut table = self.read_table().unwrap_or_default();
        table.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, toml::to_string(&table)?)?;
        Ok(())
    }
}

/// In-memory store. Lives as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store with one entry already present.
    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = Self::new();
        if let Ok(mut entries) = store.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
        }
        store
    }
}

impl PreferenceStore for MemoryStore {
    fn load(&self, key: &str) -> StorageResult<Option<String>> {
        let entries = self.entries.lock().map_err(|_| StorageError::Unavailable)?;
        Ok(entries.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Unavailable)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

impl<T: PreferenceStore + ?Sized> PreferenceStore for std::sync::Arc<T> {
    fn load(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).load(key)
    }

    fn save(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).save(key, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("folio").join("prefs.toml"));

        assert_eq!(store.load("theme").unwrap(), None);

        store.save("theme", "dark").unwrap();
        store.save("other", "x").unwrap();
        assert_eq!(store.load("theme").unwrap(), Some("dark".to_string()));

        store.save("theme", "light").unwrap();
        assert_eq!(store.load("theme").unwrap(), Some("light".to_string()));
        assert_eq!(store.load("other").unwrap(), Some("x".to_string()));
    }

    #[test]
    fn test_file_store_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.toml");
        std::fs::write(&path, "not = [valid").unwrap();

        let store = FileStore::new(&path);
        assert!(matches!(store.load("theme"), Err(StorageError::Parse(_))));

        store.save("theme", "dark").unwrap();
        assert_eq!(store.load("theme").unwrap(), Some("dark".to_string()));
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::with_entry("theme", "dark");
        assert_eq!(store.load("theme").unwrap(), Some("dark".to_string()));
        assert_eq!(store.load("missing").unwrap(), None);
    }
}
