//! Key-value option stores.
//!
//! The host application owns its settings; Tabasamu only needs to read and
//! write a single option through [`ConfigStore`].

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::debug;

use crate::error::{Result, TabasamuError};

/// A host settings store.
pub trait ConfigStore: Send + Sync {
    /// Read an option, `None` when unset.
    fn get_option(&self, name: &str) -> Option<String>;

    /// Write an option.
    fn set_option(&self, name: &str, value: &str) -> Result<()>;
}

/// In-process option store.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    options: RwLock<HashMap<String, String>>,
}

impl MemoryConfigStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with one option already set.
    pub fn with_option(name: impl Into<String>, value: impl Into<String>) -> Self {
        let store = Self::new();
        if let Ok(mut options) = store.options.write() {
            options.insert(name.into(), value.into());
        }
        store
    }
}

impl ConfigStore for MemoryConfigStore {
    fn get_option(&self, name: &str) -> Option<String> {
        self.options.read().ok()?.get(name).cloned()
    }

    fn set_option(&self, name: &str, value: &str) -> Result<()> {
        let mut options = self
            .options
            .write()
            .map_err(|_| TabasamuError::Config("option store lock poisoned".to_string()))?;
        options.insert(name.to_string(), value.to_string());
        Ok(())
    }
}

/// Option store persisted as a flat JSON object.
///
/// The file is read once on open and rewritten on every `set_option`.
#[derive(Debug)]
pub struct JsonFileConfigStore {
    path: PathBuf,
    options: RwLock<BTreeMap<String, String>>,
}

impl JsonFileConfigStore {
    /// Open the store at `path`. A missing file starts out empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let options = if path.exists() {
            let content = fs::read_to_string(&path)?;
            serde_json::from_str(&content)?
        } else {
            BTreeMap::new()
        };
        debug!(path = %path.display(), options = options.len(), "Opened option store");

        Ok(Self {
            path,
            options: RwLock::new(options),
        })
    }

    /// File backing this store.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigStore for JsonFileConfigStore {
    fn get_option(&self, name: &str) -> Option<String> {
        self.options.read().ok()?.get(name).cloned()
    }

    fn set_option(&self, name: &str, value: &str) -> Result<()> {
        let mut options = self
            .options
            .write()
            .map_err(|_| TabasamuError::Config("option store lock poisoned".to_string()))?;
        let mut updated = options.clone();
        updated.insert(name.to_string(), value.to_string());

        // disk first: a failed write leaves the in-memory options unchanged
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&updated)?)?;
        *options = updated;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryConfigStore::new();
        assert_eq!(store.get_option("tabasamu__package"), None);
        store.set_option("tabasamu__package", "phoenity").unwrap();
        assert_eq!(store.get_option("tabasamu__package").as_deref(), Some("phoenity"));
    }

    #[test]
    fn test_memory_store_with_option() {
        let store = MemoryConfigStore::with_option("k", "v");
        assert_eq!(store.get_option("k").as_deref(), Some("v"));
    }

    #[test]
    fn test_json_store_persists() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("options.json");

        let store = JsonFileConfigStore::open(&path).unwrap();
        assert_eq!(store.get_option("tabasamu__package"), None);
        store.set_option("tabasamu__package", "kolobok").unwrap();

        let reopened = JsonFileConfigStore::open(&path).unwrap();
        assert_eq!(
            reopened.get_option("tabasamu__package").as_deref(),
            Some("kolobok")
        );
        assert_eq!(reopened.path(), path.as_path());
    }

    #[test]
    fn test_json_store_failed_write_keeps_memory() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("options.json");
        let store = JsonFileConfigStore::open(&path).unwrap();
        store.set_option("tabasamu__package", "phoenity").unwrap();

        // replace the file with a directory so the next write fails
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();

        assert!(store.set_option("tabasamu__package", "kolobok").is_err());
        assert_eq!(
            store.get_option("tabasamu__package").as_deref(),
            Some("phoenity")
        );
    }

    #[test]
    fn test_json_store_invalid_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("options.json");
        fs::write(&path, "[1, 2, 3]").unwrap();
        assert!(matches!(
            JsonFileConfigStore::open(&path).unwrap_err(),
            TabasamuError::Json(_)
        ));
    }
}
