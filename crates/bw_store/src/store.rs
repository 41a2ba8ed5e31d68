//! Key/value stores for client-local state.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use parking_lot::Mutex;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::StoreError;

/// Item name the sealed local encryption key blob is persisted under.
pub const SEALED_KEY_ITEM: &str = "_burrow_sealed_local_encryption_key";

/// Browser-local-storage-shaped persistence. Whole-value overwrite only.
pub trait SealedKeyStore: Send + Sync {
    fn put(&self, item: &str, value: &str) -> Result<(), StoreError>;
    fn get(&self, item: &str) -> Result<Option<String>, StoreError>;
    fn remove(&self, item: &str) -> Result<(), StoreError>;
}

// ── File backend ─────────────────────────────────────────────────────────────

/// One file per item under `dir`. `put` goes through a same-directory temp
/// file and an atomic rename, so a concurrent reader sees either the old
/// value or the new one, never a torn write.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn item_path(&self, item: &str) -> Result<PathBuf, StoreError> {
        // Item names are fixed constants; anything path-like is a caller bug.
        if item.is_empty() || item.contains(|c| matches!(c, '/' | '\\' | '.')) {
            return Err(StoreError::InvalidItemName(item.to_string()));
        }
        Ok(self.dir.join(item))
    }
}

impl SealedKeyStore for FileStore {
    fn put(&self, item: &str, value: &str) -> Result<(), StoreError> {
        let path = self.item_path(item)?;
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(value.as_bytes())?;
        tmp.flush()?;
        tmp.persist(&path)
            .map_err(|e| StoreError::Persist(e.to_string()))?;
        debug!(item, bytes = value.len(), "stored item");
        Ok(())
    }

    fn get(&self, item: &str) -> Result<Option<String>, StoreError> {
        let path = self.item_path(item)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn remove(&self, item: &str) -> Result<(), StoreError> {
        let path = self.item_path(item)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ── In-memory backend ────────────────────────────────────────────────────────

/// Test/embedding double with the same contract.
#[derive(Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SealedKeyStore for MemoryStore {
    fn put(&self, item: &str, value: &str) -> Result<(), StoreError> {
        self.items
            .lock()
            .insert(item.to_string(), value.to_string());
        Ok(())
    }

    fn get(&self, item: &str) -> Result<Option<String>, StoreError> {
        Ok(self.items.lock().get(item).cloned())
    }

    fn remove(&self, item: &str) -> Result<(), StoreError> {
        self.items.lock().remove(item);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_roundtrip_and_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        assert_eq!(store.get(SEALED_KEY_ITEM).unwrap(), None);

        store.put(SEALED_KEY_ITEM, "blob-one").unwrap();
        assert_eq!(
            store.get(SEALED_KEY_ITEM).unwrap().as_deref(),
            Some("blob-one")
        );

        // Wholesale overwrite, never a merge.
        store.put(SEALED_KEY_ITEM, "blob-two").unwrap();
        assert_eq!(
            store.get(SEALED_KEY_ITEM).unwrap().as_deref(),
            Some("blob-two")
        );

        store.remove(SEALED_KEY_ITEM).unwrap();
        assert_eq!(store.get(SEALED_KEY_ITEM).unwrap(), None);
    }

    #[test]
    fn file_store_rejects_pathlike_item_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        assert!(store.put("../escape", "x").is_err());
        assert!(store.get("a/b").is_err());
    }

    #[test]
    fn remove_missing_item_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        store.remove(SEALED_KEY_ITEM).unwrap();
    }

    #[test]
    fn memory_store_roundtrip() {
        let store = MemoryStore::new();
        store.put(SEALED_KEY_ITEM, "blob").unwrap();
        assert_eq!(store.get(SEALED_KEY_ITEM).unwrap().as_deref(), Some("blob"));
        store.remove(SEALED_KEY_ITEM).unwrap();
        assert_eq!(store.get(SEALED_KEY_ITEM).unwrap(), None);
    }
}
