//! Raw key-value stores: in-memory and one-file-per-key on disk.

use crate::error::PersistenceError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// The closed set of logical keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    Graph,
    Theme,
}

impl StorageKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Graph => "graph",
            Self::Theme => "theme",
        }
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Async load/save/clear of serialized payloads.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn save(&self, key: StorageKey, payload: String) -> Result<(), PersistenceError>;

    /// `None` when nothing is stored under `key`.
    async fn load(&self, key: StorageKey) -> Result<Option<String>, PersistenceError>;

    /// Remove `key`. Clearing a missing key is not an error.
    async fn clear(&self, key: StorageKey) -> Result<(), PersistenceError>;
}

// ─── Memory ──────────────────────────────────────────────────────────────

/// Process-local store, mostly for tests and headless sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<StorageKey, String>>,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `save` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Current raw payload under `key`.
    pub fn peek(&self, key: StorageKey) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&key)
            .cloned()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn save(&self, key: StorageKey, payload: String) -> Result<(), PersistenceError> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key, payload);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn load(&self, key: StorageKey) -> Result<Option<String>, PersistenceError> {
        Ok(self.peek(key))
    }

    async fn clear(&self, key: StorageKey) -> Result<(), PersistenceError> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&key);
        Ok(())
    }
}

// ─── File ────────────────────────────────────────────────────────────────

/// Stores each key as `<dir>/<key>.json`. Writes go through a temporary
/// file and a rename so a crash never leaves a half-written payload.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: StorageKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.as_str()))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn save(&self, key: StorageKey, payload: String) -> Result<(), PersistenceError> {
        let io = |source| PersistenceError::Io { key, source };
        tokio::fs::create_dir_all(&self.dir).await.map_err(io)?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, payload).await.map_err(io)?;
        tokio::fs::rename(&tmp, &path).await.map_err(io)?;
        log::debug!("saved {key} to {}", path.display());
        Ok(())
    }

    async fn load(&self, key: StorageKey) -> Result<Option<String>, PersistenceError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(PersistenceError::Io { key, source }),
        }
    }

    async fn clear(&self, key: StorageKey) -> Result<(), PersistenceError> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(PersistenceError::Io { key, source }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.load(StorageKey::Theme).await.unwrap(), None);
        store.save(StorageKey::Theme, "\"dark\"".into()).await.unwrap();
        assert_eq!(
            store.load(StorageKey::Theme).await.unwrap().as_deref(),
            Some("\"dark\"")
        );
        store.clear(StorageKey::Theme).await.unwrap();
        assert_eq!(store.load(StorageKey::Theme).await.unwrap(), None);
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested"));
        assert_eq!(store.load(StorageKey::Graph).await.unwrap(), None);
        store.save(StorageKey::Graph, "{}".into()).await.unwrap();
        assert!(dir.path().join("nested/graph.json").exists());
        assert!(!dir.path().join("nested/graph.json.tmp").exists());
        assert_eq!(store.load(StorageKey::Graph).await.unwrap().as_deref(), Some("{}"));
        store.clear(StorageKey::Graph).await.unwrap();
        store.clear(StorageKey::Graph).await.unwrap();
        assert_eq!(store.load(StorageKey::Graph).await.unwrap(), None);
    }
}
