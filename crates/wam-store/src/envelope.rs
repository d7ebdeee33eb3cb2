//! Versioned payload envelope and the typed persistence adapter.

use crate::error::PersistenceError;
use crate::kv::{KeyValueStore, StorageKey};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Newest envelope version this build writes and understands.
pub const CURRENT_VERSION: u32 = 1;

/// `{ version, ts, data }` as stored under every key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub version: u32,
    /// Milliseconds since the Unix epoch.
    #[serde(rename = "ts")]
    pub timestamp: i64,
    pub data: T,
}

impl<T> Envelope<T> {
    /// Wrap `data` stamped with the current time.
    pub fn new(data: T) -> Self {
        Self {
            version: CURRENT_VERSION,
            timestamp: Utc::now().timestamp_millis(),
            data,
        }
    }

    pub fn saved_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }
}

/// Typed load/save over any `KeyValueStore`.
#[derive(Clone)]
pub struct PersistenceAdapter {
    store: Arc<dyn KeyValueStore>,
}

impl PersistenceAdapter {
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    pub fn from_arc(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Wrap `data` in a fresh envelope and store it under `key`.
    pub async fn save<T: Serialize + Sync>(
        &self,
        key: StorageKey,
        data: &T,
    ) -> Result<(), PersistenceError> {
        let payload = serde_json::to_string(&Envelope::new(data))
            .map_err(|source| PersistenceError::Serialize { key, source })?;
        self.store.save(key, payload).await
    }

    /// Load the envelope under `key`, `None` if nothing was saved.
    ///
    /// # Errors
    /// `Deserialize` for unreadable payloads and `UnsupportedVersion` for
    /// envelopes written by a newer build.
    pub async fn load<T: DeserializeOwned>(
        &self,
        key: StorageKey,
    ) -> Result<Option<Envelope<T>>, PersistenceError> {
        let Some(raw) = self.store.load(key).await? else {
            return Ok(None);
        };
        let envelope: Envelope<T> = serde_json::from_str(&raw)
            .map_err(|source| PersistenceError::Deserialize { key, source })?;
        if envelope.version > CURRENT_VERSION {
            return Err(PersistenceError::UnsupportedVersion {
                key,
                found: envelope.version,
                supported: CURRENT_VERSION,
            });
        }
        Ok(Some(envelope))
    }

    pub async fn clear(&self, key: StorageKey) -> Result<(), PersistenceError> {
        self.store.clear(key).await
    }
}

impl std::fmt::Debug for PersistenceAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceAdapter").finish_non_exhaustive()
    }
}
