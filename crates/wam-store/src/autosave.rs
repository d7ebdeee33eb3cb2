//! Debounced background saving.
//!
//! Every `notify` replaces the pending payload and restarts the quiet
//! period; the payload is written once no new notification has arrived for
//! the whole debounce window. Write failures are logged and dropped: the
//! next notification triggers a fresh attempt.

use crate::envelope::PersistenceAdapter;
use crate::kv::StorageKey;
use serde::Serialize;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(800);

enum Command<T> {
    Save(T),
    Flush(oneshot::Sender<()>),
}

/// Handle to a running autosave worker for one storage key.
pub struct Autosave<T> {
    tx: mpsc::UnboundedSender<Command<T>>,
    worker: JoinHandle<()>,
}

impl<T> std::fmt::Debug for Autosave<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Autosave")
            .field("closed", &self.tx.is_closed())
            .finish_non_exhaustive()
    }
}

impl<T> Autosave<T>
where
    T: Serialize + Send + Sync + 'static,
{
    /// Spawn the worker on the current tokio runtime.
    pub fn spawn(adapter: PersistenceAdapter, key: StorageKey, debounce: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run(adapter, key, debounce, rx));
        Self { tx, worker }
    }

    /// Queue `payload`, replacing anything still waiting for the debounce.
    pub fn notify(&self, payload: T) {
        if self.tx.send(Command::Save(payload)).is_err() {
            log::warn!("autosave worker has stopped; dropping payload");
        }
    }

    /// Write any pending payload now and wait for it.
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.tx.send(Command::Flush(done)).is_ok() {
            let _ = wait.await;
        }
    }

    /// Write any pending payload and stop the worker.
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.worker.await {
            log::warn!("autosave worker panicked: {e}");
        }
    }
}

async fn run<T: Serialize + Sync>(
    adapter: PersistenceAdapter,
    key: StorageKey,
    debounce: Duration,
    mut rx: mpsc::UnboundedReceiver<Command<T>>,
) {
    let mut pending: Option<T> = None;
    loop {
        let command = if pending.is_some() {
            tokio::select! {
                command = rx.recv() => command,
                () = tokio::time::sleep(debounce) => {
                    write(&adapter, key, pending.take()).await;
                    continue;
                }
            }
        } else {
            rx.recv().await
        };

        match command {
            Some(Command::Save(payload)) => pending = Some(payload),
            Some(Command::Flush(done)) => {
                write(&adapter, key, pending.take()).await;
                let _ = done.send(());
            }
            None => {
                write(&adapter, key, pending.take()).await;
                break;
            }
        }
    }
    log::debug!("autosave worker for {key} stopped");
}

async fn write<T: Serialize + Sync>(adapter: &PersistenceAdapter, key: StorageKey, payload: Option<T>) {
    let Some(payload) = payload else { return };
    match adapter.save(key, &payload).await {
        Ok(()) => log::debug!("autosaved {key}"),
        Err(e) => log::warn!("autosave of {key} failed: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PersistenceError;
    use crate::kv::{KeyValueStore, MemoryStore};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct BrokenStore {
        attempts: AtomicUsize,
    }

    #[async_trait]
    impl KeyValueStore for BrokenStore {
        async fn save(&self, key: StorageKey, _payload: String) -> Result<(), PersistenceError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(PersistenceError::Io {
                key,
                source: std::io::Error::other("quota exceeded"),
            })
        }

        async fn load(&self, _key: StorageKey) -> Result<Option<String>, PersistenceError> {
            Ok(None)
        }

        async fn clear(&self, _key: StorageKey) -> Result<(), PersistenceError> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn flush_writes_pending_payload_immediately() {
        let store = Arc::new(MemoryStore::new());
        let saver = Autosave::spawn(
            PersistenceAdapter::from_arc(store.clone()),
            StorageKey::Theme,
            DEFAULT_DEBOUNCE,
        );
        saver.notify("dark".to_string());
        saver.flush().await;
        assert_eq!(store.write_count(), 1);

        // Nothing pending: a second flush is a no-op.
        saver.flush().await;
        assert_eq!(store.write_count(), 1);
        saver.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_flushes() {
        let store = Arc::new(MemoryStore::new());
        let saver = Autosave::spawn(
            PersistenceAdapter::from_arc(store.clone()),
            StorageKey::Theme,
            DEFAULT_DEBOUNCE,
        );
        saver.notify("light".to_string());
        saver.shutdown().await;
        assert_eq!(store.write_count(), 1);
        assert!(store.peek(StorageKey::Theme).unwrap().contains("light"));
    }

    #[tokio::test(start_paused = true)]
    async fn failures_are_not_retried() {
        let store = Arc::new(BrokenStore {
            attempts: AtomicUsize::new(0),
        });
        let saver = Autosave::spawn(
            PersistenceAdapter::from_arc(store.clone()),
            StorageKey::Graph,
            Duration::from_millis(100),
        );
        saver.notify(1u32);
        tokio::time::sleep(Duration::from_secs(5)).await;
        saver.flush().await;
        assert_eq!(store.attempts.load(Ordering::SeqCst), 1);
        saver.shutdown().await;
    }
}
