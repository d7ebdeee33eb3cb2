//! Local persistence for diagram sessions: key-value stores, versioned
//! envelopes and debounced autosave.

pub mod autosave;
pub mod envelope;
pub mod error;
pub mod kv;

pub use autosave::{Autosave, DEFAULT_DEBOUNCE};
pub use envelope::{CURRENT_VERSION, Envelope, PersistenceAdapter};
pub use error::PersistenceError;
pub use kv::{FileStore, KeyValueStore, MemoryStore, StorageKey};
