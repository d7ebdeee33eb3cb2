use crate::kv::StorageKey;
use thiserror::Error;

/// Local store read/write failures.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("i/o error on `{key}`: {source}")]
    Io {
        key: StorageKey,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot serialize `{key}`: {source}")]
    Serialize {
        key: StorageKey,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot read stored `{key}`: {source}")]
    Deserialize {
        key: StorageKey,
        #[source]
        source: serde_json::Error,
    },

    #[error("stored `{key}` has version {found}, newest supported is {supported}")]
    UnsupportedVersion {
        key: StorageKey,
        found: u32,
        supported: u32,
    },
}
