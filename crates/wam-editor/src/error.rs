use thiserror::Error;
use wam_core::{FactoryError, ImportError, SceneError, ValidationError};
use wam_render::RasterError;
use wam_store::PersistenceError;

/// Errors surfaced by session operations.
#[derive(Error, Debug)]
pub enum EditorError {
    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error(transparent)]
    UnknownType(#[from] FactoryError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("import failed: {0}")]
    Import(#[from] ImportError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("export failed: {0}")]
    Export(#[from] serde_json::Error),

    #[error("image export failed: {0}")]
    Raster(#[from] RasterError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
