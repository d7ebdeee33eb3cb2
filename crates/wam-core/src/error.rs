//! Error types for the core model.
//!
//! - `SceneError`: scene-graph operations (missing ids, embedding rules)
//! - `FactoryError`: shape factory lookups
//! - `ValidationError`: structured property constraints, one entry per failing field
//! - `ImportError`: malformed JSON documents

use crate::id::EntityId;
use thiserror::Error;

/// Scene-graph operation failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// The id is not present in the graph.
    #[error("entity `{0}` not found")]
    NotFound(EntityId),

    /// An entity with this id already exists.
    #[error("entity `{0}` already exists")]
    DuplicateId(EntityId),

    /// The would-be parent does not accept children.
    #[error("entity `{0}` cannot contain children")]
    NotContainer(EntityId),

    /// An entity cannot be embedded into itself.
    #[error("entity `{0}` cannot embed itself")]
    SelfEmbed(EntityId),

    /// Embedding would make the parent its own descendant.
    #[error("embedding `{child}` into `{parent}` would create a cycle")]
    WouldCycle { parent: EntityId, child: EntityId },

    /// The operation only applies to shapes, not links.
    #[error("entity `{0}` is not a shape")]
    NotANode(EntityId),

    /// The operation only applies to links, not shapes.
    #[error("entity `{0}` is not a link")]
    NotALink(EntityId),

    /// A link cannot connect an entity to itself.
    #[error("link `{0}` connects an entity to itself")]
    SelfLoop(EntityId),

    /// Editing may change property values, never the set of keys.
    #[error("property keys of `{0}` cannot change")]
    PropsKeysChanged(EntityId),
}

/// Shape factory failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FactoryError {
    #[error("unknown type `{0}`")]
    UnknownType(String),
}

/// A single failing property field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub key: String,
    pub label: String,
    pub message: String,
}

/// Every failing field of a structured record. Never empty.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", summarize(.fields))]
pub struct ValidationError {
    pub fields: Vec<FieldError>,
}

fn summarize(fields: &[FieldError]) -> String {
    let parts: Vec<String> = fields
        .iter()
        .map(|f| format!("{}: {}", f.label, f.message))
        .collect();
    format!("invalid fields: {}", parts.join("; "))
}

/// Failures while importing a JSON document. The scene is left untouched.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("malformed JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("entity `{entity}` property `{key}`: {reason}")]
    InvalidProperty {
        entity: EntityId,
        key: String,
        reason: String,
    },

    #[error("invalid structure: {0}")]
    Structure(#[from] SceneError),

    #[error(transparent)]
    UnknownType(#[from] FactoryError),
}
