//! JSON diagram documents: `{ "title": ..., "cells": [...] }`.
//!
//! Export serializes the whole scene graph. Import is all-or-nothing: the
//! text is parsed, every type tag and property declaration is checked, and
//! the graph is rebuilt before anything is handed back to the caller.

use crate::error::ImportError;
use crate::model::{LinkKind, ShapeKind};
use crate::scene::{CellRecord, SceneGraph, SceneSnapshot};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TITLE: &str = "Untitled";

/// A titled diagram, as written to and read from disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramDocument {
    pub title: String,
    #[serde(flatten)]
    pub snapshot: SceneSnapshot,
}

#[derive(Deserialize)]
struct RawDocument {
    #[serde(default)]
    title: Option<String>,
    cells: Vec<serde_json::Value>,
}

impl DiagramDocument {
    pub fn from_scene(title: &str, scene: &SceneGraph) -> Self {
        Self {
            title: title.to_string(),
            snapshot: scene.serialize(),
        }
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Suggested download name: the title with `.json`.
    pub fn file_name(&self) -> String {
        let stem = self.title.trim();
        let stem = if stem.is_empty() { DEFAULT_TITLE } else { stem };
        format!("{stem}.json")
    }

    /// Parse and check a document.
    ///
    /// # Errors
    /// - `Parse` for malformed JSON or a cell that does not match the model
    /// - `UnknownType` for a shape or link kind outside the catalogue
    /// - `InvalidProperty` for a property declaration no edit could repair
    ///   (an enum without options, a value outside its options, min > max)
    /// - `Structure` for duplicate ids, dangling links or invalid embeddings
    pub fn from_json(text: &str) -> Result<Self, ImportError> {
        let raw: RawDocument = serde_json::from_str(text)?;
        let mut cells = Vec::with_capacity(raw.cells.len());
        for value in raw.cells {
            check_type_tag(&value)?;
            let cell: CellRecord = serde_json::from_value(value)?;
            for (key, prop) in &cell.entity.data.props {
                prop.check_structure()
                    .map_err(|reason| ImportError::InvalidProperty {
                        entity: cell.entity.id,
                        key: key.clone(),
                        reason,
                    })?;
            }
            cells.push(cell);
        }
        let snapshot = SceneSnapshot { cells };
        SceneGraph::from_snapshot(&snapshot)?;
        Ok(Self {
            title: raw.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            snapshot,
        })
    }

    /// Build a scene graph from the document's cells.
    pub fn to_scene(&self) -> Result<SceneGraph, ImportError> {
        Ok(SceneGraph::from_snapshot(&self.snapshot)?)
    }
}

/// Surface unknown kinds as `UnknownType` rather than a generic serde error.
fn check_type_tag(cell: &serde_json::Value) -> Result<(), ImportError> {
    let body = &cell["body"];
    if let Some(kind) = body["shape"]["kind"].as_str() {
        kind.parse::<ShapeKind>()?;
    }
    if let Some(kind) = body["link"]["kind"].as_str() {
        kind.parse::<LinkKind>()?;
    }
    Ok(())
}
