//! Editor tuning knobs.
//!
//! Everything here has a sensible default; a host may override any subset
//! from JSON (`{"history_depth": 100}`).

use crate::error::EditorError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use wam_core::Size;
use wam_render::RubberBandMode;

/// Smallest and largest accepted paper edge.
pub const PAPER_MIN: f64 = 1000.0;
pub const PAPER_MAX: f64 = 10000.0;
pub const DEFAULT_PAPER: f64 = 4000.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Graph-level undo bound.
    pub history_depth: usize,
    /// Per-entity form undo bound.
    pub form_history_depth: usize,
    /// Floor for single-entity resize.
    pub min_resize: Size,
    /// Lower bound of the uniform group-resize factor.
    pub group_min_scale: f64,
    /// Floor for each side during group resize.
    pub group_min_dimension: f64,
    pub overlay_margin: f64,
    /// Pointer distance (scene units) within which a link counts as hit.
    pub link_hit_tolerance: f64,
    pub rubber_band_mode: RubberBandMode,
    pub autosave_debounce_ms: u64,
    pub paper: Size,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_depth: 50,
            form_history_depth: 20,
            min_resize: Size::new(20.0, 20.0),
            group_min_scale: 0.05,
            group_min_dimension: 10.0,
            overlay_margin: 10.0,
            link_hit_tolerance: 6.0,
            rubber_band_mode: RubberBandMode::Contain,
            autosave_debounce_ms: 800,
            paper: Size::new(DEFAULT_PAPER, DEFAULT_PAPER),
        }
    }
}

impl EditorConfig {
    /// Parse a (possibly partial) JSON config and validate it.
    pub fn from_json_str(text: &str) -> Result<Self, EditorError> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| EditorError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EditorError> {
        if self.history_depth == 0 {
            return Err(EditorError::InvalidConfig(
                "history_depth must be positive".into(),
            ));
        }
        if self.form_history_depth == 0 {
            return Err(EditorError::InvalidConfig(
                "form_history_depth must be positive".into(),
            ));
        }
        if !(self.group_min_scale > 0.0 && self.group_min_scale <= 1.0) {
            return Err(EditorError::InvalidConfig(format!(
                "group_min_scale must be in (0, 1], got {}",
                self.group_min_scale
            )));
        }
        if self.min_resize.width <= 0.0
            || self.min_resize.height <= 0.0
            || self.group_min_dimension <= 0.0
        {
            return Err(EditorError::InvalidConfig(
                "minimum dimensions must be positive".into(),
            ));
        }
        check_paper(self.paper)
    }

    pub fn autosave_debounce(&self) -> Duration {
        Duration::from_millis(self.autosave_debounce_ms)
    }
}

/// Both paper edges must lie within `PAPER_MIN..=PAPER_MAX`.
pub fn check_paper(size: Size) -> Result<(), EditorError> {
    let ok = |v: f64| (PAPER_MIN..=PAPER_MAX).contains(&v);
    if ok(size.width) && ok(size.height) {
        Ok(())
    } else {
        Err(EditorError::InvalidConfig(format!(
            "paper {}x{} outside {PAPER_MIN}..={PAPER_MAX}",
            size.width, size.height
        )))
    }
}
