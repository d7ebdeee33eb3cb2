//! Multi-selection overlay.
//!
//! Shown only while two or more entities are selected. The box is the union
//! of the members' bounds inflated by a margin, with a delete control at the
//! top-right corner and a resize control at the bottom-right corner.
//!
//! Each membership change destroys the overlay and builds a new one (a new
//! `generation`); drags and resizes of the same members only move it.

use wam_core::{Bounds, EntityId, Point, SceneGraph};
use wam_render::{Decoration, Handle, HandleKind};

/// Edge length of the overlay's square controls.
pub const HANDLE_SIZE: f64 = 14.0;

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayBox {
    pub members: Vec<EntityId>,
    pub bounds: Bounds,
    pub generation: u64,
}

#[derive(Debug, Clone)]
pub struct SelectionOverlay {
    current: Option<OverlayBox>,
    margin: f64,
    hidden: bool,
    generations: u64,
}

impl SelectionOverlay {
    pub fn new(margin: f64) -> Self {
        Self {
            current: None,
            margin,
            hidden: false,
            generations: 0,
        }
    }

    pub fn current(&self) -> Option<&OverlayBox> {
        self.current.as_ref()
    }

    pub fn is_visible(&self) -> bool {
        self.current.is_some() && !self.hidden
    }

    /// Temporarily suppress drawing and hit-testing (image export).
    pub fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn destroy(&mut self) {
        if let Some(old) = self.current.take() {
            log::debug!("overlay #{} removed", old.generation);
        }
    }

    /// Bring the overlay in line with `selected`.
    ///
    /// Recreates the box when membership changed, otherwise re-lays it out
    /// in place from current geometry.
    pub fn sync(&mut self, scene: &SceneGraph, selected: &[EntityId]) {
        if selected.len() < 2 {
            self.destroy();
            return;
        }
        let Some(bounds) = self.measure(scene, selected) else {
            self.destroy();
            return;
        };
        match &mut self.current {
            Some(current) if same_members(&current.members, selected) => {
                current.bounds = bounds;
            }
            _ => {
                self.generations += 1;
                log::debug!(
                    "overlay #{} created for {} entities",
                    self.generations,
                    selected.len()
                );
                self.current = Some(OverlayBox {
                    members: selected.to_vec(),
                    bounds,
                    generation: self.generations,
                });
            }
        }
    }

    /// Shift the box by a drag delta without re-measuring.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        if let Some(current) = &mut self.current {
            current.bounds = current.bounds.translate(dx, dy);
        }
    }

    /// Union of the members' bounds, without the margin.
    pub fn content_bounds(&self) -> Option<Bounds> {
        self.current
            .as_ref()
            .map(|c| c.bounds.inflate(-self.margin))
    }

    pub fn handles(&self) -> Vec<Handle> {
        let Some(current) = self.current.as_ref().filter(|_| !self.hidden) else {
            return Vec::new();
        };
        let b = current.bounds;
        let half = HANDLE_SIZE / 2.0;
        vec![
            Handle {
                kind: HandleKind::OverlayDelete,
                bounds: Bounds::new(b.right() - half, b.y - half, HANDLE_SIZE, HANDLE_SIZE),
            },
            Handle {
                kind: HandleKind::OverlayResize,
                bounds: Bounds::new(
                    b.right() - half,
                    b.bottom() - half,
                    HANDLE_SIZE,
                    HANDLE_SIZE,
                ),
            },
        ]
    }

    pub fn decorations(&self) -> Vec<Decoration> {
        match &self.current {
            Some(current) if !self.hidden => std::iter::once(Decoration::Overlay(current.bounds))
                .chain(self.handles().into_iter().map(Decoration::Handle))
                .collect(),
            _ => Vec::new(),
        }
    }

    fn measure(&self, scene: &SceneGraph, selected: &[EntityId]) -> Option<Bounds> {
        Bounds::union_all(selected.iter().filter_map(|id| scene.bounds_of(*id).ok()))
            .map(|b| b.inflate(self.margin))
    }
}

fn same_members(a: &[EntityId], b: &[EntityId]) -> bool {
    a.len() == b.len() && b.iter().all(|id| a.contains(id))
}
