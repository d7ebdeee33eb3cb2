//! Hit testing: point → entity lookup, rectangle queries and handles.
//!
//! Walks the scene graph's paint order in reverse (front-to-back) so the
//! topmost entity at a position wins. Links are hit within a tolerance of
//! their resolved polyline rather than their bounding box.

use kurbo::{Line, ParamCurveNearest};
use serde::{Deserialize, Serialize};
use wam_core::{Bounds, EntityId, Point, SceneGraph};

/// How a rubber-band rectangle picks entities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RubberBandMode {
    /// The entity's bounds must lie fully inside the rectangle.
    #[default]
    Contain,
    /// Any overlap selects the entity.
    Intersect,
}

/// An interactive affordance drawn on top of the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleKind {
    OverlayDelete,
    OverlayResize,
    ToolRemove(EntityId),
    ToolResize(EntityId),
    ToolSettings(EntityId),
}

/// A handle and its scene-space hit box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    pub kind: HandleKind,
    pub bounds: Bounds,
}

/// What lies under the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerTarget {
    Blank,
    Entity(EntityId),
    Handle(HandleKind),
}

/// Find the topmost entity at `p` (scene coordinates).
/// Returns `None` on blank canvas.
pub fn hit_test(scene: &SceneGraph, p: Point, link_tolerance: f64) -> Option<EntityId> {
    for entity in scene.entities().rev() {
        let hit = if entity.is_link() {
            scene
                .link_points(entity.id)
                .ok()
                .and_then(|pts| distance_to_polyline(&pts, p))
                .is_some_and(|d| d <= link_tolerance)
        } else {
            scene
                .bounds_of(entity.id)
                .is_ok_and(|b| b.contains_point(p))
        };
        if hit {
            return Some(entity.id);
        }
    }
    None
}

/// Resolve the pointer against handles first (last drawn wins), then
/// entities, then blank canvas.
pub fn resolve_pointer(
    scene: &SceneGraph,
    handles: &[Handle],
    p: Point,
    link_tolerance: f64,
) -> PointerTarget {
    if let Some(h) = handles.iter().rev().find(|h| h.bounds.contains_point(p)) {
        return PointerTarget::Handle(h.kind);
    }
    match hit_test(scene, p, link_tolerance) {
        Some(id) => PointerTarget::Entity(id),
        None => PointerTarget::Blank,
    }
}

/// Entities picked by a rubber-band rectangle, in paint order.
///
/// A zero-area rectangle picks nothing. The result depends only on the
/// rectangle and the scene, never on the drag direction.
pub fn hit_test_rect(scene: &SceneGraph, rect: Bounds, mode: RubberBandMode) -> Vec<EntityId> {
    if rect.is_degenerate() {
        return Vec::new();
    }
    scene
        .ids()
        .iter()
        .copied()
        .filter(|id| {
            scene.bounds_of(*id).is_ok_and(|b| match mode {
                RubberBandMode::Contain => rect.contains(&b),
                RubberBandMode::Intersect => rect.intersects(&b) || rect.contains(&b),
            })
        })
        .collect()
}

/// Topmost container whose bounds fully contain `child`'s bounds.
///
/// The child itself and its own descendants are never candidates.
pub fn container_at(scene: &SceneGraph, child: EntityId) -> Option<EntityId> {
    let child_bounds = scene.bounds_of(child).ok()?;
    scene
        .entities()
        .rev()
        .filter(|e| e.is_container() && e.id != child)
        .filter(|e| !scene.is_ancestor_of(child, e.id))
        .find(|e| {
            scene
                .bounds_of(e.id)
                .is_ok_and(|b| b.contains(&child_bounds))
        })
        .map(|e| e.id)
}

/// Shortest distance from `p` to a polyline. `None` for fewer than two points.
pub fn distance_to_polyline(points: &[Point], p: Point) -> Option<f64> {
    let target = kurbo::Point::new(p.x, p.y);
    points
        .windows(2)
        .map(|w| {
            let seg = Line::new((w[0].x, w[0].y), (w[1].x, w[1].y));
            seg.nearest(target, 1e-6).distance_sq.sqrt()
        })
        .reduce(f64::min)
}
