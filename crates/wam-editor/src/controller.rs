//! Interaction controller: the pointer/keyboard state machine.
//!
//! Consumes canvas events (already mapped into scene coordinates) and turns
//! them into selection changes, drags, resizes and embedding decisions on
//! the scene graph. Anything that needs the outside world (confirmation,
//! history replay, panels, zoom) is handed back to the caller as a
//! `Request`.
//!
//! ## Gestures
//!
//! | State | Entered by | Ends on |
//! |-------|------------|---------|
//! | `SingleDrag` | pointer-down on an entity, fewer than 2 selected | pointer-up |
//! | `GroupDrag` | pointer-down on a member of a 2+ selection | pointer-up |
//! | `RubberBand` | pointer-down on blank canvas | pointer-up |
//! | `SingleResize` | resize tool of an attached entity | pointer-up |
//! | `GroupResize` | overlay resize control | pointer-up |
//!
//! Every gesture records base geometry when it starts and recomputes from
//! it on each move, so deltas never accumulate rounding error.

use crate::config::EditorConfig;
use crate::input::{CanvasEvent, Modifiers, MouseButton};
use crate::overlay::SelectionOverlay;
use crate::selection::Selection;
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use wam_core::{Bounds, EntityId, LinkBody, Point, SceneGraph, Size};
use wam_render::{
    Decoration, Handle, HandleKind, PointerTarget, container_at, hit_test, hit_test_rect,
    resolve_pointer,
};

/// Edge length of the per-entity tool buttons.
pub const TOOL_SIZE: f64 = 14.0;

/// Everything the controller reads and mutates while handling one event.
pub struct InteractionContext<'a> {
    pub scene: &'a mut SceneGraph,
    pub selection: &'a mut Selection,
    pub overlay: &'a mut SelectionOverlay,
    pub config: &'a EditorConfig,
}

/// Work the controller cannot do on its own.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// Delete these entities once the user confirms.
    ConfirmDelete(Vec<EntityId>),
    Undo,
    Redo,
    TogglePanel,
    /// The settings tool was clicked for this entity.
    OpenSettings(EntityId),
    ZoomIn,
    ZoomOut,
    ResetZoom,
}

/// Geometry captured when a gesture starts.
#[derive(Debug, Clone, PartialEq)]
pub enum Base {
    Shape(Bounds),
    /// Vertices and pinned ends as they were at gesture start.
    Link(LinkBody),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub grabbed: EntityId,
    origin: Point,
    /// Entities that move with the pointer, descendants included.
    bases: Vec<(EntityId, Base)>,
    /// Shapes whose embedding is re-evaluated on drop.
    roots: Vec<EntityId>,
    applied: (f64, f64),
}

impl DragSession {
    pub fn moved(&self) -> bool {
        self.applied != (0.0, 0.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Gesture {
    Idle,
    SingleDrag(DragSession),
    GroupDrag(DragSession),
    RubberBand {
        origin: Point,
        current: Point,
    },
    SingleResize {
        id: EntityId,
        base: Bounds,
        ratio: f64,
    },
    GroupResize {
        anchor: Point,
        base: Size,
        bases: Vec<(EntityId, Base)>,
    },
}

impl Gesture {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::SingleDrag(_) => "single-drag",
            Self::GroupDrag(_) => "group-drag",
            Self::RubberBand { .. } => "rubber-band",
            Self::SingleResize { .. } => "single-resize",
            Self::GroupResize { .. } => "group-resize",
        }
    }
}

#[derive(Debug, Clone)]
pub struct InteractionController {
    gesture: Gesture,
    /// Entity currently showing remove/resize/settings tools.
    tool_target: Option<EntityId>,
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractionController {
    pub fn new() -> Self {
        Self {
            gesture: Gesture::Idle,
            tool_target: None,
        }
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.gesture, Gesture::Idle)
    }

    pub fn tool_target(&self) -> Option<EntityId> {
        self.tool_target
    }

    pub fn detach_tools(&mut self) {
        self.tool_target = None;
    }

    /// Forget any gesture and tools (the graph was replaced underneath).
    pub fn reset(&mut self) {
        self.gesture = Gesture::Idle;
        self.tool_target = None;
    }

    /// Dispatch one event.
    pub fn handle(&mut self, ctx: &mut InteractionContext<'_>, event: &CanvasEvent) -> Vec<Request> {
        match event {
            CanvasEvent::PointerDown {
                position,
                button: MouseButton::Primary,
                modifiers,
            } => self.pointer_down(ctx, *position, *modifiers),
            CanvasEvent::PointerDown { .. } => Vec::new(),
            CanvasEvent::PointerMove { position } => {
                self.pointer_move(ctx, *position);
                Vec::new()
            }
            CanvasEvent::PointerUp { position } => {
                self.pointer_up(ctx, *position);
                Vec::new()
            }
            CanvasEvent::ContextMenu { position } => {
                self.context_menu(ctx, *position);
                Vec::new()
            }
            CanvasEvent::Key {
                key,
                modifiers,
                focus,
            } => self.key(ctx, ShortcutMap::resolve(key, *modifiers, *focus)),
            CanvasEvent::Zoom { .. } => Vec::new(),
        }
    }

    // ─── Pointer down ────────────────────────────────────────────────────

    pub fn pointer_down(
        &mut self,
        ctx: &mut InteractionContext<'_>,
        p: Point,
        modifiers: Modifiers,
    ) -> Vec<Request> {
        if !self.is_idle() {
            log::debug!("pointer-down ignored during {}", self.gesture.name());
            return Vec::new();
        }
        let handles = self.handles(ctx.scene, ctx.overlay);
        match resolve_pointer(ctx.scene, &handles, p, ctx.config.link_hit_tolerance) {
            PointerTarget::Handle(kind) => self.handle_down(ctx, kind),
            PointerTarget::Entity(id) => {
                self.entity_down(ctx, id, p, modifiers);
                Vec::new()
            }
            PointerTarget::Blank => {
                ctx.selection.clear();
                ctx.overlay.destroy();
                self.tool_target = None;
                self.gesture = Gesture::RubberBand {
                    origin: p,
                    current: p,
                };
                log::debug!("rubber band from ({}, {})", p.x, p.y);
                Vec::new()
            }
        }
    }

    fn handle_down(&mut self, ctx: &mut InteractionContext<'_>, kind: HandleKind) -> Vec<Request> {
        match kind {
            HandleKind::OverlayDelete => {
                if ctx.selection.is_empty() {
                    Vec::new()
                } else {
                    vec![Request::ConfirmDelete(ctx.selection.ids().to_vec())]
                }
            }
            HandleKind::OverlayResize => {
                self.begin_group_resize(ctx);
                Vec::new()
            }
            HandleKind::ToolRemove(id) => vec![Request::ConfirmDelete(vec![id])],
            HandleKind::ToolSettings(id) => vec![Request::OpenSettings(id)],
            HandleKind::ToolResize(id) => {
                match ctx.scene.get(id).ok().and_then(|e| e.shape()) {
                    Some(shape) => {
                        let base = shape.bounds();
                        self.gesture = Gesture::SingleResize {
                            id,
                            base,
                            ratio: base.size().aspect_ratio(),
                        };
                        log::debug!("single resize of {id}");
                    }
                    None => log::debug!("resize tool on missing or non-shape {id}"),
                }
                Vec::new()
            }
        }
    }

    fn entity_down(
        &mut self,
        ctx: &mut InteractionContext<'_>,
        id: EntityId,
        p: Point,
        modifiers: Modifiers,
    ) {
        if modifiers.shift {
            ctx.selection.toggle(id);
        } else if !ctx.selection.contains(id) {
            ctx.selection.set([id]);
        }
        if self.tool_target.is_some_and(|t| !ctx.selection.contains(t)) {
            self.tool_target = None;
        }
        ctx.overlay.sync(ctx.scene, ctx.selection.ids());

        if !ctx.selection.contains(id) {
            return;
        }
        let group = ctx.selection.len() >= 2;
        let roots: Vec<EntityId> = if group {
            ctx.selection.ids().to_vec()
        } else {
            vec![id]
        };
        let session = DragSession {
            grabbed: id,
            origin: p,
            bases: capture_bases(ctx.scene, &roots, true),
            roots,
            applied: (0.0, 0.0),
        };
        self.gesture = if group {
            log::debug!("group drag of {} entities", ctx.selection.len());
            Gesture::GroupDrag(session)
        } else {
            Gesture::SingleDrag(session)
        };
    }

    fn begin_group_resize(&mut self, ctx: &mut InteractionContext<'_>) {
        if ctx.selection.len() < 2 {
            log::debug!("group resize needs at least two selected entities");
            return;
        }
        let ids = ctx.selection.ids().to_vec();
        let Some(union) = Bounds::union_all(ids.iter().filter_map(|id| ctx.scene.bounds_of(*id).ok()))
        else {
            return;
        };
        self.gesture = Gesture::GroupResize {
            anchor: union.origin(),
            base: union.size(),
            bases: capture_bases(ctx.scene, &ids, false),
        };
        log::debug!("group resize of {} entities", ids.len());
    }

    // ─── Pointer move ────────────────────────────────────────────────────

    pub fn pointer_move(&mut self, ctx: &mut InteractionContext<'_>, p: Point) {
        match &mut self.gesture {
            Gesture::Idle => {}
            Gesture::SingleDrag(session) => {
                apply_drag(ctx.scene, session, p);
            }
            Gesture::GroupDrag(session) => {
                let (ox, oy) = session.applied;
                apply_drag(ctx.scene, session, p);
                let (nx, ny) = session.applied;
                ctx.overlay.translate(nx - ox, ny - oy);
            }
            Gesture::RubberBand { current, .. } => *current = p,
            Gesture::SingleResize { id, base, ratio } => {
                let local = Point::new(p.x - base.x, p.y - base.y);
                let size = ratio_resize(*ratio, local, ctx.config.min_resize);
                if let Err(e) = ctx.scene.resize(*id, base.origin(), size) {
                    log::debug!("resize of {id} dropped: {e}");
                }
            }
            Gesture::GroupResize {
                anchor,
                base,
                bases,
            } => {
                let s = group_scale(*anchor, *base, p, ctx.config.group_min_scale);
                let min = ctx.config.group_min_dimension;
                for (id, b) in bases.iter() {
                    let result = match b {
                        Base::Shape(r) => ctx.scene.resize(
                            *id,
                            r.origin().scale_about(*anchor, s),
                            Size::new((r.width * s).max(min), (r.height * s).max(min)),
                        ),
                        Base::Link(path) => {
                            let mut scaled = path.clone();
                            scaled.map_points(|v| v.scale_about(*anchor, s));
                            ctx.scene.set_link_path(*id, &scaled)
                        }
                    };
                    if let Err(e) = result {
                        log::debug!("group resize skipped {id}: {e}");
                    }
                }
                ctx.overlay.sync(ctx.scene, ctx.selection.ids());
            }
        }
    }

    // ─── Pointer up ──────────────────────────────────────────────────────

    pub fn pointer_up(&mut self, ctx: &mut InteractionContext<'_>, p: Point) {
        let gesture = std::mem::replace(&mut self.gesture, Gesture::Idle);
        match gesture {
            Gesture::Idle => {}
            Gesture::SingleDrag(session) | Gesture::GroupDrag(session) => {
                if session.moved() {
                    for id in &session.roots {
                        update_embedding(ctx.scene, *id);
                    }
                }
                ctx.overlay.sync(ctx.scene, ctx.selection.ids());
            }
            Gesture::RubberBand { origin, .. } => {
                let rect = Bounds::from_corners(origin, p);
                let picked = hit_test_rect(ctx.scene, rect, ctx.config.rubber_band_mode);
                log::debug!("rubber band picked {} entities", picked.len());
                ctx.selection.set(picked);
                ctx.overlay.sync(ctx.scene, ctx.selection.ids());
            }
            Gesture::SingleResize { .. } | Gesture::GroupResize { .. } => {
                ctx.overlay.sync(ctx.scene, ctx.selection.ids());
            }
        }
    }

    // ─── Context menu / keys ─────────────────────────────────────────────

    /// Right-click: make sure the entity is selected and attach its tools.
    pub fn context_menu(&mut self, ctx: &mut InteractionContext<'_>, p: Point) {
        if !self.is_idle() {
            return;
        }
        let Some(id) = hit_test(ctx.scene, p, ctx.config.link_hit_tolerance) else {
            return;
        };
        if !ctx.selection.contains(id) {
            ctx.selection.set([id]);
            ctx.overlay.sync(ctx.scene, ctx.selection.ids());
        }
        self.tool_target = Some(id);
        log::debug!("tools attached to {id}");
    }

    fn key(&mut self, ctx: &mut InteractionContext<'_>, action: Option<ShortcutAction>) -> Vec<Request> {
        let Some(action) = action else {
            return Vec::new();
        };
        let request = match action {
            ShortcutAction::DeleteSelection if ctx.selection.is_empty() => return Vec::new(),
            ShortcutAction::DeleteSelection => Request::ConfirmDelete(ctx.selection.ids().to_vec()),
            ShortcutAction::Undo => Request::Undo,
            ShortcutAction::Redo => Request::Redo,
            ShortcutAction::TogglePanel => Request::TogglePanel,
            ShortcutAction::ZoomIn => Request::ZoomIn,
            ShortcutAction::ZoomOut => Request::ZoomOut,
            ShortcutAction::ResetZoom => Request::ResetZoom,
        };
        vec![request]
    }

    // ─── Affordances ─────────────────────────────────────────────────────

    /// Every interactive handle currently on the canvas.
    pub fn handles(&self, scene: &SceneGraph, overlay: &SelectionOverlay) -> Vec<Handle> {
        let mut handles = overlay.handles();
        if !overlay.is_hidden() {
            handles.extend(self.tool_handles(scene));
        }
        handles
    }

    fn tool_handles(&self, scene: &SceneGraph) -> Vec<Handle> {
        let Some(id) = self.tool_target else {
            return Vec::new();
        };
        let Ok(entity) = scene.get(id) else {
            return Vec::new();
        };
        let half = TOOL_SIZE / 2.0;
        let at = |x: f64, y: f64| Bounds::new(x - half, y - half, TOOL_SIZE, TOOL_SIZE);
        match entity.shape() {
            Some(shape) => {
                let b = shape.bounds();
                vec![
                    Handle {
                        kind: HandleKind::ToolRemove(id),
                        bounds: at(b.x, b.y),
                    },
                    Handle {
                        kind: HandleKind::ToolSettings(id),
                        bounds: at(b.right(), b.y),
                    },
                    Handle {
                        kind: HandleKind::ToolResize(id),
                        bounds: at(b.right(), b.bottom()),
                    },
                ]
            }
            None => {
                let Ok(points) = scene.link_points(id) else {
                    return Vec::new();
                };
                let Some(mid) = polyline_midpoint(&points) else {
                    return Vec::new();
                };
                vec![
                    Handle {
                        kind: HandleKind::ToolRemove(id),
                        bounds: at(mid.x - TOOL_SIZE, mid.y),
                    },
                    Handle {
                        kind: HandleKind::ToolSettings(id),
                        bounds: at(mid.x + TOOL_SIZE, mid.y),
                    },
                ]
            }
        }
    }

    /// Editor chrome for the renderer: overlay, rubber band and tools.
    pub fn decorations(&self, scene: &SceneGraph, overlay: &SelectionOverlay) -> Vec<Decoration> {
        let mut out = overlay.decorations();
        if let Gesture::RubberBand { origin, current } = &self.gesture {
            out.push(Decoration::RubberBand(Bounds::from_corners(*origin, *current)));
        }
        if !overlay.is_hidden()
            && let Some(id) = self.tool_target
            && let Ok(bounds) = scene.bounds_of(id)
        {
            out.push(Decoration::ToolFrame(bounds));
            out.extend(self.tool_handles(scene).into_iter().map(Decoration::Handle));
        }
        out
    }
}

// ─── Geometry helpers ────────────────────────────────────────────────────

fn capture_bases(scene: &SceneGraph, roots: &[EntityId], with_descendants: bool) -> Vec<(EntityId, Base)> {
    let mut ids: Vec<EntityId> = Vec::new();
    for root in roots {
        let extra = if with_descendants {
            scene.descendants(*root)
        } else {
            Vec::new()
        };
        for id in std::iter::once(*root).chain(extra) {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
    }
    ids.into_iter()
        .filter_map(|id| {
            let entity = scene.get(id).ok()?;
            let base = match (entity.shape(), entity.link()) {
                (Some(shape), _) => Base::Shape(shape.bounds()),
                (None, Some(link)) => Base::Link(link.clone()),
                (None, None) => return None,
            };
            Some((id, base))
        })
        .collect()
}

fn apply_drag(scene: &mut SceneGraph, session: &mut DragSession, p: Point) {
    let (dx, dy) = (p.x - session.origin.x, p.y - session.origin.y);
    for (id, base) in &session.bases {
        let result = match base {
            Base::Shape(b) => scene.set_position(*id, b.origin().translate(dx, dy)),
            Base::Link(path) => {
                let mut moved = path.clone();
                moved.translate(dx, dy);
                scene.set_link_path(*id, &moved)
            }
        };
        if let Err(e) = result {
            log::debug!("drag skipped {id}: {e}");
        }
    }
    session.applied = (dx, dy);
}

/// Re-evaluate `id`'s parent after a drop.
///
/// Fully inside a container: embed there and push the container (and its
/// own ancestors) behind it. No longer inside its parent: unembed.
fn update_embedding(scene: &mut SceneGraph, id: EntityId) {
    if !scene.get(id).is_ok_and(|e| e.is_shape()) {
        return;
    }
    match container_at(scene, id) {
        Some(container) => {
            if scene.parent_of(id) != Some(container) {
                match scene.embed(container, id) {
                    Ok(()) => log::debug!("embedded {id} into {container}"),
                    Err(e) => {
                        log::debug!("embedding {id} into {container} refused: {e}");
                        return;
                    }
                }
            }
            let mut chain = vec![container];
            let mut current = container;
            while let Some(parent) = scene.parent_of(current) {
                chain.push(parent);
                current = parent;
            }
            for c in chain {
                let _ = scene.reorder_to_back(c);
            }
        }
        None => {
            let Some(parent) = scene.parent_of(id) else {
                return;
            };
            let inside = match (scene.bounds_of(parent), scene.bounds_of(id)) {
                (Ok(p), Ok(c)) => p.contains(&c),
                _ => false,
            };
            if !inside && scene.unembed(id).unwrap_or(false) {
                log::debug!("unembedded {id} from {parent}");
            }
        }
    }
}

/// Aspect-preserving size for a resize handle dragged to `local` (relative
/// to the shape's top-left).
///
/// Both the width-driven and the height-driven candidate are computed; the
/// one whose derived side lands closer to the pointer wins.
pub fn ratio_resize(ratio: f64, local: Point, min: Size) -> Size {
    let w_by_x = local.x.max(min.width);
    let h_from_w = (w_by_x / ratio.max(1e-6)).max(min.height);

    let h_by_y = local.y.max(min.height);
    let w_from_h = (h_by_y * ratio).max(min.width);

    let err_w = (h_from_w - local.y).abs();
    let err_h = (w_from_h - local.x).abs();
    if err_w <= err_h {
        Size::new(w_by_x, h_from_w)
    } else {
        Size::new(w_from_h, h_by_y)
    }
}

/// Uniform factor for a group resize with the top-left `anchor` fixed.
pub fn group_scale(anchor: Point, base: Size, p: Point, min_scale: f64) -> f64 {
    let axis = |d: f64, len: f64| if len > 0.0 { d / len } else { f64::NEG_INFINITY };
    let sx = axis(p.x - anchor.x, base.width);
    let sy = axis(p.y - anchor.y, base.height);
    min_scale.max(sx.max(sy))
}

fn polyline_midpoint(points: &[Point]) -> Option<Point> {
    let (first, last) = (points.first()?, points.last()?);
    Some(Point::new((first.x + last.x) / 2.0, (first.y + last.y) / 2.0))
}
