//! Integration tests: pointer and keyboard scenarios driven through the
//! editor session in device coordinates.

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};
use wam_core::{DiagramDocument, EntityId, Point, SceneGraph, ShapeFactory, Size};
use wam_editor::{
    CanvasEvent, Confirm, ConfirmRequest, EditorConfig, EditorSession, FocusContext, Modifiers,
    SelectionChange,
};
use wam_render::{Handle, HandleKind};

/// Answers every prompt the same way and remembers what was asked.
struct Recorder {
    answer: bool,
    asked: Mutex<Vec<ConfirmRequest>>,
}

impl Recorder {
    fn new(answer: bool) -> Arc<Self> {
        Arc::new(Self {
            answer,
            asked: Mutex::new(Vec::new()),
        })
    }

    fn messages(&self) -> Vec<String> {
        self.asked.lock().unwrap().iter().map(|r| r.message.clone()).collect()
    }
}

#[async_trait]
impl Confirm for Recorder {
    async fn confirm(&self, request: ConfirmRequest) -> bool {
        self.asked.lock().unwrap().push(request);
        self.answer
    }
}

/// A session whose diagram is built directly on a scene graph and imported.
fn load(scene: &SceneGraph, confirm: Arc<Recorder>) -> EditorSession {
    let mut session = EditorSession::new(EditorConfig::default(), confirm).unwrap();
    let json = DiagramDocument::from_scene("Scenario", scene).to_json().unwrap();
    session.import_json(&json).unwrap();
    session
}

fn add(scene: &mut SceneGraph, tag: &str, x: f64, y: f64) -> EntityId {
    let factory = ShapeFactory::default();
    scene
        .add_entity(factory.create_node_at(tag, Point::new(x, y)).unwrap())
        .unwrap()
}

fn drag(s: &mut EditorSession, from: (f64, f64), to: (f64, f64)) {
    s.handle_event(&CanvasEvent::pointer_down(from.0, from.1));
    s.handle_event(&CanvasEvent::pointer_move(to.0, to.1));
    s.handle_event(&CanvasEvent::pointer_up(to.0, to.1));
}

fn handle(s: &EditorSession, kind: HandleKind) -> Handle {
    s.controller()
        .handles(s.scene(), s.overlay())
        .into_iter()
        .find(|h| h.kind == kind)
        .unwrap_or_else(|| panic!("no {kind:?} handle"))
}

fn bounds(s: &EditorSession, id: EntityId) -> wam_core::Bounds {
    s.scene().bounds_of(id).unwrap()
}

// ─── Embedding ──────────────────────────────────────────────────────────

#[test]
fn drop_fully_inside_container_embeds_and_sends_it_back() {
    let mut scene = SceneGraph::new();
    let b = add(&mut scene, "ProcessUnit", 600.0, 50.0);
    let a = add(&mut scene, "SecurityRealm", 0.0, 0.0);
    scene
        .resize(a, Point::ZERO, Size::new(500.0, 300.0))
        .unwrap();
    let mut s = load(&scene, Recorder::new(true));
    assert!(s.scene().z_index(a) > s.scene().z_index(b));

    // B (100x60) ends up at 50,50 .. 150,110.
    drag(&mut s, (610.0, 60.0), (60.0, 60.0));

    assert_eq!(bounds(&s, b), wam_core::Bounds::new(50.0, 50.0, 100.0, 60.0));
    assert_eq!(s.scene().parent_of(b), Some(a));
    assert!(s.scene().z_index(a) < s.scene().z_index(b));
}

#[test]
fn dragging_a_container_carries_its_children() {
    let mut scene = SceneGraph::new();
    let realm = add(&mut scene, "SecurityRealm", 0.0, 0.0);
    scene
        .resize(realm, Point::ZERO, Size::new(400.0, 300.0))
        .unwrap();
    let unit = add(&mut scene, "ProcessUnit", 50.0, 50.0);
    scene.embed(realm, unit).unwrap();
    let mut s = load(&scene, Recorder::new(true));

    // Grab the realm outside the child.
    drag(&mut s, (300.0, 250.0), (400.0, 300.0));

    assert_eq!(bounds(&s, realm).origin(), Point::new(100.0, 50.0));
    assert_eq!(bounds(&s, unit).origin(), Point::new(150.0, 100.0));
    assert_eq!(s.scene().parent_of(unit), Some(realm));
}

#[test]
fn dragging_a_child_out_unembeds_it() {
    let mut scene = SceneGraph::new();
    let realm = add(&mut scene, "SecurityRealm", 0.0, 0.0);
    scene
        .resize(realm, Point::ZERO, Size::new(400.0, 300.0))
        .unwrap();
    let unit = add(&mut scene, "ProcessUnit", 50.0, 50.0);
    scene.embed(realm, unit).unwrap();
    let mut s = load(&scene, Recorder::new(true));

    drag(&mut s, (60.0, 60.0), (760.0, 60.0));

    assert_eq!(s.scene().parent_of(unit), None);
}

// ─── Deletion ───────────────────────────────────────────────────────────

#[tokio::test]
async fn declined_delete_changes_nothing() {
    let mut scene = SceneGraph::new();
    let x = add(&mut scene, "Service", 0.0, 0.0);
    let y = add(&mut scene, "Application", 200.0, 0.0);
    let confirm = Recorder::new(false);
    let mut s = load(&scene, confirm.clone());

    drag(&mut s, (-20.0, -20.0), (400.0, 200.0));
    assert_eq!(s.selection().ids(), &[x, y]);
    let before = s.scene().serialize();

    s.dispatch(&CanvasEvent::key("Delete", Modifiers::NONE))
        .await
        .unwrap();

    assert_eq!(confirm.messages(), vec!["Delete 2 selected elements?".to_string()]);
    assert_eq!(s.scene().serialize(), before);
    assert_eq!(s.selection().ids(), &[x, y]);
    assert!(s.overlay().is_visible());
}

#[tokio::test]
async fn overlay_delete_handle_removes_the_group() {
    let mut scene = SceneGraph::new();
    add(&mut scene, "Service", 0.0, 0.0);
    add(&mut scene, "Application", 200.0, 0.0);
    let keep = add(&mut scene, "DataProvider", 0.0, 400.0);
    let mut s = load(&scene, Recorder::new(true));

    drag(&mut s, (-20.0, -20.0), (400.0, 200.0));
    let at = handle(&s, HandleKind::OverlayDelete).bounds.center();
    s.dispatch(&CanvasEvent::pointer_down(at.x, at.y)).await.unwrap();
    s.dispatch(&CanvasEvent::pointer_up(at.x, at.y)).await.unwrap();

    assert_eq!(s.scene().ids(), &[keep]);
    assert!(s.selection().is_empty());
    assert!(!s.overlay().is_visible());
}

#[tokio::test]
async fn cascade_delete_prunes_selection() {
    let mut scene = SceneGraph::new();
    let realm = add(&mut scene, "SecurityRealm", 0.0, 0.0);
    scene
        .resize(realm, Point::ZERO, Size::new(400.0, 300.0))
        .unwrap();
    let unit = add(&mut scene, "ProcessUnit", 50.0, 50.0);
    scene.embed(realm, unit).unwrap();
    let mut s = load(&scene, Recorder::new(true));

    s.handle_event(&CanvasEvent::pointer_down(60.0, 60.0));
    s.handle_event(&CanvasEvent::pointer_up(60.0, 60.0));
    assert_eq!(s.selection().ids(), &[unit]);

    assert!(s.delete_entities(&[realm]).await.unwrap());
    assert!(s.scene().is_empty());
    assert!(s.selection().is_empty());
}

#[tokio::test]
async fn delete_with_empty_selection_does_not_prompt() {
    let mut scene = SceneGraph::new();
    add(&mut scene, "Service", 0.0, 0.0);
    let confirm = Recorder::new(true);
    let mut s = load(&scene, confirm.clone());

    s.dispatch(&CanvasEvent::key("Delete", Modifiers::NONE))
        .await
        .unwrap();
    assert!(confirm.messages().is_empty());
    assert_eq!(s.scene().len(), 1);
}

// ─── Rubber band ────────────────────────────────────────────────────────

#[test]
fn zero_area_band_clears_selection() {
    let mut scene = SceneGraph::new();
    let a = add(&mut scene, "Service", 0.0, 0.0);
    let mut s = load(&scene, Recorder::new(true));

    s.handle_event(&CanvasEvent::pointer_down(10.0, 10.0));
    s.handle_event(&CanvasEvent::pointer_up(10.0, 10.0));
    assert_eq!(s.selection().ids(), &[a]);

    s.handle_event(&CanvasEvent::pointer_down(500.0, 500.0));
    s.handle_event(&CanvasEvent::pointer_up(500.0, 500.0));
    assert!(s.selection().is_empty());
    assert!(!s.overlay().is_visible());
}

#[test]
fn band_selects_only_fully_contained_entities() {
    let mut scene = SceneGraph::new();
    let inside = add(&mut scene, "Service", 0.0, 0.0);
    add(&mut scene, "Service", 150.0, 0.0);
    let mut s = load(&scene, Recorder::new(true));

    // Right to left: covers the first box and half of the second.
    drag(&mut s, (200.0, 100.0), (-10.0, -10.0));
    assert_eq!(s.selection().ids(), &[inside]);
}

#[test]
fn selection_observers_see_each_change_once() {
    let mut scene = SceneGraph::new();
    let a = add(&mut scene, "Service", 0.0, 0.0);
    let b = add(&mut scene, "Service", 200.0, 0.0);
    let mut s = load(&scene, Recorder::new(true));

    let seen: Arc<Mutex<Vec<Vec<EntityId>>>> = Arc::default();
    let sink = seen.clone();
    s.selection_mut()
        .on_selection_changed(move |change: &SelectionChange| {
            sink.lock().unwrap().push(change.after.clone());
        });

    drag(&mut s, (-10.0, -10.0), (400.0, 100.0));
    s.handle_event(&CanvasEvent::pointer_down(500.0, 500.0));
    s.handle_event(&CanvasEvent::pointer_up(500.0, 500.0));

    assert_eq!(*seen.lock().unwrap(), vec![vec![a, b], vec![]]);
}

// ─── Resize ─────────────────────────────────────────────────────────────

#[test]
fn group_resize_scales_uniformly_from_top_left() {
    let mut scene = SceneGraph::new();
    let a = add(&mut scene, "Service", 0.0, 0.0);
    let b = add(&mut scene, "Service", 200.0, 100.0);
    let mut s = load(&scene, Recorder::new(true));

    drag(&mut s, (-20.0, -20.0), (400.0, 300.0));
    assert_eq!(s.selection().len(), 2);
    let grip = handle(&s, HandleKind::OverlayResize).bounds.center();
    assert_eq!(grip, Point::new(330.0, 190.0));

    // Union is 320x180; dragging the grip to x=640 doubles it.
    drag(&mut s, (grip.x, grip.y), (640.0, 200.0));

    assert_eq!(bounds(&s, a), wam_core::Bounds::new(0.0, 0.0, 240.0, 160.0));
    assert_eq!(bounds(&s, b), wam_core::Bounds::new(400.0, 200.0, 240.0, 160.0));
    assert_eq!(
        s.overlay().content_bounds(),
        Some(wam_core::Bounds::new(0.0, 0.0, 640.0, 360.0))
    );
}

#[test]
fn resize_tool_keeps_aspect_ratio() {
    let mut scene = SceneGraph::new();
    let a = add(&mut scene, "Service", 0.0, 0.0);
    let mut s = load(&scene, Recorder::new(true));

    s.handle_event(&CanvasEvent::context_menu(60.0, 40.0));
    assert_eq!(s.controller().tool_target(), Some(a));
    let grip = handle(&s, HandleKind::ToolResize(a)).bounds.center();
    assert_eq!(grip, Point::new(120.0, 80.0));

    drag(&mut s, (grip.x, grip.y), (240.0, 150.0));
    assert_eq!(bounds(&s, a).size(), Size::new(240.0, 160.0));

    // Both candidates clamp to the 20x20 minimum.
    drag(&mut s, (240.0, 160.0), (2.0, 2.0));
    assert_eq!(bounds(&s, a).size(), Size::new(20.0, 20.0));
}

#[test]
fn settings_tool_opens_the_details_panel() {
    let mut scene = SceneGraph::new();
    let a = add(&mut scene, "Service", 0.0, 0.0);
    let mut s = load(&scene, Recorder::new(true));

    s.handle_event(&CanvasEvent::context_menu(60.0, 40.0));
    let at = handle(&s, HandleKind::ToolSettings(a)).bounds.center();
    s.handle_event(&CanvasEvent::pointer_down(at.x, at.y));
    s.handle_event(&CanvasEvent::pointer_up(at.x, at.y));

    assert!(s.is_panel_open());
    assert_eq!(s.details_target(), Some(a));
}

// ─── Keyboard and zoom ──────────────────────────────────────────────────

#[tokio::test]
async fn shortcuts_are_ignored_while_typing() {
    let mut scene = SceneGraph::new();
    add(&mut scene, "Service", 0.0, 0.0);
    let confirm = Recorder::new(true);
    let mut s = load(&scene, confirm.clone());
    drag(&mut s, (-10.0, -10.0), (200.0, 100.0));

    let typing = CanvasEvent::Key {
        key: "Backspace".into(),
        modifiers: Modifiers::NONE,
        focus: FocusContext {
            in_text_input: true,
            modal_open: false,
        },
    };
    s.dispatch(&typing).await.unwrap();
    assert!(confirm.messages().is_empty());
    assert_eq!(s.scene().len(), 1);

    s.dispatch(&CanvasEvent::key("b", Modifiers::CTRL)).await.unwrap();
    assert!(s.is_panel_open());
    s.dispatch(&CanvasEvent::key("b", Modifiers::CTRL)).await.unwrap();
    assert!(!s.is_panel_open());
}

#[test]
fn drags_are_measured_in_scene_units_when_zoomed() {
    let mut scene = SceneGraph::new();
    let a = add(&mut scene, "Service", 0.0, 0.0);
    let mut s = load(&scene, Recorder::new(true));
    s.viewport_mut().set_zoom(2.0);

    // Device (20,20) is scene (10,10), inside the shape.
    drag(&mut s, (20.0, 20.0), (220.0, 120.0));
    assert_eq!(bounds(&s, a).origin(), Point::new(100.0, 50.0));

    s.handle_event(&CanvasEvent::key("0", Modifiers::CTRL));
    assert_eq!(s.viewport().zoom(), 1.0);
}
