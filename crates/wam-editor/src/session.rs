//! The editor session: one explicit owner for everything a diagram canvas
//! needs (scene graph, viewport, controller, selection, overlay, both
//! histories and persistence).
//!
//! Hosts feed raw canvas events in device coordinates and call the command
//! methods; collaborators (confirmation dialogs, the local store) are
//! injected rather than looked up globally.

use crate::config::{EditorConfig, check_paper};
use crate::controller::{InteractionContext, InteractionController, Request};
use crate::error::EditorError;
use crate::form_history::FormHistory;
use crate::history::GraphHistory;
use crate::input::CanvasEvent;
use crate::overlay::SelectionOverlay;
use crate::selection::Selection;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use wam_core::{
    CellData, DEFAULT_TITLE, DiagramDocument, EntityId, GraphEvent, LinkEnd, Point, SceneGraph,
    SceneSnapshot, ShapeFactory, Size,
};
use wam_render::{CanvasTheme, Decoration, RenderOptions, Viewport, render_png, render_svg};
use wam_store::{Autosave, PersistenceAdapter, StorageKey};

// ─── Collaborators ───────────────────────────────────────────────────────

/// Text and styling of a confirmation prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmRequest {
    pub title: String,
    pub message: String,
    pub confirm_text: String,
    pub cancel_text: String,
    pub confirm_color: String,
}

impl ConfirmRequest {
    /// A prompt for an irreversible action.
    pub fn destructive(title: &str, message: impl Into<String>, confirm_text: &str) -> Self {
        Self {
            title: title.to_string(),
            message: message.into(),
            confirm_text: confirm_text.to_string(),
            cancel_text: "Cancel".to_string(),
            confirm_color: "warn".to_string(),
        }
    }
}

/// Asks the user a yes/no question.
#[async_trait]
pub trait Confirm: Send + Sync {
    async fn confirm(&self, request: ConfirmRequest) -> bool;
}

/// Answers every prompt the same way (headless use).
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

#[async_trait]
impl Confirm for FixedAnswer {
    async fn confirm(&self, _request: ConfirmRequest) -> bool {
        self.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn canvas(&self) -> CanvasTheme {
        match self {
            Self::Light => CanvasTheme::light(),
            Self::Dark => CanvasTheme::dark(),
        }
    }
}

// ─── Session ─────────────────────────────────────────────────────────────

pub struct EditorSession {
    config: EditorConfig,
    scene: SceneGraph,
    factory: ShapeFactory,
    viewport: Viewport,
    controller: InteractionController,
    selection: Selection,
    overlay: SelectionOverlay,
    history: GraphHistory,
    forms: FormHistory,
    title: String,
    dirty: bool,
    theme: Theme,
    panel_open: bool,
    /// Entity whose properties the details panel shows.
    details: Option<EntityId>,
    /// Scene state at pointer-down; recorded on pointer-up if the gesture
    /// left the scene different.
    pending_checkpoint: Option<SceneSnapshot>,
    /// The open gesture has changed the scene at least once.
    gesture_touched: bool,
    confirm: Arc<dyn Confirm>,
    store: Option<PersistenceAdapter>,
    autosave: Option<Autosave<DiagramDocument>>,
}

impl std::fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("title", &self.title)
            .field("entities", &self.scene.len())
            .field("selection", &self.selection.ids())
            .field("gesture", &self.controller.gesture().name())
            .field("dirty", &self.dirty)
            .finish_non_exhaustive()
    }
}

impl EditorSession {
    pub fn new(config: EditorConfig, confirm: Arc<dyn Confirm>) -> Result<Self, EditorError> {
        config.validate()?;
        Ok(Self {
            scene: SceneGraph::new(),
            factory: ShapeFactory::default(),
            viewport: Viewport::default(),
            controller: InteractionController::new(),
            selection: Selection::new(),
            overlay: SelectionOverlay::new(config.overlay_margin),
            history: GraphHistory::new(config.history_depth),
            forms: FormHistory::new(config.form_history_depth),
            title: DEFAULT_TITLE.to_string(),
            dirty: false,
            theme: Theme::default(),
            panel_open: false,
            details: None,
            pending_checkpoint: None,
            gesture_touched: false,
            confirm,
            store: None,
            autosave: None,
            config,
        })
    }

    /// Persist to `store`: the graph is autosaved after every change once
    /// the debounce window passes quietly. Must run inside a tokio runtime.
    pub fn attach_store(&mut self, store: PersistenceAdapter) {
        self.autosave = Some(Autosave::spawn(
            store.clone(),
            StorageKey::Graph,
            self.config.autosave_debounce(),
        ));
        self.store = Some(store);
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn factory(&self) -> &ShapeFactory {
        &self.factory
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Mutable access for observers (`on_selection_changed`).
    pub fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    pub fn overlay(&self) -> &SelectionOverlay {
        &self.overlay
    }

    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
        self.dirty = true;
    }

    /// Unsaved changes since the last export or explicit save.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn is_panel_open(&self) -> bool {
        self.panel_open
    }

    pub fn details_target(&self) -> Option<EntityId> {
        self.details
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn can_undo_form(&self, id: EntityId) -> bool {
        self.forms.can_undo(id)
    }

    pub fn can_redo_form(&self, id: EntityId) -> bool {
        self.forms.can_redo(id)
    }

    // ─── Events ──────────────────────────────────────────────────────────

    /// Feed one canvas event (device coordinates).
    ///
    /// Requests the session can settle on the spot (undo, redo, zoom,
    /// panel) are applied; requests that need confirmation are returned.
    pub fn handle_event(&mut self, event: &CanvasEvent) -> Vec<Request> {
        if let CanvasEvent::Zoom { position, factor } = event {
            self.viewport.zoom_at(*position, *factor);
            return Vec::new();
        }
        let event = self.to_scene_space(event);
        if matches!(event, CanvasEvent::PointerDown { .. }) && self.controller.is_idle() {
            self.pending_checkpoint = Some(self.scene.serialize());
        }

        let mut ctx = InteractionContext {
            scene: &mut self.scene,
            selection: &mut self.selection,
            overlay: &mut self.overlay,
            config: &self.config,
        };
        let requests = self.controller.handle(&mut ctx, &event);
        self.after_change();
        if matches!(event, CanvasEvent::PointerUp { .. }) || self.controller.is_idle() {
            self.finish_gesture();
        }

        let mut deferred = Vec::new();
        for request in requests {
            match request {
                Request::Undo => {
                    if let Err(e) = self.undo() {
                        log::warn!("undo failed: {e}");
                    }
                }
                Request::Redo => {
                    if let Err(e) = self.redo() {
                        log::warn!("redo failed: {e}");
                    }
                }
                Request::TogglePanel => self.panel_open = !self.panel_open,
                Request::OpenSettings(id) => {
                    self.details = Some(id);
                    self.panel_open = true;
                }
                Request::ZoomIn => self.viewport.zoom_in(),
                Request::ZoomOut => self.viewport.zoom_out(),
                Request::ResetZoom => self.viewport.reset(),
                Request::ConfirmDelete(_) => deferred.push(request),
            }
        }
        deferred
    }

    /// `handle_event`, then settle any deletion through the confirm prompt.
    pub async fn dispatch(&mut self, event: &CanvasEvent) -> Result<(), EditorError> {
        for request in self.handle_event(event) {
            if let Request::ConfirmDelete(ids) = request {
                self.delete_entities(&ids).await?;
            }
        }
        Ok(())
    }

    fn to_scene_space(&self, event: &CanvasEvent) -> CanvasEvent {
        let map = |p: &Point| self.viewport.device_to_scene(*p);
        match event {
            CanvasEvent::PointerDown {
                position,
                button,
                modifiers,
            } => CanvasEvent::PointerDown {
                position: map(position),
                button: *button,
                modifiers: *modifiers,
            },
            CanvasEvent::PointerMove { position } => CanvasEvent::PointerMove {
                position: map(position),
            },
            CanvasEvent::PointerUp { position } => CanvasEvent::PointerUp {
                position: map(position),
            },
            CanvasEvent::ContextMenu { position } => CanvasEvent::ContextMenu {
                position: map(position),
            },
            other => other.clone(),
        }
    }

    /// Drain graph notifications and keep everything else consistent:
    /// selection pruning, form history, then history and autosave.
    ///
    /// While a pointer gesture is open only the pruning runs; the undo step
    /// and the save are settled once by `finish_gesture`.
    fn after_change(&mut self) {
        let events = self.scene.drain_events();
        if events.is_empty() {
            return;
        }

        let mut removed = Vec::new();
        let mut reset = false;
        for event in events {
            match event {
                GraphEvent::Removed(id) => removed.push(id),
                GraphEvent::Reset => reset = true,
                GraphEvent::Added(_) | GraphEvent::Changed(_) => {}
            }
        }
        if reset || !removed.is_empty() {
            let scene = &self.scene;
            self.selection.retain(|id| scene.contains(id));
            if reset {
                self.forms.retain(|id| scene.contains(id));
            } else {
                self.forms.clear(&removed);
            }
            if self.controller.tool_target().is_some_and(|id| !scene.contains(id)) {
                self.controller.detach_tools();
            }
            if self.details.is_some_and(|id| !scene.contains(id)) {
                self.details = None;
            }
            self.overlay.sync(scene, self.selection.ids());
        }

        if self.pending_checkpoint.is_some() {
            self.gesture_touched = true;
            return;
        }
        self.mark_changed();
    }

    /// Close the pointer gesture: one undo step and one save, and only if
    /// the scene ended up different from where it started.
    fn finish_gesture(&mut self) {
        let touched = std::mem::take(&mut self.gesture_touched);
        let Some(checkpoint) = self.pending_checkpoint.take() else {
            return;
        };
        if !touched || checkpoint == self.scene.serialize() {
            return;
        }
        self.history.snapshot(checkpoint);
        self.mark_changed();
    }

    fn mark_changed(&mut self) {
        self.dirty = true;
        if let Some(autosave) = &self.autosave {
            autosave.notify(DiagramDocument::from_scene(&self.title, &self.scene));
        }
    }

    /// Record the current scene as an undo step.
    fn checkpoint(&mut self) {
        self.history.snapshot(self.scene.serialize());
    }

    // ─── Creation ────────────────────────────────────────────────────────

    /// Drop a palette item at a device position.
    pub fn drop_node(&mut self, tag: &str, device: Point) -> Result<EntityId, EditorError> {
        let at = self.viewport.device_to_scene(device);
        self.add_node_at(tag, at)
    }

    pub fn add_node_at(&mut self, tag: &str, position: Point) -> Result<EntityId, EditorError> {
        let node = self.factory.create_node_at(tag, position)?;
        let snapshot = self.scene.serialize();
        let id = self.scene.add_entity(node)?;
        self.history.snapshot(snapshot);
        self.after_change();
        log::debug!("added {tag} {id}");
        Ok(id)
    }

    /// Connect two shapes with a link of kind `tag`.
    pub fn connect(
        &mut self,
        tag: &str,
        source: EntityId,
        target: EntityId,
    ) -> Result<EntityId, EditorError> {
        let link =
            self.factory
                .create_edge_between(tag, LinkEnd::Entity(source), LinkEnd::Entity(target))?;
        let snapshot = self.scene.serialize();
        let id = self.scene.add_entity(link)?;
        self.history.snapshot(snapshot);
        self.after_change();
        Ok(id)
    }

    pub fn duplicate(&mut self, id: EntityId) -> Result<EntityId, EditorError> {
        let snapshot = self.scene.serialize();
        let copy = self.scene.duplicate(id)?;
        self.history.snapshot(snapshot);
        self.after_change();
        self.selection.set([copy]);
        self.overlay.sync(&self.scene, self.selection.ids());
        Ok(copy)
    }

    // ─── Deletion ────────────────────────────────────────────────────────

    /// Delete the selection after confirmation. `Ok(false)` when declined or
    /// nothing is selected.
    pub async fn delete_selection(&mut self) -> Result<bool, EditorError> {
        let ids = self.selection.ids().to_vec();
        self.delete_entities(&ids).await
    }

    /// Delete `ids` (and their embedded children and attached links) after
    /// confirmation.
    pub async fn delete_entities(&mut self, ids: &[EntityId]) -> Result<bool, EditorError> {
        let live: Vec<EntityId> = ids.iter().copied().filter(|id| self.scene.contains(*id)).collect();
        if live.is_empty() {
            return Ok(false);
        }
        let message = match live.as_slice() {
            [one] => format!(
                "Delete \"{}\"? Embedded elements and attached links are removed too.",
                self.scene.get(*one).ok().and_then(|e| e.label()).unwrap_or(one.as_str())
            ),
            many => format!("Delete {} selected elements?", many.len()),
        };
        let request = ConfirmRequest::destructive("Delete", message, "Delete");
        if !self.confirm.confirm(request).await {
            log::debug!("deletion of {} entities declined", live.len());
            return Ok(false);
        }
        self.pending_checkpoint = None;
        self.gesture_touched = false;
        self.checkpoint();
        let removed = self.scene.remove_entities(&live);
        log::debug!("removed {} entities", removed.len());
        self.after_change();
        self.overlay.sync(&self.scene, self.selection.ids());
        Ok(true)
    }

    /// Clear the whole diagram, its history and selection after confirmation.
    pub async fn reset_diagram(&mut self) -> Result<bool, EditorError> {
        let request = ConfirmRequest::destructive(
            "Reset diagram",
            "Remove every element and start over? This cannot be undone.",
            "Reset",
        );
        if !self.confirm.confirm(request).await {
            return Ok(false);
        }
        self.scene.clear();
        self.controller.reset();
        self.after_change();
        self.history.clear();
        self.forms.clear_all();
        self.title = DEFAULT_TITLE.to_string();
        Ok(true)
    }

    // ─── History ─────────────────────────────────────────────────────────

    pub fn undo(&mut self) -> Result<bool, EditorError> {
        self.pending_checkpoint = None;
        self.gesture_touched = false;
        let stepped = self.history.undo(&mut self.scene)?;
        if stepped {
            self.controller.reset();
            self.after_change();
        }
        Ok(stepped)
    }

    pub fn redo(&mut self) -> Result<bool, EditorError> {
        self.pending_checkpoint = None;
        self.gesture_touched = false;
        let stepped = self.history.redo(&mut self.scene)?;
        if stepped {
            self.controller.reset();
            self.after_change();
        }
        Ok(stepped)
    }

    // ─── Paint order ─────────────────────────────────────────────────────

    pub fn bring_to_front(&mut self, id: EntityId) -> Result<bool, EditorError> {
        let snapshot = self.scene.serialize();
        let changed = self.scene.reorder_to_front(id)?;
        if changed {
            self.history.snapshot(snapshot);
            self.after_change();
        }
        Ok(changed)
    }

    pub fn send_to_back(&mut self, id: EntityId) -> Result<bool, EditorError> {
        let snapshot = self.scene.serialize();
        let changed = self.scene.reorder_to_back(id)?;
        if changed {
            self.history.snapshot(snapshot);
            self.after_change();
        }
        Ok(changed)
    }

    // ─── Properties ──────────────────────────────────────────────────────

    /// Commit edited property values after validating every field.
    ///
    /// # Errors
    /// `Validation` lists every failing field and leaves the entity as it
    /// was; `Scene(PropsKeysChanged)` when the key set differs.
    pub fn update_entity_data(&mut self, id: EntityId, data: CellData) -> Result<(), EditorError> {
        let current = self.scene.get(id)?.data.clone();
        if current == data {
            return Ok(());
        }
        data.validate()?;
        self.scene.set_data(id, data)?;
        self.forms.push(id, &current);
        self.after_change();
        Ok(())
    }

    /// Restore the template defaults after confirmation.
    pub async fn reset_entity_data(&mut self, id: EntityId) -> Result<bool, EditorError> {
        let entity = self.scene.get(id)?;
        let Some(defaults) = self.factory.default_data(entity).cloned() else {
            return Ok(false);
        };
        let current = entity.data.clone();
        let name = entity.label().unwrap_or(entity.type_tag()).to_string();
        let request = ConfirmRequest::destructive(
            "Reset properties",
            format!("Reset all properties of \"{name}\" to their defaults?"),
            "Reset",
        );
        if !self.confirm.confirm(request).await {
            return Ok(false);
        }
        self.scene.set_data(id, defaults)?;
        self.forms.push(id, &current);
        self.after_change();
        Ok(true)
    }

    /// Step the entity's property form back. `Ok(false)` with no history.
    pub fn undo_form(&mut self, id: EntityId) -> Result<bool, EditorError> {
        let current = self.scene.get(id)?.data.clone();
        let Some(prev) = self.forms.undo(id, &current) else {
            return Ok(false);
        };
        self.scene.set_data(id, prev)?;
        self.after_change();
        Ok(true)
    }

    pub fn redo_form(&mut self, id: EntityId) -> Result<bool, EditorError> {
        let current = self.scene.get(id)?.data.clone();
        let Some(next) = self.forms.redo(id, &current) else {
            return Ok(false);
        };
        self.scene.set_data(id, next)?;
        self.after_change();
        Ok(true)
    }

    // ─── Paper / theme ───────────────────────────────────────────────────

    pub fn set_paper_size(&mut self, size: Size) -> Result<(), EditorError> {
        check_paper(size)?;
        self.config.paper = size;
        Ok(())
    }

    /// Switch theme and persist it. Store failures are logged only.
    pub async fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
        if let Some(store) = &self.store
            && let Err(e) = store.save(StorageKey::Theme, &theme).await
        {
            log::warn!("could not persist theme: {e}");
        }
    }

    /// Restore the saved theme, if any.
    pub async fn load_theme(&mut self) -> Theme {
        if let Some(store) = &self.store {
            match store.load::<Theme>(StorageKey::Theme).await {
                Ok(Some(saved)) => self.theme = saved.data,
                Ok(None) => {}
                Err(e) => log::warn!("could not load theme: {e}"),
            }
        }
        self.theme
    }

    // ─── Persistence ─────────────────────────────────────────────────────

    /// Restore the last autosaved graph. Returns whether anything was loaded.
    ///
    /// Unreadable or structurally invalid saves are logged and ignored.
    pub async fn load_from_store(&mut self) -> bool {
        let Some(store) = &self.store else {
            return false;
        };
        let saved = match store.load::<serde_json::Value>(StorageKey::Graph).await {
            Ok(Some(saved)) => saved,
            Ok(None) => return false,
            Err(e) => {
                log::warn!("could not load saved graph: {e}");
                return false;
            }
        };
        let document = match DiagramDocument::from_json(&saved.data.to_string()) {
            Ok(document) => document,
            Err(e) => {
                log::warn!("saved graph rejected: {e}");
                return false;
            }
        };
        if let Err(e) = self.replace_scene(&document) {
            log::warn!("saved graph rejected: {e}");
            return false;
        }
        self.scene.drain_events();
        self.history.clear();
        self.dirty = false;
        true
    }

    /// Write the pending autosave now.
    pub async fn save_now(&mut self) {
        if let Some(autosave) = &self.autosave {
            autosave.notify(DiagramDocument::from_scene(&self.title, &self.scene));
            autosave.flush().await;
            self.dirty = false;
        }
    }

    /// Flush and stop the autosave worker.
    pub async fn shutdown(mut self) {
        if let Some(autosave) = self.autosave.take() {
            autosave.shutdown().await;
        }
    }

    // ─── Import / export ─────────────────────────────────────────────────

    /// `(file name, JSON text)` for download. Clears the dirty flag.
    pub fn export_json(&mut self) -> Result<(String, String), EditorError> {
        let document = DiagramDocument::from_scene(&self.title, &self.scene);
        let json = document.to_json()?;
        self.dirty = false;
        Ok((document.file_name(), json))
    }

    /// Replace the diagram with an imported document.
    ///
    /// # Errors
    /// Any parse, type or structure failure is returned and the current
    /// diagram is left exactly as it was.
    pub fn import_json(&mut self, text: &str) -> Result<(), EditorError> {
        let document = DiagramDocument::from_json(text).inspect_err(|e| {
            log::warn!("import rejected: {e}");
        })?;
        let snapshot = self.scene.serialize();
        self.replace_scene(&document)?;
        self.history.snapshot(snapshot);
        self.after_change();
        log::debug!("imported \"{}\" with {} cells", self.title, self.scene.len());
        Ok(())
    }

    fn replace_scene(&mut self, document: &DiagramDocument) -> Result<(), EditorError> {
        self.history
            .with_suspended(|_| self.scene.deserialize(&document.snapshot))?;
        self.title = document.title.clone();
        self.controller.reset();
        self.selection.clear();
        self.overlay.destroy();
        self.forms.clear_all();
        self.details = None;
        Ok(())
    }

    /// The current view with editor chrome.
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            theme: self.theme.canvas(),
            viewport: self.viewport,
            decorations: self.decorations(),
        }
    }

    pub fn decorations(&self) -> Vec<Decoration> {
        self.controller.decorations(&self.scene, &self.overlay)
    }

    pub fn render_svg(&self) -> String {
        render_svg(&self.scene, self.factory.registry(), &self.render_options())
    }

    /// SVG of the diagram without chrome at 100% zoom, origin at top-left.
    pub fn export_svg(&mut self) -> String {
        self.with_export_view(|session, options| {
            render_svg(&session.scene, session.factory.registry(), options)
        })
    }

    /// PNG of the diagram without chrome at 100% zoom, origin at top-left.
    pub fn export_png(&mut self) -> Result<Vec<u8>, EditorError> {
        self.with_export_view(|session, options| {
            render_png(&session.scene, session.factory.registry(), options)
        })
        .map_err(EditorError::from)
    }

    /// Hide overlay and tools and normalize zoom/pan around `f`, then put
    /// both back.
    fn with_export_view<R>(&mut self, f: impl FnOnce(&Self, &RenderOptions) -> R) -> R {
        let saved_view = self.viewport.state();
        let was_hidden = self.overlay.is_hidden();
        self.overlay.set_hidden(true);
        self.viewport.reset();
        let options = RenderOptions {
            theme: self.theme.canvas(),
            viewport: self.viewport,
            decorations: Vec::new(),
        };
        let out = f(self, &options);
        self.viewport.restore(saved_view);
        self.overlay.set_hidden(was_hidden);
        out
    }
}
