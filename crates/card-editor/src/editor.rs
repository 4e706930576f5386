//! The editor facade: document, history, selection and view state in one
//! place.
//!
//! Every discrete operation is a transaction. It runs against a clone of the
//! document (cheap, nodes are shared) and only a successful result replaces
//! the live document and records one history entry, so a rejected operation
//! never leaves a partial change behind.

use card_core::{
    CanvasSize, ComponentRegistry, Document, DocumentFile, EditorError, EditorMode, EditorResult,
    Node, NodeId, NodePatch, NodeType, ViewSettings,
};
use serde_json::Value;

use crate::config::EditorConfig;
use crate::dnd::{ComponentDrag, ViewTransform};
use crate::history::History;
use crate::layers::{LayerDropTarget, LayerRow, layer_rows};
use crate::selection::Selection;
use crate::shortcuts::ShortcutAction;

/// What a dispatched shortcut did.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// The document changed.
    Applied,
    /// Only the selection changed.
    SelectionChanged,
    /// Only view state changed (zoom, grid).
    ViewChanged,
    /// Serialized document for the host to download.
    Exported(String),
    /// Serialized document for the host to persist.
    Saved(String),
    /// The operation was refused; the document is unchanged.
    Rejected(EditorError),
    /// Nothing to act on (empty selection, nothing to undo).
    Ignored,
}

pub struct Editor {
    doc: Document,
    history: History,
    selection: Selection,
    registry: ComponentRegistry,
    config: EditorConfig,
    view: ViewSettings,
    canvas_size: CanvasSize,
    origin: (f32, f32),
    viewport: (f32, f32),
    import_in_flight: bool,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Editor {
    pub fn new(config: EditorConfig) -> Self {
        Self::with_registry(config, ComponentRegistry::builtin())
    }

    /// Build an editor over `registry`. Out-of-range config values are
    /// repaired first.
    pub fn with_registry(config: EditorConfig, registry: ComponentRegistry) -> Self {
        let config = config.sanitized();
        let canvas_size = config.canvas_size;
        Self {
            doc: Document::new(),
            history: History::new(config.history_depth),
            selection: Selection::new(),
            registry,
            view: ViewSettings::default(),
            canvas_size,
            origin: (0.0, 0.0),
            viewport: (canvas_size.width, canvas_size.height),
            import_in_flight: false,
            config,
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.doc.get(id)
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn zoom(&self) -> f32 {
        self.view.zoom
    }

    pub fn show_grid(&self) -> bool {
        self.view.show_grid
    }

    pub fn mode(&self) -> EditorMode {
        self.view.mode
    }

    pub fn canvas_size(&self) -> CanvasSize {
        self.canvas_size
    }

    pub fn view_transform(&self) -> ViewTransform {
        ViewTransform {
            zoom: self.view.zoom,
            origin_x: self.origin.0,
            origin_y: self.origin.1,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn is_importing(&self) -> bool {
        self.import_in_flight
    }

    pub fn layer_rows(&self) -> Vec<LayerRow> {
        layer_rows(&self.doc, &self.selection)
    }

    // ─── Transactions ────────────────────────────────────────────────────

    fn ensure_writable(&self) -> EditorResult<()> {
        if self.import_in_flight {
            return Err(EditorError::ImportInFlight);
        }
        Ok(())
    }

    /// Run `op` against a working copy and commit it only on success. A
    /// change records one history entry, even while a gesture is open.
    fn transact<T>(
        &mut self,
        label: &str,
        op: impl FnOnce(&mut Document, &mut Selection, &EditorConfig) -> EditorResult<T>,
    ) -> EditorResult<T> {
        self.commit(label, false, op)
    }

    /// `transact`, except that a `frame` of an open gesture records nothing.
    fn commit<T>(
        &mut self,
        label: &str,
        frame: bool,
        op: impl FnOnce(&mut Document, &mut Selection, &EditorConfig) -> EditorResult<T>,
    ) -> EditorResult<T> {
        self.ensure_writable()?;
        let mut doc = self.doc.clone();
        let mut selection = self.selection.clone();
        let out = match op(&mut doc, &mut selection, &self.config) {
            Ok(out) => out,
            Err(err) => {
                log::debug!("{label} rejected: {err}");
                return Err(err);
            }
        };
        if doc != self.doc {
            self.doc = doc;
            match (self.history.in_batch(), frame) {
                (true, true) => {}
                (true, false) => self.history.record_through_batch(&self.doc, label),
                (false, _) => self.history.record(&self.doc, label),
            }
            log::debug!("{label} committed");
        }
        selection.retain_existing(&self.doc);
        self.selection = selection;
        Ok(out)
    }

    // ─── Node Store operations ───────────────────────────────────────────

    /// Insert a fully-formed node.
    pub fn add_node(&mut self, node: Node) -> EditorResult<NodeId> {
        let id = node.id;
        self.transact("add", |doc, _, _| doc.insert(node))?;
        Ok(id)
    }

    /// Create a node of `node_type` from its registry defaults at `(x, y)`.
    pub fn create_node(&mut self, node_type: NodeType, x: f32, y: f32) -> EditorResult<NodeId> {
        let drag = match self.registry.get(node_type) {
            Some(config) => ComponentDrag::from_config(config),
            None => ComponentDrag {
                node_type,
                display_name: node_type.as_str().to_string(),
                default_props: Default::default(),
            },
        };
        self.place_component(&drag, x, y)
    }

    /// Merge `patch` into node `id`.
    pub fn update_node(&mut self, id: NodeId, patch: &NodePatch) -> EditorResult<()> {
        self.transact("update", |doc, _, _| doc.update(id, patch))
    }

    /// Merge `patch` into node `id` as one frame of the open gesture. The
    /// gesture end records it; without a gesture this is `update_node`.
    pub fn gesture_update(&mut self, id: NodeId, patch: &NodePatch) -> EditorResult<()> {
        self.commit("update", true, |doc, _, _| doc.update(id, patch))
    }

    /// Property-panel style update from a JSON object.
    pub fn update_node_json(&mut self, id: NodeId, patch: &Value) -> EditorResult<()> {
        let patch = NodePatch::from_value(patch)?;
        self.update_node(id, &patch)
    }

    /// Remove `id` and its subtree. Returns the removed nodes.
    pub fn remove_node(&mut self, id: NodeId) -> EditorResult<Vec<Node>> {
        self.transact("remove", |doc, _, _| doc.remove(id))
    }

    /// Copy `id` (and its subtree) with fresh ids; the copy is selected.
    pub fn duplicate_node(&mut self, id: NodeId) -> EditorResult<NodeId> {
        self.transact("duplicate", |doc, selection, config| {
            let copy = doc.duplicate(id, config.duplicate_offset)?;
            selection.select(Some(copy));
            Ok(copy)
        })
    }

    /// Re-parent `id` under `target` (`None` = root) at sibling `index`
    /// (`None` = on top).
    pub fn move_node(
        &mut self,
        id: NodeId,
        target: Option<NodeId>,
        index: Option<usize>,
    ) -> EditorResult<()> {
        self.transact("move", |doc, _, _| doc.move_to(id, target, index))
    }

    /// Layers-list drop of `id` onto `target`.
    pub fn move_to_layer(&mut self, id: NodeId, target: &LayerDropTarget) -> EditorResult<()> {
        let (parent, index) = target.resolve(&self.doc, id);
        self.move_node(id, parent, index)
    }

    // ─── Grouping ────────────────────────────────────────────────────────

    /// Group `ids` into a new group node, which becomes the selection.
    pub fn create_group(&mut self, ids: &[NodeId]) -> EditorResult<NodeId> {
        let name = self
            .registry
            .get(NodeType::Group)
            .map_or_else(|| "Group".to_string(), |c| c.display_name.clone());
        self.transact("group", |doc, selection, _| {
            let group_id = doc.fresh_id(NodeType::Group);
            doc.group(ids, group_id, &name)?;
            selection.select(Some(group_id));
            Ok(group_id)
        })
    }

    /// Dissolve group `id`. Its former children become the selection.
    pub fn ungroup(&mut self, id: NodeId) -> EditorResult<Vec<NodeId>> {
        self.transact("ungroup", |doc, selection, _| {
            let children = doc.ungroup(id)?;
            selection.select_many(children.iter().copied());
            Ok(children)
        })
    }

    // ─── Selection-wide operations ───────────────────────────────────────

    /// Replace the selection. Fails if `id` is not in the document.
    pub fn select_node(&mut self, id: Option<NodeId>) -> EditorResult<()> {
        if let Some(id) = id {
            self.doc.node(id)?;
        }
        self.selection.select(id);
        Ok(())
    }

    /// Canvas or layers-list pick; `additive` toggles membership.
    pub fn pick(&mut self, id: NodeId, additive: bool) -> EditorResult<()> {
        self.doc.node(id)?;
        self.selection.pick(id, additive);
        Ok(())
    }

    pub fn deselect(&mut self) {
        self.selection.clear();
    }

    /// Remove every selected node (ancestors cover their descendants) as
    /// one history entry. All or nothing.
    pub fn delete_selection(&mut self) -> EditorResult<usize> {
        let targets = self.selection.top_level(&self.doc);
        self.transact("delete", |doc, _, _| {
            let mut count = 0;
            for id in &targets {
                count += doc.remove(*id)?.len();
            }
            Ok(count)
        })
    }

    /// Duplicate every selected node; the copies become the selection.
    pub fn duplicate_selection(&mut self) -> EditorResult<Vec<NodeId>> {
        let targets = self.selection.top_level(&self.doc);
        self.transact("duplicate", |doc, selection, config| {
            let mut copies = Vec::with_capacity(targets.len());
            for id in &targets {
                copies.push(doc.duplicate(*id, config.duplicate_offset)?);
            }
            selection.select_many(copies.iter().copied());
            Ok(copies)
        })
    }

    /// Translate every selected node by `(dx, dy)` as one history entry.
    pub fn nudge_selection(&mut self, dx: f32, dy: f32) -> EditorResult<()> {
        let targets = self.selection.top_level(&self.doc);
        self.transact("nudge", |doc, _, _| {
            for id in &targets {
                let g = *doc.node(*id)?.geometry();
                doc.update(*id, &NodePatch::new().position(g.x + dx, g.y + dy))?;
            }
            Ok(())
        })
    }

    pub fn group_selection(&mut self) -> EditorResult<NodeId> {
        let ids = self.selection.ids().to_vec();
        self.create_group(&ids)
    }

    /// Ungroup the primary selection.
    pub fn ungroup_selection(&mut self) -> EditorResult<Vec<NodeId>> {
        let Some(id) = self.selection.primary() else {
            return Ok(Vec::new());
        };
        self.ungroup(id)
    }

    // ─── History ─────────────────────────────────────────────────────────

    /// Restore the previous snapshot. `Ok(false)` when there is none.
    pub fn undo(&mut self) -> EditorResult<bool> {
        self.ensure_writable()?;
        let Some(snapshot) = self.history.undo() else {
            return Ok(false);
        };
        self.doc = snapshot.document.clone();
        self.selection.retain_existing(&self.doc);
        Ok(true)
    }

    /// Re-apply the next snapshot. `Ok(false)` when there is none.
    pub fn redo(&mut self) -> EditorResult<bool> {
        self.ensure_writable()?;
        let Some(snapshot) = self.history.redo() else {
            return Ok(false);
        };
        self.doc = snapshot.document.clone();
        self.selection.retain_existing(&self.doc);
        Ok(true)
    }

    // ─── Gestures ────────────────────────────────────────────────────────

    /// Open a continuous gesture: [`gesture_update`](Self::gesture_update)
    /// frames until [`end_gesture`](Self::end_gesture) apply live but record
    /// nothing. Any other edit made meanwhile records on its own.
    pub fn begin_gesture(&mut self) {
        self.history.begin_batch(&self.doc);
    }

    /// Close the gesture, recording one entry if the document changed.
    pub fn end_gesture(&mut self, label: &str) -> bool {
        self.history.end_batch(&self.doc, label)
    }

    /// Abandon the gesture and roll back to where it started.
    pub fn cancel_gesture(&mut self) {
        if let Some(start) = self.history.cancel_batch() {
            self.doc = start;
            self.selection.retain_existing(&self.doc);
        }
    }

    pub fn in_gesture(&self) -> bool {
        self.history.in_batch()
    }

    // ─── Drag and drop ───────────────────────────────────────────────────

    /// Drop a palette item at viewport `(vx, vy)`. The new node is selected.
    pub fn drop_component(&mut self, drag: &ComponentDrag, vx: f32, vy: f32) -> EditorResult<NodeId> {
        let (x, y) = self.view_transform().to_document(vx, vy);
        self.place_component(drag, x, y)
    }

    fn place_component(&mut self, drag: &ComponentDrag, x: f32, y: f32) -> EditorResult<NodeId> {
        let node = drag.build_node(self.doc.fresh_id(drag.node_type), &self.registry, x, y)?;
        let id = node.id;
        self.transact("drop", |doc, selection, _| {
            doc.insert(node)?;
            selection.select(Some(id));
            Ok(id)
        })
    }

    // ─── View (never recorded) ───────────────────────────────────────────

    pub fn set_zoom(&mut self, zoom: f32) {
        self.view.zoom = self.config.clamp_zoom(zoom);
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.view.zoom + self.config.zoom_step);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.view.zoom - self.config.zoom_step);
    }

    pub fn zoom_reset(&mut self) {
        self.set_zoom(100.0);
    }

    /// Fit the artboard into the viewport and center it.
    pub fn zoom_to_fit(&mut self) {
        let (vw, vh) = self.viewport;
        let CanvasSize { width, height } = self.canvas_size;
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        self.set_zoom((vw / width).min(vh / height) * 100.0);
        let s = self.view.zoom / 100.0;
        self.origin = ((vw - width * s) / 2.0, (vh - height * s) / 2.0);
    }

    pub fn toggle_grid(&mut self) {
        self.view.show_grid = !self.view.show_grid;
    }

    pub fn set_mode(&mut self, mode: EditorMode) {
        self.view.mode = mode;
    }

    pub fn set_origin(&mut self, x: f32, y: f32) {
        self.origin = (x, y);
    }

    pub fn set_viewport_size(&mut self, width: f32, height: f32) {
        self.viewport = (width, height);
    }

    pub fn set_canvas_size(&mut self, size: CanvasSize) {
        self.canvas_size = size;
    }

    // ─── Import / export ─────────────────────────────────────────────────

    pub fn export_json(&self) -> EditorResult<String> {
        let file = DocumentFile::from_document(
            &self.doc,
            self.canvas_size,
            self.view,
            self.selection.ids().to_vec(),
        );
        let text = file.to_json()?;
        log::info!("exported {} nodes", self.doc.len());
        Ok(text)
    }

    /// Replace the document with `text`, or reject and keep the current one.
    /// History restarts from the imported document.
    pub fn import_json(&mut self, text: &str) -> EditorResult<()> {
        self.ensure_writable()?;
        self.replace_from(text)
    }

    /// Enter the import critical section: until it ends, every document
    /// mutation fails with `ImportInFlight`.
    pub fn begin_import(&mut self) -> EditorResult<()> {
        self.ensure_writable()?;
        self.import_in_flight = true;
        log::info!("import started");
        Ok(())
    }

    /// Finish an import with the loaded text. The critical section ends
    /// whether or not the text is accepted.
    pub fn finish_import(&mut self, text: &str) -> EditorResult<()> {
        self.import_in_flight = false;
        self.replace_from(text)
    }

    pub fn cancel_import(&mut self) {
        if self.import_in_flight {
            log::info!("import cancelled");
        }
        self.import_in_flight = false;
    }

    fn replace_from(&mut self, text: &str) -> EditorResult<()> {
        let file = DocumentFile::parse(text)?;
        let doc = file.to_document()?;

        self.history.cancel_batch();
        self.doc = doc;
        self.history.reset(&self.doc, "import");
        self.selection.select_many(file.selection.iter().copied());
        self.selection.retain_existing(&self.doc);
        self.canvas_size = file.canvas_size;
        self.view = ViewSettings {
            zoom: self.config.clamp_zoom(file.view.zoom),
            ..file.view
        };
        log::info!("imported {} nodes", self.doc.len());
        Ok(())
    }

    // ─── Shortcut dispatch ───────────────────────────────────────────────

    /// Carry out a resolved shortcut.
    pub fn dispatch(&mut self, action: ShortcutAction) -> DispatchOutcome {
        use DispatchOutcome as Out;

        let doc_result = |r: EditorResult<bool>| match r {
            Ok(true) => Out::Applied,
            Ok(false) => Out::Ignored,
            Err(err) => Out::Rejected(err),
        };
        let needs_selection = matches!(
            action,
            ShortcutAction::Delete
                | ShortcutAction::Duplicate
                | ShortcutAction::Nudge(_)
                | ShortcutAction::NudgeLarge(_)
                | ShortcutAction::Group
                | ShortcutAction::Ungroup
        );
        if needs_selection && self.selection.is_empty() {
            return Out::Ignored;
        }

        match action {
            ShortcutAction::Undo => doc_result(self.undo()),
            ShortcutAction::Redo => doc_result(self.redo()),
            ShortcutAction::Delete => doc_result(self.delete_selection().map(|n| n > 0)),
            ShortcutAction::Duplicate => doc_result(self.duplicate_selection().map(|c| !c.is_empty())),
            ShortcutAction::Nudge(dir) | ShortcutAction::NudgeLarge(dir) => {
                let step = match action {
                    ShortcutAction::NudgeLarge(_) => self.config.large_nudge(),
                    _ => self.config.nudge_step,
                };
                let (ux, uy) = dir.unit();
                doc_result(self.nudge_selection(ux * step, uy * step).map(|_| true))
            }
            ShortcutAction::Group => doc_result(self.group_selection().map(|_| true)),
            ShortcutAction::Ungroup => doc_result(self.ungroup_selection().map(|_| true)),
            ShortcutAction::Deselect => {
                if self.selection.is_empty() {
                    return Out::Ignored;
                }
                self.deselect();
                Out::SelectionChanged
            }
            ShortcutAction::ZoomIn => {
                self.zoom_in();
                Out::ViewChanged
            }
            ShortcutAction::ZoomOut => {
                self.zoom_out();
                Out::ViewChanged
            }
            ShortcutAction::ZoomToFit => {
                self.zoom_to_fit();
                Out::ViewChanged
            }
            ShortcutAction::ZoomReset => {
                self.zoom_reset();
                Out::ViewChanged
            }
            ShortcutAction::ToggleGrid => {
                self.toggle_grid();
                Out::ViewChanged
            }
            ShortcutAction::Export => match self.export_json() {
                Ok(json) => Out::Exported(json),
                Err(err) => Out::Rejected(err),
            },
            ShortcutAction::Save => match self.export_json() {
                Ok(json) => Out::Saved(json),
                Err(err) => Out::Rejected(err),
            },
        }
    }
}
