//! An editor wired to a rendering surface.
//!
//! `Session` is what a host embeds: it routes keyboard input, drops and
//! surface events into the [`Editor`] and reconciles the surface after
//! every change, so the display never lags the document.

use card_core::{EditorError, EditorMode, EditorResult, NodeId, NodePatch, NodeType};

use crate::bridge::{EventOutcome, ReconcileReport, RendererBridge};
use crate::dnd::DragPayload;
use crate::editor::{DispatchOutcome, Editor};
use crate::layers::LayerDropTarget;
use crate::renderer::{Renderer, SurfaceEvent};
use crate::shortcuts::{InputContext, KeyEvent};

pub struct Session<R: Renderer> {
    editor: Editor,
    bridge: RendererBridge<R>,
    input: InputContext,
    last_report: ReconcileReport,
}

impl<R: Renderer> Session<R> {
    /// Attach `renderer` to `editor` and render the current document.
    pub fn new(editor: Editor, renderer: R) -> Self {
        let mut bridge = RendererBridge::new(renderer);
        let last_report = bridge.set_mode(editor.document(), editor.mode());
        Self {
            editor,
            bridge,
            input: InputContext::new(),
            last_report,
        }
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn bridge(&self) -> &RendererBridge<R> {
        &self.bridge
    }

    pub fn renderer(&self) -> &R {
        self.bridge.renderer()
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        self.bridge.renderer_mut()
    }

    pub fn input(&self) -> &InputContext {
        &self.input
    }

    /// Report of the most recent reconcile.
    pub fn last_report(&self) -> &ReconcileReport {
        &self.last_report
    }

    fn sync(&mut self) -> &ReconcileReport {
        self.last_report = self.bridge.reconcile(self.editor.document());
        &self.last_report
    }

    /// Run `f` against the editor, then reconcile.
    pub fn apply<T>(&mut self, f: impl FnOnce(&mut Editor) -> T) -> T {
        let out = f(&mut self.editor);
        self.sync();
        out
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Resolve and carry out a key press. `None` when no shortcut applies.
    pub fn handle_key(&mut self, event: &KeyEvent) -> Option<DispatchOutcome> {
        let action = self.input.resolve(event)?;
        log::debug!("shortcut {action:?}");
        Some(self.apply(|editor| editor.dispatch(action)))
    }

    /// A drag payload released on the canvas at viewport `(vx, vy)`.
    pub fn drop_on_canvas(&mut self, payload: &str, vx: f32, vy: f32) -> EditorResult<NodeId> {
        match DragPayload::from_json(payload)? {
            DragPayload::Component(drag) => self.apply(|editor| editor.drop_component(&drag, vx, vy)),
            DragPayload::Node(id) => Err(EditorError::Parse(format!(
                "layer payload for {id} cannot be dropped on the canvas"
            ))),
        }
    }

    /// A drag payload released on the layers list.
    pub fn drop_on_layers(&mut self, payload: &str, target: &LayerDropTarget) -> EditorResult<()> {
        match DragPayload::from_json(payload)? {
            DragPayload::Node(id) => self.apply(|editor| editor.move_to_layer(id, target)),
            DragPayload::Component(drag) => Err(EditorError::Parse(format!(
                "{} from the palette must be dropped on the canvas",
                drag.node_type
            ))),
        }
    }

    /// Feed interaction reported by the surface.
    pub fn handle_surface_events(&mut self, events: &[SurfaceEvent<R::Handle>]) -> Vec<EventOutcome> {
        let outcomes = self.bridge.handle_events(&mut self.editor, events);
        self.sync();
        outcomes
    }

    /// The surface finished async initialization; run any deferred pass.
    pub fn surface_ready(&mut self) -> &ReconcileReport {
        if self.bridge.is_pending() {
            log::debug!("running deferred reconcile");
        }
        self.sync()
    }

    // ─── Modes ───────────────────────────────────────────────────────────

    pub fn set_mode(&mut self, mode: EditorMode) -> &ReconcileReport {
        if mode == EditorMode::Preview {
            self.input.end_text_edit();
        }
        self.editor.set_mode(mode);
        self.last_report = self.bridge.set_mode(self.editor.document(), mode);
        &self.last_report
    }

    /// Start inline editing of a text-bearing node. Shortcuts are off until
    /// it ends.
    pub fn begin_text_edit(&mut self, id: NodeId) -> EditorResult<()> {
        let node_type = self.editor.document().node(id)?.node_type();
        text_key(node_type)?;
        if self.editor.mode() == EditorMode::Preview {
            return Ok(());
        }
        self.editor.select_node(Some(id))?;
        self.input.begin_text_edit(id);
        Ok(())
    }

    /// Finish inline editing, writing `text` into the node.
    pub fn commit_text_edit(&mut self, text: &str) -> EditorResult<()> {
        let Some(id) = self.input.text_editing() else {
            return Ok(());
        };
        self.input.end_text_edit();
        let key = text_key(self.editor.document().node(id)?.node_type())?;
        let patch = NodePatch::new().field(key, text);
        self.apply(|editor| editor.update_node(id, &patch))
    }

    pub fn cancel_text_edit(&mut self) {
        self.input.end_text_edit();
    }

    // ─── Surface lifecycle ───────────────────────────────────────────────

    /// Drop and rebuild every display object.
    pub fn rebuild(&mut self) -> &ReconcileReport {
        self.last_report = self.bridge.rebuild(self.editor.document());
        &self.last_report
    }

    /// Swap in a new surface; the current one is disposed first.
    pub fn reinitialize(&mut self, make: impl FnOnce() -> R) -> R {
        let (old, report) = self.bridge.reinitialize(self.editor.document(), make);
        self.last_report = report;
        old
    }

    /// Tear down, disposing the surface. Returns the editor and surface.
    pub fn close(self) -> (Editor, R) {
        (self.editor, self.bridge.shutdown())
    }
}

fn text_key(node_type: NodeType) -> EditorResult<&'static str> {
    match node_type {
        NodeType::Text | NodeType::Heading | NodeType::Paragraph => Ok("text"),
        NodeType::Button | NodeType::Badge => Ok("label"),
        other => Err(EditorError::InvalidProperty {
            node_type: other,
            key: "text".into(),
            reason: "node has no editable text".into(),
        }),
    }
}
