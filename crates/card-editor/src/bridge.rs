//! Keeps a [`Renderer`] in step with the document.
//!
//! The bridge holds a mirror of what it last told the surface about each
//! node. `reconcile` diffs the document against that mirror and issues the
//! smallest set of create/update/destroy calls. Surface events flow the
//! other way: the surface's new values are written into the mirror first,
//! then the edit goes through the editor, so an accepted edit produces no
//! echo and a rejected one snaps back on the next reconcile.

use card_core::{Document, EditorError, EditorMode, NodeId, NodePatch};
use std::collections::{HashMap, HashSet};

use crate::editor::Editor;
use crate::renderer::{
    DisplaySpec, GesturePhase, Interactivity, Renderer, SurfaceEvent, SurfaceEventKind,
};

/// What one reconcile pass did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileReport {
    pub created: usize,
    pub updated: usize,
    pub destroyed: usize,
    pub restacked: bool,
    /// The surface was not ready; nothing was touched.
    pub deferred: bool,
    /// Per-node failures. The rest of the document still rendered.
    pub errors: Vec<EditorError>,
}

impl ReconcileReport {
    /// No surface call was issued.
    pub fn is_noop(&self) -> bool {
        self.created == 0
            && self.updated == 0
            && self.destroyed == 0
            && !self.restacked
            && self.errors.is_empty()
    }
}

/// What became of one surface event.
#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome {
    /// The edit was applied to the document.
    Applied,
    SelectionChanged,
    /// The document refused the edit; the object snaps back.
    Rejected(EditorError),
    /// The handle does not belong to a node.
    Ignored,
}

struct Mirrored<H> {
    handle: H,
    spec: DisplaySpec,
    interactivity: Interactivity,
}

pub struct RendererBridge<R: Renderer> {
    renderer: R,
    mirror: HashMap<NodeId, Mirrored<R::Handle>>,
    /// Nodes the surface failed to create, with the spec that failed. They
    /// are retried once their appearance changes or on rebuild.
    failed: HashMap<NodeId, (DisplaySpec, EditorError)>,
    stack: Vec<R::Handle>,
    mode: EditorMode,
    pending: bool,
    gesture_open: bool,
}

impl<R: Renderer> RendererBridge<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            renderer,
            mirror: HashMap::new(),
            failed: HashMap::new(),
            stack: Vec::new(),
            mode: EditorMode::default(),
            pending: false,
            gesture_open: false,
        }
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Direct surface access, e.g. to feed it host input.
    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    pub fn handle_of(&self, node: NodeId) -> Option<R::Handle> {
        self.mirror.get(&node).map(|m| m.handle)
    }

    pub fn is_rendered(&self, node: NodeId) -> bool {
        self.mirror.contains_key(&node)
    }

    pub fn rendered_count(&self) -> usize {
        self.mirror.len()
    }

    /// Nodes that currently have no display object because the surface
    /// refused them.
    pub fn failed_nodes(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.failed.keys().copied().collect();
        ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        ids
    }

    /// A reconcile was skipped because the surface was not ready.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    // ─── Document → surface ──────────────────────────────────────────────

    /// Bring the surface in line with `doc`. Idempotent: a second call with
    /// the same document issues no surface calls.
    pub fn reconcile(&mut self, doc: &Document) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        if !self.renderer.is_ready() {
            log::debug!("surface not ready, reconcile deferred");
            self.pending = true;
            report.deferred = true;
            return report;
        }
        self.pending = false;

        let gone: Vec<NodeId> = self
            .mirror
            .keys()
            .filter(|id| !doc.contains(**id))
            .copied()
            .collect();
        for id in gone {
            if let Some(m) = self.mirror.remove(&id) {
                self.renderer.destroy_display_object(m.handle);
                report.destroyed += 1;
            }
        }
        self.failed.retain(|id, _| doc.contains(*id));

        let paint_order = doc.paint_order();
        for id in &paint_order {
            let Some(node) = doc.get(*id) else { continue };
            let spec = DisplaySpec::from_node(node);
            let interactivity = Interactivity::for_node(node, self.mode);

            if let Some(m) = self.mirror.get_mut(id) {
                if let Some(delta) = m.spec.diff(&spec) {
                    match self.renderer.update_display_object(m.handle, &delta) {
                        Ok(()) => {
                            m.spec = spec;
                            report.updated += 1;
                        }
                        Err(err) => report.errors.push(render_failure(*id, &err)),
                    }
                }
                if m.interactivity != interactivity {
                    match self.renderer.set_interactivity(m.handle, interactivity) {
                        Ok(()) => m.interactivity = interactivity,
                        Err(err) => report.errors.push(render_failure(*id, &err)),
                    }
                }
                continue;
            }

            if self.failed.get(id).is_some_and(|(last, _)| *last == spec) {
                continue;
            }
            match self.renderer.create_display_object(&spec) {
                Ok(handle) => {
                    self.failed.remove(id);
                    let interactivity = match self.renderer.set_interactivity(handle, interactivity) {
                        Ok(()) => interactivity,
                        Err(err) => {
                            report.errors.push(render_failure(*id, &err));
                            Interactivity::NONE
                        }
                    };
                    self.mirror.insert(
                        *id,
                        Mirrored {
                            handle,
                            spec,
                            interactivity,
                        },
                    );
                    report.created += 1;
                }
                Err(err) => {
                    let failure = render_failure(*id, &err);
                    self.failed.insert(*id, (spec, failure.clone()));
                    report.errors.push(failure);
                }
            }
        }

        let stack: Vec<R::Handle> = paint_order
            .iter()
            .filter_map(|id| self.mirror.get(id).map(|m| m.handle))
            .collect();
        if stack != self.stack {
            match self.renderer.set_stack_order(&stack) {
                Ok(()) => {
                    self.stack = stack;
                    report.restacked = true;
                }
                Err(err) => log::warn!("restack failed: {err}"),
            }
        }

        if report.created + report.updated + report.destroyed > 0 {
            log::debug!(
                "reconciled: {} created, {} updated, {} destroyed",
                report.created,
                report.updated,
                report.destroyed
            );
        }
        report
    }

    /// Switch between edit and preview. Only interactivity changes; the
    /// document is not touched.
    pub fn set_mode(&mut self, doc: &Document, mode: EditorMode) -> ReconcileReport {
        self.mode = mode;
        self.reconcile(doc)
    }

    /// Throw every display object away and rebuild from `doc`.
    pub fn rebuild(&mut self, doc: &Document) -> ReconcileReport {
        for (_, m) in self.mirror.drain() {
            self.renderer.destroy_display_object(m.handle);
        }
        self.clear_state();
        self.reconcile(doc)
    }

    /// Replace the surface. The old one is disposed before `make` runs, so
    /// two live surfaces never share one host element. Returns the old
    /// surface.
    pub fn reinitialize(&mut self, doc: &Document, make: impl FnOnce() -> R) -> (R, ReconcileReport) {
        self.renderer.dispose();
        self.clear_state();
        let old = std::mem::replace(&mut self.renderer, make());
        log::info!("surface reinitialized");
        let report = self.reconcile(doc);
        (old, report)
    }

    /// Dispose the surface for good and hand it back.
    pub fn shutdown(mut self) -> R {
        self.renderer.dispose();
        self.renderer
    }

    fn clear_state(&mut self) {
        self.mirror.clear();
        self.failed.clear();
        self.stack.clear();
        self.gesture_open = false;
    }

    // ─── Surface → document ──────────────────────────────────────────────

    /// Apply a batch of surface events to `editor`. Update frames are
    /// coalesced first. Each run of gesture ends closes the open gesture
    /// with one history entry, so frames after it start a new one.
    pub fn handle_events(
        &mut self,
        editor: &mut Editor,
        events: &[SurfaceEvent<R::Handle>],
    ) -> Vec<EventOutcome> {
        let events = coalesce(events);
        let mut outcomes = Vec::with_capacity(events.len());

        for (i, event) in events.iter().enumerate() {
            outcomes.push(self.apply_event(editor, event));
            if !is_gesture_end(event) || events.get(i + 1).is_some_and(is_gesture_end) {
                continue;
            }
            if self.gesture_open {
                editor.end_gesture(gesture_label(&event.kind));
                self.gesture_open = false;
            }
        }
        outcomes
    }

    fn apply_event(&mut self, editor: &mut Editor, event: &SurfaceEvent<R::Handle>) -> EventOutcome {
        let Some(node) = self.renderer.node_ref(event.handle) else {
            log::warn!("event on unknown display object {:?}", event.handle);
            return EventOutcome::Ignored;
        };

        let patch = match event.kind {
            SurfaceEventKind::Selected { additive } => {
                return match editor.pick(node, additive) {
                    Ok(()) => EventOutcome::SelectionChanged,
                    Err(err) => EventOutcome::Rejected(err),
                };
            }
            SurfaceEventKind::Deselected => {
                editor.deselect();
                return EventOutcome::SelectionChanged;
            }
            SurfaceEventKind::Moved { x, y } => NodePatch::new().position(x, y),
            SurfaceEventKind::Scaled {
                x,
                y,
                width,
                height,
            } => NodePatch::new().position(x, y).size(width, height),
            SurfaceEventKind::Rotated { rotation } => NodePatch::new().rotation(rotation),
        };

        // the surface already shows these values
        if let Some(m) = self.mirror.get_mut(&node) {
            patch.geometry.apply(&mut m.spec.geometry);
        }

        if self.mode == EditorMode::Preview {
            log::debug!("surface edit on {node} ignored in preview");
            return EventOutcome::Ignored;
        }
        if !editor.in_gesture() {
            editor.begin_gesture();
            self.gesture_open = true;
        }
        match editor.gesture_update(node, &patch) {
            Ok(()) => EventOutcome::Applied,
            Err(err) => {
                log::warn!("surface edit on {node} rejected: {err}");
                EventOutcome::Rejected(err)
            }
        }
    }
}

fn render_failure(node: NodeId, err: &impl std::fmt::Display) -> EditorError {
    log::warn!("renderer failed for {node}: {err}");
    EditorError::Renderer {
        node,
        reason: err.to_string(),
    }
}

fn is_geometric(kind: &SurfaceEventKind) -> bool {
    matches!(
        kind,
        SurfaceEventKind::Moved { .. } | SurfaceEventKind::Scaled { .. } | SurfaceEventKind::Rotated { .. }
    )
}

fn is_gesture_end<H>(event: &SurfaceEvent<H>) -> bool {
    event.phase == GesturePhase::End && is_geometric(&event.kind)
}

fn gesture_label(kind: &SurfaceEventKind) -> &'static str {
    match kind {
        SurfaceEventKind::Scaled { .. } => "resize",
        SurfaceEventKind::Rotated { .. } => "rotate",
        _ => "move",
    }
}

/// Drop update frames superseded by a later event of the same kind on the
/// same object within the same gesture. Events carry absolute values, so
/// only the latest matters; frames after a gesture end never supersede
/// frames before it.
pub fn coalesce<H: Copy + Eq + std::hash::Hash>(events: &[SurfaceEvent<H>]) -> Vec<SurfaceEvent<H>> {
    let mut seen: HashSet<(H, std::mem::Discriminant<SurfaceEventKind>)> = HashSet::new();
    let mut kept: Vec<SurfaceEvent<H>> = Vec::with_capacity(events.len());
    for event in events.iter().rev() {
        if is_gesture_end(event) && kept.last().is_none_or(|next| !is_gesture_end(next)) {
            seen.clear();
        }
        let key = (event.handle, std::mem::discriminant(&event.kind));
        let superseded = !seen.insert(key);
        if superseded && event.phase == GesturePhase::Update && is_geometric(&event.kind) {
            continue;
        }
        kept.push(*event);
    }
    kept.reverse();
    kept
}
