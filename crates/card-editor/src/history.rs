//! Undo/redo history.
//!
//! A linear stack of whole-document snapshots with a single cursor. Every
//! committed state is pushed; undo and redo move the cursor and hand back
//! the snapshot to restore. Snapshots are cheap because `Document` shares
//! unchanged nodes between clones.
//!
//! The first recorded state is the floor: `can_undo` is `index > 0`, so
//! the cursor never moves below entry 0.
//!
//! Continuous gestures use **snapshot batching**: the document is captured
//! when the gesture starts, intermediate frames are applied live but never
//! recorded, and the gesture end records one entry if anything changed.

use card_core::Document;

/// One history entry.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub document: Document,
    pub label: String,
}

pub struct History {
    entries: Vec<Snapshot>,
    index: usize,
    /// Maximum retained entries.
    max_depth: usize,
    /// Batch nesting depth (0 = not batching).
    batch_depth: usize,
    /// Document captured at the start of the outermost batch.
    batch_start: Option<Document>,
}

impl History {
    pub fn new(max_depth: usize) -> Self {
        Self {
            entries: Vec::with_capacity(max_depth.min(64)),
            index: 0,
            max_depth: max_depth.max(1),
            batch_depth: 0,
            batch_start: None,
        }
    }

    /// Push `document` as the newest state, discarding any redo branch.
    ///
    /// Ignored while a batch is open; the batch end records instead.
    pub fn record(&mut self, document: &Document, label: &str) {
        if self.batch_depth > 0 {
            return;
        }
        if !self.entries.is_empty() {
            self.entries.truncate(self.index + 1);
        }
        self.entries.push(Snapshot {
            document: document.clone(),
            label: label.to_string(),
        });
        while self.entries.len() > self.max_depth {
            self.entries.remove(0);
        }
        self.index = self.entries.len() - 1;
        log::debug!("history: record `{label}` ({}/{})", self.index + 1, self.entries.len());
    }

    /// Step back. Returns the snapshot to restore, or `None` at the floor.
    pub fn undo(&mut self) -> Option<&Snapshot> {
        if !self.can_undo() {
            return None;
        }
        self.index -= 1;
        log::debug!("history: undo -> {}", self.index);
        self.entries.get(self.index)
    }

    /// Step forward. Returns the snapshot to restore, or `None` at the tip.
    pub fn redo(&mut self) -> Option<&Snapshot> {
        if !self.can_redo() {
            return None;
        }
        self.index += 1;
        log::debug!("history: redo -> {}", self.index);
        self.entries.get(self.index)
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    /// Cursor position. Meaningless while [`is_empty`](Self::is_empty).
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn current(&self) -> Option<&Snapshot> {
        self.entries.get(self.index)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|s| s.label.as_str())
    }

    /// Drop everything and start over from `document` (used after import).
    pub fn reset(&mut self, document: &Document, label: &str) {
        self.entries.clear();
        self.index = 0;
        self.batch_depth = 0;
        self.batch_start = None;
        self.record(document, label);
    }

    // ─── Batching ────────────────────────────────────────────────────────

    pub fn in_batch(&self) -> bool {
        self.batch_depth > 0
    }

    /// Open a batch. The outermost call captures `document`.
    pub fn begin_batch(&mut self, document: &Document) {
        if self.batch_depth == 0 {
            self.batch_start = Some(document.clone());
        }
        self.batch_depth += 1;
    }

    /// Close a batch. When the outermost batch closes and `document`
    /// differs from the captured start, one entry is recorded. Returns
    /// whether an entry was recorded.
    pub fn end_batch(&mut self, document: &Document, label: &str) -> bool {
        if self.batch_depth == 0 {
            return false;
        }
        self.batch_depth -= 1;
        if self.batch_depth > 0 {
            return false;
        }
        let changed = self.batch_start.take().is_some_and(|start| start != *document);
        if changed {
            self.record(document, label);
        }
        changed
    }

    /// Record a discrete change made while a batch is open. The batch then
    /// restarts from `document`, so its own entry covers only what follows.
    pub fn record_through_batch(&mut self, document: &Document, label: &str) {
        let depth = std::mem::take(&mut self.batch_depth);
        self.record(document, label);
        self.batch_depth = depth;
        if depth > 0 {
            self.batch_start = Some(document.clone());
        }
    }

    /// Abandon the open batch without recording. Returns the captured start
    /// state so the caller can roll back to it.
    pub fn cancel_batch(&mut self) -> Option<Document> {
        self.batch_depth = 0;
        self.batch_start.take()
    }
}
