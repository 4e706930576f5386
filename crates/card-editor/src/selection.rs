//! Active selection.
//!
//! Selection is a view over the document, never stored on nodes. `primary`
//! is the node the property panel edits (`selectedNodeId`); `ids` is the
//! full multi-selection (`selectedNodeIds`) in pick order.

use card_core::{Document, NodeId};
use smallvec::SmallVec;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    primary: Option<NodeId>,
    ids: SmallVec<[NodeId; 4]>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn primary(&self) -> Option<NodeId> {
        self.primary
    }

    pub fn ids(&self) -> &[NodeId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.ids.contains(&id)
    }

    /// Replace the selection entirely; `None` clears it.
    pub fn select(&mut self, id: Option<NodeId>) {
        self.ids.clear();
        self.ids.extend(id);
        self.primary = id;
    }

    pub fn clear(&mut self) {
        self.select(None);
    }

    /// Modifier-qualified pick: add `id`, or remove it if already selected.
    pub fn toggle(&mut self, id: NodeId) {
        if let Some(pos) = self.ids.iter().position(|s| *s == id) {
            self.ids.remove(pos);
            if self.primary == Some(id) {
                self.primary = self.ids.last().copied();
            }
        } else {
            self.ids.push(id);
            self.primary = Some(id);
        }
    }

    /// A pick from the canvas or layers list.
    pub fn pick(&mut self, id: NodeId, additive: bool) {
        if additive {
            self.toggle(id);
        } else {
            self.select(Some(id));
        }
    }

    /// Replace the selection with `ids` (duplicates dropped); the last one
    /// becomes primary.
    pub fn select_many(&mut self, ids: impl IntoIterator<Item = NodeId>) {
        self.ids.clear();
        for id in ids {
            if !self.ids.contains(&id) {
                self.ids.push(id);
            }
        }
        self.primary = self.ids.last().copied();
    }

    /// Drop ids that no longer exist in `doc`.
    pub fn retain_existing(&mut self, doc: &Document) {
        self.ids.retain(|id| doc.contains(*id));
        if self.primary.is_some_and(|p| !doc.contains(p)) {
            self.primary = self.ids.last().copied();
        }
    }

    /// Selected ids whose ancestors are not also selected.
    pub fn top_level(&self, doc: &Document) -> Vec<NodeId> {
        doc.top_level(&self.ids)
    }
}
