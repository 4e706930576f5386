//! Node Store: the authoritative in-memory document.
//!
//! Nodes live in a flat id → node map. Parent/child relations come from each
//! node's `parent_id`; sibling (stacking) order comes from one global `order`
//! list filtered by parent. Nodes are held behind `Arc` so cloning a
//! `Document` for a history snapshot shares every unchanged node.
//!
//! Every coordinate is absolute. Moving a group or container translates its
//! descendants, resizing a group scales them, and ancestor groups re-fit to
//! the union of their children after each change.

use crate::error::{EditorError, EditorResult, Permission};
use crate::geometry::{Bounds, Geometry};
use crate::id::NodeId;
use crate::model::{Node, NodePatch, NodeType};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Parent → children in stacking order (bottom first). `None` is the root.
pub type ChildMap = HashMap<Option<NodeId>, Vec<NodeId>>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    nodes: HashMap<NodeId, Arc<Node>>,
    order: Vec<NodeId>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble a document from nodes in stacking order, without checking
    /// parent links. Callers validate the result (see `validate_document`).
    pub fn from_parts(nodes: impl IntoIterator<Item = Node>) -> EditorResult<Self> {
        let mut doc = Self::new();
        for mut node in nodes {
            node.geometry_mut().normalize();
            let id = node.id;
            if doc.nodes.insert(id, Arc::new(node)).is_some() {
                return Err(EditorError::DuplicateId(id));
            }
            doc.order.push(id);
        }
        Ok(doc)
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id).map(Arc::as_ref)
    }

    /// Like [`get`](Self::get), but a missing id is an error.
    pub fn node(&self, id: NodeId) -> EditorResult<&Node> {
        self.get(id).ok_or(EditorError::NotFound(id))
    }

    /// Global stacking order.
    pub fn order(&self) -> &[NodeId] {
        &self.order
    }

    /// All nodes in global stacking order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.order.iter().filter_map(|id| self.get(*id))
    }

    /// Direct children of `parent` (`None` = root), bottom-most first.
    pub fn children(&self, parent: Option<NodeId>) -> Vec<NodeId> {
        self.iter()
            .filter(|n| n.parent_id == parent)
            .map(|n| n.id)
            .collect()
    }

    pub fn child_map(&self) -> ChildMap {
        let mut map: ChildMap = HashMap::new();
        for node in self.iter() {
            map.entry(node.parent_id).or_default().push(node.id);
        }
        map
    }

    /// Every node below `id`, depth-first in stacking order. Excludes `id`.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let map = self.child_map();
        let mut out = Vec::new();
        collect_subtree(&map, Some(id), &mut HashSet::from([id]), &mut out);
        out
    }

    /// Order in which a surface should paint: each root in stacking order,
    /// immediately followed by its own subtree.
    pub fn paint_order(&self) -> Vec<NodeId> {
        let map = self.child_map();
        let mut out = Vec::with_capacity(self.len());
        collect_subtree(&map, None, &mut HashSet::new(), &mut out);
        out
    }

    /// Whether `ancestor` is a parent, grandparent, etc. of `descendant`.
    pub fn is_ancestor_of(&self, ancestor: NodeId, descendant: NodeId) -> bool {
        if ancestor == descendant {
            return false;
        }
        let mut current = self.get(descendant).and_then(|n| n.parent_id);
        // bounded walk: a corrupted chain must not spin forever
        for _ in 0..=self.len() {
            match current {
                Some(p) if p == ancestor => return true,
                Some(p) => current = self.get(p).and_then(|n| n.parent_id),
                None => return false,
            }
        }
        false
    }

    /// A generated id for a new node of `node_type` that is not in use.
    pub fn fresh_id(&self, node_type: NodeType) -> NodeId {
        NodeId::fresh(node_type.as_str(), |id| self.contains(id))
    }

    // ─── Mutations ───────────────────────────────────────────────────────

    /// Insert `node` on top of its siblings.
    pub fn insert(&mut self, mut node: Node) -> EditorResult<()> {
        if self.contains(node.id) {
            return Err(EditorError::DuplicateId(node.id));
        }
        if let Some(parent) = node.parent_id {
            self.check_parent(parent)?;
        }
        node.geometry_mut().normalize();
        let id = node.id;
        self.nodes.insert(id, Arc::new(node));
        self.order.push(id);
        self.refit_ancestors(id);
        log::trace!("insert {id}");
        Ok(())
    }

    /// Merge `patch` into node `id`.
    ///
    /// Geometry changes propagate: children of a moved group or container
    /// follow it, children of a resized group scale with it (non-resizable
    /// children only move), and ancestor groups re-fit afterwards.
    pub fn update(&mut self, id: NodeId, patch: &NodePatch) -> EditorResult<()> {
        let current = self.node(id)?;
        let before = *current.geometry();
        let node_type = current.node_type();

        let mut next = current.clone();
        next.apply_patch(patch)?;
        let after = *next.geometry();
        self.nodes.insert(id, Arc::new(next));

        if before != after {
            match node_type {
                NodeType::Group => self.transform_descendants(id, &before, &after),
                NodeType::Container => {
                    self.translate_descendants(id, after.x - before.x, after.y - before.y)
                }
                _ => {}
            }
            if node_type == NodeType::Group {
                self.refit(id);
            }
            self.refit_ancestors(id);
        }
        log::trace!("update {id}");
        Ok(())
    }

    /// Remove `id` and its whole subtree. Returns the removed nodes, the
    /// requested node first.
    ///
    /// Fails with `Permission` if any node in the subtree is not deletable;
    /// nothing is removed in that case.
    pub fn remove(&mut self, id: NodeId) -> EditorResult<Vec<Node>> {
        let parent = self.node(id)?.parent_id;
        let mut subtree = vec![id];
        subtree.extend(self.descendants(id));

        if let Some(locked) = subtree
            .iter()
            .find(|n| self.get(**n).is_some_and(|node| !node.is_deletable))
        {
            return Err(EditorError::Permission {
                node: *locked,
                operation: Permission::Delete,
            });
        }

        let doomed: HashSet<NodeId> = subtree.iter().copied().collect();
        self.order.retain(|n| !doomed.contains(n));
        let removed = subtree
            .iter()
            .filter_map(|n| self.nodes.remove(n))
            .map(Arc::unwrap_or_clone)
            .collect();

        if let Some(parent) = parent {
            self.refit_chain(parent);
        }
        log::trace!("remove {id} ({} nodes)", doomed.len());
        Ok(removed)
    }

    /// Deep-copy `id` and its subtree with fresh ids, shifted by `offset` on
    /// both axes, placed directly above the source. Returns the copy's id.
    pub fn duplicate(&mut self, id: NodeId, offset: f32) -> EditorResult<NodeId> {
        let source = self.node(id)?;
        let mut subtree = vec![id];
        subtree.extend(self.descendants(id));

        let mut remap: HashMap<NodeId, NodeId> = HashMap::new();
        for old in &subtree {
            let node_type = self.node(*old)?.node_type();
            remap.insert(*old, self.fresh_id(node_type));
        }
        let copy_id = remap[&id];
        let root_parent = source.parent_id;

        let mut copies = Vec::with_capacity(subtree.len());
        for old in &subtree {
            let mut node = self.node(*old)?.clone();
            node.id = remap[old];
            node.parent_id = if *old == id {
                root_parent
            } else {
                node.parent_id.map(|p| remap.get(&p).copied().unwrap_or(p))
            };
            node.geometry_mut().translate(offset, offset);
            copies.push(node);
        }

        let at = self
            .order
            .iter()
            .position(|n| *n == id)
            .map_or(self.order.len(), |i| i + 1);
        let ids: Vec<NodeId> = copies.iter().map(|n| n.id).collect();
        for node in copies {
            self.nodes.insert(node.id, Arc::new(node));
        }
        self.order.splice(at..at, ids);

        self.refit_ancestors(copy_id);
        log::trace!("duplicate {id} -> {copy_id}");
        Ok(copy_id)
    }

    /// Re-parent `id` under `target` (`None` = document root).
    ///
    /// With `index`, the node lands before the sibling currently at that
    /// position in the target's child list; otherwise it goes on top.
    pub fn move_to(
        &mut self,
        id: NodeId,
        target: Option<NodeId>,
        index: Option<usize>,
    ) -> EditorResult<()> {
        let old_parent = self.node(id)?.parent_id;
        if let Some(t) = target {
            if t == id || self.is_ancestor_of(id, t) {
                return Err(EditorError::Cycle { node: id, target: t });
            }
            self.check_parent(t)?;
        }

        self.order.retain(|n| *n != id);
        let siblings: Vec<NodeId> = self
            .iter()
            .filter(|n| n.parent_id == target)
            .map(|n| n.id)
            .collect();
        let at = match (index.and_then(|i| siblings.get(i)), siblings.last(), target) {
            (Some(before), _, _) => self.position(*before),
            (None, Some(last), _) => self.position(*last).map(|i| i + 1),
            (None, None, Some(t)) => self.position(t).map(|i| i + 1),
            (None, None, None) => None,
        }
        .unwrap_or(self.order.len());
        self.order.insert(at, id);

        if let Some(node) = self.nodes.get_mut(&id) {
            Arc::make_mut(node).parent_id = target;
        }
        if let Some(p) = old_parent {
            self.refit_chain(p);
        }
        self.refit_ancestors(id);
        log::trace!("move {id} -> {target:?}[{index:?}]");
        Ok(())
    }

    // ─── Internals shared with grouping ──────────────────────────────────

    pub(crate) fn check_parent(&self, parent: NodeId) -> EditorResult<()> {
        let node = self.node(parent)?;
        if !node.is_canvas() {
            return Err(EditorError::InvalidParent {
                node: parent,
                node_type: node.node_type(),
            });
        }
        Ok(())
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id).map(Arc::make_mut)
    }

    pub(crate) fn insert_raw(&mut self, node: Node, at: usize) {
        let id = node.id;
        self.nodes.insert(id, Arc::new(node));
        let at = at.min(self.order.len());
        self.order.insert(at, id);
    }

    pub(crate) fn remove_raw(&mut self, id: NodeId) -> Option<Node> {
        self.order.retain(|n| *n != id);
        self.nodes.remove(&id).map(Arc::unwrap_or_clone)
    }

    pub(crate) fn position(&self, id: NodeId) -> Option<usize> {
        self.order.iter().position(|n| *n == id)
    }

    /// Re-fit `id` itself if it is a group, then every ancestor group.
    pub(crate) fn refit_chain(&mut self, id: NodeId) {
        self.refit(id);
        self.refit_ancestors(id);
    }

    /// Re-fit every group above `id`, innermost first.
    pub(crate) fn refit_ancestors(&mut self, id: NodeId) {
        let mut current = self.get(id).and_then(|n| n.parent_id);
        let mut guard = self.len();
        while let Some(parent) = current {
            if guard == 0 {
                break;
            }
            guard -= 1;
            self.refit(parent);
            current = self.get(parent).and_then(|n| n.parent_id);
        }
    }

    /// Set a group's box to the union of its children's bounds. Containers,
    /// leaves and empty groups are left alone. Rotation is kept.
    fn refit(&mut self, id: NodeId) {
        if self.get(id).map(Node::node_type) != Some(NodeType::Group) {
            return;
        }
        let bounds = Bounds::union_all(
            self.iter()
                .filter(|n| n.parent_id == Some(id))
                .map(Node::bounds),
        );
        let Some(bounds) = bounds else { return };
        let fitted = bounds.to_geometry();
        let Some(group) = self.get(id) else { return };
        let g = group.geometry();
        if (g.x, g.y, g.width, g.height) == (fitted.x, fitted.y, fitted.width, fitted.height) {
            return;
        }
        if let Some(group) = self.node_mut(id) {
            let g = group.geometry_mut();
            g.x = fitted.x;
            g.y = fitted.y;
            g.width = fitted.width;
            g.height = fitted.height;
        }
    }

    fn translate_descendants(&mut self, id: NodeId, dx: f32, dy: f32) {
        if dx == 0.0 && dy == 0.0 {
            return;
        }
        for d in self.descendants(id) {
            if let Some(node) = self.node_mut(d) {
                node.geometry_mut().translate(dx, dy);
            }
        }
    }

    /// Map every descendant from the group's old box onto its new box.
    fn transform_descendants(&mut self, id: NodeId, before: &Geometry, after: &Geometry) {
        let sx = if before.width > 0.0 { after.width / before.width } else { 1.0 };
        let sy = if before.height > 0.0 { after.height / before.height } else { 1.0 };
        for d in self.descendants(id) {
            if let Some(node) = self.node_mut(d) {
                let resizable = node.is_resizable;
                let g = node.geometry_mut();
                g.x = after.x + (g.x - before.x) * sx;
                g.y = after.y + (g.y - before.y) * sy;
                if resizable {
                    g.width *= sx;
                    g.height *= sy;
                }
            }
        }
    }
}

fn collect_subtree(
    map: &ChildMap,
    parent: Option<NodeId>,
    seen: &mut HashSet<NodeId>,
    out: &mut Vec<NodeId>,
) {
    let Some(children) = map.get(&parent) else {
        return;
    };
    for child in children {
        // a cyclic parent chain would otherwise recurse forever
        if !seen.insert(*child) {
            continue;
        }
        out.push(*child);
        collect_subtree(map, Some(*child), seen, out);
    }
}
