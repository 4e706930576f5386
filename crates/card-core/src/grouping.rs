//! Grouping Engine: create and dissolve group nodes over a selection.

use crate::error::{EditorError, EditorResult};
use crate::geometry::Bounds;
use crate::id::NodeId;
use crate::model::{GroupProps, Node, NodeProps, NodeType};
use crate::store::Document;

impl Document {
    /// Drop ids that are missing duplicates or already covered by another
    /// id in the list (an ancestor of theirs is listed too).
    pub fn top_level(&self, ids: &[NodeId]) -> Vec<NodeId> {
        let mut out: Vec<NodeId> = Vec::with_capacity(ids.len());
        for id in ids {
            if !self.contains(*id) || out.contains(id) {
                continue;
            }
            if ids.iter().any(|other| self.is_ancestor_of(*other, *id)) {
                continue;
            }
            out.push(*id);
        }
        out
    }

    /// Wrap `ids` in a new group node `group_id`.
    ///
    /// The nodes must share a parent. The group takes their parent and the
    /// stacking slot of the lowest member, and its box is the union of the
    /// members' bounds. Nested selections (a node plus its ancestor) collapse
    /// to the ancestor before the size check.
    pub fn group(
        &mut self,
        ids: &[NodeId],
        group_id: NodeId,
        display_name: &str,
    ) -> EditorResult<NodeId> {
        for id in ids {
            self.node(*id)?;
        }
        if self.contains(group_id) {
            return Err(EditorError::DuplicateId(group_id));
        }
        let members = self.top_level(ids);
        if members.len() < 2 {
            return Err(EditorError::GroupTooSmall(members.len()));
        }

        let parent = self.node(members[0])?.parent_id;
        let mut bounds = Vec::with_capacity(members.len());
        for id in &members {
            let node = self.node(*id)?;
            if node.parent_id != parent {
                return Err(EditorError::MixedParents);
            }
            bounds.push(node.bounds());
        }
        let Some(union) = Bounds::union_all(bounds) else {
            return Err(EditorError::GroupTooSmall(0));
        };

        let slot = members
            .iter()
            .filter_map(|id| self.position(*id))
            .min()
            .unwrap_or(self.order().len());

        let mut group = Node::new(
            group_id,
            display_name,
            NodeProps::Group(GroupProps {
                geometry: union.to_geometry(),
            }),
        );
        group.parent_id = parent;
        self.insert_raw(group, slot);

        for id in &members {
            if let Some(node) = self.node_mut(*id) {
                node.parent_id = Some(group_id);
            }
        }
        self.refit_ancestors(group_id);
        log::trace!("group {group_id} <- {members:?}");
        Ok(group_id)
    }

    /// Dissolve group `id` one level: its children move to the group's
    /// parent in place and the group node is removed. Returns the former
    /// children in stacking order.
    pub fn ungroup(&mut self, id: NodeId) -> EditorResult<Vec<NodeId>> {
        let group = self.node(id)?;
        if group.node_type() != NodeType::Group {
            return Err(EditorError::NotAGroup {
                node: id,
                node_type: group.node_type(),
            });
        }
        let parent = group.parent_id;
        let children = self.children(Some(id));

        for child in &children {
            if let Some(node) = self.node_mut(*child) {
                node.parent_id = parent;
            }
        }
        self.remove_raw(id);
        if let Some(p) = parent {
            self.refit_chain(p);
        }
        log::trace!("ungroup {id} -> {children:?}");
        Ok(children)
    }
}
