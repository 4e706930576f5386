//! Layers panel projection.
//!
//! The panel lists nodes top-most first, children indented under their
//! parent. Stacking order in the document runs the other way (bottom first),
//! so display indices are mirrored when a row is dropped back in.

use card_core::{ChildMap, Document, NodeId, NodeType};
use serde::{Deserialize, Serialize};

use crate::selection::Selection;

/// One row of the layers list.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerRow {
    pub id: NodeId,
    pub name: String,
    pub node_type: NodeType,
    pub depth: usize,
    pub child_count: usize,
    pub selected: bool,
    pub locked: bool,
}

/// Rows depth-first, top-most sibling first.
pub fn layer_rows(doc: &Document, selection: &Selection) -> Vec<LayerRow> {
    let map = doc.child_map();
    let mut rows = Vec::with_capacity(doc.len());
    push_rows(doc, &map, None, 0, selection, &mut rows);
    rows
}

fn push_rows(
    doc: &Document,
    map: &ChildMap,
    parent: Option<NodeId>,
    depth: usize,
    selection: &Selection,
    rows: &mut Vec<LayerRow>,
) {
    let Some(children) = map.get(&parent) else {
        return;
    };
    // corrupted parent chains are rejected on import; this is only a guard
    if depth > doc.len() {
        return;
    }
    for id in children.iter().rev() {
        let Some(node) = doc.get(*id) else { continue };
        rows.push(LayerRow {
            id: *id,
            name: node.display_name.clone(),
            node_type: node.node_type(),
            depth,
            child_count: map.get(&Some(*id)).map_or(0, Vec::len),
            selected: selection.contains(*id),
            locked: !node.is_deletable,
        });
        push_rows(doc, map, Some(*id), depth + 1, selection, rows);
    }
}

/// Drop position in the layers list: `parent` is a node id or `""` for the
/// document root; `display_index` counts rows from the top of that parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerDropTarget {
    pub parent: String,
    pub display_index: usize,
}

impl LayerDropTarget {
    pub fn root(display_index: usize) -> Self {
        Self {
            parent: String::new(),
            display_index,
        }
    }

    pub fn parent_id(&self) -> Option<NodeId> {
        (!self.parent.is_empty()).then(|| NodeId::intern(&self.parent))
    }

    /// The `(target parent, sibling index)` pair for moving `node` here.
    /// The sibling index is `None` for "on top".
    pub fn resolve(&self, doc: &Document, node: NodeId) -> (Option<NodeId>, Option<usize>) {
        let parent = self.parent_id();
        let others = doc
            .children(parent)
            .into_iter()
            .filter(|id| *id != node)
            .count();
        let index = others - self.display_index.min(others);
        (parent, (index < others).then_some(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use card_core::{Node, NodeProps};
    use pretty_assertions::assert_eq;

    fn doc() -> Document {
        let mut doc = Document::new();
        let add = |doc: &mut Document, id: &str, t: NodeType, parent: Option<&str>| {
            let mut node = Node::new(NodeId::intern(id), id, NodeProps::default_for(t));
            node.parent_id = parent.map(NodeId::intern);
            doc.insert(node).unwrap();
        };
        add(&mut doc, "l_bg", NodeType::Rectangle, None);
        add(&mut doc, "l_card", NodeType::Container, None);
        add(&mut doc, "l_title", NodeType::Heading, Some("l_card"));
        add(&mut doc, "l_cta", NodeType::Button, Some("l_card"));
        doc
    }

    #[test]
    fn rows_are_top_first_and_nested() {
        let mut selection = Selection::new();
        selection.select(Some(NodeId::intern("l_title")));
        let rows = layer_rows(&doc(), &selection);
        let summary: Vec<(&str, usize)> = rows.iter().map(|r| (r.id.as_str(), r.depth)).collect();
        assert_eq!(
            summary,
            vec![("l_card", 0), ("l_cta", 1), ("l_title", 1), ("l_bg", 0)]
        );
        assert_eq!(rows[0].child_count, 2);
        assert!(rows[2].selected);
        assert!(!rows[0].selected);
    }

    #[test]
    fn drop_target_mirrors_display_index() {
        let doc = doc();
        let bg = NodeId::intern("l_bg");
        // top of the root list
        assert_eq!(LayerDropTarget::root(0).resolve(&doc, bg), (None, None));
        // below the card: the only other root node
        assert_eq!(LayerDropTarget::root(1).resolve(&doc, bg), (None, Some(0)));

        let into_card = LayerDropTarget {
            parent: "l_card".into(),
            display_index: 1,
        };
        // between the button (top) and the heading
        assert_eq!(
            into_card.resolve(&doc, bg),
            (Some(NodeId::intern("l_card")), Some(1))
        );
    }
}
