//! Structural checks over a document.
//!
//! Reports broken invariants without modifying the document. Imports are
//! rejected when this returns anything.

use crate::id::NodeId;
use crate::store::Document;
use std::collections::HashSet;

// ─── Violation types ─────────────────────────────────────────────────────

/// A single broken invariant.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    /// The node at fault, if the finding is about one node.
    pub node_id: Option<NodeId>,
    /// Human-readable message.
    pub message: String,
    /// Short rule identifier (e.g. "dangling-parent", "cycle").
    pub rule: &'static str,
}

// ─── Public API ───────────────────────────────────────────────────────────

/// Run every rule and collect the findings. Empty means the document is sound.
#[must_use]
pub fn validate_document(doc: &Document) -> Vec<Violation> {
    let mut out = Vec::new();
    check_order(doc, &mut out);
    check_parents(doc, &mut out);
    check_cycles(doc, &mut out);
    out
}

// ─── Rules ────────────────────────────────────────────────────────────────

/// Every node appears exactly once in the stacking order.
fn check_order(doc: &Document, out: &mut Vec<Violation>) {
    let mut seen = HashSet::new();
    for id in doc.order() {
        if !seen.insert(*id) || !doc.contains(*id) {
            out.push(Violation {
                node_id: Some(*id),
                message: format!("`{id}` is listed in the stacking order more than once or without a node"),
                rule: "order-mismatch",
            });
        }
    }
    if seen.len() != doc.len() {
        out.push(Violation {
            node_id: None,
            message: format!(
                "stacking order covers {} of {} nodes",
                seen.len(),
                doc.len()
            ),
            rule: "order-mismatch",
        });
    }
}

/// Parent links point at existing group or container nodes.
fn check_parents(doc: &Document, out: &mut Vec<Violation>) {
    for node in doc.iter() {
        let Some(parent) = node.parent_id else {
            continue;
        };
        match doc.get(parent) {
            None => out.push(Violation {
                node_id: Some(node.id),
                message: format!("`{}` points at missing parent `{parent}`", node.id),
                rule: "dangling-parent",
            }),
            Some(p) if !p.is_canvas() => out.push(Violation {
                node_id: Some(node.id),
                message: format!(
                    "`{}` has parent `{parent}`, a {} that cannot contain children",
                    node.id,
                    p.node_type()
                ),
                rule: "invalid-parent",
            }),
            Some(_) => {}
        }
    }
}

/// No node is its own ancestor.
fn check_cycles(doc: &Document, out: &mut Vec<Violation>) {
    for node in doc.iter() {
        let mut current = node.parent_id;
        let mut steps = 0;
        while let Some(p) = current {
            if p == node.id || steps > doc.len() {
                out.push(Violation {
                    node_id: Some(node.id),
                    message: format!("`{}` is its own ancestor", node.id),
                    rule: "cycle",
                });
                break;
            }
            steps += 1;
            current = doc.get(p).and_then(|n| n.parent_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Node, NodeProps, NodeType};

    fn node(id: &str, node_type: NodeType, parent: Option<&str>) -> Node {
        let mut n = Node::new(NodeId::intern(id), id, NodeProps::default_for(node_type));
        n.parent_id = parent.map(NodeId::intern);
        n
    }

    fn rules(doc: &Document) -> Vec<&'static str> {
        validate_document(doc).into_iter().map(|v| v.rule).collect()
    }

    #[test]
    fn clean_document_has_no_findings() {
        let doc = Document::from_parts([
            node("v_box", NodeType::Container, None),
            node("v_txt", NodeType::Text, Some("v_box")),
        ])
        .unwrap();
        assert!(validate_document(&doc).is_empty());
    }

    #[test]
    fn reports_dangling_and_invalid_parents() {
        let doc = Document::from_parts([
            node("v_leaf", NodeType::Text, None),
            node("v_a", NodeType::Text, Some("v_leaf")),
            node("v_b", NodeType::Text, Some("v_gone")),
        ])
        .unwrap();
        assert_eq!(rules(&doc), vec!["invalid-parent", "dangling-parent"]);
    }

    #[test]
    fn reports_cycles() {
        let doc = Document::from_parts([
            node("v_g1", NodeType::Group, Some("v_g2")),
            node("v_g2", NodeType::Group, Some("v_g1")),
        ])
        .unwrap();
        assert_eq!(rules(&doc), vec!["cycle", "cycle"]);
    }
}
