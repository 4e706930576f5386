//! Error taxonomy for document operations.
//!
//! Every variant is local-recoverable: the rejected operation leaves the
//! document untouched and the caller decides how to surface the message.

use crate::id::NodeId;
use crate::model::NodeType;
use std::fmt;
use thiserror::Error;

/// Result type for document and editor operations.
pub type EditorResult<T> = Result<T, EditorError>;

/// Operation gated by a per-node permission flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// Gated by `isDeletable`.
    Delete,
    /// Gated by `isResizable`.
    Resize,
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Permission::Delete => f.write_str("delete"),
            Permission::Resize => f.write_str("resize"),
        }
    }
}

/// Errors raised by the node store, grouping engine, importer and bridge.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EditorError {
    /// An operation referenced a node id that is not in the document.
    #[error("node not found: {0}")]
    NotFound(NodeId),

    /// An insert collided with an existing node id.
    #[error("duplicate node id: {0}")]
    DuplicateId(NodeId),

    /// Re-parenting `node` under `target` would make it its own ancestor.
    #[error("moving {node} under {target} would create a cycle")]
    Cycle { node: NodeId, target: NodeId },

    /// Malformed import payload or config text.
    #[error("parse error: {0}")]
    Parse(String),

    /// The node's flags forbid the operation.
    #[error("{operation} is not permitted on {node}")]
    Permission {
        node: NodeId,
        operation: Permission,
    },

    /// The rendering surface failed to materialize or update a node.
    #[error("renderer failed for {node}: {reason}")]
    Renderer { node: NodeId, reason: String },

    /// Ungroup targeted a node that is not a group.
    #[error("{node} is a {node_type}, not a group")]
    NotAGroup { node: NodeId, node_type: NodeType },

    /// The requested parent cannot hold children.
    #[error("{node} ({node_type}) cannot contain children")]
    InvalidParent { node: NodeId, node_type: NodeType },

    /// Grouping needs at least two distinct nodes.
    #[error("grouping requires at least two nodes, got {0}")]
    GroupTooSmall(usize),

    /// Grouped nodes must share one parent so ungrouping can restore it.
    #[error("cannot group nodes with different parents")]
    MixedParents,

    /// A patch named a field the node type does not have, or gave it a
    /// value of the wrong shape.
    #[error("invalid property `{key}` for {node_type}: {reason}")]
    InvalidProperty {
        node_type: NodeType,
        key: String,
        reason: String,
    },

    /// A document mutation was attempted while an import is in flight.
    #[error("an import is in progress; the document is read-only")]
    ImportInFlight,
}

impl From<serde_json::Error> for EditorError {
    fn from(err: serde_json::Error) -> Self {
        EditorError::Parse(err.to_string())
    }
}
