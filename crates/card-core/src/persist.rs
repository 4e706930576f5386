//! Persisted document format.
//!
//! ```json
//! { "version": 1,
//!   "nodes": { "t1": { "id": "t1", "type": "text", "props": { ... } } },
//!   "order": ["t1"],
//!   "canvasSize": { "width": 600, "height": 400 },
//!   "view": { "zoom": 100, "showGrid": false, "mode": "edit" },
//!   "selection": [] }
//! ```
//!
//! `order`, `view` and `selection` are optional on input. Without `order`,
//! nodes stack in lexical id order.

use crate::error::{EditorError, EditorResult};
use crate::id::NodeId;
use crate::model::{EditorMode, Node};
use crate::store::Document;
use crate::validate::validate_document;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Current (and newest readable) format version.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: f32,
    pub height: f32,
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self {
            width: 600.0,
            height: 400.0,
        }
    }
}

/// View-level state. Saved alongside the document but never undoable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewSettings {
    /// Percent; 100 is 1:1.
    pub zoom: f32,
    pub show_grid: bool,
    pub mode: EditorMode,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            zoom: 100.0,
            show_grid: false,
            mode: EditorMode::Edit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentFile {
    pub version: u32,
    pub nodes: BTreeMap<String, Node>,
    #[serde(default)]
    pub order: Vec<NodeId>,
    #[serde(default)]
    pub canvas_size: CanvasSize,
    #[serde(default)]
    pub view: ViewSettings,
    #[serde(default)]
    pub selection: Vec<NodeId>,
}

impl DocumentFile {
    pub fn from_document(
        doc: &Document,
        canvas_size: CanvasSize,
        view: ViewSettings,
        selection: Vec<NodeId>,
    ) -> Self {
        let nodes = doc
            .iter()
            .map(|n| (n.id.as_str().to_string(), n.clone()))
            .collect();
        Self {
            version: FORMAT_VERSION,
            nodes,
            order: doc.order().to_vec(),
            canvas_size,
            view,
            selection,
        }
    }

    pub fn to_json(&self) -> EditorResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and version-check. Does not build the document yet.
    pub fn parse(text: &str) -> EditorResult<Self> {
        let file: DocumentFile = serde_json::from_str(text)?;
        if file.version == 0 || file.version > FORMAT_VERSION {
            return Err(EditorError::Parse(format!(
                "unsupported document version {} (expected 1..={FORMAT_VERSION})",
                file.version
            )));
        }
        Ok(file)
    }

    /// Build and validate the document. Any inconsistency is a `Parse` error.
    pub fn to_document(&self) -> EditorResult<Document> {
        for (key, node) in &self.nodes {
            if key != node.id.as_str() {
                return Err(EditorError::Parse(format!(
                    "node stored under `{key}` has id `{}`",
                    node.id
                )));
            }
        }

        let order: Vec<NodeId> = if self.order.is_empty() {
            self.nodes.values().map(|n| n.id).collect()
        } else {
            let listed: HashSet<NodeId> = self.order.iter().copied().collect();
            let known: HashSet<NodeId> = self.nodes.values().map(|n| n.id).collect();
            if listed != known || listed.len() != self.order.len() {
                return Err(EditorError::Parse(
                    "`order` must list every node exactly once".into(),
                ));
            }
            self.order.clone()
        };

        let by_id: BTreeMap<&str, &Node> = self
            .nodes
            .values()
            .map(|n| (n.id.as_str(), n))
            .collect();
        let doc = Document::from_parts(
            order
                .iter()
                .filter_map(|id| by_id.get(id.as_str()).map(|n| (*n).clone())),
        )
        .map_err(|e| EditorError::Parse(e.to_string()))?;

        let violations = validate_document(&doc);
        if !violations.is_empty() {
            let messages: Vec<String> = violations
                .iter()
                .map(|v| format!("{}: {}", v.rule, v.message))
                .collect();
            return Err(EditorError::Parse(messages.join("; ")));
        }
        Ok(doc)
    }
}
