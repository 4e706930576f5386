//! Shared fixtures for card-editor integration tests.

#![allow(dead_code)]

use card_core::{Geometry, Node, NodeId, NodeProps, NodeType};
use card_editor::{Editor, EditorConfig, HeadlessSurface, Session};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn id(s: &str) -> NodeId {
    NodeId::intern(s)
}

/// A node of `node_type` with its registry-free defaults, placed at the
/// given box.
pub fn node(name: &str, node_type: NodeType, x: f32, y: f32, w: f32, h: f32) -> Node {
    Node::new(id(name), name, NodeProps::default_for(node_type))
        .with_geometry(Geometry::new(x, y, w, h))
}

pub fn rect(name: &str, x: f32, y: f32, w: f32, h: f32) -> Node {
    node(name, NodeType::Rectangle, x, y, w, h)
}

pub fn editor_with(nodes: impl IntoIterator<Item = Node>) -> Editor {
    init_logging();
    let mut editor = Editor::new(EditorConfig::default());
    for n in nodes {
        editor.add_node(n).unwrap();
    }
    editor
}

pub fn session_with(nodes: impl IntoIterator<Item = Node>) -> Session<HeadlessSurface> {
    Session::new(editor_with(nodes), HeadlessSurface::new())
}

pub fn x_of(editor: &Editor, name: &str) -> f32 {
    editor.node(id(name)).unwrap().geometry().x
}
