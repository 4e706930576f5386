//! Integration tests: loading and saving document files (card-core).

use card_core::*;
use pretty_assertions::assert_eq;

fn load() -> (DocumentFile, Document) {
    let file = DocumentFile::parse(include_str!("fixtures/profile_card.json")).unwrap();
    let doc = file.to_document().unwrap();
    (file, doc)
}

#[test]
fn fixture_loads_with_hierarchy_and_flags() {
    let (file, doc) = load();
    assert_eq!(doc.len(), 4);
    assert_eq!(
        doc.children(Some(NodeId::intern("card"))),
        vec![
            NodeId::intern("avatar"),
            NodeId::intern("name"),
            NodeId::intern("follow"),
        ]
    );
    assert!(!doc.node(NodeId::intern("card")).unwrap().is_deletable);
    assert!(!doc.node(NodeId::intern("follow")).unwrap().is_resizable);
    // a full turn loads as no turn
    assert_eq!(doc.node(NodeId::intern("avatar")).unwrap().geometry().rotation, 0.0);
    assert_eq!(file.canvas_size.width, 420.0);
    assert_eq!(file.view.zoom, 125.0);
    assert_eq!(file.selection, vec![NodeId::intern("name")]);
    assert!(validate_document(&doc).is_empty());
}

#[test]
fn saving_and_reloading_preserves_the_document() {
    let (file, doc) = load();
    let text = DocumentFile::from_document(&doc, file.canvas_size, file.view, file.selection.clone())
        .to_json()
        .unwrap();
    let again = DocumentFile::parse(&text).unwrap().to_document().unwrap();
    assert_eq!(again, doc);
}

#[test]
fn locked_card_cannot_be_removed() {
    let (_, mut doc) = load();
    let err = doc.remove(NodeId::intern("card")).unwrap_err();
    assert_eq!(
        err,
        EditorError::Permission {
            node: NodeId::intern("card"),
            operation: Permission::Delete,
        }
    );
    assert_eq!(doc.len(), 4);
}

#[test]
fn moving_the_card_moves_its_contents() {
    let (_, mut doc) = load();
    doc.update(NodeId::intern("card"), &NodePatch::new().position(120.0, 20.0))
        .unwrap();
    assert_eq!(doc.node(NodeId::intern("avatar")).unwrap().geometry().x, 140.0);
    assert_eq!(doc.node(NodeId::intern("name")).unwrap().geometry().x, 220.0);
}

#[test]
fn order_must_cover_every_node() {
    let text = include_str!("fixtures/profile_card.json")
        .replace(r#""order": ["card", "avatar", "name", "follow"]"#, r#""order": ["card", "avatar"]"#);
    let file = DocumentFile::parse(&text).unwrap();
    assert!(matches!(file.to_document(), Err(EditorError::Parse(_))));
}
