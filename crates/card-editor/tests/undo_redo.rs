//! Integration tests: snapshot history through the editor facade.

mod common;

use card_core::{EditorError, NodePatch, NodeType};
use card_editor::{Editor, EditorConfig};
use common::*;
use pretty_assertions::assert_eq;

// ─── Basic undo/redo ────────────────────────────────────────────────────

#[test]
fn add_then_update_records_two_entries() {
    init_logging();
    let mut editor = Editor::default();
    editor
        .add_node(node("t1", NodeType::Text, 10.0, 10.0, 100.0, 20.0))
        .unwrap();
    editor
        .update_node(id("t1"), &NodePatch::new().x(50.0))
        .unwrap();

    assert_eq!(editor.history().len(), 2);
    assert_eq!(editor.history().index(), 1);
    assert_eq!(x_of(&editor, "t1"), 50.0);

    assert!(editor.undo().unwrap());
    assert_eq!(x_of(&editor, "t1"), 10.0);

    assert!(editor.redo().unwrap());
    assert_eq!(x_of(&editor, "t1"), 50.0);
}

#[test]
fn undo_at_the_floor_is_a_noop() {
    let mut editor = editor_with([rect("floor_r", 0.0, 0.0, 10.0, 10.0)]);
    assert!(!editor.can_undo());
    assert!(!editor.undo().unwrap());
    assert!(editor.node(id("floor_r")).is_some());
    assert!(!editor.redo().unwrap());
}

#[test]
fn failed_operation_records_nothing() {
    let mut editor = editor_with([rect("keep_r", 0.0, 0.0, 10.0, 10.0)]);
    let before = editor.document().clone();
    let len = editor.history().len();

    let err = editor.remove_node(id("ghost")).unwrap_err();
    assert_eq!(err, EditorError::NotFound(id("ghost")));
    assert_eq!(editor.history().len(), len);
    assert_eq!(editor.document(), &before);
}

#[test]
fn no_op_update_records_nothing() {
    let mut editor = editor_with([rect("same_r", 5.0, 5.0, 10.0, 10.0)]);
    let len = editor.history().len();
    editor
        .update_node(id("same_r"), &NodePatch::new().x(5.0))
        .unwrap();
    assert_eq!(editor.history().len(), len);
}

#[test]
fn new_edit_after_undo_drops_the_redo_branch() {
    let mut editor = editor_with([rect("branch_r", 0.0, 0.0, 10.0, 10.0)]);
    editor
        .update_node(id("branch_r"), &NodePatch::new().x(1.0))
        .unwrap();
    editor
        .update_node(id("branch_r"), &NodePatch::new().x(2.0))
        .unwrap();
    editor.undo().unwrap();
    assert!(editor.can_redo());

    editor
        .update_node(id("branch_r"), &NodePatch::new().x(7.0))
        .unwrap();
    assert!(!editor.can_redo());
    assert_eq!(editor.history().len(), 3);

    editor.undo().unwrap();
    assert_eq!(x_of(&editor, "branch_r"), 1.0);
}

#[test]
fn history_depth_is_capped() {
    init_logging();
    let config = EditorConfig {
        history_depth: 5,
        ..Default::default()
    };
    let mut editor = Editor::new(config);
    for i in 0..8 {
        editor
            .add_node(rect(&format!("cap_{i}"), i as f32, 0.0, 10.0, 10.0))
            .unwrap();
    }
    assert_eq!(editor.history().len(), 5);

    let mut undone = 0;
    while editor.undo().unwrap() {
        undone += 1;
    }
    assert_eq!(undone, 4);
    // the oldest retained state still has the first four nodes
    assert_eq!(editor.document().len(), 4);
}

// ─── Gestures ───────────────────────────────────────────────────────────

#[test]
fn gesture_records_one_entry() {
    let mut editor = editor_with([rect("drag_r", 0.0, 0.0, 10.0, 10.0)]);
    let len = editor.history().len();

    editor.begin_gesture();
    for x in [3.0, 6.0, 9.0, 12.0] {
        editor
            .gesture_update(id("drag_r"), &NodePatch::new().x(x))
            .unwrap();
    }
    assert_eq!(editor.history().len(), len);
    assert!(editor.end_gesture("move"));

    assert_eq!(editor.history().len(), len + 1);
    editor.undo().unwrap();
    assert_eq!(x_of(&editor, "drag_r"), 0.0);
}

#[test]
fn edit_during_gesture_gets_its_own_entry() {
    let mut editor = editor_with([rect("mid_r", 0.0, 0.0, 10.0, 10.0)]);
    let len = editor.history().len();

    editor.begin_gesture();
    editor
        .gesture_update(id("mid_r"), &NodePatch::new().x(5.0))
        .unwrap();
    editor
        .add_node(node("mid_new", NodeType::Text, 50.0, 50.0, 40.0, 20.0))
        .unwrap();
    assert_eq!(editor.history().len(), len + 1);
    editor
        .gesture_update(id("mid_r"), &NodePatch::new().x(30.0))
        .unwrap();
    assert!(editor.end_gesture("move"));
    assert_eq!(editor.history().len(), len + 2);

    editor.undo().unwrap();
    assert!(editor.node(id("mid_new")).is_some());
    assert_eq!(x_of(&editor, "mid_r"), 5.0);
    editor.undo().unwrap();
    assert!(editor.node(id("mid_new")).is_none());
}

#[test]
fn cancelled_gesture_rolls_back() {
    let mut editor = editor_with([rect("cancel_r", 0.0, 0.0, 10.0, 10.0)]);
    let len = editor.history().len();
    editor.begin_gesture();
    editor
        .gesture_update(id("cancel_r"), &NodePatch::new().x(40.0))
        .unwrap();
    editor.cancel_gesture();

    assert_eq!(x_of(&editor, "cancel_r"), 0.0);
    assert_eq!(editor.history().len(), len);
    assert!(!editor.in_gesture());
}

// ─── Import ─────────────────────────────────────────────────────────────

#[test]
fn import_resets_history() {
    let mut source = editor_with([rect("imp_a", 0.0, 0.0, 10.0, 10.0)]);
    source
        .update_node(id("imp_a"), &NodePatch::new().x(30.0))
        .unwrap();
    let text = source.export_json().unwrap();

    let mut target = editor_with([rect("imp_old", 0.0, 0.0, 10.0, 10.0)]);
    target.import_json(&text).unwrap();

    assert!(target.node(id("imp_old")).is_none());
    assert_eq!(x_of(&target, "imp_a"), 30.0);
    assert_eq!(target.history().len(), 1);
    assert!(!target.can_undo());
}

#[test]
fn mutations_wait_for_import() {
    let mut editor = editor_with([rect("wait_r", 0.0, 0.0, 10.0, 10.0)]);
    editor.begin_import().unwrap();

    assert_eq!(
        editor.add_node(rect("wait_s", 0.0, 0.0, 10.0, 10.0)),
        Err(EditorError::ImportInFlight)
    );
    assert_eq!(editor.undo(), Err(EditorError::ImportInFlight));

    // a rejected payload still ends the critical section
    assert!(matches!(
        editor.finish_import("{ not json"),
        Err(EditorError::Parse(_))
    ));
    assert!(!editor.is_importing());
    assert!(editor.node(id("wait_r")).is_some());
    editor.add_node(rect("wait_s", 0.0, 0.0, 10.0, 10.0)).unwrap();
}
