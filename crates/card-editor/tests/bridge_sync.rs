//! Integration tests: document ↔ surface reconciliation through a session
//! backed by the headless surface.

mod common;

use card_core::{EditorError, EditorMode, GeometryPatch, NodePatch, NodeType, Permission};
use card_editor::{
    DisplayDelta, EventOutcome, GesturePhase, HeadlessSurface, Interactivity, Session,
    SurfaceEvent, SurfaceEventKind, SurfaceOp,
};
use common::*;
use pretty_assertions::assert_eq;

// ─── Document → surface ─────────────────────────────────────────────────

#[test]
fn initial_render_follows_paint_order() {
    let session = session_with([
        node("ps_card", NodeType::Container, 0.0, 0.0, 300.0, 200.0),
        node("ps_title", NodeType::Heading, 10.0, 10.0, 200.0, 30.0).with_parent(id("ps_card")),
        rect("ps_top", 50.0, 50.0, 20.0, 20.0),
    ]);
    assert_eq!(session.renderer().len(), 3);
    assert_eq!(
        session.renderer().stacked_nodes(),
        vec![id("ps_card"), id("ps_title"), id("ps_top")]
    );
    assert!(session.last_report().errors.is_empty());
}

#[test]
fn update_sends_only_touched_fields() {
    let mut session = session_with([node("us_t1", NodeType::Text, 10.0, 10.0, 100.0, 20.0)]);
    session.renderer_mut().take_ops();

    session
        .apply(|e| e.update_node(id("us_t1"), &NodePatch::new().x(50.0)))
        .unwrap();

    assert_eq!(
        session.renderer_mut().take_ops(),
        vec![SurfaceOp::Update(
            id("us_t1"),
            DisplayDelta {
                geometry: GeometryPatch {
                    x: Some(50.0),
                    ..Default::default()
                },
                body: None,
            }
        )]
    );
}

#[test]
fn reconcile_is_idempotent() {
    let mut session = session_with([
        rect("idem_a", 0.0, 0.0, 10.0, 10.0),
        rect("idem_b", 20.0, 0.0, 10.0, 10.0),
    ]);
    session.renderer_mut().take_ops();
    session.apply(|_| ());
    assert!(session.last_report().is_noop());
    assert!(session.renderer().ops().is_empty());
}

#[test]
fn full_turn_rotation_settles_after_one_reconcile() {
    let mut spun = rect("turn_r", 0.0, 0.0, 10.0, 10.0);
    spun.geometry_mut().rotation = 360.0;
    let mut session = session_with([spun]);
    assert_eq!(session.editor().node(id("turn_r")).unwrap().geometry().rotation, 0.0);
    session.renderer_mut().take_ops();

    session.apply(|_| ());
    session.apply(|_| ());
    assert!(session.last_report().is_noop());
    assert!(session.renderer().ops().is_empty());
}

#[test]
fn removal_and_undo_destroy_and_recreate() {
    let mut session = session_with([
        rect("rm_a", 0.0, 0.0, 10.0, 10.0),
        rect("rm_b", 20.0, 0.0, 10.0, 10.0),
    ]);
    session.apply(|e| e.remove_node(id("rm_a"))).unwrap();
    assert_eq!(session.renderer().len(), 1);
    assert!(session.renderer().handle_for(id("rm_a")).is_none());

    session.apply(|e| e.undo()).unwrap();
    assert_eq!(session.renderer().stacked_nodes(), vec![id("rm_a"), id("rm_b")]);
}

#[test]
fn failing_node_does_not_block_the_rest() {
    init_logging();
    let editor = editor_with([
        node("fail_img", NodeType::Image, 0.0, 0.0, 80.0, 80.0),
        node("fail_txt", NodeType::Text, 0.0, 100.0, 80.0, 20.0),
    ]);
    let session = Session::new(editor, HeadlessSurface::new().rejecting(NodeType::Image));

    let errors = &session.last_report().errors;
    assert_eq!(errors.len(), 1);
    assert!(matches!(&errors[0], EditorError::Renderer { node, .. } if *node == id("fail_img")));
    assert!(session.renderer().handle_for(id("fail_txt")).is_some());
    assert_eq!(session.bridge().failed_nodes(), vec![id("fail_img")]);
}

#[test]
fn reconcile_waits_for_a_ready_surface() {
    init_logging();
    let editor = editor_with([rect("late_r", 0.0, 0.0, 10.0, 10.0)]);
    let mut surface = HeadlessSurface::new();
    surface.set_ready(false);

    let mut session = Session::new(editor, surface);
    assert!(session.last_report().deferred);
    assert!(session.renderer().is_empty());

    session.renderer_mut().set_ready(true);
    assert_eq!(session.surface_ready().created, 1);
}

// ─── Composites ─────────────────────────────────────────────────────────

#[test]
fn composite_node_is_one_interactive_container() {
    let mut session = session_with([node("cmp_btn", NodeType::Button, 0.0, 0.0, 120.0, 40.0)]);
    let handle = session.renderer().handle_for(id("cmp_btn")).unwrap();
    let object = session.renderer().object(handle).unwrap();
    assert_eq!(object.parts.len(), 2);
    assert!(object.parts.iter().all(|p| !p.interactive && p.node_ref.is_none()));
    assert!(object.interactivity.selectable);

    let outcomes = session.handle_surface_events(&[SurfaceEvent::new(
        handle,
        SurfaceEventKind::Selected { additive: false },
        GesturePhase::End,
    )]);
    assert_eq!(outcomes, vec![EventOutcome::SelectionChanged]);
    assert_eq!(session.editor().selection().primary(), Some(id("cmp_btn")));
}

// ─── Surface → document ─────────────────────────────────────────────────

#[test]
fn drag_gesture_records_once_and_does_not_echo() {
    let mut session = session_with([rect("drag_me", 0.0, 0.0, 10.0, 10.0)]);
    let handle = session.renderer().handle_for(id("drag_me")).unwrap();
    let len = session.editor().history().len();
    session.renderer_mut().take_ops();

    let frame = |x: f32, phase| SurfaceEvent::new(handle, SurfaceEventKind::Moved { x, y: 5.0 }, phase);
    for x in [10.0, 20.0, 30.0] {
        let out = session.handle_surface_events(&[frame(x, GesturePhase::Update)]);
        assert_eq!(out, vec![EventOutcome::Applied]);
    }
    assert_eq!(session.editor().history().len(), len);
    assert!(session.editor().in_gesture());

    session.handle_surface_events(&[frame(40.0, GesturePhase::End)]);
    assert_eq!(session.editor().history().len(), len + 1);
    assert!(!session.editor().in_gesture());
    assert_eq!(x_of(session.editor(), "drag_me"), 40.0);

    // the surface already showed every position
    assert!(session.renderer().ops().is_empty());
}

#[test]
fn coalesced_batch_applies_latest_frame() {
    let mut session = session_with([rect("co_r", 0.0, 0.0, 10.0, 10.0)]);
    let handle = session.renderer().handle_for(id("co_r")).unwrap();
    let frames: Vec<_> = [5.0, 6.0, 7.0]
        .into_iter()
        .map(|x| SurfaceEvent::new(handle, SurfaceEventKind::Moved { x, y: 0.0 }, GesturePhase::Update))
        .collect();

    let outcomes = session.handle_surface_events(&frames);
    assert_eq!(outcomes.len(), 1);
    assert_eq!(x_of(session.editor(), "co_r"), 7.0);
}

#[test]
fn end_then_new_frames_in_one_batch_are_two_gestures() {
    let mut session = session_with([rect("two_r", 0.0, 0.0, 10.0, 10.0)]);
    let handle = session.renderer().handle_for(id("two_r")).unwrap();
    let len = session.editor().history().len();
    let frame = |x: f32, phase| SurfaceEvent::new(handle, SurfaceEventKind::Moved { x, y: 0.0 }, phase);

    let outcomes = session.handle_surface_events(&[
        frame(10.0, GesturePhase::Update),
        frame(20.0, GesturePhase::End),
        frame(30.0, GesturePhase::Update),
        frame(40.0, GesturePhase::Update),
    ]);
    assert_eq!(outcomes, vec![EventOutcome::Applied; 3]);
    assert_eq!(session.editor().history().len(), len + 1);
    assert!(session.editor().in_gesture());

    session.handle_surface_events(&[frame(50.0, GesturePhase::End)]);
    assert_eq!(session.editor().history().len(), len + 2);
    assert!(!session.editor().in_gesture());

    session.apply(|e| e.undo()).unwrap();
    assert_eq!(x_of(session.editor(), "two_r"), 20.0);
}

#[test]
fn edit_during_surface_drag_is_undone_on_its_own() {
    let mut session = session_with([rect("mix_r", 0.0, 0.0, 10.0, 10.0)]);
    let handle = session.renderer().handle_for(id("mix_r")).unwrap();
    let len = session.editor().history().len();
    let frame = |x: f32, phase| SurfaceEvent::new(handle, SurfaceEventKind::Moved { x, y: 0.0 }, phase);

    session.handle_surface_events(&[frame(15.0, GesturePhase::Update)]);
    session
        .apply(|e| e.add_node(node("mix_new", NodeType::Text, 50.0, 50.0, 40.0, 20.0)))
        .unwrap();
    assert_eq!(session.editor().history().len(), len + 1);

    session.handle_surface_events(&[frame(25.0, GesturePhase::End)]);
    assert_eq!(session.editor().history().len(), len + 2);

    session.apply(|e| e.undo()).unwrap();
    assert!(session.editor().node(id("mix_new")).is_some());
    assert_eq!(x_of(session.editor(), "mix_r"), 15.0);
}

#[test]
fn rejected_resize_snaps_back() {
    let mut session = session_with([rect("fixed_r", 0.0, 0.0, 50.0, 50.0).with_flags(false, true)]);
    let handle = session.renderer().handle_for(id("fixed_r")).unwrap();
    let len = session.editor().history().len();
    session.renderer_mut().take_ops();

    let outcomes = session.handle_surface_events(&[SurfaceEvent::new(
        handle,
        SurfaceEventKind::Scaled {
            x: 0.0,
            y: 0.0,
            width: 300.0,
            height: 50.0,
        },
        GesturePhase::End,
    )]);
    assert_eq!(
        outcomes,
        vec![EventOutcome::Rejected(EditorError::Permission {
            node: id("fixed_r"),
            operation: Permission::Resize,
        })]
    );
    assert_eq!(session.editor().history().len(), len);
    assert_eq!(
        session.renderer().ops(),
        &[SurfaceOp::Update(
            id("fixed_r"),
            DisplayDelta {
                geometry: GeometryPatch {
                    width: Some(50.0),
                    ..Default::default()
                },
                body: None,
            }
        )]
    );
}

#[test]
fn moving_a_group_on_the_surface_moves_its_children() {
    let mut session = session_with([
        rect("gm_a", 0.0, 0.0, 10.0, 10.0),
        rect("gm_b", 20.0, 0.0, 10.0, 10.0),
    ]);
    let group = session
        .apply(|e| e.create_group(&[id("gm_a"), id("gm_b")]))
        .unwrap();
    let handle = session.renderer().handle_for(group).unwrap();
    session.renderer_mut().take_ops();

    session.handle_surface_events(&[SurfaceEvent::new(
        handle,
        SurfaceEventKind::Moved { x: 100.0, y: 0.0 },
        GesturePhase::End,
    )]);

    assert_eq!(x_of(session.editor(), "gm_a"), 100.0);
    assert_eq!(x_of(session.editor(), "gm_b"), 120.0);
    let updated: Vec<_> = session
        .renderer()
        .ops()
        .iter()
        .filter_map(|op| match op {
            SurfaceOp::Update(node, _) => Some(*node),
            _ => None,
        })
        .collect();
    assert_eq!(updated, vec![id("gm_a"), id("gm_b")]);
}

// ─── Modes and lifecycle ────────────────────────────────────────────────

#[test]
fn preview_locks_objects_without_touching_the_document() {
    let mut session = session_with([rect("pv_r", 0.0, 0.0, 10.0, 10.0)]);
    let handle = session.renderer().handle_for(id("pv_r")).unwrap();
    let before = session.editor().document().clone();

    session.set_mode(EditorMode::Preview);
    assert_eq!(
        session.renderer().object(handle).unwrap().interactivity,
        Interactivity::NONE
    );
    assert_eq!(session.editor().document(), &before);
    assert_eq!(session.renderer().len(), 1);

    session.set_mode(EditorMode::Edit);
    assert!(session.renderer().object(handle).unwrap().interactivity.movable);
}

#[test]
fn surface_drag_in_preview_snaps_back() {
    let mut session = session_with([rect("pvd_r", 0.0, 0.0, 10.0, 10.0)]);
    let handle = session.renderer().handle_for(id("pvd_r")).unwrap();
    let len = session.editor().history().len();
    session.set_mode(EditorMode::Preview);
    session.renderer_mut().take_ops();

    let outcomes = session.handle_surface_events(&[SurfaceEvent::new(
        handle,
        SurfaceEventKind::Moved { x: 99.0, y: 0.0 },
        GesturePhase::End,
    )]);
    assert_eq!(outcomes, vec![EventOutcome::Ignored]);
    assert_eq!(x_of(session.editor(), "pvd_r"), 0.0);
    assert_eq!(session.editor().history().len(), len);
    assert!(!session.editor().in_gesture());
    assert_eq!(
        session.renderer().ops(),
        &[SurfaceOp::Update(
            id("pvd_r"),
            DisplayDelta {
                geometry: GeometryPatch {
                    x: Some(0.0),
                    ..Default::default()
                },
                body: None,
            }
        )]
    );
}

#[test]
fn reinitialize_disposes_the_previous_surface() {
    let mut session = session_with([
        rect("re_a", 0.0, 0.0, 10.0, 10.0),
        rect("re_b", 20.0, 0.0, 10.0, 10.0),
    ]);
    let old = session.reinitialize(HeadlessSurface::new);
    assert!(old.is_disposed());
    assert!(old.is_empty());
    assert_eq!(session.renderer().len(), 2);
    assert!(!session.renderer().is_disposed());

    let (_, surface) = session.close();
    assert!(surface.is_disposed());
}

#[test]
fn rebuild_recreates_every_object() {
    let mut session = session_with([rect("rb_a", 0.0, 0.0, 10.0, 10.0)]);
    let report = session.rebuild().clone();
    assert_eq!(report.created, 1);
    assert_eq!(session.renderer().len(), 1);
}
