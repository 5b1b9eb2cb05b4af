//! Integration tests: select tool gestures and keyboard shortcuts through
//! an `EditorSession`.

use lk_core::{DesignDocument, Layer, LayerId, ShapeType, Vec2};
use lk_editor::{CursorHint, EditorSession, InputEvent, Modifiers};
use pretty_assertions::assert_eq;

// ─── Helpers ─────────────────────────────────────────────────────────────

/// Two 100×100 rectangles: A at (100, 100), B at (600, 450).
fn session() -> (EditorSession, LayerId, LayerId) {
    let _ = env_logger::builder().is_test(true).try_init();
    let a = Layer::shape(ShapeType::Rectangle).named("A").at(100.0, 100.0);
    let b = Layer::shape(ShapeType::Rectangle).named("B").at(600.0, 450.0);
    let (ia, ib) = (a.id, b.id);
    let doc = DesignDocument::new(800.0, 600.0)
        .add_layer(a, None)
        .unwrap()
        .add_layer(b, None)
        .unwrap();
    (EditorSession::new(doc), ia, ib)
}

fn position(session: &EditorSession, id: LayerId) -> Vec2 {
    session.document().get(id).unwrap().transform.position
}

fn shift() -> Modifiers {
    Modifiers::shift()
}

fn cmd() -> Modifiers {
    Modifiers {
        meta: true,
        ..Modifiers::NONE
    }
}

// ─── Selection ───────────────────────────────────────────────────────────

#[test]
fn click_selects_layer() {
    let (mut s, a, _) = session();
    assert!(s.handle_event(&InputEvent::pointer_down(150.0, 150.0)));
    s.handle_event(&InputEvent::pointer_up(150.0, 150.0));
    assert_eq!(s.selected_ids(), vec![a]);
    assert_eq!(s.document().selection().primary_id, Some(a));
    assert!(!s.history().can_undo());
}

#[test]
fn shift_click_toggles() {
    let (mut s, a, b) = session();
    s.handle_event(&InputEvent::pointer_down(150.0, 150.0));
    s.handle_event(&InputEvent::pointer_up(150.0, 150.0));
    s.handle_event(&InputEvent::pointer_down(650.0, 500.0).with_modifiers(shift()));
    s.handle_event(&InputEvent::pointer_up(650.0, 500.0).with_modifiers(shift()));
    assert_eq!(s.selected_ids(), vec![a, b]);

    s.handle_event(&InputEvent::pointer_down(150.0, 150.0).with_modifiers(shift()));
    s.handle_event(&InputEvent::pointer_up(150.0, 150.0).with_modifiers(shift()));
    assert_eq!(s.selected_ids(), vec![b]);
}

#[test]
fn marquee_selects_overlapping_layers() {
    let (mut s, a, _) = session();
    s.handle_event(&InputEvent::pointer_down(50.0, 50.0));
    s.handle_event(&InputEvent::pointer_move(160.0, 160.0));
    assert!(s.marquee().is_some());
    s.handle_event(&InputEvent::pointer_up(160.0, 160.0));

    assert_eq!(s.marquee(), None);
    assert_eq!(s.selected_ids(), vec![a]);
}

#[test]
fn marquee_on_empty_area_clears_selection() {
    let (mut s, a, _) = session();
    s.select(vec![a], None);
    s.handle_event(&InputEvent::pointer_down(20.0, 20.0));
    s.handle_event(&InputEvent::pointer_up(30.0, 30.0));
    assert!(s.selected_ids().is_empty());
}

// ─── Drags ───────────────────────────────────────────────────────────────

#[test]
fn movement_below_threshold_does_nothing() {
    let (mut s, a, _) = session();
    s.handle_event(&InputEvent::pointer_down(150.0, 150.0));
    assert!(!s.handle_event(&InputEvent::pointer_move(151.0, 151.0)));
    s.handle_event(&InputEvent::pointer_up(151.0, 151.0));
    assert_eq!(position(&s, a), Vec2::new(100.0, 100.0));
    assert!(!s.history().can_undo());
}

#[test]
fn drag_is_one_undo_step() {
    let (mut s, a, _) = session();
    s.handle_event(&InputEvent::pointer_down(150.0, 150.0));
    s.handle_event(&InputEvent::pointer_move(170.0, 160.0));
    assert_eq!(position(&s, a), Vec2::new(120.0, 110.0));
    assert_eq!(s.cursor(), CursorHint::Move);
    s.handle_event(&InputEvent::pointer_move(190.0, 170.0));
    s.handle_event(&InputEvent::pointer_up(190.0, 170.0));

    assert_eq!(position(&s, a), Vec2::new(140.0, 120.0));
    assert_eq!(s.history().undo_depth(), 1);
    assert_eq!(s.history().undo_label(), Some("Move"));

    assert!(s.undo());
    assert_eq!(position(&s, a), Vec2::new(100.0, 100.0));
}

#[test]
fn successive_drags_are_separate_steps() {
    let (mut s, a, _) = session();
    for _ in 0..2 {
        let p = position(&s, a);
        s.handle_event(&InputEvent::pointer_down(p.x + 50.0, p.y + 50.0));
        s.handle_event(&InputEvent::pointer_move(p.x + 70.0, p.y + 50.0));
        s.handle_event(&InputEvent::pointer_up(p.x + 70.0, p.y + 50.0));
    }
    assert_eq!(position(&s, a), Vec2::new(140.0, 100.0));
    assert_eq!(s.history().undo_depth(), 2);
}

#[test]
fn drag_snaps_center_to_canvas_center() {
    let (mut s, a, _) = session();
    s.handle_event(&InputEvent::pointer_down(150.0, 150.0));
    // Proposed x = 348, center 398: two units from the canvas midline.
    s.handle_event(&InputEvent::pointer_move(398.0, 150.0));
    assert_eq!(position(&s, a), Vec2::new(350.0, 100.0));
    assert!(!s.guides().is_empty());

    s.handle_event(&InputEvent::pointer_up(398.0, 150.0));
    assert!(s.guides().is_empty());
}

#[test]
fn shift_drag_constrains_to_axis() {
    let (mut s, a, _) = session();
    s.handle_event(&InputEvent::pointer_down(150.0, 150.0));
    s.handle_event(&InputEvent::pointer_move(180.0, 162.0).with_modifiers(shift()));
    assert_eq!(position(&s, a), Vec2::new(130.0, 100.0));
}

#[test]
fn resize_from_corner_handle() {
    let (mut s, a, _) = session();
    s.select(vec![a], None);
    s.handle_event(&InputEvent::pointer_down(200.0, 200.0));
    s.handle_event(&InputEvent::pointer_move(230.0, 220.0));
    s.handle_event(&InputEvent::pointer_move(231.0, 221.0));
    s.handle_event(&InputEvent::pointer_up(231.0, 221.0));

    let t = s.document().get(a).unwrap().transform;
    assert_eq!(t.position, Vec2::new(100.0, 100.0));
    assert_eq!(t.size, Vec2::new(131.0, 121.0));
    assert_eq!(s.history().undo_depth(), 1);
    assert_eq!(s.history().undo_label(), Some("Resize"));
}

#[test]
fn resize_from_west_edge_keeps_right_edge() {
    let (mut s, a, _) = session();
    s.select(vec![a], None);
    s.handle_event(&InputEvent::pointer_down(100.0, 150.0));
    s.handle_event(&InputEvent::pointer_move(130.0, 150.0));
    s.handle_event(&InputEvent::pointer_up(130.0, 150.0));

    let t = s.document().get(a).unwrap().transform;
    assert_eq!(t.position, Vec2::new(130.0, 100.0));
    assert_eq!(t.size, Vec2::new(70.0, 100.0));
}

#[test]
fn rotation_snaps_to_increments() {
    let (mut s, a, _) = session();
    s.select(vec![a], None);
    // Rotation handle sits 24 units above the top edge; pivot is (150, 150).
    s.handle_event(&InputEvent::pointer_down(150.0, 76.0));
    assert!(s.history().undo_depth() == 0);

    let at = |deg: f64| {
        let r = 74.0;
        let rad = deg.to_radians();
        InputEvent::pointer_move(150.0 + r * rad.cos(), 150.0 + r * rad.sin())
    };

    // 44° of travel lands within tolerance of 45°.
    s.handle_event(&at(-46.0));
    assert_eq!(s.document().get(a).unwrap().transform.rotation, 45.0);

    // 40° is five away from the nearest increment: left as-is.
    s.handle_event(&at(-50.0));
    let rotation = s.document().get(a).unwrap().transform.rotation;
    assert!((rotation - 40.0).abs() < 1e-9, "rotation = {rotation}");

    s.handle_event(&InputEvent::pointer_up(150.0, 76.0));
    assert_eq!(s.history().undo_depth(), 1);
    s.undo();
    assert_eq!(s.document().get(a).unwrap().transform.rotation, 0.0);
}

// ─── Keyboard ────────────────────────────────────────────────────────────

#[test]
fn arrows_nudge_selection() {
    let (mut s, a, _) = session();
    s.select(vec![a], None);
    assert!(s.handle_event(&InputEvent::key("ArrowRight", Modifiers::NONE)));
    assert!(s.handle_event(&InputEvent::key("ArrowDown", shift())));
    assert_eq!(position(&s, a), Vec2::new(101.0, 110.0));
    assert_eq!(s.history().undo_depth(), 2);
    assert_eq!(s.history().undo_label(), Some("Nudge"));
}

#[test]
fn nudge_without_selection_is_ignored() {
    let (mut s, _, _) = session();
    assert!(!s.handle_event(&InputEvent::key("ArrowLeft", Modifiers::NONE)));
    assert!(!s.history().can_undo());
}

#[test]
fn delete_and_undo_restore_selection() {
    let (mut s, a, b) = session();
    s.select(vec![a], None);
    let before = s.document().clone();
    assert!(s.handle_event(&InputEvent::key("Delete", Modifiers::NONE)));
    assert!(s.document().get(a).is_none());
    assert!(s.selected_ids().is_empty());

    assert!(s.handle_event(&InputEvent::key("z", cmd())));
    assert_eq!(s.document(), &before);
    assert!(s.handle_event(&InputEvent::key("z", Modifiers { shift: true, ..cmd() })));
    assert!(s.document().get(a).is_none());
    assert!(s.document().get(b).is_some());
}

#[test]
fn select_all_and_duplicate() {
    let (mut s, a, b) = session();
    assert!(s.handle_event(&InputEvent::key("a", cmd())));
    assert_eq!(s.selected_ids(), vec![a, b]);

    assert!(s.handle_event(&InputEvent::key("d", cmd())));
    assert_eq!(s.document().layer_count(), 5);
    let copies = s.selected_ids();
    assert_eq!(copies.len(), 2);
    assert!(!copies.contains(&a) && !copies.contains(&b));
    assert_eq!(s.index().len(), 4);
}

#[test]
fn z_order_shortcuts() {
    let (mut s, a, b) = session();
    s.select(vec![b], None);
    let root = s.document().root_id();
    assert!(s.handle_event(&InputEvent::key("]", cmd())));
    assert_eq!(s.document().children_of(root), &[b, a]);
    assert!(!s.handle_event(&InputEvent::key("}", Modifiers { shift: true, ..cmd() })));
    assert!(s.handle_event(&InputEvent::key("[", Modifiers { shift: true, ..cmd() })));
    assert_eq!(s.document().children_of(root), &[a, b]);
}
