//! Integration tests: command inverses, coalescing, and batches.

use lk_core::{DesignDocument, Layer, LayerId, LayerPatch, ReorderDirection, ShapeType, Transform, Vec2};
use lk_editor::{Command, CommandCategory, CommandKind, CommandStack};
use pretty_assertions::assert_eq;

// ─── Helpers ─────────────────────────────────────────────────────────────

struct Sample {
    doc: DesignDocument,
    title: LayerId,
    card: LayerId,
    group: LayerId,
    badge: LayerId,
}

fn sample() -> Sample {
    let _ = env_logger::builder().is_test(true).try_init();

    let title = Layer::text("Spring Sale").named("Title").at(40.0, 40.0);
    let card = Layer::shape(ShapeType::Rectangle).named("Card").at(100.0, 200.0);
    let group = Layer::group().named("Group").at(400.0, 100.0).sized(200.0, 200.0);
    let badge = Layer::shape(ShapeType::Ellipse).named("Badge").at(420.0, 120.0).sized(40.0, 40.0);
    let ids = (title.id, card.id, group.id, badge.id);

    let doc = DesignDocument::new(800.0, 600.0)
        .add_layer(title, None)
        .unwrap()
        .add_layer(card, None)
        .unwrap()
        .add_layer(group, None)
        .unwrap()
        .add_layer(badge, Some(ids.2))
        .unwrap()
        .select([ids.1], None);

    Sample {
        doc,
        title: ids.0,
        card: ids.1,
        group: ids.2,
        badge: ids.3,
    }
}

fn opacity(value: f64) -> LayerPatch {
    LayerPatch {
        opacity: Some(value),
        ..Default::default()
    }
}

// ─── Inverse law ─────────────────────────────────────────────────────────

#[test]
fn undo_restores_document_for_every_command_kind() {
    let s = sample();
    let doc = &s.doc;
    let renamed = {
        let mut layer = doc.get(s.card).unwrap().clone();
        layer.name = "Hero Card".into();
        layer
    };

    let commands = vec![
        Command::add_layer(doc, Layer::shape(ShapeType::Rectangle), None),
        Command::add_layer(doc, Layer::text("inner"), Some(s.group)),
        Command::remove_layers(doc, &[s.card, s.group]),
        Command::update(doc, s.title, opacity(0.5), "Opacity"),
        Command::replace_layer(doc, renamed, "Rename"),
        Command::reorder(doc, s.group, ReorderDirection::Top),
        Command::reorder(doc, s.title, ReorderDirection::Down),
        Command::reparent(doc, s.card, s.group, None),
        Command::reparent(doc, s.badge, doc.root_id(), Some(0)),
        Command::duplicate(doc, &[s.title, s.badge]),
        Command::move_layers(doc, &[s.group, s.badge], Vec2::new(10.0, 5.0)),
        Command::resize(doc, s.card, Transform::new(100.0, 200.0, 150.0, 80.0)),
        Command::rotate(doc, s.card, 30.0),
    ];

    for command in commands {
        let after = command.execute(doc);
        assert_ne!(&after, doc, "`{}` should change the document", command.label);
        assert_eq!(&command.undo(&after), doc, "`{}` undo", command.label);
        after.check_invariants().unwrap();
    }
}

#[test]
fn move_shifts_subtree_once() {
    let s = sample();
    // Group and its child both listed: the badge still moves only once.
    let cmd = Command::move_layers(&s.doc, &[s.group, s.badge], Vec2::new(10.0, 5.0));
    let after = cmd.execute(&s.doc);
    assert_eq!(after.get(s.group).unwrap().transform.position, Vec2::new(410.0, 105.0));
    assert_eq!(after.get(s.badge).unwrap().transform.position, Vec2::new(430.0, 125.0));
}

#[test]
fn duplicate_selects_copies_in_front() {
    let s = sample();
    let after = Command::duplicate(&s.doc, &[s.card]).execute(&s.doc);
    let copy = after.selection().primary_id.unwrap();
    assert_ne!(copy, s.card);

    let layer = after.get(copy).unwrap();
    assert_eq!(layer.name, "Card copy");
    assert_eq!(layer.transform.position, Vec2::new(120.0, 220.0));
    assert_eq!(
        after.index_in_parent(copy).unwrap() + 1,
        after.index_in_parent(s.card).unwrap()
    );
}

// ─── Stack ───────────────────────────────────────────────────────────────

#[test]
fn coalesced_drag_is_one_entry() {
    let s = sample();
    let mut stack = CommandStack::new(s.doc.clone(), 100);
    for _ in 0..10 {
        let cmd = Command::move_layers(stack.document(), &[s.card], Vec2::new(1.0, 2.0));
        assert!(stack.execute(cmd.with_coalesce_key("drag-1")));
    }

    assert_eq!(stack.undo_depth(), 1);
    assert_eq!(stack.undo_entries()[0].snapshot_before, s.doc);
    assert_eq!(
        stack.document().get(s.card).unwrap().transform.position,
        Vec2::new(110.0, 220.0)
    );

    stack.undo();
    assert_eq!(stack.document(), &s.doc);
    stack.redo();
    assert_eq!(
        stack.document().get(s.card).unwrap().transform.position,
        Vec2::new(110.0, 220.0)
    );
}

#[test]
fn new_key_starts_new_entry() {
    let s = sample();
    let mut stack = CommandStack::new(s.doc.clone(), 100);
    for key in ["drag-1", "drag-1", "drag-2", "drag-2", "drag-2"] {
        let cmd = Command::move_layers(stack.document(), &[s.card], Vec2::new(1.0, 0.0));
        stack.execute(cmd.with_coalesce_key(key));
    }
    assert_eq!(stack.undo_depth(), 2);
    assert_eq!(
        stack.undo_entries()[1]
            .snapshot_before
            .get(s.card)
            .unwrap()
            .transform
            .position
            .x,
        102.0
    );
}

#[test]
fn no_coalescing_after_undo() {
    let s = sample();
    let mut stack = CommandStack::new(s.doc.clone(), 100);
    let cmd = Command::move_layers(stack.document(), &[s.card], Vec2::new(1.0, 0.0));
    stack.execute(cmd.with_coalesce_key("drag"));
    let cmd = Command::move_layers(stack.document(), &[s.card], Vec2::new(1.0, 0.0));
    stack.execute(cmd.with_coalesce_key("drag"));
    stack.undo();

    // The redo stack is live: same key still records a fresh entry.
    let cmd = Command::move_layers(stack.document(), &[s.title], Vec2::new(0.0, 1.0));
    stack.execute(cmd.with_coalesce_key("drag"));
    assert_eq!(stack.undo_depth(), 1);
    assert!(!stack.can_redo());
    assert_eq!(stack.undo_entries()[0].snapshot_before, s.doc);
}

#[test]
fn failed_command_leaves_document_and_history() {
    let s = sample();
    let mut stack = CommandStack::new(s.doc.clone(), 100);
    stack.execute(Command::update(&s.doc, s.title, opacity(0.5), "Opacity"));
    stack.execute(Command::update(stack.document(), s.title, opacity(0.4), "Opacity"));
    stack.undo();
    let before = stack.document().clone();

    // Built against a document that has a layer the stack's does not.
    let stray = Layer::shape(ShapeType::Rectangle).named("Stray");
    let stray_id = stray.id;
    let elsewhere = s.doc.add_layer(stray, None).unwrap();
    let update = Command::update(&elsewhere, stray_id, opacity(0.1), "Opacity");

    assert!(!stack.execute(update));
    assert_eq!(stack.document(), &before);
    assert_eq!(stack.undo_depth(), 1);
    assert_eq!(stack.redo_depth(), 1);
}

#[test]
fn batch_is_one_step_and_undoes_in_reverse() {
    let s = sample();
    let rect = Layer::shape(ShapeType::Rectangle).named("New");
    let rect_id = rect.id;

    let add = Command::add_layer(&s.doc, rect, None);
    let doc1 = add.execute(&s.doc);
    let reparent = Command::reparent(&doc1, rect_id, s.group, Some(0));
    let doc2 = reparent.execute(&doc1);
    let fade = Command::update(&doc2, rect_id, opacity(0.25), "Opacity");

    let batch = Command::batch("AI revision", vec![add, reparent, fade]).with_category(CommandCategory::Ai);
    if let CommandKind::Batch(children) = &batch.kind {
        assert!(children.iter().all(|c| c.category == CommandCategory::Ai));
    }

    let mut stack = CommandStack::new(s.doc.clone(), 100);
    assert!(stack.execute(batch));
    assert_eq!(stack.undo_depth(), 1);
    assert_eq!(stack.document().parent_of(rect_id), Some(s.group));
    assert_eq!(stack.document().get(rect_id).unwrap().opacity, 0.25);

    assert_eq!(stack.undo(), Some("AI revision".to_string()));
    assert_eq!(stack.document(), &s.doc);

    // The inverse chain on its own gets back to the same place.
    let entry_cmd = {
        stack.redo();
        stack.undo_entries()[0].command.clone()
    };
    assert_eq!(entry_cmd.undo(stack.document()), s.doc);
}

#[test]
fn history_labels() {
    let s = sample();
    let mut stack = CommandStack::new(s.doc.clone(), 100);
    stack.execute(Command::reorder(&s.doc, s.card, ReorderDirection::Bottom));
    assert_eq!(stack.undo_label(), Some("Send to Back"));
    stack.undo();
    assert_eq!(stack.redo_label(), Some("Send to Back"));
    assert_eq!(stack.undo_label(), None);
}
