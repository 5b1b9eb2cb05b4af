//! Editor session: the single owned object a host talks to.
//!
//! Owns the command stack (current document + history), the select tool,
//! the spatial index, and the editor config. Pointer events go through the
//! tool; key events through the shortcut map. After every document change
//! the index refreshes only the layers whose box changed.

use crate::commands::{Command, CommandStack};
use crate::config::EditorConfig;
use crate::input::InputEvent;
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use crate::tools::{CursorHint, SelectTool, ToolAction, ToolContext, is_selectable};
use lk_core::{Aabb, DesignDocument, Layer, LayerId, ReorderDirection, Vec2};
use lk_spatial::{Guide, SpatialIndex};

#[derive(Debug, Clone)]
pub struct EditorSession {
    stack: CommandStack,
    tool: SelectTool,
    index: SpatialIndex,
    config: EditorConfig,
    guides: Vec<Guide>,
    marquee: Option<Aabb>,
}

impl EditorSession {
    pub fn new(document: DesignDocument) -> Self {
        Self::with_config(document, EditorConfig::default())
    }

    pub fn with_config(document: DesignDocument, config: EditorConfig) -> Self {
        let index = SpatialIndex::from_document(&document);
        Self {
            stack: CommandStack::new(document, config.history_depth),
            tool: SelectTool::new(),
            index,
            config,
            guides: Vec::new(),
            marquee: None,
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn document(&self) -> &DesignDocument {
        self.stack.document()
    }

    pub fn history(&self) -> &CommandStack {
        &self.stack
    }

    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn cursor(&self) -> CursorHint {
        self.tool.cursor()
    }

    /// Snap guides of the drag in progress.
    pub fn guides(&self) -> &[Guide] {
        &self.guides
    }

    pub fn marquee(&self) -> Option<Aabb> {
        self.marquee
    }

    pub fn selected_ids(&self) -> Vec<LayerId> {
        self.document().selection().ids.to_vec()
    }

    // ─── Events ──────────────────────────────────────────────────────────

    /// Dispatch one input event. Returns `true` if the document changed
    /// (selection changes included).
    pub fn handle_event(&mut self, event: &InputEvent) -> bool {
        if let InputEvent::Key { key, modifiers } = event {
            return match ShortcutMap::resolve(key, *modifiers) {
                Some(action) => self.dispatch_action(action),
                None => false,
            };
        }

        let actions = {
            let ctx = ToolContext {
                doc: self.stack.document(),
                index: &self.index,
                config: &self.config,
            };
            self.tool.handle(event, &ctx)
        };
        let mut changed = false;
        for action in actions {
            changed |= self.apply_tool_action(action);
        }
        changed
    }

    fn apply_tool_action(&mut self, action: ToolAction) -> bool {
        match action {
            ToolAction::Select { ids, primary } => self.select(ids, primary),
            ToolAction::Execute(command) => self.execute(command),
            ToolAction::Marquee(rect) => {
                self.marquee = rect;
                false
            }
            ToolAction::Guides(guides) => {
                self.guides = guides;
                false
            }
            ToolAction::Cursor(_) => false,
        }
    }

    /// Dispatch a shortcut action. Returns whether the document changed.
    pub fn dispatch_action(&mut self, action: ShortcutAction) -> bool {
        match action {
            ShortcutAction::Undo => self.undo(),
            ShortcutAction::Redo => self.redo(),
            ShortcutAction::Delete => self.delete_selected(),
            ShortcutAction::Duplicate => self.duplicate_selected(),
            ShortcutAction::SelectAll => self.select_all(),
            ShortcutAction::Deselect => {
                self.tool.cancel();
                self.marquee = None;
                self.guides.clear();
                self.select(vec![], None)
            }
            ShortcutAction::BringForward => self.reorder_selected(ReorderDirection::Up),
            ShortcutAction::SendBackward => self.reorder_selected(ReorderDirection::Down),
            ShortcutAction::BringToFront => self.reorder_selected(ReorderDirection::Top),
            ShortcutAction::SendToBack => self.reorder_selected(ReorderDirection::Bottom),
            ShortcutAction::Nudge { dx, dy, large } => {
                let step = if large { self.config.nudge_large } else { self.config.nudge };
                self.nudge_selected(Vec2::new(f64::from(dx) * step, f64::from(dy) * step))
            }
        }
    }

    // ─── Edits ───────────────────────────────────────────────────────────

    /// Record and apply `command`. Returns `false` for no-ops.
    pub fn execute(&mut self, command: Command) -> bool {
        let before = self.stack.document().clone();
        let changed = self.stack.execute(command);
        if changed {
            self.sync_index(&before);
        }
        changed
    }

    pub fn undo(&mut self) -> bool {
        self.tool.cancel();
        let before = self.stack.document().clone();
        let result = self.stack.undo();
        if result.is_some() {
            self.sync_index(&before);
        }
        result.is_some()
    }

    pub fn redo(&mut self) -> bool {
        self.tool.cancel();
        let before = self.stack.document().clone();
        let result = self.stack.redo();
        if result.is_some() {
            self.sync_index(&before);
        }
        result.is_some()
    }

    /// Re-index layers that were added, removed, or whose transform changed
    /// since `before`.
    fn sync_index(&mut self, before: &DesignDocument) {
        let doc = self.stack.document();
        let mut touched = 0;
        for layer in doc.layers() {
            if before.get(layer.id).is_none_or(|old| old.transform != layer.transform) {
                self.index.refresh(doc, layer.id);
                touched += 1;
            }
        }
        for layer in before.layers() {
            if !doc.contains(layer.id) {
                self.index.remove(layer.id);
                touched += 1;
            }
        }
        log::trace!("spatial index: {touched} layers refreshed");
    }

    /// Replace the selection. Not recorded in history.
    pub fn select(&mut self, ids: Vec<LayerId>, primary: Option<LayerId>) -> bool {
        let before = self.document().selection().clone();
        self.stack.set_selection(ids, primary);
        *self.document().selection() != before
    }

    pub fn add_layer(&mut self, layer: Layer, parent: Option<LayerId>) -> bool {
        let command = Command::add_layer(self.document(), layer, parent);
        self.execute(command)
    }

    pub fn delete_selected(&mut self) -> bool {
        let ids = self.selected_ids();
        if ids.is_empty() {
            return false;
        }
        let command = Command::remove_layers(self.document(), &ids);
        self.execute(command)
    }

    pub fn duplicate_selected(&mut self) -> bool {
        let ids = self.selected_ids();
        if ids.is_empty() {
            return false;
        }
        let command = Command::duplicate(self.document(), &ids);
        self.execute(command)
    }

    /// Select every selectable top-level layer.
    pub fn select_all(&mut self) -> bool {
        let doc = self.document();
        let ids: Vec<LayerId> = doc
            .children_of(doc.root_id())
            .iter()
            .copied()
            .filter(|id| is_selectable(doc, *id))
            .collect();
        let primary = ids.first().copied();
        self.select(ids, primary)
    }

    pub fn nudge_selected(&mut self, delta: Vec2) -> bool {
        let ids = self.selected_ids();
        let mut command = Command::move_layers(self.document(), &ids, delta);
        command.label = "Nudge".into();
        self.execute(command)
    }

    /// Z-order move of every selected layer as one undo step. Layers are
    /// visited so that their relative stacking is preserved.
    pub fn reorder_selected(&mut self, direction: ReorderDirection) -> bool {
        let doc = self.document();
        let mut ids = self.selected_ids();
        ids.sort_by_key(|id| doc.index_in_parent(*id));
        if matches!(direction, ReorderDirection::Down | ReorderDirection::Top) {
            ids.reverse();
        }

        let mut current = doc.clone();
        let mut steps = Vec::new();
        for id in ids {
            let step = Command::reorder(&current, id, direction);
            if step.is_noop() {
                continue;
            }
            current = step.execute(&current);
            steps.push(step);
        }
        // Steps that cancel out (a block already at the front) record nothing.
        if current == *doc {
            return false;
        }
        let label = match steps.first() {
            Some(first) => first.label.clone(),
            None => return false,
        };
        self.execute(Command::batch(label, steps))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lk_core::ShapeType;
    use pretty_assertions::assert_eq;

    fn rect_at(x: f64, y: f64) -> Layer {
        Layer::shape(ShapeType::Rectangle).at(x, y).sized(50.0, 50.0)
    }

    #[test]
    fn add_then_undo_updates_index() {
        let mut session = EditorSession::new(DesignDocument::new(400.0, 400.0));
        let layer = rect_at(10.0, 10.0);
        let id = layer.id;
        assert!(session.add_layer(layer, None));
        assert_eq!(session.index().query_point(Vec2::new(20.0, 20.0)), vec![id]);

        assert!(session.undo());
        assert!(session.index().query_point(Vec2::new(20.0, 20.0)).is_empty());
        assert!(session.redo());
        assert_eq!(session.index().query_point(Vec2::new(20.0, 20.0)), vec![id]);
    }

    #[test]
    fn index_follows_moves_and_deletes() {
        let (a, b) = (rect_at(0.0, 0.0), rect_at(200.0, 200.0));
        let (ia, ib) = (a.id, b.id);
        let doc = DesignDocument::new(400.0, 400.0).add_layer(a, None).unwrap().add_layer(b, None).unwrap();
        let mut session = EditorSession::new(doc);

        for _ in 0..3 {
            let step = Command::move_layers(session.document(), &[ia], Vec2::new(10.0, 0.0));
            assert!(session.execute(step.with_coalesce_key("drag")));
        }
        assert_eq!(session.index().bounds_of(ia), Some(Aabb::new(30.0, 0.0, 80.0, 50.0)));
        assert!(session.index().query_point(Vec2::new(5.0, 5.0)).is_empty());

        assert!(session.execute(Command::remove_layers(session.document(), &[ib])));
        assert_eq!(session.index().len(), 1);
        assert!(session.undo());
        assert_eq!(session.index().query_point(Vec2::new(210.0, 210.0)), vec![ib]);
    }

    #[test]
    fn reorder_keeps_relative_stacking() {
        let (a, b, c) = (rect_at(0.0, 0.0), rect_at(0.0, 0.0), rect_at(0.0, 0.0));
        let (ia, ib, ic) = (a.id, b.id, c.id);
        let doc = DesignDocument::new(400.0, 400.0);
        // add appends, so c ends up backmost: [a, b, c]
        let doc = doc.add_layer(a, None).unwrap();
        let doc = doc.add_layer(b, None).unwrap();
        let doc = doc.add_layer(c, None).unwrap();
        let mut session = EditorSession::new(doc.select([ib, ic], None));

        assert!(session.reorder_selected(ReorderDirection::Top));
        let root = session.document().root_id();
        assert_eq!(session.document().children_of(root), &[ib, ic, ia]);
        assert_eq!(session.history().undo_depth(), 1);

        // Already in front: nothing recorded
        assert!(!session.reorder_selected(ReorderDirection::Top));
        assert_eq!(session.history().undo_depth(), 1);
    }

    #[test]
    fn deselect_clears_selection() {
        let layer = rect_at(0.0, 0.0);
        let id = layer.id;
        let doc = DesignDocument::new(400.0, 400.0).add_layer(layer, None).unwrap();
        let mut session = EditorSession::new(doc.select([id], None));
        assert!(session.dispatch_action(ShortcutAction::Deselect));
        assert!(session.selected_ids().is_empty());
        assert!(!session.history().can_undo());
    }
}
