//! Undo/Redo command stack.
//!
//! Every document change is wrapped in a reversible [`Command`]. A command
//! holds a forward [`Mutation`] and its inverse, computed against the
//! document at construction time, so `undo(execute(d)) == d` structurally.
//!
//! The stack stores the document snapshot taken before each command: undo
//! restores the snapshot, redo re-executes the command. Commands that share
//! a `coalesce_key` (a drag, a slider scrub) collapse into one undo entry
//! that keeps the pre-gesture snapshot.

use lk_core::{
    DesignDocument, DocumentError, Layer, LayerId, LayerPatch, ReorderDirection, Transform, Vec2,
};
use std::collections::HashSet;

// ─── Mutations ───────────────────────────────────────────────────────────

/// A primitive, replayable document edit.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Attach a pre-built subtree (root first) under `parent`.
    InsertSubtree {
        layers: Vec<Layer>,
        parent: LayerId,
        index: Option<usize>,
    },
    RemoveLayer {
        id: LayerId,
    },
    UpdateLayer {
        id: LayerId,
        patch: LayerPatch,
    },
    ReplaceLayer {
        layer: Box<Layer>,
    },
    MoveToIndex {
        id: LayerId,
        index: usize,
    },
    Reparent {
        id: LayerId,
        parent: LayerId,
        index: Option<usize>,
    },
    SetSelection {
        ids: Vec<LayerId>,
        primary: Option<LayerId>,
    },
    /// Applied in order. Empty is the no-op.
    Sequence(Vec<Mutation>),
}

impl Mutation {
    pub fn noop() -> Self {
        Mutation::Sequence(Vec::new())
    }

    pub fn is_noop(&self) -> bool {
        matches!(self, Mutation::Sequence(ms) if ms.iter().all(Mutation::is_noop))
    }

    pub fn apply(&self, doc: &DesignDocument) -> Result<DesignDocument, DocumentError> {
        match self {
            Mutation::InsertSubtree {
                layers,
                parent,
                index,
            } => doc.insert_subtree(layers, *parent, *index),
            Mutation::RemoveLayer { id } => Ok(doc.remove_layer(*id)),
            Mutation::UpdateLayer { id, patch } => doc.update_layer(*id, patch),
            Mutation::ReplaceLayer { layer } => doc.replace_layer((**layer).clone()),
            Mutation::MoveToIndex { id, index } => doc.move_to_index(*id, *index),
            Mutation::Reparent { id, parent, index } => doc.reparent_layer(*id, *parent, *index),
            Mutation::SetSelection { ids, primary } => Ok(doc.select(ids.iter().copied(), *primary)),
            Mutation::Sequence(steps) => {
                let mut current = doc.clone();
                for step in steps {
                    current = step.apply(&current)?;
                }
                Ok(current)
            }
        }
    }
}

/// Compute the mutation that undoes `mutation` when applied to the result
/// of applying it to `doc`.
pub fn compute_inverse(doc: &DesignDocument, mutation: &Mutation) -> Mutation {
    match mutation {
        Mutation::InsertSubtree { layers, .. } => match layers.first() {
            Some(head) => Mutation::RemoveLayer { id: head.id },
            None => Mutation::noop(),
        },
        Mutation::RemoveLayer { id } => {
            // Capture the subtree, its slot, and the selection before removal.
            let slot = doc.parent_of(*id).zip(doc.index_in_parent(*id));
            match slot {
                Some((parent, index)) if *id != doc.root_id() => Mutation::Sequence(vec![
                    Mutation::InsertSubtree {
                        layers: doc.subtree(*id),
                        parent,
                        index: Some(index),
                    },
                    selection_of(doc),
                ]),
                _ => Mutation::noop(),
            }
        }
        Mutation::UpdateLayer { id, patch } => match doc.get(*id) {
            Some(layer) => Mutation::UpdateLayer {
                id: *id,
                patch: patch.capture(layer),
            },
            None => Mutation::noop(),
        },
        Mutation::ReplaceLayer { layer } => match doc.get(layer.id) {
            Some(existing) => Mutation::ReplaceLayer {
                layer: Box::new(existing.clone()),
            },
            None => Mutation::noop(),
        },
        Mutation::MoveToIndex { id, .. } => match doc.index_in_parent(*id) {
            Some(index) => Mutation::MoveToIndex { id: *id, index },
            None => Mutation::noop(),
        },
        Mutation::Reparent { id, .. } => match doc.parent_of(*id).zip(doc.index_in_parent(*id)) {
            Some((parent, index)) => Mutation::Reparent {
                id: *id,
                parent,
                index: Some(index),
            },
            None => Mutation::noop(),
        },
        Mutation::SetSelection { .. } => selection_of(doc),
        Mutation::Sequence(steps) => {
            // Each step's inverse is taken against the document it sees.
            let mut current = doc.clone();
            let mut inverses = Vec::with_capacity(steps.len());
            for step in steps {
                inverses.push(compute_inverse(&current, step));
                match step.apply(&current) {
                    Ok(next) => current = next,
                    Err(_) => return Mutation::noop(),
                }
            }
            inverses.reverse();
            Mutation::Sequence(inverses)
        }
    }
}

fn selection_of(doc: &DesignDocument) -> Mutation {
    Mutation::SetSelection {
        ids: doc.selection().ids.to_vec(),
        primary: doc.selection().primary_id,
    }
}

// ─── Commands ────────────────────────────────────────────────────────────

/// Who issued a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommandCategory {
    #[default]
    User,
    Ai,
    System,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommandKind {
    /// Single mutation with its inverse.
    Single {
        forward: Box<Mutation>,
        inverse: Box<Mutation>,
    },
    /// Executes in order, undoes in reverse.
    Batch(Vec<Command>),
}

/// A reversible unit of document change.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub label: String,
    pub category: CommandCategory,
    pub coalesce_key: Option<String>,
    pub kind: CommandKind,
}

impl Command {
    /// Wrap `forward`, computing its inverse against `doc`.
    pub fn new(label: impl Into<String>, doc: &DesignDocument, forward: Mutation) -> Self {
        let inverse = compute_inverse(doc, &forward);
        Self {
            label: label.into(),
            category: CommandCategory::User,
            coalesce_key: None,
            kind: CommandKind::Single {
                forward: Box::new(forward),
                inverse: Box::new(inverse),
            },
        }
    }

    /// One undo unit over `commands`, which must have been built against
    /// successive documents (each against the result of the previous).
    pub fn batch(label: impl Into<String>, commands: Vec<Command>) -> Self {
        Self {
            label: label.into(),
            category: CommandCategory::User,
            coalesce_key: None,
            kind: CommandKind::Batch(commands),
        }
    }

    #[must_use]
    pub fn with_category(mut self, category: CommandCategory) -> Self {
        self.category = category;
        if let CommandKind::Batch(children) = &mut self.kind {
            for child in children {
                child.category = category;
            }
        }
        self
    }

    #[must_use]
    pub fn with_coalesce_key(mut self, key: impl Into<String>) -> Self {
        self.coalesce_key = Some(key.into());
        self
    }

    pub fn is_noop(&self) -> bool {
        match &self.kind {
            CommandKind::Single { forward, .. } => forward.is_noop(),
            CommandKind::Batch(children) => children.iter().all(Command::is_noop),
        }
    }

    pub fn try_execute(&self, doc: &DesignDocument) -> Result<DesignDocument, DocumentError> {
        match &self.kind {
            CommandKind::Single { forward, .. } => forward.apply(doc),
            CommandKind::Batch(children) => {
                let mut current = doc.clone();
                for child in children {
                    current = child.try_execute(&current)?;
                }
                Ok(current)
            }
        }
    }

    pub fn try_undo(&self, doc: &DesignDocument) -> Result<DesignDocument, DocumentError> {
        match &self.kind {
            CommandKind::Single { inverse, .. } => inverse.apply(doc),
            CommandKind::Batch(children) => {
                let mut current = doc.clone();
                for child in children.iter().rev() {
                    current = child.try_undo(&current)?;
                }
                Ok(current)
            }
        }
    }

    /// Apply the command. A structural failure is logged and leaves the
    /// document unchanged.
    #[must_use]
    pub fn execute(&self, doc: &DesignDocument) -> DesignDocument {
        self.try_execute(doc).unwrap_or_else(|err| {
            log::warn!("command `{}` failed: {err}", self.label);
            doc.clone()
        })
    }

    #[must_use]
    pub fn undo(&self, doc: &DesignDocument) -> DesignDocument {
        self.try_undo(doc).unwrap_or_else(|err| {
            log::warn!("undo of `{}` failed: {err}", self.label);
            doc.clone()
        })
    }

    // ── Constructors ──

    /// Attach `layer` as the last child of `parent` (default: root).
    pub fn add_layer(doc: &DesignDocument, layer: Layer, parent: Option<LayerId>) -> Self {
        let label = format!("Add {}", layer.layer_type());
        let parent = parent.unwrap_or(doc.root_id());
        Self::new(
            label,
            doc,
            Mutation::InsertSubtree {
                layers: vec![layer],
                parent,
                index: None,
            },
        )
    }

    /// Delete layers with their subtrees. The root and unknown ids are
    /// skipped.
    pub fn remove_layers(doc: &DesignDocument, ids: &[LayerId]) -> Self {
        let steps = ids
            .iter()
            .filter(|id| **id != doc.root_id() && doc.contains(**id))
            .map(|id| Mutation::RemoveLayer { id: *id })
            .collect();
        Self::new("Delete", doc, Mutation::Sequence(steps))
    }

    pub fn update(doc: &DesignDocument, id: LayerId, patch: LayerPatch, label: impl Into<String>) -> Self {
        Self::new(label, doc, Mutation::UpdateLayer { id, patch })
    }

    pub fn replace_layer(doc: &DesignDocument, layer: Layer, label: impl Into<String>) -> Self {
        Self::new(
            label,
            doc,
            Mutation::ReplaceLayer {
                layer: Box::new(layer),
            },
        )
    }

    /// Z-order move, resolved to an exact index against `doc`.
    pub fn reorder(doc: &DesignDocument, id: LayerId, direction: ReorderDirection) -> Self {
        let label = match direction {
            ReorderDirection::Up => "Bring Forward",
            ReorderDirection::Down => "Send Backward",
            ReorderDirection::Top => "Bring to Front",
            ReorderDirection::Bottom => "Send to Back",
        };
        let forward = match doc.reorder_layer(id, direction) {
            Ok(next) => match next.index_in_parent(id) {
                Some(index) if Some(index) != doc.index_in_parent(id) => Mutation::MoveToIndex { id, index },
                _ => Mutation::noop(),
            },
            Err(err) => {
                log::warn!("reorder of {id} rejected: {err}");
                Mutation::noop()
            }
        };
        Self::new(label, doc, forward)
    }

    pub fn reparent(doc: &DesignDocument, id: LayerId, parent: LayerId, index: Option<usize>) -> Self {
        Self::new("Move to Group", doc, Mutation::Reparent { id, parent, index })
    }

    /// Duplicate each layer in front of its original and select the copies.
    /// Fresh ids are allocated here, so redo recreates the same copies.
    pub fn duplicate(doc: &DesignDocument, ids: &[LayerId]) -> Self {
        let mut current = doc.clone();
        let mut steps = Vec::new();
        let mut copies = Vec::new();
        for &id in ids {
            let Ok(clones) = current.prepare_duplicate(id) else {
                continue;
            };
            let (Some(parent), Some(index)) = (current.parent_of(id), current.index_in_parent(id)) else {
                continue;
            };
            let step = Mutation::InsertSubtree {
                layers: clones,
                parent,
                index: Some(index),
            };
            match step.apply(&current) {
                Ok(next) => {
                    if let Mutation::InsertSubtree { layers, .. } = &step {
                        copies.push(layers[0].id);
                    }
                    current = next;
                    steps.push(step);
                }
                Err(err) => log::warn!("duplicate of {id} rejected: {err}"),
            }
        }
        if !steps.is_empty() {
            steps.push(Mutation::SetSelection {
                primary: copies.first().copied(),
                ids: copies,
            });
        }
        Self::new("Duplicate", doc, Mutation::Sequence(steps))
    }

    /// Translate layers by `delta`. Descendants of moved containers move
    /// with them; each layer is moved once. Targets are absolute, so a
    /// coalesced drag replays deterministically.
    pub fn move_layers(doc: &DesignDocument, ids: &[LayerId], delta: Vec2) -> Self {
        let mut seen = HashSet::new();
        let mut steps = Vec::new();
        for &id in ids {
            if id == doc.root_id() {
                continue;
            }
            for member in doc.subtree_ids(id) {
                if !seen.insert(member) {
                    continue;
                }
                if let Some(layer) = doc.get(member) {
                    let patch = LayerPatch::position(layer, layer.transform.position + delta);
                    steps.push(Mutation::UpdateLayer { id: member, patch });
                }
            }
        }
        if delta == Vec2::ZERO {
            steps.clear();
        }
        Self::new("Move", doc, Mutation::Sequence(steps))
    }

    pub fn resize(doc: &DesignDocument, id: LayerId, transform: Transform) -> Self {
        Self::new(
            "Resize",
            doc,
            Mutation::UpdateLayer {
                id,
                patch: LayerPatch::transform(transform),
            },
        )
    }

    pub fn rotate(doc: &DesignDocument, id: LayerId, degrees: f64) -> Self {
        let forward = match doc.get(id) {
            Some(layer) => Mutation::UpdateLayer {
                id,
                patch: LayerPatch::transform(Transform {
                    rotation: degrees,
                    ..layer.transform
                }),
            },
            None => Mutation::noop(),
        };
        Self::new("Rotate", doc, forward)
    }
}

// ─── Stack ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub command: Command,
    pub snapshot_before: DesignDocument,
}

/// The current document plus bounded undo/redo history.
#[derive(Debug, Clone)]
pub struct CommandStack {
    document: DesignDocument,
    undo_stack: Vec<HistoryEntry>,
    redo_stack: Vec<HistoryEntry>,
    /// Maximum undo depth.
    max_depth: usize,
}

impl CommandStack {
    pub fn new(document: DesignDocument, max_depth: usize) -> Self {
        Self {
            document,
            undo_stack: Vec::with_capacity(max_depth.min(256)),
            redo_stack: Vec::new(),
            max_depth: max_depth.max(1),
        }
    }

    pub fn document(&self) -> &DesignDocument {
        &self.document
    }

    /// Run `command` against the current document and record it. Returns
    /// `false` for no-op and failed commands; neither touches the document
    /// or the history.
    pub fn execute(&mut self, command: Command) -> bool {
        if command.is_noop() {
            return false;
        }
        let next = match command.try_execute(&self.document) {
            Ok(next) => next,
            Err(err) => {
                log::warn!("command `{}` failed: {err}", command.label);
                return false;
            }
        };

        let coalesces = command.coalesce_key.is_some()
            && self.redo_stack.is_empty()
            && self
                .undo_stack
                .last()
                .is_some_and(|top| top.command.coalesce_key == command.coalesce_key);

        if coalesces && let Some(top) = self.undo_stack.last_mut() {
            log::trace!("coalesce `{}`", command.label);
            top.command = command;
        } else {
            log::debug!("execute `{}` ({:?})", command.label, command.category);
            self.undo_stack.push(HistoryEntry {
                command,
                snapshot_before: self.document.clone(),
            });
            while self.undo_stack.len() > self.max_depth {
                self.undo_stack.remove(0);
            }
            // Clear redo stack on new action
            self.redo_stack.clear();
        }
        self.document = next;
        true
    }

    /// Undo the last entry. Returns its label.
    pub fn undo(&mut self) -> Option<String> {
        let entry = self.undo_stack.pop()?;
        let label = entry.command.label.clone();
        log::debug!("undo `{label}`");
        self.document = entry.snapshot_before.clone();
        self.redo_stack.push(entry);
        Some(label)
    }

    /// Re-execute the last undone command. Returns its label.
    pub fn redo(&mut self) -> Option<String> {
        let mut entry = self.redo_stack.pop()?;
        let label = entry.command.label.clone();
        log::debug!("redo `{label}`");
        let next = match entry.command.try_execute(&self.document) {
            Ok(next) => next,
            Err(err) => {
                log::warn!("redo of `{label}` failed: {err}");
                self.redo_stack.push(entry);
                return None;
            }
        };
        entry.snapshot_before = std::mem::replace(&mut self.document, next);
        self.undo_stack.push(entry);
        Some(label)
    }

    /// Change the selection without recording history.
    pub fn set_selection(&mut self, ids: impl IntoIterator<Item = LayerId>, primary: Option<LayerId>) {
        self.document = self.document.select(ids, primary);
    }

    /// Swap in a new document (e.g. after loading) and drop all history.
    pub fn reset(&mut self, document: DesignDocument) {
        self.document = document;
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Undo history, oldest first.
    pub fn undo_entries(&self) -> &[HistoryEntry] {
        &self.undo_stack
    }

    pub fn undo_label(&self) -> Option<&str> {
        self.undo_stack.last().map(|e| e.command.label.as_str())
    }

    pub fn redo_label(&self) -> Option<&str> {
        self.redo_stack.last().map(|e| e.command.label.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lk_core::ShapeType;
    use pretty_assertions::assert_eq;

    fn base() -> (DesignDocument, LayerId) {
        let rect = Layer::shape(ShapeType::Rectangle).at(10.0, 10.0);
        let id = rect.id;
        let doc = DesignDocument::new(800.0, 600.0).add_layer(rect, None).unwrap();
        (doc, id)
    }

    #[test]
    fn undo_redo_move() {
        let (doc, id) = base();
        let mut stack = CommandStack::new(doc.clone(), 100);
        stack.execute(Command::move_layers(&doc, &[id], Vec2::new(50.0, 30.0)));
        assert_eq!(stack.document().get(id).unwrap().transform.position, Vec2::new(60.0, 40.0));

        assert_eq!(stack.undo(), Some("Move".to_string()));
        assert_eq!(stack.document(), &doc);

        assert_eq!(stack.redo(), Some("Move".to_string()));
        assert_eq!(stack.document().get(id).unwrap().transform.position, Vec2::new(60.0, 40.0));
    }

    #[test]
    fn redo_clears_on_new_action() {
        let (doc, id) = base();
        let mut stack = CommandStack::new(doc, 100);
        let cmd = Command::move_layers(stack.document(), &[id], Vec2::new(5.0, 0.0));
        stack.execute(cmd);
        stack.undo();
        assert!(stack.can_redo());

        let cmd = Command::move_layers(stack.document(), &[id], Vec2::new(1.0, 0.0));
        stack.execute(cmd);
        assert!(!stack.can_redo());
    }

    #[test]
    fn max_depth_trims_oldest() {
        let (doc, id) = base();
        let mut stack = CommandStack::new(doc, 3);
        for i in 0..5 {
            let cmd = Command::move_layers(stack.document(), &[id], Vec2::new(1.0, 0.0));
            stack.execute(cmd.with_coalesce_key(format!("nudge-{i}")));
        }
        assert_eq!(stack.undo_depth(), 3);
        let oldest = &stack.undo_entries()[0].snapshot_before;
        assert_eq!(oldest.get(id).unwrap().transform.position.x, 12.0);
    }

    #[test]
    fn noop_is_not_recorded() {
        let (doc, _) = base();
        let mut stack = CommandStack::new(doc.clone(), 10);
        assert!(!stack.execute(Command::remove_layers(&doc, &[doc.root_id()])));
        assert!(!stack.can_undo());
    }

    #[test]
    fn failed_mutation_leaves_document() {
        let (doc, _) = base();
        let ghost = LayerId::intern("commands_ghost");
        let cmd = Command::new(
            "bad",
            &doc,
            Mutation::UpdateLayer {
                id: ghost,
                patch: LayerPatch::default(),
            },
        );
        assert_eq!(cmd.execute(&doc), doc);
    }

    #[test]
    fn reorder_at_edge_is_noop() {
        let (doc, id) = base();
        assert!(Command::reorder(&doc, id, ReorderDirection::Top).is_noop());
    }
}
