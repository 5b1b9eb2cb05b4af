//! The design document: an arena of layers plus the document-wide selection.
//!
//! Every operation is pure: it takes `&self` and returns a new document,
//! so callers can keep the previous value as an undo snapshot. Structural
//! failures return a [`DocumentError`] and leave `self` untouched.

use crate::error::DocumentError;
use crate::geometry::{Aabb, Vec2};
use crate::id::LayerId;
use crate::model::{Layer, LayerKind};
use crate::patch::LayerPatch;
use crate::rules::ranges::{Property, clamp_to_range};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};

/// Offset applied to duplicated layers so the copy is visible.
pub const DUPLICATE_OFFSET: f64 = 20.0;

type Result<T> = std::result::Result<T, DocumentError>;

// ─── Selection ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub ids: SmallVec<[LayerId; 4]>,
    pub primary_id: Option<LayerId>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: LayerId) -> bool {
        self.ids.contains(&id)
    }
}

/// Z-order move within the parent's `children` (index 0 = topmost).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReorderDirection {
    /// One step toward the front.
    Up,
    /// One step toward the back.
    Down,
    /// To the front.
    Top,
    /// To the back.
    Bottom,
}

// ─── Document ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignDocument {
    root_frame_id: LayerId,
    layers_by_id: HashMap<LayerId, Layer>,
    #[serde(skip)]
    selection: Selection,
}

impl DesignDocument {
    /// Create a document whose root frame is a `width × height` canvas.
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        let root = Layer::frame(width, height).named("Canvas");
        Self::from_root(root)
    }

    /// Create a document around an explicit root frame. Non-frame roots are
    /// replaced by a frame of the same size; any listed children are dropped.
    #[must_use]
    pub fn from_root(mut root: Layer) -> Self {
        if !matches!(root.kind, LayerKind::Frame { .. }) {
            let size = root.transform.size;
            root = Layer::frame(size.x, size.y)
                .with_id(root.id)
                .named(root.name);
        }
        if let Some(children) = root.children_mut() {
            children.clear();
        }
        root.parent_id = None;
        sanitize(&mut root);
        let root_frame_id = root.id;
        let mut layers_by_id = HashMap::new();
        layers_by_id.insert(root_frame_id, root);
        Self {
            root_frame_id,
            layers_by_id,
            selection: Selection::default(),
        }
    }

    /// Assemble a document from raw parts (used by persistence), checking
    /// every structural invariant.
    pub fn from_parts(root_frame_id: LayerId, layers_by_id: HashMap<LayerId, Layer>) -> Result<Self> {
        let doc = Self {
            root_frame_id,
            layers_by_id,
            selection: Selection::default(),
        };
        doc.check_invariants()?;
        Ok(doc)
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn root_id(&self) -> LayerId {
        self.root_frame_id
    }

    /// The root frame. Its presence is an invariant of every document value.
    pub fn root(&self) -> &Layer {
        &self.layers_by_id[&self.root_frame_id]
    }

    pub fn get(&self, id: LayerId) -> Option<&Layer> {
        self.layers_by_id.get(&id)
    }

    pub fn contains(&self, id: LayerId) -> bool {
        self.layers_by_id.contains_key(&id)
    }

    pub fn layer_count(&self) -> usize {
        self.layers_by_id.len()
    }

    /// All layers in unspecified order. Use [`layer_order`](Self::layer_order)
    /// when order matters.
    pub fn layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers_by_id.values()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn canvas_size(&self) -> Vec2 {
        self.root().transform.size
    }

    pub fn canvas_bounds(&self) -> Aabb {
        self.root().transform.aabb()
    }

    pub fn parent_of(&self, id: LayerId) -> Option<LayerId> {
        self.get(id)?.parent_id
    }

    pub fn index_in_parent(&self, id: LayerId) -> Option<usize> {
        let parent = self.get(self.parent_of(id)?)?;
        parent.children()?.iter().position(|c| *c == id)
    }

    /// Children of `id`, or an empty slice for leaves and unknown ids.
    pub fn children_of(&self, id: LayerId) -> &[LayerId] {
        self.get(id).and_then(Layer::children).unwrap_or(&[])
    }

    /// Check if `ancestor` is a parent/grandparent/etc. of `descendant`.
    pub fn is_ancestor_of(&self, ancestor: LayerId, descendant: LayerId) -> bool {
        if ancestor == descendant {
            return false;
        }
        let mut current = descendant;
        while let Some(parent) = self.parent_of(current) {
            if parent == ancestor {
                return true;
            }
            current = parent;
        }
        false
    }

    /// Pre-order traversal from the root: a container comes before its
    /// children, and children come front (index 0) to back.
    pub fn layer_order(&self) -> Vec<&Layer> {
        self.subtree_ids(self.root_frame_id)
            .into_iter()
            .filter_map(|id| self.get(id))
            .collect()
    }

    /// Pre-order ids of the subtree rooted at `id` (empty if unknown).
    pub fn subtree_ids(&self, id: LayerId) -> Vec<LayerId> {
        let mut out = Vec::new();
        if !self.contains(id) {
            return out;
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children_of(current).iter().rev().copied());
        }
        out
    }

    /// Deep copy of the subtree rooted at `id`, root first.
    pub fn subtree(&self, id: LayerId) -> Vec<Layer> {
        self.subtree_ids(id)
            .into_iter()
            .filter_map(|i| self.get(i).cloned())
            .collect()
    }

    /// Deep copy of a subtree with every id replaced by a fresh one. The
    /// copy's root keeps the original's `parent_id`.
    pub fn clone_subtree_with_fresh_ids(&self, id: LayerId) -> Option<Vec<Layer>> {
        let originals = self.subtree(id);
        if originals.is_empty() {
            return None;
        }
        let remap: HashMap<LayerId, LayerId> = originals
            .iter()
            .map(|l| (l.id, LayerId::fresh(l.layer_type().as_str())))
            .collect();
        let clones = originals
            .into_iter()
            .map(|mut layer| {
                layer.id = remap[&layer.id];
                if let Some(parent) = layer.parent_id {
                    layer.parent_id = Some(remap.get(&parent).copied().unwrap_or(parent));
                }
                if let Some(children) = layer.children_mut() {
                    for child in children.iter_mut() {
                        *child = remap[&*child];
                    }
                }
                layer
            })
            .collect();
        Some(clones)
    }

    /// The subtree a duplicate of `id` would insert: fresh ids, offset by
    /// [`DUPLICATE_OFFSET`], root renamed with a " copy" suffix.
    pub fn prepare_duplicate(&self, id: LayerId) -> Result<Vec<Layer>> {
        if id == self.root_frame_id {
            return Err(DocumentError::RootImmutable(id, "duplicated"));
        }
        let mut clones = self
            .clone_subtree_with_fresh_ids(id)
            .ok_or(DocumentError::LayerNotFound(id))?;
        for layer in &mut clones {
            layer.transform.position =
                layer.transform.position + Vec2::new(DUPLICATE_OFFSET, DUPLICATE_OFFSET);
        }
        if let Some(root) = clones.first_mut() {
            root.name = format!("{} copy", root.name);
        }
        Ok(clones)
    }

    // ─── Operations ──────────────────────────────────────────────────────

    /// Attach `layer` as the last child of `parent` (default: the root).
    pub fn add_layer(&self, mut layer: Layer, parent: Option<LayerId>) -> Result<Self> {
        if layer.children().is_some_and(|c| !c.is_empty()) {
            return Err(DocumentError::UnattachedChildren(layer.id));
        }
        let parent = parent.unwrap_or(self.root_frame_id);
        layer.parent_id = Some(parent);
        self.insert_subtree(&[layer], parent, None)
    }

    /// Attach a pre-built subtree (root first, as produced by
    /// [`subtree`](Self::subtree)) under `parent` at `index` (default: last).
    pub fn insert_subtree(&self, layers: &[Layer], parent: LayerId, index: Option<usize>) -> Result<Self> {
        let Some(head) = layers.first() else {
            return Ok(self.clone());
        };
        if !self.get(parent).is_some_and(Layer::is_container) {
            return Err(DocumentError::InvalidParent(parent));
        }
        let mut seen = HashSet::new();
        for layer in layers {
            if self.contains(layer.id) || !seen.insert(layer.id) {
                return Err(DocumentError::DuplicateId(layer.id));
            }
        }
        for layer in &layers[1..] {
            if !layer.parent_id.is_some_and(|p| seen.contains(&p)) {
                return Err(DocumentError::InvalidParent(layer.parent_id.unwrap_or(parent)));
            }
        }
        for layer in layers {
            if layer.children().is_some_and(|c| c.iter().any(|child| !seen.contains(child))) {
                return Err(DocumentError::UnattachedChildren(layer.id));
            }
        }

        let mut next = self.clone();
        for layer in layers {
            let mut layer = layer.clone();
            if layer.id == head.id {
                layer.parent_id = Some(parent);
            }
            sanitize(&mut layer);
            next.layers_by_id.insert(layer.id, layer);
        }
        if let Some(children) = next.layers_by_id.get_mut(&parent).and_then(Layer::children_mut) {
            let at = index.unwrap_or(children.len()).min(children.len());
            children.insert(at, head.id);
        }
        log::trace!("insert subtree {} ({} layers) under {}", head.id, layers.len(), parent);
        Ok(next)
    }

    /// Detach and drop the subtree rooted at `id`, retiring its ids. Unknown
    /// ids and the root are a silent no-op.
    #[must_use]
    pub fn remove_layer(&self, id: LayerId) -> Self {
        if id == self.root_frame_id || !self.contains(id) {
            return self.clone();
        }
        let mut next = self.clone();
        let doomed = self.subtree_ids(id);
        if let Some(parent) = self.parent_of(id)
            && let Some(children) = next.layers_by_id.get_mut(&parent).and_then(Layer::children_mut)
        {
            children.retain(|c| *c != id);
        }
        for gone in &doomed {
            next.layers_by_id.remove(gone);
            gone.retire();
        }
        next.selection.ids.retain(|s| !doomed.contains(s));
        if next.selection.primary_id.is_some_and(|p| doomed.contains(&p)) {
            next.selection.primary_id = next.selection.ids.first().copied();
        }
        next
    }

    /// Shallow-merge `patch` onto the layer.
    pub fn update_layer(&self, id: LayerId, patch: &LayerPatch) -> Result<Self> {
        let mut next = self.clone();
        let layer = next
            .layers_by_id
            .get_mut(&id)
            .ok_or(DocumentError::LayerNotFound(id))?;
        patch.apply(layer);
        sanitize(layer);
        Ok(next)
    }

    /// Replace a layer's whole record. Tree fields (`parent_id`, children)
    /// are kept from the existing layer; container-ness cannot change and
    /// the root stays a frame.
    pub fn replace_layer(&self, mut layer: Layer) -> Result<Self> {
        let existing = self.get(layer.id).ok_or(DocumentError::LayerNotFound(layer.id))?;
        if layer.id == self.root_frame_id && !matches!(layer.kind, LayerKind::Frame { .. }) {
            return Err(DocumentError::RootImmutable(layer.id, "retyped"));
        }
        match (existing.children(), layer.children_mut()) {
            (Some(old), Some(new)) => *new = old.to_vec(),
            (None, None) => {}
            _ => {
                return Err(DocumentError::StructuralChange(
                    layer.id,
                    "replacement changes container type",
                ));
            }
        }
        layer.parent_id = existing.parent_id;
        sanitize(&mut layer);
        let mut next = self.clone();
        next.layers_by_id.insert(layer.id, layer);
        Ok(next)
    }

    /// Move `id` within its parent's `children`.
    pub fn reorder_layer(&self, id: LayerId, direction: ReorderDirection) -> Result<Self> {
        let (_, index, len) = self.sibling_slot(id)?;
        let target = match direction {
            ReorderDirection::Up => index.saturating_sub(1),
            ReorderDirection::Down => (index + 1).min(len - 1),
            ReorderDirection::Top => 0,
            ReorderDirection::Bottom => len - 1,
        };
        self.move_to_index(id, target)
    }

    /// Place `id` at an exact index within its parent's `children`.
    pub fn move_to_index(&self, id: LayerId, index: usize) -> Result<Self> {
        let (parent, current, len) = self.sibling_slot(id)?;
        let target = index.min(len - 1);
        if target == current {
            return Ok(self.clone());
        }
        let mut next = self.clone();
        if let Some(children) = next.layers_by_id.get_mut(&parent).and_then(Layer::children_mut) {
            let child = children.remove(current);
            children.insert(target, child);
        }
        Ok(next)
    }

    /// Move `id` under another container at `index` (default: last).
    pub fn reparent_layer(&self, id: LayerId, new_parent: LayerId, index: Option<usize>) -> Result<Self> {
        if id == self.root_frame_id {
            return Err(DocumentError::RootImmutable(id, "reparented"));
        }
        let old_parent = self.parent_of(id).ok_or(DocumentError::LayerNotFound(id))?;
        if !self.get(new_parent).is_some_and(Layer::is_container) {
            return Err(DocumentError::InvalidParent(new_parent));
        }
        if new_parent == id || self.is_ancestor_of(id, new_parent) {
            return Err(DocumentError::Cycle(id, new_parent));
        }
        let mut next = self.clone();
        if let Some(children) = next.layers_by_id.get_mut(&old_parent).and_then(Layer::children_mut) {
            children.retain(|c| *c != id);
        }
        if let Some(children) = next.layers_by_id.get_mut(&new_parent).and_then(Layer::children_mut) {
            let at = index.unwrap_or(children.len()).min(children.len());
            children.insert(at, id);
        }
        if let Some(layer) = next.layers_by_id.get_mut(&id) {
            layer.parent_id = Some(new_parent);
        }
        Ok(next)
    }

    /// Deep-clone the subtree with fresh ids, insert the copy directly in
    /// front of the original, and select it.
    pub fn duplicate_layer(&self, id: LayerId) -> Result<Self> {
        let clones = self.prepare_duplicate(id)?;
        let (parent, index, _) = self.sibling_slot(id)?;
        let copy_id = clones[0].id;
        let next = self.insert_subtree(&clones, parent, Some(index))?;
        Ok(next.select([copy_id], Some(copy_id)))
    }

    /// Replace the selection. Unknown ids are dropped; the primary defaults
    /// to the first selected id.
    #[must_use]
    pub fn select(&self, ids: impl IntoIterator<Item = LayerId>, primary: Option<LayerId>) -> Self {
        let mut next = self.clone();
        let mut selected: SmallVec<[LayerId; 4]> = SmallVec::new();
        for id in ids {
            if self.contains(id) && !selected.contains(&id) {
                selected.push(id);
            }
        }
        let primary = primary
            .filter(|p| selected.contains(p))
            .or_else(|| selected.first().copied());
        next.selection = Selection {
            ids: selected,
            primary_id: primary,
        };
        next
    }

    // ─── Invariants ──────────────────────────────────────────────────────

    /// Verify ownership, root, and value-range invariants.
    pub fn check_invariants(&self) -> Result<()> {
        let root = self
            .get(self.root_frame_id)
            .ok_or(DocumentError::LayerNotFound(self.root_frame_id))?;
        if !matches!(root.kind, LayerKind::Frame { .. }) || root.parent_id.is_some() {
            return Err(DocumentError::Invariant(format!(
                "root {} must be a parentless frame",
                self.root_frame_id
            )));
        }

        let mut reached = HashSet::new();
        let mut stack = vec![self.root_frame_id];
        while let Some(id) = stack.pop() {
            if !reached.insert(id) {
                return Err(DocumentError::Invariant(format!("{id} is owned twice")));
            }
            for child in self.children_of(id) {
                let layer = self.get(*child).ok_or(DocumentError::LayerNotFound(*child))?;
                if layer.parent_id != Some(id) {
                    return Err(DocumentError::Invariant(format!(
                        "{child} is listed by {id} but points at {:?}",
                        layer.parent_id
                    )));
                }
                stack.push(*child);
            }
        }
        if reached.len() != self.layers_by_id.len() {
            return Err(DocumentError::Invariant(format!(
                "{} orphaned layer(s)",
                self.layers_by_id.len() - reached.len()
            )));
        }

        for layer in self.layers_by_id.values() {
            let size = layer.transform.size;
            if !(size.x > 0.0 && size.y > 0.0) {
                return Err(DocumentError::Invariant(format!("{} has a non-positive size", layer.id)));
            }
            if !(0.0..=1.0).contains(&layer.opacity) {
                return Err(DocumentError::Invariant(format!("{} opacity out of range", layer.id)));
            }
        }
        Ok(())
    }

    /// `(parent, index, sibling count)` for a non-root layer.
    fn sibling_slot(&self, id: LayerId) -> Result<(LayerId, usize, usize)> {
        if id == self.root_frame_id {
            return Err(DocumentError::RootImmutable(id, "reordered"));
        }
        let parent = self.parent_of(id).ok_or(DocumentError::LayerNotFound(id))?;
        let siblings = self.children_of(parent);
        let index = siblings
            .iter()
            .position(|c| *c == id)
            .ok_or(DocumentError::LayerNotFound(id))?;
        Ok((parent, index, siblings.len()))
    }
}

/// Pull a layer's values back inside their invariants.
fn sanitize(layer: &mut Layer) {
    layer.opacity = if layer.opacity.is_nan() {
        1.0
    } else {
        layer.opacity.clamp(0.0, 1.0)
    };
    let size = &mut layer.transform.size;
    for v in [&mut size.x, &mut size.y] {
        if !(v.is_finite() && *v > 0.0) {
            *v = 1.0;
        }
    }
    if let LayerKind::Text { default_style, .. } = &mut layer.kind {
        default_style.font_size = clamp_to_range(default_style.font_size, Property::FontSize);
        default_style.font_weight =
            clamp_to_range(f64::from(default_style.font_weight), Property::FontWeight) as u16;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ShapeType;
    use pretty_assertions::assert_eq;

    fn doc_with(layers: Vec<Layer>) -> (DesignDocument, Vec<LayerId>) {
        let mut doc = DesignDocument::new(800.0, 600.0);
        let mut ids = Vec::new();
        for layer in layers {
            ids.push(layer.id);
            doc = doc.add_layer(layer, None).unwrap();
        }
        (doc, ids)
    }

    #[test]
    fn add_appends_as_last_child() {
        let (doc, ids) = doc_with(vec![Layer::text("a"), Layer::text("b")]);
        assert_eq!(doc.children_of(doc.root_id()), ids.as_slice());
        assert_eq!(doc.parent_of(ids[1]), Some(doc.root_id()));
        doc.check_invariants().unwrap();
    }

    #[test]
    fn add_to_leaf_is_invalid_parent() {
        let (doc, ids) = doc_with(vec![Layer::shape(ShapeType::Rectangle)]);
        let err = doc.add_layer(Layer::text("x"), Some(ids[0])).unwrap_err();
        assert_eq!(err, DocumentError::InvalidParent(ids[0]));
        let missing = LayerId::intern("no_such_parent");
        assert!(doc.add_layer(Layer::text("x"), Some(missing)).is_err());
    }

    #[test]
    fn remove_drops_subtree_and_ignores_root() {
        let group = Layer::group();
        let gid = group.id;
        let (doc, _) = doc_with(vec![group]);
        let child = Layer::text("inside");
        let cid = child.id;
        let doc = doc.add_layer(child, Some(gid)).unwrap().select([cid], None);

        let removed = doc.remove_layer(gid);
        assert!(!removed.contains(gid));
        assert!(!removed.contains(cid));
        assert!(removed.selection().is_empty());
        removed.check_invariants().unwrap();

        assert_eq!(doc.remove_layer(doc.root_id()), doc);
        assert_eq!(doc.remove_layer(LayerId::intern("ghost")), doc);
    }

    #[test]
    fn update_unknown_layer_fails() {
        let doc = DesignDocument::new(100.0, 100.0);
        let id = LayerId::intern("nobody");
        assert_eq!(
            doc.update_layer(id, &LayerPatch::default()).unwrap_err(),
            DocumentError::LayerNotFound(id)
        );
    }

    #[test]
    fn update_sanitizes_values() {
        let (doc, ids) = doc_with(vec![Layer::text("t")]);
        let patch = LayerPatch {
            opacity: Some(4.0),
            ..Default::default()
        };
        let doc = doc.update_layer(ids[0], &patch).unwrap();
        assert_eq!(doc.get(ids[0]).unwrap().opacity, 1.0);
    }

    #[test]
    fn reorder_moves_within_parent() {
        let (doc, ids) = doc_with(vec![Layer::text("a"), Layer::text("b"), Layer::text("c")]);
        let top = doc.reorder_layer(ids[2], ReorderDirection::Top).unwrap();
        assert_eq!(top.children_of(top.root_id()), &[ids[2], ids[0], ids[1]]);
        let down = doc.reorder_layer(ids[0], ReorderDirection::Down).unwrap();
        assert_eq!(down.children_of(down.root_id()), &[ids[1], ids[0], ids[2]]);
        let bottom = doc.reorder_layer(ids[0], ReorderDirection::Bottom).unwrap();
        assert_eq!(bottom.children_of(bottom.root_id()), &[ids[1], ids[2], ids[0]]);
        let up = doc.reorder_layer(ids[0], ReorderDirection::Up).unwrap();
        assert_eq!(up, doc);
    }

    #[test]
    fn duplicate_inserts_in_front_and_selects() {
        let group = Layer::group().at(10.0, 10.0);
        let gid = group.id;
        let (doc, _) = doc_with(vec![Layer::text("front"), group]);
        let doc = doc.add_layer(Layer::text("child"), Some(gid)).unwrap();

        let dup = doc.duplicate_layer(gid).unwrap();
        dup.check_invariants().unwrap();
        assert_eq!(dup.layer_count(), doc.layer_count() + 2);
        let root_children = dup.children_of(dup.root_id());
        assert_eq!(root_children.len(), 3);
        assert_eq!(root_children[2], gid);
        let copy = dup.get(root_children[1]).unwrap();
        assert_eq!(copy.transform.position, Vec2::new(30.0, 30.0));
        assert_eq!(dup.selection().primary_id, Some(copy.id));
        assert_ne!(dup.children_of(copy.id), doc.children_of(gid));
    }

    #[test]
    fn reparent_rejects_cycles() {
        let outer = Layer::group();
        let inner = Layer::group();
        let (oid, iid) = (outer.id, inner.id);
        let (doc, _) = doc_with(vec![outer]);
        let doc = doc.add_layer(inner, Some(oid)).unwrap();
        assert_eq!(
            doc.reparent_layer(oid, iid, None).unwrap_err(),
            DocumentError::Cycle(oid, iid)
        );
        let flat = doc.reparent_layer(iid, doc.root_id(), Some(0)).unwrap();
        assert_eq!(flat.children_of(flat.root_id()), &[iid, oid]);
        flat.check_invariants().unwrap();
    }

    #[test]
    fn layer_order_is_preorder() {
        let group = Layer::group();
        let gid = group.id;
        let (doc, ids) = doc_with(vec![group, Layer::text("back")]);
        let child = Layer::text("child");
        let cid = child.id;
        let doc = doc.add_layer(child, Some(gid)).unwrap();
        let order: Vec<LayerId> = doc.layer_order().iter().map(|l| l.id).collect();
        assert_eq!(order, vec![doc.root_id(), gid, cid, ids[1]]);
    }

    #[test]
    fn replace_keeps_tree_fields() {
        let (doc, ids) = doc_with(vec![Layer::text("a")]);
        let mut replacement = doc.get(ids[0]).unwrap().clone();
        replacement.parent_id = None;
        replacement.name = "Renamed".into();
        let next = doc.replace_layer(replacement).unwrap();
        assert_eq!(next.parent_of(ids[0]), Some(doc.root_id()));
        assert_eq!(next.get(ids[0]).unwrap().name, "Renamed");

        let retyped = Layer::group().with_id(ids[0]);
        assert!(doc.replace_layer(retyped).is_err());
    }
}
