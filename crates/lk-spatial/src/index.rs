//! Uniform-grid spatial index over layer bounding boxes.
//!
//! Makes marquee selection and region queries sub-linear in layer count.
//! The exact single-point hit test does not go through here: cached AABBs
//! are conservative for rotated layers.
//!
//! Boxes spanning more than [`MAX_CELLS_PER_BOX`] cells are kept in an
//! overflow list that every query scans, and queries that large fall back
//! to a linear scan, so no single box costs more than a bounded number of
//! cells. Non-finite boxes are not indexed.

use lk_core::{Aabb, DesignDocument, LayerId, Vec2};
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};

/// Default grid cell edge in world units.
pub const CELL_SIZE: f64 = 64.0;

/// Largest number of grid cells one box is filed under.
pub const MAX_CELLS_PER_BOX: i64 = 4096;

type CellKey = (i64, i64);

#[derive(Debug, Clone)]
pub struct SpatialIndex {
    cell_size: f64,
    cells: HashMap<CellKey, SmallVec<[LayerId; 4]>>,
    /// Ids too large for the grid.
    oversized: Vec<LayerId>,
    bounds: HashMap<LayerId, Aabb>,
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self::with_cell_size(CELL_SIZE)
    }

    pub fn with_cell_size(cell_size: f64) -> Self {
        Self {
            cell_size: if cell_size > 0.0 { cell_size } else { CELL_SIZE },
            cells: HashMap::new(),
            oversized: Vec::new(),
            bounds: HashMap::new(),
        }
    }

    /// Build an index over every non-root layer of `doc`.
    pub fn from_document(doc: &DesignDocument) -> Self {
        let mut index = Self::new();
        index.rebuild(doc);
        index
    }

    /// Discard everything and re-index every non-root layer.
    pub fn rebuild(&mut self, doc: &DesignDocument) {
        self.cells.clear();
        self.oversized.clear();
        self.bounds.clear();
        for layer in doc.layers() {
            if layer.id != doc.root_id() {
                self.insert(layer.id, layer.transform.world_aabb());
            }
        }
        log::trace!("spatial index rebuilt: {} layers, {} cells", self.bounds.len(), self.cells.len());
    }

    /// Insert or move `id`. Only the cells its old and new boxes span are
    /// touched.
    pub fn insert(&mut self, id: LayerId, aabb: Aabb) {
        self.remove(id);
        if !is_finite(&aabb) {
            log::warn!("not indexing {id}: non-finite bounds {aabb:?}");
            return;
        }
        match self.cell_range(&aabb) {
            Some(range) => {
                for key in cells_in(range) {
                    self.cells.entry(key).or_default().push(id);
                }
            }
            None => self.oversized.push(id),
        }
        self.bounds.insert(id, aabb);
    }

    /// Re-read one layer's box from `doc`, dropping it if it no longer
    /// exists.
    pub fn refresh(&mut self, doc: &DesignDocument, id: LayerId) {
        match doc.get(id) {
            Some(layer) if id != doc.root_id() => self.insert(id, layer.transform.world_aabb()),
            _ => self.remove(id),
        }
    }

    pub fn remove(&mut self, id: LayerId) {
        let Some(old) = self.bounds.remove(&id) else {
            return;
        };
        let Some(range) = self.cell_range(&old) else {
            self.oversized.retain(|o| *o != id);
            return;
        };
        for key in cells_in(range) {
            if let Some(bucket) = self.cells.get_mut(&key) {
                bucket.retain(|c| *c != id);
                if bucket.is_empty() {
                    self.cells.remove(&key);
                }
            }
        }
    }

    /// Ids whose cached AABB intersects `rect` (inclusive), sorted by id.
    pub fn query_rect(&self, rect: &Aabb) -> Vec<LayerId> {
        let range = if is_finite(rect) { self.cell_range(rect) } else { None };
        let mut out: Vec<LayerId> = match range {
            Some(range) => {
                let mut seen = HashSet::new();
                cells_in(range)
                    .filter_map(|key| self.cells.get(&key))
                    .flatten()
                    .chain(&self.oversized)
                    .copied()
                    .filter(|id| seen.insert(*id) && self.bounds.get(id).is_some_and(|b| b.intersects(rect)))
                    .collect()
            }
            None => self
                .bounds
                .iter()
                .filter(|(_, b)| b.intersects(rect))
                .map(|(id, _)| *id)
                .collect(),
        };
        out.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        out
    }

    /// Ids whose cached AABB contains `point` (inclusive), sorted by id.
    pub fn query_point(&self, point: Vec2) -> Vec<LayerId> {
        self.query_rect(&Aabb::new(point.x, point.y, point.x, point.y))
    }

    pub fn bounds_of(&self, id: LayerId) -> Option<Aabb> {
        self.bounds.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    fn cell_of(&self, v: f64) -> i64 {
        (v / self.cell_size).floor() as i64
    }

    /// First and last cell `aabb` spans, or `None` past the per-box limit.
    fn cell_range(&self, aabb: &Aabb) -> Option<(CellKey, CellKey)> {
        let (x0, x1) = (self.cell_of(aabb.min_x), self.cell_of(aabb.max_x));
        let (y0, y1) = (self.cell_of(aabb.min_y), self.cell_of(aabb.max_y));
        let count = x1
            .saturating_sub(x0)
            .saturating_add(1)
            .saturating_mul(y1.saturating_sub(y0).saturating_add(1));
        (count <= MAX_CELLS_PER_BOX).then_some(((x0, y0), (x1, y1)))
    }
}

fn cells_in(((x0, y0), (x1, y1)): (CellKey, CellKey)) -> impl Iterator<Item = CellKey> {
    (x0..=x1).flat_map(move |x| (y0..=y1).map(move |y| (x, y)))
}

fn is_finite(aabb: &Aabb) -> bool {
    [aabb.min_x, aabb.min_y, aabb.max_x, aabb.max_y]
        .iter()
        .all(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lk_core::{Layer, ShapeType};
    use pretty_assertions::assert_eq;

    #[test]
    fn incremental_insert_and_remove() {
        let mut index = SpatialIndex::new();
        let a = LayerId::intern("index_a");
        index.insert(a, Aabb::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(index.query_point(Vec2::new(5.0, 5.0)), vec![a]);

        // Moving far away leaves nothing behind in the old cells.
        index.insert(a, Aabb::new(500.0, 500.0, 510.0, 510.0));
        assert!(index.query_point(Vec2::new(5.0, 5.0)).is_empty());
        assert_eq!(index.query_point(Vec2::new(510.0, 510.0)), vec![a]);

        index.remove(a);
        assert!(index.is_empty());
        assert!(index.query_rect(&Aabb::new(-1e4, -1e4, 1e4, 1e4)).is_empty());
    }

    #[test]
    fn cell_boundaries_are_inclusive() {
        let mut index = SpatialIndex::new();
        let a = LayerId::intern("index_edge");
        index.insert(a, Aabb::new(0.0, 0.0, 64.0, 64.0));
        assert_eq!(index.query_point(Vec2::new(64.0, 64.0)), vec![a]);
        assert!(index.query_point(Vec2::new(64.5, 64.0)).is_empty());
    }

    #[test]
    fn negative_coordinates() {
        let mut index = SpatialIndex::new();
        let a = LayerId::intern("index_neg");
        index.insert(a, Aabb::new(-100.0, -100.0, -90.0, -90.0));
        assert_eq!(index.query_point(Vec2::new(-95.0, -95.0)), vec![a]);
    }

    #[test]
    fn oversized_boxes_skip_the_grid() {
        let mut index = SpatialIndex::new();
        let huge = LayerId::intern("index_huge");
        index.insert(huge, Aabb::new(-1e5, -1e5, 1e5, 1e5));
        assert!(index.cells.is_empty());
        assert_eq!(index.query_point(Vec2::new(3.0, 3.0)), vec![huge]);
        index.remove(huge);
        assert!(index.oversized.is_empty());
    }

    #[test]
    fn refresh_tracks_document() {
        let shape = Layer::shape(ShapeType::Rectangle).at(10.0, 10.0);
        let id = shape.id;
        let doc = DesignDocument::new(800.0, 600.0).add_layer(shape, None).unwrap();
        let mut index = SpatialIndex::from_document(&doc);
        assert_eq!(index.len(), 1);

        let removed = doc.remove_layer(id);
        index.refresh(&removed, id);
        assert!(index.is_empty());
    }
}
