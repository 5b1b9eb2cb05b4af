//! Smart snapping: edge/center alignment against the canvas and sibling
//! layers, with grid snapping as a per-axis fallback.
//!
//! Snap targets are gathered per axis as reference lines. Each candidate
//! point of the moving box (left/center/right, top/center/bottom) is
//! matched against them independently on each axis.

use crate::hit::Handle;
use lk_core::{Aabb, DesignDocument, LayerId, Transform, Vec2};
use serde::{Deserialize, Serialize};

/// Overhang of a guide line past the boxes it connects.
pub const GUIDE_OVERHANG: f64 = 10.0;

const EPSILON: f64 = 1e-6;

// ─── Config ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapConfig {
    /// Maximum snap distance in world units.
    pub tolerance: f64,
    /// Grid spacing; `None` disables grid snapping.
    pub grid_size: Option<f64>,
    pub snap_to_objects: bool,
    pub snap_to_canvas: bool,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            tolerance: 5.0,
            grid_size: None,
            snap_to_objects: true,
            snap_to_canvas: true,
        }
    }
}

// ─── Results ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuideOrientation {
    /// A vertical line at `position` on the x axis.
    Vertical,
    /// A horizontal line at `position` on the y axis.
    Horizontal,
}

/// A visual alignment guide. `start..end` runs along the line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Guide {
    pub orientation: GuideOrientation,
    pub position: f64,
    pub start: f64,
    pub end: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SnapResult {
    pub snapped_x: f64,
    pub snapped_y: f64,
    pub did_snap_x: bool,
    pub did_snap_y: bool,
    pub guides: Vec<Guide>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResizeSnapResult {
    pub transform: Transform,
    pub did_snap_x: bool,
    pub did_snap_y: bool,
    pub guides: Vec<Guide>,
}

// ─── Reference lines ─────────────────────────────────────────────────────

/// One snap target on one axis, with the span its owner covers on the
/// other axis (for guide extents).
#[derive(Debug, Clone, Copy)]
struct Reference {
    value: f64,
    span: (f64, f64),
}

#[derive(Debug, Default)]
struct References {
    x: Vec<Reference>,
    y: Vec<Reference>,
}

impl References {
    fn push_box(&mut self, b: &Aabb) {
        let c = b.center();
        for value in [b.min_x, c.x, b.max_x] {
            self.x.push(Reference {
                value,
                span: (b.min_y, b.max_y),
            });
        }
        for value in [b.min_y, c.y, b.max_y] {
            self.y.push(Reference {
                value,
                span: (b.min_x, b.max_x),
            });
        }
    }
}

/// Canvas edges and centers first, then every visible, unlocked sibling of
/// `moving` in z-order.
fn gather_references(doc: &DesignDocument, moving: LayerId, config: &SnapConfig) -> References {
    let mut refs = References::default();
    if config.snap_to_canvas {
        refs.push_box(&doc.canvas_bounds());
    }
    if config.snap_to_objects
        && let Some(parent) = doc.parent_of(moving)
    {
        for &sibling in doc.children_of(parent) {
            if sibling == moving {
                continue;
            }
            if let Some(layer) = doc.get(sibling).filter(|l| l.visible && !l.locked) {
                refs.push_box(&layer.transform.world_aabb());
            }
        }
    }
    refs
}

/// Nearest reference to any candidate within `tolerance`. Returns the
/// signed delta to apply. References are walked in order and compared
/// strictly, so on a tie the lower reference index wins.
fn nearest(candidates: &[f64], refs: &[Reference], tolerance: f64) -> Option<f64> {
    let mut best: Option<f64> = None;
    for r in refs {
        for &candidate in candidates {
            let delta = r.value - candidate;
            if delta.abs() <= tolerance && best.is_none_or(|b| delta.abs() < b.abs()) {
                best = Some(delta);
            }
        }
    }
    best
}

fn grid_delta(value: f64, config: &SnapConfig) -> Option<f64> {
    let grid = config.grid_size.filter(|g| *g > 0.0)?;
    let delta = (value / grid).round() * grid - value;
    (delta.abs() <= config.tolerance).then_some(delta)
}

/// One guide per reference line that coincides with a snapped candidate,
/// spanning the moving box and the reference owner plus the overhang.
/// References sharing a line are merged.
fn guides_for(
    orientation: GuideOrientation,
    snapped: &[f64],
    refs: &[Reference],
    moving_span: (f64, f64),
    out: &mut Vec<Guide>,
) {
    for r in refs {
        if !snapped.iter().any(|c| (c - r.value).abs() < EPSILON) {
            continue;
        }
        let start = moving_span.0.min(r.span.0) - GUIDE_OVERHANG;
        let end = moving_span.1.max(r.span.1) + GUIDE_OVERHANG;
        match out
            .iter_mut()
            .find(|g| g.orientation == orientation && (g.position - r.value).abs() < EPSILON)
        {
            Some(existing) => {
                existing.start = existing.start.min(start);
                existing.end = existing.end.max(end);
            }
            None => out.push(Guide {
                orientation,
                position: r.value,
                start,
                end,
            }),
        }
    }
}

// ─── Move snapping ───────────────────────────────────────────────────────

/// Snap layer `moving_id` proposed at top-left `(proposed_x, proposed_y)`.
/// Unknown layers come back unsnapped.
pub fn snap_layer(
    doc: &DesignDocument,
    moving_id: LayerId,
    proposed_x: f64,
    proposed_y: f64,
    config: &SnapConfig,
) -> SnapResult {
    let mut result = SnapResult {
        snapped_x: proposed_x,
        snapped_y: proposed_y,
        ..Default::default()
    };
    let Some(layer) = doc.get(moving_id) else {
        return result;
    };

    let proposed = Transform {
        position: Vec2::new(proposed_x, proposed_y),
        ..layer.transform
    };
    let b = proposed.world_aabb();
    let c = b.center();
    let xs = [b.min_x, c.x, b.max_x];
    let ys = [b.min_y, c.y, b.max_y];
    let refs = gather_references(doc, moving_id, config);

    let dx = nearest(&xs, &refs.x, config.tolerance);
    let dy = nearest(&ys, &refs.y, config.tolerance);

    if let Some(d) = dx {
        result.snapped_x += d;
        result.did_snap_x = true;
    } else if let Some(d) = grid_delta(proposed_x, config) {
        result.snapped_x += d;
        result.did_snap_x = true;
    }
    if let Some(d) = dy {
        result.snapped_y += d;
        result.did_snap_y = true;
    } else if let Some(d) = grid_delta(proposed_y, config) {
        result.snapped_y += d;
        result.did_snap_y = true;
    }

    // Guides only for object/canvas snaps, measured on the final box.
    let shift_x = result.snapped_x - proposed_x;
    let shift_y = result.snapped_y - proposed_y;
    let span_x = (b.min_x + shift_x, b.max_x + shift_x);
    let span_y = (b.min_y + shift_y, b.max_y + shift_y);
    if dx.is_some() {
        let snapped = xs.map(|v| v + shift_x);
        guides_for(GuideOrientation::Vertical, &snapped, &refs.x, span_y, &mut result.guides);
    }
    if dy.is_some() {
        let snapped = ys.map(|v| v + shift_y);
        guides_for(GuideOrientation::Horizontal, &snapped, &refs.y, span_x, &mut result.guides);
    }

    log::trace!(
        "snap {moving_id}: ({proposed_x}, {proposed_y}) -> ({}, {})",
        result.snapped_x,
        result.snapped_y
    );
    result
}

// ─── Resize snapping ─────────────────────────────────────────────────────

/// Snap the edges a resize `handle` drags. West/north edges shift the
/// position and shrink the size so the opposite edge stays anchored.
/// Rotated layers are returned unsnapped.
pub fn snap_resize(
    doc: &DesignDocument,
    layer_id: LayerId,
    handle: Handle,
    proposed: Transform,
    config: &SnapConfig,
) -> ResizeSnapResult {
    let mut result = ResizeSnapResult {
        transform: proposed,
        did_snap_x: false,
        did_snap_y: false,
        guides: Vec::new(),
    };
    if proposed.is_rotated() || handle == Handle::Rotate || !doc.contains(layer_id) {
        return result;
    }

    let refs = gather_references(doc, layer_id, config);
    let b = proposed.aabb();
    let t = &mut result.transform;

    // (edge value, moves position?) for the active horizontal edge.
    let x_edge = if handle.moves_left() {
        Some((b.min_x, true))
    } else if handle.moves_right() {
        Some((b.max_x, false))
    } else {
        None
    };
    let y_edge = if handle.moves_top() {
        Some((b.min_y, true))
    } else if handle.moves_bottom() {
        Some((b.max_y, false))
    } else {
        None
    };

    let mut object_x = None;
    let mut object_y = None;
    if let Some((edge, leading)) = x_edge {
        let object = nearest(&[edge], &refs.x, config.tolerance);
        if let Some(d) = object.or_else(|| grid_delta(edge, config))
            && apply_edge(&mut t.position.x, &mut t.size.x, d, leading)
        {
            result.did_snap_x = true;
            object_x = object.map(|d| edge + d);
        }
    }
    if let Some((edge, leading)) = y_edge {
        let object = nearest(&[edge], &refs.y, config.tolerance);
        if let Some(d) = object.or_else(|| grid_delta(edge, config))
            && apply_edge(&mut t.position.y, &mut t.size.y, d, leading)
        {
            result.did_snap_y = true;
            object_y = object.map(|d| edge + d);
        }
    }

    let fin = result.transform.aabb();
    if let Some(line) = object_x {
        guides_for(GuideOrientation::Vertical, &[line], &refs.x, (fin.min_y, fin.max_y), &mut result.guides);
    }
    if let Some(line) = object_y {
        guides_for(GuideOrientation::Horizontal, &[line], &refs.y, (fin.min_x, fin.max_x), &mut result.guides);
    }
    result
}

/// Move one edge by `delta`. A leading (west/north) edge moves the position
/// and shrinks the size by the same amount. Refuses snaps that would
/// collapse the box below one unit.
fn apply_edge(position: &mut f64, size: &mut f64, delta: f64, leading: bool) -> bool {
    let new_size = if leading { *size - delta } else { *size + delta };
    if new_size < 1.0 {
        return false;
    }
    if leading {
        *position += delta;
    }
    *size = new_size;
    true
}
