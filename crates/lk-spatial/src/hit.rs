//! Hit testing: point → layer lookup, handle lookup, and marquee queries.
//!
//! Walks the layer tree front-to-back (index 0 = topmost) to find which
//! layer is at a given world position. Containment is exact for rotated
//! layers: the query point is mapped into the layer's local frame first.

use lk_core::{Aabb, DesignDocument, Layer, LayerId, Transform, Vec2};
use serde::{Deserialize, Serialize};

/// Pick distance around a handle, in world units.
pub const HANDLE_THRESHOLD: f64 = 8.0;

/// Distance of the rotation handle above the top edge.
pub const ROTATION_HANDLE_OFFSET: f64 = 24.0;

// ─── Point hit ───────────────────────────────────────────────────────────

/// Find the topmost layer at `point`. Returns `None` on empty canvas.
///
/// Invisible layers hide their whole subtree; locked layers are skipped
/// themselves but their children stay hittable. The root frame is never
/// reported.
pub fn hit_test_document(doc: &DesignDocument, point: Vec2) -> Option<LayerId> {
    hit_test_layer(doc, doc.root_id(), point)
}

fn hit_test_layer(doc: &DesignDocument, id: LayerId, point: Vec2) -> Option<LayerId> {
    let layer = doc.get(id)?;
    if !layer.visible {
        return None;
    }

    // Children first: a child drawn over its own container wins.
    for &child in doc.children_of(id) {
        if let Some(hit) = hit_test_layer(doc, child, point) {
            return Some(hit);
        }
    }

    if id == doc.root_id() || layer.locked {
        return None;
    }
    if layer.transform.contains_point(point) {
        log::trace!("hit {id} at ({}, {})", point.x, point.y);
        return Some(id);
    }
    None
}

// ─── Marquee ─────────────────────────────────────────────────────────────

/// All visible, unlocked, non-root layers whose world AABB overlaps `rect`
/// (inclusive), in layer order. Used for marquee selection.
pub fn hit_test_rect(doc: &DesignDocument, rect: &Aabb) -> Vec<LayerId> {
    let mut out = Vec::new();
    collect_intersecting(doc, doc.root_id(), rect, &mut out);
    out
}

fn collect_intersecting(doc: &DesignDocument, id: LayerId, rect: &Aabb, out: &mut Vec<LayerId>) {
    let Some(layer) = doc.get(id) else {
        return;
    };
    if !layer.visible {
        return;
    }
    if id != doc.root_id() && !layer.locked && layer.transform.world_aabb().intersects(rect) {
        out.push(id);
    }
    for &child in doc.children_of(id) {
        collect_intersecting(doc, child, rect, out);
    }
}

// ─── Handles ─────────────────────────────────────────────────────────────

/// Resize handles (compass points) plus the rotation handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Handle {
    Nw,
    N,
    Ne,
    E,
    Se,
    S,
    Sw,
    W,
    Rotate,
}

impl Handle {
    pub const ALL: [Handle; 9] = [
        Handle::Nw,
        Handle::N,
        Handle::Ne,
        Handle::E,
        Handle::Se,
        Handle::S,
        Handle::Sw,
        Handle::W,
        Handle::Rotate,
    ];

    /// Position as a fraction of the layer box (rotation handle excluded).
    fn fraction(self) -> (f64, f64) {
        match self {
            Handle::Nw => (0.0, 0.0),
            Handle::N | Handle::Rotate => (0.5, 0.0),
            Handle::Ne => (1.0, 0.0),
            Handle::E => (1.0, 0.5),
            Handle::Se => (1.0, 1.0),
            Handle::S => (0.5, 1.0),
            Handle::Sw => (0.0, 1.0),
            Handle::W => (0.0, 0.5),
        }
    }

    pub fn moves_left(self) -> bool {
        matches!(self, Handle::Nw | Handle::W | Handle::Sw)
    }

    pub fn moves_right(self) -> bool {
        matches!(self, Handle::Ne | Handle::E | Handle::Se)
    }

    pub fn moves_top(self) -> bool {
        matches!(self, Handle::Nw | Handle::N | Handle::Ne)
    }

    pub fn moves_bottom(self) -> bool {
        matches!(self, Handle::Sw | Handle::S | Handle::Se)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandleHit {
    pub layer_id: LayerId,
    pub handle: Handle,
}

/// World positions of every handle of `transform`, rotated about its pivot.
pub fn handle_positions(transform: &Transform) -> [(Handle, Vec2); 9] {
    let pivot = transform.pivot_point();
    Handle::ALL.map(|handle| {
        let (fx, fy) = handle.fraction();
        let mut local = Vec2::new(
            transform.position.x + transform.size.x * fx,
            transform.position.y + transform.size.y * fy,
        );
        if handle == Handle::Rotate {
            local.y -= ROTATION_HANDLE_OFFSET;
        }
        (handle, local.rotate_about(pivot, transform.rotation))
    })
}

/// Find the selected layer's handle under `point`, within
/// [`HANDLE_THRESHOLD`]. The closest handle wins; ties go to the earlier
/// selected layer.
pub fn hit_test_handles(doc: &DesignDocument, point: Vec2) -> Option<HandleHit> {
    hit_test_handles_within(doc, point, HANDLE_THRESHOLD)
}

pub fn hit_test_handles_within(doc: &DesignDocument, point: Vec2, threshold: f64) -> Option<HandleHit> {
    let mut best: Option<(f64, HandleHit)> = None;
    for &id in &doc.selection().ids {
        let Some(layer) = doc.get(id).filter(|l| is_manipulable(doc, l)) else {
            continue;
        };
        for (handle, pos) in handle_positions(&layer.transform) {
            let d = pos.distance(point);
            if d <= threshold && best.is_none_or(|(bd, _)| d < bd) {
                best = Some((d, HandleHit { layer_id: id, handle }));
            }
        }
    }
    best.map(|(_, hit)| hit)
}

fn is_manipulable(doc: &DesignDocument, layer: &Layer) -> bool {
    layer.id != doc.root_id() && layer.visible && !layer.locked
}
