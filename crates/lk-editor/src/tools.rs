//! Select tool: turns pointer events into selection changes and coalesced
//! move / resize / rotate commands.
//!
//! ## Pointer-down priority
//!
//! 1. A handle of the current selection starts a resize or rotate.
//! 2. A layer hit changes the selection (Shift toggles) and arms a move.
//! 3. Empty space starts a marquee.
//!
//! Nothing is emitted for a pressed pointer until it has travelled
//! `drag_threshold`; before that, and while hovering, only cursor hints
//! change.

use crate::commands::Command;
use crate::config::EditorConfig;
use crate::input::{InputEvent, Modifiers};
use lk_core::{Aabb, DesignDocument, LayerId, Transform, Vec2};
use lk_spatial::{Guide, Handle, SpatialIndex, hit_test_document, hit_test_handles, snap_layer, snap_resize};
use std::collections::HashSet;

/// Pointer cursor the host should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorHint {
    #[default]
    Default,
    Move,
    Resize(Handle),
    Rotate,
    Crosshair,
}

/// What the tool asks its host to do.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolAction {
    /// Replace the selection (not an undoable edit).
    Select {
        ids: Vec<LayerId>,
        primary: Option<LayerId>,
    },
    Execute(Command),
    Cursor(CursorHint),
    /// Marquee rectangle to draw, or `None` to clear it.
    Marquee(Option<Aabb>),
    /// Snap guides to draw; empty clears them.
    Guides(Vec<Guide>),
}

/// Read-only state a tool sees while handling an event.
pub struct ToolContext<'a> {
    pub doc: &'a DesignDocument,
    pub index: &'a SpatialIndex,
    pub config: &'a EditorConfig,
}

/// What a press turns into once it passes the drag threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Armed {
    Move,
    Resize { layer_id: LayerId, handle: Handle },
    Rotate { layer_id: LayerId },
}

#[derive(Debug, Clone, PartialEq)]
enum Gesture {
    Idle,
    Pressed { origin: Vec2, armed: Armed },
    Moving {
        origin: Vec2,
        primary: LayerId,
        primary_start: Vec2,
        key: String,
    },
    Resizing {
        origin: Vec2,
        layer_id: LayerId,
        handle: Handle,
        start: Transform,
        key: String,
    },
    Rotating {
        layer_id: LayerId,
        pivot: Vec2,
        start_angle: f64,
        start_rotation: f64,
        key: String,
    },
    Marquee { origin: Vec2, current: Vec2, additive: bool },
}

// ─── Select Tool ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SelectTool {
    gesture: Gesture,
    /// Distinguishes coalesce keys of successive gestures.
    gesture_count: u64,
    cursor: CursorHint,
}

impl Default for SelectTool {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectTool {
    pub fn new() -> Self {
        Self {
            gesture: Gesture::Idle,
            gesture_count: 0,
            cursor: CursorHint::Default,
        }
    }

    pub fn cursor(&self) -> CursorHint {
        self.cursor
    }

    pub fn is_idle(&self) -> bool {
        self.gesture == Gesture::Idle
    }

    /// Current marquee rectangle, while one is being dragged.
    pub fn marquee(&self) -> Option<Aabb> {
        match &self.gesture {
            Gesture::Marquee { origin, current, .. } => Some(Aabb::from_corners(*origin, *current)),
            _ => None,
        }
    }

    /// Abandon any gesture in progress.
    pub fn cancel(&mut self) {
        self.gesture = Gesture::Idle;
    }

    pub fn handle(&mut self, event: &InputEvent, ctx: &ToolContext<'_>) -> Vec<ToolAction> {
        match event {
            InputEvent::PointerDown { position, modifiers } => self.pointer_down(*position, *modifiers, ctx),
            InputEvent::PointerMove { position, modifiers } => self.pointer_move(*position, *modifiers, ctx),
            InputEvent::PointerUp { position, .. } => self.pointer_up(*position, ctx),
            InputEvent::Key { .. } => vec![],
        }
    }

    fn pointer_down(&mut self, p: Vec2, modifiers: Modifiers, ctx: &ToolContext<'_>) -> Vec<ToolAction> {
        let doc = ctx.doc;

        if let Some(hit) = hit_test_handles(doc, p) {
            let armed = if hit.handle == Handle::Rotate {
                Armed::Rotate { layer_id: hit.layer_id }
            } else {
                Armed::Resize {
                    layer_id: hit.layer_id,
                    handle: hit.handle,
                }
            };
            self.gesture = Gesture::Pressed { origin: p, armed };
            return vec![];
        }

        if let Some(hit_id) = hit_test_document(doc, p) {
            let mut selected: Vec<LayerId> = doc.selection().ids.to_vec();
            let mut primary = doc.selection().primary_id;
            if modifiers.shift {
                // Shift+click: toggle in/out of selection
                if let Some(pos) = selected.iter().position(|id| *id == hit_id) {
                    selected.remove(pos);
                } else {
                    selected.push(hit_id);
                    primary = Some(hit_id);
                }
            } else if !selected.contains(&hit_id) {
                // Click on unselected layer: replace selection
                selected = vec![hit_id];
                primary = Some(hit_id);
            }
            // Clicking an already-selected layer keeps the selection for drag.

            let mut actions = Vec::new();
            if selected.as_slice() != doc.selection().ids.as_slice() {
                actions.push(ToolAction::Select {
                    ids: selected.clone(),
                    primary,
                });
            }
            if !selected.is_empty() {
                self.gesture = Gesture::Pressed {
                    origin: p,
                    armed: Armed::Move,
                };
            }
            return actions;
        }

        // Empty space: start marquee
        self.gesture = Gesture::Marquee {
            origin: p,
            current: p,
            additive: modifiers.shift,
        };
        self.set_cursor(CursorHint::Crosshair)
            .into_iter()
            .chain(if modifiers.shift || doc.selection().is_empty() {
                None
            } else {
                Some(ToolAction::Select {
                    ids: vec![],
                    primary: None,
                })
            })
            .collect()
    }

    fn pointer_move(&mut self, p: Vec2, modifiers: Modifiers, ctx: &ToolContext<'_>) -> Vec<ToolAction> {
        match self.gesture.clone() {
            Gesture::Idle => self.hover(p, ctx),
            Gesture::Pressed { origin, armed } => {
                if p.distance(origin) < ctx.config.drag_threshold {
                    return vec![];
                }
                self.start_drag(origin, armed, ctx);
                self.pointer_move(p, modifiers, ctx)
            }
            Gesture::Moving {
                origin,
                primary,
                primary_start,
                key,
            } => self.drag_move(p, origin, primary, primary_start, &key, modifiers, ctx),
            Gesture::Resizing {
                origin,
                layer_id,
                handle,
                start,
                key,
            } => drag_resize(p, origin, layer_id, handle, start, &key, ctx),
            Gesture::Rotating {
                layer_id,
                pivot,
                start_angle,
                start_rotation,
                key,
            } => {
                let angle = pointer_angle(pivot, p);
                let raw = start_rotation + (angle - start_angle);
                let degrees = snap_rotation(raw, modifiers, ctx.config);
                vec![ToolAction::Execute(
                    Command::rotate(ctx.doc, layer_id, degrees).with_coalesce_key(key),
                )]
            }
            Gesture::Marquee { origin, additive, .. } => {
                self.gesture = Gesture::Marquee {
                    origin,
                    current: p,
                    additive,
                };
                vec![ToolAction::Marquee(Some(Aabb::from_corners(origin, p)))]
            }
        }
    }

    fn pointer_up(&mut self, p: Vec2, ctx: &ToolContext<'_>) -> Vec<ToolAction> {
        let gesture = std::mem::replace(&mut self.gesture, Gesture::Idle);
        let mut actions = Vec::new();
        if matches!(gesture, Gesture::Moving { .. } | Gesture::Resizing { .. }) {
            actions.push(ToolAction::Guides(vec![]));
        }
        if let Gesture::Marquee { origin, additive, .. } = gesture {
            let rect = Aabb::from_corners(origin, p);
            let mut ids = if additive {
                ctx.doc.selection().ids.to_vec()
            } else {
                Vec::new()
            };
            for id in marquee_hits(ctx, &rect) {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
            let primary = ids.first().copied();
            actions.push(ToolAction::Marquee(None));
            actions.push(ToolAction::Select { ids, primary });
        }
        actions.extend(self.hover(p, ctx));
        actions
    }

    fn start_drag(&mut self, origin: Vec2, armed: Armed, ctx: &ToolContext<'_>) {
        self.gesture_count += 1;
        let n = self.gesture_count;
        let doc = ctx.doc;
        self.gesture = match armed {
            Armed::Move => {
                let primary = doc.selection().primary_id.or_else(|| doc.selection().ids.first().copied());
                match primary.and_then(|id| doc.get(id)) {
                    Some(layer) => Gesture::Moving {
                        origin,
                        primary: layer.id,
                        primary_start: layer.transform.position,
                        key: format!("move-{n}"),
                    },
                    None => Gesture::Idle,
                }
            }
            Armed::Resize { layer_id, handle } => match doc.get(layer_id) {
                Some(layer) => Gesture::Resizing {
                    origin,
                    layer_id,
                    handle,
                    start: layer.transform,
                    key: format!("resize-{n}"),
                },
                None => Gesture::Idle,
            },
            Armed::Rotate { layer_id } => match doc.get(layer_id) {
                Some(layer) => {
                    let pivot = layer.transform.pivot_point();
                    Gesture::Rotating {
                        layer_id,
                        pivot,
                        start_angle: pointer_angle(pivot, origin),
                        start_rotation: layer.transform.rotation,
                        key: format!("rotate-{n}"),
                    }
                }
                None => Gesture::Idle,
            },
        };
        log::trace!("drag started: {:?}", self.gesture);
    }

    #[allow(clippy::too_many_arguments)]
    fn drag_move(
        &mut self,
        p: Vec2,
        origin: Vec2,
        primary: LayerId,
        primary_start: Vec2,
        key: &str,
        modifiers: Modifiers,
        ctx: &ToolContext<'_>,
    ) -> Vec<ToolAction> {
        let doc = ctx.doc;
        let Some(current) = doc.get(primary).map(|l| l.transform.position) else {
            self.gesture = Gesture::Idle;
            return vec![];
        };
        let mut total = p - origin;
        // Shift: constrain to dominant axis
        if modifiers.shift {
            if total.x.abs() > total.y.abs() {
                total.y = 0.0;
            } else {
                total.x = 0.0;
            }
        }
        let proposed = primary_start + total;
        let snapped = snap_layer(doc, primary, proposed.x, proposed.y, &ctx.config.snap);
        let delta = Vec2::new(snapped.snapped_x, snapped.snapped_y) - current;

        let ids: Vec<LayerId> = doc.selection().ids.to_vec();
        let mut actions = vec![
            ToolAction::Cursor(CursorHint::Move),
            ToolAction::Guides(snapped.guides),
        ];
        self.cursor = CursorHint::Move;
        let command = Command::move_layers(doc, &ids, delta);
        if !command.is_noop() {
            actions.push(ToolAction::Execute(command.with_coalesce_key(key)));
        }
        actions
    }

    /// Cursor feedback while no button is held.
    fn hover(&mut self, p: Vec2, ctx: &ToolContext<'_>) -> Vec<ToolAction> {
        let hint = match hit_test_handles(ctx.doc, p) {
            Some(hit) if hit.handle == Handle::Rotate => CursorHint::Rotate,
            Some(hit) => CursorHint::Resize(hit.handle),
            None if hit_test_document(ctx.doc, p).is_some() => CursorHint::Move,
            None => CursorHint::Default,
        };
        self.set_cursor(hint).into_iter().collect()
    }

    fn set_cursor(&mut self, hint: CursorHint) -> Option<ToolAction> {
        if self.cursor == hint {
            return None;
        }
        self.cursor = hint;
        Some(ToolAction::Cursor(hint))
    }
}

// ─── Gesture math ────────────────────────────────────────────────────────

fn drag_resize(
    p: Vec2,
    origin: Vec2,
    layer_id: LayerId,
    handle: Handle,
    start: Transform,
    key: &str,
    ctx: &ToolContext<'_>,
) -> Vec<ToolAction> {
    // Pointer travel in the layer's unrotated frame.
    let d = (p - origin).rotate_about(Vec2::ZERO, -start.rotation);
    let mut t = start;
    let (left, top) = (start.position.x, start.position.y);
    let (right, bottom) = (left + start.size.x, top + start.size.y);

    if handle.moves_left() {
        let x = (left + d.x).min(right - 1.0);
        t.position.x = x;
        t.size.x = right - x;
    } else if handle.moves_right() {
        t.size.x = (start.size.x + d.x).max(1.0);
    }
    if handle.moves_top() {
        let y = (top + d.y).min(bottom - 1.0);
        t.position.y = y;
        t.size.y = bottom - y;
    } else if handle.moves_bottom() {
        t.size.y = (start.size.y + d.y).max(1.0);
    }

    let snapped = snap_resize(ctx.doc, layer_id, handle, t, &ctx.config.snap);
    vec![
        ToolAction::Cursor(CursorHint::Resize(handle)),
        ToolAction::Guides(snapped.guides),
        ToolAction::Execute(Command::resize(ctx.doc, layer_id, snapped.transform).with_coalesce_key(key)),
    ]
}

/// Angle of `p` around `pivot`, in degrees.
fn pointer_angle(pivot: Vec2, p: Vec2) -> f64 {
    (p.y - pivot.y).atan2(p.x - pivot.x).to_degrees()
}

/// Normalize to [-180, 180) and snap to the configured increment when
/// within tolerance. Shift forces the snap.
pub fn snap_rotation(degrees: f64, modifiers: Modifiers, config: &EditorConfig) -> f64 {
    let normalized = (degrees + 180.0).rem_euclid(360.0) - 180.0;
    let step = config.rotation_step;
    if step <= 0.0 {
        return normalized;
    }
    let nearest = (normalized / step).round() * step;
    if modifiers.shift || (nearest - normalized).abs() <= config.rotation_tolerance {
        nearest
    } else {
        normalized
    }
}

/// Selectable layers overlapping `rect`, in layer order.
fn marquee_hits(ctx: &ToolContext<'_>, rect: &Aabb) -> Vec<LayerId> {
    let doc = ctx.doc;
    let candidates: HashSet<LayerId> = ctx
        .index
        .query_rect(rect)
        .into_iter()
        .filter(|id| is_selectable(doc, *id))
        .collect();
    if candidates.is_empty() {
        return Vec::new();
    }
    doc.layer_order()
        .into_iter()
        .map(|l| l.id)
        .filter(|id| candidates.contains(id))
        .collect()
}

/// Visible, unlocked, non-root, with every ancestor visible.
pub fn is_selectable(doc: &DesignDocument, id: LayerId) -> bool {
    if id == doc.root_id() {
        return false;
    }
    let Some(layer) = doc.get(id) else {
        return false;
    };
    if !layer.visible || layer.locked {
        return false;
    }
    let mut parent = layer.parent_id;
    while let Some(pid) = parent {
        match doc.get(pid) {
            Some(p) if p.visible => parent = p.parent_id,
            _ => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn rotation_snaps_within_tolerance() {
        let config = EditorConfig::default();
        assert_eq!(snap_rotation(43.0, Modifiers::NONE, &config), 45.0);
        assert_eq!(snap_rotation(40.0, Modifiers::NONE, &config), 40.0);
        assert_eq!(snap_rotation(40.0, Modifiers::shift(), &config), 45.0);
        assert_eq!(snap_rotation(358.0, Modifiers::NONE, &config), 0.0);
        assert_eq!(snap_rotation(190.0, Modifiers::NONE, &config), -170.0);
    }

    #[test]
    fn pointer_angle_is_screen_oriented() {
        let pivot = Vec2::new(0.0, 0.0);
        assert_eq!(pointer_angle(pivot, Vec2::new(10.0, 0.0)), 0.0);
        assert_eq!(pointer_angle(pivot, Vec2::new(0.0, 10.0)), 90.0);
    }
}
