//! Partial layer updates.
//!
//! A [`LayerPatch`] is a shallow merge: every `Some` field replaces the
//! layer's field wholesale (a new `transform` replaces the old one, it is
//! not deep-merged). Variant fields that don't apply to the target layer's
//! type are ignored.

use crate::geometry::{Transform, Vec2};
use crate::model::{Layer, LayerKind, Paragraph, PathCommand, ShapeType, TextStyle};
use crate::paint::{Effect, ImageFit, Paint, Rgba, Stroke};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayerPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeSet<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effects: Option<Vec<Effect>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<Transform>,

    // ── Text ──
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paragraphs: Option<Vec<Paragraph>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_style: Option<TextStyle>,

    // ── Shape / Path / Frame ──
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fills: Option<Vec<Paint>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strokes: Option<Vec<Stroke>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape_type: Option<ShapeType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corner_radius: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Vec<PathCommand>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clip: Option<bool>,

    // ── Image / Icon ──
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fit: Option<ImageFit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgba>,
}

impl LayerPatch {
    pub fn transform(transform: Transform) -> Self {
        Self {
            transform: Some(transform),
            ..Default::default()
        }
    }

    pub fn position(layer: &Layer, position: Vec2) -> Self {
        Self::transform(Transform {
            position,
            ..layer.transform
        })
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge this patch onto `layer`.
    pub fn apply(&self, layer: &mut Layer) {
        set(&mut layer.name, &self.name);
        set(&mut layer.visible, &self.visible);
        set(&mut layer.locked, &self.locked);
        set(&mut layer.opacity, &self.opacity);
        set(&mut layer.tags, &self.tags);
        set(&mut layer.effects, &self.effects);
        set(&mut layer.transform, &self.transform);

        match &mut layer.kind {
            LayerKind::Text {
                text,
                paragraphs,
                default_style,
            } => {
                set(text, &self.text);
                set(paragraphs, &self.paragraphs);
                set(default_style, &self.default_style);
            }
            LayerKind::Shape {
                shape_type,
                fills,
                strokes,
                corner_radius,
            } => {
                set(shape_type, &self.shape_type);
                set(fills, &self.fills);
                set(strokes, &self.strokes);
                set(corner_radius, &self.corner_radius);
            }
            LayerKind::Image { image_ref, fit } => {
                set(image_ref, &self.image_ref);
                set(fit, &self.fit);
            }
            LayerKind::Icon { icon_id, color } => {
                set(icon_id, &self.icon_id);
                set(color, &self.color);
            }
            LayerKind::Path {
                geometry,
                fills,
                strokes,
            } => {
                set(geometry, &self.geometry);
                set(fills, &self.fills);
                set(strokes, &self.strokes);
            }
            LayerKind::Frame { fills, clip, .. } => {
                set(fills, &self.fills);
                set(clip, &self.clip);
            }
            LayerKind::Group { .. } | LayerKind::BooleanGroup { .. } => {}
        }
    }

    /// The inverse patch: current values of exactly the fields this patch
    /// would overwrite on `layer`.
    #[must_use]
    pub fn capture(&self, layer: &Layer) -> LayerPatch {
        let mut out = LayerPatch {
            name: take(&self.name, &layer.name),
            visible: take(&self.visible, &layer.visible),
            locked: take(&self.locked, &layer.locked),
            opacity: take(&self.opacity, &layer.opacity),
            tags: take(&self.tags, &layer.tags),
            effects: take(&self.effects, &layer.effects),
            transform: take(&self.transform, &layer.transform),
            ..Default::default()
        };

        match &layer.kind {
            LayerKind::Text {
                text,
                paragraphs,
                default_style,
            } => {
                out.text = take(&self.text, text);
                out.paragraphs = take(&self.paragraphs, paragraphs);
                out.default_style = take(&self.default_style, default_style);
            }
            LayerKind::Shape {
                shape_type,
                fills,
                strokes,
                corner_radius,
            } => {
                out.shape_type = take(&self.shape_type, shape_type);
                out.fills = take(&self.fills, fills);
                out.strokes = take(&self.strokes, strokes);
                out.corner_radius = take(&self.corner_radius, corner_radius);
            }
            LayerKind::Image { image_ref, fit } => {
                out.image_ref = take(&self.image_ref, image_ref);
                out.fit = take(&self.fit, fit);
            }
            LayerKind::Icon { icon_id, color } => {
                out.icon_id = take(&self.icon_id, icon_id);
                out.color = take(&self.color, color);
            }
            LayerKind::Path {
                geometry,
                fills,
                strokes,
            } => {
                out.geometry = take(&self.geometry, geometry);
                out.fills = take(&self.fills, fills);
                out.strokes = take(&self.strokes, strokes);
            }
            LayerKind::Frame { fills, clip, .. } => {
                out.fills = take(&self.fills, fills);
                out.clip = take(&self.clip, clip);
            }
            LayerKind::Group { .. } | LayerKind::BooleanGroup { .. } => {}
        }
        out
    }
}

fn set<T: Clone>(dst: &mut T, src: &Option<T>) {
    if let Some(v) = src {
        *dst = v.clone();
    }
}

fn take<T: Clone, U>(field: &Option<U>, current: &T) -> Option<T> {
    field.as_ref().map(|_| current.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn transform_replaced_wholesale() {
        let mut layer = Layer::text("a").at(10.0, 10.0).rotated(30.0);
        let patch = LayerPatch::transform(Transform::new(0.0, 0.0, 50.0, 50.0));
        patch.apply(&mut layer);
        assert_eq!(layer.transform.rotation, 0.0);
        assert_eq!(layer.transform.size, Vec2::new(50.0, 50.0));
    }

    #[test]
    fn capture_then_apply_restores() {
        let original = Layer::text("before").named("Title").with_opacity(0.5);
        let patch = LayerPatch {
            text: Some("after".into()),
            opacity: Some(0.9),
            fills: Some(vec![]), // not applicable to text
            ..Default::default()
        };
        let inverse = patch.capture(&original);
        assert_eq!(inverse.fills, None);

        let mut edited = original.clone();
        patch.apply(&mut edited);
        assert_eq!(edited.text_content(), Some("after"));
        inverse.apply(&mut edited);
        assert_eq!(edited, original);
    }
}
