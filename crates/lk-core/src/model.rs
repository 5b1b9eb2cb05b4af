//! Layer data model.
//!
//! A document is an arena of [`Layer`] values keyed by [`LayerId`]. Tree
//! topology lives only in container `children` lists plus the weak
//! `parent_id` back-reference; layers never embed each other.

use crate::geometry::{Transform, Vec2};
use crate::id::LayerId;
use crate::paint::{Effect, ImageFit, Paint, Rgba, Stroke};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// ─── Text ────────────────────────────────────────────────────────────────

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextStyle {
    pub font_size: f64,
    pub font_weight: u16, // 100..900
    pub font_family: String,
    pub fill: Paint,
    pub line_height: f64,
    pub letter_spacing: f64,
    pub uppercase: bool,
    pub italic: bool,
    pub text_align: TextAlign,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: 16.0,
            font_weight: 400,
            font_family: "Inter".into(),
            fill: Paint::solid(Rgba::rgb(0x1A, 0x1A, 0x1A)),
            line_height: 1.2,
            letter_spacing: 0.0,
            uppercase: false,
            italic: false,
            text_align: TextAlign::Left,
        }
    }
}

impl TextStyle {
    pub fn is_bold(&self) -> bool {
        self.font_weight >= 600
    }
}

/// A run of text with an optional style override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paragraph {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<TextStyle>,
}

// ─── Shapes & paths ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShapeType {
    #[default]
    Rectangle,
    Ellipse,
    Triangle,
    Polygon,
    Star,
    Line,
}

/// A single path command (SVG-like but simplified).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "kebab-case")]
pub enum PathCommand {
    MoveTo { x: f64, y: f64 },
    LineTo { x: f64, y: f64 },
    QuadTo { cx: f64, cy: f64, x: f64, y: f64 },
    CubicTo { c1x: f64, c1y: f64, c2x: f64, c2y: f64, x: f64, y: f64 },
    Close,
}

/// Boolean operation recorded on a boolean group. Only the data shape is
/// modeled; the geometry is combined by the rasterizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BooleanOp {
    #[default]
    Union,
    Subtract,
    Intersect,
    Exclude,
}

// ─── Layer variants ──────────────────────────────────────────────────────

/// Variant-specific layer data. The serialized `type` tag is the layer
/// type discriminant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum LayerKind {
    #[serde(rename_all = "camelCase")]
    Text {
        text: String,
        #[serde(default)]
        paragraphs: Vec<Paragraph>,
        #[serde(default)]
        default_style: TextStyle,
    },
    #[serde(rename_all = "camelCase")]
    Shape {
        #[serde(default)]
        shape_type: ShapeType,
        #[serde(default)]
        fills: Vec<Paint>,
        #[serde(default)]
        strokes: Vec<Stroke>,
        #[serde(default)]
        corner_radius: f64,
    },
    #[serde(rename_all = "camelCase")]
    Image {
        image_ref: String,
        #[serde(default)]
        fit: ImageFit,
    },
    #[serde(rename_all = "camelCase")]
    Icon { icon_id: String, color: Rgba },
    Path {
        #[serde(default)]
        geometry: Vec<PathCommand>,
        #[serde(default)]
        fills: Vec<Paint>,
        #[serde(default)]
        strokes: Vec<Stroke>,
    },
    Frame {
        #[serde(default)]
        children: Vec<LayerId>,
        #[serde(default)]
        fills: Vec<Paint>,
        #[serde(default)]
        clip: bool,
    },
    Group {
        #[serde(default)]
        children: Vec<LayerId>,
    },
    BooleanGroup {
        #[serde(default)]
        children: Vec<LayerId>,
        #[serde(default)]
        operation: BooleanOp,
    },
}

/// Fieldless mirror of [`LayerKind`], used for targeting and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayerType {
    Text,
    Shape,
    Image,
    Icon,
    Path,
    Frame,
    Group,
    BooleanGroup,
}

impl LayerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayerType::Text => "text",
            LayerType::Shape => "shape",
            LayerType::Image => "image",
            LayerType::Icon => "icon",
            LayerType::Path => "path",
            LayerType::Frame => "frame",
            LayerType::Group => "group",
            LayerType::BooleanGroup => "boolean-group",
        }
    }
}

impl fmt::Display for LayerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Layer ───────────────────────────────────────────────────────────────

/// One visual element of the design tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    /// Weak back-reference to the owning container. `None` only for the root.
    #[serde(default)]
    pub parent_id: Option<LayerId>,
    #[serde(default = "yes")]
    pub visible: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default = "full_opacity")]
    pub opacity: f64,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub effects: Vec<Effect>,
    #[serde(default)]
    pub transform: Transform,
    #[serde(flatten)]
    pub kind: LayerKind,
}

fn yes() -> bool {
    true
}

fn full_opacity() -> f64 {
    1.0
}

impl Layer {
    /// Base constructor shared by every factory: fresh id, default fields.
    pub fn new(kind: LayerKind) -> Self {
        let layer_type = kind.layer_type();
        Self {
            id: LayerId::fresh(layer_type.as_str()),
            name: default_name(layer_type).into(),
            parent_id: None,
            visible: true,
            locked: false,
            opacity: 1.0,
            tags: BTreeSet::new(),
            effects: Vec::new(),
            transform: Transform::default(),
            kind,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        let mut layer = Self::new(LayerKind::Text {
            text: text.into(),
            paragraphs: Vec::new(),
            default_style: TextStyle::default(),
        });
        layer.transform = Transform::new(0.0, 0.0, 200.0, 24.0);
        layer
    }

    pub fn shape(shape_type: ShapeType) -> Self {
        Self::new(LayerKind::Shape {
            shape_type,
            fills: vec![Paint::solid(Rgba::rgb(0xD9, 0xD9, 0xD9))],
            strokes: Vec::new(),
            corner_radius: 0.0,
        })
    }

    pub fn image(image_ref: impl Into<String>) -> Self {
        Self::new(LayerKind::Image {
            image_ref: image_ref.into(),
            fit: ImageFit::Cover,
        })
    }

    pub fn icon(icon_id: impl Into<String>) -> Self {
        let mut layer = Self::new(LayerKind::Icon {
            icon_id: icon_id.into(),
            color: Rgba::rgb(0x1A, 0x1A, 0x1A),
        });
        layer.transform = Transform::new(0.0, 0.0, 24.0, 24.0);
        layer
    }

    pub fn path(geometry: Vec<PathCommand>) -> Self {
        Self::new(LayerKind::Path {
            geometry,
            fills: Vec::new(),
            strokes: vec![Stroke::default()],
        })
    }

    pub fn frame(width: f64, height: f64) -> Self {
        let mut layer = Self::new(LayerKind::Frame {
            children: Vec::new(),
            fills: vec![Paint::solid(Rgba::WHITE)],
            clip: true,
        });
        layer.transform = Transform::new(0.0, 0.0, width, height);
        layer
    }

    pub fn group() -> Self {
        Self::new(LayerKind::Group {
            children: Vec::new(),
        })
    }

    pub fn boolean_group(operation: BooleanOp) -> Self {
        Self::new(LayerKind::BooleanGroup {
            children: Vec::new(),
            operation,
        })
    }

    // ── Chainable overrides ──

    pub fn with_id(mut self, id: LayerId) -> Self {
        self.id = id;
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.transform.position = Vec2::new(x, y);
        self
    }

    pub fn sized(mut self, width: f64, height: f64) -> Self {
        self.transform.size = Vec2::new(width, height);
        self
    }

    pub fn rotated(mut self, degrees: f64) -> Self {
        self.transform.rotation = degrees;
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn tagged(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn locked(mut self) -> Self {
        self.locked = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Replace the text style (no-op for non-text layers).
    pub fn with_text_style(mut self, style: TextStyle) -> Self {
        if let LayerKind::Text { default_style, .. } = &mut self.kind {
            *default_style = style;
        }
        self
    }

    /// Replace the fills (no-op for layers without fills).
    pub fn with_fills(mut self, paints: Vec<Paint>) -> Self {
        if let Some(fills) = self.fills_mut() {
            *fills = paints;
        }
        self
    }

    // ── Accessors ──

    pub fn layer_type(&self) -> LayerType {
        self.kind.layer_type()
    }

    pub fn is_container(&self) -> bool {
        self.children().is_some()
    }

    pub fn children(&self) -> Option<&[LayerId]> {
        match &self.kind {
            LayerKind::Frame { children, .. }
            | LayerKind::Group { children }
            | LayerKind::BooleanGroup { children, .. } => Some(children),
            _ => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<LayerId>> {
        match &mut self.kind {
            LayerKind::Frame { children, .. }
            | LayerKind::Group { children }
            | LayerKind::BooleanGroup { children, .. } => Some(children),
            _ => None,
        }
    }

    pub fn fills(&self) -> Option<&[Paint]> {
        match &self.kind {
            LayerKind::Shape { fills, .. }
            | LayerKind::Path { fills, .. }
            | LayerKind::Frame { fills, .. } => Some(fills),
            _ => None,
        }
    }

    pub fn fills_mut(&mut self) -> Option<&mut Vec<Paint>> {
        match &mut self.kind {
            LayerKind::Shape { fills, .. }
            | LayerKind::Path { fills, .. }
            | LayerKind::Frame { fills, .. } => Some(fills),
            _ => None,
        }
    }

    pub fn text_style(&self) -> Option<&TextStyle> {
        match &self.kind {
            LayerKind::Text { default_style, .. } => Some(default_style),
            _ => None,
        }
    }

    pub fn text_content(&self) -> Option<&str> {
        match &self.kind {
            LayerKind::Text { text, .. } => Some(text),
            _ => None,
        }
    }

    /// The color a viewer perceives for this layer: text fill, icon color,
    /// or the first fill that has a representative color.
    pub fn primary_color(&self) -> Option<Rgba> {
        match &self.kind {
            LayerKind::Text { default_style, .. } => default_style.fill.representative_color(),
            LayerKind::Icon { color, .. } => Some(*color),
            _ => self
                .fills()?
                .iter()
                .find_map(Paint::representative_color),
        }
    }
}

impl LayerKind {
    pub fn layer_type(&self) -> LayerType {
        match self {
            LayerKind::Text { .. } => LayerType::Text,
            LayerKind::Shape { .. } => LayerType::Shape,
            LayerKind::Image { .. } => LayerType::Image,
            LayerKind::Icon { .. } => LayerType::Icon,
            LayerKind::Path { .. } => LayerType::Path,
            LayerKind::Frame { .. } => LayerType::Frame,
            LayerKind::Group { .. } => LayerType::Group,
            LayerKind::BooleanGroup { .. } => LayerType::BooleanGroup,
        }
    }
}

fn default_name(layer_type: LayerType) -> &'static str {
    match layer_type {
        LayerType::Text => "Text",
        LayerType::Shape => "Shape",
        LayerType::Image => "Image",
        LayerType::Icon => "Icon",
        LayerType::Path => "Path",
        LayerType::Frame => "Frame",
        LayerType::Group => "Group",
        LayerType::BooleanGroup => "Boolean Group",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factories_assign_fresh_ids() {
        let a = Layer::text("Hello");
        let b = Layer::text("Hello");
        assert_ne!(a.id, b.id);
        assert!(a.id.as_str().starts_with("text_"));
        assert_eq!(a.layer_type(), LayerType::Text);
    }

    #[test]
    fn containers_expose_children() {
        assert!(Layer::group().is_container());
        assert!(Layer::frame(10.0, 10.0).is_container());
        assert!(!Layer::shape(ShapeType::Ellipse).is_container());
    }

    #[test]
    fn layer_json_is_flat_with_type_tag() {
        let layer = Layer::text("Hi").with_id(LayerId::intern("json_text"));
        let value = serde_json::to_value(&layer).unwrap();
        assert_eq!(value["type"], "text");
        assert_eq!(value["defaultStyle"]["fontSize"], 16.0);
        assert_eq!(value["transform"]["size"]["x"], 200.0);

        let back: Layer = serde_json::from_value(value).unwrap();
        assert_eq!(back, layer);
    }
}
