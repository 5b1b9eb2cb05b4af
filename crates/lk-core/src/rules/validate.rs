//! Whole-document design validation.
//!
//! Reports readability, layout, and balance issues without modifying the
//! document. Findings are advisory: callers surface them or feed them into
//! a follow-up corrective edit.

use super::color::{contrast_ratio, readable_color, relative_luminance, WCAG_AA, WCAG_AA_LARGE};
use super::{mm_to_px, pt_to_px, MIN_PRINT_FONT_SIZE_PT, MIN_SCREEN_FONT_SIZE, PRINT_DPI};
use crate::document::DesignDocument;
use crate::geometry::Aabb;
use crate::id::LayerId;
use crate::model::{Layer, LayerKind};
use crate::paint::{Paint, Rgba};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Share of total visual weight one side may carry before it is flagged.
pub const BALANCE_THRESHOLD: f64 = 0.6;

/// Print safe-area inset in millimetres.
pub const SAFE_AREA_MM: f64 = 3.0;

// ─── Violation types ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// A single finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    /// Short rule identifier (e.g. "text-contrast", "safe-area").
    pub rule: &'static str,
    pub severity: Severity,
    pub message: String,
    pub layer_id: Option<LayerId>,
    pub suggestion: Option<String>,
}

/// Canvas parameters the rules are evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidationContext {
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub dpi: f64,
    /// Fallback background when nothing solid sits behind a layer.
    pub background: Rgba,
}

impl Default for ValidationContext {
    fn default() -> Self {
        Self {
            canvas_width: 800.0,
            canvas_height: 600.0,
            dpi: 72.0,
            background: Rgba::WHITE,
        }
    }
}

impl ValidationContext {
    /// Canvas size from the root frame; background from its first solid fill.
    pub fn for_document(doc: &DesignDocument, dpi: f64) -> Self {
        let size = doc.canvas_size();
        Self {
            canvas_width: size.x,
            canvas_height: size.y,
            dpi,
            background: solid_fill(doc.root()).unwrap_or(Rgba::WHITE),
        }
    }

    pub fn is_print(&self) -> bool {
        self.dpi >= PRINT_DPI
    }

    pub fn canvas(&self) -> Aabb {
        Aabb::new(0.0, 0.0, self.canvas_width, self.canvas_height)
    }
}

// ─── Public API ──────────────────────────────────────────────────────────

/// Run every rule over `layers` (in layer order, front to back) and return
/// the findings.
#[must_use]
pub fn validate_design(layers: &[&Layer], ctx: &ValidationContext) -> Vec<Violation> {
    let mut out = Vec::new();
    check_text_contrast(layers, ctx, &mut out);
    check_min_font_size(layers, ctx, &mut out);
    check_bounds(layers, ctx, &mut out);
    if ctx.is_print() {
        check_safe_area(layers, ctx, &mut out);
    }
    check_balance(layers, ctx, &mut out);
    out
}

/// Contrast findings only. Used after AI edits, where the other rules are
/// noise.
#[must_use]
pub fn check_contrast(layers: &[&Layer], ctx: &ValidationContext) -> Vec<Violation> {
    let mut out = Vec::new();
    check_text_contrast(layers, ctx, &mut out);
    out
}

/// The solid color visually behind layer `id`, or `fallback`.
pub fn resolve_background(doc: &DesignDocument, id: LayerId, fallback: Rgba) -> Rgba {
    let order = doc.layer_order();
    match order.iter().position(|l| l.id == id) {
        Some(index) => background_behind(&order, index, fallback),
        None => fallback,
    }
}

/// Large text per WCAG: 24 px, or 18.66 px bold.
pub fn is_large_text(layer: &Layer) -> bool {
    layer
        .text_style()
        .is_some_and(|s| s.font_size >= 24.0 || (s.is_bold() && s.font_size >= 18.66))
}

// ─── Rules ───────────────────────────────────────────────────────────────

fn check_text_contrast(layers: &[&Layer], ctx: &ValidationContext, out: &mut Vec<Violation>) {
    for (index, layer) in layers.iter().enumerate() {
        if !layer.visible || layer.text_style().is_none() {
            continue;
        }
        let Some(fg) = layer.primary_color() else {
            continue;
        };
        let bg = background_behind(layers, index, ctx.background);
        let ratio = contrast_ratio(fg, bg);
        let required = if is_large_text(layer) { WCAG_AA_LARGE } else { WCAG_AA };
        if ratio < required {
            out.push(Violation {
                rule: "text-contrast",
                severity: Severity::Warning,
                message: format!(
                    "Text `{}` has contrast {ratio:.2}:1 against {}; needs {required}:1",
                    layer.name,
                    bg.to_hex()
                ),
                layer_id: Some(layer.id),
                suggestion: Some(format!("Use {} for the text fill", readable_color(bg).to_hex())),
            });
        }
    }
}

fn check_min_font_size(layers: &[&Layer], ctx: &ValidationContext, out: &mut Vec<Violation>) {
    let floor = if ctx.is_print() {
        pt_to_px(MIN_PRINT_FONT_SIZE_PT, ctx.dpi)
    } else {
        MIN_SCREEN_FONT_SIZE
    };
    for layer in layers {
        let Some(style) = layer.text_style() else {
            continue;
        };
        if layer.visible && style.font_size < floor {
            out.push(Violation {
                rule: "min-font-size",
                severity: Severity::Warning,
                message: format!(
                    "Text `{}` is {} px, below the {floor} px minimum",
                    layer.name, style.font_size
                ),
                layer_id: Some(layer.id),
                suggestion: Some(format!("Increase font size to at least {}", floor.ceil())),
            });
        }
    }
}

fn check_bounds(layers: &[&Layer], ctx: &ValidationContext, out: &mut Vec<Violation>) {
    let canvas = ctx.canvas();
    for layer in content_layers(layers, ctx) {
        let bounds = layer.transform.world_aabb();
        if !bounds.intersects(&canvas) {
            out.push(Violation {
                rule: "out-of-bounds",
                severity: Severity::Error,
                message: format!("`{}` is entirely outside the canvas", layer.name),
                layer_id: Some(layer.id),
                suggestion: Some("Move it back onto the canvas or delete it".into()),
            });
        } else if !canvas.contains_box(&bounds) {
            out.push(Violation {
                rule: "out-of-bounds",
                severity: Severity::Warning,
                message: format!("`{}` extends past the canvas edge", layer.name),
                layer_id: Some(layer.id),
                suggestion: None,
            });
        }
    }
}

fn check_safe_area(layers: &[&Layer], ctx: &ValidationContext, out: &mut Vec<Violation>) {
    let canvas = ctx.canvas();
    let inset = mm_to_px(SAFE_AREA_MM, ctx.dpi);
    let safe = canvas.inset(inset);
    for layer in content_layers(layers, ctx) {
        let bounds = layer.transform.world_aabb();
        if bounds.intersects(&canvas) && !safe.contains_box(&bounds) {
            out.push(Violation {
                rule: "safe-area",
                severity: Severity::Warning,
                message: format!(
                    "`{}` enters the {SAFE_AREA_MM} mm print safe area and may be trimmed",
                    layer.name
                ),
                layer_id: Some(layer.id),
                suggestion: Some(format!("Keep content {inset:.0} px from the edges")),
            });
        }
    }
}

fn check_balance(layers: &[&Layer], ctx: &ValidationContext, out: &mut Vec<Violation>) {
    let (cx, cy) = (ctx.canvas_width / 2.0, ctx.canvas_height / 2.0);
    let (mut left, mut right, mut top, mut bottom) = (0.0, 0.0, 0.0, 0.0);
    for layer in content_layers(layers, ctx) {
        let weight = visual_weight(layer);
        let center = layer.transform.world_aabb().center();
        split(center.x, cx, weight, &mut left, &mut right);
        split(center.y, cy, weight, &mut top, &mut bottom);
    }
    for (a, b, names) in [
        (left, right, ("left", "right")),
        (top, bottom, ("top", "bottom")),
    ] {
        let total = a + b;
        if total <= 0.0 {
            continue;
        }
        let (share, side) = if a >= b { (a / total, names.0) } else { (b / total, names.1) };
        if share > BALANCE_THRESHOLD {
            out.push(Violation {
                rule: "visual-balance",
                severity: Severity::Info,
                message: format!("{:.0}% of the visual weight sits on the {side}", share * 100.0),
                layer_id: None,
                suggestion: Some("Redistribute elements or add a counterweight".into()),
            });
        }
    }
}

fn split(coord: f64, mid: f64, weight: f64, low: &mut f64, high: &mut f64) {
    if coord < mid {
        *low += weight;
    } else if coord > mid {
        *high += weight;
    } else {
        *low += weight / 2.0;
        *high += weight / 2.0;
    }
}

/// Area × opacity, boosted for bold or uppercase text, images, and dark
/// fills.
pub fn visual_weight(layer: &Layer) -> f64 {
    let mut weight = layer.transform.size.x * layer.transform.size.y * layer.opacity;
    if let Some(style) = layer.text_style() {
        if style.is_bold() {
            weight *= 1.5;
        }
        if style.uppercase {
            weight *= 1.2;
        }
    }
    if matches!(layer.kind, LayerKind::Image { .. }) {
        weight *= 1.3;
    }
    if layer.primary_color().is_some_and(|c| relative_luminance(c) < 0.2) {
        weight *= 1.4;
    }
    weight
}

// ─── Helpers ─────────────────────────────────────────────────────────────

/// Visible, non-root layers that aren't full-canvas backgrounds or bare
/// containers.
fn content_layers<'a>(
    layers: &'a [&'a Layer],
    ctx: &'a ValidationContext,
) -> impl Iterator<Item = &'a Layer> + 'a {
    let canvas = ctx.canvas();
    layers.iter().copied().filter(move |l| {
        l.visible
            && l.parent_id.is_some()
            && !matches!(l.kind, LayerKind::Group { .. } | LayerKind::BooleanGroup { .. })
            && !is_background(l, &canvas)
    })
}

fn is_background(layer: &Layer, canvas: &Aabb) -> bool {
    layer.transform.world_aabb().contains_box(canvas)
}

fn solid_fill(layer: &Layer) -> Option<Rgba> {
    layer.fills()?.iter().find_map(|p| match p {
        Paint::Solid { color } if color.a > 0.0 => Some(*color),
        _ => None,
    })
}

/// Layers behind `layers[index]` are the ones later in pre-order, then its
/// ancestors from nearest outward. The first visible one with a solid fill
/// whose box covers the layer's center wins.
fn background_behind(layers: &[&Layer], index: usize, fallback: Rgba) -> Rgba {
    let target = layers[index];
    let center = target.transform.world_aabb().center();
    let covers = |l: &Layer| l.visible && l.transform.world_aabb().contains(center);

    for layer in &layers[index + 1..] {
        if covers(layer)
            && let Some(color) = solid_fill(layer)
        {
            return color;
        }
    }

    let by_id: HashMap<LayerId, &Layer> = layers.iter().map(|l| (l.id, *l)).collect();
    let mut parent = target.parent_id;
    while let Some(id) = parent {
        let Some(layer) = by_id.get(&id) else {
            break;
        };
        if covers(layer)
            && let Some(color) = solid_fill(layer)
        {
            return color;
        }
        parent = layer.parent_id;
    }
    fallback
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ShapeType, TextStyle};
    use pretty_assertions::assert_eq;

    fn rules(violations: &[Violation]) -> Vec<&'static str> {
        violations.iter().map(|v| v.rule).collect()
    }

    fn doc() -> DesignDocument {
        DesignDocument::new(800.0, 600.0)
    }

    #[test]
    fn low_contrast_text_is_flagged() {
        let pale = TextStyle {
            fill: Paint::solid(Rgba::rgb(0xDD, 0xDD, 0xDD)),
            ..TextStyle::default()
        };
        let text = Layer::text("pale").at(100.0, 100.0).with_text_style(pale);
        let doc = doc().add_layer(text, None).unwrap();
        let ctx = ValidationContext::for_document(&doc, 72.0);
        let found = validate_design(&doc.layer_order(), &ctx);
        let contrast: Vec<_> = found.iter().filter(|v| v.rule == "text-contrast").collect();
        assert_eq!(contrast.len(), 1);
        assert_eq!(contrast[0].suggestion.as_deref(), Some("Use #1A1A1A for the text fill"));
    }

    #[test]
    fn background_comes_from_shape_behind() {
        let text = Layer::text("on dark").at(20.0, 20.0).sized(100.0, 20.0);
        let tid = text.id;
        let panel = Layer::shape(ShapeType::Rectangle)
            .sized(300.0, 300.0)
            .with_fills(vec![Paint::solid(Rgba::rgb(0x10, 0x10, 0x40))]);
        let doc = doc().add_layer(text, None).unwrap().add_layer(panel, None).unwrap();
        assert_eq!(
            resolve_background(&doc, tid, Rgba::WHITE),
            Rgba::rgb(0x10, 0x10, 0x40)
        );
        // Default near-black text is unreadable there.
        let ctx = ValidationContext::for_document(&doc, 72.0);
        assert!(rules(&validate_design(&doc.layer_order(), &ctx)).contains(&"text-contrast"));
    }

    #[test]
    fn print_font_floor_uses_points() {
        let style = TextStyle {
            font_size: 20.0,
            ..TextStyle::default()
        };
        let text = Layer::text("fine print").at(100.0, 100.0).with_text_style(style);
        let doc = DesignDocument::new(1050.0, 600.0).add_layer(text, None).unwrap();
        let layers = doc.layer_order();

        let screen = ValidationContext::for_document(&doc, 72.0);
        assert!(!rules(&validate_design(&layers, &screen)).contains(&"min-font-size"));
        // 6 pt at 300 DPI = 25 px.
        let print = ValidationContext::for_document(&doc, 300.0);
        assert!(rules(&validate_design(&layers, &print)).contains(&"min-font-size"));
    }

    #[test]
    fn out_of_bounds_and_safe_area() {
        let gone = Layer::shape(ShapeType::Rectangle).at(900.0, 900.0);
        let edge = Layer::shape(ShapeType::Ellipse).at(2.0, 250.0);
        let (gone_id, edge_id) = (gone.id, edge.id);
        let doc = doc().add_layer(gone, None).unwrap().add_layer(edge, None).unwrap();
        let ctx = ValidationContext::for_document(&doc, 300.0);
        let found = validate_design(&doc.layer_order(), &ctx);

        let bounds: Vec<_> = found.iter().filter(|v| v.rule == "out-of-bounds").collect();
        assert_eq!(bounds.len(), 1);
        assert_eq!(bounds[0].layer_id, Some(gone_id));
        assert_eq!(bounds[0].severity, Severity::Error);

        let safe: Vec<_> = found.iter().filter(|v| v.rule == "safe-area").collect();
        assert_eq!(safe.len(), 1);
        assert_eq!(safe[0].layer_id, Some(edge_id));
    }

    #[test]
    fn lopsided_layout_flags_balance() {
        let a = Layer::shape(ShapeType::Rectangle).at(10.0, 250.0);
        let b = Layer::shape(ShapeType::Rectangle).at(120.0, 250.0);
        let doc = doc().add_layer(a, None).unwrap().add_layer(b, None).unwrap();
        let ctx = ValidationContext::for_document(&doc, 72.0);
        let found = validate_design(&doc.layer_order(), &ctx);
        let balance: Vec<_> = found.iter().filter(|v| v.rule == "visual-balance").collect();
        assert_eq!(balance.len(), 1);
        assert!(balance[0].message.contains("left"));
    }

    #[test]
    fn full_canvas_background_is_not_content() {
        let bg = Layer::shape(ShapeType::Rectangle).sized(800.0, 600.0);
        let doc = doc().add_layer(bg, None).unwrap();
        let ctx = ValidationContext::for_document(&doc, 300.0);
        assert_eq!(validate_design(&doc.layer_order(), &ctx), vec![]);
    }
}
