//! Semantic intents: a deterministic compiler from verbs like "make bigger"
//! or "fix contrast" to [`PatchOp`]s.
//!
//! An intent names a [`LayerTarget`] and optional parameters. Targets are
//! resolved against the document, the intent is compiled per layer, and the
//! ops go through the same scope and lock checks as raw patches.

use crate::patch::{PatchApplier, PatchOp, PatchResult, number};
use crate::scope::{LockMap, Scope};
use lk_core::rules::MIN_SCREEN_FONT_SIZE;
use lk_core::rules::color::{WCAG_AA, WCAG_AA_LARGE, contrast_ratio, readable_color};
use lk_core::rules::validate::is_large_text;
use lk_core::{
    DesignDocument, Effect, GradientStop, Layer, LayerId, LayerKind, LayerType, Paint, Rgba, ValidationContext,
    resolve_background,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Default scale for `make-bigger`; `make-smaller` uses its inverse.
pub const DEFAULT_SCALE_FACTOR: f64 = 1.2;

/// Default channel shift for warmer / cooler.
pub const DEFAULT_COLOR_SHIFT: f64 = 20.0;

/// Default gap added between layers by `add-spacing`.
pub const DEFAULT_SPACING: f64 = 16.0;

/// Font-weight step for bold / lighter.
pub const FONT_WEIGHT_STEP: i32 = 200;

// ─── Targets ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpecialTarget {
    All,
    Selected,
    /// The text layer with the largest font size.
    LargestText,
    /// The image layer with the largest area.
    PrimaryImage,
    /// The root frame.
    Background,
}

/// Which layers an intent applies to. The first non-empty criterion in
/// `special`, `ids`, then the filters (`tag`, `name`, `type`, all of which
/// must match) decides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayerTarget {
    /// Layer ids; an entry that is not an id is matched against layer names.
    pub ids: Vec<String>,
    pub tag: Option<String>,
    /// Case-insensitive substring of the layer name.
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub layer_type: Option<LayerType>,
    pub special: Option<SpecialTarget>,
}

impl LayerTarget {
    pub fn ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn special(special: SpecialTarget) -> Self {
        Self {
            special: Some(special),
            ..Default::default()
        }
    }
}

/// Resolve `target` to layer ids, in layer order where the criterion does
/// not imply one.
pub fn resolve_target(doc: &DesignDocument, target: &LayerTarget) -> Vec<LayerId> {
    let root = doc.root_id();
    let content = || doc.layer_order().into_iter().filter(move |l| l.id != root);

    if let Some(special) = target.special {
        return match special {
            SpecialTarget::All => content().map(|l| l.id).collect(),
            SpecialTarget::Selected => doc.selection().ids.to_vec(),
            SpecialTarget::LargestText => first_max(
                content().filter_map(|l| l.text_style().map(|s| (l.id, s.font_size))),
            ),
            SpecialTarget::PrimaryImage => first_max(
                content()
                    .filter(|l| l.layer_type() == LayerType::Image)
                    .map(|l| (l.id, l.transform.size.x * l.transform.size.y)),
            ),
            SpecialTarget::Background => vec![root],
        };
    }

    if !target.ids.is_empty() {
        let mut out = Vec::new();
        for key in &target.ids {
            let by_id = LayerId::lookup(key).filter(|id| doc.contains(*id));
            let found = by_id.or_else(|| content().find(|l| l.name == *key).map(|l| l.id));
            match found {
                Some(id) if !out.contains(&id) => out.push(id),
                Some(_) => {}
                None => log::warn!("target `{key}` matches no layer"),
            }
        }
        return out;
    }

    if target.tag.is_none() && target.name.is_none() && target.layer_type.is_none() {
        return Vec::new();
    }
    let needle = target.name.as_ref().map(|n| n.to_lowercase());
    content()
        .filter(|l| target.tag.as_ref().is_none_or(|t| l.tags.contains(t)))
        .filter(|l| needle.as_ref().is_none_or(|n| l.name.to_lowercase().contains(n)))
        .filter(|l| target.layer_type.is_none_or(|t| l.layer_type() == t))
        .map(|l| l.id)
        .collect()
}

/// The id with the strictly largest metric; the first one wins ties.
fn first_max(items: impl Iterator<Item = (LayerId, f64)>) -> Vec<LayerId> {
    let mut best: Option<(LayerId, f64)> = None;
    for (id, metric) in items {
        if best.is_none_or(|(_, m)| metric > m) {
            best = Some((id, metric));
        }
    }
    best.map(|(id, _)| vec![id]).unwrap_or_default()
}

// ─── Intents ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntentKind {
    MakeBigger,
    MakeSmaller,
    Center,
    ChangeColor,
    MakeWarmer,
    MakeCooler,
    FixContrast,
    EnsureReadable,
    ChangeFontSize,
    ChangeOpacity,
    MakeBold,
    MakeLighter,
    AddShadow,
    RemoveShadow,
    AddSpacing,
    MoveTo,
}

impl IntentKind {
    /// Undo label for the resulting command.
    pub fn label(&self) -> &'static str {
        match self {
            IntentKind::MakeBigger => "Make Bigger",
            IntentKind::MakeSmaller => "Make Smaller",
            IntentKind::Center => "Center",
            IntentKind::ChangeColor => "Change Color",
            IntentKind::MakeWarmer => "Make Warmer",
            IntentKind::MakeCooler => "Make Cooler",
            IntentKind::FixContrast => "Fix Contrast",
            IntentKind::EnsureReadable => "Ensure Readable",
            IntentKind::ChangeFontSize => "Change Font Size",
            IntentKind::ChangeOpacity => "Change Opacity",
            IntentKind::MakeBold => "Make Bold",
            IntentKind::MakeLighter => "Make Lighter",
            IntentKind::AddShadow => "Add Shadow",
            IntentKind::RemoveShadow => "Remove Shadow",
            IntentKind::AddSpacing => "Add Spacing",
            IntentKind::MoveTo => "Move To",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Horizontal,
    Vertical,
    #[default]
    Both,
}

/// Parameters shared by all intents; each intent reads the ones it needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IntentParams {
    pub factor: Option<f64>,
    pub axis: Option<Axis>,
    /// Hex color for `change-color`.
    pub color: Option<String>,
    /// Channel shift for warmer / cooler, or a font-size delta.
    pub amount: Option<f64>,
    pub font_size: Option<f64>,
    pub opacity: Option<f64>,
    pub spacing: Option<f64>,
    pub x: Option<f64>,
    pub y: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    #[serde(rename = "type")]
    pub kind: IntentKind,
    #[serde(default)]
    pub target: LayerTarget,
    #[serde(default)]
    pub params: IntentParams,
}

impl Intent {
    pub fn new(kind: IntentKind, target: LayerTarget) -> Self {
        Self {
            kind,
            target,
            params: IntentParams::default(),
        }
    }

    #[must_use]
    pub fn with_params(mut self, params: IntentParams) -> Self {
        self.params = params;
        self
    }
}

/// Resolve, compile, and apply `intent` as one AI batch.
pub fn process_intent(doc: &DesignDocument, intent: &Intent, scope: Scope, locks: &LockMap) -> PatchResult {
    let mut applier = PatchApplier::new(doc, scope, locks);
    apply_intent(&mut applier, intent);
    applier.finish(intent.kind.label())
}

/// Compile `intent` against the applier's running document and feed the
/// ops through it.
pub(crate) fn apply_intent(applier: &mut PatchApplier<'_>, intent: &Intent) {
    let ids = resolve_target(applier.document(), &intent.target);
    if ids.is_empty() {
        applier.warn(format!("{} matched no layers", intent.kind.label()));
        return;
    }
    let ops = intent_to_patch_ops(applier.document(), intent, &ids);
    if ops.is_empty() {
        applier.warn(format!("{} had nothing to change", intent.kind.label()));
    }
    for op in ops {
        applier.apply(op);
    }
}

/// Compile `intent` for the already-resolved layers `ids`.
pub fn intent_to_patch_ops(doc: &DesignDocument, intent: &Intent, ids: &[LayerId]) -> Vec<PatchOp> {
    let params = &intent.params;
    let layers: Vec<&Layer> = ids.iter().filter_map(|id| doc.get(*id)).collect();
    let mut ops = Vec::new();

    match intent.kind {
        IntentKind::MakeBigger | IntentKind::MakeSmaller => {
            let factor = scale_factor(intent.kind, params.factor);
            for layer in layers {
                scale_ops(layer, factor, &mut ops);
            }
        }
        IntentKind::Center => {
            let canvas = doc.canvas_size();
            let axis = params.axis.unwrap_or_default();
            for layer in layers {
                let size = layer.transform.size;
                if axis != Axis::Vertical {
                    ops.push(set(layer, "/transform/position/x", round2((canvas.x - size.x) / 2.0)));
                }
                if axis != Axis::Horizontal {
                    ops.push(set(layer, "/transform/position/y", round2((canvas.y - size.y) / 2.0)));
                }
            }
        }
        IntentKind::ChangeColor => {
            let Some(color) = params.color.as_deref().and_then(Rgba::from_hex) else {
                log::warn!("change-color without a valid `color` param");
                return ops;
            };
            for layer in layers {
                ops.extend(color_op(layer, color));
            }
        }
        IntentKind::MakeWarmer | IntentKind::MakeCooler => {
            let amount = params.amount.unwrap_or(DEFAULT_COLOR_SHIFT).round() as i32;
            let amount = if intent.kind == IntentKind::MakeWarmer { amount } else { -amount };
            for layer in layers {
                ops.extend(shift_ops(layer, |color| color.shifted(amount, 0, -amount)));
            }
        }
        IntentKind::FixContrast | IntentKind::EnsureReadable => {
            let fallback = ValidationContext::for_document(doc, 72.0).background;
            for layer in layers {
                let (Some(style), Some(fg)) = (layer.text_style(), layer.primary_color()) else {
                    continue;
                };
                let bg = resolve_background(doc, layer.id, fallback);
                let required = if is_large_text(layer) { WCAG_AA_LARGE } else { WCAG_AA };
                if contrast_ratio(fg, bg) < required {
                    ops.extend(color_op(layer, readable_color(bg)));
                }
                if intent.kind == IntentKind::EnsureReadable && style.font_size < MIN_SCREEN_FONT_SIZE {
                    ops.push(set(layer, "/defaultStyle/fontSize", MIN_SCREEN_FONT_SIZE));
                }
            }
        }
        IntentKind::ChangeFontSize => {
            for layer in layers {
                let Some(style) = layer.text_style() else {
                    continue;
                };
                let size = match (params.font_size, params.amount, params.factor) {
                    (Some(size), _, _) => size,
                    (None, Some(delta), _) => style.font_size + delta,
                    (None, None, Some(factor)) => (style.font_size * factor).round(),
                    (None, None, None) => continue,
                };
                ops.push(set(layer, "/defaultStyle/fontSize", size));
            }
        }
        IntentKind::ChangeOpacity => {
            let Some(opacity) = params.opacity else {
                return ops;
            };
            for layer in layers {
                ops.push(set(layer, "/opacity", opacity));
            }
        }
        IntentKind::MakeBold | IntentKind::MakeLighter => {
            let step = if intent.kind == IntentKind::MakeBold {
                FONT_WEIGHT_STEP
            } else {
                -FONT_WEIGHT_STEP
            };
            for layer in layers {
                if let Some(style) = layer.text_style() {
                    let weight = (i32::from(style.font_weight) + step).clamp(100, 900);
                    if weight != i32::from(style.font_weight) {
                        ops.push(PatchOp::replace(layer.id, "/defaultStyle/fontWeight", weight));
                    }
                }
            }
        }
        IntentKind::AddShadow => {
            for layer in layers.into_iter().filter(|l| !l.effects.iter().any(Effect::is_shadow)) {
                ops.push(PatchOp::Add {
                    layer_id: layer.id,
                    path: "/effects/-".into(),
                    value: to_value(&Effect::soft_shadow()),
                });
            }
        }
        IntentKind::RemoveShadow => {
            for layer in layers.into_iter().filter(|l| l.effects.iter().any(Effect::is_shadow)) {
                let kept: Vec<&Effect> = layer.effects.iter().filter(|e| !e.is_shadow()).collect();
                ops.push(PatchOp::replace(layer.id, "/effects", to_value(&kept)));
            }
        }
        IntentKind::AddSpacing => {
            let spacing = params.spacing.or(params.amount).unwrap_or(DEFAULT_SPACING);
            let mut stacked = layers;
            stacked.sort_by(|a, b| a.transform.position.y.total_cmp(&b.transform.position.y));
            for (i, layer) in stacked.into_iter().enumerate().skip(1) {
                let y = layer.transform.position.y + spacing * i as f64;
                ops.push(set(layer, "/transform/position/y", round2(y)));
            }
        }
        IntentKind::MoveTo => {
            for layer in layers {
                if let Some(x) = params.x {
                    ops.push(set(layer, "/transform/position/x", x));
                }
                if let Some(y) = params.y {
                    ops.push(set(layer, "/transform/position/y", y));
                }
            }
        }
    }
    ops
}

// ─── Helpers ─────────────────────────────────────────────────────────────

fn scale_factor(kind: IntentKind, factor: Option<f64>) -> f64 {
    let f = factor.filter(|f| f.is_finite() && *f > 0.0).unwrap_or(DEFAULT_SCALE_FACTOR);
    match kind {
        IntentKind::MakeSmaller if f > 1.0 => 1.0 / f,
        IntentKind::MakeBigger if f < 1.0 => 1.0 / f,
        _ => f,
    }
}

/// Resize about the center; text also scales its font size.
fn scale_ops(layer: &Layer, factor: f64, ops: &mut Vec<PatchOp>) {
    let t = &layer.transform;
    let w = round2(t.size.x * factor);
    let h = round2(t.size.y * factor);
    let x = round2(t.position.x - (w - t.size.x) / 2.0);
    let y = round2(t.position.y - (h - t.size.y) / 2.0);
    ops.push(PatchOp::replace(layer.id, "/transform/size", json!({"x": number(w), "y": number(h)})));
    ops.push(PatchOp::replace(
        layer.id,
        "/transform/position",
        json!({"x": number(x), "y": number(y)}),
    ));
    if let Some(style) = layer.text_style() {
        ops.push(set(layer, "/defaultStyle/fontSize", (style.font_size * factor).round()));
    }
}

/// The op that makes `color` the layer's visible color: a solid paint in
/// place of the first colored fill. Image and pattern fills are never
/// replaced.
fn color_op(layer: &Layer, color: Rgba) -> Option<PatchOp> {
    let paint = to_value(&Paint::solid(color));
    match &layer.kind {
        LayerKind::Text { .. } => Some(PatchOp::replace(layer.id, "/defaultStyle/fill", paint)),
        LayerKind::Icon { .. } => Some(PatchOp::replace(layer.id, "/color", to_value(&color))),
        LayerKind::Shape { fills, .. } | LayerKind::Path { fills, .. } | LayerKind::Frame { fills, .. } => {
            if fills.is_empty() {
                return Some(PatchOp::Add {
                    layer_id: layer.id,
                    path: "/fills/0".into(),
                    value: paint,
                });
            }
            let i = fills.iter().position(|p| p.representative_color().is_some())?;
            Some(PatchOp::replace(layer.id, format!("/fills/{i}"), paint))
        }
        LayerKind::Image { .. } | LayerKind::Group { .. } | LayerKind::BooleanGroup { .. } => None,
    }
}

/// Ops that pass every color of the layer's paints through `shift`.
/// Gradients keep their stops and angle; image and pattern paints are left
/// alone.
fn shift_ops(layer: &Layer, shift: impl Fn(Rgba) -> Rgba) -> Vec<PatchOp> {
    match &layer.kind {
        LayerKind::Text { default_style, .. } => shifted_paint(&default_style.fill, &shift)
            .map(|paint| PatchOp::replace(layer.id, "/defaultStyle/fill", to_value(&paint)))
            .into_iter()
            .collect(),
        LayerKind::Icon { color, .. } => vec![PatchOp::replace(layer.id, "/color", to_value(&shift(*color)))],
        _ => layer
            .fills()
            .unwrap_or_default()
            .iter()
            .enumerate()
            .filter_map(|(i, paint)| {
                shifted_paint(paint, &shift).map(|p| PatchOp::replace(layer.id, format!("/fills/{i}"), to_value(&p)))
            })
            .collect(),
    }
}

fn shifted_paint(paint: &Paint, shift: &impl Fn(Rgba) -> Rgba) -> Option<Paint> {
    match paint {
        Paint::Solid { color } => Some(Paint::solid(shift(*color))),
        Paint::Gradient { stops, angle } => Some(Paint::Gradient {
            stops: stops
                .iter()
                .map(|stop| GradientStop {
                    offset: stop.offset,
                    color: shift(stop.color),
                })
                .collect(),
            angle: *angle,
        }),
        Paint::Image { .. } | Paint::Pattern { .. } => None,
    }
}

fn set(layer: &Layer, path: &str, value: f64) -> PatchOp {
    PatchOp::replace(layer.id, path, number(value))
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn to_value<T: Serialize + ?Sized>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}
