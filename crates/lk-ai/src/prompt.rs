//! The text contract with the model: a prompt built from the document, and
//! a tolerant parser for what comes back.

use crate::intent::Intent;
use crate::patch::PatchOp;
use crate::scope::{LockMap, Scope};
use lk_core::{DesignDocument, Layer, LayerKind, Paint};
use serde_json::Value;
use std::fmt::Write as _;
use thiserror::Error;

/// Text shown to the model is cut to this many characters.
const MAX_TEXT_PREVIEW: usize = 60;

const RESPONSE_CONTRACT: &str = r##"Respond with a single JSON object and nothing else:
{
  "patchOps": [
    {"op": "replace", "layerId": "<id>", "path": "/transform/position/x", "value": 120},
    {"op": "add", "layerId": "<id>", "path": "/effects/-", "value": {...}},
    {"op": "remove", "layerId": "<id>", "path": "/strokes/0"},
    {"op": "reorder", "layerId": "<id>", "direction": "up" | "down" | "top" | "bottom"},
    {"op": "add-layer", "layerData": {"type": "shape", ...}, "parentId": "<id>"},
    {"op": "remove-layer", "layerId": "<id>"}
  ],
  "intents": [
    {"type": "make-bigger" | "make-smaller" | "center" | "change-color" | "make-warmer" | "make-cooler" | "fix-contrast" | "ensure-readable" | "change-font-size" | "change-opacity" | "make-bold" | "make-lighter" | "add-shadow" | "remove-shadow" | "add-spacing" | "move-to",
     "target": {"ids": ["<id>"], "tag": "...", "name": "...", "type": "text", "special": "all" | "selected" | "largest-text" | "primary-image" | "background"},
     "params": {"factor": 1.2, "axis": "horizontal" | "vertical" | "both", "color": "#RRGGBB", "amount": 20, "fontSize": 24, "opacity": 0.8, "spacing": 16, "x": 0, "y": 0}}
  ],
  "summary": "one sentence describing the change"
}
Include "patchOps", "intents", or both. Prefer intents when one fits. Never edit a locked path."##;

/// Build the full prompt for `instruction`.
pub fn build_prompt(doc: &DesignDocument, instruction: &str, scope: Scope, locks: &LockMap) -> String {
    let canvas = doc.canvas_size();
    let mut out = String::new();
    let _ = writeln!(out, "You are editing a layered design.");
    let _ = writeln!(out, "Canvas: {}x{}", num(canvas.x), num(canvas.y));
    let _ = writeln!(out);
    let _ = writeln!(out, "Layers (front to back within each container):");
    let root = doc.root_id();
    for layer in doc.layer_order().into_iter().filter(|l| l.id != root) {
        let _ = writeln!(out, "{}", describe_layer(layer, locks));
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Scope: {scope}. {}", scope.instructions());
    let _ = writeln!(out);
    let _ = writeln!(out, "{RESPONSE_CONTRACT}");
    let _ = writeln!(out);
    let _ = write!(out, "Instruction: {}", instruction.trim());
    out
}

/// One line per layer: identity, geometry, type-specific fields, locks.
pub fn describe_layer(layer: &Layer, locks: &LockMap) -> String {
    let t = &layer.transform;
    let mut line = format!(
        "- [{}] \"{}\" {} at ({}, {}) size {}x{}",
        layer.id,
        layer.name,
        layer.layer_type(),
        num(t.position.x),
        num(t.position.y),
        num(t.size.x),
        num(t.size.y),
    );
    if t.rotation != 0.0 {
        let _ = write!(line, " rotation {}", num(t.rotation));
    }
    if layer.opacity < 1.0 {
        let _ = write!(line, " opacity {}", num(layer.opacity));
    }
    if !layer.tags.is_empty() {
        let tags: Vec<&str> = layer.tags.iter().map(String::as_str).collect();
        let _ = write!(line, " tags [{}]", tags.join(", "));
    }
    if !layer.visible {
        line.push_str(" hidden");
    }

    match &layer.kind {
        LayerKind::Text {
            text, default_style, ..
        } => {
            let _ = write!(
                line,
                " text \"{}\" font {} {} weight {}",
                preview(text),
                default_style.font_family,
                num(default_style.font_size),
                default_style.font_weight,
            );
            if let Some(color) = default_style.fill.representative_color() {
                let _ = write!(line, " color {}", color.to_hex());
            }
        }
        LayerKind::Shape { shape_type, fills, .. } => {
            let kind = serde_json::to_value(shape_type).ok();
            if let Some(Value::String(kind)) = kind {
                let _ = write!(line, " {kind}");
            }
            push_fills(&mut line, fills);
        }
        LayerKind::Path { fills, .. } | LayerKind::Frame { fills, .. } => push_fills(&mut line, fills),
        LayerKind::Image { image_ref, .. } => {
            let _ = write!(line, " src \"{image_ref}\"");
        }
        LayerKind::Icon { icon_id, color } => {
            let _ = write!(line, " icon \"{icon_id}\" color {}", color.to_hex());
        }
        LayerKind::Group { children } | LayerKind::BooleanGroup { children, .. } => {
            let _ = write!(line, " children {}", children.len());
        }
    }

    if !layer.effects.is_empty() {
        let _ = write!(line, " effects {}", layer.effects.len());
    }

    if layer.locked {
        line.push_str(" LOCKED");
    } else if !locks.paths(layer.id).is_empty() {
        let _ = write!(line, " locked [{}]", locks.paths(layer.id).join(", "));
    }
    line
}

fn push_fills(line: &mut String, fills: &[Paint]) {
    let colors: Vec<String> = fills
        .iter()
        .filter_map(Paint::representative_color)
        .map(|c| c.to_hex())
        .collect();
    if !colors.is_empty() {
        let _ = write!(line, " fills [{}]", colors.join(", "));
    }
}

fn preview(text: &str) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() <= MAX_TEXT_PREVIEW {
        flat
    } else {
        let cut: String = flat.chars().take(MAX_TEXT_PREVIEW).collect();
        format!("{cut}…")
    }
}

fn num(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

// ─── Response ────────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum ResponseError {
    #[error("response contains no JSON object")]
    NoJson,

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("response JSON is not an object")]
    NotAnObject,

    /// Neither `patchOps` nor `intents` is present.
    #[error("response has neither `patchOps` nor `intents`")]
    MissingEdits,
}

/// A parsed model response. Entries that failed to parse are listed in
/// `skipped`, the rest are kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AiResponse {
    pub patch_ops: Vec<PatchOp>,
    pub intents: Vec<Intent>,
    pub summary: Option<String>,
    pub skipped: Vec<String>,
}

/// Parse a raw model response.
pub fn parse_ai_response(text: &str) -> Result<AiResponse, ResponseError> {
    let json = extract_json(text).ok_or(ResponseError::NoJson)?;
    let value: Value = serde_json::from_str(json)?;
    let Value::Object(mut map) = value else {
        return Err(ResponseError::NotAnObject);
    };

    let ops = map.remove("patchOps");
    let intents = map.remove("intents");
    if ops.is_none() && intents.is_none() {
        return Err(ResponseError::MissingEdits);
    }

    let mut response = AiResponse {
        summary: map
            .remove("summary")
            .and_then(|s| s.as_str().map(str::to_string))
            .filter(|s| !s.trim().is_empty()),
        ..Default::default()
    };
    response.patch_ops = entries(ops, "patch op", &mut response.skipped);
    response.intents = entries(intents, "intent", &mut response.skipped);
    Ok(response)
}

/// Deserialize each array entry on its own so one bad entry does not sink
/// the rest.
fn entries<T: serde::de::DeserializeOwned>(value: Option<Value>, what: &str, skipped: &mut Vec<String>) -> Vec<T> {
    let items = match value {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Array(items)) => items,
        Some(other) => vec![other],
    };
    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        match serde_json::from_value(item) {
            Ok(entry) => out.push(entry),
            Err(e) => {
                log::warn!("skipping malformed {what} #{i}: {e}");
                skipped.push(format!("{what} #{i}: {e}"));
            }
        }
    }
    out
}

/// The JSON payload of `text`: the body of the first code fence if there is
/// one, otherwise the first balanced top-level `{...}`.
fn extract_json(text: &str) -> Option<&str> {
    if let Some(body) = fenced_body(text)
        && let Some(json) = first_object(body)
    {
        return Some(json);
    }
    first_object(text)
}

fn fenced_body(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after = &text[start + 3..];
    // Skip the info string (`json`) up to the end of the fence line.
    let body_start = after.find('\n').map_or(0, |i| i + 1);
    let body = &after[body_start..];
    let end = body.find("```").unwrap_or(body.len());
    Some(&body[..end])
}

/// The first `{...}` whose braces balance, ignoring braces inside strings.
fn first_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + i + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::IntentKind;
    use lk_core::{Layer, ShapeType};
    use pretty_assertions::assert_eq;

    #[test]
    fn finds_object_in_prose() {
        let text = r#"Sure! Here you go: {"a": "}", "b": {"c": 1}} and that's it {"d": 2}"#;
        assert_eq!(first_object(text), Some(r#"{"a": "}", "b": {"c": 1}}"#));
        assert_eq!(first_object("{ unbalanced"), None);
        assert_eq!(first_object("no braces"), None);
    }

    #[test]
    fn strips_code_fence() {
        let text = "Here:\n```json\n{\"intents\": [], \"summary\": \"noop\"}\n```\nDone.";
        let response = parse_ai_response(text).unwrap();
        assert!(response.intents.is_empty());
        assert_eq!(response.summary.as_deref(), Some("noop"));
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let text = r#"{"intents": [{"type": "center", "target": {"special": "all"}}, {"type": "teleport"}]}"#;
        let response = parse_ai_response(text).unwrap();
        assert_eq!(response.intents.len(), 1);
        assert_eq!(response.intents[0].kind, IntentKind::Center);
        assert_eq!(response.skipped.len(), 1);
        assert!(response.skipped[0].starts_with("intent #1"));
    }

    #[test]
    fn response_errors() {
        assert!(matches!(parse_ai_response("I can't do that."), Err(ResponseError::NoJson)));
        assert!(matches!(parse_ai_response("{not json}"), Err(ResponseError::Json(_))));
        assert!(matches!(
            parse_ai_response(r#"{"summary": "nothing"}"#),
            Err(ResponseError::MissingEdits)
        ));
    }

    #[test]
    fn describes_layers_with_locks() {
        let layer = Layer::shape(ShapeType::Ellipse)
            .named("Dot")
            .at(10.0, 20.5)
            .sized(30.0, 30.0)
            .tagged("accent");
        let locks = LockMap::new().with(layer.id, "/transform");
        let line = describe_layer(&layer, &locks);
        assert!(line.starts_with(&format!("- [{}] \"Dot\" shape at (10, 20.5) size 30x30", layer.id)));
        assert!(line.contains("tags [accent]"));
        assert!(line.contains(" ellipse"));
        assert!(line.ends_with("locked [/transform]"));
    }

    #[test]
    fn prompt_lists_layers_and_scope() {
        let layer = Layer::text("Hello").named("Greeting");
        let doc = DesignDocument::new(1080.0, 1080.0).add_layer(layer, None).unwrap();
        let prompt = build_prompt(&doc, "  make it pop ", Scope::ColorsOnly, &LockMap::new());
        assert!(prompt.contains("Canvas: 1080x1080"));
        assert!(prompt.contains("\"Greeting\" text"));
        assert!(prompt.contains(Scope::ColorsOnly.instructions()));
        assert!(prompt.ends_with("Instruction: make it pop"));
        assert_eq!(prompt.matches("\n- [").count(), 1);
    }
}
