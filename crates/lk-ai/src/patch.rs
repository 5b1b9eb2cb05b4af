//! Patch operations proposed by a model, and their scoped, lock-aware
//! application.
//!
//! Each op is checked in order: scope, locks, target existence, structure.
//! Accepted ops become commands executed against a running document, so a
//! later op sees the effect of earlier ones. Out-of-range numbers are
//! clamped with a warning. Everything accepted is returned as one batch
//! command tagged [`CommandCategory::Ai`], i.e. one undo step.
//!
//! Path ops address a layer's JSON form (`/defaultStyle/fontSize`,
//! `/fills/0`, `/transform/position/x`): the layer is serialized, edited at
//! the pointer, and deserialized back before being swapped in.

use crate::scope::{LAYERS_PATH, LockMap, ORDER_PATH, Scope};
use lk_core::rules::validate::check_contrast;
use lk_core::{
    DesignDocument, Layer, LayerId, Property, ReorderDirection, ValidationContext, clamp_to_range,
};
use lk_editor::{Command, CommandCategory};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Top-level fields no patch may touch; the tree shape is owned by the
/// document.
const STRUCTURAL_FIELDS: &[&str] = &["id", "parentId", "children", "type"];

// ─── Ops ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum PatchOp {
    #[serde(rename_all = "camelCase")]
    Replace {
        layer_id: LayerId,
        path: String,
        value: Value,
    },
    /// Insert into an array (index or `-` for the end) or set an object key.
    #[serde(rename_all = "camelCase")]
    Add {
        layer_id: LayerId,
        path: String,
        value: Value,
    },
    #[serde(rename_all = "camelCase")]
    Remove { layer_id: LayerId, path: String },
    #[serde(rename_all = "camelCase")]
    Reorder {
        layer_id: LayerId,
        direction: ReorderDirection,
    },
    #[serde(rename_all = "camelCase")]
    AddLayer {
        layer_data: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent_id: Option<LayerId>,
    },
    #[serde(rename_all = "camelCase")]
    RemoveLayer { layer_id: LayerId },
}

impl PatchOp {
    pub fn replace(layer_id: LayerId, path: impl Into<String>, value: impl Into<Value>) -> Self {
        PatchOp::Replace {
            layer_id,
            path: path.into(),
            value: value.into(),
        }
    }

    /// The layer this op edits. `None` for `add-layer`.
    pub fn layer_id(&self) -> Option<LayerId> {
        match self {
            PatchOp::Replace { layer_id, .. }
            | PatchOp::Add { layer_id, .. }
            | PatchOp::Remove { layer_id, .. }
            | PatchOp::Reorder { layer_id, .. }
            | PatchOp::RemoveLayer { layer_id } => Some(*layer_id),
            PatchOp::AddLayer { .. } => None,
        }
    }

    /// The path checked against scopes and locks. Ops without a path use a
    /// pseudo-path.
    pub fn scope_path(&self) -> &str {
        match self {
            PatchOp::Replace { path, .. } | PatchOp::Add { path, .. } | PatchOp::Remove { path, .. } => path,
            PatchOp::Reorder { .. } => ORDER_PATH,
            PatchOp::AddLayer { .. } | PatchOp::RemoveLayer { .. } => LAYERS_PATH,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            PatchOp::Replace { .. } => "replace",
            PatchOp::Add { .. } => "add",
            PatchOp::Remove { .. } => "remove",
            PatchOp::Reorder { .. } => "reorder",
            PatchOp::AddLayer { .. } => "add-layer",
            PatchOp::RemoveLayer { .. } => "remove-layer",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedOp {
    pub op: PatchOp,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct PatchResult {
    /// At least one op applied.
    pub success: bool,
    /// One batch over every applied op.
    pub command: Option<Command>,
    pub applied: Vec<PatchOp>,
    pub rejected: Vec<RejectedOp>,
    pub warnings: Vec<String>,
}

/// Validate `ops` against `scope` and `locks` and build a single undoable
/// command from the ones that pass. `doc` is not modified.
pub fn validate_and_apply_patch(
    doc: &DesignDocument,
    ops: &[PatchOp],
    scope: Scope,
    locks: &LockMap,
    label: &str,
) -> PatchResult {
    let mut applier = PatchApplier::new(doc, scope, locks);
    for op in ops {
        applier.apply(op.clone());
    }
    applier.finish(label)
}

// ─── Applier ─────────────────────────────────────────────────────────────

/// Incremental form of [`validate_and_apply_patch`], for callers that mix
/// ops with intents resolved against the running document.
pub struct PatchApplier<'a> {
    scope: Scope,
    locks: &'a LockMap,
    running: DesignDocument,
    commands: Vec<Command>,
    applied: Vec<PatchOp>,
    rejected: Vec<RejectedOp>,
    warnings: Vec<String>,
}

impl<'a> PatchApplier<'a> {
    pub fn new(doc: &DesignDocument, scope: Scope, locks: &'a LockMap) -> Self {
        Self {
            scope,
            locks,
            running: doc.clone(),
            commands: Vec::new(),
            applied: Vec::new(),
            rejected: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// The document with every accepted op so far applied.
    pub fn document(&self) -> &DesignDocument {
        &self.running
    }

    pub fn warn(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Check and apply one op. Returns whether it was applied.
    pub fn apply(&mut self, op: PatchOp) -> bool {
        match self.build(&op) {
            Ok(Some(command)) => match command.try_execute(&self.running) {
                Ok(next) => {
                    log::debug!("applied {} on {:?}", op.name(), op.layer_id());
                    self.running = next;
                    self.commands.push(command);
                    self.applied.push(op);
                    true
                }
                Err(err) => self.reject(op, err.to_string()),
            },
            Ok(None) => false,
            Err(reason) => self.reject(op, reason),
        }
    }

    fn reject(&mut self, op: PatchOp, reason: String) -> bool {
        log::warn!("rejected {}: {reason}", op.name());
        self.rejected.push(RejectedOp { op, reason });
        false
    }

    /// The command for `op`, `Ok(None)` for an accepted op with no effect,
    /// or the rejection reason.
    fn build(&mut self, op: &PatchOp) -> Result<Option<Command>, String> {
        let path = op.scope_path();
        if !self.scope.allows(path) {
            return Err(format!("path `{path}` is not allowed in scope `{}`", self.scope));
        }

        let target = op.layer_id();
        if let Some(id) = target
            && let Some(layer) = self.running.get(id)
            && let Some(lock) = self.locks.blocking(layer, path)
        {
            return Err(format!("path `{path}` is locked by `{lock}` on layer {id}"));
        }
        if let Some(id) = target
            && !self.running.contains(id)
        {
            return Err(format!("layer {id} does not exist"));
        }

        let doc = &self.running;
        match op {
            PatchOp::Replace { layer_id, path, value }
            | PatchOp::Add { layer_id, path, value } => {
                check_structural(path)?;
                let mut value = value.clone();
                clamp_value(path, &mut value, &mut self.warnings);
                let add = matches!(op, PatchOp::Add { .. });
                let layer = edit_layer(doc, *layer_id, path, |root, pointer| {
                    if add { insert_at(root, pointer, value) } else { replace_at(root, pointer, value) }
                })?;
                Ok(Some(Command::replace_layer(doc, layer, "AI Edit")))
            }
            PatchOp::Remove { layer_id, path } => {
                check_structural(path)?;
                let layer = edit_layer(doc, *layer_id, path, remove_at)?;
                Ok(Some(Command::replace_layer(doc, layer, "AI Edit")))
            }
            PatchOp::Reorder { layer_id, direction } => {
                let command = Command::reorder(doc, *layer_id, *direction);
                if command.is_noop() {
                    self.warnings.push(format!("reorder of {layer_id} had no effect"));
                    return Ok(None);
                }
                Ok(Some(command))
            }
            PatchOp::AddLayer { layer_data, parent_id } => {
                let layer = layer_from_data(doc, layer_data.clone(), &mut self.warnings)?;
                let parent = parent_id.unwrap_or(doc.root_id());
                Ok(Some(Command::add_layer(doc, layer, Some(parent))))
            }
            PatchOp::RemoveLayer { layer_id } => {
                if *layer_id == doc.root_id() {
                    return Err("the root frame cannot be removed".into());
                }
                Ok(Some(Command::remove_layers(doc, &[*layer_id])))
            }
        }
    }

    /// Run the post-apply contrast check and package the batch.
    pub fn finish(mut self, label: &str) -> PatchResult {
        let ctx = ValidationContext::for_document(&self.running, 72.0);
        let order = self.running.layer_order();
        for violation in check_contrast(&order, &ctx) {
            let mut warning = violation.message;
            if let Some(suggestion) = violation.suggestion {
                warning = format!("{warning} ({suggestion})");
            }
            self.warnings.push(warning);
        }

        let success = !self.commands.is_empty();
        let command = success.then(|| Command::batch(label, self.commands).with_category(CommandCategory::Ai));
        PatchResult {
            success,
            command,
            applied: self.applied,
            rejected: self.rejected,
            warnings: self.warnings,
        }
    }
}

// ─── Path edits ──────────────────────────────────────────────────────────

fn check_structural(path: &str) -> Result<(), String> {
    let first = path.trim_start_matches('/').split('/').next().unwrap_or("");
    if first.is_empty() {
        return Err("path must name a field".into());
    }
    if STRUCTURAL_FIELDS.contains(&first) {
        return Err(format!("path `{path}` is structural and cannot be patched"));
    }
    Ok(())
}

/// Serialize the layer, run `edit` at `path`, and read the layer back.
fn edit_layer(
    doc: &DesignDocument,
    id: LayerId,
    path: &str,
    edit: impl FnOnce(&mut Value, &str) -> Result<(), String>,
) -> Result<Layer, String> {
    let layer = doc.get(id).ok_or_else(|| format!("layer {id} does not exist"))?;
    let mut json = serde_json::to_value(layer).map_err(|e| e.to_string())?;
    edit(&mut json, path)?;
    serde_json::from_value(json).map_err(|e| format!("invalid value for `{path}`: {e}"))
}

/// Split `/a/b/c` into (`/a/b`, `c`).
fn split_pointer(pointer: &str) -> Result<(&str, String), String> {
    let (parent, last) = pointer
        .rsplit_once('/')
        .ok_or_else(|| format!("`{pointer}` is not a JSON pointer"))?;
    Ok((parent, last.replace("~1", "/").replace("~0", "~")))
}

fn replace_at(root: &mut Value, pointer: &str, value: Value) -> Result<(), String> {
    let slot = root
        .pointer_mut(pointer)
        .ok_or_else(|| format!("path `{pointer}` does not exist"))?;
    *slot = value;
    Ok(())
}

fn insert_at(root: &mut Value, pointer: &str, value: Value) -> Result<(), String> {
    let (parent, key) = split_pointer(pointer)?;
    match root.pointer_mut(parent) {
        Some(Value::Array(items)) => {
            let index = if key == "-" {
                items.len()
            } else {
                key.parse::<usize>()
                    .ok()
                    .filter(|i| *i <= items.len())
                    .ok_or_else(|| format!("index `{key}` out of range in `{pointer}`"))?
            };
            items.insert(index, value);
            Ok(())
        }
        Some(Value::Object(map)) => {
            map.insert(key, value);
            Ok(())
        }
        _ => Err(format!("path `{parent}` does not exist")),
    }
}

fn remove_at(root: &mut Value, pointer: &str) -> Result<(), String> {
    let (parent, key) = split_pointer(pointer)?;
    let removed = match root.pointer_mut(parent) {
        Some(Value::Array(items)) => key
            .parse::<usize>()
            .ok()
            .filter(|i| *i < items.len())
            .map(|i| items.remove(i)),
        Some(Value::Object(map)) => map.remove(&key),
        _ => None,
    };
    removed
        .map(|_| ())
        .ok_or_else(|| format!("path `{pointer}` does not exist"))
}

// ─── Ranges ──────────────────────────────────────────────────────────────

/// Clamp every ranged number in `value` (rooted at `path`), recording a
/// warning per change. Whole numbers are written back as integers so that
/// integer fields (channels, font weight) deserialize.
fn clamp_value(path: &str, value: &mut Value, warnings: &mut Vec<String>) {
    match value {
        Value::Number(n) => {
            let (Some(v), Some(property)) = (n.as_f64(), Property::for_path(path)) else {
                return;
            };
            let mut clamped = clamp_to_range(v, property);
            if property == Property::ColorChannel {
                clamped = clamped.round();
            }
            if clamped != v {
                warnings.push(format!("clamped {path} from {v} to {clamped}"));
            }
            *value = number(clamped);
        }
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                clamp_value(&format!("{path}/{key}"), child, warnings);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter_mut().enumerate() {
                clamp_value(&format!("{path}/{i}"), child, warnings);
            }
        }
        _ => {}
    }
}

pub(crate) fn number(v: f64) -> Value {
    if v.fract() == 0.0 && v.abs() < 9.0e15 {
        Value::from(v as i64)
    } else {
        Value::from(v)
    }
}

// ─── New layers ──────────────────────────────────────────────────────────

/// Build a detached layer from model-provided JSON. A missing id or name is
/// filled in; children and parent links are dropped. An explicit id must be
/// unused and must not have been retired.
fn layer_from_data(doc: &DesignDocument, data: Value, warnings: &mut Vec<String>) -> Result<Layer, String> {
    let Value::Object(mut map) = data else {
        return Err("layerData must be an object".into());
    };
    let kind = map
        .get("type")
        .and_then(Value::as_str)
        .ok_or("layerData needs a `type`")?
        .to_string();

    match map.get("id").and_then(Value::as_str) {
        Some(id) => {
            if let Some(existing) = LayerId::lookup(id) {
                if doc.contains(existing) {
                    return Err(format!("layer {id} already exists"));
                }
                if existing.is_retired() {
                    return Err(format!("layer id {id} belonged to a removed layer"));
                }
            }
        }
        None => {
            let id = LayerId::fresh(&kind.replace('-', "_"));
            map.insert("id".into(), Value::from(id.as_str()));
        }
    }
    map.entry("name").or_insert_with(|| Value::from(kind.clone()));
    map.remove("parentId");
    map.remove("children");

    for (key, child) in map.iter_mut() {
        clamp_value(&format!("/{key}"), child, warnings);
    }
    serde_json::from_value(Value::Object(map)).map_err(|e| format!("invalid layerData: {e}"))
}
