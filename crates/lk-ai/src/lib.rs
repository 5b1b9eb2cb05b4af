//! Scoped, lock-aware AI edits for LayerKit documents.
//!
//! A model sees the document through [`build_prompt`] and answers with raw
//! [`PatchOp`]s, semantic [`Intent`]s, or both. Everything it proposes goes
//! through the same checks and lands as a single undoable batch.

pub mod intent;
pub mod patch;
pub mod prompt;
pub mod scope;

pub use intent::{
    Axis, Intent, IntentKind, IntentParams, LayerTarget, SpecialTarget, intent_to_patch_ops, process_intent,
    resolve_target,
};
pub use patch::{PatchApplier, PatchOp, PatchResult, RejectedOp, validate_and_apply_patch};
pub use prompt::{AiResponse, ResponseError, build_prompt, describe_layer, parse_ai_response};
pub use scope::{LockMap, Scope};

use lk_core::DesignDocument;

/// Undo label when the model gives no summary.
pub const DEFAULT_LABEL: &str = "AI Edit";

/// Parse `text` and apply it to `doc`: patch ops first, then intents
/// resolved against the document as the ops left it. A response that does
/// not parse produces no command.
pub fn apply_response(
    doc: &DesignDocument,
    text: &str,
    scope: Scope,
    locks: &LockMap,
) -> Result<PatchResult, ResponseError> {
    let response = parse_ai_response(text)?;
    let mut applier = PatchApplier::new(doc, scope, locks);
    for skipped in &response.skipped {
        applier.warn(format!("skipped {skipped}"));
    }
    for op in response.patch_ops {
        applier.apply(op);
    }
    for intent in &response.intents {
        intent::apply_intent(&mut applier, intent);
    }
    let label = response.summary.as_deref().unwrap_or(DEFAULT_LABEL);
    log::debug!("applying AI response `{label}` in scope {scope}");
    Ok(applier.finish(label))
}
