//! Edit scopes and per-layer path locks.
//!
//! A scope is an allow-list of JSON-pointer prefixes into a serialized
//! layer. Locks are per-layer prefixes that no scope can override. Prefixes
//! match at segment boundaries, so `/transform` covers `/transform/position/x`
//! but `/fills` does not cover `/fillsX`.

use lk_core::{Layer, LayerId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Path matching every field of a layer.
pub const WILDCARD: &str = "/";

/// Pseudo-path checked for z-order changes.
pub const ORDER_PATH: &str = "/order";

/// Pseudo-path checked for adding or removing whole layers.
pub const LAYERS_PATH: &str = "/layers";

/// `prefix` equals `path` or is one of its ancestors.
pub fn covers(prefix: &str, path: &str) -> bool {
    prefix == WILDCARD
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

const TEXT_PATHS: &[&str] = &[
    "/text",
    "/paragraphs",
    "/defaultStyle/fontSize",
    "/defaultStyle/fontWeight",
    "/defaultStyle/fontFamily",
    "/defaultStyle/lineHeight",
    "/defaultStyle/letterSpacing",
    "/defaultStyle/uppercase",
    "/defaultStyle/italic",
    "/defaultStyle/textAlign",
];

const COLOR_PATHS: &[&str] = &["/fills", "/strokes", "/color", "/defaultStyle/fill", "/opacity"];

const LAYOUT_PATHS: &[&str] = &["/transform", ORDER_PATH];

const ALL_PATHS: &[&str] = &[WILDCARD];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scope {
    TextOnly,
    ColorsOnly,
    LayoutOnly,
    ElementSpecific,
    FullRedesign,
}

impl Scope {
    pub const ALL: [Scope; 5] = [
        Scope::TextOnly,
        Scope::ColorsOnly,
        Scope::LayoutOnly,
        Scope::ElementSpecific,
        Scope::FullRedesign,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::TextOnly => "text-only",
            Scope::ColorsOnly => "colors-only",
            Scope::LayoutOnly => "layout-only",
            Scope::ElementSpecific => "element-specific",
            Scope::FullRedesign => "full-redesign",
        }
    }

    /// Path prefixes this scope may touch.
    pub fn allowed_paths(&self) -> &'static [&'static str] {
        match self {
            Scope::TextOnly => TEXT_PATHS,
            Scope::ColorsOnly => COLOR_PATHS,
            Scope::LayoutOnly => LAYOUT_PATHS,
            Scope::ElementSpecific | Scope::FullRedesign => ALL_PATHS,
        }
    }

    pub fn allows(&self, path: &str) -> bool {
        self.allowed_paths()
            .iter()
            .any(|prefix| covers(prefix, path))
    }

    /// The restriction as told to the model.
    pub fn instructions(&self) -> &'static str {
        match self {
            Scope::TextOnly => {
                "Only change text content and typography (font size, weight, family, line height, letter spacing, case, alignment). Do not move, resize, or recolor anything."
            }
            Scope::ColorsOnly => {
                "Only change colors: fills, strokes, icon colors, text fill, and opacity. Do not change text, position, or size."
            }
            Scope::LayoutOnly => {
                "Only change position, size, rotation, and stacking order. Do not change text or colors."
            }
            Scope::ElementSpecific => {
                "Change only the layers the instruction refers to. Any property of those layers may be edited."
            }
            Scope::FullRedesign => {
                "Any layer and any property may be changed, and layers may be added or removed."
            }
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scope::ALL
            .into_iter()
            .find(|scope| scope.as_str() == s)
            .ok_or_else(|| format!("unknown scope `{s}`"))
    }
}

// ─── Locks ───────────────────────────────────────────────────────────────

/// Locked path prefixes per layer, e.g. `{"logo": ["/transform"]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LockMap(HashMap<LayerId, Vec<String>>);

impl LockMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock `path` on `id`.
    #[must_use]
    pub fn with(mut self, id: LayerId, path: impl Into<String>) -> Self {
        self.lock(id, path);
        self
    }

    pub fn lock(&mut self, id: LayerId, path: impl Into<String>) {
        let path = path.into();
        let paths = self.0.entry(id).or_default();
        if !paths.contains(&path) {
            paths.push(path);
        }
    }

    pub fn paths(&self, id: LayerId) -> &[String] {
        self.0.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }

    /// The lock that blocks an edit of `path` on `layer`, if any. An edit
    /// is blocked by a lock on the path itself, on an ancestor, or on a
    /// descendant it would overwrite. A layer with `locked` set counts as
    /// locked at the wildcard.
    pub fn blocking(&self, layer: &Layer, path: &str) -> Option<String> {
        if layer.locked {
            return Some(WILDCARD.to_string());
        }
        self.paths(layer.id)
            .iter()
            .find(|lock| covers(lock, path) || covers(path, lock))
            .cloned()
    }
}
