//! Error types for document operations and persistence.

use crate::id::LayerId;
use thiserror::Error;

/// Structural errors. An operation that fails with one of these leaves the
/// document unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DocumentError {
    /// Parent is missing or is not a container.
    #[error("invalid parent {0}")]
    InvalidParent(LayerId),

    #[error("layer {0} not found")]
    LayerNotFound(LayerId),

    /// The root frame cannot be removed, reparented, reordered, or retyped.
    #[error("the root frame {0} cannot be {1}")]
    RootImmutable(LayerId, &'static str),

    #[error("layer id {0} is already in use")]
    DuplicateId(LayerId),

    /// A new layer must arrive without children; subtrees go through
    /// `insert_subtree`.
    #[error("layer {0} already lists children")]
    UnattachedChildren(LayerId),

    /// Moving a container into its own subtree.
    #[error("cannot move {0} into its own descendant {1}")]
    Cycle(LayerId, LayerId),

    /// A replacement tried to change container-ness or tree fields.
    #[error("layer {0}: {1}")]
    StructuralChange(LayerId, &'static str),

    /// Invariant check failure (used when loading documents).
    #[error("invariant violated: {0}")]
    Invariant(String),
}

/// Errors from loading or saving a document.
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("msgpack encode: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("msgpack decode: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    #[error(transparent)]
    Document(#[from] DocumentError),
}
