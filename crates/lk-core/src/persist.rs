//! Save and load documents.
//!
//! A document is fully described by `{rootFrameId, layersById}`; selection
//! is session state and is not persisted. Ids are interned on load, so they
//! stay stable across a round trip and fresh ids never collide with them.

use crate::document::DesignDocument;
use crate::error::PersistError;
use crate::id::LayerId;
use crate::model::Layer;
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Stored {
    root_frame_id: LayerId,
    layers_by_id: HashMap<LayerId, Layer>,
}

impl Stored {
    fn into_document(self) -> Result<DesignDocument, PersistError> {
        let doc = DesignDocument::from_parts(self.root_frame_id, self.layers_by_id)?;
        log::debug!("loaded document {} ({} layers)", doc.root_id(), doc.layer_count());
        Ok(doc)
    }
}

pub fn to_json(doc: &DesignDocument) -> Result<String, PersistError> {
    Ok(serde_json::to_string_pretty(doc)?)
}

pub fn from_json(input: &str) -> Result<DesignDocument, PersistError> {
    serde_json::from_str::<Stored>(input)?.into_document()
}

/// MessagePack with named fields (layers use internally tagged variants,
/// which need map encoding).
pub fn to_msgpack(doc: &DesignDocument) -> Result<Vec<u8>, PersistError> {
    Ok(rmp_serde::to_vec_named(doc)?)
}

pub fn from_msgpack(bytes: &[u8]) -> Result<DesignDocument, PersistError> {
    rmp_serde::from_slice::<Stored>(bytes)?.into_document()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DocumentError;

    #[test]
    fn broken_tree_is_rejected() {
        let input = r#"{
            "rootFrameId": "persist_root",
            "layersById": {
                "persist_root": {
                    "id": "persist_root", "name": "Canvas", "type": "frame",
                    "children": ["persist_missing"],
                    "transform": { "position": {"x":0,"y":0}, "size": {"x":100,"y":100} }
                }
            }
        }"#;
        let err = from_json(input).unwrap_err();
        assert!(matches!(
            err,
            PersistError::Document(DocumentError::LayerNotFound(_))
        ));
    }

    #[test]
    fn garbage_is_a_json_error() {
        assert!(matches!(from_json("{"), Err(PersistError::Json(_))));
    }
}
