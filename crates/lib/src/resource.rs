//! Payload types for resource ingestion.
//!
//! The wire shape `{id, type, attributes}` is assumed, not validated, by
//! this layer; anything the server nests under `attributes` is carried as
//! raw [`serde_json::Value`]s and only interpreted during resolution.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Raw attribute map of a resource: attribute key to raw JSON value.
pub type RawMap = serde_json::Map<String, Value>;

/// A single resource document as pushed into the cache.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceObject {
    /// Server-assigned id, if the resource has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// The model (type) name of the resource.
    #[serde(rename = "type")]
    pub model_type: String,
    /// Raw attribute payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<RawMap>,
}

impl ResourceObject {
    /// Creates a resource with attributes.
    pub fn new(model_type: impl Into<String>, id: Option<String>, attributes: RawMap) -> Self {
        Self {
            id,
            model_type: model_type.into(),
            attributes: Some(attributes),
        }
    }

    /// Creates an id-and-type-only resource with no attribute payload.
    pub fn reference(model_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            model_type: model_type.into(),
            attributes: None,
        }
    }
}
