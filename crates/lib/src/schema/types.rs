//! Classification types produced by schema hooks.
//!
//! A schema looks at a raw attribute value and classifies it as a reference
//! to another record, an inline nested model, or neither. These types carry
//! that verdict back into the resolver.

use serde_json::{Value, json};

use crate::resource::{RawMap, ResourceObject};

/// A raw attribute value classified as pointing at another record.
///
/// `model_type` of `None` means "look the id up in the global, type-erased
/// identity index" rather than a typed identity map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Target model name, or `None` for a type-erased lookup.
    pub model_type: Option<String>,
    /// Target id. A reference without an id never resolves.
    pub id: Option<String>,
}

impl Reference {
    /// Creates a typed reference.
    pub fn new(model_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            model_type: Some(model_type.into()),
            id: Some(id.into()),
        }
    }

    /// Creates a type-erased reference resolved through the global index.
    pub fn global(id: impl Into<String>) -> Self {
        Self {
            model_type: None,
            id: Some(id.into()),
        }
    }

    /// Default raw form of a reference, used when a resolved record is
    /// written back into an attribute and the schema does not override
    /// [`Schema::set_attribute`](super::Schema::set_attribute).
    pub fn to_value(&self) -> Value {
        let mut map = serde_json::Map::new();
        if let Some(t) = &self.model_type {
            map.insert("type".to_string(), json!(t));
        }
        if let Some(id) = &self.id {
            map.insert("id".to_string(), json!(id));
        }
        Value::Object(map)
    }
}

/// Reference classification for a whole raw value: one target or a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceValue {
    /// The raw value points at a single record.
    Single(Reference),
    /// The raw value is an array where every element is a reference.
    Many(Vec<Reference>),
}

/// A raw attribute value classified as an inline sub-resource.
#[derive(Debug, Clone, PartialEq)]
pub struct NestedPayload {
    /// Model name of the nested record.
    pub model_type: String,
    /// Optional id of the nested record.
    pub id: Option<String>,
    /// Raw attributes of the nested record.
    pub attributes: RawMap,
}

impl NestedPayload {
    /// Creates a nested payload.
    pub fn new(model_type: impl Into<String>, id: Option<String>, attributes: RawMap) -> Self {
        Self {
            model_type: model_type.into(),
            id,
            attributes,
        }
    }

    /// The resource form of this payload, as fed into a child record.
    pub fn to_resource(&self) -> ResourceObject {
        ResourceObject::new(self.model_type.clone(), self.id.clone(), self.attributes.clone())
    }
}

/// The unified classification verdict for one raw attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// Not schema-significant; returned to the caller unchanged.
    Opaque(Value),
    /// A single reference to another record.
    Reference(Reference),
    /// An array whose every element is a reference; resolved lazily.
    ReferenceArray(Vec<Reference>),
    /// An inline nested model, materialized as a child record.
    Nested(NestedPayload),
    /// An array needing element-wise classification (nested models,
    /// references and primitives may be interleaved).
    Mixed(Vec<Value>),
}
