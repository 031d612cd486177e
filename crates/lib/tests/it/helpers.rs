use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use serde_json::Value;

use refract::{
    ClientId, InMemoryStore, NestedPayload, RawMap, RecordIdentity, Reference, ReferenceValue,
    ResourceObject, Schema, SchemaInterface,
};

// ==========================
// CORE TEST FACTORIES
// ==========================

/// Converts a `json!` object literal into a raw attribute map.
pub fn attrs(value: Value) -> RawMap {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object literal, got {other}"),
    }
}

/// Builds a resource payload from a `json!` object literal.
pub fn resource(model: &str, id: &str, attributes: Value) -> ResourceObject {
    ResourceObject::new(model, Some(id.to_string()), attrs(attributes))
}

/// The keys notified for one record, in delivery order.
pub fn notified_keys(notifications: &[(RecordIdentity, String)], client_id: ClientId) -> Vec<String> {
    notifications
        .iter()
        .filter(|(identity, _)| identity.client_id == client_id)
        .map(|(_, key)| key.clone())
        .collect()
}

/// Schema used across the integration suite.
///
/// Conventions:
/// - `"urn:..."` strings resolve through the global type-erased index;
///   objects whose only keys are `id` (and optionally `type`) are typed
///   references; arrays of references classify as reference arrays.
/// - Any other object is a nested model, typed by its `type` key and
///   falling back to the attribute key; `id` and `type` keys are lifted
///   out of the attribute payload.
/// - `bases` maps projection model names onto their base model.
#[derive(Default)]
pub struct TestSchema {
    pub bases: HashMap<String, String>,
    pub excluded: HashSet<String>,
    pub aliases: HashMap<String, String>,
}

impl TestSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base(mut self, projection: &str, base: &str) -> Self {
        self.bases.insert(projection.to_string(), base.to_string());
        self
    }

    #[allow(dead_code)]
    pub fn with_excluded(mut self, attr: &str) -> Self {
        self.excluded.insert(attr.to_string());
        self
    }

    #[allow(dead_code)]
    pub fn with_alias(mut self, attr: &str, backing: &str) -> Self {
        self.aliases.insert(attr.to_string(), backing.to_string());
        self
    }

    pub fn into_store(self) -> Rc<InMemoryStore> {
        InMemoryStore::new(Rc::new(self))
    }
}

/// A raw value in the suite's reference shape, if it is one.
pub fn as_reference(value: &Value) -> Option<Reference> {
    match value {
        Value::String(s) if s.starts_with("urn:") => Some(Reference::global(s.clone())),
        Value::Object(map)
            if map.contains_key("id") && map.keys().all(|k| k == "id" || k == "type") =>
        {
            let id = map.get("id")?.as_str()?;
            Some(match map.get("type").and_then(Value::as_str) {
                Some(model) => Reference::new(model, id),
                None => Reference::global(id),
            })
        }
        _ => None,
    }
}

impl Schema for TestSchema {
    fn compute_attribute_reference(
        &self,
        _key: &str,
        value: &Value,
        _model_name: &str,
        _iface: &SchemaInterface,
    ) -> Option<ReferenceValue> {
        if let Some(reference) = as_reference(value) {
            return Some(ReferenceValue::Single(reference));
        }
        if let Value::Array(items) = value
            && !items.is_empty()
            && items.iter().all(|item| as_reference(item).is_some())
        {
            return Some(ReferenceValue::Many(
                items.iter().filter_map(as_reference).collect(),
            ));
        }
        None
    }

    fn compute_nested_model(
        &self,
        key: &str,
        value: &Value,
        _model_name: &str,
        _iface: &SchemaInterface,
    ) -> Option<NestedPayload> {
        let Value::Object(map) = value else {
            return None;
        };
        if as_reference(value).is_some() {
            return None;
        }
        let model_type = map
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or(key)
            .to_string();
        let id = map.get("id").and_then(Value::as_str).map(str::to_string);
        let attributes = match map.get("attributes") {
            Some(Value::Object(attributes)) => attributes.clone(),
            _ => {
                let mut attributes = map.clone();
                attributes.remove("type");
                attributes.remove("id");
                attributes
            }
        };
        Some(NestedPayload::new(model_type, id, attributes))
    }

    fn compute_base_model_name(&self, model_name: &str) -> Option<String> {
        self.bases.get(model_name).cloned()
    }

    fn is_attribute_included(&self, _model_name: &str, attr: &str) -> bool {
        !self.excluded.contains(attr)
    }

    fn get_attribute_alias(&self, _model_name: &str, attr: &str) -> Option<String> {
        self.aliases.get(attr).cloned()
    }
}
