//! The consumer-supplied schema strategy.
//!
//! Refract stores payloads it knows nothing about; the [`Schema`] trait is
//! where the consumer teaches the cache which raw values are references to
//! other records, which are inline nested models, and how model names relate
//! to projection bases. Every hook has a default, so a unit struct
//! implementing `Schema` yields a cache that treats all values as opaque.
//!
//! One schema instance is injected per store and shared by every record in
//! it. Hooks receive a [`SchemaInterface`] scoped to the record whose
//! attribute is being classified, through which they may read sibling
//! attributes (recorded as dependencies) or write translated values back.

pub mod errors;
pub mod interface;
pub mod types;


use serde_json::Value;

use crate::Result;

pub use errors::SchemaError;
pub use interface::SchemaInterface;
pub use types::{Classification, NestedPayload, Reference, ReferenceValue};

/// Strategy trait classifying raw attribute values.
///
/// The unified hook is [`compute_attribute`](Self::compute_attribute); its
/// default implementation delegates to the two legacy hooks
/// ([`compute_attribute_reference`](Self::compute_attribute_reference) and
/// [`compute_nested_model`](Self::compute_nested_model)), so a schema may
/// implement either generation.
pub trait Schema {
    /// Classifies `value` as a reference (or array of references) to other
    /// records, or `None` if it is not reference-shaped.
    fn compute_attribute_reference(
        &self,
        _key: &str,
        _value: &Value,
        _model_name: &str,
        _iface: &SchemaInterface,
    ) -> Option<ReferenceValue> {
        None
    }

    /// Classifies `value` as an inline nested model, or `None`.
    fn compute_nested_model(
        &self,
        _key: &str,
        _value: &Value,
        _model_name: &str,
        _iface: &SchemaInterface,
    ) -> Option<NestedPayload> {
        None
    }

    /// Unified classification hook.
    ///
    /// The default delegates to the legacy reference/nested hooks and
    /// classifies any remaining array as [`Classification::Mixed`] so that
    /// element mutation stays observable; everything else is opaque.
    fn compute_attribute(
        &self,
        key: &str,
        value: &Value,
        model_name: &str,
        iface: &SchemaInterface,
    ) -> Classification {
        if let Some(reference) = self.compute_attribute_reference(key, value, model_name, iface) {
            return match reference {
                ReferenceValue::Single(r) => Classification::Reference(r),
                ReferenceValue::Many(refs) => Classification::ReferenceArray(refs),
            };
        }
        if let Some(nested) = self.compute_nested_model(key, value, model_name, iface) {
            return Classification::Nested(nested);
        }
        if let Value::Array(elements) = value {
            return Classification::Mixed(elements.clone());
        }
        Classification::Opaque(value.clone())
    }

    /// Maps a model name to the base model it projects, or `None` if the
    /// model is not a projection.
    ///
    /// Returning the input model name itself is a programmer error and is
    /// asserted against at record construction.
    fn compute_base_model_name(&self, _model_name: &str) -> Option<String> {
        None
    }

    /// Translates a written resolved value back into raw form and stores it.
    ///
    /// The default forwards to [`SchemaInterface::set_attr`], which enforces
    /// the whitelist and alias rules. Override to turn, e.g., a resolved
    /// record into its URN before storage.
    fn set_attribute(
        &self,
        _model_name: &str,
        attr: &str,
        value: Value,
        iface: &SchemaInterface,
    ) -> Result<()> {
        iface.set_attr(attr, value)
    }

    /// Per-model attribute whitelist. Excluded attributes reject writes.
    fn is_attribute_included(&self, _model_name: &str, _attr: &str) -> bool {
        true
    }

    /// Default raw value for an attribute absent from the payload.
    fn get_default_value(&self, _model_name: &str, _key: &str) -> Option<Value> {
        None
    }

    /// Maps an aliased attribute to the key that backs it, if any.
    fn get_attribute_alias(&self, _model_name: &str, _attr: &str) -> Option<String> {
        None
    }

    /// Transforms an opaque raw value before it is handed to the consumer.
    fn transform_value(&self, _model_name: &str, _key: &str, value: Value) -> Value {
        value
    }
}
