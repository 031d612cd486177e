//! The attribute resolution engine.
//!
//! Raw attribute values mean nothing until the schema classifies them.
//! [`resolve_attr`] asks the schema what a value is and materializes the
//! answer: a peer record looked up through the store, a child record for an
//! inline nested model, a lazily-resolving reference collection, or a
//! managed mixed collection. Results are memoized per key on the record and
//! invalidated (not recomputed) whenever the key changes.

pub mod cache;


use serde_json::Value;

use crate::Result;
use crate::array::{ManagedArray, TrackedArray};
use crate::record::{ParentLink, RecordData};
use crate::schema::{Classification, NestedPayload, Reference};

/// A raw attribute value after schema classification and materialization.
#[derive(Clone)]
pub enum ResolvedValue {
    /// Opaque value, returned (transformed) as-is.
    Raw(Value),
    /// A single reference; `None` means the target is not loaded yet.
    Record(Option<RecordData>),
    /// An inline nested model materialized as a child record.
    Nested(RecordData),
    /// An all-reference array, resolved lazily on first read.
    References(TrackedArray),
    /// A mixed array of nested records, references and primitives.
    Managed(ManagedArray),
}

impl ResolvedValue {
    /// The raw value, if this resolved as opaque.
    pub fn as_raw(&self) -> Option<&Value> {
        match self {
            ResolvedValue::Raw(value) => Some(value),
            _ => None,
        }
    }

    /// The referenced record, if this resolved as a loaded reference.
    pub fn as_record(&self) -> Option<&RecordData> {
        match self {
            ResolvedValue::Record(record) => record.as_ref(),
            _ => None,
        }
    }

    /// The child record, if this resolved as a nested model.
    pub fn as_nested(&self) -> Option<&RecordData> {
        match self {
            ResolvedValue::Nested(child) => Some(child),
            _ => None,
        }
    }

    /// The managed array, if this resolved as a mixed collection.
    pub fn as_managed(&self) -> Option<&ManagedArray> {
        match self {
            ResolvedValue::Managed(array) => Some(array),
            _ => None,
        }
    }

    /// The tracked array, if this resolved as an all-reference collection.
    pub fn as_references(&self) -> Option<&TrackedArray> {
        match self {
            ResolvedValue::References(array) => Some(array),
            _ => None,
        }
    }
}

/// Resolves `key` on `record`, consulting the per-key cache first.
///
/// A key with neither a raw value nor a schema default resolves to raw
/// null. Dependency reads performed by schema callbacks during the
/// classification are recorded against `key` on the record's
/// [`SchemaInterface`](crate::schema::SchemaInterface).
pub fn resolve_attr(record: &RecordData, key: &str) -> Result<ResolvedValue> {
    record.ensure_alive()?;
    if let Some(cached) = record.cached_resolved(key) {
        return Ok(cached);
    }
    let model_name = record.model_name();
    let schema = record.schema();
    let raw = match record.get_attr(key) {
        Some(value) => value,
        None => match schema.get_default_value(&model_name, key) {
            Some(value) => value,
            None => {
                let resolved = ResolvedValue::Raw(Value::Null);
                record.cache_resolved(key, resolved.clone());
                return Ok(resolved);
            }
        },
    };
    let iface = record.schema_interface();
    iface.begin_dependent_key_resolution(key);
    let classification = schema.compute_attribute(key, &raw, &model_name, &iface);
    iface.end_dependent_key_resolution(key);
    let resolved = resolve_classification(record, key, classification)?;
    record.cache_resolved(key, resolved.clone());
    Ok(resolved)
}

/// Resolves an already-classified value for `key` on `record`.
pub fn resolve_value(
    record: &RecordData,
    key: &str,
    classification: Classification,
) -> Result<ResolvedValue> {
    resolve_classification(record, key, classification)
}

fn resolve_classification(
    record: &RecordData,
    key: &str,
    classification: Classification,
) -> Result<ResolvedValue> {
    match classification {
        Classification::Opaque(value) => {
            let transformed = record
                .schema()
                .transform_value(&record.model_name(), key, value);
            Ok(ResolvedValue::Raw(transformed))
        }
        Classification::Reference(reference) => {
            Ok(ResolvedValue::Record(lookup_reference(record, &reference)))
        }
        Classification::ReferenceArray(references) => Ok(ResolvedValue::References(
            TrackedArray::new(record.clone(), key, references),
        )),
        Classification::Nested(nested) => Ok(ResolvedValue::Nested(materialize_nested(
            record, key, None, &nested,
        )?)),
        Classification::Mixed(elements) => Ok(ResolvedValue::Managed(
            ManagedArray::from_resolution(record.clone(), key, elements)?,
        )),
    }
}

/// Looks a reference up in the host identity map (or the global index when
/// the reference is type-erased). Unresolved targets are `None`, never an
/// error: a missing record is "not loaded yet".
pub(crate) fn lookup_reference(record: &RecordData, reference: &Reference) -> Option<RecordData> {
    let id = reference.id.as_deref()?;
    record
        .store()
        .peek_record_data(reference.model_type.as_deref(), id)
}

/// Materializes a nested payload as a child record of `record` (or of its
/// base when `record` is a projection, so structure lives with the shared
/// state).
///
/// An existing child for the same key/index is reused as-is when its
/// computed `(type, id)` matches; the merge path is the only writer of a
/// live child's state. A fresh child is filled without raising a top-level
/// change notification.
pub(crate) fn materialize_nested(
    record: &RecordData,
    key: &str,
    index: Option<usize>,
    nested: &NestedPayload,
) -> Result<RecordData> {
    let owner = record.base_record_data().unwrap_or_else(|| record.clone());
    let existing = match index {
        None => owner.child_record_data(key),
        Some(i) => owner.child_record_data_at(key, i),
    };
    if let Some(child) = existing
        && child.matches_nested(nested)
    {
        return Ok(child);
    }
    let child = RecordData::new_child(
        record.store(),
        &nested.model_type,
        nested.id.as_deref(),
        ParentLink {
            parent: owner.downgrade(),
            key: key.to_string(),
            index,
        },
    );
    child.push_data(&nested.to_resource(), false, false)?;
    match index {
        None => owner.set_child(key, child.clone()),
        Some(i) => owner.set_child_at(key, i, child.clone()),
    }
    Ok(child)
}

/// Resolves one element of a mixed array for `key[index]` on `owner`.
///
/// Non-nested results clear any stale child previously at the index.
/// Nested sub-arrays are not modeled; they stay raw.
pub(crate) fn resolve_array_element(
    owner: &RecordData,
    key: &str,
    index: usize,
    element: &Value,
) -> Result<ResolvedValue> {
    let schema = owner.schema();
    let iface = owner.schema_interface();
    let model_name = owner.model_name();
    match schema.compute_attribute(key, element, &model_name, &iface) {
        Classification::Nested(nested) => Ok(ResolvedValue::Nested(materialize_nested(
            owner,
            key,
            Some(index),
            &nested,
        )?)),
        Classification::Reference(reference) => {
            owner.clear_child_at(key, index);
            Ok(ResolvedValue::Record(lookup_reference(owner, &reference)))
        }
        Classification::Opaque(value) => {
            owner.clear_child_at(key, index);
            Ok(ResolvedValue::Raw(value))
        }
        Classification::ReferenceArray(_) | Classification::Mixed(_) => {
            owner.clear_child_at(key, index);
            Ok(ResolvedValue::Raw(element.clone()))
        }
    }
}

impl RecordData {
    pub(crate) fn cached_resolved(&self, key: &str) -> Option<ResolvedValue> {
        self.inner.borrow().resolved.get(key)
    }

    pub(crate) fn cache_resolved(&self, key: &str, value: ResolvedValue) {
        self.inner.borrow().resolved.insert(key, value);
    }

    /// True if the resolved cache holds a stale entry for `key`.
    pub fn is_resolved_stale(&self, key: &str) -> bool {
        self.inner.borrow().resolved.is_stale(key)
    }
}
