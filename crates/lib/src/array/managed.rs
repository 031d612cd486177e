//! Managed mixed collections with diff-based replace.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;

use crate::Result;
use crate::array::errors::ArrayError;
use crate::record::{ChildSlot, ParentLink, RecordData};
use crate::resolve::{ResolvedValue, lookup_reference, resolve_array_element};
use crate::schema::{Classification, Reference};
use crate::store::NotifyScope;

/// The sticky element-handling mode of a [`ManagedArray`].
///
/// Decided by the first non-empty `replace` (or at resolution for arrays
/// born non-empty) and never revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayMode {
    /// Empty so far; the first non-empty replace decides.
    Undetermined,
    /// Identity-array semantics: elements are references to peer records.
    AllReference,
    /// Element-wise semantics: nested records, references and primitives.
    Nested,
}

/// An element handed to [`ManagedArray::replace`].
pub enum ArrayInsert {
    /// A raw value, classified through the schema like payload data.
    Raw(Value),
    /// An already-resolved record: a peer (reference semantics) or an
    /// embedded record being moved between containers (re-parented).
    Record(RecordData),
}

/// An observable collection over resolved values, keeping the owning
/// record's child structures in sync through diff-based replacement.
#[derive(Clone)]
pub struct ManagedArray {
    inner: Rc<RefCell<ManagedInner>>,
}

struct ManagedInner {
    owner: RecordData,
    key: String,
    mode: ArrayMode,
    content: Vec<ResolvedValue>,
}

impl ManagedArray {
    /// Builds the collection from the raw elements of a resolved attribute.
    pub(crate) fn from_resolution(
        record: RecordData,
        key: &str,
        elements: Vec<Value>,
    ) -> Result<Self> {
        let owner = record.base_record_data().unwrap_or(record);
        // A key that previously resolved as a single nested model cannot
        // keep its single-child slot once the value is an array.
        if let Some(ChildSlot::Single(_)) = owner.child_slot(key) {
            owner.remove_child_slot(key, true);
        }
        let mut content = Vec::with_capacity(elements.len());
        for (index, element) in elements.iter().enumerate() {
            content.push(resolve_array_element(&owner, key, index, element)?);
        }
        if let Some(slot) = owner.child_slot(key)
            && slot.len() > elements.len()
        {
            owner.resize_child_slot(key, elements.len(), slot.len() - elements.len(), 0);
        }
        let mode = if content.is_empty() {
            ArrayMode::Undetermined
        } else {
            ArrayMode::Nested
        };
        Ok(Self {
            inner: Rc::new(RefCell::new(ManagedInner {
                owner,
                key: key.to_string(),
                mode,
                content,
            })),
        })
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.inner.borrow().content.len()
    }

    /// True if the collection holds no elements.
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().content.is_empty()
    }

    /// The sticky element-handling mode.
    pub fn mode(&self) -> ArrayMode {
        self.inner.borrow().mode
    }

    /// The attribute key this collection backs.
    pub fn key(&self) -> String {
        self.inner.borrow().key.clone()
    }

    /// The element at `index`, if in range.
    pub fn get(&self, index: usize) -> Option<ResolvedValue> {
        self.inner.borrow().content.get(index).cloned()
    }

    /// A snapshot of the resolved content.
    pub fn items(&self) -> Vec<ResolvedValue> {
        self.inner.borrow().content.clone()
    }

    /// Splices `items` over `remove` elements at `index`.
    ///
    /// The first non-empty replace on an undetermined empty collection
    /// fixes the mode: all-reference when the first item is an
    /// already-resolved peer record, nested otherwise — permanently.
    /// Nested-mode replacement resizes the owner's child slot, resolves
    /// each inserted item (creating, reusing or re-parenting child
    /// records), and re-sets the owning attribute so dirtying and
    /// notification follow.
    pub fn replace(&self, index: usize, remove: usize, items: Vec<ArrayInsert>) -> Result<()> {
        let owner = self.inner.borrow().owner.clone();
        owner.ensure_alive()?;
        let _scope = NotifyScope::enter(owner.store());
        {
            let mut inner = self.inner.borrow_mut();
            let len = inner.content.len();
            if index > len || index + remove > len {
                return Err(ArrayError::IndexOutOfBounds { index, len }.into());
            }
            if inner.mode == ArrayMode::Undetermined && len == 0 && !items.is_empty() {
                inner.mode = match &items[0] {
                    ArrayInsert::Record(record) if !record.is_embedded() => ArrayMode::AllReference,
                    _ => ArrayMode::Nested,
                };
            }
        }
        match self.mode() {
            ArrayMode::AllReference => self.replace_references(index, remove, items),
            ArrayMode::Nested | ArrayMode::Undetermined => {
                self.replace_nested(index, remove, items)
            }
        }
    }

    /// Appends an element.
    pub fn push(&self, item: ArrayInsert) -> Result<()> {
        self.replace(self.len(), 0, vec![item])
    }

    /// Inserts an element at `index`.
    pub fn insert(&self, index: usize, item: ArrayInsert) -> Result<()> {
        self.replace(index, 0, vec![item])
    }

    /// Removes the element at `index`.
    pub fn remove(&self, index: usize) -> Result<()> {
        self.replace(index, 1, Vec::new())
    }

    /// Removes and returns the last element.
    pub fn pop(&self) -> Result<Option<ResolvedValue>> {
        let len = self.len();
        if len == 0 {
            return Ok(None);
        }
        let last = self.get(len - 1);
        self.replace(len - 1, 1, Vec::new())?;
        Ok(last)
    }

    fn replace_references(
        &self,
        index: usize,
        remove: usize,
        items: Vec<ArrayInsert>,
    ) -> Result<()> {
        let (owner, key) = {
            let inner = self.inner.borrow();
            (inner.owner.clone(), inner.key.clone())
        };
        let mut records = Vec::with_capacity(items.len());
        for (offset, item) in items.into_iter().enumerate() {
            let record = match item {
                ArrayInsert::Record(record) => record,
                ArrayInsert::Raw(value) => {
                    let classified = owner.schema().compute_attribute(
                        &key,
                        &value,
                        &owner.model_name(),
                        &owner.schema_interface(),
                    );
                    let reference = match classified {
                        Classification::Reference(reference) => reference,
                        _ => {
                            return Err(ArrayError::NotAReference {
                                index: index + offset,
                            }
                            .into());
                        }
                    };
                    match lookup_reference(&owner, &reference) {
                        Some(record) => record,
                        None => {
                            return Err(ArrayError::NotAReference {
                                index: index + offset,
                            }
                            .into());
                        }
                    }
                }
            };
            records.push(record);
        }
        let raw = {
            let mut inner = self.inner.borrow_mut();
            inner.content.splice(
                index..index + remove,
                records
                    .into_iter()
                    .map(|record| ResolvedValue::Record(Some(record))),
            );
            Value::Array(inner.content.iter().map(raw_form).collect())
        };
        owner
            .schema()
            .set_attribute(&owner.model_name(), &key, raw, &owner.schema_interface())
    }

    fn replace_nested(&self, index: usize, remove: usize, items: Vec<ArrayInsert>) -> Result<()> {
        let (owner, key) = {
            let inner = self.inner.borrow();
            (inner.owner.clone(), inner.key.clone())
        };
        owner.resize_child_slot(&key, index, remove, items.len());
        let mut resolved = Vec::with_capacity(items.len());
        for (offset, item) in items.into_iter().enumerate() {
            let at = index + offset;
            match item {
                ArrayInsert::Record(record) => {
                    if record.is_embedded() {
                        // Already materialized elsewhere: re-parent instead
                        // of re-resolving.
                        record.set_parent_link(ParentLink {
                            parent: owner.downgrade(),
                            key: key.clone(),
                            index: Some(at),
                        });
                        owner.set_child_at(&key, at, record.clone());
                        resolved.push(ResolvedValue::Nested(record));
                    } else {
                        resolved.push(ResolvedValue::Record(Some(record)));
                    }
                }
                ArrayInsert::Raw(value) => {
                    resolved.push(resolve_array_element(&owner, &key, at, &value)?);
                }
            }
        }
        let raw = {
            let mut inner = self.inner.borrow_mut();
            inner.content.splice(index..index + remove, resolved);
            Value::Array(inner.content.iter().map(raw_form).collect())
        };
        owner
            .schema()
            .set_attribute(&owner.model_name(), &key, raw, &owner.schema_interface())
    }
}

/// The default raw form written back into the owning attribute.
fn raw_form(value: &ResolvedValue) -> Value {
    match value {
        ResolvedValue::Raw(raw) => raw.clone(),
        ResolvedValue::Record(Some(record)) => Reference {
            model_type: Some(record.model_name()),
            id: record.id(),
        }
        .to_value(),
        ResolvedValue::Record(None) => Value::Null,
        ResolvedValue::Nested(child) => child_payload_value(child),
        ResolvedValue::References(tracked) => Value::Array(
            tracked
                .references()
                .iter()
                .map(Reference::to_value)
                .collect(),
        ),
        ResolvedValue::Managed(managed) => {
            Value::Array(managed.items().iter().map(raw_form).collect())
        }
    }
}

/// Serializes a nested child back to `{type, id, attributes}` payload form.
fn child_payload_value(child: &RecordData) -> Value {
    let mut map = serde_json::Map::new();
    map.insert("type".to_string(), Value::String(child.model_name()));
    if let Some(id) = child.id() {
        map.insert("id".to_string(), Value::String(id));
    }
    let mut attributes = serde_json::Map::new();
    child.for_each_attribute(|key, value| {
        attributes.insert(key.to_string(), value.clone());
    });
    map.insert("attributes".to_string(), Value::Object(attributes));
    Value::Object(map)
}
