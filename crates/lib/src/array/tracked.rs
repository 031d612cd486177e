//! Lazily-resolving all-reference collections.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;

use crate::Result;
use crate::array::errors::ArrayError;
use crate::record::RecordData;
use crate::resolve::lookup_reference;
use crate::schema::Reference;

/// An observable collection bound to a list of raw references.
///
/// Resolution is deferred until the first read; resolving the same
/// reference twice yields the same record and never creates one.
#[derive(Clone)]
pub struct TrackedArray {
    inner: Rc<RefCell<TrackedInner>>,
}

struct TrackedInner {
    owner: RecordData,
    key: String,
    references: Vec<Reference>,
    resolved: Option<Vec<Option<RecordData>>>,
}

impl TrackedArray {
    pub(crate) fn new(owner: RecordData, key: &str, references: Vec<Reference>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(TrackedInner {
                owner,
                key: key.to_string(),
                references,
                resolved: None,
            })),
        }
    }

    /// Number of references.
    pub fn len(&self) -> usize {
        self.inner.borrow().references.len()
    }

    /// True if the collection holds no references.
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().references.is_empty()
    }

    /// The raw references backing the collection.
    pub fn references(&self) -> Vec<Reference> {
        self.inner.borrow().references.clone()
    }

    /// The attribute key this collection backs.
    pub fn key(&self) -> String {
        self.inner.borrow().key.clone()
    }

    fn ensure_resolved(&self) {
        let (owner, references) = {
            let inner = self.inner.borrow();
            if inner.resolved.is_some() {
                return;
            }
            (inner.owner.clone(), inner.references.clone())
        };
        let resolved: Vec<Option<RecordData>> = references
            .iter()
            .map(|reference| lookup_reference(&owner, reference))
            .collect();
        self.inner.borrow_mut().resolved = Some(resolved);
    }

    /// The record at `index`, resolving the collection on first read.
    /// `None` for an out-of-range index or a not-yet-loaded target.
    pub fn record_at(&self, index: usize) -> Option<RecordData> {
        self.ensure_resolved();
        self.inner
            .borrow()
            .resolved
            .as_ref()
            .and_then(|records| records.get(index).cloned())
            .flatten()
    }

    /// Every target, index-aligned; `None` marks a not-yet-loaded record.
    pub fn records(&self) -> Vec<Option<RecordData>> {
        self.ensure_resolved();
        self.inner.borrow().resolved.clone().unwrap_or_default()
    }

    /// Splices `new_references` over `remove` elements at `index`,
    /// keeping identity-array semantics: the reference list changes, the
    /// resolution snapshot is dropped, and the owning attribute is
    /// re-written through the schema so dirtiness and notification follow.
    pub fn replace(
        &self,
        index: usize,
        remove: usize,
        new_references: Vec<Reference>,
    ) -> Result<()> {
        let (owner, key, raw) = {
            let mut inner = self.inner.borrow_mut();
            let len = inner.references.len();
            if index > len || index + remove > len {
                return Err(ArrayError::IndexOutOfBounds { index, len }.into());
            }
            inner
                .references
                .splice(index..index + remove, new_references);
            inner.resolved = None;
            let raw = Value::Array(inner.references.iter().map(Reference::to_value).collect());
            (inner.owner.clone(), inner.key.clone(), raw)
        };
        let schema = owner.schema();
        schema.set_attribute(&owner.model_name(), &key, raw, &owner.schema_interface())
    }
}
