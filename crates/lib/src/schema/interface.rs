//! The sandbox handed to schema callbacks during attribute resolution.
//!
//! A [`SchemaInterface`] is created once per record and lives as long as the
//! record does. While the resolver is computing a key, reads of other
//! attributes through the interface are recorded as dependencies of that
//! key, so a later change to a dependency can invalidate and re-notify the
//! dependent key.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

use serde_json::Value;

use crate::Result;
use crate::record::{RecordData, WeakRecordData};
use crate::schema::errors::SchemaError;

/// Narrow, stateful view over one record, passed to schema callbacks.
///
/// Cloning is cheap; all clones share the same dependency-tracking state.
#[derive(Clone)]
pub struct SchemaInterface {
    record: WeakRecordData,
    model_name: String,
    state: Rc<RefCell<InterfaceState>>,
}

#[derive(Default)]
struct InterfaceState {
    /// Key currently being resolved, if any. At most one at a time.
    resolving: Option<String>,
    /// Resolved key -> keys it read while resolving.
    dependencies: HashMap<String, BTreeSet<String>>,
}

impl SchemaInterface {
    pub(crate) fn new(record: WeakRecordData, model_name: impl Into<String>) -> Self {
        Self {
            record,
            model_name: model_name.into(),
            state: Rc::new(RefCell::new(InterfaceState::default())),
        }
    }

    /// Reads an attribute of the underlying record.
    ///
    /// If a dependent-key resolution is in progress, the read is recorded as
    /// a dependency of the key being resolved.
    pub fn get_attr(&self, key: &str) -> Option<Value> {
        {
            let mut state = self.state.borrow_mut();
            if let Some(active) = state.resolving.clone()
                && active != key
            {
                state
                    .dependencies
                    .entry(active)
                    .or_default()
                    .insert(key.to_string());
            }
        }
        self.record.upgrade().and_then(|record| record.get_attr(key))
    }

    /// Writes an attribute of the underlying record.
    ///
    /// This is the default landing point of
    /// [`Schema::set_attribute`](crate::schema::Schema::set_attribute) and
    /// enforces the schema's whitelist and alias rules before the write
    /// reaches the record.
    pub fn set_attr(&self, key: &str, value: Value) -> Result<()> {
        let Some(record) = self.record.upgrade() else {
            return Err(SchemaError::TargetDestroyed {
                model: self.model_name.clone(),
            }
            .into());
        };
        let schema = record.schema();
        if !schema.is_attribute_included(&self.model_name, key) {
            return Err(SchemaError::ExcludedAttribute {
                model: self.model_name.clone(),
                attr: key.to_string(),
            }
            .into());
        }
        if let Some(alias) = schema.get_attribute_alias(&self.model_name, key) {
            return Err(SchemaError::AliasedAttribute {
                model: self.model_name.clone(),
                attr: key.to_string(),
                alias,
            }
            .into());
        }
        record.set_attr(key, value, false)
    }

    /// Marks `key` as the output currently being resolved.
    ///
    /// # Panics
    /// Panics if another key's resolution is already in progress.
    pub fn begin_dependent_key_resolution(&self, key: &str) {
        let mut state = self.state.borrow_mut();
        assert!(
            state.resolving.is_none(),
            "dependent key resolution for '{}' began while '{}' was still being resolved",
            key,
            state.resolving.as_deref().unwrap_or_default()
        );
        state.resolving = Some(key.to_string());
    }

    /// Ends the resolution started with
    /// [`begin_dependent_key_resolution`](Self::begin_dependent_key_resolution).
    ///
    /// # Panics
    /// Panics if `key` is not the key currently being resolved.
    pub fn end_dependent_key_resolution(&self, key: &str) {
        let mut state = self.state.borrow_mut();
        assert!(
            state.resolving.as_deref() == Some(key),
            "dependent key resolution for '{key}' ended without being begun"
        );
        state.resolving = None;
    }

    /// Keys that `key` read while it was being resolved.
    pub fn dependencies_of(&self, key: &str) -> Vec<String> {
        self.state
            .borrow()
            .dependencies
            .get(key)
            .map(|deps| deps.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Keys whose resolution read `key`, i.e. the keys to invalidate when
    /// `key` changes.
    pub fn dependent_keys_of(&self, key: &str) -> Vec<String> {
        let state = self.state.borrow();
        let mut dependents: Vec<String> = state
            .dependencies
            .iter()
            .filter(|(_, deps)| deps.contains(key))
            .map(|(dependent, _)| dependent.clone())
            .collect();
        dependents.sort();
        dependents
    }

    /// The record this interface reads and writes, if it is still alive.
    pub fn record(&self) -> Option<RecordData> {
        self.record.upgrade()
    }
}
