//! Type-erased record lookup by bare id.
//!
//! References whose `type` is unknown resolve through this session-scoped
//! registry instead of a typed identity map. The index is owned by the
//! store and passed down the call chain; it is not ambient global state.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::record::{RecordData, WeakRecordData};

/// Registry of bare id to record, with weak entries.
///
/// Ids are assumed unique across types by whoever mints them; inserting an
/// id twice keeps the later record.
#[derive(Default)]
pub struct GlobalIndex {
    entries: RefCell<HashMap<String, WeakRecordData>>,
}

impl GlobalIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `record` under `id`.
    pub fn insert(&self, id: &str, record: &RecordData) {
        self.entries
            .borrow_mut()
            .insert(id.to_string(), record.downgrade());
    }

    /// Looks up the live record registered under `id`, pruning the entry if
    /// the record has gone away.
    pub fn lookup(&self, id: &str) -> Option<RecordData> {
        let found = self
            .entries
            .borrow()
            .get(id)
            .and_then(WeakRecordData::upgrade);
        match found {
            Some(record) if !record.is_destroyed() => Some(record),
            _ => {
                self.entries.borrow_mut().remove(id);
                None
            }
        }
    }

    /// Drops the entry for `id` if it points at `record`.
    pub fn remove(&self, id: &str, record: &RecordData) {
        let mut entries = self.entries.borrow_mut();
        let matches = entries
            .get(id)
            .and_then(WeakRecordData::upgrade)
            .is_none_or(|entry| entry.same_record(record));
        if matches {
            entries.remove(id);
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries
            .borrow()
            .values()
            .filter(|entry| entry.upgrade().is_some())
            .count()
    }

    /// True if no live entry remains.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
