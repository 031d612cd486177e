//! In-memory reference store.
//!
//! Owns the identity map, the global index and the notification buffer,
//! and records delivered notifications so tests (and embedders without an
//! observation system) can inspect them.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::{Rc, Weak};

use tracing::trace;

use crate::identity::{ClientId, RecordIdentity};
use crate::record::RecordData;
use crate::schema::Schema;
use crate::store::{GlobalIndex, NotifyBuffer, RecordStore, StoreHandle};

/// Reference [`RecordStore`] implementation backed by in-process maps.
///
/// Construct with [`InMemoryStore::new`], which injects the schema strategy
/// shared by every record in the store.
pub struct InMemoryStore {
    self_ref: Weak<InMemoryStore>,
    schema: Rc<dyn Schema>,
    buffer: NotifyBuffer,
    /// Every live record data, keyed by its stable client id.
    records: RefCell<HashMap<ClientId, RecordData>>,
    /// `(model_name, id)` to client id, for identity-map lookup.
    by_identity: RefCell<HashMap<(String, String), ClientId>>,
    index: GlobalIndex,
    in_use: RefCell<HashSet<ClientId>>,
    notifications: RefCell<Vec<(RecordIdentity, String)>>,
}

impl InMemoryStore {
    /// Creates a store around the given schema strategy.
    pub fn new(schema: Rc<dyn Schema>) -> Rc<Self> {
        Rc::new_cyclic(|weak| Self {
            self_ref: weak.clone(),
            schema,
            buffer: NotifyBuffer::new(),
            records: RefCell::new(HashMap::new()),
            by_identity: RefCell::new(HashMap::new()),
            index: GlobalIndex::new(),
            in_use: RefCell::new(HashSet::new()),
            notifications: RefCell::new(Vec::new()),
        })
    }

    /// This store as a [`StoreHandle`] for record construction.
    pub fn handle(self: &Rc<Self>) -> StoreHandle {
        self.clone()
    }

    fn store_handle(&self) -> StoreHandle {
        // While `&self` exists the owning Rc is alive. Infallible.
        self.self_ref
            .upgrade()
            .expect("store outlives the records it serves")
    }

    /// The global type-erased index.
    pub fn global_index(&self) -> &GlobalIndex {
        &self.index
    }

    /// Marks a record as in use (or not) by the host, which keeps a base
    /// alive beyond the last of its projections.
    pub fn mark_in_use(&self, record: &RecordData, in_use: bool) {
        let mut set = self.in_use.borrow_mut();
        if in_use {
            set.insert(record.client_id());
        } else {
            set.remove(&record.client_id());
        }
    }

    /// Number of live records in the identity map.
    pub fn record_count(&self) -> usize {
        self.records.borrow().len()
    }

    /// Drains and returns the notifications delivered so far.
    pub fn take_notifications(&self) -> Vec<(RecordIdentity, String)> {
        std::mem::take(&mut *self.notifications.borrow_mut())
    }
}

impl RecordStore for InMemoryStore {
    fn schema(&self) -> Rc<dyn Schema> {
        self.schema.clone()
    }

    fn buffer(&self) -> &NotifyBuffer {
        &self.buffer
    }

    fn record_data_for(&self, model_name: &str, id: Option<&str>) -> RecordData {
        if let Some(id) = id {
            let existing = self
                .by_identity
                .borrow()
                .get(&(model_name.to_string(), id.to_string()))
                .copied();
            if let Some(client_id) = existing
                && let Some(record) = self.records.borrow().get(&client_id).cloned()
            {
                return record;
            }
        }
        // No borrows held here: construction may recurse back into this
        // method to create a projection's base.
        let record = RecordData::new(self.store_handle(), model_name, id);
        self.records
            .borrow_mut()
            .insert(record.client_id(), record.clone());
        if let Some(id) = id {
            self.by_identity
                .borrow_mut()
                .insert((model_name.to_string(), id.to_string()), record.client_id());
            self.index.insert(id, &record);
        }
        record
    }

    fn peek_record_data(&self, model_name: Option<&str>, id: &str) -> Option<RecordData> {
        let record = match model_name {
            Some(model) => {
                let client_id = self
                    .by_identity
                    .borrow()
                    .get(&(model.to_string(), id.to_string()))
                    .copied()?;
                self.records.borrow().get(&client_id).cloned()
            }
            None => self.index.lookup(id),
        };
        record.filter(|record| !record.is_destroyed())
    }

    fn notify_property_change(&self, identity: &RecordIdentity, key: &str) {
        trace!(identity = %identity, key, "property change");
        self.notifications
            .borrow_mut()
            .push((identity.clone(), key.to_string()));
    }

    fn disconnect_record(&self, identity: &RecordIdentity) {
        let removed = self.records.borrow_mut().remove(&identity.client_id);
        if let Some(id) = &identity.id {
            let mut by_identity = self.by_identity.borrow_mut();
            let key = (identity.model_name.clone(), id.clone());
            if by_identity.get(&key) == Some(&identity.client_id) {
                by_identity.remove(&key);
            }
            if let Some(record) = &removed {
                self.index.remove(id, record);
            }
        }
        self.in_use.borrow_mut().remove(&identity.client_id);
    }

    fn is_record_in_use(&self, identity: &RecordIdentity) -> bool {
        self.in_use.borrow().contains(&identity.client_id)
    }

    fn set_record_id(&self, identity: &RecordIdentity, id: &str) {
        self.by_identity
            .borrow_mut()
            .insert((identity.model_name.clone(), id.to_string()), identity.client_id);
        let record = self.records.borrow().get(&identity.client_id).cloned();
        if let Some(record) = record {
            if record.id().is_none() {
                record.set_id(id);
            }
            self.index.insert(id, &record);
        }
    }
}
