//! The record-data cache.
//!
//! A [`RecordData`] holds one resource's server-acknowledged state, its
//! locally-changed attributes, the set captured mid-commit, and a parallel
//! tree of child record data for nested sub-resources. Projections of the
//! same identity alias a shared base record data; all shared-attribute reads
//! and writes delegate to the base, and the base fans change notifications
//! out to every registered projection.
//!
//! `RecordData` is a cheap-clone handle over `Rc<RefCell<...>>`; the store
//! and the resolver pass handles around freely. Lifecycle is explicit
//! (`unload_record`/destroy rules), never left to `Drop`.

pub mod children;
pub mod diff;
pub mod errors;
mod projection;


use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::rc::{Rc, Weak};

use serde_json::Value;
use tracing::{debug, trace};

use crate::Result;
use crate::identity::{ClientId, RecordIdentity};
use crate::resolve::cache::ResolvedCache;
use crate::resource::{RawMap, ResourceObject};
use crate::schema::{Classification, NestedPayload, Schema, SchemaInterface};
use crate::store::{NotifyScope, StoreHandle};

pub use children::ChildSlot;
pub use diff::{AttributeDiff, ChangedAttributes};
pub use errors::RecordError;

/// Handle to one record's cached state.
///
/// Cloning shares the underlying state. Equality is identity: two handles
/// are equal iff they point at the same record data.
#[derive(Clone)]
pub struct RecordData {
    pub(crate) inner: Rc<RefCell<Inner>>,
}

/// Weak counterpart of [`RecordData`], used by parent links, projection
/// registries and the global index so lifecycle stays registry-driven.
#[derive(Clone)]
pub struct WeakRecordData(pub(crate) Weak<RefCell<Inner>>);

impl WeakRecordData {
    /// Upgrades to a strong handle if the record data is still alive.
    pub fn upgrade(&self) -> Option<RecordData> {
        self.0.upgrade().map(|inner| RecordData { inner })
    }
}

/// Link from an embedded child back to its owner.
pub(crate) struct ParentLink {
    pub parent: WeakRecordData,
    pub key: String,
    pub index: Option<usize>,
}

pub(crate) struct Inner {
    model_name: String,
    id: Option<String>,
    client_id: ClientId,
    store: StoreHandle,
    schema: Rc<dyn Schema>,
    iface: SchemaInterface,
    /// Last server-acknowledged raw values. Lazily created, never dropped
    /// back to `None` once touched.
    data: Option<RawMap>,
    /// Locally-set values not yet sent to the server. Key presence means
    /// dirty; dirtiness is exact-value based.
    attributes: Option<RawMap>,
    /// The attribute set captured at `will_commit` time.
    in_flight: Option<RawMap>,
    children: HashMap<String, ChildSlot>,
    parent: Option<ParentLink>,
    base: Option<RecordData>,
    /// Present only on a base: the base itself followed by every registered
    /// projection, in registration order.
    projections: Option<Vec<WeakRecordData>>,
    pub(crate) resolved: ResolvedCache,
    is_destroyed: bool,
}

impl Inner {
    fn data_mut(&mut self) -> &mut RawMap {
        self.data.get_or_insert_with(RawMap::new)
    }
}

/// How a payload merge reports and delegates.
enum MergeMode {
    /// `push_data`: server sent fresh state outside a commit.
    Push { calculate_changes: bool },
    /// `did_commit`: server acknowledged a commit with updated state.
    Commit,
}

#[derive(Default)]
struct MergeOutcome {
    /// Changed keys as reported to the host (overridden keys filtered out).
    changed: Vec<String>,
    /// Every key whose raw server value actually changed; drives cache
    /// invalidation even when the host asked for no change calculation.
    touched: Vec<String>,
    delegated: HashSet<String>,
}

impl RecordData {
    /// Creates record data for `(model_name, id)` against `store`.
    ///
    /// If the store's schema maps `model_name` to a base model, the base
    /// record data is looked up (or created) through the store's identity
    /// map and this record registers itself as a projection of it.
    ///
    /// # Panics
    /// Panics if the schema's `compute_base_model_name` returns its own
    /// input (a projection cannot be its own base).
    pub fn new(store: StoreHandle, model_name: &str, id: Option<&str>) -> Self {
        Self::build(store, model_name, id, None)
    }

    /// Creates an embedded child record parented under `parent`.
    pub(crate) fn new_child(
        store: StoreHandle,
        model_name: &str,
        id: Option<&str>,
        parent: ParentLink,
    ) -> Self {
        Self::build(store, model_name, id, Some(parent))
    }

    fn build(
        store: StoreHandle,
        model_name: &str,
        id: Option<&str>,
        parent: Option<ParentLink>,
    ) -> Self {
        let schema = store.schema();
        let base = match schema.compute_base_model_name(model_name) {
            Some(base_name) => {
                assert!(
                    base_name != model_name,
                    "compute_base_model_name for '{model_name}' returned the model itself"
                );
                // An id-less record cannot alias a base: bases are shared
                // through the identity map, which needs an id to key on.
                id.map(|id| store.record_data_for(&base_name, Some(id)))
            }
            None => None,
        };
        let client_id = ClientId::new();
        let inner = Rc::new_cyclic(|weak: &Weak<RefCell<Inner>>| {
            RefCell::new(Inner {
                model_name: model_name.to_string(),
                id: id.map(str::to_string),
                client_id,
                store: store.clone(),
                schema: schema.clone(),
                iface: SchemaInterface::new(WeakRecordData(weak.clone()), model_name),
                data: None,
                attributes: None,
                in_flight: None,
                children: HashMap::new(),
                parent,
                base: base.clone(),
                projections: None,
                resolved: ResolvedCache::default(),
                is_destroyed: false,
            })
        });
        let record = RecordData { inner };
        if let Some(base) = &base {
            base.register_projection(&record);
        }
        debug!(model = model_name, id = ?id, client_id = %client_id, projection = base.is_some(), "created record data");
        record
    }

    // --- identity ---------------------------------------------------------

    /// The record's model name.
    pub fn model_name(&self) -> String {
        self.inner.borrow().model_name.clone()
    }

    /// The server-assigned id, if known.
    pub fn id(&self) -> Option<String> {
        self.inner.borrow().id.clone()
    }

    /// The stable locally-minted id.
    pub fn client_id(&self) -> ClientId {
        self.inner.borrow().client_id
    }

    /// The full identity triple.
    pub fn identity(&self) -> RecordIdentity {
        let inner = self.inner.borrow();
        RecordIdentity::new(inner.model_name.clone(), inner.id.clone(), inner.client_id)
    }

    /// Assigns the server id. Used by the store when adopting an id outside
    /// a commit; `did_commit` payloads adopt ids themselves.
    pub fn set_id(&self, id: &str) {
        self.inner.borrow_mut().id = Some(id.to_string());
    }

    /// True once the record data has been destroyed.
    pub fn is_destroyed(&self) -> bool {
        self.inner.borrow().is_destroyed
    }

    /// True if this record data is a projection over a shared base.
    pub fn is_projection(&self) -> bool {
        self.inner.borrow().base.is_some()
    }

    /// The shared base record data, if this is a projection.
    pub fn base_record_data(&self) -> Option<RecordData> {
        self.inner.borrow().base.clone()
    }

    /// True if this record data mirrors an embedded sub-resource.
    pub fn is_embedded(&self) -> bool {
        self.inner.borrow().parent.is_some()
    }

    /// The owning record data, if this is an embedded child.
    pub fn parent_record_data(&self) -> Option<RecordData> {
        self.inner
            .borrow()
            .parent
            .as_ref()
            .and_then(|link| link.parent.upgrade())
    }

    /// True if both handles point at the same record data.
    pub fn same_record(&self, other: &RecordData) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn downgrade(&self) -> WeakRecordData {
        WeakRecordData(Rc::downgrade(&self.inner))
    }

    pub(crate) fn store(&self) -> StoreHandle {
        self.inner.borrow().store.clone()
    }

    /// The schema strategy shared by every record in the store.
    pub fn schema(&self) -> Rc<dyn Schema> {
        self.inner.borrow().schema.clone()
    }

    /// The long-lived schema sandbox scoped to this record.
    pub fn schema_interface(&self) -> SchemaInterface {
        self.inner.borrow().iface.clone()
    }

    pub(crate) fn ensure_alive(&self) -> Result<()> {
        let inner = self.inner.borrow();
        if inner.is_destroyed {
            return Err(RecordError::Destroyed {
                model: inner.model_name.clone(),
                client_id: inner.client_id,
            }
            .into());
        }
        Ok(())
    }

    // --- attribute access -------------------------------------------------

    /// Reads an attribute: local override, then in-flight, then server.
    pub fn get_attr(&self, key: &str) -> Option<Value> {
        if let Some(base) = self.base_record_data() {
            return base.get_attr(key);
        }
        let inner = self.inner.borrow();
        inner
            .attributes
            .as_ref()
            .and_then(|m| m.get(key))
            .or_else(|| inner.in_flight.as_ref().and_then(|m| m.get(key)))
            .or_else(|| inner.data.as_ref().and_then(|m| m.get(key)))
            .cloned()
    }

    /// Reads the last server-acknowledged value only.
    pub fn server_attr(&self, key: &str) -> Option<Value> {
        if let Some(base) = self.base_record_data() {
            return base.server_attr(key);
        }
        self.inner
            .borrow()
            .data
            .as_ref()
            .and_then(|m| m.get(key))
            .cloned()
    }

    /// True if any layer holds a value for `key`.
    pub fn has_attr(&self, key: &str) -> bool {
        if let Some(base) = self.base_record_data() {
            return base.has_attr(key);
        }
        let inner = self.inner.borrow();
        [&inner.attributes, &inner.in_flight, &inner.data]
            .into_iter()
            .any(|layer| layer.as_ref().is_some_and(|m| m.contains_key(key)))
    }

    /// True if `key` has a local, uncommitted override.
    pub fn has_local_attr(&self, key: &str) -> bool {
        if let Some(base) = self.base_record_data() {
            return base.has_local_attr(key);
        }
        self.inner
            .borrow()
            .attributes
            .as_ref()
            .is_some_and(|m| m.contains_key(key))
    }

    /// Alias of [`has_local_attr`](Self::has_local_attr).
    pub fn is_attr_dirty(&self, key: &str) -> bool {
        self.has_local_attr(key)
    }

    /// Visits every attribute key (server, in-flight and local union) with
    /// its currently-visible value, in sorted key order.
    pub fn for_each_attribute(&self, mut f: impl FnMut(&str, &Value)) {
        if let Some(base) = self.base_record_data() {
            return base.for_each_attribute(f);
        }
        let keys: BTreeSet<String> = {
            let inner = self.inner.borrow();
            [&inner.data, &inner.in_flight, &inner.attributes]
                .into_iter()
                .flatten()
                .flat_map(|m| m.keys().cloned())
                .collect()
        };
        for key in keys {
            if let Some(value) = self.get_attr(&key) {
                f(&key, &value);
            }
        }
    }

    /// Writes a local attribute override.
    ///
    /// Setting a key back to its original value (in-flight if a commit is
    /// pending, else the server value) removes the override instead, so
    /// dirtiness stays exact. Notification goes through the projection
    /// fan-out unless suppressed.
    pub fn set_attr(&self, key: &str, value: Value, suppress_notifications: bool) -> Result<()> {
        self.ensure_alive()?;
        if let Some(base) = self.base_record_data() {
            return base.set_attr(key, value, suppress_notifications);
        }
        let _scope = NotifyScope::enter(self.store());
        {
            let mut inner = self.inner.borrow_mut();
            let original = inner
                .in_flight
                .as_ref()
                .and_then(|m| m.get(key))
                .or_else(|| inner.data.as_ref().and_then(|m| m.get(key)))
                .cloned();
            if original.as_ref() == Some(&value) {
                if let Some(attrs) = inner.attributes.as_mut() {
                    attrs.remove(key);
                }
            } else {
                inner
                    .attributes
                    .get_or_insert_with(RawMap::new)
                    .insert(key.to_string(), value);
            }
        }
        self.invalidate_attributes(&[key.to_string()]);
        if !suppress_notifications {
            self.notify_attributes_changed(&[key.to_string()]);
        }
        Ok(())
    }

    // --- payload ingestion ------------------------------------------------

    /// Merges a server payload into `data`.
    ///
    /// Changed keys are reported only when `calculate_changes` is set, and
    /// never include keys whose update was absorbed by a reusable child
    /// record (the child's own notification path covers those) or keys that
    /// still carry a local override. A projection delegates entirely to its
    /// base and reports no keys; the base's fan-out covers every projection.
    pub fn push_data(
        &self,
        resource: &ResourceObject,
        calculate_changes: bool,
        notify: bool,
    ) -> Result<Vec<String>> {
        self.ensure_alive()?;
        if let Some(base) = self.base_record_data() {
            base.push_data(resource, calculate_changes, notify)?;
            return Ok(Vec::new());
        }
        let _scope = NotifyScope::enter(self.store());
        trace!(model = %self.model_name(), id = ?self.id(), "pushing resource data");
        let outcome = self.merge_updates(
            resource.attributes.as_ref(),
            MergeMode::Push { calculate_changes },
        )?;
        self.invalidate_attributes(&outcome.touched);
        if notify {
            self.notify_attributes_changed(&outcome.changed);
        }
        Ok(outcome.changed)
    }

    fn merge_updates(&self, new_attrs: Option<&RawMap>, mode: MergeMode) -> Result<MergeOutcome> {
        let mut outcome = MergeOutcome::default();
        let Some(new_attrs) = new_attrs else {
            return Ok(outcome);
        };
        let calculate = match mode {
            MergeMode::Push { calculate_changes } => calculate_changes,
            MergeMode::Commit => true,
        };
        for (key, incoming) in new_attrs {
            // A single reusable child absorbs the update in place so the
            // consumer keeps the same materialized sub-record.
            let existing = self.child_slot(key);
            if let Some(ChildSlot::Single(child)) = &existing {
                let classified = {
                    let schema = self.schema();
                    let iface = self.schema_interface();
                    schema.compute_attribute(key, incoming, &self.model_name(), &iface)
                };
                if let Classification::Nested(nested) = classified
                    && child.matches_nested(&nested)
                {
                    let child_resource = nested.to_resource();
                    match mode {
                        MergeMode::Push { .. } => {
                            child.push_data(&child_resource, true, true)?;
                        }
                        MergeMode::Commit => {
                            child.did_commit(Some(&child_resource), true)?;
                        }
                    }
                    outcome.delegated.insert(key.clone());
                    continue;
                }
            }
            if existing.is_some() {
                self.remove_child_slot(key, true);
            }
            let value_changed = {
                let mut inner = self.inner.borrow_mut();
                let changed = inner.data.as_ref().and_then(|m| m.get(key)) != Some(incoming);
                inner.data_mut().insert(key.clone(), incoming.clone());
                changed
            };
            if value_changed {
                outcome.touched.push(key.clone());
                if calculate {
                    outcome.changed.push(key.clone());
                }
            }
        }
        // No phantom dirtiness: drop local overrides the server just equalled.
        {
            let mut inner = self.inner.borrow_mut();
            let Inner {
                attributes, data, ..
            } = &mut *inner;
            if let (Some(attrs), Some(data)) = (attributes.as_mut(), data.as_ref()) {
                for key in new_attrs.keys() {
                    if attrs.get(key).is_some_and(|local| data.get(key) == Some(local)) {
                        attrs.remove(key);
                    }
                }
            }
        }
        // The consumer observes local overrides, not the server churn under
        // them; overridden keys are not reported as changed.
        {
            let inner = self.inner.borrow();
            if let Some(attrs) = inner.attributes.as_ref() {
                outcome.changed.retain(|key| !attrs.contains_key(key));
            }
        }
        Ok(outcome)
    }

    pub(crate) fn matches_nested(&self, nested: &NestedPayload) -> bool {
        let inner = self.inner.borrow();
        inner.model_name == nested.model_type && inner.id == nested.id
    }

    // --- commit state machine ---------------------------------------------

    /// Captures the local attribute set as in-flight.
    ///
    /// Recurses into every child. If a commit is already in flight, the new
    /// local set is merged over the surviving in-flight set rather than
    /// clobbering it.
    pub fn will_commit(&self) -> Result<()> {
        self.ensure_alive()?;
        if let Some(base) = self.base_record_data() {
            return base.will_commit();
        }
        {
            let mut inner = self.inner.borrow_mut();
            if let Some(staged) = inner.attributes.take() {
                let in_flight = inner.in_flight.get_or_insert_with(RawMap::new);
                for (key, value) in staged {
                    in_flight.insert(key, value);
                }
            }
        }
        for (_, slot) in self.children_snapshot() {
            slot.try_for_each(|child| child.will_commit())?;
        }
        Ok(())
    }

    /// Applies a successful commit: in-flight values become server state,
    /// then the acknowledgment payload is merged on top.
    ///
    /// Children reached through the payload are committed with their slice
    /// of it; all other children are committed with no payload so their
    /// in-flight state settles too. There is no cross-level rollback: if a
    /// child's commit fails, earlier children stay committed and the error
    /// propagates.
    pub fn did_commit(
        &self,
        resource: Option<&ResourceObject>,
        notify: bool,
    ) -> Result<Vec<String>> {
        self.ensure_alive()?;
        if let Some(base) = self.base_record_data() {
            base.did_commit(resource, notify)?;
            return Ok(Vec::new());
        }
        let _scope = NotifyScope::enter(self.store());
        if let Some(resource) = resource
            && let Some(new_id) = &resource.id
        {
            match self.id() {
                None => {
                    self.inner.borrow_mut().id = Some(new_id.clone());
                    if self.parent_record_data().is_none() {
                        let identity = self.identity();
                        self.store().set_record_id(&identity, new_id);
                    }
                }
                Some(existing) if existing != *new_id => {
                    return Err(RecordError::IdReassignment {
                        model: self.model_name(),
                        existing,
                        incoming: new_id.clone(),
                    }
                    .into());
                }
                Some(_) => {}
            }
        }
        debug!(model = %self.model_name(), id = ?self.id(), "commit acknowledged");
        {
            let mut inner = self.inner.borrow_mut();
            if let Some(in_flight) = inner.in_flight.take() {
                let data = inner.data_mut();
                for (key, value) in in_flight {
                    data.insert(key, value);
                }
            }
        }
        let outcome = match resource {
            Some(resource) => self.merge_updates(resource.attributes.as_ref(), MergeMode::Commit)?,
            None => MergeOutcome::default(),
        };
        self.prune_clean_local_overrides();
        for (key, slot) in self.children_snapshot() {
            if outcome.delegated.contains(&key) {
                continue;
            }
            slot.try_for_each(|child| child.did_commit(None, notify).map(|_| ()))?;
        }
        self.invalidate_attributes(&outcome.touched);
        if notify {
            self.notify_attributes_changed(&outcome.changed);
        }
        Ok(outcome.changed)
    }

    /// Applies a failed commit: in-flight values return to the local set,
    /// with values written during the flight winning over the captured ones.
    pub fn commit_was_rejected(&self) -> Result<()> {
        self.ensure_alive()?;
        if let Some(base) = self.base_record_data() {
            return base.commit_was_rejected();
        }
        {
            let mut inner = self.inner.borrow_mut();
            let mut merged = inner.in_flight.take().unwrap_or_default();
            if let Some(local) = inner.attributes.take() {
                for (key, value) in local {
                    merged.insert(key, value);
                }
            }
            if !merged.is_empty() {
                inner.attributes = Some(merged);
            }
        }
        for (_, slot) in self.children_snapshot() {
            slot.try_for_each(|child| child.commit_was_rejected())?;
        }
        Ok(())
    }

    fn prune_clean_local_overrides(&self) {
        let mut inner = self.inner.borrow_mut();
        let Inner {
            attributes, data, ..
        } = &mut *inner;
        if let (Some(attrs), Some(data)) = (attributes.as_mut(), data.as_ref()) {
            attrs.retain(|key, local| data.get(key) != Some(local));
        }
    }

    // --- rollback and change reporting ------------------------------------

    /// Discards local and in-flight attributes, recursing into children.
    ///
    /// Returns exactly the keys whose visible value changed at this level
    /// (descendant levels notify through their own identities).
    pub fn rollback_attributes(&self, notify: bool) -> Result<Vec<String>> {
        self.ensure_alive()?;
        if let Some(base) = self.base_record_data() {
            return base.rollback_attributes(notify);
        }
        let _scope = NotifyScope::enter(self.store());
        let changed = {
            let mut inner = self.inner.borrow_mut();
            let mut keys: Vec<String> = Vec::new();
            for layer in [&inner.attributes, &inner.in_flight].into_iter().flatten() {
                for key in layer.keys() {
                    if !keys.contains(key) {
                        keys.push(key.clone());
                    }
                }
            }
            let mut changed = Vec::new();
            for key in keys {
                let before = inner
                    .attributes
                    .as_ref()
                    .and_then(|m| m.get(&key))
                    .or_else(|| inner.in_flight.as_ref().and_then(|m| m.get(&key)));
                let after = inner.data.as_ref().and_then(|m| m.get(&key));
                if before != after {
                    changed.push(key);
                }
            }
            inner.attributes = None;
            inner.in_flight = None;
            changed
        };
        for (_, slot) in self.children_snapshot() {
            slot.try_for_each(|child| child.rollback_attributes(notify).map(|_| ()))?;
        }
        self.invalidate_attributes(&changed);
        if notify {
            self.notify_attributes_changed(&changed);
        }
        Ok(changed)
    }

    /// The pending local change set.
    ///
    /// Primitive keys map to `[server value, current value]`; a nested child
    /// key maps to the child's own change map, and an array child key to an
    /// index-aligned vector with `None` placeholders for unchanged elements.
    pub fn changed_attributes(&self) -> ChangedAttributes {
        if let Some(base) = self.base_record_data() {
            return base.changed_attributes();
        }
        let mut changes = ChangedAttributes::new();
        {
            let inner = self.inner.borrow();
            let mut keys: Vec<&String> = Vec::new();
            for layer in [&inner.in_flight, &inner.attributes].into_iter().flatten() {
                for key in layer.keys() {
                    if !keys.contains(&key) {
                        keys.push(key);
                    }
                }
            }
            for key in keys {
                let old = inner.data.as_ref().and_then(|m| m.get(key)).cloned();
                let new = inner
                    .attributes
                    .as_ref()
                    .and_then(|m| m.get(key))
                    .or_else(|| inner.in_flight.as_ref().and_then(|m| m.get(key)))
                    .cloned();
                changes.insert(key.clone(), AttributeDiff::Value { old, new });
            }
        }
        for (key, slot) in self.children_snapshot() {
            match slot {
                ChildSlot::Single(child) => {
                    let nested = child.changed_attributes();
                    if !nested.is_empty() {
                        changes.insert(key, AttributeDiff::Nested(nested));
                    }
                }
                ChildSlot::Many(elements) => {
                    let per_index: Vec<Option<ChangedAttributes>> = elements
                        .iter()
                        .map(|element| {
                            element
                                .as_ref()
                                .map(|child| child.changed_attributes())
                                .filter(|nested| !nested.is_empty())
                        })
                        .collect();
                    if per_index.iter().any(Option::is_some) {
                        changes.insert(key, AttributeDiff::NestedArray(per_index));
                    }
                }
            }
        }
        changes
    }

    /// True if this record or any descendant carries a local override.
    pub fn has_changed_attributes(&self) -> bool {
        if let Some(base) = self.base_record_data() {
            return base.has_changed_attributes();
        }
        {
            let inner = self.inner.borrow();
            if inner.attributes.as_ref().is_some_and(|m| !m.is_empty()) {
                return true;
            }
        }
        self.children_snapshot().iter().any(|(_, slot)| {
            let mut dirty = false;
            slot.for_each(|child| dirty = dirty || child.has_changed_attributes());
            dirty
        })
    }

    // --- notification -----------------------------------------------------

    fn expand_with_dependents(&self, keys: &[String]) -> Vec<String> {
        let iface = self.schema_interface();
        let mut expanded: Vec<String> = keys.to_vec();
        for key in keys {
            for dependent in iface.dependent_keys_of(key) {
                if !expanded.contains(&dependent) {
                    expanded.push(dependent);
                }
            }
        }
        expanded
    }

    /// Marks resolved-value caches stale for `keys` (and their recorded
    /// dependents) on every notification target. Runs on every raw-value
    /// change, whether or not the host asked to be notified.
    pub(crate) fn invalidate_attributes(&self, keys: &[String]) {
        if keys.is_empty() {
            return;
        }
        let expanded = self.expand_with_dependents(keys);
        for target in self.notification_targets() {
            for key in &expanded {
                target.invalidate_resolved(key);
            }
        }
    }

    /// Invalidates resolved-value caches and enqueues change notifications
    /// for `keys`, expanded with their recorded dependent keys, to every
    /// notification target (the base fan-out when projections are
    /// registered, else this record alone).
    pub(crate) fn notify_attributes_changed(&self, keys: &[String]) {
        if keys.is_empty() {
            return;
        }
        let expanded = self.expand_with_dependents(keys);
        let store = self.store();
        for target in self.notification_targets() {
            for key in &expanded {
                target.invalidate_resolved(key);
                store.buffer().enqueue(target.identity(), key.clone());
            }
        }
    }

    /// The records whose hosts observe a change to this record's state:
    /// every live registered projection (base first, registration order)
    /// when a fan-out applies, else this record alone.
    fn notification_targets(&self) -> Vec<RecordData> {
        let live: Vec<RecordData> = {
            let inner = self.inner.borrow();
            match &inner.projections {
                Some(list) => list
                    .iter()
                    .filter_map(WeakRecordData::upgrade)
                    .filter(|p| p.same_record(self) || !p.is_destroyed())
                    .collect(),
                None => Vec::new(),
            }
        };
        // A base with no registered projections beyond itself has no active
        // fan-out.
        if live.len() > 1 { live } else { vec![self.clone()] }
    }

    pub(crate) fn invalidate_resolved(&self, key: &str) {
        self.inner.borrow().resolved.invalidate(key);
    }

    /// Re-hangs an embedded child under a new owner/key/index. Used when an
    /// already-materialized sub-record moves between containers.
    pub(crate) fn set_parent_link(&self, link: ParentLink) {
        self.inner.borrow_mut().parent = Some(link);
    }
}

impl PartialEq for RecordData {
    fn eq(&self, other: &Self) -> bool {
        self.same_record(other)
    }
}

impl Eq for RecordData {}

impl std::fmt::Debug for RecordData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("RecordData")
            .field("model_name", &inner.model_name)
            .field("id", &inner.id)
            .field("client_id", &inner.client_id)
            .field("projection", &inner.base.is_some())
            .field("embedded", &inner.parent.is_some())
            .field("destroyed", &inner.is_destroyed)
            .finish_non_exhaustive()
    }
}
