//! Projection registry and record lifecycle.
//!
//! A base record data keeps an explicit registry of the projections that
//! alias it, seeded with the base itself. The registry drives both the
//! notification fan-out and destruction: a base dies only once no live
//! projection remains and the host reports it unused, while a projection
//! may always be unloaded individually.

use tracing::{debug, trace};

use crate::record::{RecordData, WeakRecordData};

impl RecordData {
    /// Registers `projection` as an alias of this base, seeding the
    /// registry with the base itself on first registration.
    pub(crate) fn register_projection(&self, projection: &RecordData) {
        trace!(base = %self.model_name(), projection = %projection.model_name(), "registering projection");
        let own = self.downgrade();
        let mut inner = self.inner.borrow_mut();
        inner
            .projections
            .get_or_insert_with(|| vec![own])
            .push(projection.downgrade());
    }

    fn unregister_projection(&self, projection: &RecordData) {
        let mut inner = self.inner.borrow_mut();
        if let Some(list) = inner.projections.as_mut() {
            list.retain(|entry| match entry.upgrade() {
                Some(record) => !record.same_record(projection),
                // Dropped entries are dead weight either way.
                None => false,
            });
        }
    }

    /// True if any registered projection other than the base itself is
    /// still alive.
    pub fn has_live_projections(&self) -> bool {
        let inner = self.inner.borrow();
        match &inner.projections {
            Some(list) => list
                .iter()
                .filter_map(WeakRecordData::upgrade)
                .any(|record| !record.same_record(self) && !record.is_destroyed()),
            None => false,
        }
    }

    /// Unloads this record data, applying the destruction rules.
    ///
    /// A projection is always destroyed; its base follows when it has no
    /// other live projection and the host does not report it in use. A base
    /// is destroyed only under those same two conditions. Returns whether
    /// this record data ended up destroyed.
    pub fn unload_record(&self) -> bool {
        if self.is_destroyed() {
            return true;
        }
        match self.base_record_data() {
            Some(base) => {
                self.destroy();
                base.unregister_projection(self);
                if !base.is_destroyed()
                    && !base.has_live_projections()
                    && !base.store().is_record_in_use(&base.identity())
                {
                    base.destroy();
                }
                true
            }
            None => {
                if self.has_live_projections() || self.store().is_record_in_use(&self.identity()) {
                    false
                } else {
                    self.destroy();
                    true
                }
            }
        }
    }

    /// Tears the record data down: children are destroyed recursively, the
    /// resolved-value cache is dropped, and the host store is told to
    /// disconnect the identity. Idempotent.
    pub(crate) fn destroy(&self) {
        if self.is_destroyed() {
            return;
        }
        debug!(model = %self.model_name(), id = ?self.id(), "destroying record data");
        let children = {
            let mut inner = self.inner.borrow_mut();
            inner.is_destroyed = true;
            inner.resolved.clear();
            std::mem::take(&mut inner.children)
        };
        for (_, slot) in children {
            slot.for_each(|child| child.destroy());
        }
        let identity = self.identity();
        self.store().disconnect_record(&identity);
    }
}
