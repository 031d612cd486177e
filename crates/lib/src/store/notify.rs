//! Coalesced change-notification flushing.
//!
//! Every mutating entry point opens a [`NotifyScope`] before touching
//! record state. Notifications raised anywhere inside the scope (including
//! recursive child and projection work) land in the store's
//! [`NotifyBuffer`] and are delivered to the host in one flush when the
//! outermost scope ends, so observers never see a partially-updated graph.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;

use crate::identity::{ClientId, RecordIdentity};
use crate::store::StoreHandle;

/// Per-store queue of pending `(identity, key)` change notifications.
///
/// Duplicate `(record, key)` pairs within one flush are coalesced, keeping
/// the first occurrence's position.
#[derive(Default)]
pub struct NotifyBuffer {
    depth: Cell<usize>,
    pending: RefCell<Vec<(RecordIdentity, String)>>,
    seen: RefCell<HashSet<(ClientId, String)>>,
}

impl NotifyBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a notification for delivery at the next flush.
    pub fn enqueue(&self, identity: RecordIdentity, key: String) {
        let mut seen = self.seen.borrow_mut();
        if seen.insert((identity.client_id, key.clone())) {
            self.pending.borrow_mut().push((identity, key));
        }
    }

    /// Number of notifications waiting for the next flush.
    pub fn pending_len(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Current scope nesting depth.
    pub fn depth(&self) -> usize {
        self.depth.get()
    }

    fn begin(&self) {
        self.depth.set(self.depth.get() + 1);
    }

    /// Returns true when the outermost scope just ended.
    fn end(&self) -> bool {
        let depth = self.depth.get();
        debug_assert!(depth > 0, "notify scope underflow");
        self.depth.set(depth.saturating_sub(1));
        depth == 1
    }

    fn drain(&self) -> Vec<(RecordIdentity, String)> {
        self.seen.borrow_mut().clear();
        std::mem::take(&mut *self.pending.borrow_mut())
    }
}

/// RAII guard marking one logical operation.
///
/// Nested scopes (recursive `push_data`, projection delegation, array
/// stitching) never flush early; only dropping the outermost scope delivers
/// the queued notifications to the host store.
pub struct NotifyScope {
    store: StoreHandle,
}

impl NotifyScope {
    /// Opens a scope on the store's buffer.
    pub fn enter(store: StoreHandle) -> Self {
        store.buffer().begin();
        Self { store }
    }
}

impl Drop for NotifyScope {
    fn drop(&mut self) {
        if self.store.buffer().end() {
            // A host callback may queue follow-up notifications; keep
            // flushing until the buffer stays empty.
            loop {
                let batch = self.store.buffer().drain();
                if batch.is_empty() {
                    break;
                }
                for (identity, key) in batch {
                    self.store.notify_property_change(&identity, &key);
                }
            }
        }
    }
}
