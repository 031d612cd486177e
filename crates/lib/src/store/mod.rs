//! Host store bridge.
//!
//! Refract does not own an ORM; the host supplies identity-map lookup,
//! record instantiation and change observation through the [`RecordStore`]
//! trait. [`InMemoryStore`] is the reference implementation, used by the
//! test suite and suitable as a starting point for embedding.

pub mod in_memory;
pub mod index;
pub mod notify;


use std::rc::Rc;

use crate::identity::RecordIdentity;
use crate::record::RecordData;
use crate::schema::Schema;

pub use in_memory::InMemoryStore;
pub use index::GlobalIndex;
pub use notify::{NotifyBuffer, NotifyScope};

/// Shared handle to the host store bridge.
pub type StoreHandle = Rc<dyn RecordStore>;

/// The narrow interface record data consumes from its host store.
///
/// Implementations own the identity map, the schema strategy, the global
/// type-erased index and the notification buffer; record data calls back
/// into them for lookup, lifecycle and observation.
pub trait RecordStore {
    /// The schema strategy injected into this store.
    fn schema(&self) -> Rc<dyn Schema>;

    /// The store's notification buffer. Mutating operations open a
    /// [`NotifyScope`] on it so notifications coalesce per outer operation.
    fn buffer(&self) -> &NotifyBuffer;

    /// Identity-map lookup, creating the record data on first access.
    fn record_data_for(&self, model_name: &str, id: Option<&str>) -> RecordData;

    /// Identity-map lookup without creation. A `model_name` of `None`
    /// resolves `id` through the global type-erased index.
    fn peek_record_data(&self, model_name: Option<&str>, id: &str) -> Option<RecordData>;

    /// Delivers one coalesced attribute-change notification to the host.
    fn notify_property_change(&self, identity: &RecordIdentity, key: &str);

    /// Drops the identity from the host's maps after destruction.
    fn disconnect_record(&self, identity: &RecordIdentity);

    /// Host predicate keeping a base alive beyond its projections.
    fn is_record_in_use(&self, identity: &RecordIdentity) -> bool;

    /// Records that `identity` now answers to the server id `id`.
    fn set_record_id(&self, identity: &RecordIdentity, id: &str);
}
