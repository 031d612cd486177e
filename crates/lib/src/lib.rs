//!
//! Refract: a projection-consistent record cache for schemaless documents.
//! This library lets an application treat loosely-typed, deeply nested API
//! payloads as first-class, observably-mutable records.
//!
//! ## Core Concepts
//!
//! * **Record data (`record::RecordData`)**: per-identity cached state —
//!   server-acknowledged values, local overrides, in-flight attributes and a
//!   tree of child record data for nested sub-resources — with ORM-grade
//!   dirty-tracking, commit and rollback semantics over per-key dynamic data.
//! * **Projections**: multiple named views sharing one base record's state.
//!   Writes through any view land on the base; change notifications fan out
//!   to every view.
//! * **Schema (`schema::Schema`)**: a consumer-supplied strategy that
//!   classifies raw values as references, nested models, or opaque data, and
//!   maps projection model names to their bases.
//! * **Resolution (`resolve`)**: lazily materializes classified values into
//!   peer records, child records, or observable collections
//!   (`array::TrackedArray`, `array::ManagedArray`), memoized per key and
//!   invalidated on change.
//! * **Store bridge (`store::RecordStore`)**: the narrow interface the host
//!   ORM implements — identity map, change observation, lifecycle — with
//!   `store::InMemoryStore` as the reference implementation.

pub mod array;
pub mod identity;
pub mod record;
pub mod resolve;
pub mod resource;
pub mod schema;
pub mod store;

pub use array::{ArrayInsert, ArrayMode, ManagedArray, TrackedArray};
pub use identity::{ClientId, RecordIdentity};
pub use record::{AttributeDiff, ChangedAttributes, RecordData};
pub use resolve::{ResolvedValue, resolve_attr};
pub use resource::{RawMap, ResourceObject};
pub use schema::{Classification, NestedPayload, Reference, ReferenceValue, Schema, SchemaInterface};
pub use store::{InMemoryStore, RecordStore, StoreHandle};

/// Result type used throughout the Refract library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the Refract library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Structured schema errors from the schema module
    #[error(transparent)]
    Schema(schema::SchemaError),

    /// Structured record-data errors from the record module
    #[error(transparent)]
    Record(record::RecordError),

    /// Structured collection errors from the array module
    #[error(transparent)]
    Array(array::ArrayError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Serialize(_) => "serialize",
            Error::Schema(_) => "schema",
            Error::Record(_) => "record",
            Error::Array(_) => "array",
        }
    }

    /// Check if this error is a rejected attribute write.
    pub fn is_write_rejected(&self) -> bool {
        match self {
            Error::Schema(schema_err) => schema_err.is_write_rejected(),
            _ => false,
        }
    }

    /// Check if this error is a use-after-destroy.
    pub fn is_destroyed_error(&self) -> bool {
        match self {
            Error::Record(record_err) => record_err.is_destroyed(),
            _ => false,
        }
    }

    /// Check if this error is an identity conflict.
    pub fn is_identity_conflict(&self) -> bool {
        match self {
            Error::Record(record_err) => record_err.is_identity_conflict(),
            _ => false,
        }
    }

    /// Check if this error is a collection bounds violation.
    pub fn is_out_of_bounds(&self) -> bool {
        match self {
            Error::Array(array_err) => array_err.is_out_of_bounds(),
            _ => false,
        }
    }
}
