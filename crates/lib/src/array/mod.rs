//! Observable collections over resolved attribute values.
//!
//! Two shapes exist, mirroring the two ways a raw array resolves:
//! [`TrackedArray`] wraps a list of unresolved references and resolves them
//! on first read; [`ManagedArray`] wraps resolved content (nested records,
//! peer records, primitives) and keeps the owning record's child structures
//! in sync through diff-based [`replace`](ManagedArray::replace). A managed
//! array's mode is decided once, on the first non-empty write, and is
//! sticky for its lifetime.

pub mod errors;
pub mod managed;
pub mod tracked;


pub use errors::ArrayError;
pub use managed::{ArrayInsert, ArrayMode, ManagedArray};
pub use tracked::TrackedArray;
