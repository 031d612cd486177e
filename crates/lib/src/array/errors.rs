//! Error types for managed and tracked collections.

use thiserror::Error;

/// Structured error types for collection operations.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ArrayError {
    /// A replace range fell outside the collection.
    #[error("Array index out of bounds: index {index}, length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// An all-reference collection received an element that does not
    /// classify as a reference.
    #[error("Element at index {index} is not a reference; the collection is all-reference")]
    NotAReference { index: usize },
}

impl ArrayError {
    /// Check if this error is a bounds violation.
    pub fn is_out_of_bounds(&self) -> bool {
        matches!(self, ArrayError::IndexOutOfBounds { .. })
    }

    /// Check if this error is a collection-mode mismatch.
    pub fn is_mode_mismatch(&self) -> bool {
        matches!(self, ArrayError::NotAReference { .. })
    }
}

impl From<ArrayError> for crate::Error {
    fn from(err: ArrayError) -> Self {
        crate::Error::Array(err)
    }
}
