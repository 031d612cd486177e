//! Error types for record-data operations.

use thiserror::Error;

use crate::identity::ClientId;

/// Structured error types for record-data operations.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum RecordError {
    /// The record data has been destroyed; no further mutation is permitted.
    #[error("Record data for model '{model}' (client id {client_id}) is destroyed")]
    Destroyed { model: String, client_id: ClientId },

    /// A commit payload carried an id different from the already-assigned one.
    #[error("Commit for model '{model}' carried id '{incoming}' but the record already has id '{existing}'")]
    IdReassignment {
        model: String,
        existing: String,
        incoming: String,
    },
}

impl RecordError {
    /// Check if this error is a use-after-destroy.
    pub fn is_destroyed(&self) -> bool {
        matches!(self, RecordError::Destroyed { .. })
    }

    /// Check if this error is an identity conflict.
    pub fn is_identity_conflict(&self) -> bool {
        matches!(self, RecordError::IdReassignment { .. })
    }
}

impl From<RecordError> for crate::Error {
    fn from(err: RecordError) -> Self {
        crate::Error::Record(err)
    }
}
