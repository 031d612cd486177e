//! Record identity types.
//!
//! Every record is identified by `(model_name, id, client_id)`. The server
//! id may be unknown until the first successful commit; the `ClientId` is
//! minted locally at construction and stands in for identity until then.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A locally-minted identifier for a record.
///
/// A `ClientId` is assigned when the record data is created and never
/// changes, so it remains a stable identity across id adoption
/// (`did_commit` carrying a server id) and across projection fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClientId(Uuid);

impl ClientId {
    /// Mints a fresh client id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying uuid.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The full identity of a record: model name, optional server id, and the
/// stable client id.
///
/// This is the identity handed to the host store in every notification and
/// lifecycle callback, so the host can address its own wrapper object even
/// before a server id exists.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordIdentity {
    /// The model (type) name of the record.
    pub model_name: String,
    /// The server-assigned id, if one is known.
    pub id: Option<String>,
    /// The locally-minted stable id.
    pub client_id: ClientId,
}

impl RecordIdentity {
    /// Creates an identity from its parts.
    pub fn new(model_name: impl Into<String>, id: Option<String>, client_id: ClientId) -> Self {
        Self {
            model_name: model_name.into(),
            id,
            client_id,
        }
    }
}

impl std::fmt::Display for RecordIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{}:{}", self.model_name, id),
            None => write!(f, "{}:client({})", self.model_name, self.client_id),
        }
    }
}
