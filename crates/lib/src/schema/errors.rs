//! Error types for schema-driven attribute access.
//!
//! These cover host-visible misuse of the schema surface, chiefly writes to
//! attributes the schema has excluded or aliased away. Programmer misuse of
//! the resolution sandbox (unbalanced begin/end, base-model self-cycles) is
//! an assertion, not an error; see the crate-level error policy.

use thiserror::Error;

/// Structured error types for schema operations.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The schema whitelist excludes this attribute for the model.
    #[error("Attribute '{attr}' is not included for model '{model}'")]
    ExcludedAttribute { model: String, attr: String },

    /// The attribute is an alias; writes must target the backing key.
    #[error("Attribute '{attr}' on model '{model}' is an alias for '{alias}' and cannot be written")]
    AliasedAttribute {
        model: String,
        attr: String,
        alias: String,
    },

    /// The record behind a schema interface has been destroyed.
    #[error("Schema interface target for model '{model}' is destroyed")]
    TargetDestroyed { model: String },
}

impl SchemaError {
    /// Check if this error is a rejected attribute write.
    pub fn is_write_rejected(&self) -> bool {
        matches!(
            self,
            SchemaError::ExcludedAttribute { .. } | SchemaError::AliasedAttribute { .. }
        )
    }

    /// Get the model name associated with this error.
    pub fn model_name(&self) -> &str {
        match self {
            SchemaError::ExcludedAttribute { model, .. }
            | SchemaError::AliasedAttribute { model, .. }
            | SchemaError::TargetDestroyed { model } => model,
        }
    }
}

impl From<SchemaError> for crate::Error {
    fn from(err: SchemaError) -> Self {
        crate::Error::Schema(err)
    }
}
