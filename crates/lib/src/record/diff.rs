//! Change-set types reported by `changed_attributes`.

use std::collections::BTreeMap;

use serde_json::Value;

/// Map of attribute key to its pending local change.
pub type ChangedAttributes = BTreeMap<String, AttributeDiff>;

/// The pending local change for one attribute.
///
/// Array-valued children keep the index-aligned shape consumers rely on:
/// unchanged elements appear as `None` placeholders interleaved with the
/// changed elements' own change maps.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeDiff {
    /// A primitive attribute changed from `old` to `new`.
    Value {
        /// Last server-acknowledged value, if any.
        old: Option<Value>,
        /// Current locally-visible value.
        new: Option<Value>,
    },
    /// A nested child record's own change map.
    Nested(ChangedAttributes),
    /// Per-index change maps for an array of child records.
    NestedArray(Vec<Option<ChangedAttributes>>),
}

impl AttributeDiff {
    /// Returns the `[old, new]` pair if this is a primitive diff.
    pub fn as_value(&self) -> Option<(Option<&Value>, Option<&Value>)> {
        match self {
            AttributeDiff::Value { old, new } => Some((old.as_ref(), new.as_ref())),
            _ => None,
        }
    }

    /// Returns the nested change map if this is a single-child diff.
    pub fn as_nested(&self) -> Option<&ChangedAttributes> {
        match self {
            AttributeDiff::Nested(changes) => Some(changes),
            _ => None,
        }
    }

    /// Returns the per-index change maps if this is an array-child diff.
    pub fn as_nested_array(&self) -> Option<&[Option<ChangedAttributes>]> {
        match self {
            AttributeDiff::NestedArray(changes) => Some(changes),
            _ => None,
        }
    }
}
