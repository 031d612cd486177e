//! Child record bookkeeping.
//!
//! Nested and embedded sub-resources are mirrored into a parallel tree of
//! child [`RecordData`], keyed by `(attribute key, optional array index)`.
//! Resize, insert and remove are first-class tree edits here rather than ad
//! hoc splicing at call sites.

use crate::Result;
use crate::record::RecordData;

/// The child structure bound to one attribute key: either a single nested
/// record or an index-aligned array of them (holes for non-record elements).
#[derive(Clone)]
pub enum ChildSlot {
    /// One nested record.
    Single(RecordData),
    /// Per-index nested records; `None` marks a non-record element.
    Many(Vec<Option<RecordData>>),
}

impl ChildSlot {
    /// Visits every child in the slot.
    pub fn for_each(&self, mut f: impl FnMut(&RecordData)) {
        match self {
            ChildSlot::Single(child) => f(child),
            ChildSlot::Many(children) => {
                for child in children.iter().flatten() {
                    f(child);
                }
            }
        }
    }

    /// Visits every child, stopping at the first error.
    pub fn try_for_each(&self, mut f: impl FnMut(&RecordData) -> Result<()>) -> Result<()> {
        match self {
            ChildSlot::Single(child) => f(child),
            ChildSlot::Many(children) => {
                for child in children.iter().flatten() {
                    f(child)?;
                }
                Ok(())
            }
        }
    }

    /// Number of element positions (1 for a single child).
    pub fn len(&self) -> usize {
        match self {
            ChildSlot::Single(_) => 1,
            ChildSlot::Many(children) => children.len(),
        }
    }

    /// Returns true if the slot holds no positions.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordData {
    /// The child slot for `key`, if one exists.
    pub(crate) fn child_slot(&self, key: &str) -> Option<ChildSlot> {
        self.inner.borrow().children.get(key).cloned()
    }

    /// The single child record for `key`, if the slot holds one.
    pub fn child_record_data(&self, key: &str) -> Option<RecordData> {
        match self.child_slot(key)? {
            ChildSlot::Single(child) => Some(child),
            ChildSlot::Many(_) => None,
        }
    }

    /// The child record at `key[index]`, if the slot is an array and the
    /// element is a record.
    pub fn child_record_data_at(&self, key: &str, index: usize) -> Option<RecordData> {
        match self.child_slot(key)? {
            ChildSlot::Many(children) => children.get(index).cloned().flatten(),
            ChildSlot::Single(_) => None,
        }
    }

    /// Binds `child` as the single nested record for `key`, destroying any
    /// previous child structure for that key.
    pub(crate) fn set_child(&self, key: &str, child: RecordData) {
        let previous = self
            .inner
            .borrow_mut()
            .children
            .insert(key.to_string(), ChildSlot::Single(child));
        if let Some(previous) = previous {
            previous.for_each(|old| old.destroy());
        }
    }

    /// Binds `child` at `key[index]`, growing the array slot as needed and
    /// destroying any record previously at that index.
    ///
    /// # Panics
    /// Panics if the slot for `key` holds a single (non-array) child.
    pub(crate) fn set_child_at(&self, key: &str, index: usize, child: RecordData) {
        let previous = {
            let mut inner = self.inner.borrow_mut();
            let slot = inner
                .children
                .entry(key.to_string())
                .or_insert_with(|| ChildSlot::Many(Vec::new()));
            match slot {
                ChildSlot::Many(children) => {
                    if children.len() <= index {
                        children.resize(index + 1, None);
                    }
                    children[index].replace(child)
                }
                ChildSlot::Single(_) => {
                    panic!("child slot for '{key}' holds a single record, not an array")
                }
            }
        };
        if let Some(previous) = previous {
            previous.destroy();
        }
    }

    /// Destroys and clears the record at `key[index]`, leaving a hole.
    /// No-op when the slot is absent, single, or the index is out of range.
    pub(crate) fn clear_child_at(&self, key: &str, index: usize) {
        let removed = {
            let mut inner = self.inner.borrow_mut();
            match inner.children.get_mut(key) {
                Some(ChildSlot::Many(children)) => {
                    children.get_mut(index).and_then(Option::take)
                }
                _ => None,
            }
        };
        if let Some(removed) = removed {
            removed.destroy();
        }
    }

    /// Drops the whole child structure for `key`.
    pub(crate) fn remove_child_slot(&self, key: &str, destroy: bool) {
        let removed = self.inner.borrow_mut().children.remove(key);
        if destroy && let Some(removed) = removed {
            removed.for_each(|child| child.destroy());
        }
    }

    /// Resizes the array child slot for `key`: removes `remove` positions at
    /// `start` (destroying any records they held) and inserts `add` empty
    /// positions in their place. Creates an empty array slot on first use.
    ///
    /// # Panics
    /// Panics if the slot for `key` holds a single (non-array) child.
    pub(crate) fn resize_child_slot(&self, key: &str, start: usize, remove: usize, add: usize) {
        let removed: Vec<RecordData> = {
            let mut inner = self.inner.borrow_mut();
            let slot = inner
                .children
                .entry(key.to_string())
                .or_insert_with(|| ChildSlot::Many(Vec::new()));
            match slot {
                ChildSlot::Many(children) => {
                    if children.len() < start {
                        children.resize(start, None);
                    }
                    let end = (start + remove).min(children.len());
                    let removed = children
                        .splice(start..end, std::iter::repeat_n(None, add))
                        .flatten()
                        .collect();
                    removed
                }
                ChildSlot::Single(_) => {
                    panic!("cannot resize child slot for '{key}': it holds a single record")
                }
            }
        };
        for child in removed {
            child.destroy();
        }
    }

    /// Snapshot of all child slots, cheap-cloned for borrow-free recursion.
    pub(crate) fn children_snapshot(&self) -> Vec<(String, ChildSlot)> {
        self.inner
            .borrow()
            .children
            .iter()
            .map(|(key, slot)| (key.clone(), slot.clone()))
            .collect()
    }
}
