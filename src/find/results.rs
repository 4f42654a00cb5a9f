//! Result types for directory enumeration

use crate::storage::DirEntry;

/// Entries matched by `find`, in enumeration order
///
/// Owned by the caller until released; releasing an empty set is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntrySet {
    entries: Vec<DirEntry>,
}

impl EntrySet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&DirEntry> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DirEntry> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[DirEntry] {
        &self.entries
    }

    /// Give the slots back
    pub fn release(self) {
        drop(self.entries);
    }
}

impl From<Vec<DirEntry>> for EntrySet {
    fn from(entries: Vec<DirEntry>) -> Self {
        Self { entries }
    }
}

impl IntoIterator for EntrySet {
    type Item = DirEntry;
    type IntoIter = std::vec::IntoIter<DirEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a EntrySet {
    type Item = &'a DirEntry;
    type IntoIter = std::slice::Iter<'a, DirEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
