//! Tree DTOs.
//!
//! - `EntryType`: kind of object a tree item points at (blob, tree, commit)
//! - `TreeEntry`: one file in a repository+branch snapshot
//!
//! A snapshot is always held sorted by path in byte order; rendering and
//! filtering both rely on it.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Blob,
    Tree,
    Commit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    pub entry_type: EntryType,
}

impl TreeEntry {
    #[cfg(test)]
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            entry_type: EntryType::Blob,
        }
    }
}

/// Keep blobs only and sort them by path (stable, case-sensitive byte order).
pub fn sorted_files(entries: impl IntoIterator<Item = TreeEntry>) -> Vec<TreeEntry> {
    let mut files: Vec<TreeEntry> = entries
        .into_iter()
        .filter(|e| e.entry_type == EntryType::Blob)
        .collect();
    files.sort_by(|a, b| a.path.as_bytes().cmp(b.path.as_bytes()));
    files
}
