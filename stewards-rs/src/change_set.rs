use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::path_tree::PathTree;

/// How a file was changed between the base and head revisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeStatus {
    Added,
    Modified,
    Removed,
}

/// A single changed file. Paths are relative to the repository root and use
/// `/` separators.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileChange {
    pub path: String,
    pub status: ChangeStatus,
    #[serde(default)]
    pub additions: u32,
    #[serde(default)]
    pub deletions: u32,
}

impl FileChange {
    pub fn new(path: impl Into<String>, status: ChangeStatus) -> FileChange {
        FileChange {
            path: path.into(),
            status,
            additions: 0,
            deletions: 0,
        }
    }

    pub fn with_lines(mut self, additions: u32, deletions: u32) -> FileChange {
        self.additions = additions;
        self.deletions = deletions;
        self
    }

    /// The final path segment.
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// The files changed by a pull request, in the order the provider listed
/// them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ChangeSet {
    changes: Vec<FileChange>,
    // Position of each path in `changes`
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a change. A change to a path already in the set replaces the
    /// earlier record in place.
    pub fn add(&mut self, change: FileChange) {
        match self.index.get(&change.path) {
            Some(&idx) => self.changes[idx] = change,
            None => {
                self.index.insert(change.path.clone(), self.changes.len());
                self.changes.push(change);
            }
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FileChange> {
        self.changes.iter()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Every ancestor directory of every changed path, including the root
    /// (`""`), each listed once.
    pub fn directories(&self) -> Vec<String> {
        let mut tree = PathTree::new();
        for change in &self.changes {
            tree.insert(&change.path);
        }
        tree.directories()
    }

    /// Changes to files called `file_name`, in any directory.
    pub fn governing_files<'a>(
        &'a self,
        file_name: &'a str,
    ) -> impl Iterator<Item = &'a FileChange> + 'a {
        self.changes
            .iter()
            .filter(move |change| change.file_name() == file_name)
    }
}

impl FromIterator<FileChange> for ChangeSet {
    fn from_iter<T: IntoIterator<Item = FileChange>>(iter: T) -> Self {
        let mut change_set = ChangeSet::new();
        for change in iter {
            change_set.add(change);
        }
        change_set
    }
}

impl Extend<FileChange> for ChangeSet {
    fn extend<T: IntoIterator<Item = FileChange>>(&mut self, iter: T) {
        for change in iter {
            self.add(change);
        }
    }
}

impl<'a> IntoIterator for &'a ChangeSet {
    type Item = &'a FileChange;
    type IntoIter = std::slice::Iter<'a, FileChange>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.iter()
    }
}

impl IntoIterator for ChangeSet {
    type Item = FileChange;
    type IntoIter = std::vec::IntoIter<FileChange>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.into_iter()
    }
}
