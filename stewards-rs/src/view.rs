use std::{
    collections::{btree_map, BTreeMap, HashSet},
    hash::{Hash, Hasher},
};

use serde::Serialize;

use crate::{change_set::FileChange, glob::GlobFilter};

/// The changes one rule picked out of a pull request: the stewards file that
/// declared the rule, the rule's filter, and the matching changes.
///
/// Equality treats the changes as a set, so two views built from the same
/// rule against the same pull request compare equal whatever order the
/// changes were listed in. Notifiers rely on this to recognise content they
/// have already sent.
#[derive(Debug, Clone, Serialize)]
pub struct OwnerChangeView {
    governing_file: String,
    filter: GlobFilter,
    changes: Vec<FileChange>,
}

impl OwnerChangeView {
    pub fn new(
        governing_file: impl Into<String>,
        filter: GlobFilter,
        changes: impl IntoIterator<Item = FileChange>,
    ) -> OwnerChangeView {
        let mut seen = HashSet::new();
        let changes = changes
            .into_iter()
            .filter(|change| seen.insert(change.clone()))
            .collect();
        OwnerChangeView {
            governing_file: governing_file.into(),
            filter,
            changes,
        }
    }

    pub fn governing_file(&self) -> &str {
        &self.governing_file
    }

    pub fn filter(&self) -> &GlobFilter {
        &self.filter
    }

    /// The matched changes, in pull request order.
    pub fn changes(&self) -> &[FileChange] {
        &self.changes
    }

    pub fn contains(&self, change: &FileChange) -> bool {
        self.changes.contains(change)
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    fn sorted_changes(&self) -> Vec<&FileChange> {
        let mut changes = self.changes.iter().collect::<Vec<_>>();
        changes.sort();
        changes
    }
}

impl PartialEq for OwnerChangeView {
    fn eq(&self, other: &Self) -> bool {
        self.governing_file == other.governing_file
            && self.filter == other.filter
            && self.changes.len() == other.changes.len()
            && self.sorted_changes() == other.sorted_changes()
    }
}

impl Eq for OwnerChangeView {}

impl Hash for OwnerChangeView {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.governing_file.hash(state);
        self.filter.hash(state);
        self.sorted_changes().hash(state);
    }
}

/// The result of a resolution: for every owner with at least one matching
/// change, the views produced by each stewards file that names them.
///
/// Owners and stewards files are kept in sorted order. Views under one
/// stewards file keep the order their rules were declared in; rules with
/// different filters in the same file are never merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResolutionRegistry {
    owners: BTreeMap<String, BTreeMap<String, Vec<OwnerChangeView>>>,
}

impl ResolutionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a view for an owner. Empty views are dropped, so an owner only
    /// appears once they have something to be told about.
    pub fn insert(&mut self, owner: impl Into<String>, view: OwnerChangeView) {
        if view.is_empty() {
            return;
        }
        self.owners
            .entry(owner.into())
            .or_default()
            .entry(view.governing_file.clone())
            .or_default()
            .push(view);
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// The number of owners.
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn owners(&self) -> impl Iterator<Item = &str> {
        self.owners.keys().map(String::as_str)
    }

    pub fn contains_owner(&self, owner: &str) -> bool {
        self.owners.contains_key(owner)
    }

    pub fn get(&self, owner: &str) -> Option<&BTreeMap<String, Vec<OwnerChangeView>>> {
        self.owners.get(owner)
    }

    /// The stewards files through which `owner` is involved.
    pub fn governing_files<'a>(&'a self, owner: &str) -> impl Iterator<Item = &'a str> {
        self.owners
            .get(owner)
            .into_iter()
            .flat_map(|files| files.keys().map(String::as_str))
    }

    pub fn views(&self, owner: &str, governing_file: &str) -> &[OwnerChangeView] {
        self.owners
            .get(owner)
            .and_then(|files| files.get(governing_file))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeMap<String, Vec<OwnerChangeView>>)> {
        self.owners.iter().map(|(owner, files)| (owner.as_str(), files))
    }
}

impl IntoIterator for ResolutionRegistry {
    type Item = (String, BTreeMap<String, Vec<OwnerChangeView>>);
    type IntoIter = btree_map::IntoIter<String, BTreeMap<String, Vec<OwnerChangeView>>>;

    fn into_iter(self) -> Self::IntoIter {
        self.owners.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResolutionRegistry {
    type Item = (&'a String, &'a BTreeMap<String, Vec<OwnerChangeView>>);
    type IntoIter = btree_map::Iter<'a, String, BTreeMap<String, Vec<OwnerChangeView>>>;

    fn into_iter(self) -> Self::IntoIter {
        self.owners.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change_set::ChangeStatus;

    fn one() -> FileChange {
        FileChange::new("one.rb", ChangeStatus::Added).with_lines(1, 0)
    }

    fn marine() -> FileChange {
        FileChange::new("sub/marine.rb", ChangeStatus::Modified).with_lines(1, 1)
    }

    #[test]
    fn test_view_equality_ignores_order() {
        let a = OwnerChangeView::new("stewards.yml", GlobFilter::everything(), [one(), marine()]);
        let b = OwnerChangeView::new("stewards.yml", GlobFilter::everything(), [marine(), one()]);

        assert_eq!(a, b);
        assert_eq!(HashSet::from([a, b]).len(), 1);
    }

    #[test]
    fn test_view_inequality() {
        let base =
            OwnerChangeView::new("stewards.yml", GlobFilter::everything(), [one(), marine()]);
        let examples = vec![
            OwnerChangeView::new("sub/stewards.yml", GlobFilter::everything(), [one(), marine()]),
            OwnerChangeView::new(
                "stewards.yml",
                GlobFilter::new(["**.rb"], Vec::<&str>::new()).unwrap(),
                [one(), marine()],
            ),
            OwnerChangeView::new("stewards.yml", GlobFilter::everything(), [one()]),
            OwnerChangeView::new(
                "stewards.yml",
                GlobFilter::everything(),
                [one(), marine().with_lines(2, 1)],
            ),
        ];

        for view in examples {
            assert_ne!(base, view, "expected {:?} to differ", view);
        }
    }

    #[test]
    fn test_view_collapses_duplicates() {
        let view = OwnerChangeView::new("stewards.yml", GlobFilter::everything(), [one(), one()]);

        assert_eq!(view.changes(), &[one()]);
    }

    #[test]
    fn test_registry_grouping() {
        let mut registry = ResolutionRegistry::new();
        let filtered = GlobFilter::new(["*.rb"], Vec::<&str>::new()).unwrap();
        let everything = GlobFilter::everything();
        registry.insert(
            "alice",
            OwnerChangeView::new("stewards.yml", everything.clone(), [one()]),
        );
        registry.insert("alice", OwnerChangeView::new("stewards.yml", filtered.clone(), [one()]));
        registry.insert(
            "alice",
            OwnerChangeView::new("sub/stewards.yml", everything, [marine()]),
        );
        registry.insert("bob", OwnerChangeView::new("stewards.yml", filtered, Vec::new()));

        assert_eq!(registry.len(), 1);
        assert!(!registry.contains_owner("bob"));
        assert_eq!(
            registry.governing_files("alice").collect::<Vec<_>>(),
            vec!["stewards.yml", "sub/stewards.yml"]
        );
        assert_eq!(registry.views("alice", "stewards.yml").len(), 2);
        assert!(registry.views("alice", "other/stewards.yml").is_empty());
        assert!(registry.views("carol", "stewards.yml").is_empty());
        assert_eq!(registry.governing_files("carol").count(), 0);
    }
}
