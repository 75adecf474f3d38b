use crate::{
    change_set::{ChangeSet, FileChange},
    glob::GlobFilter,
    view::OwnerChangeView,
};

/// One owner's jurisdiction as declared in one version of one stewards file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OwnershipRule {
    revision: String,
    governing_file: String,
    filter: GlobFilter,
}

impl OwnershipRule {
    pub fn new(
        revision: impl Into<String>,
        governing_file: impl Into<String>,
        filter: GlobFilter,
    ) -> OwnershipRule {
        OwnershipRule {
            revision: revision.into(),
            governing_file: governing_file.into(),
            filter,
        }
    }

    /// The revision the stewards file was read at.
    pub fn revision(&self) -> &str {
        &self.revision
    }

    pub fn governing_file(&self) -> &str {
        &self.governing_file
    }

    pub fn filter(&self) -> &GlobFilter {
        &self.filter
    }

    /// The directory containing the stewards file, `""` for the repository
    /// root.
    pub fn directory(&self) -> &str {
        match self.governing_file.rfind('/') {
            Some(idx) => &self.governing_file[..idx],
            None => "",
        }
    }

    /// Whether the rule covers a change. Only changes beneath the stewards
    /// file's directory can match, and the filter sees their path relative to
    /// that directory.
    pub fn matches(&self, change: &FileChange) -> bool {
        relative_path(&change.path, self.directory())
            .map(|path| self.filter.matches(path))
            .unwrap_or(false)
    }

    /// The view of `changes` this rule selects.
    pub fn view(&self, changes: &ChangeSet) -> OwnerChangeView {
        OwnerChangeView::new(
            self.governing_file.clone(),
            self.filter.clone(),
            changes.iter().filter(|change| self.matches(change)).cloned(),
        )
    }
}

fn relative_path<'a>(path: &'a str, directory: &str) -> Option<&'a str> {
    if directory.is_empty() {
        return Some(path);
    }
    path.strip_prefix(directory)?.strip_prefix('/')
}

/// All the rules naming one owner, across every stewards file and revision
/// read during a resolution.
#[derive(Debug, Clone, Default)]
pub struct OwnerRuleTree {
    rules: Vec<OwnershipRule>,
}

impl OwnerRuleTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule. Rules are never merged: a declaration read at both
    /// revisions of a modified stewards file yields two rules.
    pub fn add(&mut self, rule: OwnershipRule) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[OwnershipRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// One view per rule, in the order the rules were added, leaving out
    /// rules that match none of `changes`.
    pub fn changes(&self, changes: &ChangeSet) -> Vec<OwnerChangeView> {
        self.rules
            .iter()
            .map(|rule| rule.view(changes))
            .filter(|view| !view.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change_set::ChangeStatus;

    fn change_set() -> ChangeSet {
        ChangeSet::from_iter([
            FileChange::new("stewards.yml", ChangeStatus::Removed),
            FileChange::new("one.rb", ChangeStatus::Added),
            FileChange::new("sub/marine.rb", ChangeStatus::Modified),
            FileChange::new("sub/stewards.yml", ChangeStatus::Modified),
            FileChange::new("sub2/sandwich", ChangeStatus::Removed),
            FileChange::new("sub3/stewards.yml", ChangeStatus::Removed),
            FileChange::new("subway/map.txt", ChangeStatus::Added),
        ])
    }

    fn paths(view: &OwnerChangeView) -> Vec<&str> {
        view.changes().iter().map(|c| c.path.as_str()).collect()
    }

    #[test]
    fn test_directory() {
        let examples = vec![
            ("stewards.yml", ""),
            ("sub/stewards.yml", "sub"),
            ("hello/kitty/what/is/stewards.yml", "hello/kitty/what/is"),
        ];

        for (governing_file, expected) in examples {
            let rule = OwnershipRule::new("base", governing_file, GlobFilter::everything());
            assert_eq!(rule.directory(), expected, "mismatch for `{}`", governing_file);
        }
    }

    #[test]
    fn test_view_scoped_to_directory() {
        let changes = change_set();
        let examples = vec![
            (
                "stewards.yml",
                vec![
                    "stewards.yml",
                    "one.rb",
                    "sub/marine.rb",
                    "sub/stewards.yml",
                    "sub2/sandwich",
                    "sub3/stewards.yml",
                    "subway/map.txt",
                ],
            ),
            ("sub/stewards.yml", vec!["sub/marine.rb", "sub/stewards.yml"]),
            ("sub3/stewards.yml", vec!["sub3/stewards.yml"]),
            ("nowhere/stewards.yml", vec![]),
        ];

        for (governing_file, expected) in examples {
            let rule = OwnershipRule::new("base", governing_file, GlobFilter::everything());
            assert_eq!(
                paths(&rule.view(&changes)),
                expected,
                "mismatch for `{}`",
                governing_file
            );
        }
    }

    #[test]
    fn test_filter_sees_relative_paths() {
        let changes = change_set();
        let filter = GlobFilter::new(["*.rb"], Vec::<&str>::new()).unwrap();

        let root = OwnershipRule::new("base", "stewards.yml", filter.clone());
        assert_eq!(paths(&root.view(&changes)), vec!["one.rb"]);

        let sub = OwnershipRule::new("base", "sub/stewards.yml", filter);
        assert_eq!(paths(&sub.view(&changes)), vec!["sub/marine.rb"]);
    }

    #[test]
    fn test_tree_keeps_rules_separate() {
        let changes = change_set();
        let mut tree = OwnerRuleTree::new();
        let rb = GlobFilter::new(["**.rb"], Vec::<&str>::new()).unwrap();
        let txt = GlobFilter::new(["**.txt"], Vec::<&str>::new()).unwrap();
        let bin = GlobFilter::new(["*.bin"], Vec::<&str>::new()).unwrap();

        tree.add(OwnershipRule::new("base", "stewards.yml", rb.clone()));
        tree.add(OwnershipRule::new("base", "stewards.yml", txt));
        tree.add(OwnershipRule::new("base", "stewards.yml", bin));
        tree.add(OwnershipRule::new("base", "sub/stewards.yml", rb));

        let views = tree.changes(&changes);
        assert_eq!(views.len(), 3);
        assert_eq!(paths(&views[0]), vec!["one.rb", "sub/marine.rb"]);
        assert_eq!(paths(&views[1]), vec!["subway/map.txt"]);
        assert_eq!(views[2].governing_file(), "sub/stewards.yml");
        assert_eq!(paths(&views[2]), vec!["sub/marine.rb"]);
    }

    #[test]
    fn test_tree_keeps_rules_from_both_revisions() {
        let mut tree = OwnerRuleTree::new();
        let narrowed = GlobFilter::new(["*.rb"], Vec::<&str>::new()).unwrap();

        tree.add(OwnershipRule::new("base", "sub/stewards.yml", GlobFilter::everything()));
        // Same declaration twice in one file
        tree.add(OwnershipRule::new("base", "sub/stewards.yml", GlobFilter::everything()));
        // Unchanged declaration read again at head
        tree.add(OwnershipRule::new("head", "sub/stewards.yml", GlobFilter::everything()));
        tree.add(OwnershipRule::new("head", "sub/stewards.yml", narrowed));

        assert_eq!(tree.len(), 4);
        let views = tree.changes(&change_set());
        assert_eq!(views.len(), 4);
        assert_eq!(views[0], views[2]);
        assert_eq!(
            tree.rules().iter().map(OwnershipRule::revision).collect::<Vec<_>>(),
            vec!["base", "base", "head", "head"]
        );
    }
}
