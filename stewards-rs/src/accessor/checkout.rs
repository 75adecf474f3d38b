use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    fs, io,
    path::{Path, PathBuf},
};

use tracing::debug;
use walkdir::WalkDir;

use super::{AccessError, PullRequestInfo, RepositoryAccessor};
use crate::change_set::{ChangeSet, ChangeStatus, FileChange};

/// An accessor that reads revisions from directories on disk, one checked
/// out working tree per revision.
///
/// The change set of a pull request is computed by comparing the base and
/// head trees file by file. `.git` directories are ignored.
#[derive(Debug, Default)]
pub struct CheckoutAccessor {
    checkouts: HashMap<String, PathBuf>,
    pull_requests: HashMap<u64, PullRequestInfo>,
}

impl CheckoutAccessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_checkout(&mut self, revision: impl Into<String>, root: impl Into<PathBuf>) {
        self.checkouts.insert(revision.into(), root.into());
    }

    pub fn add_pull_request(&mut self, pull_request: u64, info: PullRequestInfo) {
        self.pull_requests.insert(pull_request, info);
    }

    fn checkout(&self, revision: &str) -> Result<&Path, AccessError> {
        self.checkouts
            .get(revision)
            .map(PathBuf::as_path)
            .ok_or_else(|| AccessError::failed(format!("no checkout for revision {}", revision)))
    }
}

impl RepositoryAccessor for CheckoutAccessor {
    fn pull_request_info(&self, pull_request: u64) -> Result<PullRequestInfo, AccessError> {
        self.pull_requests
            .get(&pull_request)
            .cloned()
            .ok_or_else(|| AccessError::failed(format!("unknown pull request {}", pull_request)))
    }

    fn change_set(&self, pull_request: u64) -> Result<ChangeSet, AccessError> {
        let info = self.pull_request_info(pull_request)?;
        let base_root = self.checkout(&info.base_revision)?;
        let head_root = self.checkout(&info.head_revision)?;

        let base = walk_files(base_root)?;
        let head = walk_files(head_root)?;
        debug!(
            base_files = base.len(),
            head_files = head.len(),
            "comparing checkouts"
        );

        let paths = base.keys().chain(head.keys()).collect::<BTreeSet<_>>();
        let mut changes = ChangeSet::new();
        for path in paths {
            let change = match (base.get(path), head.get(path)) {
                (None, Some(new)) => {
                    let contents = read(new)?;
                    FileChange::new(path.as_str(), ChangeStatus::Added)
                        .with_lines(line_count(&contents), 0)
                }
                (Some(old), None) => {
                    let contents = read(old)?;
                    FileChange::new(path.as_str(), ChangeStatus::Removed)
                        .with_lines(0, line_count(&contents))
                }
                (Some(old), Some(new)) => {
                    let (old, new) = (read(old)?, read(new)?);
                    if old == new {
                        continue;
                    }
                    let (additions, deletions) = line_diff(&old, &new);
                    FileChange::new(path.as_str(), ChangeStatus::Modified)
                        .with_lines(additions, deletions)
                }
                (None, None) => continue,
            };
            changes.add(change);
        }
        Ok(changes)
    }

    fn contents(&self, path: &str, revision: &str) -> Result<String, AccessError> {
        let full_path = self.checkout(revision)?.join(path);
        fs::read_to_string(&full_path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => AccessError::not_found(path, revision),
            _ => AccessError::with_source(format!("failed to read {}", full_path.display()), err),
        })
    }
}

/// Every file under `root`, keyed by its `/`-separated path relative to
/// `root`.
fn walk_files(root: &Path) -> Result<BTreeMap<String, PathBuf>, AccessError> {
    let mut files = BTreeMap::new();
    let walker = WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_entry(|entry| entry.file_name() != ".git");

    for entry in walker {
        let entry = entry.map_err(|err| {
            AccessError::with_source(format!("failed to walk {}", root.display()), err)
        })?;
        if entry.file_type().is_dir() {
            continue;
        }
        let relative = match entry.path().strip_prefix(root) {
            Ok(relative) => relative,
            Err(_) => continue,
        };
        let key = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        files.insert(key, entry.into_path());
    }
    Ok(files)
}

fn read(path: &Path) -> Result<Vec<u8>, AccessError> {
    fs::read(path)
        .map_err(|err| AccessError::with_source(format!("failed to read {}", path.display()), err))
}

fn line_count(contents: &[u8]) -> u32 {
    saturating_u32(lines(contents).count() as u64)
}

fn saturating_u32(count: u64) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}

fn lines(contents: &[u8]) -> impl Iterator<Item = &[u8]> {
    let contents = contents.strip_suffix(b"\n").unwrap_or(contents);
    contents
        .split(|&b| b == b'\n')
        .filter(move |_| !contents.is_empty())
}

// Lines are compared as multisets: reordering lines costs nothing, and each
// extra copy of a line counts once.
fn line_diff(old: &[u8], new: &[u8]) -> (u32, u32) {
    let mut counts: HashMap<&[u8], i64> = HashMap::new();
    for line in lines(old) {
        *counts.entry(line).or_default() -= 1;
    }
    for line in lines(new) {
        *counts.entry(line).or_default() += 1;
    }

    let mut additions: u64 = 0;
    let mut deletions: u64 = 0;
    for count in counts.values() {
        if *count > 0 {
            additions += count.unsigned_abs();
        } else {
            deletions += count.unsigned_abs();
        }
    }
    (saturating_u32(additions), saturating_u32(deletions))
}
