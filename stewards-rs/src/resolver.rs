use std::{
    collections::{BTreeMap, HashSet},
    fmt,
};

#[cfg(feature = "rayon")]
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, trace};

use crate::{
    accessor::{AccessError, PullRequestInfo, RepositoryAccessor},
    change_set::{ChangeSet, ChangeStatus},
    config::ResolverConfig,
    parser,
    report::{Reporter, TracingReporter},
    rules::{OwnerRuleTree, OwnershipRule},
    view::ResolutionRegistry,
};

/// A stewards file location to fetch: a path at a revision.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchTarget {
    pub path: String,
    pub revision: String,
}

impl FetchTarget {
    pub fn new(path: impl Into<String>, revision: impl Into<String>) -> FetchTarget {
        FetchTarget {
            path: path.into(),
            revision: revision.into(),
        }
    }
}

impl fmt::Display for FetchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.path, self.revision)
    }
}

/// A resolution that could not complete. No partial registry is produced.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("failed to load pull request {pull_request}")]
    PullRequest {
        pull_request: u64,
        #[source]
        source: AccessError,
    },
    #[error("failed to fetch {target}")]
    Fetch {
        target: FetchTarget,
        #[source]
        source: AccessError,
    },
}

/// Work out which stewards files to fetch for a pull request.
///
/// Every ancestor directory of every changed path is a candidate location,
/// read at the base revision. Stewards files the pull request adds or
/// modifies are also read at the head revision, so that owners the pull
/// request introduces hear about it; removed ones are only read at base.
/// Targets are listed once each, base-revision directories first.
pub fn discover(
    changes: &ChangeSet,
    pull_request: &PullRequestInfo,
    governing_filename: &str,
) -> Vec<FetchTarget> {
    let mut targets = Vec::new();
    let mut seen = HashSet::new();

    for directory in changes.directories() {
        let path = if directory.is_empty() {
            governing_filename.to_owned()
        } else {
            format!("{}/{}", directory, governing_filename)
        };
        push_unique(&mut targets, &mut seen, FetchTarget::new(path, &pull_request.base_revision));
    }

    for change in changes.governing_files(governing_filename) {
        match change.status {
            ChangeStatus::Removed => {}
            ChangeStatus::Added | ChangeStatus::Modified => {
                let target = FetchTarget::new(change.path.clone(), &pull_request.head_revision);
                push_unique(&mut targets, &mut seen, target);
            }
        }
    }

    targets
}

fn push_unique(
    targets: &mut Vec<FetchTarget>,
    seen: &mut HashSet<FetchTarget>,
    target: FetchTarget,
) {
    if seen.insert(target.clone()) {
        targets.push(target);
    }
}

/// Resolves which owners need to hear about a pull request, and about which
/// of its changes.
pub struct Resolver<A> {
    accessor: A,
    config: ResolverConfig,
    reporter: Box<dyn Reporter>,
}

impl<A: RepositoryAccessor> Resolver<A> {
    /// A resolver with the default configuration, reporting through
    /// `tracing`.
    pub fn new(accessor: A) -> Self {
        ResolverBuilder::new(accessor).build()
    }

    pub fn accessor(&self) -> &A {
        &self.accessor
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve the owners of a pull request. Fails, without a partial
    /// result, if the pull request or any existing stewards file cannot be
    /// read; stewards files that are missing or malformed are skipped.
    pub fn resolve(&self, pull_request: u64) -> Result<ResolutionRegistry, ResolveError> {
        let info = self
            .accessor
            .pull_request_info(pull_request)
            .map_err(|source| ResolveError::PullRequest {
                pull_request,
                source,
            })?;
        let changes = self
            .accessor
            .change_set(pull_request)
            .map_err(|source| ResolveError::PullRequest {
                pull_request,
                source,
            })?;

        self.resolve_changes(&info, &changes)
    }

    /// Resolve the owners of an already-loaded change set.
    pub fn resolve_changes(
        &self,
        pull_request: &PullRequestInfo,
        changes: &ChangeSet,
    ) -> Result<ResolutionRegistry, ResolveError> {
        let targets = discover(changes, pull_request, &self.config.governing_filename);
        debug!(
            changes = changes.len(),
            candidates = targets.len(),
            "discovered candidate stewards files"
        );

        let fetched = self.fetch_all(&targets)?;
        let trees = self.collect_rules(fetched);

        let mut registry = ResolutionRegistry::new();
        for (owner, tree) in &trees {
            for view in tree.changes(changes) {
                registry.insert(owner.as_str(), view);
            }
        }

        if registry.is_empty() {
            self.reporter.no_owners(pull_request);
        } else {
            debug!(owners = registry.len(), "resolved stewards");
        }
        Ok(registry)
    }

    fn collect_rules(
        &self,
        fetched: Vec<(FetchTarget, String)>,
    ) -> BTreeMap<String, OwnerRuleTree> {
        let options = self.config.parser_options();
        let mut trees: BTreeMap<String, OwnerRuleTree> = BTreeMap::new();

        for (target, contents) in fetched {
            let file = match parser::parse_with(&contents, &options) {
                Ok(file) => file,
                Err(err) => {
                    self.reporter.parse_failed(&target, &err);
                    continue;
                }
            };
            trace!(
                path = %target.path,
                revision = %target.revision,
                declarations = file.len(),
                "parsed stewards file"
            );

            for declaration in file {
                let rule = OwnershipRule::new(
                    target.revision.as_str(),
                    target.path.as_str(),
                    declaration.filter,
                );
                trees.entry(declaration.owner).or_default().add(rule);
            }
        }

        trees
    }

    fn fetch_all(
        &self,
        targets: &[FetchTarget],
    ) -> Result<Vec<(FetchTarget, String)>, ResolveError> {
        if self.config.parallel_fetch {
            self.fetch_parallel(targets)
        } else {
            self.fetch_sequential(targets)
        }
    }

    fn fetch_sequential(
        &self,
        targets: &[FetchTarget],
    ) -> Result<Vec<(FetchTarget, String)>, ResolveError> {
        let mut fetched = Vec::new();
        for target in targets {
            if let Some(contents) = self.fetch(target)? {
                fetched.push((target.clone(), contents));
            }
        }
        Ok(fetched)
    }

    // Every fetch runs to completion; when several fail, the error reported
    // is the first in discovery order.
    #[cfg(feature = "rayon")]
    fn fetch_parallel(
        &self,
        targets: &[FetchTarget],
    ) -> Result<Vec<(FetchTarget, String)>, ResolveError> {
        let results = targets
            .par_iter()
            .map(|target| self.fetch(target))
            .collect::<Vec<_>>();

        let mut fetched = Vec::new();
        for (target, result) in targets.iter().zip(results) {
            if let Some(contents) = result? {
                fetched.push((target.clone(), contents));
            }
        }
        Ok(fetched)
    }

    #[cfg(not(feature = "rayon"))]
    fn fetch_parallel(
        &self,
        targets: &[FetchTarget],
    ) -> Result<Vec<(FetchTarget, String)>, ResolveError> {
        self.fetch_sequential(targets)
    }

    fn fetch(&self, target: &FetchTarget) -> Result<Option<String>, ResolveError> {
        trace!(path = %target.path, revision = %target.revision, "fetching stewards file");
        match self.accessor.contents(&target.path, &target.revision) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.is_not_found() => {
                self.reporter.not_found(target);
                Ok(None)
            }
            Err(source) => Err(ResolveError::Fetch {
                target: target.clone(),
                source,
            }),
        }
    }
}

/// Builder for a [`Resolver`].
pub struct ResolverBuilder<A> {
    accessor: A,
    config: ResolverConfig,
    reporter: Option<Box<dyn Reporter>>,
}

impl<A: RepositoryAccessor> ResolverBuilder<A> {
    pub fn new(accessor: A) -> Self {
        Self {
            accessor,
            config: ResolverConfig::default(),
            reporter: None,
        }
    }

    pub fn config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn governing_filename(mut self, filename: impl Into<String>) -> Self {
        self.config.governing_filename = filename.into();
        self
    }

    pub fn parallel_fetch(mut self, enabled: bool) -> Self {
        self.config.parallel_fetch = enabled;
        self
    }

    /// Where parse failures and other non-fatal events go. Defaults to
    /// [`TracingReporter`].
    pub fn reporter(mut self, reporter: impl Reporter + 'static) -> Self {
        self.reporter = Some(Box::new(reporter));
        self
    }

    pub fn build(self) -> Resolver<A> {
        Resolver {
            accessor: self.accessor,
            config: self.config,
            reporter: self
                .reporter
                .unwrap_or_else(|| Box::new(TracingReporter)),
        }
    }
}
