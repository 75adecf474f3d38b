use std::{
    collections::HashMap,
    error::Error as StdError,
    sync::{Mutex, PoisonError},
};

use thiserror::Error;

use crate::change_set::ChangeSet;

#[cfg(feature = "checkout")]
mod checkout;

#[cfg(feature = "checkout")]
pub use checkout::CheckoutAccessor;

/// The base and head revisions of a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PullRequestInfo {
    pub base_revision: String,
    pub head_revision: String,
}

impl PullRequestInfo {
    pub fn new(base_revision: impl Into<String>, head_revision: impl Into<String>) -> Self {
        Self {
            base_revision: base_revision.into(),
            head_revision: head_revision.into(),
        }
    }
}

/// An error returned by a [`RepositoryAccessor`].
#[derive(Debug, Error)]
pub enum AccessError {
    /// The path does not exist at the revision. Expected during discovery.
    #[error("{path} not found at {revision}")]
    NotFound { path: String, revision: String },
    #[error("{message}")]
    Failed {
        message: String,
        #[source]
        source: Option<Box<dyn StdError + Send + Sync>>,
    },
}

impl AccessError {
    pub fn not_found(path: impl Into<String>, revision: impl Into<String>) -> AccessError {
        AccessError::NotFound {
            path: path.into(),
            revision: revision.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> AccessError {
        AccessError::Failed {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> AccessError {
        AccessError::Failed {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AccessError::NotFound { .. })
    }
}

/// Read access to a hosted repository: pull request metadata, the files a
/// pull request changes, and file contents at a revision.
///
/// Implementations must be safe to share between threads; fetches may be
/// issued concurrently when parallel fetching is enabled.
pub trait RepositoryAccessor: Send + Sync {
    fn pull_request_info(&self, pull_request: u64) -> Result<PullRequestInfo, AccessError>;

    fn change_set(&self, pull_request: u64) -> Result<ChangeSet, AccessError>;

    /// The contents of `path` at `revision`. A path that does not exist must
    /// be reported as [`AccessError::NotFound`].
    fn contents(&self, path: &str, revision: &str) -> Result<String, AccessError>;
}

impl<A: RepositoryAccessor + ?Sized> RepositoryAccessor for &A {
    fn pull_request_info(&self, pull_request: u64) -> Result<PullRequestInfo, AccessError> {
        (**self).pull_request_info(pull_request)
    }

    fn change_set(&self, pull_request: u64) -> Result<ChangeSet, AccessError> {
        (**self).change_set(pull_request)
    }

    fn contents(&self, path: &str, revision: &str) -> Result<String, AccessError> {
        (**self).contents(path, revision)
    }
}

impl<A: RepositoryAccessor + ?Sized> RepositoryAccessor for Box<A> {
    fn pull_request_info(&self, pull_request: u64) -> Result<PullRequestInfo, AccessError> {
        (**self).pull_request_info(pull_request)
    }

    fn change_set(&self, pull_request: u64) -> Result<ChangeSet, AccessError> {
        (**self).change_set(pull_request)
    }

    fn contents(&self, path: &str, revision: &str) -> Result<String, AccessError> {
        (**self).contents(path, revision)
    }
}

/// An accessor backed by in-memory maps. Every `contents` call is recorded,
/// including those that fail.
#[derive(Debug, Default)]
pub struct MemoryAccessor {
    pull_requests: HashMap<u64, (PullRequestInfo, ChangeSet)>,
    files: HashMap<(String, String), String>,
    failures: HashMap<(String, String), String>,
    fetches: Mutex<Vec<(String, String)>>,
}

impl MemoryAccessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_pull_request(
        &mut self,
        pull_request: u64,
        info: PullRequestInfo,
        changes: ChangeSet,
    ) {
        self.pull_requests.insert(pull_request, (info, changes));
    }

    pub fn add_file(
        &mut self,
        path: impl Into<String>,
        revision: impl Into<String>,
        contents: impl Into<String>,
    ) {
        self.files
            .insert((path.into(), revision.into()), contents.into());
    }

    /// Make fetching `path` at `revision` fail with something other than
    /// not-found.
    pub fn add_failure(
        &mut self,
        path: impl Into<String>,
        revision: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.failures
            .insert((path.into(), revision.into()), message.into());
    }

    /// Every `(path, revision)` requested so far, in request order.
    pub fn fetches(&self) -> Vec<(String, String)> {
        self.fetches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn was_fetched(&self, path: &str, revision: &str) -> bool {
        self.fetches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|(p, r)| p == path && r == revision)
    }
}

impl RepositoryAccessor for MemoryAccessor {
    fn pull_request_info(&self, pull_request: u64) -> Result<PullRequestInfo, AccessError> {
        self.pull_requests
            .get(&pull_request)
            .map(|(info, _)| info.clone())
            .ok_or_else(|| AccessError::failed(format!("unknown pull request {}", pull_request)))
    }

    fn change_set(&self, pull_request: u64) -> Result<ChangeSet, AccessError> {
        self.pull_requests
            .get(&pull_request)
            .map(|(_, changes)| changes.clone())
            .ok_or_else(|| AccessError::failed(format!("unknown pull request {}", pull_request)))
    }

    fn contents(&self, path: &str, revision: &str) -> Result<String, AccessError> {
        let key = (path.to_owned(), revision.to_owned());
        self.fetches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(key.clone());

        if let Some(message) = self.failures.get(&key) {
            return Err(AccessError::failed(message.clone()));
        }
        self.files
            .get(&key)
            .cloned()
            .ok_or_else(|| AccessError::not_found(path, revision))
    }
}
