use tracing::{debug, error, info};

use crate::{accessor::PullRequestInfo, parser::ParseError, resolver::FetchTarget};

/// Receives the events of a resolution that are worth telling someone about
/// but do not stop it.
pub trait Reporter: Send + Sync {
    /// A stewards file was fetched but could not be parsed; it contributes no
    /// owners.
    fn parse_failed(&self, target: &FetchTarget, error: &ParseError);

    /// A candidate stewards file does not exist at the revision.
    fn not_found(&self, _target: &FetchTarget) {}

    /// The resolution finished without finding any owner to notify.
    fn no_owners(&self, _pull_request: &PullRequestInfo) {}
}

/// Reports through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn parse_failed(&self, target: &FetchTarget, err: &ParseError) {
        error!(
            path = %target.path,
            revision = %target.revision,
            "error parsing file {}: {}",
            target.path,
            err
        );
    }

    fn not_found(&self, target: &FetchTarget) {
        debug!(path = %target.path, revision = %target.revision, "no stewards file");
    }

    fn no_owners(&self, pull_request: &PullRequestInfo) {
        info!(
            base = %pull_request.base_revision,
            head = %pull_request.head_revision,
            "no stewards found, doing nothing"
        );
    }
}
