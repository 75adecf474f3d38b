//! Resolve which owners ("stewards") need to hear about a pull request.
//!
//! Directories in a repository may carry a stewards file naming the people
//! responsible for that part of the tree. Given a pull request, the resolver
//! finds every stewards file that governs one of its changes, at the base
//! revision and, for stewards files the pull request itself adds or edits, at
//! the head revision as well. It then works out, per owner, which changes each
//! of their declarations covers.
//!
//! ```no_run
//! use stewards_rs::{MemoryAccessor, Resolver};
//!
//! let accessor = MemoryAccessor::new();
//! let registry = Resolver::new(&accessor).resolve(30)?;
//! for (owner, files) in &registry {
//!     println!("{}: {} stewards files", owner, files.len());
//! }
//! # Ok::<(), stewards_rs::ResolveError>(())
//! ```

pub mod accessor;
mod change_set;
mod config;
pub mod glob;
pub mod parser;
mod path_tree;
mod report;
mod resolver;
mod rules;
mod view;

#[cfg(feature = "checkout")]
pub use accessor::CheckoutAccessor;
pub use accessor::{AccessError, MemoryAccessor, PullRequestInfo, RepositoryAccessor};
pub use change_set::{ChangeSet, ChangeStatus, FileChange};
pub use config::ResolverConfig;
pub use glob::{GlobFilter, Pattern, PatternError};
pub use parser::{GoverningFile, OwnerDeclaration, ParseError, ParserOptions};
pub use path_tree::PathTree;
pub use report::{Reporter, TracingReporter};
pub use resolver::{discover, FetchTarget, ResolveError, Resolver, ResolverBuilder};
pub use rules::{OwnerRuleTree, OwnershipRule};
pub use view::{OwnerChangeView, ResolutionRegistry};

/// Resolve the owners of a pull request with the default configuration.
pub fn resolve<A: RepositoryAccessor>(
    accessor: A,
    pull_request: u64,
) -> Result<ResolutionRegistry, ResolveError> {
    Resolver::new(accessor).resolve(pull_request)
}
