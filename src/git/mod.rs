//! Git operations abstraction layer
//!
//! This module provides a trait-based abstraction over the git working tree
//! the release workflow mutates, allowing for a real implementation and an
//! in-memory one for testing.
//!
//! # Overview
//!
//! The primary abstraction is the [RepositoryGateway] trait. The concrete
//! implementations are:
//!
//! - [repository::Git2Repository]: a real implementation using the `git2` crate
//! - [mock::MockRepository]: an in-memory implementation that journals calls
//!
//! The orchestration code depends on the trait only, so a gateway is built
//! once per invocation and passed in explicitly.
//!
//! ```rust
//! # use branch_gardener::git::RepositoryGateway;
//! # fn example(repo: &dyn RepositoryGateway) -> branch_gardener::Result<()> {
//! if !repo.is_dirty()? {
//!     repo.fetch_tags()?;
//!     println!("{} has tags {:?}", repo.current_branch()?, repo.list_tags()?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod mock;
pub mod repository;
pub mod transport;

pub use mock::MockRepository;
pub use repository::Git2Repository;
pub use transport::GitCredentials;

use crate::error::Result;
use std::path::Path;

/// Handle to a freshly created annotated tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRef {
    /// Short tag name (without `refs/tags/`)
    pub name: String,
    /// Commit the tag points at
    pub commit: String,
}

impl TagRef {
    pub fn refname(&self) -> String {
        format!("refs/tags/{}", self.name)
    }
}

/// Git operations the release workflow needs.
///
/// ## Error Handling
///
/// Every method returns [crate::error::Result<T>]. Implementations map
/// underlying `git2` failures to the matching [crate::error::GardenerError]
/// variant. Only [RepositoryGateway::push_tag] failures are treated as
/// non-fatal by callers.
pub trait RepositoryGateway {
    /// Name of the remote tags are fetched from and pushed to.
    fn remote_name(&self) -> &str;

    /// Whether tracked files have staged or unstaged modifications.
    ///
    /// Untracked files do not count as uncommitted changes.
    fn is_dirty(&self) -> Result<bool>;

    /// Whether the tracked file at `path` differs from HEAD, staged or not.
    fn has_changes(&self, path: &Path) -> Result<bool>;

    /// Update local tags from the configured remote.
    ///
    /// # Returns
    /// * `Err(GardenerError::Fetch)` - transport failure or timeout
    fn fetch_tags(&self) -> Result<()>;

    /// Name of the checked out branch.
    ///
    /// # Returns
    /// * `Err(GardenerError::DetachedHead)` - when HEAD is not on a branch
    fn current_branch(&self) -> Result<String>;

    /// All tag names, with any `refs/tags/` prefix stripped.
    fn list_tags(&self) -> Result<Vec<String>>;

    fn local_branch_exists(&self, name: &str) -> Result<bool>;

    /// Create a branch at HEAD and optionally switch to it.
    ///
    /// # Returns
    /// * `Err(GardenerError::BranchAlreadyExists)` - if the name is taken
    fn create_branch(&self, name: &str, checkout: bool) -> Result<()>;

    /// Switch the working tree to an existing local branch.
    fn checkout_local(&self, name: &str) -> Result<()>;

    /// Create a local branch tracking `<remote>/<name>` and switch to it.
    fn checkout_remote(&self, name: &str) -> Result<()>;

    /// Stage every change to tracked files and commit it on the current
    /// branch. Untracked files stay out of the commit.
    fn commit_all_in_index(&self, message: &str) -> Result<()>;

    /// Commit the file at `path`, as it is on disk, on top of HEAD.
    ///
    /// Every other staged or unstaged change stays out of the commit and is
    /// left in place.
    fn commit_file(&self, path: &Path, message: &str) -> Result<()>;

    /// Create an annotated tag at HEAD.
    ///
    /// # Returns
    /// * `Err(GardenerError::TagAlreadyExists)` - if the name is taken
    fn create_annotated_tag(&self, name: &str, message: &str) -> Result<TagRef>;

    /// Delete a local branch that is not checked out.
    ///
    /// Without `force` the branch must be merged into HEAD.
    fn delete_branch(&self, name: &str, force: bool) -> Result<()>;

    /// Push a single tag to the configured remote.
    ///
    /// # Returns
    /// * `Err(GardenerError::TagPush)` - transport, rejection or timeout
    fn push_tag(&self, tag: &TagRef) -> Result<()>;

    /// Check out the commit a tag points at with a detached HEAD.
    fn checkout_tag(&self, name: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_refname() {
        let tag = TagRef {
            name: "1.2.4".to_string(),
            commit: "abc".to_string(),
        };
        assert_eq!(tag.refname(), "refs/tags/1.2.4");
    }
}
