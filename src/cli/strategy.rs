//! The two policies for deriving a release version.

use tracing::info;

use crate::config::{ReleaseConfiguration, VersionDeterminationSchema};
use crate::domain::ReleaseBranchPattern;
use crate::error::Result;
use crate::git::RepositoryGateway;
use crate::version;

/// Decides which branch is released and which version it gets.
pub trait VersionStrategy {
    /// Switches to the branch being released, if needed, and returns its name.
    fn resolve_target_branch(
        &self,
        repo: &dyn RepositoryGateway,
        major_minor_override: Option<&str>,
    ) -> Result<String>;

    /// Computes the release version from the branch and the known tags.
    fn resolve_version(
        &self,
        branch: &str,
        major_minor_override: Option<&str>,
        tags: &[String],
    ) -> Result<String>;
}

/// `major.minor` comes from the release branch name, patch from tags.
pub struct BranchNameStrategy {
    pattern: ReleaseBranchPattern,
}

impl BranchNameStrategy {
    pub fn new(pattern: ReleaseBranchPattern) -> Self {
        BranchNameStrategy { pattern }
    }
}

impl VersionStrategy for BranchNameStrategy {
    fn resolve_target_branch(
        &self,
        repo: &dyn RepositoryGateway,
        major_minor_override: Option<&str>,
    ) -> Result<String> {
        if let Some(major_minor) = major_minor_override {
            info!("Using user defined branch version: {}", major_minor);
            let target = self.pattern.branch_for(major_minor);

            if repo.current_branch()? != target {
                info!("Switching to release branch {}", target);
                if repo.local_branch_exists(&target)? {
                    repo.checkout_local(&target)?;
                } else {
                    repo.checkout_remote(&target)?;
                }
            }
        }

        let branch = repo.current_branch()?;
        info!(
            "Checking that branch '{}' matches release branch naming pattern '{}'",
            branch,
            self.pattern.describe()
        );
        self.pattern.check(&branch)?;
        Ok(branch)
    }

    fn resolve_version(
        &self,
        branch: &str,
        _major_minor_override: Option<&str>,
        tags: &[String],
    ) -> Result<String> {
        let major_minor = version::extract_major_minor(branch, self.pattern.prefix())?;
        Ok(version::next_release_version_for(&major_minor, tags))
    }
}

/// Whole version from the greatest tag; the branch name plays no part.
pub struct LatestTagStrategy;

impl VersionStrategy for LatestTagStrategy {
    fn resolve_target_branch(
        &self,
        repo: &dyn RepositoryGateway,
        _major_minor_override: Option<&str>,
    ) -> Result<String> {
        repo.current_branch()
    }

    fn resolve_version(
        &self,
        _branch: &str,
        major_minor_override: Option<&str>,
        tags: &[String],
    ) -> Result<String> {
        Ok(match major_minor_override {
            Some(major_minor) => version::next_release_version_for(major_minor, tags),
            None => version::next_release_version(tags),
        })
    }
}

/// Picks the strategy matching the configured schema.
pub fn strategy_for(config: &ReleaseConfiguration) -> Box<dyn VersionStrategy> {
    match config.version_determination_schema {
        VersionDeterminationSchema::MajorMinorFromBranchNamePatchFromTag => {
            Box::new(BranchNameStrategy::new(config.branch_pattern()))
        }
        VersionDeterminationSchema::MajorMinorPatchFromTag => Box::new(LatestTagStrategy),
    }
}
