//! Release workflow orchestration
//!
//! Both workflows are short linear sequences with early-exit guards. The
//! only multi-step transaction is the temporary branch that carries the
//! version bump commit; if it breaks half way the working tree is put back
//! the way it was before the error is returned.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::boundary::ReleaseWarning;
use crate::cli::strategy::strategy_for;
use crate::config::{ReleaseConfiguration, Settings};
use crate::error::{GardenerError, Result};
use crate::git::{RepositoryGateway, TagRef};
use crate::properties;
use crate::ui::Interactor;
use crate::version;

/// Result of a successful release
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseOutcome {
    pub version: String,
    pub tag: String,
    pub commit_message: String,
    /// Branch that staged the version bump; already deleted
    pub temp_branch: String,
    /// Branch the release was cut from
    pub release_branch: String,
    /// The working tree was left on the tag instead of `release_branch`
    pub checked_out_tag: bool,
    pub pushed: bool,
    pub warnings: Vec<ReleaseWarning>,
}

/// Result of a release branch request. Only `Created` changes the repository.
#[derive(Debug, Clone, PartialEq)]
pub enum BranchOutcome {
    Created { branch: String, based_on: String },
    VersionAlreadyReleased { version: String },
    BranchAlreadyExists { branch: String },
}

/// Everything decided before the repository is touched
struct ReleasePlan {
    version: String,
    tag: String,
    commit_message: String,
    temp_branch: String,
    release_branch: String,
    properties_path: PathBuf,
    /// Uncommitted changes were tolerated and must stay out of the release
    keep_local_changes: bool,
}

/// How far the temporary branch transaction got
#[derive(Default)]
struct StagingProgress {
    snapshot: Option<Vec<u8>>,
    committed: bool,
}

/// Drives a [RepositoryGateway] through the release workflows.
///
/// Collaborators are borrowed so one gateway and one interactor can be
/// built per invocation and handed in.
pub struct ReleaseOrchestrator<'a> {
    repo: &'a dyn RepositoryGateway,
    interactor: &'a dyn Interactor,
    config: &'a ReleaseConfiguration,
    settings: &'a Settings,
}

impl<'a> ReleaseOrchestrator<'a> {
    pub fn new(
        repo: &'a dyn RepositoryGateway,
        interactor: &'a dyn Interactor,
        config: &'a ReleaseConfiguration,
        settings: &'a Settings,
    ) -> Self {
        ReleaseOrchestrator {
            repo,
            interactor,
            config,
            settings,
        }
    }

    /// Fails on uncommitted changes unless dry-run tolerates them.
    ///
    /// Returns `true` when the tree is dirty and work goes on anyway.
    fn guard_clean_tree(
        &self,
        operation: &'static str,
        warnings: &mut Vec<ReleaseWarning>,
    ) -> Result<bool> {
        if !self.repo.is_dirty()? {
            return Ok(false);
        }
        if self.settings.dry_run {
            warn!("Uncommitted changes found, continuing because dry-run is enabled");
            warnings.push(ReleaseWarning::DirtyTreeTolerated);
            Ok(true)
        } else {
            Err(GardenerError::UncommittedChanges { operation })
        }
    }

    /// Tags the next patch release of the current (or requested) release line.
    ///
    /// `project_dir` is where the properties file is looked up.
    ///
    /// # Returns
    /// * `Ok(ReleaseOutcome)` - tag created locally; a failed push only adds a warning
    /// * `Err(GardenerError)` - any other failure; nothing is left half done
    pub fn create_release(&self, project_dir: &Path) -> Result<ReleaseOutcome> {
        let mut warnings = Vec::new();
        let keep_local_changes = self.guard_clean_tree("release", &mut warnings)?;

        self.repo.fetch_tags()?;

        let major_minor_override = self.settings.release_major_minor_version.as_deref();
        if let Some(major_minor) = major_minor_override {
            version::validate_major_minor(major_minor)?;
        }

        let strategy = strategy_for(self.config);
        let release_branch = strategy.resolve_target_branch(self.repo, major_minor_override)?;
        let tags = self.repo.list_tags()?;
        let version = strategy.resolve_version(&release_branch, major_minor_override, &tags)?;

        info!("Creating release for version {}", version);

        let plan = ReleasePlan {
            tag: self.config.tag_name(&version),
            commit_message: self.config.commit_message(&version),
            temp_branch: self.config.temp_branch(&version),
            properties_path: properties::find_properties_file(
                project_dir,
                &self.config.properties_file,
            )?,
            release_branch,
            version,
            keep_local_changes,
        };

        // The release commit rewrites this file, so its own edits cannot be kept aside
        if keep_local_changes && self.repo.has_changes(&plan.properties_path)? {
            warn!(
                "{} has uncommitted changes and is part of the release commit",
                plan.properties_path.display()
            );
            return Err(GardenerError::UncommittedChanges { operation: "release" });
        }

        if self.repo.local_branch_exists(&plan.temp_branch)? {
            return Err(GardenerError::TempBranchAlreadyExists(plan.temp_branch));
        }

        self.repo.create_branch(&plan.temp_branch, true)?;

        let mut progress = StagingProgress::default();
        let tag = match self.stage_release(&plan, &mut progress, &mut warnings) {
            Ok(tag) => tag,
            Err(err) => {
                self.roll_back(&plan, &progress);
                return Err(err);
            }
        };

        let checked_out_tag = self.settings.checkout_tag;
        if checked_out_tag {
            self.repo.checkout_tag(&tag.name)?;
        } else {
            self.repo.checkout_local(&plan.release_branch)?;
        }

        self.repo.delete_branch(&plan.temp_branch, true)?;

        let pushed = self.push_best_effort(&tag, &mut warnings);

        Ok(ReleaseOutcome {
            version: plan.version,
            tag: tag.name,
            commit_message: plan.commit_message,
            temp_branch: plan.temp_branch,
            release_branch: plan.release_branch,
            checked_out_tag,
            pushed,
            warnings,
        })
    }

    /// Bump the properties file, commit and tag, on the temporary branch.
    fn stage_release(
        &self,
        plan: &ReleasePlan,
        progress: &mut StagingProgress,
        warnings: &mut Vec<ReleaseWarning>,
    ) -> Result<TagRef> {
        progress.snapshot = Some(fs::read(&plan.properties_path)?);
        if !properties::update_version_in_file(&plan.properties_path, &plan.version)? {
            warnings.push(ReleaseWarning::VersionKeyMissing {
                path: plan.properties_path.clone(),
            });
        }

        if plan.keep_local_changes {
            self.repo
                .commit_file(&plan.properties_path, &plan.commit_message)?;
        } else {
            self.repo.commit_all_in_index(&plan.commit_message)?;
        }
        progress.committed = true;

        self.repo
            .create_annotated_tag(&plan.tag, &plan.commit_message)
    }

    /// Undo a broken staging transaction. Every step is attempted on its own.
    fn roll_back(&self, plan: &ReleasePlan, progress: &StagingProgress) {
        warn!(
            "Release {} failed, returning to branch {}",
            plan.version, plan.release_branch
        );

        if !progress.committed {
            if let Some(snapshot) = &progress.snapshot {
                if let Err(e) = fs::write(&plan.properties_path, snapshot) {
                    warn!(
                        "Could not restore {}: {}",
                        plan.properties_path.display(),
                        e
                    );
                }
            }
        }

        if let Err(e) = self.repo.checkout_local(&plan.release_branch) {
            warn!(
                "Could not check out {}: {}. Temporary branch {} was kept",
                plan.release_branch, e, plan.temp_branch
            );
            return;
        }

        if let Err(e) = self.repo.delete_branch(&plan.temp_branch, true) {
            warn!("Could not delete temporary branch {}: {}", plan.temp_branch, e);
        }
    }

    /// A push failure leaves the local release intact and becomes a warning.
    fn push_best_effort(&self, tag: &TagRef, warnings: &mut Vec<ReleaseWarning>) -> bool {
        match self.repo.push_tag(tag) {
            Ok(()) => true,
            Err(err) => {
                debug!(error = ?err, "tag push failed");
                let warning = match err {
                    GardenerError::TagPush {
                        tag,
                        remote,
                        reason,
                    } => ReleaseWarning::TagPushFailed {
                        tag,
                        remote,
                        reason,
                    },
                    other => ReleaseWarning::TagPushFailed {
                        tag: tag.name.clone(),
                        remote: self.repo.remote_name().to_string(),
                        reason: other.to_string(),
                    },
                };
                if let Some(command) = warning.remediation() {
                    warn!("Failed to push tag {}. Push it manually: {}", tag.name, command);
                }
                warnings.push(warning);
                false
            }
        }
    }

    /// Cuts a new `<prefix><major>.<minor>` branch from the current branch.
    ///
    /// Already released versions and existing branches are reported as
    /// outcomes, not errors.
    pub fn create_release_branch(&self) -> Result<BranchOutcome> {
        let mut warnings = Vec::new();
        self.guard_clean_tree("release branch", &mut warnings)?;

        let current_branch = self.repo.current_branch()?;
        info!("Creating new release branch based on: {}", current_branch);

        let tags = self.repo.list_tags()?;
        let suggested = version::next_branch_version(&tags);

        let requested = if self.settings.create_default_release_branch {
            info!("Using default release branch version {}", suggested);
            suggested
        } else {
            self.interactor.ask(
                &format!(
                    "Please specify release version in x.y format (Default: {})",
                    suggested
                ),
                Some(&suggested),
            )?
        };

        if version::branch_version_already_exists(&requested, &tags) {
            info!("Version {} already exists", requested);
            return Ok(BranchOutcome::VersionAlreadyReleased { version: requested });
        }

        version::validate_major_minor(&requested)?;

        let branch = self.config.branch_pattern().branch_for(&requested);
        if self.repo.local_branch_exists(&branch)? {
            info!("Branch with name {} already exists", branch);
            return Ok(BranchOutcome::BranchAlreadyExists { branch });
        }

        self.repo.create_branch(&branch, true)?;
        info!(
            "Branch {} was successfully created based on {}",
            branch, current_branch
        );

        Ok(BranchOutcome::Created {
            branch,
            based_on: current_branch,
        })
    }
}
