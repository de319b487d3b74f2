use crate::error::{GardenerError, Result};
use crate::git::transport::{remote_callbacks, Deadline};
use crate::git::{GitCredentials, RepositoryGateway, TagRef};
use git2::build::CheckoutBuilder;
use git2::{
    AutotagOption, BranchType, ErrorCode, FetchOptions, Index, IndexEntry, IndexTime, Object,
    PushOptions, Repository as Git2Repo, StatusOptions,
};
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Wrapper around git2::Repository implementing [RepositoryGateway]
pub struct Git2Repository {
    repo: Git2Repo,
    remote: String,
    credentials: Option<GitCredentials>,
    timeout: Option<Duration>,
}

impl Git2Repository {
    /// Discover the repository containing `path`
    ///
    /// # Returns
    /// * `Err(GardenerError::RepositoryNotFound)` - no git metadata at or above `path`
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let repo = Git2Repo::discover(path).map_err(|e| {
            if e.code() == ErrorCode::NotFound {
                GardenerError::RepositoryNotFound(path.to_path_buf())
            } else {
                GardenerError::Git(e)
            }
        })?;

        info!(git_dir = %repo.path().display(), "Found git repository");
        Ok(Self::from_git2(repo))
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Self {
        Git2Repository {
            repo,
            remote: "origin".to_string(),
            credentials: None,
            timeout: None,
        }
    }

    pub fn with_remote(mut self, remote: impl Into<String>) -> Self {
        self.remote = remote.into();
        self
    }

    pub fn with_credentials(mut self, credentials: Option<GitCredentials>) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Root of the working tree, `None` for bare repositories
    pub fn workdir(&self) -> Option<&Path> {
        self.repo.workdir()
    }

    /// `path` relative to the working-tree root
    fn workdir_relative(&self, path: &Path) -> Result<PathBuf> {
        let outside = || {
            GardenerError::Git(git2::Error::from_str(&format!(
                "'{}' is outside the working tree",
                path.display()
            )))
        };
        let workdir = fs::canonicalize(self.workdir().ok_or_else(outside)?)?;
        let absolute = fs::canonicalize(path)?;

        absolute
            .strip_prefix(&workdir)
            .map(Path::to_path_buf)
            .map_err(|_| outside())
    }

    fn head_commit(&self) -> Result<git2::Commit<'_>> {
        Ok(self.repo.head()?.peel_to_commit()?)
    }

    fn checkout_object(&self, target: &Object<'_>) -> Result<()> {
        let mut checkout = CheckoutBuilder::new();
        checkout.safe();
        self.repo.checkout_tree(target, Some(&mut checkout))?;
        Ok(())
    }
}

/// Index entries always use `/` separators
fn index_path(relative: &Path) -> String {
    relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

impl RepositoryGateway for Git2Repository {
    fn remote_name(&self) -> &str {
        &self.remote
    }

    fn is_dirty(&self) -> Result<bool> {
        let mut options = StatusOptions::new();
        options.include_untracked(false).include_ignored(false);

        let statuses = self.repo.statuses(Some(&mut options))?;
        let changed: Vec<String> = statuses
            .iter()
            .filter(|entry| !entry.status().is_empty() && !entry.status().is_ignored())
            .filter_map(|entry| entry.path().map(str::to_string))
            .collect();

        if changed.is_empty() {
            Ok(false)
        } else {
            info!(files = ?changed, "Found uncommitted changes");
            Ok(true)
        }
    }

    fn has_changes(&self, path: &Path) -> Result<bool> {
        let relative = self.workdir_relative(path)?;
        let status = self.repo.status_file(&relative)?;
        Ok(!(status.is_empty() || status.is_wt_new() || status.is_ignored()))
    }

    #[instrument(skip(self), fields(remote = %self.remote))]
    fn fetch_tags(&self) -> Result<()> {
        info!("Fetching tags");
        let fetch_error = |reason: String| GardenerError::Fetch {
            remote: self.remote.clone(),
            reason,
            credentials_supplied: self.credentials.is_some(),
        };

        let mut remote = self
            .repo
            .find_remote(&self.remote)
            .map_err(|e| fetch_error(e.message().to_string()))?;

        let deadline = Deadline::start(self.timeout);
        let mut fetch_options = FetchOptions::new();
        fetch_options.remote_callbacks(remote_callbacks(self.credentials.as_ref(), deadline));
        fetch_options.download_tags(AutotagOption::All);

        remote
            .fetch(&["+refs/tags/*:refs/tags/*"], Some(&mut fetch_options), None)
            .map_err(|e| {
                if deadline.expired() {
                    fetch_error(deadline.describe())
                } else {
                    fetch_error(e.message().to_string())
                }
            })?;

        info!(duration_ms = deadline.elapsed_ms(), "Tags fetched");
        Ok(())
    }

    fn current_branch(&self) -> Result<String> {
        match self.repo.head() {
            Ok(head) if head.is_branch() => head
                .shorthand()
                .map(str::to_string)
                .ok_or(GardenerError::DetachedHead),
            Ok(_) => Err(GardenerError::DetachedHead),
            Err(e) if e.code() == ErrorCode::UnbornBranch => {
                // Fresh repository: HEAD still names the branch to be born
                let head = self.repo.find_reference("HEAD")?;
                head.symbolic_target()
                    .and_then(|target| target.strip_prefix("refs/heads/"))
                    .map(str::to_string)
                    .ok_or(GardenerError::DetachedHead)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn list_tags(&self) -> Result<Vec<String>> {
        let tags = self.repo.tag_names(None)?;

        Ok(tags
            .iter()
            .flatten()
            .map(|name| name.trim_start_matches("refs/tags/").to_string())
            .collect())
    }

    fn local_branch_exists(&self, name: &str) -> Result<bool> {
        match self.repo.find_branch(name, BranchType::Local) {
            Ok(_) => Ok(true),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self))]
    fn create_branch(&self, name: &str, checkout: bool) -> Result<()> {
        info!("Creating branch {}{}", name, if checkout { " and checkout" } else { "" });
        let head = self.head_commit()?;

        self.repo.branch(name, &head, false).map_err(|e| {
            if e.code() == ErrorCode::Exists {
                GardenerError::BranchAlreadyExists(name.to_string())
            } else {
                GardenerError::Git(e)
            }
        })?;

        if checkout {
            self.checkout_local(name)?;
        }
        Ok(())
    }

    #[instrument(skip(self))]
    fn checkout_local(&self, name: &str) -> Result<()> {
        info!("Checkout local branch {}", name);
        let refname = format!("refs/heads/{}", name);

        let reference = self.repo.find_reference(&refname).map_err(|e| {
            if e.code() == ErrorCode::NotFound {
                GardenerError::BranchNotFound(name.to_string())
            } else {
                GardenerError::Git(e)
            }
        })?;
        let target = reference.peel(git2::ObjectType::Commit)?;

        self.checkout_object(&target)?;
        self.repo.set_head(&refname)?;
        Ok(())
    }

    #[instrument(skip(self), fields(remote = %self.remote))]
    fn checkout_remote(&self, name: &str) -> Result<()> {
        info!("Checkout remote branch {}", name);
        let remote_branch_name = format!("{}/{}", self.remote, name);

        let remote_branch = self
            .repo
            .find_branch(&remote_branch_name, BranchType::Remote)
            .map_err(|e| {
                if e.code() == ErrorCode::NotFound {
                    GardenerError::BranchNotFound(remote_branch_name.clone())
                } else {
                    GardenerError::Git(e)
                }
            })?;
        let commit = remote_branch.get().peel_to_commit()?;

        let mut local = self.repo.branch(name, &commit, false).map_err(|e| {
            if e.code() == ErrorCode::Exists {
                GardenerError::BranchAlreadyExists(name.to_string())
            } else {
                GardenerError::Git(e)
            }
        })?;
        local.set_upstream(Some(&remote_branch_name))?;

        self.checkout_local(name)
    }

    #[instrument(skip(self))]
    fn commit_all_in_index(&self, message: &str) -> Result<()> {
        info!("Committing files");
        let mut index = self.repo.index()?;
        index.update_all(["*"].iter(), None)?;
        index.write()?;

        let tree_id = index.write_tree()?;
        let tree = self.repo.find_tree(tree_id)?;
        let signature = self.repo.signature()?;
        let parent = self.head_commit()?;

        let oid = self
            .repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &[&parent])?;
        debug!(commit = %oid, "created commit");
        Ok(())
    }

    #[instrument(skip(self, path), fields(path = %path.display()))]
    fn commit_file(&self, path: &Path, message: &str) -> Result<()> {
        info!("Committing {}", path.display());
        let relative = self.workdir_relative(path)?;
        let content = fs::read(path)?;
        let blob = self.repo.blob(&content)?;

        let parent = self.head_commit()?;
        let parent_tree = parent.tree()?;
        let mode = parent_tree
            .get_path(&relative)
            .map(|entry| entry.filemode() as u32)
            .unwrap_or(0o100644);

        // Tree built from HEAD, not from the index, so staged edits stay out
        let mut staging = Index::new()?;
        staging.read_tree(&parent_tree)?;
        staging.add(&IndexEntry {
            ctime: IndexTime::new(0, 0),
            mtime: IndexTime::new(0, 0),
            dev: 0,
            ino: 0,
            mode,
            uid: 0,
            gid: 0,
            file_size: u32::try_from(content.len()).unwrap_or(u32::MAX),
            id: blob,
            flags: 0,
            flags_extended: 0,
            path: index_path(&relative).into_bytes(),
        })?;
        let tree_id = staging.write_tree_to(&self.repo)?;
        let tree = self.repo.find_tree(tree_id)?;
        let signature = self.repo.signature()?;

        let oid = self
            .repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &[&parent])?;

        let mut index = self.repo.index()?;
        index.add_path(&relative)?;
        index.write()?;

        debug!(commit = %oid, "created commit");
        Ok(())
    }

    #[instrument(skip(self))]
    fn create_annotated_tag(&self, name: &str, message: &str) -> Result<TagRef> {
        info!("Creating tag {} with comment {}", name, message);
        let head = self.head_commit()?;
        let tagger = self.repo.signature()?;

        self.repo
            .tag(name, head.as_object(), &tagger, message, false)
            .map_err(|e| {
                if e.code() == ErrorCode::Exists {
                    GardenerError::TagAlreadyExists(name.to_string())
                } else {
                    GardenerError::Git(e)
                }
            })?;

        Ok(TagRef {
            name: name.to_string(),
            commit: head.id().to_string(),
        })
    }

    #[instrument(skip(self))]
    fn delete_branch(&self, name: &str, force: bool) -> Result<()> {
        info!("Deleting branch {}", name);
        let mut branch = self
            .repo
            .find_branch(name, BranchType::Local)
            .map_err(|e| {
                if e.code() == ErrorCode::NotFound {
                    GardenerError::BranchNotFound(name.to_string())
                } else {
                    GardenerError::Git(e)
                }
            })?;

        if !force {
            let tip = branch.get().peel_to_commit()?.id();
            let head = self.head_commit()?.id();
            if tip != head && !self.repo.graph_descendant_of(head, tip)? {
                return Err(GardenerError::Git(git2::Error::from_str(&format!(
                    "branch '{}' is not fully merged",
                    name
                ))));
            }
        }

        branch.delete()?;
        Ok(())
    }

    #[instrument(skip(self, tag), fields(remote = %self.remote, tag = %tag.name))]
    fn push_tag(&self, tag: &TagRef) -> Result<()> {
        info!("Pushing tag {} to remote repository", tag.name);
        let push_error = |reason: String| GardenerError::TagPush {
            tag: tag.name.clone(),
            remote: self.remote.clone(),
            reason,
        };

        let mut remote = self
            .repo
            .find_remote(&self.remote)
            .map_err(|e| push_error(e.message().to_string()))?;

        let deadline = Deadline::start(self.timeout);
        let rejection: RefCell<Option<String>> = RefCell::new(None);

        let mut callbacks = remote_callbacks(self.credentials.as_ref(), deadline);
        callbacks.push_update_reference(|refname, status| {
            if let Some(status) = status {
                *rejection.borrow_mut() = Some(format!("{} rejected: {}", refname, status));
            }
            Ok(())
        });

        let mut push_options = PushOptions::new();
        push_options.remote_callbacks(callbacks);

        let refspec = format!("{0}:{0}", tag.refname());
        let pushed = remote.push(&[refspec.as_str()], Some(&mut push_options));
        drop(push_options);

        if let Err(e) = pushed {
            return Err(if deadline.expired() {
                push_error(deadline.describe())
            } else {
                push_error(e.message().to_string())
            });
        }
        if let Some(reason) = rejection.into_inner() {
            return Err(push_error(reason));
        }

        info!(duration_ms = deadline.elapsed_ms(), "Tag pushed");
        Ok(())
    }

    #[instrument(skip(self))]
    fn checkout_tag(&self, name: &str) -> Result<()> {
        info!("Checkout {} tag", name);
        let reference = self
            .repo
            .find_reference(&format!("refs/tags/{}", name))
            .map_err(|e| {
                if e.code() == ErrorCode::NotFound {
                    GardenerError::TagNotFound(name.to_string())
                } else {
                    GardenerError::Git(e)
                }
            })?;
        let commit = reference.peel_to_commit()?;

        self.checkout_object(commit.as_object())?;
        self.repo.set_head_detached(commit.id())?;
        Ok(())
    }
}
