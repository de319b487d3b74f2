use crate::error::{GardenerError, Result};
use crate::git::{RepositoryGateway, TagRef};
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// How a failing push reports itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PushFailure {
    /// The remote answered and refused
    Rejected,
    /// Something below the push itself broke
    Transport,
}

#[derive(Debug, Default)]
struct MockState {
    dirty: bool,
    changed_files: BTreeSet<PathBuf>,
    /// `None` once a tag was checked out
    current: Option<String>,
    tags: Vec<String>,
    local_branches: BTreeSet<String>,
    remote_branches: BTreeSet<String>,
    commits: Vec<String>,
    pushed: Vec<String>,
    calls: Vec<String>,
    fail_fetch: bool,
    fail_push: Option<PushFailure>,
    fail_commit: bool,
}

/// In-memory repository for testing without actual git operations.
///
/// Every gateway call is journaled as a short string (`"create_branch release/1.3 checkout"`)
/// so tests can assert the exact order of side effects.
pub struct MockRepository {
    remote: String,
    state: RefCell<MockState>,
}

impl MockRepository {
    /// Create a clean repository with `branch` checked out
    pub fn new(branch: impl Into<String>) -> Self {
        let branch = branch.into();
        let mut state = MockState::default();
        state.local_branches.insert(branch.clone());
        state.current = Some(branch);
        MockRepository {
            remote: "origin".to_string(),
            state: RefCell::new(state),
        }
    }

    pub fn with_remote(mut self, remote: impl Into<String>) -> Self {
        self.remote = remote.into();
        self
    }

    pub fn with_tags<I, S>(self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state
            .borrow_mut()
            .tags
            .extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_local_branch(self, name: impl Into<String>) -> Self {
        self.state.borrow_mut().local_branches.insert(name.into());
        self
    }

    /// Branch only known as `<remote>/<name>`
    pub fn with_remote_branch(self, name: impl Into<String>) -> Self {
        self.state.borrow_mut().remote_branches.insert(name.into());
        self
    }

    pub fn dirty(self) -> Self {
        self.state.borrow_mut().dirty = true;
        self
    }

    /// Dirty tree where the file at `path` is one of the modified files
    pub fn with_changed_file(self, path: impl Into<PathBuf>) -> Self {
        {
            let mut state = self.state.borrow_mut();
            state.dirty = true;
            state.changed_files.insert(path.into());
        }
        self
    }

    pub fn failing_fetch(self) -> Self {
        self.state.borrow_mut().fail_fetch = true;
        self
    }

    /// Push refused by the remote
    pub fn failing_push(self) -> Self {
        self.state.borrow_mut().fail_push = Some(PushFailure::Rejected);
        self
    }

    /// Push broken by a plain git error rather than a push failure
    pub fn failing_push_transport(self) -> Self {
        self.state.borrow_mut().fail_push = Some(PushFailure::Transport);
        self
    }

    pub fn failing_commit(self) -> Self {
        self.state.borrow_mut().fail_commit = true;
        self
    }

    /// Journal of gateway calls in invocation order
    pub fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }

    pub fn tags(&self) -> Vec<String> {
        self.state.borrow().tags.clone()
    }

    pub fn local_branches(&self) -> Vec<String> {
        self.state.borrow().local_branches.iter().cloned().collect()
    }

    /// Checked out branch, `None` when HEAD is detached
    pub fn head(&self) -> Option<String> {
        self.state.borrow().current.clone()
    }

    pub fn commits(&self) -> Vec<String> {
        self.state.borrow().commits.clone()
    }

    pub fn pushed_tags(&self) -> Vec<String> {
        self.state.borrow().pushed.clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.state.borrow_mut().calls.push(call.into());
    }

    fn write_commit(&self, message: &str) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if state.fail_commit {
            return Err(GardenerError::Git(git2::Error::from_str(
                "failed to write commit",
            )));
        }
        state.commits.push(message.to_string());
        Ok(())
    }
}

/// Journals carry the file name only, temp dirs differ per run
fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

impl RepositoryGateway for MockRepository {
    fn remote_name(&self) -> &str {
        &self.remote
    }

    fn is_dirty(&self) -> Result<bool> {
        self.record("is_dirty");
        Ok(self.state.borrow().dirty)
    }

    fn has_changes(&self, path: &Path) -> Result<bool> {
        self.record(format!("has_changes {}", file_name(path)));
        Ok(self.state.borrow().changed_files.contains(path))
    }

    fn fetch_tags(&self) -> Result<()> {
        self.record("fetch_tags");
        if self.state.borrow().fail_fetch {
            return Err(GardenerError::Fetch {
                remote: self.remote.clone(),
                reason: "connection refused".to_string(),
                credentials_supplied: false,
            });
        }
        Ok(())
    }

    fn current_branch(&self) -> Result<String> {
        self.record("current_branch");
        self.state
            .borrow()
            .current
            .clone()
            .ok_or(GardenerError::DetachedHead)
    }

    fn list_tags(&self) -> Result<Vec<String>> {
        self.record("list_tags");
        Ok(self.state.borrow().tags.clone())
    }

    fn local_branch_exists(&self, name: &str) -> Result<bool> {
        self.record(format!("local_branch_exists {}", name));
        Ok(self.state.borrow().local_branches.contains(name))
    }

    fn create_branch(&self, name: &str, checkout: bool) -> Result<()> {
        self.record(format!(
            "create_branch {}{}",
            name,
            if checkout { " checkout" } else { "" }
        ));
        let mut state = self.state.borrow_mut();
        if !state.local_branches.insert(name.to_string()) {
            return Err(GardenerError::BranchAlreadyExists(name.to_string()));
        }
        if checkout {
            state.current = Some(name.to_string());
        }
        Ok(())
    }

    fn checkout_local(&self, name: &str) -> Result<()> {
        self.record(format!("checkout_local {}", name));
        let mut state = self.state.borrow_mut();
        if !state.local_branches.contains(name) {
            return Err(GardenerError::BranchNotFound(name.to_string()));
        }
        state.current = Some(name.to_string());
        Ok(())
    }

    fn checkout_remote(&self, name: &str) -> Result<()> {
        self.record(format!("checkout_remote {}", name));
        let mut state = self.state.borrow_mut();
        if !state.remote_branches.contains(name) {
            return Err(GardenerError::BranchNotFound(format!(
                "{}/{}",
                self.remote, name
            )));
        }
        if !state.local_branches.insert(name.to_string()) {
            return Err(GardenerError::BranchAlreadyExists(name.to_string()));
        }
        state.current = Some(name.to_string());
        Ok(())
    }

    fn commit_all_in_index(&self, message: &str) -> Result<()> {
        self.record(format!("commit {}", message));
        self.write_commit(message)?;
        let mut state = self.state.borrow_mut();
        state.dirty = false;
        state.changed_files.clear();
        Ok(())
    }

    fn commit_file(&self, path: &Path, message: &str) -> Result<()> {
        self.record(format!("commit_file {} {}", file_name(path), message));
        self.write_commit(message)?;
        self.state.borrow_mut().changed_files.remove(path);
        Ok(())
    }

    fn create_annotated_tag(&self, name: &str, message: &str) -> Result<TagRef> {
        self.record(format!("create_tag {}", name));
        let mut state = self.state.borrow_mut();
        if state.tags.iter().any(|tag| tag == name) {
            return Err(GardenerError::TagAlreadyExists(name.to_string()));
        }
        state.tags.push(name.to_string());
        Ok(TagRef {
            name: name.to_string(),
            commit: format!("{:040x}", state.commits.len() + message.len()),
        })
    }

    fn delete_branch(&self, name: &str, force: bool) -> Result<()> {
        self.record(format!(
            "delete_branch {}{}",
            name,
            if force { " force" } else { "" }
        ));
        let mut state = self.state.borrow_mut();
        if state.current.as_deref() == Some(name) {
            return Err(GardenerError::Git(git2::Error::from_str(&format!(
                "cannot delete branch '{}' checked out",
                name
            ))));
        }
        if !state.local_branches.remove(name) {
            return Err(GardenerError::BranchNotFound(name.to_string()));
        }
        Ok(())
    }

    fn push_tag(&self, tag: &TagRef) -> Result<()> {
        self.record(format!("push_tag {}", tag.name));
        let mut state = self.state.borrow_mut();
        match state.fail_push {
            Some(PushFailure::Rejected) => {
                return Err(GardenerError::TagPush {
                    tag: tag.name.clone(),
                    remote: self.remote.clone(),
                    reason: "authentication required".to_string(),
                })
            }
            Some(PushFailure::Transport) => {
                return Err(GardenerError::Git(git2::Error::from_str(
                    "connection reset by peer",
                )))
            }
            None => {}
        }
        state.pushed.push(tag.name.clone());
        Ok(())
    }

    fn checkout_tag(&self, name: &str) -> Result<()> {
        self.record(format!("checkout_tag {}", name));
        let mut state = self.state.borrow_mut();
        if !state.tags.iter().any(|tag| tag == name) {
            return Err(GardenerError::TagNotFound(name.to_string()));
        }
        state.current = None;
        Ok(())
    }
}
