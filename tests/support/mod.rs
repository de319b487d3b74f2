// Shared fixture: a working repository with a bare "origin" next to it.
#![allow(dead_code)]

use git2::{Oid, Repository, Signature};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct Fixture {
    _dir: TempDir,
    pub work: PathBuf,
    pub origin: PathBuf,
}

impl Fixture {
    /// Working tree on `branch` with one commit holding `gradle.properties`,
    /// the branch already pushed to origin.
    pub fn new(branch: &str, properties: &str) -> Self {
        let dir = TempDir::new().expect("Could not create temp dir");
        let origin = dir.path().join("origin.git");
        let work = dir.path().join("work");

        Repository::init_bare(&origin).expect("Could not init bare origin");
        let repo = Repository::init(&work).expect("Could not init git repo");
        {
            let mut config = repo.config().expect("Could not get config");
            config
                .set_str("user.name", "Test User")
                .expect("Could not set user.name");
            config
                .set_str("user.email", "test@example.com")
                .expect("Could not set user.email");
        }
        repo.set_head(&format!("refs/heads/{}", branch))
            .expect("Could not point HEAD at branch");
        repo.remote("origin", origin.to_str().expect("utf-8 temp path"))
            .expect("Could not add remote");

        let fixture = Fixture {
            _dir: dir,
            work,
            origin,
        };
        fixture.commit_file("gradle.properties", properties, "Initial commit");
        fixture.push_branch(branch);
        fixture
    }

    pub fn repo(&self) -> Repository {
        Repository::open(&self.work).expect("Could not open work repo")
    }

    pub fn origin_repo(&self) -> Repository {
        Repository::open_bare(&self.origin).expect("Could not open origin")
    }

    pub fn write(&self, name: &str, content: &str) {
        fs::write(self.work.join(name), content).expect("Could not write file");
    }

    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.work.join(name)).expect("Could not read file")
    }

    /// Commit `name` with `content` on the current branch
    pub fn commit_file(&self, name: &str, content: &str, message: &str) -> Oid {
        self.write(name, content);
        let repo = self.repo();

        let mut index = repo.index().expect("Could not get index");
        index
            .add_path(Path::new(name))
            .expect("Could not add file to index");
        index.write().expect("Could not write index");

        let tree_id = index.write_tree().expect("Could not write tree");
        let tree = repo.find_tree(tree_id).expect("Could not find tree");
        let signature = Signature::now("Test User", "test@example.com").unwrap();

        let parent = repo.head().ok().and_then(|head| head.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
            .expect("Could not create commit")
    }

    pub fn push_branch(&self, branch: &str) {
        let repo = self.repo();
        let mut remote = repo.find_remote("origin").unwrap();
        let refspec = format!("refs/heads/{0}:refs/heads/{0}", branch);
        remote
            .push(&[refspec.as_str()], None)
            .expect("Could not push branch");
    }

    /// Lightweight tag created directly in origin at `branch`'s tip
    pub fn tag_in_origin(&self, tag: &str, branch: &str) {
        let origin = self.origin_repo();
        let target = origin
            .revparse_single(&format!("refs/heads/{}", branch))
            .expect("Could not resolve origin branch");
        origin
            .tag_lightweight(tag, &target, false)
            .expect("Could not tag origin");
    }

    /// Lightweight tag in origin on a root commit the work repository has
    /// never seen, so fetching it has objects to transfer
    pub fn tag_new_commit_in_origin(&self, tag: &str) {
        let origin = self.origin_repo();
        let blob = origin.blob(b"only in origin\n").unwrap();
        let mut builder = origin.treebuilder(None).unwrap();
        builder.insert("origin.txt", blob, 0o100644).unwrap();
        let tree = origin.find_tree(builder.write().unwrap()).unwrap();
        let signature = Signature::now("Test User", "test@example.com").unwrap();

        let commit = origin
            .commit(None, &signature, &signature, "Origin only", &tree, &[])
            .expect("Could not commit in origin");
        let target = origin.find_object(commit, None).unwrap();
        origin
            .tag_lightweight(tag, &target, false)
            .expect("Could not tag origin");
    }

    /// Stage the current content of `name` without committing
    pub fn stage(&self, name: &str) {
        let repo = self.repo();
        let mut index = repo.index().expect("Could not get index");
        index
            .add_path(Path::new(name))
            .expect("Could not add file to index");
        index.write().expect("Could not write index");
    }

    pub fn tag_locally(&self, tag: &str) {
        let repo = self.repo();
        let head = repo.head().unwrap().peel_to_commit().unwrap();
        repo.tag_lightweight(tag, head.as_object(), false)
            .expect("Could not create tag");
    }

    pub fn local_tags(&self) -> Vec<String> {
        let repo = self.repo();
        let names = repo.tag_names(None).unwrap();
        names.iter().flatten().map(str::to_string).collect()
    }

    pub fn origin_has_tag(&self, tag: &str) -> bool {
        self.origin_repo()
            .find_reference(&format!("refs/tags/{}", tag))
            .is_ok()
    }

    pub fn head_branch(&self) -> Option<String> {
        let repo = self.repo();
        let head = repo.head().ok()?;
        if head.is_branch() {
            head.shorthand().map(str::to_string)
        } else {
            None
        }
    }

    pub fn local_branch_exists(&self, name: &str) -> bool {
        self.repo()
            .find_branch(name, git2::BranchType::Local)
            .is_ok()
    }

    /// Content of `name` as recorded in the commit `tag` points at
    pub fn file_at_tag(&self, tag: &str, name: &str) -> String {
        let repo = self.repo();
        let commit = repo
            .find_reference(&format!("refs/tags/{}", tag))
            .unwrap()
            .peel_to_commit()
            .unwrap();
        let entry = commit.tree().unwrap().get_path(Path::new(name)).unwrap();
        let blob = repo.find_blob(entry.id()).unwrap();
        String::from_utf8(blob.content().to_vec()).unwrap()
    }
}
