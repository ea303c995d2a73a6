//! Shared test utilities for integration tests.
//!
//! Not all functions are used by every test file, but they're shared across tests.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use git2::{IndexAddOption, Oid, Repository, Signature};

use gw::error::BackendError;
use gw::vcs::{DiffScope, NumStat, StatusEntry, VcsBackend};
use gw::{Config, GitCli, Workspace};

/// Get the path to test fixtures directory.
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Read a pending-document fixture as a string.
pub fn document_fixture(name: &str) -> String {
    let path = fixtures_dir().join("documents").join(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {:?}: {}", path, e))
}

/// A test git repository builder for integration tests.
pub struct TestRepo {
    pub dir: tempfile::TempDir,
    pub repo: Repository,
}

impl TestRepo {
    /// Create a new empty git repository in a temp directory.
    ///
    /// Identity, signing and hooks are pinned in the repository config so the
    /// `git` CLI behaves the same regardless of the user's global setup.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let repo = Repository::init(dir.path()).expect("Failed to init git repo");
        {
            let mut config = repo.config().expect("Failed to open repo config");
            config.set_str("user.name", "Test User").unwrap();
            config.set_str("user.email", "test@example.com").unwrap();
            config.set_bool("commit.gpgsign", false).unwrap();
            config.set_str("core.hooksPath", ".git/hooks").unwrap();
        }
        Self { dir, repo }
    }

    /// A repository with one initial commit containing `files`.
    pub fn with_files(files: &[(&str, &str)]) -> Self {
        let test_repo = Self::new();
        for (name, content) in files {
            test_repo.write(name, content);
        }
        test_repo.commit_all("chore: initial commit");
        test_repo
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Get the test signature for commits.
    fn signature(&self) -> Signature<'_> {
        Signature::now("Test User", "test@example.com").expect("Failed to create signature")
    }

    /// Write a file relative to the working tree root.
    pub fn write(&self, name: &str, content: &str) {
        let path = self.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    pub fn remove(&self, name: &str) {
        std::fs::remove_file(self.path().join(name)).expect("Failed to remove file");
    }

    /// Stage `name` (which must exist in the working tree).
    pub fn stage(&self, name: &str) {
        let mut index = self.repo.index().expect("Failed to get index");
        index.add_path(Path::new(name)).expect("Failed to add file");
        index.write().expect("Failed to write index");
    }

    /// Drop `name` from the index but keep it on disk (`git rm --cached`).
    pub fn untrack(&self, name: &str) {
        let mut index = self.repo.index().expect("Failed to get index");
        index.remove_path(Path::new(name)).expect("Failed to remove path");
        index.write().expect("Failed to write index");
    }

    /// Rename a tracked file and stage the rename.
    pub fn rename_staged(&self, from: &str, to: &str) {
        std::fs::rename(self.path().join(from), self.path().join(to))
            .expect("Failed to rename file");
        let mut index = self.repo.index().expect("Failed to get index");
        index.remove_path(Path::new(from)).expect("Failed to remove path");
        index.add_path(Path::new(to)).expect("Failed to add path");
        index.write().expect("Failed to write index");
    }

    /// Stage everything and commit it. Returns the commit OID.
    pub fn commit_all(&self, message: &str) -> Oid {
        let sig = self.signature();

        let mut index = self.repo.index().expect("Failed to get index");
        index
            .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
            .expect("Failed to add files");
        index
            .update_all(["*"].iter(), None)
            .expect("Failed to update index");
        index.write().expect("Failed to write index");
        let tree_id = index.write_tree().expect("Failed to write tree");
        let tree = self.repo.find_tree(tree_id).expect("Failed to find tree");

        // Get parent commit if exists
        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .expect("Failed to create commit")
    }

    /// Full message of the HEAD commit.
    pub fn head_message(&self) -> String {
        let head = self.repo.head().expect("No HEAD");
        let commit = head.peel_to_commit().expect("HEAD is not a commit");
        commit.message().unwrap_or_default().to_string()
    }

    /// Content of `name` in the HEAD commit, if present.
    pub fn head_file(&self, name: &str) -> Option<String> {
        let tree = self
            .repo
            .head()
            .and_then(|h| h.peel_to_tree())
            .expect("HEAD has no tree");
        let entry = tree.get_path(Path::new(name)).ok()?;
        let blob = self
            .repo
            .find_blob(entry.id())
            .expect("Tree entry is not a blob");
        Some(String::from_utf8_lossy(blob.content()).into_owned())
    }

    /// Number of commits reachable from HEAD.
    pub fn commit_count(&self) -> usize {
        let mut walk = self.repo.revwalk().expect("Failed to create revwalk");
        walk.push_head().expect("Failed to push HEAD");
        walk.count()
    }

    /// Whether `name` differs between the working tree and HEAD.
    pub fn is_dirty(&self, name: &str) -> bool {
        let status = self
            .repo
            .status_file(Path::new(name))
            .expect("Failed to get file status");
        !status.is_empty()
    }

    /// A workspace over the real `git` CLI with default config.
    pub fn workspace(&self) -> Workspace<GitCli> {
        let git = GitCli::discover(self.path()).expect("Failed to discover repo");
        Workspace::new(git, Config::default())
    }

    /// Install an executable hook script (unix only).
    #[cfg(unix)]
    pub fn install_hook(&self, name: &str, script: &str) {
        use std::os::unix::fs::PermissionsExt;

        let hooks = self.path().join(".git").join("hooks");
        std::fs::create_dir_all(&hooks).expect("Failed to create hooks dir");
        let path = hooks.join(name);
        std::fs::write(&path, script).expect("Failed to write hook");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("Failed to make hook executable");
    }
}

/// A call recorded by [`FakeBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Status,
    DiffStat(DiffScope),
    Stage(Vec<String>),
    Commit {
        message: String,
        paths: Vec<String>,
        amend: bool,
    },
}

/// In-memory backend that records every call.
pub struct FakeBackend {
    pub root: PathBuf,
    pub status: Vec<StatusEntry>,
    pub numstat: Vec<NumStat>,
    pub fail_commit: Option<String>,
    pub calls: Mutex<Vec<Call>>,
}

impl FakeBackend {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            status: Vec::new(),
            numstat: Vec::new(),
            fail_commit: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl VcsBackend for FakeBackend {
    fn root(&self) -> PathBuf {
        self.root.clone()
    }

    async fn status(&self, _rename_threshold: u8) -> Result<Vec<StatusEntry>, BackendError> {
        self.record(Call::Status);
        Ok(self.status.clone())
    }

    async fn diff_stat(
        &self,
        scope: DiffScope,
        _rename_threshold: u8,
    ) -> Result<Vec<NumStat>, BackendError> {
        self.record(Call::DiffStat(scope));
        Ok(match scope {
            DiffScope::Unstaged => self.numstat.clone(),
            DiffScope::Staged => Vec::new(),
        })
    }

    async fn stage(&self, paths: &[String]) -> Result<(), BackendError> {
        self.record(Call::Stage(paths.to_vec()));
        Ok(())
    }

    async fn commit(
        &self,
        message: &str,
        paths: &[String],
        amend: bool,
    ) -> Result<String, BackendError> {
        self.record(Call::Commit {
            message: message.to_string(),
            paths: paths.to_vec(),
            amend,
        });
        match self.fail_commit {
            Some(ref stderr) => Err(BackendError::CommandFailed {
                operation: "commit".to_string(),
                code: Some(1),
                stderr: stderr.clone(),
            }),
            None => Ok("0123456789abcdef".to_string()),
        }
    }
}
