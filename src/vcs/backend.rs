//! The version-control seam: everything gw needs from a repository.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::changes::ChangeState;
use crate::error::BackendError;

/// Which side of the index a diff compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffScope {
    /// Index against HEAD.
    Staged,
    /// Working tree against the index.
    Unstaged,
}

/// One path from the status query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    pub path: String,
    pub prior_path: Option<String>,
    pub staged: ChangeState,
    pub unstaged: ChangeState,
    /// Not tracked at all; every line of the file is new.
    pub untracked: bool,
}

/// Line counts for one path from a diff-stat query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumStat {
    pub path: String,
    pub prior_path: Option<String>,
    /// `0` for binary files.
    pub added: u64,
    pub removed: u64,
}

/// Repository operations used by the inspector and the commit executor.
///
/// `rename_threshold` is the similarity percentage (1..=100) above which a
/// delete/add pair is reported as a rename.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VcsBackend: Send + Sync {
    /// Absolute path of the working tree root.
    fn root(&self) -> PathBuf;

    async fn status(&self, rename_threshold: u8) -> Result<Vec<StatusEntry>, BackendError>;

    async fn diff_stat(
        &self,
        scope: DiffScope,
        rename_threshold: u8,
    ) -> Result<Vec<NumStat>, BackendError>;

    /// Stage exactly `paths` (additions, modifications and deletions).
    async fn stage(&self, paths: &[String]) -> Result<(), BackendError>;

    /// Commit `paths` with `message`; returns the new commit id.
    ///
    /// Staged changes outside `paths` are left in the index. An empty
    /// `paths` with `amend` only rewrites the message.
    async fn commit(
        &self,
        message: &str,
        paths: &[String],
        amend: bool,
    ) -> Result<String, BackendError>;
}
