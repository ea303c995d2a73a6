//! Error types for gw modules using thiserror.

use std::path::PathBuf;

use thiserror::Error;

use crate::message::Violation;

/// Errors from the version-control backend.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("git executable not found in PATH")]
    NotInstalled,

    #[error("Not a git repository (or a bare repository): {}", path.display())]
    NotARepository { path: PathBuf },

    #[error("Failed to open repository: {0}")]
    Open(#[source] git2::Error),

    #[error("Failed to spawn git: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("git {operation} exited with code {}: {stderr}",
             code.map_or("unknown".to_string(), |c| c.to_string()))]
    CommandFailed {
        operation: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("git {operation} timed out after {seconds} seconds")]
    Timeout { operation: String, seconds: u64 },

    #[error("Unexpected output from git {operation}: {reason}")]
    InvalidOutput { operation: String, reason: String },
}

impl BackendError {
    /// Whether the failure was a timeout, which is safe to retry.
    pub fn is_timeout(&self) -> bool {
        matches!(self, BackendError::Timeout { .. })
    }
}

/// Errors from scanning the working tree.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("No changes detected (working tree is clean)")]
    NoChanges,

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Errors from reading or writing the pending document.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Pending document is malformed at line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    #[error("Failed to read pending document: {0}")]
    Read(#[source] std::io::Error),

    #[error("Failed to write pending document: {0}")]
    Write(#[source] std::io::Error),

    #[error("Failed to back up pending document: {0}")]
    Backup(#[source] std::io::Error),

    #[error("Failed to remove pending document: {0}")]
    Remove(#[source] std::io::Error),
}

impl DocumentError {
    pub(crate) fn malformed(line: usize, reason: impl Into<String>) -> Self {
        DocumentError::Malformed {
            line,
            reason: reason.into(),
        }
    }
}

/// Errors from executing a commit.
#[derive(Error, Debug)]
pub enum CommitError {
    #[error("No commit message set. Run `gw message <MESSAGE>` or edit the pending document")]
    MissingMessage,

    #[error("Commit message is not valid: {}", describe_violations(.0))]
    InvalidMessage(Vec<Violation>),

    #[error("No changes to commit (use --amend to only rewrite the message)")]
    NothingToCommit,

    #[error("Failed to check the working tree: {0}")]
    StatusFailed(#[source] BackendError),

    #[error("Failed to stage changes: {0}")]
    StagingFailed(#[source] BackendError),

    #[error("Failed to create commit: {0}")]
    CommitFailed(#[source] BackendError),
}

/// Errors from loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("rename_threshold must be between 1 and 100, got {0}")]
    InvalidRenameThreshold(u8),
}

/// Errors from the high-level workflow operations.
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Commit(#[from] CommitError),

    #[error("Commit message is not valid: {}", describe_violations(.0))]
    InvalidMessage(Vec<Violation>),
}

fn describe_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
