//! `git` CLI backend.
//!
//! All operations shell out to the system `git` binary, inheriting the
//! user's config, hooks and signing setup. Every invocation runs under a
//! timeout so a stuck hook or lock surfaces as an error instead of a hang.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use git2::{ErrorCode, Repository};
use tempfile::NamedTempFile;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use crate::error::BackendError;

use super::backend::{DiffScope, NumStat, StatusEntry, VcsBackend};
use super::porcelain::{parse_numstat, parse_status};
use super::retry::retry_with_backoff;

/// Default timeout for a single git invocation.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Backend driving the `git` executable for one working tree.
#[derive(Debug, Clone)]
pub struct GitCli {
    root: PathBuf,
    timeout: Duration,
}

impl GitCli {
    /// Locate the repository containing `start`.
    ///
    /// Fails with `NotInstalled` when `git` is not on PATH and with
    /// `NotARepository` when `start` is outside any working tree (bare
    /// repositories have none).
    pub fn discover(start: &Path) -> Result<Self, BackendError> {
        if which::which("git").is_err() {
            return Err(BackendError::NotInstalled);
        }

        let repo = Repository::discover(start).map_err(|e| {
            if e.code() == ErrorCode::NotFound {
                BackendError::NotARepository {
                    path: start.to_path_buf(),
                }
            } else {
                BackendError::Open(e)
            }
        })?;

        let root = repo
            .workdir()
            .ok_or_else(|| BackendError::NotARepository {
                path: start.to_path_buf(),
            })?
            .to_path_buf();

        debug!("Using repository at {}", root.display());
        Ok(Self {
            root,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run `git -C <root> <args>` and return its stdout.
    async fn run_git(&self, args: &[&str], operation: &str) -> Result<String, BackendError> {
        debug!("git {}", args.join(" "));

        let output = timeout(
            self.timeout,
            Command::new("git")
                .arg("-C")
                .arg(&self.root)
                .args(args)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| BackendError::Timeout {
            operation: operation.to_string(),
            seconds: self.timeout.as_secs(),
        })?
        .map_err(BackendError::Spawn)?;

        if !output.status.success() {
            return Err(BackendError::CommandFailed {
                operation: operation.to_string(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Read-only query: retried when it times out.
    async fn query(&self, args: &[&str], operation: &str) -> Result<String, BackendError> {
        retry_with_backoff(|| self.run_git(args, operation), BackendError::is_timeout).await
    }
}

#[async_trait]
impl VcsBackend for GitCli {
    fn root(&self) -> PathBuf {
        self.root.clone()
    }

    async fn status(&self, rename_threshold: u8) -> Result<Vec<StatusEntry>, BackendError> {
        let renames = format!("--find-renames={}%", rename_threshold);
        let output = self
            .query(
                &[
                    "status",
                    "--porcelain=v1",
                    "-z",
                    "--untracked-files=all",
                    renames.as_str(),
                ],
                "status",
            )
            .await?;
        parse_status(&output)
    }

    async fn diff_stat(
        &self,
        scope: DiffScope,
        rename_threshold: u8,
    ) -> Result<Vec<NumStat>, BackendError> {
        let renames = format!("--find-renames={}%", rename_threshold);
        let mut args = vec!["diff"];
        if scope == DiffScope::Staged {
            args.push("--cached");
        }
        args.extend(["--numstat", "-z", renames.as_str()]);

        let output = self.query(&args, "diff --numstat").await?;
        parse_numstat(&output)
    }

    async fn stage(&self, paths: &[String]) -> Result<(), BackendError> {
        let mut args = vec!["add", "-A", "--"];
        args.extend(paths.iter().map(String::as_str));
        self.run_git(&args, "add").await?;
        Ok(())
    }

    async fn commit(
        &self,
        message: &str,
        paths: &[String],
        amend: bool,
    ) -> Result<String, BackendError> {
        let mut message_file = NamedTempFile::new().map_err(BackendError::Spawn)?;
        message_file
            .write_all(message.as_bytes())
            .map_err(BackendError::Spawn)?;
        message_file.flush().map_err(BackendError::Spawn)?;

        let file_arg = message_file.path().to_string_lossy().into_owned();
        let mut args = vec![
            "commit",
            "--cleanup=whitespace",
            "-F",
            file_arg.as_str(),
            "--only",
        ];
        if amend {
            args.push("--amend");
        }
        args.push("--");
        args.extend(paths.iter().map(String::as_str));
        self.run_git(&args, "commit").await?;

        let head = self.run_git(&["rev-parse", "HEAD"], "rev-parse").await?;
        Ok(head.trim().to_string())
    }
}
