//! Stage the listed files, commit exactly those paths and clear the
//! pending document.

use tracing::{debug, info, warn};

use crate::changes::{ChangeRecord, PendingDocument};
use crate::document::PendingStore;
use crate::error::CommitError;
use crate::message::{CommitMessage, Validator};
use crate::vcs::inspector::fold_by_path;
use crate::vcs::{StatusEntry, VcsBackend};

/// Outcome of a successful commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitResult {
    pub commit_id: String,
    pub amended: bool,
    /// Paths passed to the backend's stage operation.
    pub staged: Vec<String>,
    /// Rows left out because the working tree no longer changes them.
    pub skipped: Vec<String>,
    pub message: CommitMessage,
    /// False when the commit succeeded but the document could not be removed.
    pub document_cleared: bool,
}

/// What happens to each row of the document, given the live status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitPlan {
    /// Rows with unstaged work, plus the old path of an unstaged rename.
    pub stage: Vec<String>,
    /// Pathspec for the commit: every live row and the prior path of each
    /// rename. Anything else in the index stays out of the commit.
    pub commit: Vec<String>,
    pub skipped: Vec<String>,
}

/// Match the document's rows against `live` status entries.
///
/// Rows the user deleted are not in `doc` and stay untouched. Rows whose
/// file no longer shows up in the status are skipped.
pub fn plan(doc: &PendingDocument, live: &[StatusEntry]) -> CommitPlan {
    let mut plan = CommitPlan::default();

    for record in &doc.records {
        let Some(entry) = live.iter().find(|e| e.path == record.path) else {
            warn!("Skipping '{}': it no longer has changes", record.path);
            plan.skipped.push(record.path.clone());
            continue;
        };

        let prior = prior_path(record, entry);
        if !entry.unstaged.is_none() || entry.untracked {
            if entry.staged.is_none()
                && let Some(prior) = prior
            {
                push_unique(&mut plan.stage, prior);
            }
            push_unique(&mut plan.stage, &record.path);
        }

        if let Some(prior) = prior {
            push_unique(&mut plan.commit, prior);
        }
        push_unique(&mut plan.commit, &record.path);
    }

    plan
}

fn prior_path<'a>(record: &'a ChangeRecord, entry: &'a StatusEntry) -> Option<&'a str> {
    entry
        .prior_path
        .as_deref()
        .or(record.prior_path.as_deref())
}

fn push_unique(paths: &mut Vec<String>, path: &str) {
    if !paths.iter().any(|p| p == path) {
        paths.push(path.to_string());
    }
}

/// Commit `doc` against `backend`.
///
/// Nothing is touched until the message validates and there is something
/// to commit (an amend may have no records: it only rewrites the message).
/// One status query decides which rows are still live. On any backend
/// failure the stored document is left exactly as it was.
pub async fn commit<B: VcsBackend + ?Sized>(
    backend: &B,
    store: &PendingStore,
    validator: &Validator,
    doc: &PendingDocument,
    amend: bool,
    rename_threshold: u8,
) -> Result<CommitResult, CommitError> {
    let raw = doc.message.as_deref().ok_or(CommitError::MissingMessage)?;
    let message = validator
        .validate(raw)
        .map_err(CommitError::InvalidMessage)?;

    if doc.records.is_empty() && !amend {
        return Err(CommitError::NothingToCommit);
    }

    let live = if doc.records.is_empty() {
        Vec::new()
    } else {
        let entries = backend
            .status(rename_threshold)
            .await
            .map_err(CommitError::StatusFailed)?;
        fold_by_path(entries)
    };

    let plan = plan(doc, &live);
    if plan.commit.is_empty() && !amend {
        return Err(CommitError::NothingToCommit);
    }

    if !plan.stage.is_empty() {
        debug!("Staging {} paths", plan.stage.len());
        backend
            .stage(&plan.stage)
            .await
            .map_err(CommitError::StagingFailed)?;
    }

    let commit_id = backend
        .commit(&message.to_string(), &plan.commit, amend)
        .await
        .map_err(CommitError::CommitFailed)?;
    info!("Created commit {}", commit_id);

    let document_cleared = match store.clear() {
        Ok(()) => true,
        Err(e) => {
            warn!("Commit {} succeeded but the pending document was kept: {}", commit_id, e);
            false
        }
    };

    Ok(CommitResult {
        commit_id,
        amended: amend,
        staged: plan.stage,
        skipped: plan.skipped,
        message,
        document_cleared,
    })
}
