//! Turn backend queries into the list of modified paths with line counts.

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use crate::changes::RawChange;
use crate::document::STATE_DIR;
use crate::error::ScanError;

use super::backend::{DiffScope, NumStat, StatusEntry, VcsBackend};

/// Default similarity threshold for rename detection, in percent.
pub const DEFAULT_RENAME_THRESHOLD: u8 = 50;

/// Scans one repository through a [`VcsBackend`].
pub struct Inspector<'a, B: VcsBackend + ?Sized> {
    backend: &'a B,
    rename_threshold: u8,
}

impl<'a, B: VcsBackend + ?Sized> Inspector<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Self {
            backend,
            rename_threshold: DEFAULT_RENAME_THRESHOLD,
        }
    }

    pub fn with_rename_threshold(mut self, threshold: u8) -> Self {
        self.rename_threshold = threshold;
        self
    }

    /// Every modified path in the working tree, sorted by path.
    ///
    /// Staged and unstaged line counts are summed; untracked files count
    /// every line as added. The state directory is never reported. A clean
    /// tree is [`ScanError::NoChanges`].
    pub async fn scan(&self) -> Result<Vec<RawChange>, ScanError> {
        let status = self.backend.status(self.rename_threshold).await?;
        let entries: Vec<StatusEntry> = fold_by_path(status)
            .into_iter()
            .filter(|e| !is_state_path(&e.path))
            .collect();

        if entries.is_empty() {
            return Err(ScanError::NoChanges);
        }

        let mut counts: HashMap<String, (u64, u64)> = HashMap::new();
        let unstaged = self
            .backend
            .diff_stat(DiffScope::Unstaged, self.rename_threshold)
            .await?;
        add_counts(&mut counts, unstaged);

        if entries.iter().any(|e| !e.staged.is_none()) {
            let staged = self
                .backend
                .diff_stat(DiffScope::Staged, self.rename_threshold)
                .await?;
            add_counts(&mut counts, staged);
        }

        let root = self.backend.root();
        let mut changes = Vec::with_capacity(entries.len());

        for entry in entries {
            let total_lines = count_lines(&root.join(&entry.path)).await;
            let (mut lines_added, lines_removed) =
                counts.get(&entry.path).copied().unwrap_or((0, 0));
            if entry.untracked {
                lines_added += total_lines;
            }

            changes.push(RawChange {
                path: entry.path,
                prior_path: entry.prior_path,
                staged: entry.staged,
                unstaged: entry.unstaged,
                lines_added,
                lines_removed,
                total_lines,
            });
        }

        changes.sort_by(|a, b| a.path.cmp(&b.path));
        debug!("Scan found {} modified paths", changes.len());
        Ok(changes)
    }
}

/// Merge status entries that share a path.
///
/// `git rm --cached` reports the path twice: deleted in the index and
/// untracked in the working tree. The result keeps the first entry's
/// position and takes each state from whichever entry sets it.
pub fn fold_by_path(entries: Vec<StatusEntry>) -> Vec<StatusEntry> {
    let mut folded: Vec<StatusEntry> = Vec::with_capacity(entries.len());
    let mut positions: HashMap<String, usize> = HashMap::new();

    for entry in entries {
        let Some(&idx) = positions.get(&entry.path) else {
            positions.insert(entry.path.clone(), folded.len());
            folded.push(entry);
            continue;
        };

        let existing = &mut folded[idx];
        if existing.staged.is_none() {
            existing.staged = entry.staged;
        }
        if existing.unstaged.is_none() {
            existing.unstaged = entry.unstaged;
        }
        if existing.prior_path.is_none() {
            existing.prior_path = entry.prior_path;
        }
        existing.untracked |= entry.untracked;
    }

    folded
}

fn is_state_path(path: &str) -> bool {
    path.strip_prefix(STATE_DIR)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

fn add_counts(counts: &mut HashMap<String, (u64, u64)>, stats: Vec<NumStat>) {
    for stat in stats {
        let entry = counts.entry(stat.path).or_default();
        entry.0 += stat.added;
        entry.1 += stat.removed;
    }
}

/// Lines in a working-tree file; 0 when missing or binary.
async fn count_lines(path: &Path) -> u64 {
    let Ok(bytes) = tokio::fs::read(path).await else {
        return 0;
    };
    if bytes.contains(&0) {
        return 0;
    }
    let newlines = bytes.iter().filter(|&&b| b == b'\n').count() as u64;
    match bytes.last() {
        Some(b'\n') | None => newlines,
        Some(_) => newlines + 1,
    }
}
