//! Merge a fresh scan into the previous document without losing user edits.

use std::collections::HashSet;

use tracing::debug;

use super::model::{ChangeRecord, PendingDocument, RawChange};

/// Build the document for `raw`, carrying state over from `previous`.
///
/// - A previous record is matched by identical path first, then by the raw
///   change's prior path (the file was renamed since the last scan).
/// - Matched records keep their position and description; counts and states
///   are refreshed.
/// - Previous records with no match are dropped; unmatched changes are
///   appended in scan order.
/// - The draft message is carried over unchanged.
/// - A path that appears twice in `raw` keeps only its first change.
pub fn build(raw: &[RawChange], previous: Option<&PendingDocument>) -> PendingDocument {
    let mut seen = HashSet::new();
    let raw: Vec<&RawChange> = raw
        .iter()
        .filter(|r| !(r.staged.is_none() && r.unstaged.is_none()))
        .filter(|r| {
            let first = seen.insert(r.path.as_str());
            if !first {
                debug!("Ignoring repeated change for '{}'", r.path);
            }
            first
        })
        .collect();

    let Some(previous) = previous else {
        return PendingDocument {
            message: None,
            records: raw.iter().map(|r| ChangeRecord::from_raw(r)).collect(),
        };
    };

    // claimed_by[i] = index of the previous record that claimed raw[i]
    let mut claimed_by: Vec<Option<usize>> = vec![None; raw.len()];
    let mut claims: Vec<Option<usize>> = vec![None; previous.records.len()];

    for (prev_idx, record) in previous.records.iter().enumerate() {
        if let Some(raw_idx) = raw
            .iter()
            .enumerate()
            .position(|(i, r)| claimed_by[i].is_none() && r.path == record.path)
        {
            claimed_by[raw_idx] = Some(prev_idx);
            claims[prev_idx] = Some(raw_idx);
        }
    }

    for (prev_idx, record) in previous.records.iter().enumerate() {
        if claims[prev_idx].is_some() {
            continue;
        }
        if let Some(raw_idx) = raw.iter().enumerate().position(|(i, r)| {
            claimed_by[i].is_none() && r.prior_path.as_deref() == Some(record.path.as_str())
        }) {
            debug!(
                "Carrying '{}' over to renamed path '{}'",
                record.path, raw[raw_idx].path
            );
            claimed_by[raw_idx] = Some(prev_idx);
            claims[prev_idx] = Some(raw_idx);
        }
    }

    let mut records = Vec::with_capacity(raw.len());

    for (prev_idx, record) in previous.records.iter().enumerate() {
        match claims[prev_idx] {
            Some(raw_idx) => {
                let mut updated = ChangeRecord::from_raw(raw[raw_idx]);
                updated.description = record.description.clone();
                records.push(updated);
            }
            None => debug!("Dropping '{}': no longer modified", record.path),
        }
    }

    for (raw_idx, change) in raw.iter().enumerate() {
        if claimed_by[raw_idx].is_none() {
            records.push(ChangeRecord::from_raw(change));
        }
    }

    PendingDocument {
        message: previous.message.clone(),
        records,
    }
}
