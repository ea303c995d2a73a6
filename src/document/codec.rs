//! Encode/decode the pending document as human-editable markdown.
//!
//! The decoder is the only place text written by a human or an assistant
//! re-enters the engine, so it checks structure strictly and reports the
//! offending line instead of guessing.

use std::collections::HashSet;

use tracing::warn;

use crate::changes::{ChangeRecord, ChangeState, Percent, PendingDocument};
use crate::error::DocumentError;

use super::table::{Align, escape_cell, escape_path, is_separator_cell, render, split_row, unescape};

pub const TITLE: &str = "# Pending Changes";
pub const MESSAGE_HEADING: &str = "## Draft Commit Message";
pub const FILES_HEADING: &str = "## Modified Files";
pub const NO_CHANGES: &str = "No changes detected.";

/// Draft written when no message has been set yet; decodes to `None`.
pub const DRAFT_PLACEHOLDER: &str = "type(scope): concise description of changes

[Optional: detailed explanation for complex changes
- Major changes made
- Rationale for changes
- Impact of changes
]";

const COLUMNS: [&str; 6] = ["File", "Status", "Added", "Removed", "% Changed", "Description"];
const ALIGNS: [Align; 6] = [
    Align::Left,
    Align::Left,
    Align::Right,
    Align::Right,
    Align::Right,
    Align::Left,
];

const LEGEND: &str = "Status is staged/unstaged: A added, M modified, D deleted, R renamed, - none.";
const NOTE: &str = "Only the files listed above are staged on commit. Delete a row to leave a file out.";

const RENAME_ARROW: &str = " -> ";

/// Render `doc` as markdown.
pub fn encode(doc: &PendingDocument) -> String {
    let message = doc.message.as_deref().unwrap_or(DRAFT_PLACEHOLDER);

    let files = if doc.records.is_empty() {
        NO_CHANGES.to_string()
    } else {
        let rows: Vec<Vec<String>> = doc.records.iter().map(record_cells).collect();
        render(&COLUMNS, &ALIGNS, &rows)
    };

    format!(
        "{TITLE}\n\n{MESSAGE_HEADING}\n\n{message}\n\n{FILES_HEADING}\n\n{files}\n\n{LEGEND}\n\n{NOTE}\n"
    )
}

fn record_cells(record: &ChangeRecord) -> Vec<String> {
    let path = match record.prior_path {
        Some(ref prior) => format!("{}{}{}", escape_path(prior), RENAME_ARROW, escape_path(&record.path)),
        None => escape_path(&record.path),
    };

    vec![
        path,
        format!("{}/{}", record.staged.code(), record.unstaged.code()),
        record.lines_added.to_string(),
        record.lines_removed.to_string(),
        record.percent_changed.to_string(),
        escape_cell(record.description.as_deref().unwrap_or("")),
    ]
}

/// Parse a document produced by [`encode`] and possibly edited by hand.
///
/// Edits to the message and description cells are always accepted; anything
/// that breaks the section markers or the table shape is
/// [`DocumentError::Malformed`].
pub fn decode(text: &str) -> Result<PendingDocument, DocumentError> {
    let lines: Vec<&str> = text.lines().collect();

    let message_idx = find_heading(&lines, 0, MESSAGE_HEADING).ok_or_else(|| {
        DocumentError::malformed(0, format!("missing '{}' section", MESSAGE_HEADING))
    })?;
    let files_idx = files_heading(&lines, message_idx + 1).ok_or_else(|| {
        DocumentError::malformed(0, format!("missing '{}' section", FILES_HEADING))
    })?;

    let message = message_from_lines(&lines[message_idx + 1..files_idx]);
    let records = parse_table(&lines, files_idx + 1)?;

    Ok(PendingDocument { message, records })
}

/// Best-effort recovery of the draft message from a document whose table
/// no longer parses.
///
/// The message ends at the files heading. When that heading was edited
/// away, it ends at the last `## ` line instead.
pub fn salvage_message(text: &str) -> Option<String> {
    let lines: Vec<&str> = text.lines().collect();
    let start = find_heading(&lines, 0, MESSAGE_HEADING)? + 1;
    let end = files_heading(&lines, start)
        .or_else(|| {
            (start..lines.len())
                .rev()
                .find(|&i| lines[i].trim_start().starts_with("## "))
        })
        .unwrap_or(lines.len());
    message_from_lines(&lines[start..end])
}

fn find_heading(lines: &[&str], from: usize, heading: &str) -> Option<usize> {
    lines
        .iter()
        .enumerate()
        .skip(from)
        .find(|(_, l)| l.trim() == heading)
        .map(|(i, _)| i)
}

/// The last files heading at or after `from`. The draft message comes
/// first and may itself contain a line that reads like the heading.
fn files_heading(lines: &[&str], from: usize) -> Option<usize> {
    (from..lines.len())
        .rev()
        .find(|&i| lines[i].trim() == FILES_HEADING)
}

fn message_from_lines(lines: &[&str]) -> Option<String> {
    let text = lines.join("\n");
    let text = text.trim();
    if text.is_empty() || text == DRAFT_PLACEHOLDER {
        None
    } else {
        Some(text.to_string())
    }
}

fn parse_table(lines: &[&str], start: usize) -> Result<Vec<ChangeRecord>, DocumentError> {
    let mut idx = start;
    while lines.get(idx).is_some_and(|l| l.trim().is_empty()) {
        idx += 1;
    }

    let Some(first) = lines.get(idx) else {
        return Err(DocumentError::malformed(idx, "missing file table"));
    };
    if first.trim() == NO_CHANGES {
        return Ok(Vec::new());
    }

    let header = split_row(first)
        .ok_or_else(|| DocumentError::malformed(idx + 1, "expected the file table header"))?;
    let header_matches = header.len() == COLUMNS.len()
        && header
            .iter()
            .zip(COLUMNS)
            .all(|(cell, name)| unescape(cell).eq_ignore_ascii_case(name));
    if !header_matches {
        return Err(DocumentError::malformed(
            idx + 1,
            format!("table header must be: {}", COLUMNS.join(" | ")),
        ));
    }
    idx += 1;

    let separator_ok = lines
        .get(idx)
        .and_then(|l| split_row(l))
        .is_some_and(|cells| {
            cells.len() == COLUMNS.len() && cells.iter().all(|c| is_separator_cell(c))
        });
    if !separator_ok {
        return Err(DocumentError::malformed(idx + 1, "expected the table separator row"));
    }
    idx += 1;

    let mut records = Vec::new();
    let mut seen = HashSet::new();

    while let Some(cells) = lines.get(idx).and_then(|l| split_row(l)) {
        let line_no = idx + 1;
        idx += 1;

        let Some(record) = parse_row(&cells, line_no)? else {
            continue;
        };
        if !seen.insert(record.path.clone()) {
            return Err(DocumentError::malformed(
                line_no,
                format!("duplicate path '{}'", record.path),
            ));
        }
        records.push(record);
    }

    Ok(records)
}

fn parse_row(cells: &[String], line_no: usize) -> Result<Option<ChangeRecord>, DocumentError> {
    if cells.len() != COLUMNS.len() {
        return Err(DocumentError::malformed(
            line_no,
            format!("expected {} columns, found {}", COLUMNS.len(), cells.len()),
        ));
    }

    let (prior_path, path) = match cells[0].split_once(RENAME_ARROW) {
        Some((old, new)) => (Some(unescape(old.trim())), unescape(new.trim())),
        None => (None, unescape(&cells[0])),
    };
    if path.is_empty() || prior_path.as_deref().is_some_and(str::is_empty) {
        return Err(DocumentError::malformed(line_no, "empty path"));
    }

    let (staged, unstaged) = parse_status(&cells[1])
        .ok_or_else(|| DocumentError::malformed(line_no, format!("invalid status '{}'", cells[1])))?;

    let lines_added = parse_count(&cells[2], line_no)?;
    let lines_removed = parse_count(&cells[3], line_no)?;
    let percent_changed: Percent = cells[4]
        .parse()
        .map_err(|e: String| DocumentError::malformed(line_no, e))?;

    let mut record = ChangeRecord {
        path,
        prior_path,
        staged,
        unstaged,
        lines_added,
        lines_removed,
        percent_changed,
        description: None,
    };
    record.set_description(&unescape(&cells[5]));

    if !record.is_pending() {
        warn!(
            "Ignoring '{}' on line {}: status '-/-' marks no pending change",
            record.path, line_no
        );
        return Ok(None);
    }

    Ok(Some(record))
}

fn parse_status(cell: &str) -> Option<(ChangeState, ChangeState)> {
    let (staged, unstaged) = cell.split_once('/')?;
    Some((single_state(staged)?, single_state(unstaged)?))
}

fn single_state(code: &str) -> Option<ChangeState> {
    let mut chars = code.trim().chars();
    let c = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    ChangeState::from_code(c)
}

fn parse_count(cell: &str, line_no: usize) -> Result<u64, DocumentError> {
    cell.parse()
        .map_err(|_| DocumentError::malformed(line_no, format!("invalid line count '{}'", cell)))
}
