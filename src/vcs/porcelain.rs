//! Parsers for `git status --porcelain=v1 -z` and `git diff --numstat -z`.

use crate::changes::ChangeState;
use crate::error::BackendError;

use super::backend::{NumStat, StatusEntry};

/// Map one porcelain status letter.
fn state_from_letter(letter: char) -> Option<ChangeState> {
    match letter {
        ' ' | '!' => Some(ChangeState::None),
        'M' | 'T' | 'U' => Some(ChangeState::Modified),
        'A' | 'C' => Some(ChangeState::Added),
        'D' => Some(ChangeState::Deleted),
        'R' => Some(ChangeState::Renamed),
        _ => None,
    }
}

fn invalid(operation: &str, reason: impl Into<String>) -> BackendError {
    BackendError::InvalidOutput {
        operation: operation.to_string(),
        reason: reason.into(),
    }
}

/// Parse NUL-separated porcelain v1 status output.
///
/// Renamed and copied entries carry their source path in the following
/// record: `XY new\0old\0`.
pub fn parse_status(output: &str) -> Result<Vec<StatusEntry>, BackendError> {
    let mut fields = output.split('\0').filter(|f| !f.is_empty());
    let mut entries = Vec::new();

    while let Some(field) = fields.next() {
        let mut chars = field.chars();
        let (Some(x), Some(y), Some(' ')) = (chars.next(), chars.next(), chars.next()) else {
            return Err(invalid("status", format!("unexpected entry '{}'", field)));
        };
        let path = chars.as_str().to_string();

        if x == '?' && y == '?' {
            entries.push(StatusEntry {
                path,
                prior_path: None,
                staged: ChangeState::None,
                unstaged: ChangeState::Added,
                untracked: true,
            });
            continue;
        }
        if x == '!' && y == '!' {
            continue;
        }

        let (Some(staged), Some(unstaged)) = (state_from_letter(x), state_from_letter(y)) else {
            return Err(invalid("status", format!("unknown status '{}{}'", x, y)));
        };

        let prior_path = if matches!(x, 'R' | 'C') || matches!(y, 'R' | 'C') {
            let source = fields
                .next()
                .ok_or_else(|| invalid("status", format!("missing source path for '{}'", path)))?;
            // A copy leaves its source in place; only a rename moves it.
            (x == 'R' || y == 'R').then(|| source.to_string())
        } else {
            None
        };

        entries.push(StatusEntry {
            path,
            prior_path,
            staged,
            unstaged,
            untracked: false,
        });
    }

    Ok(entries)
}

fn parse_count(text: &str) -> Result<u64, BackendError> {
    if text == "-" {
        return Ok(0);
    }
    text.parse()
        .map_err(|_| invalid("diff --numstat", format!("invalid line count '{}'", text)))
}

/// Parse NUL-separated numstat output.
///
/// Plain entries are `added\tremoved\tpath\0`; renames leave the path empty
/// and follow with `old\0new\0`. Binary files report `-` counts, read as 0.
pub fn parse_numstat(output: &str) -> Result<Vec<NumStat>, BackendError> {
    let mut fields = output.split('\0');
    let mut stats = Vec::new();

    while let Some(field) = fields.next() {
        let field = field.trim_start_matches('\n');
        if field.is_empty() {
            continue;
        }

        let mut parts = field.splitn(3, '\t');
        let (Some(added), Some(removed), Some(path)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid("diff --numstat", format!("unexpected entry '{}'", field)));
        };
        let added = parse_count(added)?;
        let removed = parse_count(removed)?;

        let (path, prior_path) = if path.is_empty() {
            let (Some(old), Some(new)) = (fields.next(), fields.next()) else {
                return Err(invalid("diff --numstat", "truncated rename entry"));
            };
            (new.to_string(), Some(old.to_string()))
        } else {
            (path.to_string(), None)
        };

        stats.push(NumStat {
            path,
            prior_path,
            added,
            removed,
        });
    }

    Ok(stats)
}
