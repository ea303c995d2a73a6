//! Change records and the pending document they live in.

use std::fmt;
use std::str::FromStr;

/// State of a path on one side (staged or unstaged) of the working tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChangeState {
    #[default]
    None,
    Added,
    Modified,
    Deleted,
    Renamed,
}

impl ChangeState {
    /// Single-character code used in the document's status column.
    pub fn code(&self) -> char {
        match self {
            ChangeState::None => '-',
            ChangeState::Added => 'A',
            ChangeState::Modified => 'M',
            ChangeState::Deleted => 'D',
            ChangeState::Renamed => 'R',
        }
    }

    pub fn from_code(code: char) -> Option<Self> {
        match code {
            '-' => Some(ChangeState::None),
            'A' => Some(ChangeState::Added),
            'M' => Some(ChangeState::Modified),
            'D' => Some(ChangeState::Deleted),
            'R' => Some(ChangeState::Renamed),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, ChangeState::None)
    }
}

impl fmt::Display for ChangeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeState::None => write!(f, "None"),
            ChangeState::Added => write!(f, "Added"),
            ChangeState::Modified => write!(f, "Modified"),
            ChangeState::Deleted => write!(f, "Deleted"),
            ChangeState::Renamed => write!(f, "Renamed"),
        }
    }
}

/// Share of a file that changed, in tenths of a percent (0..=1000).
///
/// Stored as an integer so the document round-trips exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Percent(u16);

impl Percent {
    pub const FULL: Percent = Percent(1000);

    /// `(added + removed) / max(1, total)`, clamped to 100%, rounded half-up.
    pub fn from_counts(added: u64, removed: u64, total_lines: u64) -> Self {
        let changed = u128::from(added) + u128::from(removed);
        let total = u128::from(total_lines.max(1));
        let tenths = (changed * 1000 + total / 2) / total;
        Percent(tenths.min(1000) as u16)
    }

    pub fn from_tenths(tenths: u16) -> Option<Self> {
        (tenths <= 1000).then_some(Percent(tenths))
    }

    pub fn tenths(&self) -> u16 {
        self.0
    }

    /// The value as a fraction in `[0, 1]`.
    pub fn as_fraction(&self) -> f64 {
        f64::from(self.0) / 1000.0
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}%", self.0 / 10, self.0 % 10)
    }
}

impl FromStr for Percent {
    type Err = String;

    /// Accepts `12.5%`, `12.5` and `12%`; at most one decimal place.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().trim_end_matches('%').trim();
        let (whole, fraction) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, "0"),
        };

        if fraction.len() != 1 {
            return Err(format!("invalid percentage '{}'", s));
        }
        let whole: u16 = whole
            .parse()
            .map_err(|_| format!("invalid percentage '{}'", s))?;
        let tenth: u16 = fraction
            .parse()
            .map_err(|_| format!("invalid percentage '{}'", s))?;

        whole
            .checked_mul(10)
            .and_then(|w| w.checked_add(tenth))
            .and_then(Percent::from_tenths)
            .ok_or_else(|| format!("percentage out of range '{}'", s))
    }
}

/// One modified path as reported by the inspector, before merging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawChange {
    pub path: String,
    /// Old path when the backend detected a rename.
    pub prior_path: Option<String>,
    pub staged: ChangeState,
    pub unstaged: ChangeState,
    pub lines_added: u64,
    pub lines_removed: u64,
    /// Lines in the working-tree file (0 when it no longer exists).
    pub total_lines: u64,
}

/// One row of the pending document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    pub path: String,
    pub prior_path: Option<String>,
    pub staged: ChangeState,
    pub unstaged: ChangeState,
    pub lines_added: u64,
    pub lines_removed: u64,
    pub percent_changed: Percent,
    /// Free text; trimmed and never empty when present.
    pub description: Option<String>,
}

impl ChangeRecord {
    /// A fresh record for a change seen for the first time.
    pub fn from_raw(raw: &RawChange) -> Self {
        Self {
            path: raw.path.clone(),
            prior_path: raw.prior_path.clone(),
            staged: raw.staged,
            unstaged: raw.unstaged,
            lines_added: raw.lines_added,
            lines_removed: raw.lines_removed,
            percent_changed: Percent::from_counts(
                raw.lines_added,
                raw.lines_removed,
                raw.total_lines,
            ),
            description: None,
        }
    }

    /// Whether the record still describes a pending change.
    pub fn is_pending(&self) -> bool {
        !(self.staged.is_none() && self.unstaged.is_none())
    }

    pub fn set_description(&mut self, text: &str) {
        let text = text.trim();
        self.description = (!text.is_empty()).then(|| text.to_string());
    }
}

/// The scratch artifact: a draft message plus the ordered change records.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PendingDocument {
    /// Raw draft text; validated on demand.
    pub message: Option<String>,
    pub records: Vec<ChangeRecord>,
}

impl PendingDocument {
    pub fn find(&self, path: &str) -> Option<&ChangeRecord> {
        self.records.iter().find(|r| r.path == path)
    }

    pub fn find_mut(&mut self, path: &str) -> Option<&mut ChangeRecord> {
        self.records.iter_mut().find(|r| r.path == path)
    }

    /// Replace the draft message; blank text clears it.
    pub fn set_message(&mut self, raw: &str) {
        let raw = raw.trim();
        self.message = (!raw.is_empty()).then(|| raw.to_string());
    }

    pub fn total_added(&self) -> u64 {
        self.records.iter().map(|r| r.lines_added).sum()
    }

    pub fn total_removed(&self) -> u64 {
        self.records.iter().map(|r| r.lines_removed).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_state_codes_round_trip() {
        for state in [
            ChangeState::None,
            ChangeState::Added,
            ChangeState::Modified,
            ChangeState::Deleted,
            ChangeState::Renamed,
        ] {
            assert_eq!(ChangeState::from_code(state.code()), Some(state));
        }
        assert_eq!(ChangeState::from_code('X'), None);
    }

    #[test]
    fn test_percent_from_counts() {
        assert_eq!(Percent::from_counts(1, 0, 8).to_string(), "12.5%");
        assert_eq!(Percent::from_counts(1, 0, 3).to_string(), "33.3%");
        assert_eq!(Percent::from_counts(2, 0, 3).to_string(), "66.7%");
        assert_eq!(Percent::from_counts(0, 0, 10), Percent::default());
    }

    #[test]
    fn test_percent_clamps_and_handles_empty_files() {
        // Deleted file: no lines left, every removed line counts.
        assert_eq!(Percent::from_counts(0, 40, 0), Percent::FULL);
        assert_eq!(Percent::from_counts(30, 30, 10), Percent::FULL);
        assert_eq!(Percent::FULL.as_fraction(), 1.0);
    }

    #[test]
    fn test_percent_parse() {
        assert_eq!("12.5%".parse::<Percent>(), Ok(Percent::from_counts(1, 0, 8)));
        assert_eq!("100%".parse::<Percent>(), Ok(Percent::FULL));
        assert_eq!("0.0".parse::<Percent>().map(|p| p.tenths()), Ok(0));
        assert!("100.1%".parse::<Percent>().is_err());
        assert!("12.55%".parse::<Percent>().is_err());
        assert!("abc".parse::<Percent>().is_err());
    }

    #[test]
    fn test_record_description_is_trimmed() {
        let raw = RawChange {
            path: "a.txt".into(),
            prior_path: None,
            staged: ChangeState::None,
            unstaged: ChangeState::Modified,
            lines_added: 1,
            lines_removed: 1,
            total_lines: 4,
        };
        let mut record = ChangeRecord::from_raw(&raw);
        record.set_description("  tidy up  ");
        assert_eq!(record.description.as_deref(), Some("tidy up"));
        record.set_description("   ");
        assert_eq!(record.description, None);
        assert_eq!(record.percent_changed.to_string(), "50.0%");
    }
}
