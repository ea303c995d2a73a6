//! Conventional commit types, the validated message shape, and violations.

use std::collections::BTreeSet;
use std::fmt;

/// Built-in conventional commit types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitType {
    Feat,
    Fix,
    Docs,
    Style,
    Refactor,
    Perf,
    Test,
    Build,
    Ci,
    Chore,
    Revert,
}

impl CommitType {
    pub const ALL: [CommitType; 11] = [
        CommitType::Feat,
        CommitType::Fix,
        CommitType::Docs,
        CommitType::Style,
        CommitType::Refactor,
        CommitType::Perf,
        CommitType::Test,
        CommitType::Build,
        CommitType::Ci,
        CommitType::Chore,
        CommitType::Revert,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommitType::Feat => "feat",
            CommitType::Fix => "fix",
            CommitType::Docs => "docs",
            CommitType::Style => "style",
            CommitType::Refactor => "refactor",
            CommitType::Perf => "perf",
            CommitType::Test => "test",
            CommitType::Build => "build",
            CommitType::Ci => "ci",
            CommitType::Chore => "chore",
            CommitType::Revert => "revert",
        }
    }
}

impl std::str::FromStr for CommitType {
    type Err = String;

    /// Case-sensitive: `Feat` is not a commit type.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CommitType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("Unknown commit type: {}", s))
    }
}

/// The set of accepted type tokens: the built-ins plus configured extras.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSet {
    types: BTreeSet<String>,
}

impl TypeSet {
    /// Built-in types extended with `extra`.
    pub fn with_extra<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::default();
        set.types.extend(extra.into_iter().map(Into::into));
        set
    }

    pub fn contains(&self, token: &str) -> bool {
        self.types.contains(token)
    }

    /// Sorted, comma-separated list for messages.
    pub fn describe(&self) -> String {
        self.types.iter().cloned().collect::<Vec<_>>().join(", ")
    }
}

impl Default for TypeSet {
    fn default() -> Self {
        Self {
            types: CommitType::ALL
                .iter()
                .map(|t| t.as_str().to_string())
                .collect(),
        }
    }
}

/// Separator between a footer token and its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FooterSeparator {
    /// `Token: value`
    Colon,
    /// `Token #value`
    Hash,
}

/// A git trailer style footer, e.g. `Refs #42` or `BREAKING CHANGE: ...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Footer {
    pub token: String,
    pub separator: FooterSeparator,
    /// May span several lines (continuation lines are kept).
    pub value: String,
}

impl Footer {
    pub fn is_breaking(&self) -> bool {
        self.token == "BREAKING CHANGE" || self.token == "BREAKING-CHANGE"
    }
}

impl fmt::Display for Footer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.separator {
            FooterSeparator::Colon => write!(f, "{}: {}", self.token, self.value),
            FooterSeparator::Hash => write!(f, "{} #{}", self.token, self.value),
        }
    }
}

/// A commit message that parsed into the conventional commit shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitMessage {
    pub commit_type: String,
    pub scope: Option<String>,
    /// True if the header carries `!` or a breaking-change footer exists.
    pub breaking: bool,
    /// Whether the header itself carried the `!` marker.
    pub breaking_marker: bool,
    pub subject: String,
    /// Body paragraphs, in order.
    pub body: Vec<String>,
    pub footers: Vec<Footer>,
}

impl CommitMessage {
    /// The `type(scope)!: subject` line.
    pub fn header(&self) -> String {
        let mut header = self.commit_type.clone();
        if let Some(ref scope) = self.scope {
            header.push('(');
            header.push_str(scope);
            header.push(')');
        }
        if self.breaking_marker {
            header.push('!');
        }
        header.push_str(": ");
        header.push_str(&self.subject);
        header
    }
}

impl fmt::Display for CommitMessage {
    /// Canonical git text: header, body paragraphs, then footers.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.header())?;
        for paragraph in &self.body {
            write!(f, "\n\n{}", paragraph)?;
        }
        if !self.footers.is_empty() {
            writeln!(f)?;
            for footer in &self.footers {
                write!(f, "\n{}", footer)?;
            }
        }
        Ok(())
    }
}

/// 1-based position inside the message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// What is wrong with a message that does not parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    UnknownType(String),
    MissingSubject,
    MalformedScope,
    MissingColon,
    EmptyMessage,
}

/// A grammar violation, reported as data so callers can re-prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub kind: ViolationKind,
    pub location: Location,
}

impl Violation {
    pub fn new(kind: ViolationKind, location: Location) -> Self {
        Self { kind, location }
    }

    /// User-facing guidance for fixing the violation.
    pub fn hint(&self, types: &TypeSet) -> String {
        match self.kind {
            ViolationKind::EmptyMessage => {
                "Write a message of the form: type(scope?): description".to_string()
            }
            ViolationKind::MissingColon => "Commit message must follow the format: \
                 type(scope?): description\n\
                 Examples:\n  \
                 feat: add new feature\n  \
                 fix(auth): resolve login issue\n  \
                 docs: update README"
                .to_string(),
            ViolationKind::UnknownType(_) => {
                format!("Type must be one of: {}", types.describe())
            }
            ViolationKind::MalformedScope => {
                "Scope must be a single word in parentheses, e.g. feat(parser): ...".to_string()
            }
            ViolationKind::MissingSubject => {
                "Description cannot be empty. Add a clear, concise description of the change."
                    .to_string()
            }
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ViolationKind::UnknownType(found) if found.is_empty() => {
                write!(f, "missing commit type at {}", self.location)
            }
            ViolationKind::UnknownType(found) => {
                write!(f, "unknown commit type '{}' at {}", found, self.location)
            }
            ViolationKind::MissingSubject => write!(f, "missing description at {}", self.location),
            ViolationKind::MalformedScope => write!(f, "malformed scope at {}", self.location),
            ViolationKind::MissingColon => {
                write!(f, "expected ':' after type at {}", self.location)
            }
            ViolationKind::EmptyMessage => write!(f, "commit message is empty"),
        }
    }
}

/// Style issues that do not block a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarningKind {
    TrailingPeriod,
    SubjectTooLong { length: usize, max: usize },
    MissingBlankLine,
    /// No whitespace between the colon and the description.
    MissingSpace,
    UnknownType(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub kind: WarningKind,
    pub location: Location,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            WarningKind::TrailingPeriod => {
                write!(f, "description should not end with a period ({})", self.location)
            }
            WarningKind::SubjectTooLong { length, max } => write!(
                f,
                "header is {} characters, longer than {} ({})",
                length, max, self.location
            ),
            WarningKind::MissingBlankLine => {
                write!(f, "body should be separated from the header by a blank line ({})", self.location)
            }
            WarningKind::MissingSpace => {
                write!(f, "description should follow ': ' with a space ({})", self.location)
            }
            WarningKind::UnknownType(found) => {
                write!(f, "'{}' is not a known commit type ({})", found, self.location)
            }
        }
    }
}
