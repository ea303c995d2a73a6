//! Conventional commit grammar: a small recursive-descent header parser plus
//! paragraph/footer splitting for the rest of the message.

use std::sync::LazyLock;

use regex_lite::Regex;
use serde::Deserialize;

use super::types::{
    CommitMessage, Footer, FooterSeparator, Location, TypeSet, Violation, ViolationKind, Warning,
    WarningKind,
};

/// Header length above which a warning is issued.
pub const DEFAULT_MAX_HEADER_LENGTH: usize = 72;

static FOOTER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(BREAKING CHANGE|[A-Za-z0-9-]+)(: | #)(.*)$").expect("footer pattern is valid")
});

/// How an unknown type token is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Error,
    Warning,
}

/// A successfully parsed message together with its style warnings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    pub message: CommitMessage,
    pub warnings: Vec<Warning>,
}

/// Validates commit messages against the conventional commit grammar.
#[derive(Debug, Clone)]
pub struct Validator {
    types: TypeSet,
    unknown_type: Severity,
    max_header_length: usize,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(TypeSet::default(), Severity::Error)
    }
}

impl Validator {
    pub fn new(types: TypeSet, unknown_type: Severity) -> Self {
        Self {
            types,
            unknown_type,
            max_header_length: DEFAULT_MAX_HEADER_LENGTH,
        }
    }

    pub fn with_max_header_length(mut self, max: usize) -> Self {
        self.max_header_length = max;
        self
    }

    pub fn types(&self) -> &TypeSet {
        &self.types
    }

    /// Parse `raw` into a [`CommitMessage`] or report every violation found.
    pub fn validate(&self, raw: &str) -> Result<CommitMessage, Vec<Violation>> {
        self.analyze(raw).map(|analysis| analysis.message)
    }

    /// Like [`Validator::validate`], also collecting non-fatal warnings.
    pub fn analyze(&self, raw: &str) -> Result<Analysis, Vec<Violation>> {
        let text = raw.trim();
        if text.is_empty() {
            return Err(vec![Violation::new(
                ViolationKind::EmptyMessage,
                Location::new(1, 1),
            )]);
        }

        let lines: Vec<&str> = text.lines().map(str::trim_end).collect();
        let header = parse_header(lines[0])?;

        let mut violations = header.violations;
        let mut warnings = Vec::new();

        if header.commit_type.is_empty() {
            violations.push(Violation::new(
                ViolationKind::UnknownType(String::new()),
                Location::new(1, 1),
            ));
        } else if !self.types.contains(&header.commit_type) {
            match self.unknown_type {
                Severity::Error => violations.push(Violation::new(
                    ViolationKind::UnknownType(header.commit_type.clone()),
                    Location::new(1, 1),
                )),
                Severity::Warning => warnings.push(Warning {
                    kind: WarningKind::UnknownType(header.commit_type.clone()),
                    location: Location::new(1, 1),
                }),
            }
        }

        if header.subject.is_empty() {
            violations.push(Violation::new(
                ViolationKind::MissingSubject,
                Location::new(1, header.subject_column),
            ));
        }

        if !violations.is_empty() {
            violations.sort_by_key(|v| v.location.column);
            return Err(violations);
        }

        if !header.spaced {
            warnings.push(Warning {
                kind: WarningKind::MissingSpace,
                location: Location::new(1, header.subject_column),
            });
        }

        let rest = &lines[1..];
        if rest.first().is_some_and(|line| !line.trim().is_empty()) {
            warnings.push(Warning {
                kind: WarningKind::MissingBlankLine,
                location: Location::new(2, 1),
            });
        }

        let (body, footers) = split_body_and_footers(rest);
        let breaking = header.breaking_marker || footers.iter().any(Footer::is_breaking);

        let message = CommitMessage {
            commit_type: header.commit_type,
            scope: header.scope,
            breaking,
            breaking_marker: header.breaking_marker,
            subject: header.subject,
            body,
            footers,
        };

        let header_length = lines[0].chars().count();
        if message.subject.ends_with('.') {
            warnings.push(Warning {
                kind: WarningKind::TrailingPeriod,
                location: Location::new(1, header_length),
            });
        }
        if header_length > self.max_header_length {
            warnings.push(Warning {
                kind: WarningKind::SubjectTooLong {
                    length: header_length,
                    max: self.max_header_length,
                },
                location: Location::new(1, self.max_header_length + 1),
            });
        }

        Ok(Analysis { message, warnings })
    }
}

/// Validate with the default type set and strict unknown-type policy.
pub fn validate(raw: &str) -> Result<CommitMessage, Vec<Violation>> {
    Validator::default().validate(raw)
}

struct Header {
    commit_type: String,
    scope: Option<String>,
    breaking_marker: bool,
    subject: String,
    subject_column: usize,
    /// Whether whitespace follows the colon.
    spaced: bool,
    violations: Vec<Violation>,
}

struct Cursor {
    chars: Vec<char>,
    pos: usize,
}

impl Cursor {
    fn new(line: &str) -> Self {
        Self {
            chars: line.chars().collect(),
            pos: 0,
        }
    }

    /// 1-based column of the next unread character.
    fn column(&self) -> usize {
        self.pos + 1
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.chars.get(self.pos) == Some(&expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let start = self.pos;
        while self.chars.get(self.pos).is_some_and(|&c| pred(c)) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn rest(&self) -> String {
        self.chars[self.pos..].iter().collect()
    }
}

/// `type(scope)!: subject`. A missing colon or an unterminated scope means
/// the line has no conventional structure at all and is reported alone.
fn parse_header(line: &str) -> Result<Header, Vec<Violation>> {
    let mut cursor = Cursor::new(line);
    let mut violations = Vec::new();

    let commit_type = cursor.take_while(|c| c.is_ascii_alphanumeric());

    let mut scope = None;
    let scope_column = cursor.column();
    if cursor.eat('(') {
        let text = cursor.take_while(|c| c != ')');
        if !cursor.eat(')') {
            return Err(vec![Violation::new(
                ViolationKind::MalformedScope,
                Location::new(1, scope_column),
            )]);
        }
        if text.is_empty() || text.chars().any(|c| c.is_whitespace() || c == '(') {
            violations.push(Violation::new(
                ViolationKind::MalformedScope,
                Location::new(1, scope_column),
            ));
        } else {
            scope = Some(text);
        }
    }

    let breaking_marker = cursor.eat('!');

    if !cursor.eat(':') {
        violations.push(Violation::new(
            ViolationKind::MissingColon,
            Location::new(1, cursor.column()),
        ));
        return Err(violations);
    }

    let subject_column = cursor.column();
    let rest = cursor.rest();
    let spaced = rest.starts_with(char::is_whitespace);
    let subject = rest.trim().to_string();

    Ok(Header {
        commit_type,
        scope,
        breaking_marker,
        subject,
        subject_column,
        spaced,
        violations,
    })
}

/// Split the lines after the header into body paragraphs and footers.
///
/// The last paragraph is the footer block when its first line is a footer.
fn split_body_and_footers(lines: &[&str]) -> (Vec<String>, Vec<Footer>) {
    let mut paragraphs: Vec<Vec<&str>> = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in lines {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        paragraphs.push(current);
    }

    let mut footers = Vec::new();
    if paragraphs
        .last()
        .is_some_and(|p| FOOTER_PATTERN.is_match(p[0]))
        && let Some(block) = paragraphs.pop()
    {
        footers = parse_footers(&block);
    }

    let body = paragraphs.into_iter().map(|p| p.join("\n")).collect();
    (body, footers)
}

fn parse_footers(block: &[&str]) -> Vec<Footer> {
    let mut footers: Vec<Footer> = Vec::new();

    for line in block {
        if let Some(caps) = FOOTER_PATTERN.captures(line) {
            let separator = if &caps[2] == " #" {
                FooterSeparator::Hash
            } else {
                FooterSeparator::Colon
            };
            footers.push(Footer {
                token: caps[1].to_string(),
                separator,
                value: caps[3].to_string(),
            });
        } else if let Some(last) = footers.last_mut() {
            last.value.push('\n');
            last.value.push_str(line);
        }
    }

    footers
}
