//! Commit message validation against the Conventional Commits grammar.

pub mod parser;
pub mod types;

pub use parser::{Analysis, DEFAULT_MAX_HEADER_LENGTH, Severity, Validator, validate};
pub use types::{
    CommitMessage, CommitType, Footer, FooterSeparator, Location, TypeSet, Violation,
    ViolationKind, Warning, WarningKind,
};
