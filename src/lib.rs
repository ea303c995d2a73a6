//! gw - A CLI tool that assembles conventional commits from a re-entrant
//! pending-changes document.
//!
//! # Overview
//!
//! gw scans the working tree, writes every modified path into a markdown
//! table at `.gw-state/pending-changes.md` next to a draft commit message,
//! and keeps that file consistent across re-scans so descriptions and the
//! draft survive. Once the message validates against the Conventional
//! Commits grammar, gw stages the listed files and commits them.

pub mod changes;
pub mod commit;
pub mod config;
pub mod document;
pub mod error;
pub mod message;
pub mod vcs;
pub mod workflow;

// Re-export commonly used types
pub use changes::{ChangeRecord, ChangeState, Percent, PendingDocument, RawChange};
pub use commit::CommitResult;
pub use config::Config;
pub use document::PendingStore;
pub use error::{BackendError, CommitError, ConfigError, DocumentError, ScanError, WorkflowError};
pub use message::{CommitMessage, Validator, Violation, ViolationKind};
pub use vcs::{GitCli, Inspector, VcsBackend};
pub use workflow::Workspace;
