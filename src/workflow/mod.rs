//! The four user-facing operations over one repository.
//!
//! Each operation is a whole-file read / merge / atomic write of the pending
//! document, so re-running any of them after an interruption or a manual edit
//! converges on the same state.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::changes::{PendingDocument, build};
use crate::commit::{CommitResult, commit};
use crate::config::Config;
use crate::document::{PendingStore, decode, encode, salvage_message};
use crate::error::{DocumentError, ScanError, WorkflowError};
use crate::message::{Analysis, Validator, Violation};
use crate::vcs::{GitCli, Inspector, VcsBackend};

/// Result of [`Workspace::refresh`].
#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    pub document: PendingDocument,
    /// Whether the file on disk changed.
    pub written: bool,
    /// True when the working tree had no changes.
    pub clean: bool,
    /// Backup of an unreadable document that was re-derived from a scan.
    /// Descriptions from it may need re-entry.
    pub recovered_from: Option<PathBuf>,
}

/// Result of [`Workspace::set_message`].
#[derive(Debug, Clone)]
pub struct MessageOutcome {
    pub refresh: RefreshOutcome,
    /// `Err` only when the message was stored with `force`.
    pub validation: Result<Analysis, Vec<Violation>>,
}

/// Result of [`Workspace::review`].
#[derive(Debug, Clone)]
pub struct Review {
    pub refresh: RefreshOutcome,
    /// The document as written to disk.
    pub text: String,
    /// `None` while no message has been drafted.
    pub validation: Option<Result<Analysis, Vec<Violation>>>,
}

/// One repository with its backend, config and pending document.
pub struct Workspace<B> {
    backend: B,
    store: PendingStore,
    config: Config,
}

impl Workspace<GitCli> {
    /// Open the repository containing `start` with its on-disk config.
    pub fn open(start: &Path) -> Result<Self, WorkflowError> {
        let git = GitCli::discover(start)?;
        let config = Config::load(&git.root())?;
        let git = git.with_timeout(config.git_timeout());
        Ok(Self::new(git, config))
    }
}

impl<B: VcsBackend> Workspace<B> {
    pub fn new(backend: B, config: Config) -> Self {
        let store = PendingStore::for_repo(&backend.root());
        Self {
            backend,
            store,
            config,
        }
    }

    pub fn store(&self) -> &PendingStore {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn validator(&self) -> Validator {
        self.config.validator()
    }

    /// Scan the working tree and merge it into the stored document.
    ///
    /// `message`, when given, replaces the draft. An unreadable document is
    /// backed up and rebuilt from the scan, keeping whatever message can be
    /// salvaged from it.
    pub async fn refresh(&self, message: Option<&str>) -> Result<RefreshOutcome, WorkflowError> {
        let mut recovered_from = None;

        let previous = match self.store.read_raw()? {
            None => None,
            Some(text) => match decode(&text) {
                Ok(doc) => Some(doc),
                Err(DocumentError::Malformed { line, reason }) => {
                    let backup = self.store.backup()?;
                    warn!(
                        "Pending document is malformed at line {} ({}); rebuilding it from a fresh scan. \
                         The previous version was saved to {}, descriptions may need re-entry.",
                        line,
                        reason,
                        backup.display()
                    );
                    recovered_from = Some(backup);
                    Some(PendingDocument {
                        message: salvage_message(&text),
                        records: Vec::new(),
                    })
                }
                Err(e) => return Err(e.into()),
            },
        };

        let inspector =
            Inspector::new(&self.backend).with_rename_threshold(self.config.rename_threshold);
        let (raw, clean) = match inspector.scan().await {
            Ok(raw) => (raw, false),
            Err(ScanError::NoChanges) => {
                info!("No changes detected");
                (Vec::new(), true)
            }
            Err(ScanError::Backend(e)) => return Err(e.into()),
        };

        let mut document = build(&raw, previous.as_ref());
        if let Some(message) = message {
            document.set_message(message);
        }

        let written = self.store.save(&document)?;

        Ok(RefreshOutcome {
            document,
            written,
            clean,
            recovered_from,
        })
    }

    /// Validate `raw` and store it as the draft message.
    ///
    /// An invalid message is rejected unless `force` is set.
    pub async fn set_message(&self, raw: &str, force: bool) -> Result<MessageOutcome, WorkflowError> {
        let validation = self.validator().analyze(raw);
        if let Err(ref violations) = validation {
            if !force {
                return Err(WorkflowError::InvalidMessage(violations.clone()));
            }
            warn!("Storing a message that is not a valid conventional commit");
        }

        let refresh = self.refresh(Some(raw)).await?;
        Ok(MessageOutcome {
            refresh,
            validation,
        })
    }

    /// Refresh the document and report it together with the message check.
    pub async fn review(&self) -> Result<Review, WorkflowError> {
        let refresh = self.refresh(None).await?;
        let text = encode(&refresh.document);
        let validator = self.validator();
        let validation = refresh
            .document
            .message
            .as_deref()
            .map(|m| validator.analyze(m));

        Ok(Review {
            refresh,
            text,
            validation,
        })
    }

    /// The stored document, generated from a scan if there is none yet.
    ///
    /// Unlike [`Workspace::refresh`], a malformed document is an error here:
    /// committing must not guess which files the user meant.
    pub async fn pending(&self) -> Result<PendingDocument, WorkflowError> {
        match self.store.load()? {
            Some(doc) => Ok(doc),
            None => Ok(self.refresh(None).await?.document),
        }
    }

    /// Commit the pending document.
    ///
    /// An explicit `message` overrides the draft for this commit only.
    pub async fn commit(
        &self,
        message: Option<&str>,
        amend: bool,
    ) -> Result<CommitResult, WorkflowError> {
        let mut document = self.pending().await?;
        if let Some(message) = message {
            document.set_message(message);
        }

        let validator = self.validator();
        Ok(commit(
            &self.backend,
            &self.store,
            &validator,
            &document,
            amend,
            self.config.rename_threshold,
        )
        .await?)
    }
}
