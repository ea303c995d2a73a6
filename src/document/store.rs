//! On-disk location of the pending document.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::changes::PendingDocument;
use crate::error::DocumentError;

use super::codec::{decode, encode};

/// Directory (relative to the repository root) holding gw's state files.
pub const STATE_DIR: &str = ".gw-state";

/// File name of the pending document inside [`STATE_DIR`].
pub const DOCUMENT_FILE: &str = "pending-changes.md";

/// Reads and writes the pending document for one repository.
#[derive(Debug, Clone)]
pub struct PendingStore {
    path: PathBuf,
}

impl PendingStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The default location inside `root`.
    pub fn for_repo(root: &Path) -> Self {
        Self::new(root.join(STATE_DIR).join(DOCUMENT_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Raw file contents, or `None` when the file does not exist.
    pub fn read_raw(&self) -> Result<Option<String>, DocumentError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(DocumentError::Read(e)),
        }
    }

    /// Decode the stored document, or `None` when there is none yet.
    pub fn load(&self) -> Result<Option<PendingDocument>, DocumentError> {
        self.read_raw()?.as_deref().map(decode).transpose()
    }

    /// Encode and write `doc`. Returns whether the file changed.
    pub fn save(&self, doc: &PendingDocument) -> Result<bool, DocumentError> {
        self.write_atomic(&encode(doc))
    }

    /// Replace the file contents in one rename so readers never see a
    /// partial document. Identical contents are left untouched.
    pub fn write_atomic(&self, contents: &str) -> Result<bool, DocumentError> {
        if self.read_raw()?.as_deref() == Some(contents) {
            debug!("{} unchanged, skipping write", self.path.display());
            return Ok(false);
        }

        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent).map_err(DocumentError::Write)?;

        let mut file = NamedTempFile::new_in(&parent).map_err(DocumentError::Write)?;
        file.write_all(contents.as_bytes())
            .map_err(DocumentError::Write)?;
        file.as_file().sync_all().map_err(DocumentError::Write)?;
        file.persist(&self.path)
            .map_err(|e| DocumentError::Write(e.error))?;

        debug!("Wrote {}", self.path.display());
        Ok(true)
    }

    /// Copy the current file to `pending-changes.md.bak`.
    pub fn backup(&self) -> Result<PathBuf, DocumentError> {
        let backup_path = self.path.with_extension("md.bak");
        std::fs::copy(&self.path, &backup_path).map_err(DocumentError::Backup)?;
        Ok(backup_path)
    }

    /// Remove the document. A missing file is not an error.
    pub fn clear(&self) -> Result<(), DocumentError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DocumentError::Remove(e)),
        }
    }
}
