//! Working-tree inspection and the repository backend.

pub mod backend;
pub mod git;
pub mod inspector;
pub mod porcelain;
pub mod retry;

pub use backend::{DiffScope, NumStat, StatusEntry, VcsBackend};
pub use git::GitCli;
pub use inspector::{DEFAULT_RENAME_THRESHOLD, Inspector};
