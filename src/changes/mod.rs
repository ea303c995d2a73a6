//! Change records and the merge step that keeps re-scans non-destructive.

pub mod builder;
pub mod model;

pub use builder::build;
pub use model::{ChangeRecord, ChangeState, Percent, PendingDocument, RawChange};
