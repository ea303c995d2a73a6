//! Commit execution from the pending document.

pub mod executor;

pub use executor::{CommitPlan, CommitResult, commit, plan};
