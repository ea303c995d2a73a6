//! The pending-changes document: markdown codec and on-disk store.

pub mod codec;
pub mod store;
pub mod table;

pub use codec::{DRAFT_PLACEHOLDER, decode, encode, salvage_message};
pub use store::{DOCUMENT_FILE, PendingStore, STATE_DIR};
