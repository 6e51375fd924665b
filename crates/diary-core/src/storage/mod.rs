//! Storage layer for sealed diary entries.
//!
//! The store is a collaborator of the confidentiality core: it persists
//! ciphertext and clear metadata and never sees keys or passwords.

pub mod row;
pub mod sqlite;
pub mod traits;
pub mod types;

pub use sqlite::SqliteEntryStore;
pub use traits::EntryStore;
pub use types::{EntryDocument, EntryFilter, EntryRecord, EntrySummary, Listed, UnreadableEntry};
