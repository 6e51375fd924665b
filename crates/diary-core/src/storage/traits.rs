//! Storage trait definition.
//!
//! The store only ever sees sealed entries. It never holds a key or a
//! password, and it treats every `EncryptedField` as an opaque value.

use uuid::Uuid;

use super::types::{EntryFilter, EntryRecord, Listed};
use crate::error::Result;

/// Owner-keyed document store for sealed diary entries.
///
/// All lookups are scoped by owner: an id that exists under another owner is
/// indistinguishable from a missing one.
pub trait EntryStore: Send + Sync {
    /// Insert a new record.
    ///
    /// # Errors
    ///
    /// Returns `DiaryError::Storage` if a record with the same id exists.
    fn insert(&self, record: &EntryRecord) -> Result<()>;

    /// Replace a record wholesale (body, verifier, `updated_at`).
    ///
    /// Returns `false` if no record with this id belongs to the owner.
    fn replace(&self, record: &EntryRecord) -> Result<bool>;

    /// Get a record by id.
    ///
    /// Returns `Ok(None)` if not found for this owner.
    fn get(&self, owner_id: &Uuid, id: &Uuid) -> Result<Option<EntryRecord>>;

    /// List the owner's records, newest entry date first.
    ///
    /// A row whose sealed body cannot be parsed is returned as
    /// `Listed::Unreadable` and does not fail the listing.
    fn list(&self, owner_id: &Uuid, filter: &EntryFilter) -> Result<Vec<Listed<EntryRecord>>>;

    /// Delete a record with all its fields.
    ///
    /// Returns `false` if nothing was deleted.
    fn delete(&self, owner_id: &Uuid, id: &Uuid) -> Result<bool>;
}
