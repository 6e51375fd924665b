//! Persisted and response-facing entry shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::crypto::PasswordVerifier;
use crate::entry::{Category, EntryMetadata, SealedEntry};
use crate::field::CipherScheme;

/// An entry as stored: sealed body, clear metadata, and (for entries written
/// through the password path) the verifier.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryRecord {
    /// Unique identifier for this entry
    pub id: Uuid,

    /// Owner of this entry. Every lookup is scoped by it.
    pub owner_id: Uuid,

    /// Encrypted fields plus clear metadata
    pub body: SealedEntry,

    /// Verifier of the legacy encryption password, if any
    pub password_hash: Option<PasswordVerifier>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EntryRecord {
    pub fn new(owner_id: Uuid, body: SealedEntry) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            body,
            password_hash: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_password_hash(mut self, verifier: PasswordVerifier) -> Self {
        self.password_hash = Some(verifier);
        self
    }

    /// Scheme of the title field. Every other field of a well-formed entry
    /// uses the same one.
    pub fn scheme(&self) -> CipherScheme {
        self.body.title.scheme()
    }

    pub fn summary(&self) -> EntrySummary {
        EntrySummary {
            id: self.id,
            metadata: self.body.metadata.clone(),
            scheme: self.scheme(),
            encrypted: true,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// The record without its verifier, safe to hand back to a caller.
    pub fn into_document(self) -> EntryDocument {
        EntryDocument {
            id: self.id,
            body: self.body,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Clear metadata returned after a write. Contains no ciphertext and never the
/// verifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntrySummary {
    pub id: Uuid,
    pub metadata: EntryMetadata,
    pub scheme: CipherScheme,
    pub encrypted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A sealed entry as returned to its owner for client-side decryption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryDocument {
    pub id: Uuid,
    pub body: SealedEntry,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Filter for listing entries, over clear metadata only.
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    pub category: Option<Category>,
    pub favorites_only: bool,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

impl EntryFilter {
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// A stored row whose sealed body could not be parsed.
///
/// Only the clear columns survive: entry date, category and the favorite
/// flag. Mood and weather live inside the body and are lost with it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnreadableEntry {
    pub id: Uuid,
    pub metadata: EntryMetadata,
    pub reason: String,
}

/// One row of a listing. A damaged row is carried alongside its readable
/// siblings instead of failing the whole listing.
#[derive(Debug, Clone, PartialEq)]
pub enum Listed<T> {
    Readable(T),
    Unreadable(UnreadableEntry),
}

impl<T> Listed<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Listed<U> {
        match self {
            Listed::Readable(item) => Listed::Readable(f(item)),
            Listed::Unreadable(entry) => Listed::Unreadable(entry),
        }
    }

    pub fn readable(&self) -> Option<&T> {
        match self {
            Listed::Readable(item) => Some(item),
            Listed::Unreadable(_) => None,
        }
    }
}

impl Listed<EntryRecord> {
    pub fn id(&self) -> Uuid {
        match self {
            Listed::Readable(record) => record.id,
            Listed::Unreadable(entry) => entry.id,
        }
    }
}

impl Listed<EntryDocument> {
    pub fn id(&self) -> Uuid {
        match self {
            Listed::Readable(doc) => doc.id,
            Listed::Unreadable(entry) => entry.id,
        }
    }
}
