//! Request boundary for diary entries.
//!
//! Two write paths exist:
//!
//! - **sealed** (system of record): the client seals fields with its own key
//!   and the service stores the submitted ciphertext verbatim. The service
//!   never sees plaintext or the key.
//! - **protected** (legacy): the caller supplies an encryption password per
//!   request; the service seals with PBKDF2 + AES-CBC on the derivation pool
//!   and stores a SHA-256 verifier so later reads can reject a wrong password
//!   before spending any derivations.

pub mod pool;

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::crypto::{compute_verifier, ensure_verified, validate_password};
use crate::entry::{open_entry, seal_entry, DiaryEntry, SealedEntry};
use crate::error::{DiaryError, Result};
use crate::field::{CipherScheme, LegacyPassword};
use crate::storage::{EntryDocument, EntryFilter, EntryRecord, EntryStore, EntrySummary, Listed};

pub use pool::DerivationPool;

pub struct DiaryService<S: EntryStore> {
    store: Arc<S>,
    pool: DerivationPool,
}

impl<S: EntryStore> Clone for DiaryService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            pool: self.pool.clone(),
        }
    }
}

impl<S: EntryStore> DiaryService<S> {
    pub fn new(store: S, pool: DerivationPool) -> Self {
        Self {
            store: Arc::new(store),
            pool,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn pool(&self) -> &DerivationPool {
        &self.pool
    }

    fn not_found(id: &Uuid) -> DiaryError {
        DiaryError::NotFound(format!("Diary entry {}", id))
    }

    fn require(&self, owner_id: &Uuid, id: &Uuid) -> Result<EntryRecord> {
        self.store.get(owner_id, id)?.ok_or_else(|| Self::not_found(id))
    }

    /// Client-sealed submissions must be GCM throughout; a packed string here
    /// would be stored without its verifier.
    fn ensure_client_sealed(body: &SealedEntry) -> Result<()> {
        if let Some(field) = body
            .fields()
            .into_iter()
            .find(|f| f.scheme() != CipherScheme::Gcm)
        {
            return Err(DiaryError::Validation(format!(
                "client-sealed entries must use {}, found {}",
                CipherScheme::Gcm,
                field.scheme()
            )));
        }
        Ok(())
    }

    // --- Client-key (sealed) path ---

    /// Store a client-sealed entry verbatim.
    pub fn add_sealed(&self, owner_id: Uuid, body: SealedEntry) -> Result<EntrySummary> {
        Self::ensure_client_sealed(&body)?;
        let record = EntryRecord::new(owner_id, body);
        self.store.insert(&record)?;
        tracing::debug!(entry_id = %record.id, "stored client-sealed entry");
        Ok(record.summary())
    }

    /// Replace every encrypted field of an entry. No partial re-encryption.
    pub fn update_sealed(&self, owner_id: Uuid, id: Uuid, body: SealedEntry) -> Result<EntrySummary> {
        Self::ensure_client_sealed(&body)?;
        let existing = self.require(&owner_id, &id)?;
        let record = EntryRecord {
            body,
            password_hash: None,
            updated_at: Utc::now(),
            ..existing
        };
        if !self.store.replace(&record)? {
            return Err(Self::not_found(&id));
        }
        tracing::debug!(entry_id = %id, "replaced client-sealed entry");
        Ok(record.summary())
    }

    pub fn get_sealed(&self, owner_id: Uuid, id: Uuid) -> Result<EntryDocument> {
        Ok(self.require(&owner_id, &id)?.into_document())
    }

    /// List the owner's entries. Rows with an unparseable body come back as
    /// `Listed::Unreadable` next to their readable siblings.
    pub fn list_sealed(
        &self,
        owner_id: Uuid,
        filter: &EntryFilter,
    ) -> Result<Vec<Listed<EntryDocument>>> {
        Ok(self
            .store
            .list(&owner_id, filter)?
            .into_iter()
            .map(|listed| listed.map(EntryRecord::into_document))
            .collect())
    }

    /// Delete an entry and all its encrypted fields.
    pub fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<()> {
        if !self.store.delete(&owner_id, &id)? {
            return Err(Self::not_found(&id));
        }
        Ok(())
    }

    // --- Server-password (protected) path ---

    /// Seal an entry with a per-request password and store it with the
    /// password's verifier.
    ///
    /// The response carries only clear metadata and the `encrypted` flag.
    pub async fn add_protected(
        &self,
        owner_id: Uuid,
        entry: DiaryEntry,
        password: &str,
    ) -> Result<EntrySummary> {
        validate_password(password)?;
        // Reject bad input before paying for any key derivation.
        entry.validate()?;

        let verifier = compute_verifier(password);
        let cipher = LegacyPassword::new(password);
        let body = self
            .pool
            .run(move || seal_entry(&entry, &cipher))
            .await?;

        let record = EntryRecord::new(owner_id, body).with_password_hash(verifier);
        self.store.insert(&record)?;
        tracing::debug!(
            entry_id = %record.id,
            fields = record.body.fields().len(),
            "stored password-protected entry"
        );
        Ok(record.summary())
    }

    /// Decrypt a password-protected entry.
    ///
    /// Order: not found, then the verifier gate (`WrongPassword`), then
    /// decryption. Rows without a verifier skip the gate and rely on CBC
    /// padding checks alone.
    pub async fn decrypt_protected(
        &self,
        owner_id: Uuid,
        id: Uuid,
        password: &str,
    ) -> Result<DiaryEntry> {
        let record = self.require(&owner_id, &id)?;
        validate_password(password)?;

        if record.scheme() != CipherScheme::PackedCbc {
            return Err(DiaryError::Validation(
                "entry is sealed with a client key, not a password".to_string(),
            ));
        }
        match &record.password_hash {
            Some(verifier) => ensure_verified(password, verifier)?,
            None => tracing::warn!(entry_id = %id, "protected entry has no verifier"),
        }

        let cipher = LegacyPassword::new(password);
        let body = record.body;
        let entry = self.pool.run(move || open_entry(&body, &cipher)).await?;
        tracing::debug!(entry_id = %id, "decrypted password-protected entry");
        Ok(entry)
    }
}
