//! # Diary Core
//!
//! Confidentiality core for a personal diary whose entry content is encrypted
//! before it is stored.
//!
//! ## Architecture
//!
//! - **crypto**: key generation/backup, AES-256-GCM field cipher, legacy
//!   PBKDF2 + AES-256-CBC cipher, password verifier gate
//! - **custody**: lifetime of the client key across sign-in and sign-out
//! - **field**: the encrypted field variant and the `FieldCipher` strategy
//! - **entry**: diary entries, validation, seal/open, batch decryption
//! - **storage**: owner-scoped store for sealed entries (SQLite)
//! - **service**: request boundary for both encryption variants
//!
//! Plaintext exists only on the side that holds the secret. The store and
//! the service's sealed path handle ciphertext and clear metadata only.

pub mod crypto;
pub mod custody;
pub mod entry;
pub mod error;
pub mod field;
pub mod service;
pub mod storage;

pub use custody::{KeyCustodyManager, MemoryVault, RestoredSession, Session, SessionVault};
pub use entry::{
    open_batch, open_entry, open_listed, seal_entry, DiaryEntry, EntryMetadata, EntryView,
    SealedEntry,
};
pub use error::{DiaryError, Result};
pub use field::{CipherScheme, EncryptedField, FieldCipher, LegacyPassword};
pub use service::{DerivationPool, DiaryService};
pub use storage::{EntryStore, SqliteEntryStore};

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
