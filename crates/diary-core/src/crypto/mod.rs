//! Cryptographic operations for diary content.
//!
//! - **AES-256-GCM** with a client-held random key (system of record)
//! - **PBKDF2-HMAC-SHA256 + AES-256-CBC** with a per-request password (legacy)
//! - **SHA-256 verifier** to reject wrong legacy passwords early
//!
//! ## Threat Model
//!
//! We defend against:
//! - A server or database that stores and serves ciphertext (zero-knowledge for
//!   the GCM path: the key never leaves the client)
//! - Tampering with stored GCM fields
//!
//! We do NOT defend against:
//! - A compromised client holding an unlocked session
//! - Offline brute force of weak legacy passwords beyond the PBKDF2 cost

pub mod cbc;
pub mod gcm;
pub mod passphrase;
pub mod secret;
pub mod verifier;

pub use gcm::{bind_for_use, release, CipherHandle};
pub use passphrase::validate_password;
pub use secret::{
    export_for_backup, generate_encryption_salt, generate_secret, import_from_input, SecretKey,
};
pub use verifier::{compute_verifier, ensure_verified, verify, PasswordVerifier};
