//! Error types for diary core operations.
//!
//! Cryptographic failures are kept as distinct variants so that the request
//! boundary can tell "wrong key or corrupted data" apart from storage or
//! validation problems. The CLI layer maps these to user-facing messages.

use thiserror::Error;

/// Result type alias for diary operations.
pub type Result<T> = std::result::Result<T, DiaryError>;

/// Core error type for diary operations.
#[derive(Debug, Error)]
pub enum DiaryError {
    /// No secret is bound; the user must unlock (re-supply the key) first
    #[error("Encryption key not available")]
    KeyUnavailable,

    /// Secret input did not decode to a 256-bit key
    #[error("Malformed secret: {0}")]
    MalformedSecret(String),

    /// Stored ciphertext does not have the expected shape or encoding
    #[error("Malformed ciphertext: {0}")]
    MalformedCiphertext(String),

    /// AES-GCM tag check failed (wrong key, corruption or tampering)
    #[error("Cannot decrypt: wrong key or corrupted data")]
    AuthenticationFailed,

    /// Legacy CBC decode or padding failure
    #[error("Cannot decrypt: wrong password or corrupted data")]
    DecryptionFailed,

    /// Encryption password does not match the stored verifier
    #[error("Invalid password. Cannot decrypt diary content.")]
    WrongPassword,

    /// Low-level primitive or RNG failure
    #[error("Encryption error: {0}")]
    Crypto(String),

    /// Entry data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Storage backend error (generic)
    #[error("Storage error: {0}")]
    Storage(String),

    /// SQLite-specific storage error
    #[error("SQLite error: {source}")]
    Sqlite {
        #[from]
        source: rusqlite::Error,
    },

    /// I/O error
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}

impl DiaryError {
    /// True for failures that mean "this ciphertext cannot be opened with the
    /// secret supplied". These are terminal for the field and must never be
    /// reported as an internal error.
    pub fn is_decrypt_failure(&self) -> bool {
        matches!(
            self,
            DiaryError::AuthenticationFailed
                | DiaryError::DecryptionFailed
                | DiaryError::MalformedCiphertext(_)
        )
    }

    /// True when the caller must supply a different secret before retrying.
    pub fn needs_new_secret(&self) -> bool {
        self.is_decrypt_failure()
            || matches!(
                self,
                DiaryError::KeyUnavailable | DiaryError::WrongPassword | DiaryError::MalformedSecret(_)
            )
    }
}
