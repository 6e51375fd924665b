//! AES-256-GCM field cipher (client-key variant, system of record).
//!
//! Each field is JSON-wrapped, encrypted under the session key with a fresh
//! 96-bit random nonce, and returned as `{ data, iv }`. The authentication tag
//! is carried at the end of `data`.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use serde::de::DeserializeOwned;
use serde::Serialize;
use zeroize::Zeroizing;

use super::secret::{fill_random, SecretKey};
use crate::error::{DiaryError, Result};
use crate::field::EncryptedField;

/// AES-GCM nonce length in bytes (96-bit).
pub const NONCE_LENGTH: usize = 12;

/// AES-GCM authentication tag length in bytes.
pub const TAG_LENGTH: usize = 16;

/// A secret prepared for repeated encrypt/decrypt calls.
///
/// This is the session-scoped capability: whoever holds a bound handle can
/// read and write entry content. [`CipherHandle::release`] ends that access.
pub struct CipherHandle {
    cipher: Option<Aes256Gcm>,
}

impl CipherHandle {
    /// A handle with no key bound. Every operation fails with `KeyUnavailable`.
    pub fn unbound() -> Self {
        Self { cipher: None }
    }

    /// Whether a key is currently bound.
    pub fn is_bound(&self) -> bool {
        self.cipher.is_some()
    }

    /// Drop the bound key schedule. Idempotent.
    pub fn release(&mut self) {
        if self.cipher.take().is_some() {
            tracing::debug!("released cipher handle");
        }
    }

    fn cipher(&self) -> Result<&Aes256Gcm> {
        self.cipher.as_ref().ok_or(DiaryError::KeyUnavailable)
    }
}

impl std::fmt::Debug for CipherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CipherHandle")
            .field("bound", &self.is_bound())
            .finish()
    }
}

/// Prepare a secret for use. Binding the same secret twice yields equivalent
/// handles; the secret itself is not retained.
pub fn bind_for_use(secret: &SecretKey) -> CipherHandle {
    let key = Key::<Aes256Gcm>::from_slice(secret.as_bytes());
    CipherHandle {
        cipher: Some(Aes256Gcm::new(key)),
    }
}

/// Consume a handle, discarding its key material.
pub fn release(mut handle: CipherHandle) {
    handle.release();
}

/// Encrypt any JSON-serializable value.
///
/// # Errors
///
/// - `DiaryError::KeyUnavailable` if the handle has been released
/// - `DiaryError::Crypto` if the RNG or the primitive fails
pub fn encrypt_value<T: Serialize + ?Sized>(
    value: &T,
    handle: &CipherHandle,
) -> Result<EncryptedField> {
    let cipher = handle.cipher()?;
    let plaintext = Zeroizing::new(serde_json::to_vec(value)?);

    let mut iv = [0u8; NONCE_LENGTH];
    fill_random(&mut iv)?;

    let data = cipher
        .encrypt(Nonce::from_slice(&iv), plaintext.as_slice())
        .map_err(|e| DiaryError::Crypto(format!("Encryption failed: {}", e)))?;

    Ok(EncryptedField::Gcm {
        data,
        iv: iv.to_vec(),
    })
}

/// Encrypt a single string field.
pub fn encrypt_field(plaintext: &str, handle: &CipherHandle) -> Result<EncryptedField> {
    encrypt_value(plaintext, handle)
}

/// Authenticate and decrypt a field into any JSON-deserializable value.
///
/// # Errors
///
/// - `DiaryError::KeyUnavailable` if the handle has been released
/// - `DiaryError::MalformedCiphertext` if the field is not a GCM field or the
///   nonce has the wrong length
/// - `DiaryError::AuthenticationFailed` if the tag check fails
pub fn decrypt_value<T: DeserializeOwned>(
    field: &EncryptedField,
    handle: &CipherHandle,
) -> Result<T> {
    let cipher = handle.cipher()?;
    let (data, iv) = match field {
        EncryptedField::Gcm { data, iv } => (data, iv),
        EncryptedField::PackedCbc(_) => {
            return Err(DiaryError::MalformedCiphertext(
                "expected a GCM field, found a packed CBC string".to_string(),
            ))
        }
    };

    if iv.len() != NONCE_LENGTH {
        return Err(DiaryError::MalformedCiphertext(format!(
            "nonce must be {} bytes (got {})",
            NONCE_LENGTH,
            iv.len()
        )));
    }
    if data.len() < TAG_LENGTH {
        return Err(DiaryError::MalformedCiphertext(
            "ciphertext shorter than authentication tag".to_string(),
        ));
    }

    let plaintext = Zeroizing::new(
        cipher
            .decrypt(Nonce::from_slice(iv), data.as_slice())
            .map_err(|_| DiaryError::AuthenticationFailed)?,
    );

    serde_json::from_slice(&plaintext).map_err(|e| {
        DiaryError::MalformedCiphertext(format!("decrypted payload is not valid JSON: {}", e))
    })
}

/// Authenticate and decrypt a single string field.
pub fn decrypt_field(field: &EncryptedField, handle: &CipherHandle) -> Result<String> {
    decrypt_value(field, handle)
}
