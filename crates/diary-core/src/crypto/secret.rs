//! Client-held symmetric secret.
//!
//! The secret is 256 bits of CSPRNG output. It never reaches the server; the
//! only backup path is the base64 export shown to the user once.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::{DiaryError, Result};

/// Length of the secret key in bytes (256 bits for AES-256).
pub const KEY_LENGTH: usize = 32;

/// Length of the per-user encryption salt in bytes.
pub const ENCRYPTION_SALT_LENGTH: usize = 16;

/// A 256-bit symmetric key held only by the client.
///
/// Key material is zeroized from memory when dropped.
#[derive(Clone, ZeroizeOnDrop)]
pub struct SecretKey {
    key: [u8; KEY_LENGTH],
}

impl SecretKey {
    /// Wrap raw key bytes.
    ///
    /// # Security
    ///
    /// The caller is responsible for ensuring the bytes come from a secure source.
    pub fn from_bytes(bytes: [u8; KEY_LENGTH]) -> Self {
        Self { key: bytes }
    }

    /// Get a reference to the raw key bytes.
    ///
    /// # Security
    ///
    /// Avoid storing or logging this value. Use only for immediate cipher setup.
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.key
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Fill a buffer from the operating system CSPRNG.
pub(crate) fn fill_random(buf: &mut [u8]) -> Result<()> {
    getrandom::getrandom(buf)
        .map_err(|e| DiaryError::Crypto(format!("Random number generation failed: {}", e)))
}

/// Generate a new random secret.
pub fn generate_secret() -> Result<SecretKey> {
    let mut bytes = [0u8; KEY_LENGTH];
    fill_random(&mut bytes)?;
    let key = SecretKey::from_bytes(bytes);
    bytes.zeroize();
    Ok(key)
}

/// Encode a secret as base64 for display, download or copy.
///
/// The returned string is the key itself; it is wrapped in `Zeroizing` so the
/// caller's copy is wiped when dropped.
pub fn export_for_backup(secret: &SecretKey) -> Zeroizing<String> {
    Zeroizing::new(STANDARD.encode(secret.as_bytes()))
}

/// Parse a secret previously produced by [`export_for_backup`].
///
/// Surrounding whitespace is ignored (keys are often pasted from files).
///
/// # Errors
///
/// Returns `DiaryError::MalformedSecret` if the input is not base64 or does not
/// decode to exactly 32 bytes.
pub fn import_from_input(input: &str) -> Result<SecretKey> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(DiaryError::MalformedSecret(
            "Encryption key cannot be empty".to_string(),
        ));
    }

    let decoded = Zeroizing::new(
        STANDARD
            .decode(trimmed.as_bytes())
            .map_err(|_| DiaryError::MalformedSecret("Key is not valid base64".to_string()))?,
    );

    if decoded.len() != KEY_LENGTH {
        return Err(DiaryError::MalformedSecret(format!(
            "Key must decode to {} bytes (got {})",
            KEY_LENGTH,
            decoded.len()
        )));
    }

    let mut bytes = [0u8; KEY_LENGTH];
    bytes.copy_from_slice(&decoded);
    let key = SecretKey::from_bytes(bytes);
    bytes.zeroize();
    Ok(key)
}

/// Generate the per-user encryption salt stored on the account record.
///
/// Nothing derives a key from this value yet; the client key is random and
/// used directly.
pub fn generate_encryption_salt() -> Result<String> {
    let mut salt = [0u8; ENCRYPTION_SALT_LENGTH];
    fill_random(&mut salt)?;
    Ok(STANDARD.encode(salt))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_secret_length_and_randomness() {
        let a = generate_secret().unwrap();
        let b = generate_secret().unwrap();
        assert_eq!(a.as_bytes().len(), KEY_LENGTH);
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_export_import_round_trip() {
        let secret = generate_secret().unwrap();
        let exported = export_for_backup(&secret);
        let imported = import_from_input(&exported).unwrap();
        assert_eq!(secret.as_bytes(), imported.as_bytes());
    }

    #[test]
    fn test_import_ignores_surrounding_whitespace() {
        let secret = SecretKey::from_bytes([7u8; KEY_LENGTH]);
        let exported = export_for_backup(&secret);
        let padded = format!("  {}\n", exported.as_str());
        let imported = import_from_input(&padded).unwrap();
        assert_eq!(imported.as_bytes(), &[7u8; KEY_LENGTH]);
    }

    #[test]
    fn test_import_rejects_wrong_length() {
        let short = STANDARD.encode([1u8; 16]);
        let result = import_from_input(&short);
        assert!(matches!(result, Err(DiaryError::MalformedSecret(_))));
        assert!(result.unwrap_err().to_string().contains("32 bytes"));
    }

    #[test]
    fn test_import_rejects_non_base64() {
        let result = import_from_input("not base64 at all!");
        assert!(matches!(result, Err(DiaryError::MalformedSecret(_))));
    }

    #[test]
    fn test_import_rejects_empty() {
        assert!(matches!(
            import_from_input("   "),
            Err(DiaryError::MalformedSecret(_))
        ));
    }

    #[test]
    fn test_secret_debug_redacts() {
        let secret = SecretKey::from_bytes([0xAB; KEY_LENGTH]);
        let debug_output = format!("{:?}", secret);
        assert!(debug_output.contains("REDACTED"));
        assert!(!debug_output.contains("ab, ab"));
        assert!(!debug_output.contains("171"));
    }

    #[test]
    fn test_encryption_salt_is_base64_of_16_bytes() {
        let salt = generate_encryption_salt().unwrap();
        let decoded = STANDARD.decode(salt.as_bytes()).unwrap();
        assert_eq!(decoded.len(), ENCRYPTION_SALT_LENGTH);
    }
}
