//! Legacy server-password cipher: PBKDF2-HMAC-SHA256 + AES-256-CBC.
//!
//! Every call draws a fresh 32-byte salt and 16-byte IV, derives a key from
//! the caller's password, and packs the result as
//! `hex(salt):hex(iv):hex(ciphertext)`. The format is kept byte-compatible with
//! rows already stored by the password-based server path.
//!
//! CBC carries no authentication. A wrong password or corrupted data shows up
//! as a padding error or non-UTF-8 output, and both are reported as
//! `DecryptionFailed`. New data should use the GCM cipher.

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::{Zeroize, Zeroizing};

use super::secret::fill_random;
use crate::error::{DiaryError, Result};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// PBKDF2 iteration count. This is the brute-force cost factor; do not lower it.
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Length of the derived key in bytes.
pub const KEY_LENGTH: usize = 32;

/// Length of the per-call salt in bytes.
pub const SALT_LENGTH: usize = 32;

/// Length of the CBC IV in bytes.
pub const IV_LENGTH: usize = 16;

const SEPARATOR: char = ':';

/// Derive a 256-bit key from a password and salt.
///
/// Deterministic: the same password and salt always produce the same key.
/// CPU-bound (roughly 100ms); keep it off async executors and out of locks.
pub fn derive_key(password: &str, salt: &[u8]) -> Zeroizing<[u8; KEY_LENGTH]> {
    let mut key = Zeroizing::new([0u8; KEY_LENGTH]);
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ITERATIONS, &mut key[..]);
    key
}

/// Encrypt a field with a password, returning the packed `salt:iv:ciphertext` string.
///
/// # Errors
///
/// - `DiaryError::KeyUnavailable` if the password is empty
/// - `DiaryError::Crypto` if the RNG fails
pub fn encrypt_field(plaintext: &str, password: &str) -> Result<String> {
    if password.is_empty() {
        return Err(DiaryError::KeyUnavailable);
    }

    let mut salt = [0u8; SALT_LENGTH];
    fill_random(&mut salt)?;
    let mut iv = [0u8; IV_LENGTH];
    fill_random(&mut iv)?;

    let key = derive_key(password, &salt);
    let ciphertext = Aes256CbcEnc::new_from_slices(&key[..], &iv)
        .map_err(|e| DiaryError::Crypto(format!("Failed to create cipher: {}", e)))?
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

    Ok(format!(
        "{}{sep}{}{sep}{}",
        hex::encode(salt),
        hex::encode(iv),
        hex::encode(ciphertext),
        sep = SEPARATOR
    ))
}

/// Decrypt a packed `salt:iv:ciphertext` string with a password.
///
/// # Errors
///
/// - `DiaryError::KeyUnavailable` if the password is empty
/// - `DiaryError::MalformedCiphertext` if the string does not have exactly three
///   parts, or a part is not hex, or salt/IV have the wrong length
/// - `DiaryError::DecryptionFailed` on padding or UTF-8 failure (wrong password
///   or corrupted ciphertext; CBC cannot tell which)
pub fn decrypt_field(packed: &str, password: &str) -> Result<String> {
    if password.is_empty() {
        return Err(DiaryError::KeyUnavailable);
    }

    let parts = split_packed(packed)?;
    let key = derive_key(password, &parts.salt);

    let plaintext = Aes256CbcDec::new_from_slices(&key[..], &parts.iv)
        .map_err(|e| DiaryError::Crypto(format!("Failed to create cipher: {}", e)))?
        .decrypt_padded_vec_mut::<Pkcs7>(&parts.ciphertext)
        .map_err(|_| DiaryError::DecryptionFailed)?;

    String::from_utf8(plaintext).map_err(|err| {
        err.into_bytes().zeroize();
        DiaryError::DecryptionFailed
    })
}

/// Whether a string has the packed `salt:iv:ciphertext` shape.
///
/// Checks structure only (part count, hex, lengths); it cannot tell whether the
/// ciphertext will decrypt.
pub fn is_packed(value: &str) -> bool {
    split_packed(value).is_ok()
}

struct PackedParts {
    salt: Vec<u8>,
    iv: Vec<u8>,
    ciphertext: Vec<u8>,
}

fn split_packed(packed: &str) -> Result<PackedParts> {
    let segments: Vec<&str> = packed.split(SEPARATOR).collect();
    if segments.len() != 3 {
        return Err(DiaryError::MalformedCiphertext(format!(
            "expected 3 colon-separated parts, got {}",
            segments.len()
        )));
    }

    let salt = decode_part("salt", segments[0])?;
    let iv = decode_part("iv", segments[1])?;
    let ciphertext = decode_part("ciphertext", segments[2])?;

    if salt.len() != SALT_LENGTH {
        return Err(DiaryError::MalformedCiphertext(format!(
            "salt must be {} bytes (got {})",
            SALT_LENGTH,
            salt.len()
        )));
    }
    if iv.len() != IV_LENGTH {
        return Err(DiaryError::MalformedCiphertext(format!(
            "iv must be {} bytes (got {})",
            IV_LENGTH,
            iv.len()
        )));
    }
    if ciphertext.is_empty() {
        return Err(DiaryError::MalformedCiphertext(
            "ciphertext is empty".to_string(),
        ));
    }

    Ok(PackedParts {
        salt,
        iv,
        ciphertext,
    })
}

fn decode_part(name: &str, value: &str) -> Result<Vec<u8>> {
    hex::decode(value)
        .map_err(|e| DiaryError::MalformedCiphertext(format!("{} is not valid hex: {}", name, e)))
}
