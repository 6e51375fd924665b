//! Password-verification gate for the legacy server-password variant.
//!
//! A SHA-256 hex digest of the encryption password is stored next to the
//! ciphertext so a wrong password can be rejected before any key derivation.
//! This is a tripwire for the encryption password only; it never gates login
//! and is never returned to clients.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{DiaryError, Result};

/// Length of the hex-encoded verifier.
pub const VERIFIER_HEX_LENGTH: usize = 64;

/// SHA-256 hex digest of an encryption password.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PasswordVerifier(String);

impl PasswordVerifier {
    /// Parse a stored verifier (64 lowercase hex characters).
    pub fn parse(value: &str) -> Result<Self> {
        let valid = value.len() == VERIFIER_HEX_LENGTH
            && value
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if !valid {
            return Err(DiaryError::Validation(
                "password verifier must be 64 lowercase hex characters".to_string(),
            ));
        }
        Ok(Self(value.to_string()))
    }

    /// The hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PasswordVerifier {
    type Error = DiaryError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<PasswordVerifier> for String {
    fn from(value: PasswordVerifier) -> Self {
        value.0
    }
}

impl std::fmt::Debug for PasswordVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PasswordVerifier([REDACTED])")
    }
}

/// Compute the verifier for a password.
pub fn compute_verifier(password: &str) -> PasswordVerifier {
    PasswordVerifier(hex::encode(Sha256::digest(password.as_bytes())))
}

/// Check a password against a stored verifier in constant time.
pub fn verify(password: &str, stored: &PasswordVerifier) -> bool {
    let computed = compute_verifier(password);
    constant_time_eq(computed.as_str().as_bytes(), stored.as_str().as_bytes())
}

/// Reject a wrong password before any decryption is attempted.
pub fn ensure_verified(password: &str, stored: &PasswordVerifier) -> Result<()> {
    if verify(password, stored) {
        Ok(())
    } else {
        Err(DiaryError::WrongPassword)
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        // sha256("abc")
        assert_eq!(
            compute_verifier("abc").as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_verify_accepts_same_password() {
        let stored = compute_verifier("correct-horse");
        assert!(verify("correct-horse", &stored));
        assert!(ensure_verified("correct-horse", &stored).is_ok());
    }

    #[test]
    fn test_verify_rejects_other_passwords() {
        let stored = compute_verifier("correct-horse");
        for other in ["wrong-password", "correct-horse ", "Correct-horse", ""] {
            assert!(!verify(other, &stored));
        }
        assert!(matches!(
            ensure_verified("wrong-password", &stored),
            Err(DiaryError::WrongPassword)
        ));
    }

    #[test]
    fn test_verifier_shape() {
        let stored = compute_verifier("anything");
        assert_eq!(stored.as_str().len(), VERIFIER_HEX_LENGTH);
        assert!(PasswordVerifier::parse(stored.as_str()).is_ok());
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(PasswordVerifier::parse("abc").is_err());
        assert!(PasswordVerifier::parse(&"A".repeat(64)).is_err());
        assert!(PasswordVerifier::parse(&"g".repeat(64)).is_err());
    }

    #[test]
    fn test_serde_as_plain_string() {
        let stored = compute_verifier("pw");
        let json = serde_json::to_string(&stored).unwrap();
        assert_eq!(json, format!("\"{}\"", stored.as_str()));
        let back: PasswordVerifier = serde_json::from_str(&json).unwrap();
        assert_eq!(back, stored);
        assert!(serde_json::from_str::<PasswordVerifier>("\"nothex\"").is_err());
    }

    #[test]
    fn test_debug_redacts() {
        let stored = compute_verifier("pw");
        let debug_output = format!("{:?}", stored);
        assert!(!debug_output.contains(stored.as_str()));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
        assert!(!constant_time_eq(b"", b"a"));
    }
}
