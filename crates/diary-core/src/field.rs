//! Encrypted field representation and the cipher strategy seam.
//!
//! Two ciphertext shapes exist in stored data. They are modelled as one tagged
//! variant so callers branch on the scheme explicitly:
//!
//! - `Gcm { data, iv }`: raw AES-GCM output (ciphertext + tag) and a 12-byte nonce
//! - `PackedCbc("<saltHex>:<ivHex>:<ciphertextHex>")`: legacy password cipher
//!
//! The inner shapes are exactly the historic wire shapes; only the outer tag is
//! added at the storage boundary.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::crypto::{cbc, gcm, CipherHandle};
use crate::error::{DiaryError, Result};

/// Opaque ciphertext of one plaintext field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scheme", content = "value", rename_all = "snake_case")]
pub enum EncryptedField {
    /// AES-256-GCM ciphertext with its nonce.
    Gcm { data: Vec<u8>, iv: Vec<u8> },
    /// Self-contained PBKDF2 + AES-256-CBC packed string.
    PackedCbc(String),
}

impl EncryptedField {
    /// The cipher scheme that produced this field.
    pub fn scheme(&self) -> CipherScheme {
        match self {
            EncryptedField::Gcm { .. } => CipherScheme::Gcm,
            EncryptedField::PackedCbc(_) => CipherScheme::PackedCbc,
        }
    }

    /// Read a field from stored JSON.
    ///
    /// Accepts the tagged form written by this crate as well as the untagged
    /// historic forms: an object with `data` and `iv` byte arrays, or a packed
    /// string.
    pub fn from_stored_json(value: &serde_json::Value) -> Result<Self> {
        if value.get("scheme").is_some() {
            return Ok(serde_json::from_value(value.clone())?);
        }

        match value {
            serde_json::Value::String(packed) => {
                if !cbc::is_packed(packed) {
                    return Err(DiaryError::MalformedCiphertext(
                        "stored string is not a packed salt:iv:ciphertext value".to_string(),
                    ));
                }
                Ok(EncryptedField::PackedCbc(packed.clone()))
            }
            serde_json::Value::Object(map) => {
                let data = byte_array(map.get("data"), "data")?;
                let iv = byte_array(map.get("iv"), "iv")?;
                Ok(EncryptedField::Gcm { data, iv })
            }
            _ => Err(DiaryError::MalformedCiphertext(
                "stored field is neither an object nor a string".to_string(),
            )),
        }
    }
}

fn byte_array(value: Option<&serde_json::Value>, name: &str) -> Result<Vec<u8>> {
    let items = value.and_then(|v| v.as_array()).ok_or_else(|| {
        DiaryError::MalformedCiphertext(format!("stored field is missing `{}` array", name))
    })?;
    items
        .iter()
        .map(|item| {
            item.as_u64()
                .and_then(|n| u8::try_from(n).ok())
                .ok_or_else(|| {
                    DiaryError::MalformedCiphertext(format!("`{}` must contain bytes", name))
                })
        })
        .collect()
}

/// Which cipher produced (or can open) a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CipherScheme {
    Gcm,
    PackedCbc,
}

impl std::fmt::Display for CipherScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CipherScheme::Gcm => write!(f, "aes-256-gcm"),
            CipherScheme::PackedCbc => write!(f, "pbkdf2-aes-256-cbc"),
        }
    }
}

/// Strategy for sealing and opening individual string fields.
///
/// Implemented by the session-bound GCM [`CipherHandle`] and by
/// [`LegacyPassword`]. Implementations hold no mutable state and may be shared
/// across threads.
pub trait FieldCipher: Send + Sync {
    /// The scheme this cipher writes.
    fn scheme(&self) -> CipherScheme;

    /// Encrypt one plaintext field.
    fn seal(&self, plaintext: &str) -> Result<EncryptedField>;

    /// Decrypt one field. Fields of another scheme are `MalformedCiphertext`.
    fn open(&self, field: &EncryptedField) -> Result<String>;
}

impl FieldCipher for CipherHandle {
    fn scheme(&self) -> CipherScheme {
        CipherScheme::Gcm
    }

    fn seal(&self, plaintext: &str) -> Result<EncryptedField> {
        gcm::encrypt_field(plaintext, self)
    }

    fn open(&self, field: &EncryptedField) -> Result<String> {
        gcm::decrypt_field(field, self)
    }
}

/// A legacy encryption password supplied for one request.
pub struct LegacyPassword {
    password: SecretString,
}

impl LegacyPassword {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: SecretString::from(password.into()),
        }
    }

    /// The raw password, for the verifier gate.
    pub fn expose(&self) -> &str {
        self.password.expose_secret()
    }
}

impl std::fmt::Debug for LegacyPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("LegacyPassword([REDACTED])")
    }
}

impl FieldCipher for LegacyPassword {
    fn scheme(&self) -> CipherScheme {
        CipherScheme::PackedCbc
    }

    fn seal(&self, plaintext: &str) -> Result<EncryptedField> {
        cbc::encrypt_field(plaintext, self.expose()).map(EncryptedField::PackedCbc)
    }

    fn open(&self, field: &EncryptedField) -> Result<String> {
        match field {
            EncryptedField::PackedCbc(packed) => cbc::decrypt_field(packed, self.expose()),
            EncryptedField::Gcm { .. } => Err(DiaryError::MalformedCiphertext(
                "expected a packed CBC string, found a GCM field".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{bind_for_use, SecretKey};

    #[test]
    fn test_gcm_serializes_with_historic_inner_shape() {
        let field = EncryptedField::Gcm {
            data: vec![1, 2, 3],
            iv: vec![9; 12],
        };
        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(json["scheme"], "gcm");
        assert_eq!(json["value"]["data"], serde_json::json!([1, 2, 3]));
        assert_eq!(json["value"]["iv"].as_array().unwrap().len(), 12);
    }

    #[test]
    fn test_packed_serializes_verbatim() {
        let field = EncryptedField::PackedCbc("aa:bb:cc".to_string());
        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(json, serde_json::json!({"scheme": "packed_cbc", "value": "aa:bb:cc"}));
    }

    #[test]
    fn test_from_stored_json_untagged_object() {
        let stored = serde_json::json!({"data": [10, 20, 255], "iv": [0, 1, 2]});
        let field = EncryptedField::from_stored_json(&stored).unwrap();
        assert_eq!(
            field,
            EncryptedField::Gcm {
                data: vec![10, 20, 255],
                iv: vec![0, 1, 2]
            }
        );
    }

    #[test]
    fn test_from_stored_json_untagged_packed_string() {
        let packed = cbc::encrypt_field("x", "pw").unwrap();
        let field = EncryptedField::from_stored_json(&serde_json::json!(packed)).unwrap();
        assert_eq!(field.scheme(), CipherScheme::PackedCbc);
    }

    #[test]
    fn test_from_stored_json_tagged() {
        let original = EncryptedField::Gcm {
            data: vec![5; 20],
            iv: vec![6; 12],
        };
        let json = serde_json::to_value(&original).unwrap();
        assert_eq!(EncryptedField::from_stored_json(&json).unwrap(), original);
    }

    #[test]
    fn test_from_stored_json_rejects_garbage() {
        for bad in [
            serde_json::json!(42),
            serde_json::json!("plain text, not packed"),
            serde_json::json!({"data": [1, 2, 300], "iv": [0]}),
            serde_json::json!({"data": [1, 2]}),
        ] {
            assert!(matches!(
                EncryptedField::from_stored_json(&bad),
                Err(DiaryError::MalformedCiphertext(_))
            ));
        }
    }

    #[test]
    fn test_strategies_round_trip() {
        let handle = bind_for_use(&SecretKey::from_bytes([3u8; 32]));
        let legacy = LegacyPassword::new("correct-horse");
        let ciphers: [&dyn FieldCipher; 2] = [&handle, &legacy];
        for cipher in ciphers {
            let sealed = cipher.seal("dear diary").unwrap();
            assert_eq!(sealed.scheme(), cipher.scheme());
            assert_eq!(cipher.open(&sealed).unwrap(), "dear diary");
        }
    }

    #[test]
    fn test_cross_scheme_open_is_malformed() {
        let handle = bind_for_use(&SecretKey::from_bytes([3u8; 32]));
        let legacy = LegacyPassword::new("correct-horse");
        let gcm_field = handle.seal("a").unwrap();
        let cbc_field = legacy.seal("b").unwrap();
        assert!(matches!(
            legacy.open(&gcm_field),
            Err(DiaryError::MalformedCiphertext(_))
        ));
        assert!(matches!(
            handle.open(&cbc_field),
            Err(DiaryError::MalformedCiphertext(_))
        ));
    }

    #[test]
    fn test_legacy_password_debug_redacts() {
        let legacy = LegacyPassword::new("correct-horse");
        assert!(!format!("{:?}", legacy).contains("correct-horse"));
    }
}
