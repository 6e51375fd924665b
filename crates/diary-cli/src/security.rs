//! Session slot backends for key custody.
//!
//! The session token and the cached key live in two separate slots in either
//! backend: two keychain entries, or two 0600 files.

use std::path::{Path, PathBuf};

use diary_core::{DiaryError, SessionVault};
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::config::SessionBackend;
use crate::constants::KEYCHAIN_SERVICE;

const TOKEN_FILE: &str = "session.token";
const KEY_FILE: &str = "session.key";

fn storage_error(message: String) -> DiaryError {
    DiaryError::Storage(message)
}

/// Random local session token (hex).
pub fn generate_session_token() -> anyhow::Result<String> {
    let mut bytes = Zeroizing::new([0u8; 16]);
    getrandom::getrandom(&mut bytes[..])
        .map_err(|e| anyhow::anyhow!("Failed to generate session token: {}", e))?;
    Ok(hex::encode(&bytes[..]))
}

/// Session slots held in the OS keychain.
pub struct KeychainVault {
    owner_id: Uuid,
}

impl KeychainVault {
    pub fn new(owner_id: Uuid) -> Self {
        Self { owner_id }
    }

    fn entry(&self, slot: &str) -> diary_core::Result<keyring::Entry> {
        let account = format!("{}:{}", slot, self.owner_id);
        keyring::Entry::new(KEYCHAIN_SERVICE, &account)
            .map_err(|e| storage_error(format!("Keychain entry failed: {}", e)))
    }

    fn get(&self, slot: &str) -> diary_core::Result<Option<String>> {
        match self.entry(slot)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(err) => Err(storage_error(format!("Keychain read failed: {}", err))),
        }
    }

    fn set(&self, slot: &str, value: &str) -> diary_core::Result<()> {
        self.entry(slot)?
            .set_password(value)
            .map_err(|e| storage_error(format!("Keychain write failed: {}", e)))
    }

    fn clear(&self, slot: &str) -> diary_core::Result<()> {
        match self.entry(slot)?.delete_password() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(err) => Err(storage_error(format!("Keychain delete failed: {}", err))),
        }
    }
}

impl SessionVault for KeychainVault {
    fn load_token(&self) -> diary_core::Result<Option<String>> {
        self.get("session-token")
    }

    fn store_token(&self, token: &str) -> diary_core::Result<()> {
        self.set("session-token", token)
    }

    fn clear_token(&self) -> diary_core::Result<()> {
        self.clear("session-token")
    }

    fn load_key(&self) -> diary_core::Result<Option<Zeroizing<String>>> {
        Ok(self.get("session-key")?.map(Zeroizing::new))
    }

    fn store_key(&self, encoded_key: &str) -> diary_core::Result<()> {
        self.set("session-key", encoded_key)
    }

    fn clear_key(&self) -> diary_core::Result<()> {
        self.clear("session-key")
    }
}

/// Session slots held as two owner-only files in a directory.
pub struct FileVault {
    dir: PathBuf,
}

impl FileVault {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn read(&self, name: &str) -> diary_core::Result<Option<Zeroizing<String>>> {
        let path = self.dir.join(name);
        match std::fs::read_to_string(&path) {
            Ok(value) => {
                let value = Zeroizing::new(value);
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(Zeroizing::new(trimmed.to_string())))
                }
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write(&self, name: &str, value: &str) -> diary_core::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(name);
        write_private(&path, value.as_bytes())?;
        Ok(())
    }

    fn remove(&self, name: &str) -> diary_core::Result<()> {
        match std::fs::remove_file(self.dir.join(name)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

impl SessionVault for FileVault {
    fn load_token(&self) -> diary_core::Result<Option<String>> {
        Ok(self.read(TOKEN_FILE)?.map(|token| token.to_string()))
    }

    fn store_token(&self, token: &str) -> diary_core::Result<()> {
        self.write(TOKEN_FILE, token)
    }

    fn clear_token(&self) -> diary_core::Result<()> {
        self.remove(TOKEN_FILE)
    }

    fn load_key(&self) -> diary_core::Result<Option<Zeroizing<String>>> {
        self.read(KEY_FILE)
    }

    fn store_key(&self, encoded_key: &str) -> diary_core::Result<()> {
        self.write(KEY_FILE, encoded_key)
    }

    fn clear_key(&self) -> diary_core::Result<()> {
        self.remove(KEY_FILE)
    }
}

/// The configured backend.
pub enum Vault {
    Keychain(KeychainVault),
    File(FileVault),
}

impl Vault {
    pub fn open(backend: SessionBackend, owner_id: Uuid, session_dir: PathBuf) -> Self {
        match backend {
            SessionBackend::Keychain => Vault::Keychain(KeychainVault::new(owner_id)),
            SessionBackend::File => Vault::File(FileVault::new(session_dir)),
        }
    }

    fn inner(&self) -> &dyn SessionVault {
        match self {
            Vault::Keychain(vault) => vault,
            Vault::File(vault) => vault,
        }
    }
}

impl SessionVault for Vault {
    fn load_token(&self) -> diary_core::Result<Option<String>> {
        self.inner().load_token()
    }

    fn store_token(&self, token: &str) -> diary_core::Result<()> {
        self.inner().store_token(token)
    }

    fn clear_token(&self) -> diary_core::Result<()> {
        self.inner().clear_token()
    }

    fn load_key(&self) -> diary_core::Result<Option<Zeroizing<String>>> {
        self.inner().load_key()
    }

    fn store_key(&self, encoded_key: &str) -> diary_core::Result<()> {
        self.inner().store_key(encoded_key)
    }

    fn clear_key(&self) -> diary_core::Result<()> {
        self.inner().clear_key()
    }
}

/// Write a file readable only by the owner, creating it with 0600 up front so
/// the secret is never briefly world-readable.
pub fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    use std::io::Write;

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(contents)?;
    set_file_permissions(path)
}

fn set_file_permissions(path: &Path) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(path)?.permissions();
        perms.set_mode(0o600);
        std::fs::set_permissions(path, perms)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_vault_slots_are_independent() {
        let dir = TempDir::new().unwrap();
        let vault = FileVault::new(dir.path().join("session"));
        assert!(vault.load_token().unwrap().is_none());

        vault.store_token("tok").unwrap();
        vault.store_key("a2V5").unwrap();
        assert_eq!(vault.load_token().unwrap().as_deref(), Some("tok"));

        vault.clear_key().unwrap();
        assert!(vault.load_key().unwrap().is_none());
        assert_eq!(vault.load_token().unwrap().as_deref(), Some("tok"));

        vault.clear_token().unwrap();
        vault.clear_token().unwrap();
        assert!(vault.load_token().unwrap().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_file_vault_key_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let vault = FileVault::new(dir.path());
        vault.store_key("a2V5").unwrap();
        let mode = std::fs::metadata(dir.path().join(KEY_FILE))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_session_token_is_random_hex() {
        let a = generate_session_token().unwrap();
        let b = generate_session_token().unwrap();
        assert_eq!(a.len(), 32);
        assert_ne!(a, b);
    }
}
