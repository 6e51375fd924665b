//! Key custody across sign-in and sign-out.
//!
//! The client key is cached (to avoid re-prompting) in a slot separate from the
//! session token. Both slots are written when a session begins and cleared
//! together when it ends. A key without a token is stale and is wiped on
//! restore; a token without a key means the user must unlock again.
//!
//! The secret never leaves this layer except through the backup export.

use std::sync::Mutex;

use zeroize::Zeroizing;

use crate::crypto::{bind_for_use, export_for_backup, import_from_input, CipherHandle, SecretKey};
use crate::error::{DiaryError, Result};

/// Persistent storage for the two session slots.
///
/// Implementations must keep the token and the key in separate entries so that
/// clearing one never silently clears or rewrites the other.
pub trait SessionVault: Send + Sync {
    fn load_token(&self) -> Result<Option<String>>;
    fn store_token(&self, token: &str) -> Result<()>;
    fn clear_token(&self) -> Result<()>;

    /// Load the cached key (base64 export form).
    fn load_key(&self) -> Result<Option<Zeroizing<String>>>;
    fn store_key(&self, encoded_key: &str) -> Result<()>;
    fn clear_key(&self) -> Result<()>;
}

/// In-process vault. Nothing outlives the process.
#[derive(Default)]
pub struct MemoryVault {
    token: Mutex<Option<String>>,
    key: Mutex<Option<Zeroizing<String>>>,
}

impl MemoryVault {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> DiaryError {
    DiaryError::Storage("session vault lock poisoned".to_string())
}

impl SessionVault for MemoryVault {
    fn load_token(&self) -> Result<Option<String>> {
        Ok(self.token.lock().map_err(poisoned)?.clone())
    }

    fn store_token(&self, token: &str) -> Result<()> {
        *self.token.lock().map_err(poisoned)? = Some(token.to_string());
        Ok(())
    }

    fn clear_token(&self) -> Result<()> {
        *self.token.lock().map_err(poisoned)? = None;
        Ok(())
    }

    fn load_key(&self) -> Result<Option<Zeroizing<String>>> {
        Ok(self.key.lock().map_err(poisoned)?.clone())
    }

    fn store_key(&self, encoded_key: &str) -> Result<()> {
        *self.key.lock().map_err(poisoned)? = Some(Zeroizing::new(encoded_key.to_string()));
        Ok(())
    }

    fn clear_key(&self) -> Result<()> {
        *self.key.lock().map_err(poisoned)? = None;
        Ok(())
    }
}

/// An unlocked session: the auth token plus the bound cipher.
pub struct Session {
    token: String,
    handle: CipherHandle,
}

impl Session {
    pub fn token(&self) -> &str {
        &self.token
    }

    /// The capability used to seal and open entry fields.
    pub fn cipher(&self) -> &CipherHandle {
        &self.handle
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &"[REDACTED]")
            .field("handle", &self.handle)
            .finish()
    }
}

/// Outcome of restoring custody state at startup.
#[derive(Debug)]
pub enum RestoredSession {
    /// Token and key were both present and valid.
    Active(Session),
    /// Signed in, but the key must be re-entered.
    NeedsKey { token: String },
    /// No session.
    SignedOut,
}

/// Orchestrates acquisition, caching and disposal of the client key.
pub struct KeyCustodyManager<V: SessionVault> {
    vault: V,
}

impl<V: SessionVault> KeyCustodyManager<V> {
    pub fn new(vault: V) -> Self {
        Self { vault }
    }

    pub fn vault(&self) -> &V {
        &self.vault
    }

    /// Begin a session: cache the key and the token in their separate slots and
    /// bind the key for use.
    ///
    /// If the token cannot be stored, the key slot is rolled back so no key is
    /// left behind without a token.
    pub fn begin_session(&self, token: &str, secret: &SecretKey) -> Result<Session> {
        if token.trim().is_empty() {
            return Err(DiaryError::Validation(
                "session token cannot be empty".to_string(),
            ));
        }

        let encoded = export_for_backup(secret);
        self.vault.store_key(&encoded)?;
        if let Err(err) = self.vault.store_token(token) {
            if let Err(rollback) = self.vault.clear_key() {
                tracing::warn!(error = %rollback, "failed to roll back cached key");
            }
            return Err(err);
        }

        tracing::debug!("session started");
        Ok(Session {
            token: token.to_string(),
            handle: bind_for_use(secret),
        })
    }

    /// Re-supply the key for an existing sign-in (token present, key missing).
    pub fn unlock(&self, secret: &SecretKey) -> Result<Session> {
        let token = self.vault.load_token()?.ok_or_else(|| {
            DiaryError::NotFound("No active session; sign in first".to_string())
        })?;
        self.begin_session(&token, secret)
    }

    /// Restore custody state, enforcing that the two slots agree.
    pub fn restore(&self) -> Result<RestoredSession> {
        let token = self.vault.load_token()?;
        let key = self.vault.load_key()?;

        match (token, key) {
            (Some(token), Some(encoded)) => match import_from_input(&encoded) {
                Ok(secret) => Ok(RestoredSession::Active(Session {
                    token,
                    handle: bind_for_use(&secret),
                })),
                Err(err) => {
                    tracing::warn!(error = %err, "cached key is unreadable; clearing it");
                    self.vault.clear_key()?;
                    Ok(RestoredSession::NeedsKey { token })
                }
            },
            (Some(token), None) => Ok(RestoredSession::NeedsKey { token }),
            (None, Some(_)) => {
                tracing::warn!("cached key found without a session token; clearing it");
                self.vault.clear_key()?;
                Ok(RestoredSession::SignedOut)
            }
            (None, None) => Ok(RestoredSession::SignedOut),
        }
    }

    /// End a session: release the in-memory key and clear both slots.
    pub fn end_session(&self, mut session: Session) -> Result<()> {
        session.handle.release();
        self.sign_out()
    }

    /// Clear both slots. Both are attempted even if the first fails; the first
    /// error is returned.
    pub fn sign_out(&self) -> Result<()> {
        let key_result = self.vault.clear_key();
        let token_result = self.vault.clear_token();
        tracing::debug!("session cleared");
        key_result.and(token_result)
    }
}
