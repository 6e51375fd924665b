//! Application context for the diary CLI.
//!
//! Bundles the parsed arguments with the lazily-loaded config so handlers do
//! not thread config, store and vault through every call.

use std::path::PathBuf;

use once_cell::unsync::OnceCell;
use uuid::Uuid;

use diary_core::{
    DerivationPool, DiaryService, KeyCustodyManager, RestoredSession, Session, SqliteEntryStore,
};

use crate::cli::Cli;
use crate::config::{
    default_session_dir, missing_config_message, read_config, resolve_config_path, DiaryConfig,
};
use crate::errors::CliError;
use crate::security::Vault;
use crate::ui::UiContext;

pub struct AppContext<'a> {
    cli: &'a Cli,
    config: OnceCell<DiaryConfig>,
}

impl<'a> AppContext<'a> {
    pub fn new(cli: &'a Cli) -> Self {
        Self {
            cli,
            config: OnceCell::new(),
        }
    }

    pub fn cli(&self) -> &Cli {
        self.cli
    }

    pub fn quiet(&self) -> bool {
        self.cli.quiet
    }

    /// UI context for this invocation.
    pub fn ui(&self, json: bool) -> UiContext {
        UiContext::from_env(json, self.cli.no_color)
    }

    pub fn config_path(&self) -> anyhow::Result<PathBuf> {
        resolve_config_path(self.cli.config.as_deref())
    }

    /// Load the config, once.
    pub fn config(&self) -> anyhow::Result<&DiaryConfig> {
        self.config.get_or_try_init(|| {
            let path = self.config_path()?;
            if !path.exists() {
                return Err(CliError::not_found(
                    missing_config_message(&path),
                    "Hint: Run `diary init` to create one.",
                )
                .into());
            }
            read_config(&path)
        })
    }

    pub fn owner_id(&self) -> anyhow::Result<Uuid> {
        Ok(self.config()?.account.owner_id)
    }

    /// Store path: `--store` / DIARY_STORE first, then the config.
    pub fn store_path(&self) -> anyhow::Result<PathBuf> {
        if let Some(path) = &self.cli.store {
            return Ok(path.clone());
        }
        Ok(self.config()?.store_path())
    }

    /// Open the entry store and wrap it in a service.
    pub fn open_service(&self) -> anyhow::Result<DiaryService<SqliteEntryStore>> {
        let path = self.store_path()?;
        if !path.exists() {
            return Err(CliError::not_found(
                format!("No diary store at {}", path.display()),
                "Hint: Run `diary init` or pass --store.",
            )
            .into());
        }
        let store = SqliteEntryStore::open(&path)?;
        let pool = match self.config()?.legacy.max_concurrent_derivations {
            Some(limit) => DerivationPool::new(limit),
            None => DerivationPool::with_default_limit(),
        };
        tracing::debug!(store = %path.display(), derivations = pool.limit(), "opened diary store");
        Ok(DiaryService::new(store, pool))
    }

    /// Key custody over the configured session backend.
    pub fn custody(&self) -> anyhow::Result<KeyCustodyManager<Vault>> {
        let config = self.config()?;
        let vault = Vault::open(
            config.session.backend,
            config.account.owner_id,
            default_session_dir()?,
        );
        Ok(KeyCustodyManager::new(vault))
    }

    /// The active session, or an auth error telling the user how to get one.
    pub fn require_session(&self) -> anyhow::Result<Session> {
        match self.custody()?.restore()? {
            RestoredSession::Active(session) => Ok(session),
            RestoredSession::NeedsKey { .. } => Err(CliError::auth_failed_with_hint(
                "Diary is locked",
                "Hint: Run `diary unlock` and enter your backup key.",
            )
            .into()),
            RestoredSession::SignedOut => Err(CliError::auth_failed_with_hint(
                "No active session",
                "Hint: Run `diary unlock` with your backup key, or `diary keygen` to create one.",
            )
            .into()),
        }
    }
}
