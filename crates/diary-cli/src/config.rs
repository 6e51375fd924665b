use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::env_vars;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiaryConfig {
    pub store: StoreSection,
    pub account: AccountSection,
    pub session: SessionSection,
    #[serde(default)]
    pub legacy: LegacySection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSection {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSection {
    pub owner_id: Uuid,
    /// Per-user salt kept for future password-derived keys. Not consumed yet.
    pub encryption_salt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSection {
    pub backend: SessionBackend,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LegacySection {
    pub max_concurrent_derivations: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionBackend {
    Keychain,
    File,
}

impl std::str::FromStr for SessionBackend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> anyhow::Result<Self> {
        match value.trim() {
            "keychain" => Ok(Self::Keychain),
            "file" => Ok(Self::File),
            other => Err(anyhow::anyhow!(
                "Invalid session backend: {} (use keychain or file)",
                other
            )),
        }
    }
}

impl std::fmt::Display for SessionBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Keychain => write!(f, "keychain"),
            Self::File => write!(f, "file"),
        }
    }
}

impl DiaryConfig {
    pub fn new(
        store_path: PathBuf,
        owner_id: Uuid,
        encryption_salt: String,
        backend: SessionBackend,
        max_concurrent_derivations: Option<usize>,
    ) -> Self {
        Self {
            store: StoreSection {
                path: store_path.to_string_lossy().to_string(),
            },
            account: AccountSection {
                owner_id,
                encryption_salt,
            },
            session: SessionSection { backend },
            legacy: LegacySection {
                max_concurrent_derivations,
            },
        }
    }

    pub fn store_path(&self) -> PathBuf {
        PathBuf::from(&self.store.path)
    }
}

/// Resolve the config file path, checking DIARY_CONFIG first.
pub fn resolve_config_path(flag: Option<&Path>) -> anyhow::Result<PathBuf> {
    if let Some(path) = flag {
        return Ok(path.to_path_buf());
    }
    if let Ok(value) = std::env::var(env_vars::CONFIG) {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value));
        }
    }
    default_config_path()
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_config_dir()?.join("config.toml"))
}

pub fn default_store_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_data_dir()?.join("diary.sqlite3"))
}

/// Directory for the file session backend.
pub fn default_session_dir() -> anyhow::Result<PathBuf> {
    Ok(xdg_data_dir()?.join("session"))
}

pub fn read_config(path: &Path) -> anyhow::Result<DiaryConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?;
    toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {}", path.display(), e))
}

pub fn write_config(path: &Path, config: &DiaryConfig) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            anyhow::anyhow!(
                "Failed to create config directory {}: {}",
                parent.display(),
                e
            )
        })?;
    }
    let contents =
        toml::to_string_pretty(config).map_err(|e| anyhow::anyhow!("TOML error: {}", e))?;
    std::fs::write(path, contents)
        .map_err(|e| anyhow::anyhow!("Failed to write config {}: {}", path.display(), e))?;
    Ok(())
}

pub fn xdg_config_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_CONFIG_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("diary"));
        }
    }
    Ok(home_dir()?.join(".config").join("diary"))
}

pub fn xdg_data_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_DATA_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("diary"));
        }
    }
    Ok(home_dir()?.join(".local").join("share").join("diary"))
}

fn home_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| anyhow::anyhow!("HOME is not set; cannot resolve default paths"))?;
    Ok(PathBuf::from(home))
}

/// Error message when the config file is missing.
pub fn missing_config_message(config_path: &Path) -> String {
    format!(
        "No diary config found at {}\n\nRun:\n  diary init\n\nOr point at an existing config:\n  DIARY_CONFIG=/path/to/config.toml diary status",
        config_path.display()
    )
}
