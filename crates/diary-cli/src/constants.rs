//! Constants used throughout the CLI.

/// Exit codes for the CLI.
///
/// These follow common Unix conventions:
/// - 0: Success
/// - 1: General error (used by anyhow for unhandled errors)
/// - 2: Misuse of shell command (reserved by shells)
/// - 3+: Application-specific errors
pub mod exit_codes {
    /// Resource not found (config, store, entry).
    pub const NOT_FOUND: i32 = 3;

    /// Invalid user input or arguments.
    pub const INVALID_INPUT: i32 = 4;

    /// Wrong key, wrong password, or no key available.
    pub const AUTH_FAILED: i32 = 5;

    /// Ciphertext could not be decrypted (corrupted or wrong key).
    pub const DECRYPT_FAILED: i32 = 6;
}

/// Environment variables read by the CLI.
pub mod env_vars {
    pub const CONFIG: &str = "DIARY_CONFIG";
    pub const STORE: &str = "DIARY_STORE";
    pub const KEY: &str = "DIARY_KEY";
    pub const TOKEN: &str = "DIARY_TOKEN";
    pub const ENTRY_PASSWORD: &str = "DIARY_ENTRY_PASSWORD";
    pub const LOG: &str = "DIARY_LOG";
}

/// Keychain service name for the session slots.
pub const KEYCHAIN_SERVICE: &str = "diary";

/// Default number of entries shown by `list`.
pub const DEFAULT_LIST_LIMIT: usize = 20;
