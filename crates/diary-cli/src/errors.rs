//! CLI error types for structured error handling.
//!
//! This module provides typed errors that map to specific exit codes,
//! enabling consistent error handling across the CLI.

use std::fmt;

use diary_core::DiaryError;

/// CLI-specific errors with associated exit codes.
#[derive(Debug)]
pub enum CliError {
    /// Resource not found (config, store, entry)
    NotFound { message: String, hint: String },

    /// Wrong key or password, or no key unlocked
    AuthFailed {
        message: String,
        hint: Option<String>,
    },

    /// Ciphertext could not be opened
    DecryptFailed { message: String, hint: String },

    /// Invalid user input
    InvalidInput(String),

    /// Anything else (storage, I/O, keychain)
    Other(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::NotFound { message, hint } | CliError::DecryptFailed { message, hint } => {
                write!(f, "{}\n{}", message, hint)
            }
            CliError::AuthFailed { message, hint } => {
                if let Some(h) = hint {
                    write!(f, "{}\n{}", message, h)
                } else {
                    write!(f, "{}", message)
                }
            }
            CliError::InvalidInput(message) | CliError::Other(message) => {
                write!(f, "{}", message)
            }
        }
    }
}

impl std::error::Error for CliError {}

impl CliError {
    /// Create a NotFound error with message and hint.
    pub fn not_found(message: impl Into<String>, hint: impl Into<String>) -> Self {
        CliError::NotFound {
            message: message.into(),
            hint: hint.into(),
        }
    }

    /// Create an AuthFailed error with message and optional hint.
    pub fn auth_failed(message: impl Into<String>) -> Self {
        CliError::AuthFailed {
            message: message.into(),
            hint: None,
        }
    }

    /// Create an AuthFailed error with message and hint.
    pub fn auth_failed_with_hint(message: impl Into<String>, hint: impl Into<String>) -> Self {
        CliError::AuthFailed {
            message: message.into(),
            hint: Some(hint.into()),
        }
    }

    /// Create an InvalidInput error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        CliError::InvalidInput(message.into())
    }

    /// Message and optional hint (without its "Hint:" label), for rendering
    /// them separately.
    pub fn parts(&self) -> (&str, Option<&str>) {
        fn bare(hint: &str) -> &str {
            hint.strip_prefix("Hint: ").unwrap_or(hint)
        }
        match self {
            CliError::NotFound { message, hint } | CliError::DecryptFailed { message, hint } => {
                (message.as_str(), Some(bare(hint)))
            }
            CliError::AuthFailed { message, hint } => (message.as_str(), hint.as_deref().map(bare)),
            CliError::InvalidInput(message) | CliError::Other(message) => (message.as_str(), None),
        }
    }

    /// Get the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        use super::constants::exit_codes;
        match self {
            CliError::NotFound { .. } => exit_codes::NOT_FOUND,
            CliError::AuthFailed { .. } => exit_codes::AUTH_FAILED,
            CliError::DecryptFailed { .. } => exit_codes::DECRYPT_FAILED,
            CliError::InvalidInput(_) => exit_codes::INVALID_INPUT,
            CliError::Other(_) => 1,
        }
    }
}

impl From<DiaryError> for CliError {
    fn from(err: DiaryError) -> Self {
        let message = err.to_string();
        match err {
            DiaryError::NotFound(_) => {
                CliError::not_found(message, "Hint: Run `diary list` to find entry IDs.")
            }
            DiaryError::KeyUnavailable => CliError::auth_failed_with_hint(
                message,
                "Hint: Run `diary unlock` and enter your backup key.",
            ),
            DiaryError::MalformedSecret(_) => CliError::auth_failed_with_hint(
                message,
                "Hint: Paste the base64 key exactly as shown by `diary keygen`.",
            ),
            DiaryError::WrongPassword => CliError::auth_failed(message),
            DiaryError::AuthenticationFailed
            | DiaryError::DecryptionFailed
            | DiaryError::MalformedCiphertext(_) => CliError::DecryptFailed {
                message,
                hint: "Hint: Check that the unlocked key (or password) is the one the entry was written with."
                    .to_string(),
            },
            DiaryError::Validation(_) => CliError::invalid_input(message),
            DiaryError::Crypto(_)
            | DiaryError::Storage(_)
            | DiaryError::Sqlite { .. }
            | DiaryError::Io { .. }
            | DiaryError::Json { .. } => CliError::Other(message),
        }
    }
}

/// Turn whatever a command returned into a `CliError`.
///
/// Errors that carry no known failure become `Other` and exit with code 1.
pub fn classify(err: anyhow::Error) -> CliError {
    let err = match err.downcast::<CliError>() {
        Ok(cli) => return cli,
        Err(err) => err,
    };
    match err.downcast::<DiaryError>() {
        Ok(diary) => CliError::from(diary),
        Err(err) => CliError::Other(format!("{:#}", err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::exit_codes;

    #[test]
    fn test_exit_codes_for_core_errors() {
        let cases = [
            (DiaryError::NotFound("x".into()), exit_codes::NOT_FOUND),
            (DiaryError::Validation("x".into()), exit_codes::INVALID_INPUT),
            (DiaryError::WrongPassword, exit_codes::AUTH_FAILED),
            (DiaryError::KeyUnavailable, exit_codes::AUTH_FAILED),
            (DiaryError::AuthenticationFailed, exit_codes::DECRYPT_FAILED),
            (DiaryError::DecryptionFailed, exit_codes::DECRYPT_FAILED),
        ];
        for (err, code) in cases {
            assert_eq!(CliError::from(err).exit_code(), code);
        }
    }

    #[test]
    fn test_classify_through_anyhow() {
        let err = anyhow::Error::new(DiaryError::WrongPassword);
        assert_eq!(classify(err).exit_code(), exit_codes::AUTH_FAILED);

        let err = anyhow::Error::new(CliError::invalid_input("bad"));
        assert_eq!(classify(err).exit_code(), exit_codes::INVALID_INPUT);

        let err = anyhow::anyhow!("something else");
        assert_eq!(classify(err).exit_code(), 1);

        let err = anyhow::Error::new(DiaryError::Storage("disk".into()));
        assert_eq!(classify(err).exit_code(), 1);
    }

    #[test]
    fn test_parts_split_message_and_hint() {
        let err = CliError::not_found("Entry not found", "Hint: look elsewhere");
        assert_eq!(err.parts(), ("Entry not found", Some("look elsewhere")));
        assert_eq!(CliError::invalid_input("bad").parts(), ("bad", None));
    }

    #[test]
    fn test_hint_is_part_of_message() {
        let err = CliError::from(DiaryError::KeyUnavailable);
        assert!(err.to_string().contains("diary unlock"));
    }
}
