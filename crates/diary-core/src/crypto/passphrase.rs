//! Encryption password validation.

use crate::error::{DiaryError, Result};

/// Validate an encryption password before it is used to seal content.
///
/// The legacy server path only requires a password to be present; anything
/// non-blank is accepted so existing passwords keep working.
pub fn validate_password(password: &str) -> Result<()> {
    if password.trim().is_empty() {
        return Err(DiaryError::Validation(
            "Password is required for encrypting diary content".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_password() {
        assert!(validate_password("correct-horse").is_ok());
        assert!(validate_password("x").is_ok());
    }

    #[test]
    fn test_blank_password_rejected() {
        assert!(validate_password("").is_err());
        assert!(validate_password("   ").is_err());
        assert!(validate_password("\n\t")
            .unwrap_err()
            .to_string()
            .contains("Password is required"));
    }
}
