//! Prompts for secrets and entry content.

use std::io::{self, IsTerminal, Read};
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

use dialoguer::{Confirm, Password};
use zeroize::Zeroizing;

use crate::constants::env_vars;
use crate::errors::CliError;
use crate::security::write_private;

fn env_secret(name: &str) -> Option<Zeroizing<String>> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(Zeroizing::new)
}

/// Prompt for the backup key, or read it from DIARY_KEY.
pub fn prompt_secret_key(interactive: bool) -> anyhow::Result<Zeroizing<String>> {
    if let Some(value) = env_secret(env_vars::KEY) {
        return Ok(value);
    }
    if !interactive {
        return Err(CliError::auth_failed_with_hint(
            "No backup key provided and no TTY available",
            format!("Hint: Set {} to your base64 backup key.", env_vars::KEY),
        )
        .into());
    }
    Password::new()
        .with_prompt("Backup key")
        .interact()
        .map(Zeroizing::new)
        .map_err(|e| anyhow::anyhow!("Failed to read backup key: {}", e))
}

/// Prompt for a per-entry encryption password, or read it from
/// DIARY_ENTRY_PASSWORD. New passwords are asked twice.
pub fn prompt_entry_password(
    interactive: bool,
    confirm_new: bool,
) -> anyhow::Result<Zeroizing<String>> {
    if let Some(value) = env_secret(env_vars::ENTRY_PASSWORD) {
        return Ok(value);
    }
    if !interactive {
        return Err(CliError::invalid_input(format!(
            "No entry password provided and no TTY available. Set {}.",
            env_vars::ENTRY_PASSWORD
        ))
        .into());
    }
    let mut prompt = Password::new().with_prompt("Entry password");
    if confirm_new {
        prompt = prompt.with_confirmation("Confirm entry password", "Passwords do not match");
    }
    prompt
        .interact()
        .map(Zeroizing::new)
        .map_err(|e| anyhow::anyhow!("Failed to read entry password: {}", e))
}

/// Ask a yes/no question. Defaults to no.
pub fn confirm(prompt: &str) -> anyhow::Result<bool> {
    Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| anyhow::anyhow!("Failed to read confirmation: {}", e))
}

/// Read entry content from the flag, piped stdin, or $EDITOR.
///
/// Returns `None` when nothing was supplied and `required` is false.
pub fn read_content(flag: Option<&str>, required: bool) -> anyhow::Result<Option<String>> {
    if let Some(value) = flag {
        if value.trim().is_empty() {
            return Err(CliError::invalid_input("--content cannot be empty").into());
        }
        return Ok(Some(value.to_string()));
    }

    if !io::stdin().is_terminal() {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| anyhow::anyhow!("Failed to read stdin: {}", e))?;
        let trimmed = buffer.trim_end().to_string();
        if !trimmed.is_empty() {
            return Ok(Some(trimmed));
        }
        if required {
            return Err(CliError::invalid_input(
                "No content provided. Use --content or pipe text on stdin.",
            )
            .into());
        }
        return Ok(None);
    }

    if !required {
        return Ok(None);
    }
    read_content_from_editor().map(Some)
}

/// Open $EDITOR on a private temp file.
fn read_content_from_editor() -> anyhow::Result<String> {
    let editor = std::env::var("EDITOR").map_err(|_| {
        CliError::invalid_input("$EDITOR is not set; use --content or pipe content via stdin")
    })?;

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| anyhow::anyhow!("System time error: {}", e))?
        .as_nanos();
    let filename = format!("diary_entry_{}_{}.md", std::process::id(), nanos);
    let path = std::env::temp_dir().join(filename);

    write_private(&path, b"").map_err(|e| anyhow::anyhow!("Failed to create temp file: {}", e))?;

    let status = Command::new(editor).arg(&path).status();
    let contents = std::fs::read_to_string(&path);
    if let Err(err) = std::fs::remove_file(&path) {
        tracing::warn!(path = %path.display(), error = %err, "failed to remove editor temp file");
    }

    let status = status.map_err(|e| anyhow::anyhow!("Failed to launch editor: {}", e))?;
    if !status.success() {
        return Err(anyhow::anyhow!("Editor exited with failure"));
    }
    let contents = contents.map_err(|e| anyhow::anyhow!("Failed to read temp file: {}", e))?;

    let trimmed = contents.trim_end().to_string();
    if trimmed.is_empty() {
        return Err(CliError::invalid_input("Entry content is empty").into());
    }
    Ok(trimmed)
}
