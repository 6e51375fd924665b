//! Key and session commands: keygen, unlock, lock, status.

use diary_core::crypto::{export_for_backup, generate_secret, import_from_input};
use diary_core::storage::{EntryFilter, Listed};
use diary_core::{open_entry, RestoredSession, Session, SessionVault};

use crate::app::AppContext;
use crate::cli::{KeygenArgs, StatusArgs, UnlockArgs};
use crate::errors::CliError;
use crate::helpers::prompt_secret_key;
use crate::security::{generate_session_token, write_private, Vault};
use crate::ui::{self, badge, kv, receipt, Badge};

/// Current token, or a fresh one when signed out.
fn session_token(vault: &Vault, explicit: Option<&str>) -> anyhow::Result<String> {
    if let Some(token) = explicit.filter(|t| !t.trim().is_empty()) {
        return Ok(token.to_string());
    }
    match vault.load_token()? {
        Some(token) => Ok(token),
        None => generate_session_token(),
    }
}

pub fn handle_keygen(ctx: &AppContext, args: &KeygenArgs) -> anyhow::Result<()> {
    let custody = ctx.custody()?;
    if let RestoredSession::Active(_) = custody.restore()? {
        return Err(CliError::invalid_input(
            "A key is already unlocked. Entries written with it would become unreadable under a new key. Run `diary lock` first if you really want a new key.",
        )
        .into());
    }

    let secret = generate_secret()?;
    let token = session_token(custody.vault(), None)?;
    custody.begin_session(&token, &secret)?;
    let backup = export_for_backup(&secret);

    if let Some(path) = &args.out {
        write_private(path, backup.as_bytes())
            .map_err(|e| anyhow::anyhow!("Failed to write key to {}: {}", path.display(), e))?;
    }
    tracing::info!("generated new encryption key");

    let ui_ctx = ctx.ui(false);
    if ctx.quiet() {
        println!("{}", backup.as_str());
        return Ok(());
    }
    ui::print(
        &ui_ctx,
        &receipt(&ui_ctx, "Key generated and unlocked", &[("Backup key", backup.as_str().to_string())]),
    );
    if let Some(path) = &args.out {
        ui::print(&ui_ctx, &kv(&ui_ctx, "Written to", &path.display().to_string()));
    }
    ui::print(
        &ui_ctx,
        &badge(
            &ui_ctx,
            Badge::Warn,
            "Store this key somewhere safe. It is the only way to read your entries on another device.",
        ),
    );
    Ok(())
}

pub fn handle_unlock(ctx: &AppContext, args: &UnlockArgs) -> anyhow::Result<()> {
    let ui_ctx = ctx.ui(false);
    let input = prompt_secret_key(ui_ctx.is_interactive())?;
    let secret = import_from_input(&input)?;

    let custody = ctx.custody()?;
    let token = session_token(custody.vault(), args.token.as_deref())?;
    let session = custody.begin_session(&token, &secret)?;

    let key_matches = newest_entry_opens(ctx, &session);

    if !ctx.quiet() {
        ui::print(&ui_ctx, &badge(&ui_ctx, Badge::Ok, "Diary unlocked"));
        if !key_matches {
            ui::print(
                &ui_ctx,
                &badge(
                    &ui_ctx,
                    Badge::Warn,
                    "This key does not open your newest entry. Run `diary lock` and unlock with the right key.",
                ),
            );
        }
    }
    Ok(())
}

/// Try the unlocked key on the newest entry so a mistyped key is noticed now.
///
/// Best effort: the session is already saved, so a store that cannot be read
/// is logged and treated as a match.
fn newest_entry_opens(ctx: &AppContext, session: &Session) -> bool {
    let newest = ctx.open_service().and_then(|service| {
        let owner_id = ctx.owner_id()?;
        Ok(service.list_sealed(owner_id, &EntryFilter::default().with_limit(1))?)
    });
    let newest = match newest {
        Ok(newest) => newest,
        Err(err) => {
            tracing::warn!(error = %err, "could not read the store to check the unlocked key");
            return true;
        }
    };

    match newest.first() {
        Some(Listed::Readable(doc)) => match open_entry(&doc.body, session.cipher()) {
            Err(err) if err.is_decrypt_failure() => {
                tracing::warn!(entry_id = %doc.id, "unlocked key does not open the newest entry");
                false
            }
            _ => true,
        },
        Some(Listed::Unreadable(entry)) => {
            tracing::warn!(entry_id = %entry.id, "newest entry is unreadable; key not checked");
            true
        }
        None => true,
    }
}

pub fn handle_lock(ctx: &AppContext) -> anyhow::Result<()> {
    let custody = ctx.custody()?;
    match custody.restore()? {
        RestoredSession::Active(session) => custody.end_session(session)?,
        RestoredSession::NeedsKey { .. } | RestoredSession::SignedOut => custody.sign_out()?,
    }
    tracing::info!("session ended");
    if !ctx.quiet() {
        let ui_ctx = ctx.ui(false);
        ui::print(&ui_ctx, &badge(&ui_ctx, Badge::Locked, "Diary locked."));
    }
    Ok(())
}

pub fn handle_status(ctx: &AppContext, args: &StatusArgs) -> anyhow::Result<()> {
    let ui_ctx = ctx.ui(args.json);
    let config = ctx.config()?;
    let config_path = ctx.config_path()?;
    let store_path = ctx.store_path()?;

    let state = match ctx.custody()?.restore()? {
        RestoredSession::Active(_) => "unlocked",
        RestoredSession::NeedsKey { .. } => "locked",
        RestoredSession::SignedOut => "signed_out",
    };
    let entry_count = match ctx.open_service() {
        Ok(service) => Some(
            service
                .list_sealed(config.account.owner_id, &EntryFilter::default())?
                .len(),
        ),
        Err(_) => None,
    };

    if args.json {
        let output = serde_json::json!({
            "config": config_path,
            "store": store_path,
            "store_exists": entry_count.is_some(),
            "session_backend": config.session.backend.to_string(),
            "session": state,
            "entries": entry_count,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let mut lines = vec![ui::header(&ui_ctx, "status", None)];
    lines.push(kv(&ui_ctx, "Config", &config_path.display().to_string()));
    lines.push(kv(&ui_ctx, "Store", &store_path.display().to_string()));
    lines.push(kv(&ui_ctx, "Session backend", &config.session.backend.to_string()));
    lines.push(kv(&ui_ctx, "Session", state));
    lines.push(kv(
        &ui_ctx,
        "Entries",
        &entry_count.map_or_else(|| "store missing".to_string(), |n| n.to_string()),
    ));
    ui::print(&ui_ctx, &lines.join("\n"));
    Ok(())
}
