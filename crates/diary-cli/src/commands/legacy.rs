//! Password-protected entries.
//!
//! Each entry is sealed with PBKDF2 + AES-CBC under a password given for that
//! request. Derivations run on the service's bounded pool, so a small tokio
//! runtime is started for the call.

use std::future::Future;

use crate::app::{resolve_entry_id, AppContext};
use crate::cli::{LegacyAddArgs, LegacyCommands, LegacyDecryptArgs};
use crate::helpers::{build_entry, prompt_entry_password, read_content};
use crate::output::{entry_json, entry_lines, summary_json};
use crate::ui::{self, receipt, Spinner};

pub fn handle_legacy(ctx: &AppContext, command: &LegacyCommands) -> anyhow::Result<()> {
    match command {
        LegacyCommands::Add(args) => handle_legacy_add(ctx, args),
        LegacyCommands::Decrypt(args) => handle_legacy_decrypt(ctx, args),
    }
}

fn block_on<F: Future>(future: F) -> anyhow::Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to start runtime: {}", e))?;
    Ok(runtime.block_on(future))
}

fn handle_legacy_add(ctx: &AppContext, args: &LegacyAddArgs) -> anyhow::Result<()> {
    let service = ctx.open_service()?;
    let owner_id = ctx.owner_id()?;

    let content = read_content(args.fields.content.as_deref(), true)?.unwrap_or_default();
    let entry = build_entry(&args.title, content, &args.fields)?;
    let ui_ctx = ctx.ui(args.json);
    let password = prompt_entry_password(ui_ctx.is_interactive(), true)?;

    let spinner = Spinner::start(&ui_ctx, "Encrypting entry...");
    let result = block_on(service.add_protected(owner_id, entry, &password));
    spinner.finish();
    let summary = result??;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary_json(&summary)?)?);
    } else if ctx.quiet() {
        println!("{}", summary.id);
    } else {
        ui::print(
            &ui_ctx,
            &receipt(
                &ui_ctx,
                "Protected entry added",
                &[
                    ("ID", summary.id.to_string()),
                    ("Scheme", summary.scheme.to_string()),
                ],
            ),
        );
    }
    Ok(())
}

fn handle_legacy_decrypt(ctx: &AppContext, args: &LegacyDecryptArgs) -> anyhow::Result<()> {
    let service = ctx.open_service()?;
    let owner_id = ctx.owner_id()?;
    let id = resolve_entry_id(&service, owner_id, &args.id)?;
    let ui_ctx = ctx.ui(args.json);
    let password = prompt_entry_password(ui_ctx.is_interactive(), false)?;

    let spinner = Spinner::start(&ui_ctx, "Decrypting entry...");
    let result = block_on(service.decrypt_protected(owner_id, id, &password));
    spinner.finish();
    let entry = result??;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entry_json(id, &entry)?)?);
    } else {
        ui::print(&ui_ctx, &entry_lines(&ui_ctx, id, &entry).join("\n"));
    }
    Ok(())
}
