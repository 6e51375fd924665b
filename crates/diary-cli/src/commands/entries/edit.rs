use diary_core::{open_entry, seal_entry};

use crate::app::{resolve_entry_id, AppContext};
use crate::cli::EditArgs;
use crate::helpers::{apply_field_args, read_content};
use crate::ui::{self, receipt};

/// Re-seal every field of an entry with the edits applied.
pub fn handle_edit(ctx: &AppContext, args: &EditArgs) -> anyhow::Result<()> {
    let session = ctx.require_session()?;
    let service = ctx.open_service()?;
    let owner_id = ctx.owner_id()?;
    let id = resolve_entry_id(&service, owner_id, &args.id)?;

    let document = service.get_sealed(owner_id, id)?;
    let mut entry = open_entry(&document.body, session.cipher())?;

    if let Some(title) = &args.title {
        entry.title = title.clone();
    }
    if let Some(content) = read_content(args.fields.content.as_deref(), false)? {
        entry.content = content;
    }
    let entry = apply_field_args(entry, &args.fields)?;

    let sealed = seal_entry(&entry, session.cipher())?;
    let summary = service.update_sealed(owner_id, id, sealed)?;

    if !ctx.quiet() {
        let ui_ctx = ctx.ui(false);
        ui::print(
            &ui_ctx,
            &receipt(&ui_ctx, "Entry updated", &[("ID", summary.id.to_string())]),
        );
    }
    Ok(())
}
