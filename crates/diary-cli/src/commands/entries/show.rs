use diary_core::open_entry;

use crate::app::{resolve_entry_id, AppContext};
use crate::cli::ShowArgs;
use crate::output::{entry_json, entry_lines};
use crate::ui;

pub fn handle_show(ctx: &AppContext, args: &ShowArgs) -> anyhow::Result<()> {
    let session = ctx.require_session()?;
    let service = ctx.open_service()?;
    let owner_id = ctx.owner_id()?;
    let id = resolve_entry_id(&service, owner_id, &args.id)?;

    let document = service.get_sealed(owner_id, id)?;
    let entry = open_entry(&document.body, session.cipher())?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entry_json(id, &entry)?)?);
    } else {
        let ui_ctx = ctx.ui(false);
        ui::print(&ui_ctx, &entry_lines(&ui_ctx, id, &entry).join("\n"));
    }
    Ok(())
}
