use diary_core::seal_entry;

use crate::app::AppContext;
use crate::cli::AddArgs;
use crate::helpers::{build_entry, read_content};
use crate::output::summary_json;
use crate::ui::{self, format_datetime, receipt};

pub fn handle_add(ctx: &AppContext, args: &AddArgs) -> anyhow::Result<()> {
    let session = ctx.require_session()?;
    let service = ctx.open_service()?;

    let content = read_content(args.fields.content.as_deref(), true)?.unwrap_or_default();
    let entry = build_entry(&args.title, content, &args.fields)?;
    let sealed = seal_entry(&entry, session.cipher())?;
    let summary = service.add_sealed(ctx.owner_id()?, sealed)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary_json(&summary)?)?);
        return Ok(());
    }
    if ctx.quiet() {
        println!("{}", summary.id);
        return Ok(());
    }
    let ui_ctx = ctx.ui(false);
    ui::print(
        &ui_ctx,
        &receipt(
            &ui_ctx,
            "Entry added",
            &[
                ("ID", summary.id.to_string()),
                (
                    "Date",
                    format_datetime(&summary.metadata.entry_date, ui_ctx.mode.is_pretty()),
                ),
            ],
        ),
    );
    Ok(())
}
