use crate::app::{resolve_entry_id, AppContext};
use crate::cli::DeleteArgs;
use crate::errors::CliError;
use crate::helpers::confirm;
use crate::ui::{self, badge, short_id, Badge};

/// Deleting needs no key: the row goes away whole.
pub fn handle_delete(ctx: &AppContext, args: &DeleteArgs) -> anyhow::Result<()> {
    let service = ctx.open_service()?;
    let owner_id = ctx.owner_id()?;
    let id = resolve_entry_id(&service, owner_id, &args.id)?;

    if !args.yes {
        if !ctx.ui(false).is_interactive() {
            return Err(
                CliError::invalid_input("Refusing to delete without --yes when not interactive").into(),
            );
        }
        if !confirm(&format!("Delete entry {}?", short_id(&id)))? {
            return Ok(());
        }
    }

    service.delete(owner_id, id)?;
    tracing::info!(entry_id = %id, "deleted entry");
    if !ctx.quiet() {
        let ui_ctx = ctx.ui(false);
        ui::print(&ui_ctx, &badge(&ui_ctx, Badge::Ok, &format!("Deleted {}", id)));
    }
    Ok(())
}
