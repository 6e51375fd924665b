use diary_core::entry::Category;
use diary_core::open_listed;
use diary_core::storage::EntryFilter;

use crate::app::AppContext;
use crate::cli::ListArgs;
use crate::constants::DEFAULT_LIST_LIMIT;
use crate::helpers::parse_datetime;
use crate::output::{list_rows, views_json, LIST_COLUMNS};
use crate::ui::{self, badge, simple_table, Badge};

pub fn handle_list(ctx: &AppContext, args: &ListArgs) -> anyhow::Result<()> {
    let session = ctx.require_session()?;
    let service = ctx.open_service()?;

    let filter = EntryFilter {
        category: args
            .category
            .as_deref()
            .map(str::parse::<Category>)
            .transpose()?,
        favorites_only: args.favorites,
        since: args.since.as_deref().map(parse_datetime).transpose()?,
        until: args.until.as_deref().map(parse_datetime).transpose()?,
        limit: Some(args.limit.unwrap_or(DEFAULT_LIST_LIMIT)),
    };

    let documents = service.list_sealed(ctx.owner_id()?, &filter)?;
    let views = open_listed(&documents, session.cipher())?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&views_json(&views)?)?);
        return Ok(());
    }

    let ui_ctx = ctx.ui(false);
    if views.is_empty() {
        if !ctx.quiet() {
            ui::print(&ui_ctx, &badge(&ui_ctx, Badge::Info, "No entries found."));
        }
        return Ok(());
    }

    ui::print(&ui_ctx, &simple_table(&ui_ctx, &LIST_COLUMNS, &list_rows(&ui_ctx, &views)));

    let failed = views.iter().filter(|v| !v.is_decrypted()).count();
    if failed > 0 && !ctx.quiet() {
        eprintln!(
            "{}",
            badge(
                &ui_ctx,
                Badge::Warn,
                &format!("{} of {} entries could not be decrypted with the unlocked key.", failed, views.len()),
            )
        );
    }
    Ok(())
}
