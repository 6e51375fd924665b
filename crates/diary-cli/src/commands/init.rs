use uuid::Uuid;

use diary_core::crypto::generate_encryption_salt;
use diary_core::SqliteEntryStore;

use crate::app::AppContext;
use crate::cli::InitArgs;
use crate::config::{default_store_path, write_config, DiaryConfig};
use crate::errors::CliError;
use crate::ui::{self, receipt};

pub fn handle_init(ctx: &AppContext, args: &InitArgs) -> anyhow::Result<()> {
    let config_path = ctx.config_path()?;
    if config_path.exists() && !args.force {
        return Err(CliError::invalid_input(format!(
            "Config already exists at {} (use --force to overwrite)",
            config_path.display()
        ))
        .into());
    }
    if args.max_derivations == Some(0) {
        return Err(CliError::invalid_input("--max-derivations must be at least 1").into());
    }

    let store_path = match &ctx.cli().store {
        Some(path) => path.clone(),
        None => default_store_path()?,
    };
    SqliteEntryStore::open(&store_path)?;

    let config = DiaryConfig::new(
        store_path.clone(),
        Uuid::new_v4(),
        generate_encryption_salt()?,
        args.backend,
        args.max_derivations,
    );
    write_config(&config_path, &config)?;
    tracing::info!(config = %config_path.display(), "initialized diary");

    if !ctx.quiet() {
        let ui_ctx = ctx.ui(false);
        ui::print(
            &ui_ctx,
            &receipt(
                &ui_ctx,
                "Diary initialized",
                &[
                    ("Config", config_path.display().to_string()),
                    ("Store", store_path.display().to_string()),
                    ("Session backend", args.backend.to_string()),
                ],
            ),
        );
        ui::print(&ui_ctx, &ui::hint(&ui_ctx, "Run `diary keygen` to create your encryption key."));
    }
    Ok(())
}
