//! Diary CLI - an end-to-end encrypted personal diary
//!
//! Entries are sealed on this machine with a key only you hold; the store only
//! ever sees ciphertext and clear metadata.

mod app;
mod cli;
mod commands;
mod config;
mod constants;
mod errors;
mod helpers;
mod output;
mod security;
mod ui;

use clap::Parser;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use app::AppContext;
use cli::{Cli, Commands};
use constants::env_vars;
use errors::{classify, CliError};

/// Logs go to stderr so they never mix with command output.
fn init_tracing(cli: &Cli) {
    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(env_vars::LOG)
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(!cli.no_color),
        )
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let ctx = AppContext::new(cli);
    match &cli.command {
        Commands::Init(args) => commands::init::handle_init(&ctx, args),
        Commands::Keygen(args) => commands::session::handle_keygen(&ctx, args),
        Commands::Unlock(args) => commands::session::handle_unlock(&ctx, args),
        Commands::Lock => commands::session::handle_lock(&ctx),
        Commands::Status(args) => commands::session::handle_status(&ctx, args),
        Commands::Add(args) => commands::entries::handle_add(&ctx, args),
        Commands::Edit(args) => commands::entries::handle_edit(&ctx, args),
        Commands::List(args) => commands::entries::handle_list(&ctx, args),
        Commands::Show(args) => commands::entries::handle_show(&ctx, args),
        Commands::Delete(args) => commands::entries::handle_delete(&ctx, args),
        Commands::Legacy(command) => commands::legacy::handle_legacy(&ctx, command),
        Commands::Completions(args) => commands::misc::handle_completions(args),
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli);

    if let Err(err) = run(&cli) {
        let err: CliError = classify(err);
        tracing::debug!(code = err.exit_code(), "command failed");
        let ui_ctx = ui::UiContext::from_env(false, cli.no_color);
        let (message, hint) = err.parts();
        ui::print_error(&ui_ctx, message, hint);
        std::process::exit(err.exit_code());
    }
}
