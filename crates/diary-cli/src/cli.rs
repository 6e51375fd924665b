use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use diary_core::VERSION;

use crate::config::SessionBackend;

/// Diary - an end-to-end encrypted personal diary
#[derive(Parser)]
#[command(name = "diary")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the config file
    #[arg(short, long, global = true, env = "DIARY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Path to the entry store (overrides config)
    #[arg(long, global = true, env = "DIARY_STORE")]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose logging to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

/// Arguments for the `init` command
#[derive(Args)]
pub struct InitArgs {
    /// Where the session token and cached key are kept
    #[arg(long, default_value = "keychain")]
    pub backend: SessionBackend,

    /// Concurrent password derivations allowed for protected entries
    #[arg(long)]
    pub max_derivations: Option<usize>,

    /// Overwrite an existing config
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `keygen` command
#[derive(Args)]
pub struct KeygenArgs {
    /// Also write the backup key to this file (mode 0600)
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,
}

/// Arguments for the `unlock` command
#[derive(Args)]
pub struct UnlockArgs {
    /// Session token to bind the key to (defaults to the current one)
    #[arg(long, env = "DIARY_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

/// Arguments for the `status` command
#[derive(Args)]
pub struct StatusArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Entry fields shared by `add` and `edit`
#[derive(Args, Default)]
pub struct EntryFieldArgs {
    /// Entry content (reads stdin when omitted)
    #[arg(long)]
    pub content: Option<String>,

    /// Mood (very_happy, happy, neutral, sad, very_sad, angry, excited, anxious, grateful, stressed)
    #[arg(long)]
    pub mood: Option<String>,

    /// Free-text mood description
    #[arg(long)]
    pub mood_note: Option<String>,

    /// Weather condition (sunny, cloudy, rainy, snowy, stormy, foggy)
    #[arg(long)]
    pub weather: Option<String>,

    /// Temperature in degrees
    #[arg(long, allow_hyphen_values = true)]
    pub temperature: Option<f64>,

    /// Category (personal, work, travel, health, relationships, goals, gratitude, other)
    #[arg(long)]
    pub category: Option<String>,

    /// Add tags to the entry
    #[arg(short, long, value_name = "TAG")]
    pub tag: Vec<String>,

    /// Entry date (ISO-8601 or YYYY-MM-DD)
    #[arg(long)]
    pub date: Option<String>,

    /// Mark as favorite
    #[arg(long)]
    pub favorite: bool,

    /// Mark as not private
    #[arg(long)]
    pub public: bool,

    /// Location name
    #[arg(long)]
    pub location: Option<String>,

    /// Location coordinates as LAT,LON
    #[arg(long, value_name = "LAT,LON", allow_hyphen_values = true)]
    pub coordinates: Option<String>,

    /// Attach an image by URL, optionally with a caption as URL|CAPTION
    #[arg(long, value_name = "URL[|CAPTION]")]
    pub image: Vec<String>,
}

/// Arguments for the `add` command
#[derive(Args)]
pub struct AddArgs {
    /// Entry title
    #[arg(long)]
    pub title: String,

    #[command(flatten)]
    pub fields: EntryFieldArgs,

    /// Output the stored summary as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `edit` command
#[derive(Args)]
pub struct EditArgs {
    /// Entry ID (full UUID or unique prefix)
    #[arg(value_name = "ID")]
    pub id: String,

    /// New title
    #[arg(long)]
    pub title: Option<String>,

    #[command(flatten)]
    pub fields: EntryFieldArgs,
}

/// Arguments for the `list` command
#[derive(Args)]
pub struct ListArgs {
    /// Filter by category
    #[arg(long)]
    pub category: Option<String>,

    /// Only favorites
    #[arg(long)]
    pub favorites: bool,

    /// Start date (ISO-8601)
    #[arg(long)]
    pub since: Option<String>,

    /// End date (ISO-8601)
    #[arg(long)]
    pub until: Option<String>,

    /// Limit number of results
    #[arg(long)]
    pub limit: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `show` command
#[derive(Args)]
pub struct ShowArgs {
    /// Entry ID (full UUID or unique prefix)
    #[arg(value_name = "ID")]
    pub id: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `delete` command
#[derive(Args)]
pub struct DeleteArgs {
    /// Entry ID (full UUID or unique prefix)
    #[arg(value_name = "ID")]
    pub id: String,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for `legacy add`
#[derive(Args)]
pub struct LegacyAddArgs {
    /// Entry title
    #[arg(long)]
    pub title: String,

    #[command(flatten)]
    pub fields: EntryFieldArgs,

    /// Output the stored summary as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `legacy decrypt`
#[derive(Args)]
pub struct LegacyDecryptArgs {
    /// Entry ID (full UUID or unique prefix)
    #[arg(value_name = "ID")]
    pub id: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum LegacyCommands {
    /// Add an entry sealed with a per-entry password
    Add(LegacyAddArgs),

    /// Decrypt a password-protected entry
    Decrypt(LegacyDecryptArgs),
}

/// Arguments for the `completions` command
#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_name = "SHELL")]
    pub shell: Shell,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a config and an empty diary store
    Init(InitArgs),

    /// Generate a new encryption key, start a session, and print the backup key
    Keygen(KeygenArgs),

    /// Re-enter your backup key for the current session
    Unlock(UnlockArgs),

    /// End the session and forget the cached key
    Lock,

    /// Show session and store status
    Status(StatusArgs),

    /// Add a new entry
    Add(AddArgs),

    /// Replace an entry's content and metadata
    Edit(EditArgs),

    /// List entries
    List(ListArgs),

    /// Show a specific entry by ID
    Show(ShowArgs),

    /// Delete an entry
    Delete(DeleteArgs),

    /// Password-protected entries
    #[command(subcommand)]
    Legacy(LegacyCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}
