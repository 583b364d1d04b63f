//! licsync CLI
//!
//! Edits the device license list kept in a GitHub gist, with a local cache
//! for offline use.
//!
//! # Commands
//!
//! - `list` - Show all entries with their expiry status
//! - `search` - Find entries by device hash
//! - `add` / `edit` / `delete` - Change entries and save them to the gist
//! - `refresh` - Check the gist for changes made elsewhere
//! - `reload` - Discard local state and load the gist
//! - `export` - Write the list in the gist text format
//! - `watch` - Poll the gist until interrupted
//! - `config` - Manage the token and stored preferences

mod commands;

use clap::{Args, Parser, Subcommand, ValueEnum};
use commands::Context;
use licsync_sync_engine::{
    ConflictPolicy, DataSource, DEFAULT_FILE_NAME, DEFAULT_GIST_ID, DEFAULT_RAW_URL,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Gist-backed license list editor.
#[derive(Parser)]
#[command(name = "licsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the local store file
    #[arg(global = true, short, long, env = "LICSYNC_STORE")]
    store: Option<PathBuf>,

    /// Gist holding the license file
    #[arg(global = true, long, env = "LICSYNC_GIST_ID", default_value = DEFAULT_GIST_ID)]
    gist_id: String,

    /// Name of the license file inside the gist
    #[arg(global = true, long, env = "LICSYNC_FILE_NAME", default_value = DEFAULT_FILE_NAME)]
    file_name: String,

    /// Raw URL the license file is read from
    #[arg(global = true, long, env = "LICSYNC_RAW_URL", default_value = DEFAULT_RAW_URL)]
    raw_url: String,

    /// GitHub API base URL
    #[arg(global = true, long, env = "LICSYNC_API_URL")]
    api_url: Option<String>,

    /// Request timeout in seconds
    #[arg(global = true, long, env = "LICSYNC_TIMEOUT", default_value = "30")]
    timeout: u64,

    /// Keep unsaved local edits when the gist changes underneath
    #[arg(global = true, long)]
    keep_local: bool,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Field values for `add` and `edit`.
#[derive(Args, Debug, Default)]
struct FieldArgs {
    /// Device hash
    #[arg(long)]
    hash: Option<String>,

    /// User name
    #[arg(short, long)]
    user: Option<String>,

    /// Expiry as "YYYY-MM-DD HH:MM"
    #[arg(short, long, conflicts_with = "expires_in_days")]
    expiry: Option<String>,

    /// Expiry as a number of days from now
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=30))]
    expires_in_days: Option<u32>,
}

impl From<FieldArgs> for commands::records::FieldValues {
    fn from(args: FieldArgs) -> Self {
        Self {
            device_hash: args.hash,
            user: args.user,
            expiry: args.expiry,
            expires_in_days: args.expires_in_days,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show all entries
    List {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Find entries by device hash
    Search {
        /// Device hash to look for
        hash: String,
    },

    /// Add an entry and save
    Add {
        #[command(flatten)]
        fields: FieldArgs,
    },

    /// Change an entry and save
    Edit {
        /// Index shown by `list`
        index: usize,

        #[command(flatten)]
        fields: FieldArgs,
    },

    /// Delete an entry and save
    Delete {
        /// Index shown by `list`
        index: usize,
    },

    /// Check the gist for changes
    Refresh,

    /// Load the gist, replacing the local list
    Reload,

    /// Write the list in the gist text format
    Export {
        /// Output file, or "-" for stdout
        #[arg(default_value = "-")]
        output: String,
    },

    /// Poll the gist until Ctrl-C
    Watch {
        /// Minutes between checks (defaults to the stored interval)
        #[arg(short, long)]
        interval: Option<u32>,
    },

    /// Manage the token and stored preferences
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show stored preferences
    Show,

    /// Store the GitHub token used for saving
    SetToken {
        /// Personal access token with gist scope
        #[arg(env = "LICSYNC_TOKEN", hide_env_values = true)]
        token: String,
    },

    /// Forget the stored token
    ClearToken,

    /// Choose where startup data comes from
    Source {
        /// remote or cache
        source: SourceArg,
    },

    /// Turn periodic checks on or off
    AutoPoll {
        /// on or off
        state: Toggle,
    },

    /// Set minutes between periodic checks
    Interval {
        /// Minutes, at least 1
        minutes: u32,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SourceArg {
    Remote,
    Cache,
}

impl From<SourceArg> for DataSource {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Remote => DataSource::Remote,
            SourceArg::Cache => DataSource::Cache,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Toggle {
    On,
    Off,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let policy = if cli.keep_local {
        ConflictPolicy::KeepLocal
    } else {
        ConflictPolicy::RemoteWins
    };
    let ctx = Context {
        store_path: cli.store.unwrap_or_else(commands::default_store_path),
        gist_id: cli.gist_id,
        file_name: cli.file_name,
        raw_url: cli.raw_url,
        api_url: cli.api_url,
        timeout_secs: cli.timeout,
        conflict_policy: policy,
    };

    match cli.command {
        Commands::List { format } => commands::records::list(&ctx, &format).await?,
        Commands::Search { hash } => commands::records::search(&ctx, &hash).await?,
        Commands::Add { fields } => commands::records::add(&ctx, fields.into()).await?,
        Commands::Edit { index, fields } => {
            commands::records::edit(&ctx, index, fields.into()).await?
        }
        Commands::Delete { index } => commands::records::delete(&ctx, index).await?,
        Commands::Refresh => commands::sync::refresh(&ctx).await?,
        Commands::Reload => commands::sync::reload(&ctx).await?,
        Commands::Export { output } => commands::sync::export(&ctx, &output).await?,
        Commands::Watch { interval } => commands::watch::run(&ctx, interval).await?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show(&ctx)?,
            ConfigAction::SetToken { token } => commands::config::set_token(&ctx, &token)?,
            ConfigAction::ClearToken => commands::config::clear_token(&ctx)?,
            ConfigAction::Source { source } => commands::config::source(&ctx, source.into())?,
            ConfigAction::AutoPoll { state } => {
                commands::config::auto_poll(&ctx, matches!(state, Toggle::On))?
            }
            ConfigAction::Interval { minutes } => commands::config::interval(&ctx, minutes)?,
        },
    }

    Ok(())
}
