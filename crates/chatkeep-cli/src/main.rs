use anyhow::Result;
use chatkeep_core::session::{ExportFormat, MessageRole};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

use commands::AppContext;

#[derive(Parser)]
#[command(name = "chatkeep")]
#[command(about = "chatkeep - conversation persistence and vector memory", long_about = None)]
struct Cli {
    /// Configuration file (default: platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Session directory, overriding the configuration file
    #[arg(long, global = true)]
    save_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage saved sessions
    Sessions {
        #[command(subcommand)]
        action: SessionsAction,
    },
    /// Record a conversation from stdin (`user: ...` / `assistant: ...` lines)
    Record {
        /// Continue a saved session instead of starting a new one
        #[arg(long)]
        resume: Option<String>,

        /// Do not save the session on exit
        #[arg(long)]
        no_autosave: bool,
    },
    /// Manage the vector memory store
    Memory {
        #[command(subcommand)]
        action: MemoryAction,
    },
    /// Inspect or create the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum SessionsAction {
    /// List saved sessions, newest first
    List,
    /// Print the most recently modified session name
    Latest,
    /// Print a session transcript
    Show { name: String },
    /// Delete a saved session
    Delete { name: String },
    /// Write a timestamped backup of a session
    Backup { name: String },
    /// List backups, newest first
    Backups,
    /// Restore a backup over its session file
    Restore { file: String },
    /// Print conversation statistics
    Stats { name: String },
    /// Search a session's messages
    Search {
        name: String,
        query: String,

        /// Only messages from this role (user or assistant)
        #[arg(long)]
        role: Option<MessageRole>,

        #[arg(long)]
        case_sensitive: bool,

        /// Match whole message content
        #[arg(long)]
        exact: bool,

        /// Only messages at or after this RFC3339 instant
        #[arg(long)]
        from: Option<DateTime<Utc>>,

        /// Only messages at or before this RFC3339 instant
        #[arg(long)]
        to: Option<DateTime<Utc>>,
    },
    /// Export a session to json, markdown, text or csv
    Export {
        name: String,

        #[arg(long, default_value = "json")]
        format: ExportFormat,

        /// Output file (relative paths land in the session directory)
        #[arg(long)]
        output: Option<String>,
    },
}

#[derive(Subcommand)]
enum MemoryAction {
    /// Print record count, dimension and size
    Stats,
    /// Print one record
    Get { id: String },
    /// Delete one record
    Delete { id: String },
    /// Delete every record
    Clear,
    /// Insert or replace a record
    Put {
        id: String,

        /// Comma-separated embedding, e.g. 0.1,0.2,0.3
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true, required = true)]
        vector: Vec<f32>,

        /// Metadata entry as key=value (repeatable)
        #[arg(long = "meta", value_parser = commands::memory::parse_key_value)]
        meta: Vec<(String, String)>,
    },
    /// Find the records most similar to a vector
    Search {
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true, required = true)]
        vector: Vec<f32>,

        /// Number of results
        #[arg(short, default_value_t = 5)]
        k: usize,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the configuration file path
    Path,
    /// Print the effective configuration
    Show,
    /// Write a default configuration file if none exists
    Init,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let ctx = AppContext::load(cli.config, cli.save_dir).await?;

    match cli.command {
        Commands::Sessions { action } => match action {
            SessionsAction::List => commands::sessions::list(&ctx).await?,
            SessionsAction::Latest => commands::sessions::latest(&ctx).await?,
            SessionsAction::Show { name } => commands::sessions::show(&ctx, &name).await?,
            SessionsAction::Delete { name } => commands::sessions::delete(&ctx, &name).await?,
            SessionsAction::Backup { name } => commands::sessions::backup(&ctx, &name).await?,
            SessionsAction::Backups => commands::sessions::backups(&ctx).await?,
            SessionsAction::Restore { file } => commands::sessions::restore(&ctx, &file).await?,
            SessionsAction::Stats { name } => commands::sessions::stats(&ctx, &name).await?,
            SessionsAction::Search {
                name,
                query,
                role,
                case_sensitive,
                exact,
                from,
                to,
            } => {
                let options = chatkeep_core::session::SearchOptions {
                    role,
                    case_sensitive,
                    exact_match: exact,
                    from_date: from,
                    to_date: to,
                };
                commands::sessions::search(&ctx, &name, &query, &options).await?
            }
            SessionsAction::Export {
                name,
                format,
                output,
            } => commands::sessions::export(&ctx, &name, format, output.as_deref()).await?,
        },
        Commands::Record {
            resume,
            no_autosave,
        } => commands::record::run(&ctx, resume.as_deref(), no_autosave).await?,
        Commands::Memory { action } => match action {
            MemoryAction::Stats => commands::memory::stats(&ctx).await?,
            MemoryAction::Get { id } => commands::memory::get(&ctx, &id).await?,
            MemoryAction::Delete { id } => commands::memory::delete(&ctx, &id).await?,
            MemoryAction::Clear => commands::memory::clear(&ctx).await?,
            MemoryAction::Put { id, vector, meta } => {
                commands::memory::put(&ctx, &id, vector, meta).await?
            }
            MemoryAction::Search { vector, k } => {
                commands::memory::search(&ctx, &vector, k).await?
            }
        },
        Commands::Config { action } => match action {
            ConfigAction::Path => commands::config::path(&ctx),
            ConfigAction::Show => commands::config::show(&ctx)?,
            ConfigAction::Init => commands::config::init(&ctx).await?,
        },
    }

    Ok(())
}
