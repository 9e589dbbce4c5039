//! Paanj Admin - command-line administration for the Paanj chat platform.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use console::Style;

mod commands;

use commands::{conversations, users, watch};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Paanj Admin - manage chat users, conversations and events
#[derive(Parser)]
#[command(name = "paanj-admin")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Config file (default: <config dir>/paanj/admin.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// API base URL
    #[arg(long, global = true, env = "PAANJ_API_URL")]
    pub api_url: Option<String>,

    /// Admin secret key
    #[arg(long, global = true, env = "PAANJ_SECRET_KEY", hide_env_values = true)]
    pub secret_key: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// User management
    Users(users::UsersArgs),

    /// Conversation management
    Conversations(conversations::ConversationsArgs),

    /// Stream live events until interrupted
    Watch(watch::WatchArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "paanj_admin=debug,paanj_chat_admin=debug,paanj_admin_cli=debug,info"
    } else {
        "paanj_admin=info,paanj_chat_admin=info,paanj_admin_cli=info,warn"
    };

    // Logs go to stderr so --json output stays parseable.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_target(cli.verbose)
        .with_writer(std::io::stderr)
        .init();

    let config = commands::load_config(cli.config.as_deref(), cli.api_url, cli.secret_key)?;
    let ctx = commands::Context::new(&config, cli.json, cli.verbose)?;

    let result = match cli.command {
        Commands::Users(args) => users::run(args, &ctx).await,
        Commands::Conversations(args) => conversations::run(args, &ctx).await,
        Commands::Watch(args) => watch::run(args, &ctx).await,
    };

    if let Err(e) = result {
        let red = Style::new().red();
        eprintln!("{} {:#}", red.apply_to("Error:"), e);
        std::process::exit(1);
    }
    Ok(())
}
