use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

mod cli;
mod ui;
mod version;

use cli::CliHandler;
use version::CURRENT_VERSION;

#[derive(Parser)]
#[command(
    name = "techfeed",
    about = "Personalized tech-news feed in your terminal",
    long_about = "techfeed - Personalized tech-news feed in your terminal

OVERVIEW:
  Browse the latest tech articles filtered by the keywords you follow.
  Sessions refresh themselves; when the server ends one you are signed out
  and asked to log in again.

QUICK START:
  techfeed login                        # Start a guest session
  techfeed keywords list                # Show available keywords
  techfeed keywords select 1,4,7        # Follow keywords
  techfeed keywords recommend 리액트:React  # Suggest a new keyword
  techfeed feed                         # Read the latest posts
  techfeed status                       # Check the current session",
    version = CURRENT_VERSION,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Use a different config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start a guest session
    Login,

    /// End the current session
    Logout,

    /// Show session status
    #[command(aliases = &["st"])]
    Status,

    /// Read the latest posts
    Feed(FeedArgs),

    /// List or select keywords
    #[command(aliases = &["kw"])]
    Keywords(KeywordsArgs),

    /// Configure settings
    #[command(aliases = &["cfg"])]
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct FeedArgs {
    #[arg(short, long, default_value_t = 0)]
    pub page: u32,

    #[arg(short, long, default_value_t = 30)]
    pub size: u32,

    /// Comma-separated keyword ids; defaults to the saved selection
    #[arg(short, long, value_delimiter = ',')]
    pub keywords: Vec<i64>,
}

#[derive(Args)]
pub struct KeywordsArgs {
    #[command(subcommand)]
    pub command: KeywordsCommand,
}

#[derive(Subcommand)]
pub enum KeywordsCommand {
    #[command(aliases = &["ls"])]
    List,
    /// Follow keywords; guests save locally, signed-in users on the account (empty to clear)
    Select {
        #[arg(value_delimiter = ',')]
        ids: Vec<i64>,
    },
    /// Suggest new keywords, each as KO:EN (either side may be empty)
    #[command(aliases = &["rec"])]
    Recommend {
        #[arg(required = true)]
        entries: Vec<String>,
    },
}

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    Show,
    SetEndpoint { url: String },
    SetTimeout { seconds: u64 },
    SetVerbose { enabled: String },
    Reset,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(format!("techfeed={}", log_level))
        .with_target(false);
    subscriber.init();

    let mut handler = CliHandler::with_config_path(cli.config);

    if let Err(e) = handler.execute(cli.command).await {
        if !cli::already_reported(&e) {
            eprintln!("Error: {}", e);
        }
        std::process::exit(1);
    }
}
