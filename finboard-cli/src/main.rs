//! Finboard CLI - your finance dashboard in the terminal

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{auth, bills, dashboard, download, entry, logs, nav, offline, report};
use finboard_core::services::dashboard::DEFAULT_RECENT_LIMIT;
use finboard_core::Direction;

/// Finboard - personal finance dashboard in your terminal
#[derive(Parser)]
#[command(name = "fb", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in
    Login {
        #[arg(long)]
        email: Option<String>,
        /// Prompted for when omitted
        #[arg(long, env = "FINBOARD_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Create an account
    Signup {
        #[arg(long)]
        email: Option<String>,
        #[arg(long, env = "FINBOARD_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Sign out and forget the stored session
    Logout,

    /// Show the signed-in identity and its privileges
    Whoami {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the navigation menu
    Nav {
        /// Page path to mark active (e.g. /reports)
        #[arg(long)]
        current: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the dashboard
    Dashboard {
        /// Number of recent transactions to show
        #[arg(short, long, default_value_t = DEFAULT_RECENT_LIMIT)]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add income or list income types
    Income {
        #[command(subcommand)]
        command: entry::EntryCommands,
    },

    /// Add an expense or list expense types
    Expense {
        #[command(subcommand)]
        command: entry::EntryCommands,
    },

    /// Show category and monthly totals
    Report {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export transactions to a file
    Download {
        /// Export format (csv, json)
        #[arg(long, default_value = "csv")]
        format: String,
        /// First date to include (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,
        /// Last date to include (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
        /// Directory to write into (defaults to the current directory)
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Upload and list bill receipts
    Bills {
        #[command(subcommand)]
        command: bills::BillsCommands,
    },

    /// Manage offline mode
    Offline {
        #[command(subcommand)]
        command: Option<offline::OfflineCommands>,
    },

    /// View and manage application logs
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("FINBOARD_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = run(cli).await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Login { email, password } => auth::run_login(email, password).await,
        Commands::Signup { email, password } => auth::run_signup(email, password).await,
        Commands::Logout => auth::run_logout().await,
        Commands::Whoami { json } => auth::run_whoami(json).await,
        Commands::Nav { current, json } => nav::run(current, json).await,
        Commands::Dashboard { limit, json } => dashboard::run(limit, json).await,
        Commands::Income { command } => entry::run(Direction::Income, command).await,
        Commands::Expense { command } => entry::run(Direction::Expense, command).await,
        Commands::Report { json } => report::run(json).await,
        Commands::Download { format, from, to, out, json } => {
            download::run(format, from, to, out, json).await
        }
        Commands::Bills { command } => bills::run(command).await,
        Commands::Offline { command } => offline::run(command).await,
        Commands::Logs { command } => logs::run(command),
    }
}
