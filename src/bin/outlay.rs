//! outlay: an offline-first expense ledger CLI
//!
//! Records expenses and categories against a remote service, keeps working
//! while offline (reads fall back to the cached snapshot, writes are queued
//! and replayed on reconnect), and exports monthly CSV reports.
//!
//! ## Example Usage
//!
//! ```bash
//! # Sign in (session persists under the data dir)
//! outlay login --email me@example.com --password secret
//!
//! # Record an expense, attaching a receipt
//! outlay expense add --title "team lunch" --amount 42.50 --receipt lunch.jpg
//!
//! # List one month
//! outlay expense list --month 2024-02
//!
//! # Export the monthly report
//! outlay export --month 2024-02
//!
//! # Replay anything queued while offline
//! outlay sync
//!
//! # Follow remote changes and reconnections
//! outlay watch
//! ```
//!
//! Service endpoint and API key come from `OUTLAY_ENDPOINT` and
//! `OUTLAY_API_KEY`.

use anyhow::Result;
use clap::{Parser, Subcommand};

mod outlay_cli;

use outlay_cli::{
    auth::{self, LoginCmd},
    category::CategoryCmd,
    expense::ExpenseCmd,
    export::ExportCmd,
    store::StoreCmd,
    sync,
    watch::WatchCmd,
    AppContext,
};

#[derive(Parser)]
#[command(
    name = "outlay",
    author,
    version,
    about = "Offline-first expense ledger",
    long_about = "Record expenses and categories against a remote service.\n\n\
                  Works offline: reads fall back to the last cached snapshot and writes\n\
                  are queued locally, then replayed in order when connectivity returns."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Data directory for the local store and session (defaults to the
    /// platform data dir)
    #[arg(long, global = true)]
    data_dir: Option<std::path::PathBuf>,

    /// Verbose output (debug-level logging)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with email and password
    Login(LoginCmd),

    /// Sign out and clear the local session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Manage spending categories
    Category(CategoryCmd),

    /// Record, list, and delete expenses
    Expense(ExpenseCmd),

    /// Export a monthly CSV report
    Export(ExportCmd),

    /// Replay the pending offline queue now
    Sync,

    /// Follow remote changes and replay the queue on reconnect
    Watch(WatchCmd),

    /// Inspect the local store regions
    Store(StoreCmd),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Login(cmd) => cmd.run(&AppContext::init(cli.data_dir)?),
        Commands::Logout => auth::logout(&AppContext::init(cli.data_dir)?),
        Commands::Whoami => auth::whoami(&AppContext::init(cli.data_dir)?),
        Commands::Category(cmd) => cmd.run(&AppContext::init(cli.data_dir)?),
        Commands::Expense(cmd) => cmd.run(&AppContext::init(cli.data_dir)?),
        Commands::Export(cmd) => cmd.run(&AppContext::init(cli.data_dir)?),
        Commands::Sync => sync::run(&AppContext::init(cli.data_dir)?),
        Commands::Watch(cmd) => cmd.run(AppContext::init(cli.data_dir)?),
        // Store introspection needs no gateway config.
        Commands::Store(cmd) => cmd.run(cli.data_dir),
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}
