use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "vowarc-cli", version, about = "VowArc CLI")]
struct Cli {
    /// SQLite database path (defaults to the configured one)
    #[arg(long, global = true, env = "VOWARC_DATABASE")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Small Wins metrics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// User provisioning and phase changes
    User {
        #[command(subcommand)]
        action: commands::user::UserAction,
    },
    /// Record check-ins, evidence and commitments
    Activity {
        #[command(subcommand)]
        action: commands::activity::ActivityAction,
    },
    /// Day 21 Commitment Report
    Report {
        #[command(subcommand)]
        action: commands::report::ReportAction,
    },
    /// Extracted memories
    Memory {
        #[command(subcommand)]
        action: commands::memory::MemoryAction,
    },
}

fn main() {
    let cli = Cli::parse();
    let db = cli.db.as_deref();
    let result = match cli.command {
        Commands::Config { action } => commands::config::run(action),
        Commands::Stats { action } => commands::stats::run(action, db),
        Commands::User { action } => commands::user::run(action, db),
        Commands::Activity { action } => commands::activity::run(action, db),
        Commands::Report { action } => commands::report::run(action, db),
        Commands::Memory { action } => commands::memory::run(action, db),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
