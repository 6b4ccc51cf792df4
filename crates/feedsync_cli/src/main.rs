//! feedsync CLI
//!
//! Command-line tools for feedsync post caches.
//!
//! # Commands
//!
//! - `inspect` - Display cache statistics and log contents
//! - `export` - Write the cached posts as JSON
//! - `compact` - Rewrite the post log to reclaim space

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// feedsync command-line cache tools.
#[derive(Parser)]
#[command(name = "feedsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the cache directory
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display cache statistics and log contents
    Inspect {
        /// List the cached posts
        #[arg(long)]
        posts: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Write the cached posts as a JSON array
    Export {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Rewrite the post log with one record per post
    Compact {
        /// Dry run - show what would be done
        #[arg(short, long)]
        dry_run: bool,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Inspect { posts, format } => {
            let path = cli.path.ok_or("Cache path required for inspect")?;
            commands::inspect::run(&path, posts, &format)?;
        }
        Commands::Export { output } => {
            let path = cli.path.ok_or("Cache path required for export")?;
            commands::export::run(&path, output.as_deref())?;
        }
        Commands::Compact { dry_run } => {
            let path = cli.path.ok_or("Cache path required for compact")?;
            commands::compact::run(&path, dry_run)?;
        }
        Commands::Version => {
            println!("feedsync CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("post log format v{}", feedsync_core::LOG_VERSION);
        }
    }

    Ok(())
}
