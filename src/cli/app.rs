use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Telegraft: build-time auto-instrumentation for HTTP clients
#[derive(Parser)]
#[command(name = "telegraft")]
#[command(version = "0.1.0")]
#[command(about = "Build-time auto-instrumentation for HTTP clients")]
#[command(
    long_about = "Telegraft rewrites HTTP-client-builder construction sites in a target \
                  project so each constructed client registers a composite telemetry observer."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rewrite construction sites in the target project
    Inject {
        /// Root directory of the target project
        #[arg(short, long)]
        target: PathBuf,

        /// Configuration file (defaults to telegraft.toml in the target)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Build variant to gate injection on
        #[arg(long)]
        variant: Option<String>,

        /// Report what would change without writing anything
        #[arg(long)]
        dry_run: bool,

        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List construction sites without rewriting
    Scan {
        /// Root directory of the target project
        #[arg(short, long)]
        target: PathBuf,

        /// Configuration file (defaults to telegraft.toml in the target)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Emit the site list as JSON
        #[arg(long)]
        json: bool,
    },
}
