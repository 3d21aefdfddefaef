use clap::Parser;
use tracing_subscriber::EnvFilter;

use telegraft::cli::commands::inject::InjectCommand;
use telegraft::cli::commands::scan::ScanCommand;
use telegraft::cli::{Cli, Commands};
use telegraft::Result;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Inject {
            target,
            config,
            variant,
            dry_run,
            json,
        } => {
            let command = InjectCommand::new(target, config, variant, dry_run, json);
            command.execute().await?;
        }
        Commands::Scan {
            target,
            config,
            json,
        } => {
            let command = ScanCommand::new(target, config, json);
            command.execute().await?;
        }
    }

    Ok(())
}
