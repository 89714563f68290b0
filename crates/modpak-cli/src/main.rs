//! modpak CLI entry point

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use modpak_cli::cmd;
use modpak_cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let quiet = cli.quiet;

    match cli.command {
        Commands::Pack {
            source,
            output,
            compression,
        } => cmd::pack::pack(&source, output.as_deref(), &compression, quiet),
        Commands::Unpack { container, output } => {
            cmd::unpack::unpack(&container, output.as_deref(), quiet)
        }
        Commands::Info { container, files } => cmd::info::info(&container, files),
        Commands::Validate { containers } => cmd::validate::validate(&containers),
        Commands::Resolve { dir, host_version } => {
            cmd::resolve::resolve(&dir, host_version.as_ref())
        }
        Commands::CheckUpdates { dir } => cmd::check_updates::check_updates(&dir).await,
    }
}
