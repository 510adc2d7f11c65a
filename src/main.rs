use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod cli;
mod config;
mod error;
mod output;
mod provider;
mod runner;
mod synthesis;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing - only show logs with --verbose
    let filter = if cli.verbose {
        EnvFilter::new("techscout=debug")
    } else {
        EnvFilter::new("techscout=warn")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    match cli.command {
        Commands::Research(args) => cli::research::execute(args).await,
        Commands::Schema => cli::schema::execute(),
    }
}
