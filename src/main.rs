mod batch;
mod cli;
mod commands;
mod config;
mod delivery;
mod error;
mod identifier;
mod intake;
mod mcp;
mod normalize;
mod page_range;
mod pdf;
mod session;
mod text;
mod word;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.config.init_logging();

    match cli.command {
        Commands::Mcp => {
            mcp::run_server(cli.config).await?;
        }
        Commands::Extract { pages, inputs } => {
            commands::extract::run(&inputs, &pages, &cli.config).await?;
        }
        Commands::Range { start, end, inputs } => {
            commands::range::run(&inputs, &start, &end, &cli.config).await?;
        }
        Commands::TrimLast { inputs } => {
            commands::trim::run(&inputs, &cli.config).await?;
        }
        Commands::Identify { inputs } => {
            commands::identify::run(&inputs).await?;
        }
        Commands::Rename { inputs } => {
            commands::rename::run(&inputs, &cli.config).await?;
        }
    }

    Ok(())
}
