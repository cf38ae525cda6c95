use anyhow::{Context, Result};
use clap::Parser;

mod cli;
mod commands;

use promgraph::{config, init_tracing};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = cli::Cli::parse();

    // Dispatch to appropriate command handler
    match args.get_command() {
        cli::Commands::Graph { series } => {
            let cfg = config::load_config(&args.config, &args.overrides())?;
            let _guard = init_tracing(&cfg.log.level, cfg.log.target(true))?;
            commands::graph::execute(&cfg, series).await?;
        }
        cli::Commands::List { json } => {
            let cfg = config::load_config(&args.config, &args.overrides())?;
            let _guard = init_tracing(&cfg.log.level, cfg.log.target(false))?;
            commands::list::execute(&cfg, json).await?;
        }
        cli::Commands::Config { action } => {
            let cfg = config::load_config(&args.config, &args.overrides())
                .with_context(|| format!("Invalid configuration in {}", args.config.display()))?;
            let _guard = init_tracing(&cfg.log.level, cfg.log.target(false))?;
            match action {
                cli::ConfigCommands::Show => commands::config::show(&args.config, &cfg)?,
                cli::ConfigCommands::Validate => commands::config::validate(&args.config, &cfg)?,
            }
        }
        cli::Commands::Version => {
            println!("promgraph v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
