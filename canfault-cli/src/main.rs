//! canfault -- CAN bus fault injection command-line tool

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use clap::Parser;

use canfault_core::config::GeneralConfig;

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::output::OutputWriter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        use colored::Colorize;
        eprintln!("{} {e}", "error:".red().bold());
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let writer = OutputWriter::new(cli.output);

    // `config` reports configuration problems itself, so it must not fail on load.
    if let Commands::Config(args) = cli.command {
        let mut general = GeneralConfig::default();
        if let Some(level) = cli.log_level {
            general.log_level = level;
        }
        logging::init_tracing(&general).map_err(|e| CliError::Config(e.to_string()))?;
        return commands::config::execute(args, cli.config.as_deref(), &writer).await;
    }

    let mut config = commands::load_config(cli.config.as_deref()).await?;
    if let Some(level) = cli.log_level {
        config.general.log_level = level;
        config.validate()?;
    }
    logging::init_tracing(&config.general).map_err(|e| CliError::Config(e.to_string()))?;
    tracing::debug!(channel = %config.transport.channel, "canfault starting");

    match cli.command {
        Commands::Inject(args) => commands::inject::execute(args, &config, &writer).await,
        Commands::Campaign(args) => commands::campaign::execute(args, &config, &writer).await,
        Commands::Validate(args) => commands::validate::execute(args, &config, &writer).await,
        Commands::Config(_) => Ok(()),
    }
}
