mod cli;
mod commands;
mod config;
mod logging;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use publish_logging::publish_info;

use crate::cli::{Cli, Command};
use crate::config::{load_config, save_config, AppConfig};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    if let Command::InitConfig = cli.command {
        logging::initialize(
            logging::LogDestination::Terminal,
            logging::level_for_verbosity(cli.verbose),
        );
        if cli.config.exists() {
            anyhow::bail!("{} already exists", cli.config.display());
        }
        save_config(&cli.config, &AppConfig::default())?;
        println!("Wrote {}", cli.config.display());
        return Ok(ExitCode::SUCCESS);
    }

    let mut config = load_config(&cli.config)?;
    logging::initialize(
        config.log_destination,
        logging::level_for_verbosity(cli.verbose),
    );
    publish_info!("Loaded config from {:?}", cli.config);

    if let Some(project) = cli.project {
        config.project_id = Some(project);
    }
    if let Some(api) = cli.api {
        config.api_base_url = api;
    }

    match cli.command {
        Command::Publish => commands::publish(&config).await,
        Command::Status => commands::status(&config).await,
        Command::History => commands::history(&config).await,
        Command::MakeLive { publish_id } => commands::make_live(&config, &publish_id).await,
        Command::Url {
            base_url,
            slug,
            home,
        } => commands::page_url(&base_url, &slug, home),
        Command::InitConfig => Ok(ExitCode::SUCCESS),
    }
}
