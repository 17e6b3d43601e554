pub mod cli;
pub mod core;
pub mod export;
pub mod providers;

use crate::cli::scrape::ScrapeOptions;
use crate::core::config::AppConfig;
use anyhow::Result;
use tracing::{debug, info};

pub enum AppCommand {
    Scrape(ScrapeOptions),
}

pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    match config_path {
        Some(path) => AppConfig::load_from_path(path),
        None => AppConfig::load(),
    }
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("pricescrape starting...");

    let config = load_config(config_path)?;
    debug!("Loaded config: {config:#?}");

    match command {
        AppCommand::Scrape(options) => {
            let report = cli::scrape::run(&config, &options).await?;
            info!(
                products = report.products.len(),
                pages = report.pages_visited,
                "Scrape finished"
            );
            Ok(())
        }
    }
}
