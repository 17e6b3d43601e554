use anyhow::Result;
use clap::{Parser, Subcommand};
use pricescrape::cli::prompt::parse_count;
use pricescrape::cli::scrape::ScrapeOptions;
use pricescrape::core::Currency;
use pricescrape::core::log::init_logging;
use std::io::IsTerminal;
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    /// Target currency code (USD, KES, EUR, GBP, JPY, CAD, AUD, INR)
    #[arg(long)]
    currency: Option<Currency>,

    /// Number of products to scrape
    #[arg(short = 'n', long, value_parser = parse_count)]
    count: Option<usize>,

    /// Directory for the CSV, JSON and chart files
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Never prompt; unset values come from the config file
    #[arg(long)]
    no_input: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
}

impl Cli {
    fn scrape_options(&self) -> ScrapeOptions {
        ScrapeOptions {
            currency: self.currency,
            count: self.count,
            output_dir: self.output_dir.clone(),
            interactive: !self.no_input && std::io::stdin().is_terminal(),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => pricescrape::cli::setup::setup(),
        None => {
            let command = pricescrape::AppCommand::Scrape(cli.scrape_options());
            pricescrape::run_command(command, cli.config_path.as_deref()).await
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_scrape_flags() {
        let cli = Cli::try_parse_from([
            "pricescrape",
            "--currency",
            "eur",
            "--count",
            "5",
            "--output-dir",
            "out",
            "--no-input",
        ])
        .unwrap();
        let options = cli.scrape_options();
        assert_eq!(options.currency, Some(Currency::Eur));
        assert_eq!(options.count, Some(5));
        assert_eq!(options.output_dir, Some(PathBuf::from("out")));
        assert!(!options.interactive);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_rejects_unknown_currency() {
        assert!(Cli::try_parse_from(["pricescrape", "--currency", "XYZ"]).is_err());
    }

    #[test]
    fn test_rejects_non_positive_count() {
        assert!(Cli::try_parse_from(["pricescrape", "--count", "0"]).is_err());
        assert!(Cli::try_parse_from(["pricescrape", "--count", "-3"]).is_err());
    }

    #[test]
    fn test_setup_subcommand() {
        let cli = Cli::try_parse_from(["pricescrape", "setup"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Setup)));
    }
}
