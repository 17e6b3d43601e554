use anyhow::{Result, bail};
use console::style;
use std::path::PathBuf;
use tracing::{debug, info};

use super::{prompt, report, ui};
use crate::core::collect::collect_products;
use crate::core::config::AppConfig;
use crate::core::currency::convert_all;
use crate::core::product::normalize_all;
use crate::core::{ConvertedProduct, Currency, ExchangeRateTable, PageFetcher};
use crate::export::{self, ExportOptions, ExportResult};
use crate::providers::{BooksCatalog, HttpFetcher};

/// Run settings supplied on the command line; unset values are prompted for
/// when `interactive` is true and taken from the config otherwise.
#[derive(Debug, Clone, Default)]
pub struct ScrapeOptions {
    pub currency: Option<Currency>,
    pub count: Option<usize>,
    pub output_dir: Option<PathBuf>,
    pub interactive: bool,
}

#[derive(Debug)]
pub struct ScrapeReport {
    pub products: Vec<ConvertedProduct>,
    pub exports: Vec<ExportResult>,
    pub pages_visited: u32,
    pub failed_pages: usize,
    pub dropped_records: usize,
}

fn resolve_settings(config: &AppConfig, options: &ScrapeOptions) -> Result<(Currency, usize)> {
    let currency = match options.currency {
        Some(c) => c,
        None if options.interactive => prompt::prompt_currency(config.currency)?,
        None => config.currency,
    };
    let count = match options.count {
        Some(n) => n,
        None if options.interactive => prompt::prompt_count(config.count)?,
        None => config.count,
    };
    if count == 0 {
        bail!("count must be a positive integer");
    }
    Ok((currency, count))
}

pub async fn run(config: &AppConfig, options: &ScrapeOptions) -> Result<ScrapeReport> {
    let fetcher = HttpFetcher::new(config.scraper.timeout(), &config.scraper.user_agent)?;
    run_with_fetcher(config, options, &fetcher).await
}

/// Drives the whole pipeline: fetch, parse, normalize, convert, report, export.
pub async fn run_with_fetcher(
    config: &AppConfig,
    options: &ScrapeOptions,
    fetcher: &dyn PageFetcher,
) -> Result<ScrapeReport> {
    // Validated before any network traffic
    let (target, count) = resolve_settings(config, options)?;
    let rates = ExchangeRateTable::mock();
    if !rates.contains(target) {
        bail!("No exchange rate available for {target}");
    }
    let catalog = BooksCatalog::new(&config.scraper.base_url)?;

    println!(
        "\nScraping {} products from {}",
        style(count).bold(),
        catalog.base_url()
    );
    println!("Converting prices to {}", style(target).bold());
    info!(%target, count, base_url = catalog.base_url(), "Starting scrape");

    let pb = ui::new_progress_bar(count as u64, true);
    pb.set_message("Fetching listing pages...");
    let collected = collect_products(fetcher, &catalog, count, config.scraper.limits(), &|n: usize| {
        pb.inc(n as u64)
    })
    .await;
    pb.finish_and_clear();

    let raw_count = collected.products.len();
    let products = normalize_all(collected.products);
    let dropped_records = raw_count - products.len();
    debug!(raw_count, valid = products.len(), "Normalized products");

    if products.is_empty() {
        let reason = collected
            .failures
            .last()
            .map(|e| format!(": {e}"))
            .unwrap_or_default();
        bail!(
            "No products could be retrieved from {}{reason}",
            catalog.base_url()
        );
    }

    let converted = convert_all(products, target, &rates);
    if converted.is_empty() {
        bail!("No product prices could be converted to {target}");
    }

    report::display(&converted);

    let output_dir = options
        .output_dir
        .clone()
        .unwrap_or_else(|| config.output.directory());
    let exports = export::export_all(
        &converted,
        &ExportOptions {
            directory: output_dir,
            chart_max_products: config.output.chart_max_products,
            chart_font: config.output.chart_font.as_ref().map(PathBuf::from),
        },
    );

    ui::print_separator();
    print_summary(&converted, &exports, collected.failures.len(), dropped_records);

    Ok(ScrapeReport {
        products: converted,
        exports,
        pages_visited: collected.pages_visited,
        failed_pages: collected.failures.len(),
        dropped_records,
    })
}

fn print_summary(
    products: &[ConvertedProduct],
    exports: &[ExportResult],
    failed_pages: usize,
    dropped_records: usize,
) {
    for result in exports {
        match &result.outcome {
            Ok(path) => println!(
                "{} saved to {}",
                result.artifact.label(),
                style(path.display()).cyan()
            ),
            Err(e) => println!(
                "{}",
                ui::style_text(
                    &format!("{} export failed: {e}", result.artifact.label()),
                    ui::StyleType::Error
                )
            ),
        }
    }

    if failed_pages > 0 || dropped_records > 0 {
        println!(
            "{}",
            ui::style_text(
                &format!("Skipped {failed_pages} page(s) and {dropped_records} malformed record(s)"),
                ui::StyleType::Subtle
            )
        );
    }

    println!(
        "\n{} {}",
        ui::style_text("Products converted:", ui::StyleType::TotalLabel),
        ui::style_text(&products.len().to_string(), ui::StyleType::TotalValue)
    );
}
