//! Walks listing pages until the requested number of products is gathered

use tracing::{debug, info, instrument, warn};

use super::error::ScrapeError;
use super::fetch::PageFetcher;
use super::product::RawProduct;

/// Knows how a site lays out its listing pages and item cards.
pub trait ListingParser: Send + Sync {
    fn page_url(&self, page: u32) -> String;

    /// Extracts at most `limit` products from one page, in document order.
    fn extract_products(
        &self,
        html: &str,
        page_url: &str,
        limit: usize,
    ) -> Result<Vec<RawProduct>, ScrapeError>;
}

#[derive(Debug, Clone, Copy)]
pub struct CollectLimits {
    pub max_pages: u32,
    pub max_consecutive_failures: u32,
}

impl Default for CollectLimits {
    fn default() -> Self {
        Self {
            max_pages: 50,
            max_consecutive_failures: 3,
        }
    }
}

#[derive(Debug, Default)]
pub struct CollectOutcome {
    pub products: Vec<RawProduct>,
    pub pages_visited: u32,
    pub failures: Vec<ScrapeError>,
}

#[instrument(skip(fetcher, parser, on_progress))]
pub async fn collect_products(
    fetcher: &dyn PageFetcher,
    parser: &dyn ListingParser,
    budget: usize,
    limits: CollectLimits,
    on_progress: &(dyn Fn(usize) + Sync),
) -> CollectOutcome {
    let mut outcome = CollectOutcome::default();
    let mut consecutive_failures = 0;

    for page in 1..=limits.max_pages {
        let remaining = budget.saturating_sub(outcome.products.len());
        if remaining == 0 {
            break;
        }

        let url = parser.page_url(page);
        outcome.pages_visited += 1;
        debug!(page, %url, remaining, "Fetching listing page");

        let result = match fetcher.fetch(&url).await {
            Ok(html) => parser.extract_products(&html, &url, remaining),
            Err(e) if page > 1 && e.is_not_found() => {
                info!(page, %url, "Listing exhausted");
                break;
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(products) => {
                consecutive_failures = 0;
                debug!(page, count = products.len(), "Extracted products");
                on_progress(products.len());
                outcome.products.extend(products);
            }
            Err(e) => {
                warn!(page, url = %e.url(), error = %e, "Could not fetch page {page}; skipping it");
                outcome.failures.push(e);
                consecutive_failures += 1;
                if consecutive_failures >= limits.max_consecutive_failures {
                    warn!(consecutive_failures, "Too many consecutive page failures; stopping");
                    break;
                }
            }
        }
    }

    outcome
}
