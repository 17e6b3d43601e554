use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::core::collect::ListingParser;
use crate::core::{RawProduct, ScrapeError};

static CARD: LazyLock<Selector> = LazyLock::new(|| selector("article.product_pod"));
static TITLE_LINK: LazyLock<Selector> = LazyLock::new(|| selector("h3 a"));
static PRICE: LazyLock<Selector> = LazyLock::new(|| selector("p.price_color"));
static RATING: LazyLock<Selector> = LazyLock::new(|| selector("p.star-rating"));
static AVAILABILITY: LazyLock<Selector> = LazyLock::new(|| selector("p.availability"));

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid CSS selector")
}

/// Listing layout of the books.toscrape.com catalogue.
#[derive(Debug, Clone)]
pub struct BooksCatalog {
    base_url: Url,
}

impl BooksCatalog {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(BooksCatalog { base_url })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }
}

fn element_text(element: ElementRef) -> String {
    element.text().collect::<Vec<_>>().join(" ")
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn parse_card(card: ElementRef, page_url: &Url) -> Result<RawProduct, String> {
    let link = card
        .select(&TITLE_LINK)
        .next()
        .ok_or("missing title link")?;

    let name = link
        .value()
        .attr("title")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| collapse_whitespace(&element_text(link)));
    if name.is_empty() {
        return Err("empty product name".to_string());
    }

    let href = link.value().attr("href").ok_or("missing detail link")?;
    let detail_url = page_url
        .join(href)
        .map_err(|e| format!("invalid detail link '{href}': {e}"))?;

    let price_text = card
        .select(&PRICE)
        .next()
        .map(|p| collapse_whitespace(&element_text(p)))
        .filter(|p| !p.is_empty())
        .ok_or("missing price")?;

    let rating_text = card
        .select(&RATING)
        .next()
        .and_then(|r| r.value().classes().find(|c| *c != "star-rating"))
        .ok_or("missing rating")?
        .to_string();

    let availability_text = card
        .select(&AVAILABILITY)
        .next()
        .map(|a| collapse_whitespace(&element_text(a)))
        .unwrap_or_default();

    Ok(RawProduct {
        name,
        price_text,
        rating_text,
        availability_text,
        detail_url: detail_url.to_string(),
    })
}

impl ListingParser for BooksCatalog {
    fn page_url(&self, page: u32) -> String {
        self.base_url
            .join(&format!("catalogue/page-{page}.html"))
            .map(String::from)
            .unwrap_or_else(|_| format!("{}catalogue/page-{page}.html", self.base_url))
    }

    fn extract_products(
        &self,
        html: &str,
        page_url: &str,
        limit: usize,
    ) -> Result<Vec<RawProduct>, ScrapeError> {
        let parse_error = |reason: &str| ScrapeError::Parse {
            url: page_url.to_string(),
            reason: reason.to_string(),
        };
        let base = Url::parse(page_url).map_err(|e| parse_error(&e.to_string()))?;

        let document = Html::parse_document(html);
        let cards: Vec<ElementRef> = document.select(&CARD).collect();
        if cards.is_empty() {
            return Err(parse_error("no product cards found"));
        }
        debug!(cards = cards.len(), %page_url, "Found product cards");

        let mut products = Vec::new();
        for (index, card) in cards.into_iter().enumerate() {
            if products.len() >= limit {
                break;
            }
            match parse_card(card, &base) {
                Ok(product) => products.push(product),
                Err(reason) => warn!(
                    card = index + 1,
                    %page_url,
                    %reason,
                    "Skipping malformed product card"
                ),
            }
        }

        Ok(products)
    }
}
