//! Scraped product records and their normalization into typed fields

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::warn;

use super::currency::Currency;
use super::error::ValidationError;

/// Product fields exactly as they appear on a listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawProduct {
    pub name: String,
    pub price_text: String,
    pub rating_text: String,
    pub availability_text: String,
    pub detail_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub name: String,
    pub price: Decimal,
    /// Listing prices are always quoted in pounds sterling.
    pub price_currency: Currency,
    pub rating: u8,
    pub in_stock: bool,
    pub detail_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConvertedProduct {
    pub product: Product,
    pub target_currency: Currency,
    pub exchange_rate: Decimal,
    pub converted_price: Decimal,
    pub converted_at: DateTime<Utc>,
}

impl ConvertedProduct {
    pub fn availability_label(&self) -> &'static str {
        if self.product.in_stock {
            "In stock"
        } else {
            "Out of stock"
        }
    }
}

/// Parses a currency-prefixed price such as `£51.77`.
pub fn parse_price(text: &str) -> Result<Decimal, ValidationError> {
    let numeral = text
        .trim()
        .trim_start_matches(|c: char| !(c.is_ascii_digit() || matches!(c, '+' | '-' | '.')))
        .trim();

    let price =
        Decimal::from_str(numeral).map_err(|_| ValidationError::Price(text.to_string()))?;
    if price.is_sign_negative() && !price.is_zero() {
        return Err(ValidationError::NegativePrice(text.to_string()));
    }
    Ok(price)
}

/// Maps the word-form star rating used in listing markup to 1..=5.
pub fn parse_rating(text: &str) -> Result<u8, ValidationError> {
    match text.trim() {
        "One" => Ok(1),
        "Two" => Ok(2),
        "Three" => Ok(3),
        "Four" => Ok(4),
        "Five" => Ok(5),
        _ => Err(ValidationError::Rating(text.to_string())),
    }
}

pub fn parse_availability(text: &str) -> bool {
    text.to_lowercase().contains("in stock")
}

impl TryFrom<RawProduct> for Product {
    type Error = ValidationError;

    fn try_from(raw: RawProduct) -> Result<Self, Self::Error> {
        Ok(Product {
            price: parse_price(&raw.price_text)?,
            price_currency: Currency::Gbp,
            rating: parse_rating(&raw.rating_text)?,
            in_stock: parse_availability(&raw.availability_text),
            name: raw.name,
            detail_url: raw.detail_url,
        })
    }
}

/// Shortens `name` to `max_chars` characters, marking the cut with `...`.
pub fn truncate_name(name: &str, max_chars: usize) -> String {
    if name.chars().count() <= max_chars {
        return name.to_string();
    }
    let kept: String = name.chars().take(max_chars).collect();
    format!("{}...", kept.trim_end())
}

/// Normalizes a batch, dropping (and logging) records with malformed fields.
pub fn normalize_all(raw: Vec<RawProduct>) -> Vec<Product> {
    raw.into_iter()
        .filter_map(|raw| {
            let name = raw.name.clone();
            let url = raw.detail_url.clone();
            Product::try_from(raw)
                .inspect_err(|e| warn!(product = %name, %url, error = %e, "Dropping malformed product"))
                .ok()
        })
        .collect()
}
