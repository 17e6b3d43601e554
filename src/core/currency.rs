//! Supported currencies, the mock exchange-rate table and price conversion

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, warn};

use super::error::UnknownCurrencyError;
use super::product::{ConvertedProduct, Product};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Currency {
    Usd,
    Kes,
    Eur,
    Gbp,
    Jpy,
    Cad,
    Aud,
    Inr,
}

impl Currency {
    pub const ALL: [Currency; 8] = [
        Currency::Usd,
        Currency::Kes,
        Currency::Eur,
        Currency::Gbp,
        Currency::Jpy,
        Currency::Cad,
        Currency::Aud,
        Currency::Inr,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Kes => "KES",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Jpy => "JPY",
            Currency::Cad => "CAD",
            Currency::Aud => "AUD",
            Currency::Inr => "INR",
        }
    }

    /// Comma separated list of every supported code, for prompts and help text.
    pub fn supported_codes() -> String {
        Self::ALL
            .iter()
            .map(Currency::code)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = UnknownCurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_uppercase();
        Self::ALL
            .into_iter()
            .find(|c| c.code() == code)
            .ok_or_else(|| UnknownCurrencyError(s.trim().to_string()))
    }
}

impl TryFrom<String> for Currency {
    type Error = UnknownCurrencyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Currency> for String {
    fn from(value: Currency) -> Self {
        value.code().to_string()
    }
}

/// Static exchange rates, each quoted as units of the currency per one USD.
///
/// These are hand-maintained mock values, not a live feed. The table is built
/// once at startup and only read afterwards.
#[derive(Debug, Clone)]
pub struct ExchangeRateTable {
    per_usd: HashMap<Currency, Decimal>,
}

impl ExchangeRateTable {
    /// The built-in mock table.
    pub fn mock() -> Self {
        Self::from_rates([
            (Currency::Usd, Decimal::ONE),
            (Currency::Kes, Decimal::new(150, 0)),
            (Currency::Eur, Decimal::new(85, 2)),
            (Currency::Gbp, Decimal::new(73, 2)),
            (Currency::Jpy, Decimal::new(110, 0)),
            (Currency::Cad, Decimal::new(125, 2)),
            (Currency::Aud, Decimal::new(135, 2)),
            (Currency::Inr, Decimal::new(75, 0)),
        ])
    }

    /// Builds a table from explicit per-USD rates. Non-positive rates are ignored.
    pub fn from_rates(rates: impl IntoIterator<Item = (Currency, Decimal)>) -> Self {
        let per_usd = rates
            .into_iter()
            .filter(|(currency, rate)| {
                let keep = rate.is_sign_positive() && !rate.is_zero();
                if !keep {
                    warn!(%currency, %rate, "Ignoring non-positive exchange rate");
                }
                keep
            })
            .collect();
        Self { per_usd }
    }

    pub fn contains(&self, currency: Currency) -> bool {
        self.per_usd.contains_key(&currency)
    }

    /// Multiplier that turns an amount in `from` into an amount in `to`.
    pub fn rate(&self, from: Currency, to: Currency) -> Result<Decimal, UnknownCurrencyError> {
        let lookup = |c: Currency| {
            self.per_usd
                .get(&c)
                .copied()
                .ok_or_else(|| UnknownCurrencyError(c.code().to_string()))
        };
        let from_rate = lookup(from)?;
        let to_rate = lookup(to)?;
        if from == to {
            return Ok(Decimal::ONE);
        }
        Ok(to_rate / from_rate)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    #[error(transparent)]
    UnknownCurrency(#[from] UnknownCurrencyError),

    #[error("converted price of '{0}' is out of range")]
    Overflow(String),
}

/// Converts one product into `target`, stamping it with `at`.
pub fn convert(
    product: Product,
    target: Currency,
    rates: &ExchangeRateTable,
    at: DateTime<Utc>,
) -> Result<ConvertedProduct, ConversionError> {
    let rate = rates.rate(product.price_currency, target)?;
    let converted_price = product
        .price
        .checked_mul(rate)
        .ok_or_else(|| ConversionError::Overflow(product.name.clone()))?
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

    Ok(ConvertedProduct {
        product,
        target_currency: target,
        exchange_rate: rate.round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero),
        converted_price,
        converted_at: at,
    })
}

/// Converts a batch with one shared timestamp, dropping records that fail.
pub fn convert_all(
    products: Vec<Product>,
    target: Currency,
    rates: &ExchangeRateTable,
) -> Vec<ConvertedProduct> {
    let at = Utc::now();
    debug!(count = products.len(), %target, "Converting prices");

    products
        .into_iter()
        .filter_map(|product| {
            let name = product.name.clone();
            match convert(product, target, rates, at) {
                Ok(converted) => Some(converted),
                Err(e) => {
                    warn!(product = %name, error = %e, "Dropping product that could not be converted");
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn product(price: &str) -> Product {
        Product {
            name: "A Light in the Attic".to_string(),
            price: Decimal::from_str(price).unwrap(),
            price_currency: Currency::Gbp,
            rating: 3,
            in_stock: true,
            detail_url: "https://books.toscrape.com/catalogue/a-light-in-the-attic_1000/index.html"
                .to_string(),
        }
    }

    #[test]
    fn test_currency_parsing() {
        assert_eq!("KES".parse::<Currency>().unwrap(), Currency::Kes);
        assert_eq!(" usd ".parse::<Currency>().unwrap(), Currency::Usd);
        assert_eq!("Inr".parse::<Currency>().unwrap(), Currency::Inr);

        let err = "XYZ".parse::<Currency>().unwrap_err();
        assert_eq!(err, UnknownCurrencyError("XYZ".to_string()));
        assert!("".parse::<Currency>().is_err());
    }

    #[test]
    fn test_every_code_round_trips() {
        for currency in Currency::ALL {
            assert_eq!(currency.to_string().parse::<Currency>().unwrap(), currency);
        }
        assert_eq!(
            Currency::supported_codes(),
            "USD, KES, EUR, GBP, JPY, CAD, AUD, INR"
        );
    }

    #[test]
    fn test_currency_serde_uses_codes() {
        let json = serde_json::to_string(&Currency::Jpy).unwrap();
        assert_eq!(json, "\"JPY\"");
        let parsed: Currency = serde_json::from_str("\"cad\"").unwrap();
        assert_eq!(parsed, Currency::Cad);
        assert!(serde_json::from_str::<Currency>("\"BTC\"").is_err());
    }

    #[test]
    fn test_mock_table_covers_all_currencies() {
        let table = ExchangeRateTable::mock();
        for currency in Currency::ALL {
            assert!(table.contains(currency), "missing {currency}");
        }
    }

    #[test]
    fn test_cross_rates() {
        let table = ExchangeRateTable::mock();
        assert_eq!(table.rate(Currency::Gbp, Currency::Gbp).unwrap(), Decimal::ONE);
        assert_eq!(
            table.rate(Currency::Usd, Currency::Kes).unwrap(),
            Decimal::new(150, 0)
        );

        let gbp_to_kes = table.rate(Currency::Gbp, Currency::Kes).unwrap();
        assert_eq!(
            gbp_to_kes.round_dp(4),
            Decimal::from_str("205.4795").unwrap()
        );
    }

    #[test]
    fn test_conversion_matches_rate_for_all_currencies() {
        let table = ExchangeRateTable::mock();
        let at = Utc::now();
        for currency in Currency::ALL {
            let price = Decimal::from_str("51.77").unwrap();
            let expected = (price * table.rate(Currency::Gbp, currency).unwrap())
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

            let converted = convert(product("51.77"), currency, &table, at).unwrap();
            assert_eq!(converted.converted_price, expected, "{currency}");
            assert_eq!(converted.target_currency, currency);
            assert_eq!(converted.converted_at, at);
            assert!(converted.converted_price.scale() <= 2);
        }
    }

    #[test]
    fn test_conversion_to_kes() {
        let table = ExchangeRateTable::mock();
        let converted = convert(product("51.77"), Currency::Kes, &table, Utc::now()).unwrap();
        // 51.77 * 150 / 0.73 = 10637.671...
        assert_eq!(converted.converted_price, Decimal::from_str("10637.67").unwrap());
        assert_eq!(converted.exchange_rate, Decimal::from_str("205.4795").unwrap());
    }

    #[test]
    fn test_same_currency_conversion_is_identity() {
        let table = ExchangeRateTable::mock();
        let converted = convert(product("13.99"), Currency::Gbp, &table, Utc::now()).unwrap();
        assert_eq!(converted.converted_price, Decimal::from_str("13.99").unwrap());
        assert_eq!(converted.exchange_rate, Decimal::ONE);
    }

    #[test]
    fn test_missing_rate_is_unknown_currency() {
        let table = ExchangeRateTable::from_rates([
            (Currency::Usd, Decimal::ONE),
            (Currency::Gbp, Decimal::new(73, 2)),
        ]);
        let err = convert(product("10.00"), Currency::Jpy, &table, Utc::now()).unwrap_err();
        assert_eq!(
            err,
            ConversionError::UnknownCurrency(UnknownCurrencyError("JPY".to_string()))
        );
    }

    #[test]
    fn test_non_positive_rates_are_ignored() {
        let table = ExchangeRateTable::from_rates([
            (Currency::Usd, Decimal::ONE),
            (Currency::Eur, Decimal::ZERO),
            (Currency::Cad, Decimal::new(-5, 1)),
        ]);
        assert!(table.contains(Currency::Usd));
        assert!(!table.contains(Currency::Eur));
        assert!(!table.contains(Currency::Cad));
    }

    #[test]
    fn test_convert_all_shares_timestamp_and_drops_failures() {
        let table = ExchangeRateTable::from_rates([
            (Currency::Gbp, Decimal::new(73, 2)),
            (Currency::Eur, Decimal::new(85, 2)),
        ]);
        let mut huge = product("1");
        huge.price = Decimal::MAX;
        let products = vec![product("10.00"), huge, product("20.00")];

        let converted = convert_all(products, Currency::Eur, &table);
        assert_eq!(converted.len(), 2);
        assert_eq!(converted[0].converted_at, converted[1].converted_at);
        assert_eq!(converted[0].converted_price, Decimal::from_str("11.64").unwrap());
        assert_eq!(converted[1].converted_price, Decimal::from_str("23.29").unwrap());
    }
}
