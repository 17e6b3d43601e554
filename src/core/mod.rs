//! Core business logic abstractions

pub mod collect;
pub mod config;
pub mod currency;
pub mod error;
pub mod fetch;
pub mod log;
pub mod product;

// Re-export main types for cleaner imports
pub use currency::{ConversionError, Currency, ExchangeRateTable};
pub use error::{FileWriteError, ScrapeError, UnknownCurrencyError, ValidationError};
pub use fetch::PageFetcher;
pub use product::{ConvertedProduct, Product, RawProduct};
