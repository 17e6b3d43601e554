//! Error taxonomy shared by the scraping pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Failure to obtain usable listing content for a single page.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// No response was received (connect failure, timeout, broken body).
    #[error("network error fetching {url}: {message}")]
    Network { url: String, message: String },

    /// A response arrived with a status code of 400 or above.
    #[error("HTTP {status} fetching {url}")]
    HttpStatus { url: String, status: u16 },

    /// The page was fetched but has no recognizable item cards.
    #[error("could not parse listing page {url}: {reason}")]
    Parse { url: String, reason: String },
}

impl ScrapeError {
    pub fn url(&self) -> &str {
        match self {
            ScrapeError::Network { url, .. }
            | ScrapeError::HttpStatus { url, .. }
            | ScrapeError::Parse { url, .. } => url,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ScrapeError::HttpStatus { status: 404, .. })
    }
}

/// A single field of a scraped record could not be coerced to its typed form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid price text '{0}'")]
    Price(String),

    #[error("negative price '{0}'")]
    NegativePrice(String),

    #[error("unrecognized rating '{0}'")]
    Rating(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported currency '{0}'")]
pub struct UnknownCurrencyError(pub String);

/// One export artifact could not be written.
#[derive(Debug, Error)]
#[error("failed to write {}: {source}", .path.display())]
pub struct FileWriteError {
    pub path: PathBuf,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

impl FileWriteError {
    pub fn new(
        path: impl Into<PathBuf>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            path: path.into(),
            source: source.into(),
        }
    }
}
