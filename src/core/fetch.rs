//! Page fetching abstraction

use async_trait::async_trait;

use super::error::ScrapeError;

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches one page and returns its body as text.
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError>;
}
