use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::core::{PageFetcher, ScrapeError};

/// Fetches pages over HTTP with a single attempt per page.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(HttpFetcher { client })
    }
}

fn network_error(url: &str, err: reqwest::Error) -> ScrapeError {
    let message = if err.is_timeout() {
        format!("request timed out ({err})")
    } else {
        err.to_string()
    };
    ScrapeError::Network {
        url: url.to_string(),
        message,
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    #[instrument(name = "PageFetch", skip(self))]
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| network_error(url, e))?;

        let status = response.status();
        debug!(%status, "Received response");
        if status.is_client_error() || status.is_server_error() {
            return Err(ScrapeError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| network_error(url, e))
    }
}
