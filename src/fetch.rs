//! Page fetching.
//!
//! [`PageSource`] is the seam between the pipeline and the network: the
//! listing walker, detail harvester and image downloader only ever ask it for
//! text or bytes. [`HttpFetcher`] is the real implementation; tests swap in an
//! in-memory source.
//!
//! No timeout, retry or redirect policy is layered on top of `reqwest`'s
//! defaults. A non-success HTTP status is reported as a network error.

use crate::error::{HarvestError, Result};
use scraper::Html;
use tracing::{debug, instrument};

/// Something that can return the body behind a URL.
pub trait PageSource {
    /// Fetch a page body as UTF-8 text.
    async fn fetch_text(&self, url: &str) -> Result<String>;

    /// Fetch raw bytes, e.g. an image.
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>>;

    /// Fetch a page and parse it into a queryable document.
    async fn fetch_document(&self, url: &str) -> Result<Html> {
        let body = self.fetch_text(url).await?;
        Ok(Html::parse_document(&body))
    }
}

/// [`PageSource`] backed by a shared `reqwest` client.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response> {
        let net = |source: reqwest::Error| HarvestError::Network {
            url: url.to_string(),
            source,
        };
        let response = self.client.get(url).send().await.map_err(net)?;
        response.error_for_status().map_err(net)
    }
}

impl PageSource for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch_text(&self, url: &str) -> Result<String> {
        let body = self
            .get(url)
            .await?
            .text()
            .await
            .map_err(|source| HarvestError::Network {
                url: url.to_string(),
                source,
            })?;
        debug!(bytes = body.len(), "Fetched page");
        Ok(body)
    }

    #[instrument(level = "debug", skip(self))]
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let bytes = self
            .get(url)
            .await?
            .bytes()
            .await
            .map_err(|source| HarvestError::Network {
                url: url.to_string(),
                source,
            })?;
        debug!(bytes = bytes.len(), "Fetched bytes");
        Ok(bytes.to_vec())
    }
}
