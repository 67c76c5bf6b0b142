use crate::scrapers::types::PageResponse;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

/// Common trait for all promo code sources
/// A source only knows where its page lives and how to pull codes out of it
#[async_trait]
pub trait CodeSource: Send + Sync {
    /// Get the name of the source site
    fn source_name(&self) -> &'static str;

    /// Page the codes are published on
    fn url(&self) -> &str;

    /// Extract codes from a fetched page; missing markup yields an empty list
    fn extract_codes(&self, html: &str) -> Vec<String>;

    /// Fetch the page and extract its codes
    async fn scrape(&self, client: &Client) -> Result<Vec<String>> {
        debug!("Fetching URL: {}", self.url());

        let html = client
            .get(self.url())
            .send()
            .await
            .with_context(|| format!("Failed to fetch {} page", self.source_name()))?
            .text()
            .await
            .context("Failed to read response body")?;

        debug!("Downloaded {} bytes of HTML", html.len());

        Ok(self.extract_codes(&html))
    }
}

/// Fetches one page of listing results by page number
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, page: u32) -> Result<PageResponse>;
}
