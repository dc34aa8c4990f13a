//! Per-brand scraping seam.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::pipeline::scrape::ScrapeConfig;

/// Fetches raw items from the scraping service.
#[async_trait]
pub trait AdScraper: Send + Sync {
    /// Active video ads running on a Facebook page.
    async fn page_ads(&self, page_url: &str, config: &ScrapeConfig) -> Result<Vec<Value>>;

    /// Recent reels posted by an Instagram account.
    async fn reels(&self, username: &str, config: &ScrapeConfig) -> Result<Vec<Value>>;

    /// Ads behind every Ads Library search URL, collected in one run.
    async fn ads_library(&self, urls: &[String], count: u32) -> Result<Vec<Value>>;
}
