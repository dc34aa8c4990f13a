//! Per-brand scraping fan-out.
//!
//! Each competitor yields up to two independent tasks (Facebook page ads and
//! Instagram reels). Tasks run with bounded concurrency; a failed task is
//! logged and skipped so one bad brand does not sink the batch.

use apify_client::{AdsLibrarySearchInput, ApifyClient, FacebookAdsInput, MediaType, StartUrl};
use async_trait::async_trait;
use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::error::Result;
use crate::traits::scraper::AdScraper;

/// A competitor brand and where to find it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Competitor {
    pub brand: String,
    #[serde(default)]
    pub facebook_url: Option<String>,
    #[serde(default)]
    pub instagram_username: Option<String>,
}

fn usable(value: Option<&str>) -> Option<&str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("N/A"))
}

impl Competitor {
    pub fn new(
        brand: impl Into<String>,
        facebook_url: Option<String>,
        instagram_username: Option<String>,
    ) -> Self {
        Self {
            brand: brand.into(),
            facebook_url,
            instagram_username,
        }
    }

    /// The Facebook page to scrape, if present and an absolute URL.
    pub fn facebook_page(&self) -> Option<&str> {
        usable(self.facebook_url.as_deref()).filter(|url| url.starts_with("http"))
    }

    pub fn instagram_account(&self) -> Option<&str> {
        usable(self.instagram_username.as_deref()).map(|u| u.trim_start_matches('@'))
    }
}

/// Scraping knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeConfig {
    /// Tasks in flight at once.
    pub concurrency: usize,
    pub ads_limit: u32,
    pub reels_limit: u32,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub media_type: MediaType,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            concurrency: 8,
            ads_limit: 50,
            reels_limit: 100,
            start_date: None,
            end_date: None,
            media_type: MediaType::Video,
        }
    }
}

impl ScrapeConfig {
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_limits(mut self, ads_limit: u32, reels_limit: u32) -> Self {
        self.ads_limit = ads_limit;
        self.reels_limit = reels_limit;
        self
    }

    pub fn with_date_range(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }
}

/// Raw items collected across every competitor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrapeBatch {
    pub ads: Vec<Value>,
    pub reels: Vec<Value>,
    /// Tasks that failed and were skipped.
    pub failed_tasks: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Channel {
    FacebookAds,
    InstagramReels,
}

struct Task<'a> {
    brand: &'a str,
    target: &'a str,
    channel: Channel,
}

fn tag_brand(items: &mut [Value], brand: &str) {
    for item in items {
        if let Value::Object(map) = item {
            map.insert("brand".to_string(), Value::String(brand.to_string()));
        }
    }
}

/// Scrape every competitor's ads and reels.
#[instrument(skip(scraper, competitors, config), fields(competitors = competitors.len()))]
pub async fn scrape_competitors<S: AdScraper + ?Sized>(
    scraper: &S,
    competitors: &[Competitor],
    config: &ScrapeConfig,
) -> ScrapeBatch {
    let mut tasks = Vec::new();
    for competitor in competitors {
        match competitor.facebook_page() {
            Some(url) => tasks.push(Task {
                brand: &competitor.brand,
                target: url,
                channel: Channel::FacebookAds,
            }),
            None => info!(brand = %competitor.brand, "No usable Facebook page, skipping ads"),
        }
        match competitor.instagram_account() {
            Some(username) => tasks.push(Task {
                brand: &competitor.brand,
                target: username,
                channel: Channel::InstagramReels,
            }),
            None => info!(brand = %competitor.brand, "No Instagram account, skipping reels"),
        }
    }

    let results: Vec<_> = stream::iter(tasks)
        .map(|task| async move {
            let result = match task.channel {
                Channel::FacebookAds => scraper.page_ads(task.target, config).await,
                Channel::InstagramReels => scraper.reels(task.target, config).await,
            };
            (task, result)
        })
        .buffer_unordered(config.concurrency.max(1))
        .collect()
        .await;

    let mut batch = ScrapeBatch::default();
    for (task, result) in results {
        match result {
            Ok(mut items) => {
                tag_brand(&mut items, task.brand);
                info!(brand = %task.brand, channel = ?task.channel, items = items.len(), "Fetched items");
                match task.channel {
                    Channel::FacebookAds => batch.ads.extend(items),
                    Channel::InstagramReels => batch.reels.extend(items),
                }
            }
            Err(e) => {
                warn!(brand = %task.brand, channel = ?task.channel, error = %e, "Scrape task failed, skipping");
                batch.failed_tasks += 1;
            }
        }
    }

    info!(
        ads = batch.ads.len(),
        reels = batch.reels.len(),
        failed = batch.failed_tasks,
        "Scraping complete"
    );
    batch
}

#[async_trait]
impl AdScraper for ApifyClient {
    async fn page_ads(&self, page_url: &str, config: &ScrapeConfig) -> Result<Vec<Value>> {
        let input = FacebookAdsInput::for_page(page_url, config.ads_limit)
            .with_date_range(config.start_date, config.end_date)
            .with_media_type(config.media_type);
        Ok(self.scrape_facebook_page_ads(&input).await?)
    }

    async fn reels(&self, username: &str, config: &ScrapeConfig) -> Result<Vec<Value>> {
        Ok(self.scrape_instagram_reels(username, config.reels_limit).await?)
    }

    async fn ads_library(&self, urls: &[String], count: u32) -> Result<Vec<Value>> {
        let input = AdsLibrarySearchInput::new(urls.iter().map(StartUrl::new).collect(), count);
        Ok(self.search_ads_library(&input).await?)
    }
}
