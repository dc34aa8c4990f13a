//! Pure Apify REST API client.
//!
//! A minimal client for the Apify platform API. Supports starting actor runs,
//! polling for completion, and fetching dataset results. Dataset items are
//! returned as opaque JSON so callers can persist the raw payload untouched.
//!
//! # Example
//!
//! ```rust,ignore
//! use apify_client::{ApifyClient, FacebookAdsInput};
//!
//! let client = ApifyClient::new("your-api-token".into());
//!
//! let ads = client
//!     .scrape_facebook_page_ads(&FacebookAdsInput::for_page("https://www.facebook.com/acme", 50))
//!     .await?;
//! println!("{} ads", ads.len());
//! ```

pub mod error;
pub mod types;

pub use error::{ApifyError, Result};
pub use types::{
    AdsLibrarySearchInput, FacebookAdsInput, InstagramReelInput, MediaType, RunData, StartUrl,
    TikTokHashtagInput, YouTubeHashtagInput,
};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use types::ApiResponse;

const BASE_URL: &str = "https://api.apify.com/v2";

/// Actor ID for the Facebook page ads scraper.
pub const FACEBOOK_ADS_SCRAPER: &str = "JJghSZmShuco4j9gJ";

/// Actor ID for the Facebook Ads Library search scraper.
pub const ADS_LIBRARY_SCRAPER: &str = "XtaWFhbtfxyzqrFmd";

/// Actor ID for the Instagram reel scraper.
pub const INSTAGRAM_REEL_SCRAPER: &str = "xMc5Ga1oCONPmWJIa";

/// Actor ID for the TikTok hashtag scraper.
pub const TIKTOK_HASHTAG_SCRAPER: &str = "f1ZeP0K58iwlqG2pY";

/// Actor ID for the YouTube hashtag scraper.
pub const YOUTUBE_HASHTAG_SCRAPER: &str = "89uTe0zmDUIatNKSd";

const ADS_LIBRARY_URL: &str = "https://www.facebook.com/ads/library/";

/// How an Ads Library search URL targets ads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdsLibraryTarget {
    /// All ads from a numeric page id.
    Page(String),
    /// Unordered keyword search.
    Keyword(String),
}

impl AdsLibraryTarget {
    /// Numeric strings are page ids; anything else is a keyword query.
    pub fn from_page_id_or_name(value: &str) -> Self {
        let trimmed = value.trim();
        if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
            Self::Page(trimmed.to_string())
        } else {
            Self::Keyword(trimmed.to_string())
        }
    }
}

/// Build an Ads Library URL for active video ads in all countries.
pub fn ads_library_url(target: &AdsLibraryTarget) -> Result<String> {
    let mut url = url::Url::parse(ADS_LIBRARY_URL)
        .map_err(|e| ApifyError::InvalidInput(e.to_string()))?;
    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("active_status", "active")
            .append_pair("ad_type", "all")
            .append_pair("country", "ALL")
            .append_pair("is_targeted_country", "false")
            .append_pair("media_type", "video");
        match target {
            AdsLibraryTarget::Page(id) => {
                query
                    .append_pair("search_type", "page")
                    .append_pair("view_all_page_id", id);
            }
            AdsLibraryTarget::Keyword(q) if q.is_empty() => {
                return Err(ApifyError::InvalidInput("empty keyword query".into()));
            }
            AdsLibraryTarget::Keyword(q) => {
                query
                    .append_pair("search_type", "keyword_unordered")
                    .append_pair("q", q);
            }
        }
    }
    Ok(url.into())
}

pub struct ApifyClient {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

impl ApifyClient {
    pub fn new(token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
            base_url: BASE_URL.to_string(),
        }
    }

    /// Point the client at a different API root (proxies, local fakes).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Start an actor run. Returns immediately with run metadata.
    pub async fn start_run<I: Serialize + ?Sized>(&self, actor_id: &str, input: &I) -> Result<RunData> {
        let url = format!("{}/acts/{}/runs", self.base_url, actor_id);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(input)
            .send()
            .await?;

        let resp = Self::ensure_success(resp).await?;
        let api_resp: ApiResponse<RunData> = resp.json().await?;
        Ok(api_resp.data)
    }

    /// Poll until a run completes. Uses `waitForFinish=60` for efficient long-polling.
    pub async fn wait_for_run(&self, run_id: &str) -> Result<RunData> {
        loop {
            let url = format!("{}/actor-runs/{}?waitForFinish=60", self.base_url, run_id);
            let resp = self
                .client
                .get(&url)
                .bearer_auth(&self.token)
                .send()
                .await?;

            let resp = Self::ensure_success(resp).await?;
            let api_resp: ApiResponse<RunData> = resp.json().await?;
            match api_resp.data.status.as_str() {
                "SUCCEEDED" => return Ok(api_resp.data),
                "FAILED" | "ABORTED" | "TIMED-OUT" => {
                    return Err(ApifyError::RunFailed(api_resp.data.status));
                }
                _ => {
                    tracing::debug!(run_id, status = %api_resp.data.status, "Run still in progress");
                    continue;
                }
            }
        }
    }

    /// Fetch dataset items from a completed run.
    pub async fn get_dataset_items<T: DeserializeOwned>(&self, dataset_id: &str) -> Result<Vec<T>> {
        let url = format!("{}/datasets/{}/items?format=json", self.base_url, dataset_id);
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        let resp = Self::ensure_success(resp).await?;
        let items: Vec<T> = resp.json().await?;
        Ok(items)
    }

    /// Run an actor end-to-end: start run, poll, fetch the default dataset.
    pub async fn run_actor<I, T>(&self, actor_id: &str, input: &I) -> Result<Vec<T>>
    where
        I: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let run = self.start_run(actor_id, input).await?;
        tracing::info!(actor_id, run_id = %run.id, "Apify run started, polling for completion");

        let completed = self.wait_for_run(&run.id).await?;
        tracing::info!(
            run_id = %completed.id,
            dataset_id = %completed.default_dataset_id,
            "Run completed, fetching results"
        );

        let items: Vec<T> = self
            .get_dataset_items(&completed.default_dataset_id)
            .await?;
        tracing::info!(actor_id, count = items.len(), "Fetched dataset items");

        Ok(items)
    }

    /// Scrape the active ads of one Facebook page.
    pub async fn scrape_facebook_page_ads(&self, input: &FacebookAdsInput) -> Result<Vec<Value>> {
        tracing::info!(
            urls = ?input.start_urls,
            limit = input.results_limit,
            "Starting Facebook page ads scrape"
        );
        self.run_actor(FACEBOOK_ADS_SCRAPER, input).await
    }

    /// Scrape ads through Ads Library search URLs.
    pub async fn search_ads_library(&self, input: &AdsLibrarySearchInput) -> Result<Vec<Value>> {
        tracing::info!(url_count = input.urls.len(), count = input.count, "Starting Ads Library scrape");
        self.run_actor(ADS_LIBRARY_SCRAPER, input).await
    }

    /// Scrape recent reels of an Instagram profile.
    pub async fn scrape_instagram_reels(&self, username: &str, limit: u32) -> Result<Vec<Value>> {
        tracing::info!(username, limit, "Starting Instagram reel scrape");
        let input = InstagramReelInput {
            username: vec![username.to_string()],
            results_limit: limit,
        };
        self.run_actor(INSTAGRAM_REEL_SCRAPER, &input).await
    }

    /// Scrape TikTok videos for hashtags (without media downloads).
    pub async fn scrape_tiktok_hashtags(&self, hashtags: &[String], max_items: u32) -> Result<Vec<Value>> {
        tracing::info!(?hashtags, max_items, "Starting TikTok hashtag scrape");
        let input = TikTokHashtagInput::new(hashtags.to_vec(), max_items);
        self.run_actor(TIKTOK_HASHTAG_SCRAPER, &input).await
    }

    /// Scrape YouTube Shorts for hashtags.
    pub async fn scrape_youtube_shorts(&self, hashtags: &[String], max_results: u32) -> Result<Vec<Value>> {
        tracing::info!(?hashtags, max_results, "Starting YouTube Shorts scrape");
        let input = YouTubeHashtagInput {
            hashtags: hashtags.to_vec(),
            max_results,
            scrape_shorts_only: true,
        };
        self.run_actor(YOUTUBE_HASHTAG_SCRAPER, &input).await
    }

    async fn ensure_success(resp: reqwest::Response) -> Result<reqwest::Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(ApifyError::Api {
            status: status.as_u16(),
            message: body,
        })
    }
}
