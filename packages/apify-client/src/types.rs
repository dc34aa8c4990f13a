use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A `{ "url": ... }` entry, the shape most actors accept for start URLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartUrl {
    pub url: String,
}

impl StartUrl {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Media filter understood by the Facebook ads actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum MediaType {
    All,
    Image,
    #[default]
    Video,
}

/// Input for the Facebook page ads actor (one page URL per run).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FacebookAdsInput {
    pub start_urls: Vec<StartUrl>,
    pub results_limit: u32,
    pub active_status: String,
    pub scrape_ad_details: bool,
    pub media_type: MediaType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

impl FacebookAdsInput {
    pub fn for_page(page_url: impl Into<String>, results_limit: u32) -> Self {
        Self {
            start_urls: vec![StartUrl::new(page_url)],
            results_limit,
            active_status: "active".to_string(),
            scrape_ad_details: true,
            media_type: MediaType::Video,
            start_date: None,
            end_date: None,
        }
    }

    pub fn with_date_range(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    pub fn with_media_type(mut self, media_type: MediaType) -> Self {
        self.media_type = media_type;
        self
    }
}

/// Input for the Ads Library search actor (takes pre-built library URLs).
#[derive(Debug, Clone, Serialize)]
pub struct AdsLibrarySearchInput {
    pub urls: Vec<StartUrl>,
    pub count: u32,
    #[serde(rename = "scrapePageAds.activeStatus")]
    pub active_status: String,
    /// Empty string means all time.
    pub period: String,
}

impl AdsLibrarySearchInput {
    pub fn new(urls: Vec<StartUrl>, count: u32) -> Self {
        Self {
            urls,
            count,
            active_status: "active".to_string(),
            period: String::new(),
        }
    }
}

/// Input for the Instagram reel actor.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstagramReelInput {
    pub username: Vec<String>,
    pub results_limit: u32,
}

/// Input for the TikTok hashtag actor.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TikTokHashtagInput {
    pub hashtags: Vec<String>,
    pub results_per_page: u32,
    pub max_items: u32,
    pub should_download_videos: bool,
    pub should_download_covers: bool,
    pub should_download_subtitles: bool,
    pub should_download_slideshow_images: bool,
}

impl TikTokHashtagInput {
    pub fn new(hashtags: Vec<String>, max_items: u32) -> Self {
        Self {
            hashtags,
            results_per_page: 100,
            max_items,
            should_download_videos: false,
            should_download_covers: false,
            should_download_subtitles: false,
            should_download_slideshow_images: false,
        }
    }
}

/// Input for the YouTube hashtag actor.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YouTubeHashtagInput {
    pub hashtags: Vec<String>,
    pub max_results: u32,
    pub scrape_shorts_only: bool,
}

/// Wrapper for Apify API responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

/// Apify actor run metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct RunData {
    pub id: String,
    pub status: String,
    #[serde(rename = "defaultDatasetId")]
    pub default_dataset_id: String,
    #[serde(rename = "startedAt")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(rename = "finishedAt")]
    pub finished_at: Option<DateTime<Utc>>,
}
