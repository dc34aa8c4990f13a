//! Flattened Ads Library records and the pre-ranking filter.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::decode::{array_at, i64_at, text_at, DecodePolicy, FieldPath};
use crate::error::DecodeError;

/// The first video of an ad's snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoRef {
    pub video_hd_url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub video_sd_url: String,
    pub video_preview_image_url: String,
}

impl VideoRef {
    /// HD URL, falling back to SD, trimmed. `None` when both are blank.
    pub fn url(&self) -> Option<&str> {
        let hd = self.video_hd_url.trim();
        let url = if hd.is_empty() {
            self.video_sd_url.trim()
        } else {
            hd
        };
        (!url.is_empty()).then_some(url)
    }
}

/// Denormalized projection of an Ads Library item.
///
/// Serialized field names follow the dotted payload paths so the filtered
/// file reads like the raw data it came from.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FlattenedAd {
    pub page_name: String,
    #[serde(rename = "snapshot.page_profile_picture_url")]
    pub page_profile_picture_url: String,
    #[serde(rename = "snapshot.body.text")]
    pub body_text: String,
    #[serde(rename = "snapshot.caption")]
    pub caption: String,
    #[serde(rename = "snapshot.cta_text")]
    pub cta_text: String,
    #[serde(rename = "snapshot.cta_type")]
    pub cta_type: String,
    #[serde(rename = "snapshot.link_description")]
    pub link_description: String,
    #[serde(rename = "snapshot.link_url")]
    pub link_url: String,
    /// Comma-joined.
    #[serde(rename = "snapshot.page_categories")]
    pub page_categories: String,
    #[serde(rename = "snapshot.page_like_count")]
    pub page_like_count: Option<i64>,
    #[serde(rename = "snapshot.title")]
    pub title: String,
    #[serde(rename = "snapshot.videos")]
    pub video: Option<VideoRef>,
    pub days_since_start: Option<i64>,
}

impl FlattenedAd {
    /// Project a raw item, treating absent fields as empty.
    pub fn from_raw(item: &Value, now: DateTime<Utc>) -> Self {
        Self::decode(item, now, DecodePolicy::Lenient).unwrap_or_default()
    }

    /// Project a raw item under `policy`.
    pub fn decode(item: &Value, now: DateTime<Utc>, policy: DecodePolicy) -> Result<Self, DecodeError> {
        let text = |path: &str| text_at(item, &FieldPath::parse(path), policy);

        let categories = array_at(item, &FieldPath::parse("snapshot.page_categories"), policy)?
            .iter()
            .map(|c| match c {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(",");

        let video = array_at(item, &FieldPath::parse("snapshot.videos"), DecodePolicy::Lenient)?
            .first()
            .map(|v| VideoRef {
                video_hd_url: v.get("video_hd_url").and_then(Value::as_str).unwrap_or_default().to_string(),
                video_sd_url: v.get("video_sd_url").and_then(Value::as_str).unwrap_or_default().to_string(),
                video_preview_image_url: v
                    .get("video_preview_image_url")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            });

        let days_since_start = i64_at(item, &FieldPath::parse("start_date"), policy)?
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
            .map(|start| (now - start).num_days());

        Ok(Self {
            page_name: text("page_name")?,
            page_profile_picture_url: text("snapshot.page_profile_picture_url")?,
            body_text: text("snapshot.body.text")?,
            caption: text("snapshot.caption")?,
            cta_text: text("snapshot.cta_text")?,
            cta_type: text("snapshot.cta_type")?,
            link_description: text("snapshot.link_description")?,
            link_url: text("snapshot.link_url")?,
            page_categories: categories,
            page_like_count: i64_at(item, &FieldPath::parse("snapshot.page_like_count"), policy)?,
            title: text("snapshot.title")?,
            video,
            days_since_start,
        })
    }

    pub fn video_url(&self) -> Option<&str> {
        self.video.as_ref().and_then(VideoRef::url)
    }
}

/// Thresholds for the pre-ranking filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdFilterConfig {
    /// Inclusive.
    pub min_days_running: i64,
    /// Exclusive.
    pub min_page_likes: i64,
}

impl Default for AdFilterConfig {
    fn default() -> Self {
        Self {
            min_days_running: 14,
            min_page_likes: 18_000,
        }
    }
}

impl AdFilterConfig {
    pub fn with_min_days_running(mut self, days: i64) -> Self {
        self.min_days_running = days;
        self
    }

    pub fn with_min_page_likes(mut self, likes: i64) -> Self {
        self.min_page_likes = likes;
        self
    }

    /// Missing values fail their threshold.
    pub fn accepts(&self, ad: &FlattenedAd) -> bool {
        ad.video_url().is_some()
            && ad.days_since_start.is_some_and(|d| d >= self.min_days_running)
            && ad.page_like_count.is_some_and(|l| l > self.min_page_likes)
    }
}

/// Keep ads with a video that have run long enough on a popular page.
pub fn prefilter(ads: Vec<FlattenedAd>, config: &AdFilterConfig) -> Vec<FlattenedAd> {
    ads.into_iter().filter(|ad| config.accepts(ad)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn raw_ad(days_ago: i64, likes: i64, video: &str) -> Value {
        json!({
            "page_name": "Snitch",
            "start_date": (now() - Duration::days(days_ago)).timestamp(),
            "snapshot": {
                "body": { "text": "Summer polos" },
                "cta_type": "SHOP_NOW",
                "page_categories": ["Clothing", "Retail"],
                "page_like_count": likes,
                "videos": [{ "video_hd_url": video, "video_preview_image_url": "https://img" }]
            }
        })
    }

    #[test]
    fn flattens_ads_library_item() {
        let ad = FlattenedAd::from_raw(&raw_ad(20, 25_000, " https://v/a.mp4 "), now());
        assert_eq!(ad.page_name, "Snitch");
        assert_eq!(ad.body_text, "Summer polos");
        assert_eq!(ad.page_categories, "Clothing,Retail");
        assert_eq!(ad.page_like_count, Some(25_000));
        assert_eq!(ad.days_since_start, Some(20));
        assert_eq!(ad.video_url(), Some("https://v/a.mp4"));
        assert_eq!(ad.caption, "");
    }

    #[test]
    fn serializes_with_dotted_names() {
        let ad = FlattenedAd::from_raw(&raw_ad(20, 25_000, "https://v/a.mp4"), now());
        let value = serde_json::to_value(&ad).unwrap();
        assert_eq!(value["snapshot.body.text"], "Summer polos");
        assert_eq!(value["snapshot.videos"]["video_hd_url"], "https://v/a.mp4");
        assert_eq!(value["days_since_start"], 20);

        let back: FlattenedAd = serde_json::from_value(value).unwrap();
        assert_eq!(back, ad);
    }

    #[test]
    fn sd_url_is_the_fallback() {
        let video = VideoRef {
            video_sd_url: "https://v/sd.mp4".into(),
            ..VideoRef::default()
        };
        assert_eq!(video.url(), Some("https://v/sd.mp4"));
        assert_eq!(VideoRef::default().url(), None);
    }

    #[test]
    fn strict_decode_names_missing_field() {
        let err = FlattenedAd::decode(&json!({ "snapshot": {} }), now(), DecodePolicy::Strict).unwrap_err();
        assert!(matches!(err, DecodeError::MissingField { .. }));
    }

    #[test]
    fn prefilter_thresholds() {
        let config = AdFilterConfig::default();
        let ads = vec![
            FlattenedAd::from_raw(&raw_ad(14, 18_001, "a"), now()),
            FlattenedAd::from_raw(&raw_ad(13, 50_000, "b"), now()),
            FlattenedAd::from_raw(&raw_ad(30, 18_000, "c"), now()),
            FlattenedAd::from_raw(&raw_ad(30, 90_000, "  "), now()),
            FlattenedAd::from_raw(&json!({ "snapshot": { "videos": [{ "video_hd_url": "e" }] } }), now()),
        ];

        let kept = prefilter(ads, &config);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].video_url(), Some("a"));
    }

    #[test]
    fn thresholds_are_configurable() {
        let config = AdFilterConfig::default()
            .with_min_days_running(0)
            .with_min_page_likes(0);
        let ad = FlattenedAd::from_raw(&raw_ad(1, 1, "a"), now());
        assert!(config.accepts(&ad));
    }
}
