//! Stored records and the rows produced when persisting scraper items.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::decode::{array_at, i64_at, text_at, DecodePolicy, FieldPath};
use crate::error::{AdIntelError, Result};

/// Surrogate key of a stored ad or reel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub i64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a record passed content filtering. Set once, never reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelevanceFlag {
    #[default]
    Unknown,
    Relevant,
    Irrelevant,
}

impl RelevanceFlag {
    pub fn from_column(value: Option<bool>) -> Self {
        match value {
            None => Self::Unknown,
            Some(true) => Self::Relevant,
            Some(false) => Self::Irrelevant,
        }
    }

    pub fn as_column(self) -> Option<bool> {
        match self {
            Self::Unknown => None,
            Self::Relevant => Some(true),
            Self::Irrelevant => Some(false),
        }
    }

    pub fn is_resolved(self) -> bool {
        self != Self::Unknown
    }
}

/// A stored record awaiting a relevance decision.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub id: RecordId,
    pub raw: Value,
}

/// A buffered relevance decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelevanceUpdate {
    pub id: RecordId,
    pub relevant: bool,
}

/// A table name that is safe to interpolate into SQL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName(String);

/// `[A-Za-z_][A-Za-z0-9_]*`
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

impl TableName {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if is_identifier(&name) {
            Ok(Self(name))
        } else {
            Err(AdIntelError::InvalidTable { name })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn field(path: &str) -> FieldPath {
    FieldPath::parse(path)
}

fn opt_text(value: &Value, path: &str) -> Option<String> {
    text_at(value, &field(path), DecodePolicy::Lenient)
        .ok()
        .filter(|s| !s.is_empty())
}

fn opt_i64(value: &Value, path: &str) -> Option<i64> {
    i64_at(value, &field(path), DecodePolicy::Lenient).ok().flatten()
}

fn unix_time(value: &Value, path: &str) -> Option<DateTime<Utc>> {
    opt_i64(value, path).and_then(|secs| Utc.timestamp_opt(secs, 0).single())
}

fn iso_time(value: &Value, path: &str) -> Option<DateTime<Utc>> {
    opt_text(value, path)
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Normalized columns of a scraped Facebook ad.
#[derive(Debug, Clone, PartialEq)]
pub struct AdRow {
    pub brand: String,
    pub input_url: Option<String>,
    pub page_id: Option<String>,
    pub page_name: Option<String>,
    pub page_likes: Option<i64>,
    pub ad_archive_id: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
    pub total_active_time: Option<i64>,
    pub cta_text: Option<String>,
    pub link_url: Option<String>,
    pub snapshot_caption: Option<String>,
    pub cards: Vec<AdCardRow>,
    pub raw: Value,
}

/// One creative (card or video) belonging to an ad.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AdCardRow {
    pub body: Option<String>,
    pub caption: Option<String>,
    pub cta_text: Option<String>,
    pub cta_type: Option<String>,
    pub link_description: Option<String>,
    pub link_url: Option<String>,
    pub title: Option<String>,
    pub video_hd_url: Option<String>,
    pub video_sd_url: Option<String>,
    pub video_preview_image: Option<String>,
}

impl AdRow {
    pub fn from_item(item: &Value) -> Self {
        let page = "pageInfo.adLibraryPageInfo.pageInfo";
        let ad_archive_id = opt_text(item, "adArchiveID").or_else(|| opt_text(item, "adArchiveId"));

        Self {
            brand: opt_text(item, "brand").unwrap_or_default(),
            input_url: opt_text(item, "inputUrl"),
            page_id: opt_text(item, &format!("{page}.pageId")),
            page_name: opt_text(item, &format!("{page}.pageName")),
            page_likes: opt_i64(item, &format!("{page}.likes")),
            ad_archive_id,
            start_date: unix_time(item, "startDate"),
            end_date: unix_time(item, "endDate"),
            is_active: item.get("isActive").and_then(Value::as_bool),
            total_active_time: opt_i64(item, "totalActiveTime"),
            cta_text: opt_text(item, "snapshot.ctaText"),
            link_url: opt_text(item, "snapshot.linkUrl"),
            snapshot_caption: opt_text(item, "snapshot.caption"),
            cards: AdCardRow::from_snapshot(item),
            raw: item.clone(),
        }
    }
}

impl AdCardRow {
    /// Cards carry full creative metadata; bare videos only their URLs.
    pub fn from_snapshot(item: &Value) -> Vec<Self> {
        let cards = array_at(item, &field("snapshot.cards"), DecodePolicy::Lenient).unwrap_or_default();
        let videos = array_at(item, &field("snapshot.videos"), DecodePolicy::Lenient).unwrap_or_default();

        let from_cards = cards.iter().map(|card| {
            let body = match card.get("body") {
                Some(Value::Object(_)) => opt_text(card, "body.text"),
                Some(Value::String(s)) => Some(s.clone()).filter(|s| !s.is_empty()),
                Some(Value::Null) | None => None,
                Some(other) => Some(other.to_string()).filter(|s| !s.is_empty()),
            };
            Self {
                body,
                caption: opt_text(card, "caption"),
                cta_text: opt_text(card, "ctaText"),
                cta_type: opt_text(card, "ctaType"),
                link_description: opt_text(card, "linkDescription"),
                link_url: opt_text(card, "linkUrl"),
                title: opt_text(card, "title"),
                ..Self::video_only(card)
            }
        });

        from_cards.chain(videos.iter().map(Self::video_only)).collect()
    }

    fn video_only(media: &Value) -> Self {
        Self {
            video_hd_url: opt_text(media, "videoHdUrl"),
            video_sd_url: opt_text(media, "videoSdUrl"),
            video_preview_image: opt_text(media, "videoPreviewImageUrl"),
            ..Self::default()
        }
    }
}

/// Normalized columns of a scraped Instagram reel.
#[derive(Debug, Clone, PartialEq)]
pub struct ReelRow {
    pub brand: String,
    pub input_url: Option<String>,
    pub reel_id: Option<String>,
    pub shortcode: Option<String>,
    pub caption: Option<String>,
    pub url: Option<String>,
    pub comments_count: Option<i64>,
    pub likes_count: Option<i64>,
    pub video_url: Option<String>,
    pub display_url: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub comments: Vec<CommentRow>,
    pub raw: Value,
}

impl ReelRow {
    pub fn from_item(item: &Value) -> Self {
        Self {
            brand: opt_text(item, "brand").unwrap_or_default(),
            input_url: opt_text(item, "inputUrl"),
            reel_id: opt_text(item, "id"),
            shortcode: opt_text(item, "shortCode"),
            caption: opt_text(item, "caption"),
            url: opt_text(item, "url"),
            comments_count: opt_i64(item, "commentsCount"),
            likes_count: opt_i64(item, "likesCount"),
            video_url: opt_text(item, "videoUrl"),
            display_url: opt_text(item, "displayUrl"),
            timestamp: iso_time(item, "timestamp"),
            comments: flatten_comments(item),
            raw: item.clone(),
        }
    }
}

/// A reel comment or reply.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentRow {
    pub comment_id: Option<String>,
    pub text: Option<String>,
    pub owner_username: Option<String>,
    pub owner_id: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    /// Set for replies.
    pub parent_comment_id: Option<String>,
    pub raw: Value,
}

impl CommentRow {
    fn from_value(comment: &Value, parent_comment_id: Option<String>) -> Self {
        Self {
            comment_id: opt_text(comment, "id"),
            text: opt_text(comment, "text"),
            owner_username: opt_text(comment, "ownerUsername"),
            owner_id: opt_text(comment, "owner.id"),
            timestamp: iso_time(comment, "timestamp"),
            parent_comment_id,
            raw: comment.clone(),
        }
    }
}

/// Latest comments followed by each one's replies, in payload order.
pub fn flatten_comments(reel: &Value) -> Vec<CommentRow> {
    let comments = array_at(reel, &field("latestComments"), DecodePolicy::Lenient).unwrap_or_default();

    let mut rows = Vec::new();
    for comment in comments {
        let top = CommentRow::from_value(comment, None);
        let parent = top.comment_id.clone();
        rows.push(top);

        let replies = array_at(comment, &field("replies"), DecodePolicy::Lenient).unwrap_or_default();
        rows.extend(
            replies
                .iter()
                .map(|reply| CommentRow::from_value(reply, parent.clone())),
        );
    }
    rows
}
