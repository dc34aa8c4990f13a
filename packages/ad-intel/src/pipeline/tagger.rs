//! Content tagging by a hosted model.

use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::rate_limit::Pacer;
use crate::retry::RetryPolicy;
use crate::tolerant_json;
use crate::traits::llm::{GenerationRequest, Llm};
use crate::types::{TagSet, PERSONAS, TAG_CATEGORIES};

const SYSTEM_INSTRUCTION: &str =
    "You are a content-tagging assistant. Given video metadata, choose the best single tag from each provided list.";

/// Tagger settings.
#[derive(Debug, Clone)]
pub struct TaggerConfig {
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub retry: RetryPolicy,
    /// Spacing between records; zero disables it.
    pub pacing: Duration,
}

impl Default for TaggerConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.0,
            max_output_tokens: 150,
            retry: RetryPolicy::fixed(5, Duration::from_secs(5)),
            pacing: Duration::from_millis(200),
        }
    }
}

impl TaggerConfig {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }
}

/// Shape of the entries being tagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Entries of the ranked ads file.
    RankedAds,
    /// Short-video entries carrying only `url` and `title`.
    Shorts,
}

/// What the model sees about one record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TagInput {
    pub video_url: String,
    pub title: String,
    pub text: Option<String>,
    pub cta: Option<String>,
}

fn str_field(entry: &Value, key: &str) -> Option<String> {
    entry.get(key).and_then(Value::as_str).map(str::to_string)
}

impl TagInput {
    pub fn from_entry(entry: &Value, kind: EntryKind) -> Self {
        match kind {
            EntryKind::RankedAds => Self::from_ranked_ad(entry),
            EntryKind::Shorts => Self::from_short(entry),
        }
    }

    pub fn from_ranked_ad(entry: &Value) -> Self {
        let videos = entry.get("snapshot.videos");
        let video_url = videos
            .and_then(|v| str_field(v, "video_hd_url").filter(|s| !s.is_empty()))
            .or_else(|| videos.and_then(|v| str_field(v, "video_sd_url")))
            .unwrap_or_default();

        Self {
            video_url,
            title: str_field(entry, "snapshot_title").unwrap_or_default(),
            text: Some(str_field(entry, "snapshot_body_text").unwrap_or_default()),
            cta: Some(str_field(entry, "snapshot_cta_type").unwrap_or_else(|| "none".to_string())),
        }
    }

    pub fn from_short(entry: &Value) -> Self {
        Self {
            video_url: str_field(entry, "url").unwrap_or_default(),
            title: str_field(entry, "title").unwrap_or_default(),
            text: None,
            cta: None,
        }
    }
}

/// Prompt listing every vocabulary and the persona definitions.
pub fn build_tag_prompt(input: &TagInput) -> String {
    let mut lines = vec![
        format!("Video URL: {}", input.video_url),
        format!("Title: {}", input.title),
    ];
    if let Some(text) = &input.text {
        lines.push(format!("Text: {text}"));
    }
    if let Some(cta) = &input.cta {
        lines.push(format!("CTA Type: {cta}"));
    }
    lines.push(String::new());

    lines.push("You are a content-tagging assistant. Assign exactly one tag for each of:".to_string());
    lines.extend(TAG_CATEGORIES[..5].iter().map(|category| format!("  - {}", category.key)));
    lines.push("Then choose exactly one icp_tag (ideal customer persona) from the provided list.".to_string());
    lines.push(String::new());

    lines.extend(
        TAG_CATEGORIES
            .iter()
            .map(|category| format!("{}: {}", category.label, category.values.join(", "))),
    );

    lines.push(String::new());
    lines.push("ICP Definitions (choose exactly one):".to_string());
    lines.extend(
        PERSONAS
            .iter()
            .map(|(persona, definition)| format!("  - {persona:<10}: {definition}")),
    );

    let keys: Vec<_> = TAG_CATEGORIES.iter().map(|c| c.key).collect();
    lines.push(String::new());
    lines.push(format!(
        "Return only a single JSON object with keys: {}. No commentary.",
        keys.join(", ")
    ));
    lines.join("\n")
}

/// Assigns tags to records, one model call per record.
pub struct ContentTagger<L: Llm> {
    llm: L,
    config: TaggerConfig,
    pacer: Pacer,
}

impl<L: Llm> ContentTagger<L> {
    pub fn new(llm: L, config: TaggerConfig) -> Self {
        let pacer = Pacer::new(config.pacing);
        Self { llm, config, pacer }
    }

    /// Tags for one record. Model failures on every attempt yield
    /// [`TagSet::fallback`]; an unparseable reply yields an empty set.
    pub async fn tag(&self, input: &TagInput) -> TagSet {
        let request = GenerationRequest::new(&self.config.model, build_tag_prompt(input))
            .with_system(SYSTEM_INSTRUCTION)
            .with_temperature(self.config.temperature)
            .with_max_output_tokens(self.config.max_output_tokens);

        let (llm, request) = (&self.llm, &request);
        let reply = self
            .config
            .retry
            .run(move |_| async move { llm.generate(request).await }, |_| true)
            .await;

        match reply {
            Ok(reply) => match tolerant_json::parse_object(&reply) {
                Some(map) => TagSet::from_reply(&map),
                None => {
                    warn!(video_url = %input.video_url, "Unparseable tag reply");
                    TagSet::default()
                }
            },
            Err(e) => {
                warn!(video_url = %input.video_url, error = %e, "Tagging failed, using fallback tags");
                TagSet::fallback()
            }
        }
    }

    /// Tag every entry and merge the tags into it.
    #[instrument(skip(self, entries), fields(entries = entries.len()))]
    pub async fn tag_entries(&self, entries: &[Value], kind: EntryKind) -> Vec<Value> {
        let mut tagged = Vec::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            // First permit is immediate; later ones are spaced by the pacing interval
            self.pacer.wait().await;
            let tags = self.tag(&TagInput::from_entry(entry, kind)).await;
            debug!(index = i, icp = tags.icp_tag.as_deref().unwrap_or(""), "Entry tagged");
            tagged.push(tags.merge_into(entry));
        }
        info!(tagged = tagged.len(), "Tagging complete");
        tagged
    }
}
