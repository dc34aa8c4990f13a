//! Row filter: resolve the relevance flag of every pending record.
//!
//! For each record with an unknown flag the configured text is extracted and
//! checked against the keywords; records without a keyword hit are escalated
//! to the model. Decisions are buffered and written in one batch at the end,
//! so a failure anywhere in the run leaves every flag unknown.

use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::decode::{array_at, text_at, DecodePolicy, FieldPath};
use crate::error::{AdIntelError, Result};
use crate::keyword::KeywordMatcher;
use crate::pipeline::classifier::RelevanceClassifier;
use crate::traits::{llm::Llm, store::RecordStore};
use crate::traits::store::{ADS_TABLE, COMMENTS_TABLE, REELS_TABLE};
use crate::types::{RawRecord, RelevanceUpdate, TableName};

/// Where the text checked for a record comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum TextSource {
    /// Values at each path, joined with single spaces.
    Paths(Vec<FieldPath>),
    /// Ad caption plus every card's HD video URL.
    AdCreative,
    /// Reel caption, media URLs and all stored comment texts.
    ReelWithComments { comments_table: TableName },
}

/// A table to filter and how to read its records.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSpec {
    pub table: TableName,
    pub source: TextSource,
}

impl TableSpec {
    pub fn new(table: TableName, source: TextSource) -> Self {
        Self { table, source }
    }

    pub fn competitor_ads() -> Result<Self> {
        Ok(Self::new(TableName::new(ADS_TABLE)?, TextSource::AdCreative))
    }

    pub fn competitor_reels() -> Result<Self> {
        Ok(Self::new(
            TableName::new(REELS_TABLE)?,
            TextSource::ReelWithComments {
                comments_table: TableName::new(COMMENTS_TABLE)?,
            },
        ))
    }
}

/// Outcome counts for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterReport {
    pub examined: usize,
    pub keyword_matches: usize,
    pub llm_matches: usize,
    pub rejected: usize,
    /// Rows actually changed by the batch write.
    pub written: u64,
}

impl FilterReport {
    pub fn relevant(&self) -> usize {
        self.keyword_matches + self.llm_matches
    }
}

/// Ad text: caption plus all card HD video URLs.
pub fn ad_creative_text(ad: &Value, policy: DecodePolicy) -> Result<String> {
    let caption = text_at(ad, &FieldPath::parse("snapshot.caption"), policy)?;
    let cards = array_at(ad, &FieldPath::parse("snapshot.cards"), DecodePolicy::Lenient)?;
    let video_urls = cards
        .iter()
        .filter_map(|card| card.get("videoHdUrl").and_then(Value::as_str))
        .filter(|url| !url.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    Ok(format!("Caption: {caption}\nVideo URLs: {video_urls}"))
}

/// Reel text: caption, media URLs and comment texts.
pub fn reel_text(reel: &Value, comments: &[String], policy: DecodePolicy) -> Result<String> {
    let caption = text_at(reel, &FieldPath::parse("caption"), policy)?;
    let video_url = text_at(reel, &FieldPath::parse("videoUrl"), DecodePolicy::Lenient)?;
    let display_url = text_at(reel, &FieldPath::parse("displayUrl"), DecodePolicy::Lenient)?;
    Ok(format!(
        "Caption: {caption}\nVideo URL: {video_url}\nDisplay URL: {display_url}\nComments: {}",
        comments.join(" ")
    ))
}

/// Values at `paths`, space-joined.
pub fn path_text(value: &Value, paths: &[FieldPath], policy: DecodePolicy) -> Result<String> {
    let parts = paths
        .iter()
        .map(|path| text_at(value, path, policy))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(parts.join(" "))
}

/// Keyword pre-filter with model escalation over a record store.
pub struct RowFilter<L: Llm, S: RecordStore> {
    store: S,
    classifier: RelevanceClassifier<L>,
    policy: DecodePolicy,
}

impl<L: Llm, S: RecordStore> RowFilter<L, S> {
    pub fn new(store: S, classifier: RelevanceClassifier<L>) -> Self {
        Self {
            store,
            classifier,
            policy: DecodePolicy::Lenient,
        }
    }

    pub fn with_policy(mut self, policy: DecodePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    async fn record_text(&self, spec: &TableSpec, record: &RawRecord) -> Result<String> {
        match &spec.source {
            TextSource::Paths(paths) => path_text(&record.raw, paths, self.policy),
            TextSource::AdCreative => ad_creative_text(&record.raw, self.policy),
            TextSource::ReelWithComments { comments_table } => {
                let comments = self.store.comment_texts(comments_table, record.id).await?;
                reel_text(&record.raw, &comments, self.policy)
            }
        }
    }

    /// Resolve every pending record in `spec.table`.
    #[instrument(skip(self, spec, keywords), fields(table = %spec.table))]
    pub async fn run(&self, spec: &TableSpec, keywords: &[String]) -> Result<FilterReport> {
        let matcher = KeywordMatcher::new(keywords);
        if matcher.is_empty() {
            return Err(AdIntelError::Config("at least one keyword is required".into()));
        }

        let pending = self.store.pending_records(&spec.table).await?;
        info!(pending = pending.len(), "Filtering records");

        let mut report = FilterReport::default();
        let mut updates = Vec::with_capacity(pending.len());

        for record in &pending {
            let text = self.record_text(spec, record).await?;
            report.examined += 1;

            let relevant = if matcher.is_match(&text) {
                report.keyword_matches += 1;
                true
            } else if self.classifier.classify(&text, keywords).await? {
                report.llm_matches += 1;
                true
            } else {
                report.rejected += 1;
                false
            };

            debug!(id = %record.id, relevant, "Record resolved");
            updates.push(RelevanceUpdate {
                id: record.id,
                relevant,
            });
        }

        if !updates.is_empty() {
            report.written = self.store.apply_relevance(&spec.table, &updates).await?;
        }

        info!(
            examined = report.examined,
            keyword_matches = report.keyword_matches,
            llm_matches = report.llm_matches,
            rejected = report.rejected,
            written = report.written,
            "Filter run complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ad_text_includes_card_videos() {
        let ad = json!({
            "snapshot": {
                "caption": "snitch.co.in",
                "cards": [{ "videoHdUrl": "https://v/1" }, { "videoHdUrl": "" }, { "videoHdUrl": "https://v/2" }]
            }
        });
        assert_eq!(
            ad_creative_text(&ad, DecodePolicy::Lenient).unwrap(),
            "Caption: snitch.co.in\nVideo URLs: https://v/1 https://v/2"
        );
    }

    #[test]
    fn ad_text_tolerates_missing_fields() {
        assert_eq!(
            ad_creative_text(&json!({}), DecodePolicy::Lenient).unwrap(),
            "Caption: \nVideo URLs: "
        );
        assert!(matches!(
            ad_creative_text(&json!({}), DecodePolicy::Strict),
            Err(AdIntelError::Decode(_))
        ));
    }

    #[test]
    fn reel_text_joins_comments() {
        let reel = json!({ "caption": "Fit check", "videoUrl": "https://v", "displayUrl": "https://d" });
        let text = reel_text(&reel, &["love this polo".into(), "link?".into()], DecodePolicy::Lenient).unwrap();
        assert_eq!(
            text,
            "Caption: Fit check\nVideo URL: https://v\nDisplay URL: https://d\nComments: love this polo link?"
        );
    }

    #[test]
    fn path_text_joins_values() {
        let reel = json!({ "caption": "a", "owner": { "name": "b" } });
        let paths = vec![FieldPath::parse("caption"), FieldPath::parse("owner.name")];
        assert_eq!(path_text(&reel, &paths, DecodePolicy::Lenient).unwrap(), "a b");
    }

    #[test]
    fn default_table_specs() {
        let ads = TableSpec::competitor_ads().unwrap();
        assert_eq!(ads.table.as_str(), "competitor_ads");
        assert_eq!(ads.source, TextSource::AdCreative);

        let reels = TableSpec::competitor_reels().unwrap();
        assert!(matches!(
            reels.source,
            TextSource::ReelWithComments { ref comments_table } if comments_table.as_str() == "reel_comments"
        ));
    }
}
