//! Ad-Intelligence Pipeline Library
//!
//! Scrapes competitor ads and reels through hosted scraper actors, filters
//! stored records for relevance, ranks Ads Library creatives by video and
//! tags them with fixed content vocabularies using a hosted model.
//!
//! # Usage
//!
//! ```rust,ignore
//! use ad_intel::{MemoryStore, RelevanceClassifier, RowFilter, TableSpec};
//! use ad_intel::testing::MockLlm;
//!
//! let classifier = RelevanceClassifier::new(MockLlm::new().with_default_reply("No"), "gpt-4o-mini");
//! let filter = RowFilter::new(MemoryStore::new(), classifier);
//!
//! let report = filter
//!     .run(&TableSpec::competitor_ads()?, &["polo".to_string()])
//!     .await?;
//! println!("{} relevant of {}", report.relevant(), report.examined);
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Seams for the model, the record store and the scraper
//! - [`types`] - Records, flattened ads and tag vocabularies
//! - [`pipeline`] - Classifier, row filter, ranking, tagger and scraping fan-out
//! - [`stores`] - Record stores (MemoryStore, PostgresStore)
//! - [`ai`] - Hosted model adapters
//! - [`directory`] - Graph API page directory
//! - [`testing`] - Mock implementations for testing

pub mod ai;
pub mod config;
pub mod decode;
pub mod directory;
pub mod error;
pub mod keyword;
pub mod output;
pub mod pipeline;
pub mod rate_limit;
pub mod retry;
pub mod stores;
pub mod testing;
pub mod tolerant_json;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use config::Config;
pub use decode::{DecodePolicy, FieldPath};
pub use error::{AdIntelError, DecodeError, LlmError, Result};
pub use keyword::{matches_any, KeywordMatcher};
pub use rate_limit::{CallWindow, Pacer};
pub use retry::{Backoff, RetryPolicy};
pub use traits::{AdScraper, GenerationRequest, Llm, PageDirectory, RecordStore};
pub use types::{
    prefilter, AdFilterConfig, FlattenedAd, PageCandidate, RawRecord, RecordId, RelevanceFlag, TableName, TagSet,
};

pub use pipeline::{
    ads_library_targets, aggregate_by_video, resolve_page_id, search_ads_library, rank_ads, rank_groups, scrape_competitors, Competitor, ContentTagger,
    EntryKind, FilterReport, RankConfig, RankedAd, RelevanceClassifier, RowFilter, ScrapeBatch,
    ScrapeConfig, TableSpec, TagInput, TaggerConfig, TextSource, VideoGroup,
};

pub use ai::OpenAiLlm;
pub use directory::GraphPageDirectory;
pub use stores::{MemoryStore, PostgresStore};
