//! Pipelines: relevance filtering, ranking, tagging and scraping.

pub mod classifier;
pub mod filter;
pub mod page_lookup;
pub mod rank;
pub mod scrape;
pub mod tagger;

pub use classifier::{build_relevance_prompt, is_affirmative, RelevanceClassifier};
pub use filter::{FilterReport, RowFilter, TableSpec, TextSource};
pub use page_lookup::{ads_library_targets, pick_best_page, resolve_page_id, search_ads_library};
pub use rank::{aggregate_by_video, rank_ads, rank_groups, RankConfig, RankedAd, RankedVideo, VideoGroup};
pub use scrape::{scrape_competitors, Competitor, ScrapeBatch, ScrapeConfig};
pub use tagger::{build_tag_prompt, ContentTagger, EntryKind, TagInput, TaggerConfig};
