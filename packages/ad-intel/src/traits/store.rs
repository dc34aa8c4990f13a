//! Record storage.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{AdRow, RawRecord, RecordId, ReelRow, RelevanceFlag, RelevanceUpdate, TableName};

/// Table holding scraped Facebook ads.
pub const ADS_TABLE: &str = "competitor_ads";
/// Creatives belonging to [`ADS_TABLE`] rows.
pub const AD_CARDS_TABLE: &str = "ad_cards";
/// Table holding scraped Instagram reels.
pub const REELS_TABLE: &str = "competitor_reels";
/// Comments belonging to [`REELS_TABLE`] rows.
pub const COMMENTS_TABLE: &str = "reel_comments";

/// Storage for raw scraped records and their relevance flags.
///
/// Every table passed in is expected to have an `id` key, a `raw_json`
/// payload and a nullable `is_relevant` column.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Records whose relevance flag is still unknown, in id order.
    async fn pending_records(&self, table: &TableName) -> Result<Vec<RawRecord>>;

    /// Text of every comment on a reel. Blank comments are omitted.
    async fn comment_texts(&self, comments_table: &TableName, reel: RecordId) -> Result<Vec<String>>;

    async fn relevance(&self, table: &TableName, id: RecordId) -> Result<RelevanceFlag>;

    /// Apply every update in one atomic write. Records that already carry a
    /// flag are left untouched. Returns the number of rows changed.
    async fn apply_relevance(&self, table: &TableName, updates: &[RelevanceUpdate]) -> Result<u64>;

    /// Insert ads and their creatives. Returns the new ids in input order.
    async fn insert_ads(&self, ads: &[AdRow]) -> Result<Vec<RecordId>>;

    /// Insert reels and their comments. Returns the new ids in input order.
    async fn insert_reels(&self, reels: &[ReelRow]) -> Result<Vec<RecordId>>;
}
