//! Page directory seam used to turn brand names into page ids.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::PageCandidate;

#[async_trait]
pub trait PageDirectory: Send + Sync {
    /// Look a page up by its vanity slug or exact name. `None` when the
    /// directory has no such node.
    async fn page_by_slug(&self, slug: &str) -> Result<Option<PageCandidate>>;

    /// Search pages by name, at most `limit` results.
    async fn search_pages(&self, query: &str, limit: u32) -> Result<Vec<PageCandidate>>;
}
