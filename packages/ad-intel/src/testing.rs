//! Mock implementations for tests.
//!
//! Useful for exercising pipelines without network calls to the model
//! provider or the scraping service.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::{AdIntelError, LlmError, LlmResult, Result};
use crate::pipeline::scrape::ScrapeConfig;
use crate::traits::{
    llm::{GenerationRequest, Llm},
    pages::PageDirectory,
    scraper::AdScraper,
};
use crate::types::PageCandidate;

/// A scripted model.
///
/// Each call pops the next scripted outcome; once the script is empty the
/// default reply is returned. Clones share the script and the call log.
#[derive(Clone, Default)]
pub struct MockLlm {
    script: Arc<RwLock<VecDeque<LlmResult<String>>>>,
    default_reply: Arc<RwLock<String>>,
    requests: Arc<RwLock<Vec<GenerationRequest>>>,
}

impl MockLlm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reply(self, reply: impl Into<String>) -> Self {
        self.push_reply(reply);
        self
    }

    pub fn with_failure(self, error: LlmError) -> Self {
        self.push_failure(error);
        self
    }

    /// Reply used once the script runs out.
    pub fn with_default_reply(self, reply: impl Into<String>) -> Self {
        *self
            .default_reply
            .write()
            .unwrap_or_else(PoisonError::into_inner) = reply.into();
        self
    }

    pub fn push_reply(&self, reply: impl Into<String>) {
        self.script
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(Ok(reply.into()));
    }

    pub fn push_failure(&self, error: LlmError) {
        self.script
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(Err(error));
    }

    /// Every request received, in order.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[async_trait]
impl Llm for MockLlm {
    async fn generate(&self, request: &GenerationRequest) -> LlmResult<String> {
        self.requests
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        let next = self
            .script
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();

        match next {
            Some(outcome) => outcome,
            None => Ok(self
                .default_reply
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()),
        }
    }
}

/// Record of a call made to the mock scraper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockScraperCall {
    PageAds { page_url: String },
    Reels { username: String },
    AdsLibrary { urls: Vec<String>, count: u32 },
}

/// A scraper returning canned items per target.
///
/// Unknown targets yield no items. Tracks the peak number of concurrent calls.
#[derive(Default)]
pub struct MockScraper {
    ads: HashMap<String, Vec<Value>>,
    reels: HashMap<String, Vec<Value>>,
    library_ads: Vec<Value>,
    failing: Vec<String>,
    calls: RwLock<Vec<MockScraperCall>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockScraper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ads(mut self, page_url: impl Into<String>, items: Vec<Value>) -> Self {
        self.ads.insert(page_url.into(), items);
        self
    }

    pub fn with_reels(mut self, username: impl Into<String>, items: Vec<Value>) -> Self {
        self.reels.insert(username.into(), items);
        self
    }

    /// Items returned by every Ads Library search.
    pub fn with_library_ads(mut self, items: Vec<Value>) -> Self {
        self.library_ads = items;
        self
    }

    /// Calls for `target` (page URL or username) fail.
    pub fn with_failure(mut self, target: impl Into<String>) -> Self {
        self.failing.push(target.into());
        self
    }

    pub fn calls(&self) -> Vec<MockScraperCall> {
        self.calls.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn respond(&self, call: MockScraperCall, target: &str, items: Option<&Vec<Value>>) -> Result<Vec<Value>> {
        self.calls
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        // Give other tasks a chance to overlap with this one
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.iter().any(|t| t == target) {
            return Err(AdIntelError::Scraper(format!("scrape of {target} failed").into()));
        }
        Ok(items.cloned().unwrap_or_default())
    }
}

#[async_trait]
impl AdScraper for MockScraper {
    async fn page_ads(&self, page_url: &str, _config: &ScrapeConfig) -> Result<Vec<Value>> {
        let call = MockScraperCall::PageAds {
            page_url: page_url.to_string(),
        };
        self.respond(call, page_url, self.ads.get(page_url)).await
    }

    async fn reels(&self, username: &str, _config: &ScrapeConfig) -> Result<Vec<Value>> {
        let call = MockScraperCall::Reels {
            username: username.to_string(),
        };
        self.respond(call, username, self.reels.get(username)).await
    }

    async fn ads_library(&self, urls: &[String], count: u32) -> Result<Vec<Value>> {
        let call = MockScraperCall::AdsLibrary {
            urls: urls.to_vec(),
            count,
        };
        let target = urls.join(",");
        self.respond(call, &target, Some(&self.library_ads)).await
    }
}

/// A canned page directory.
///
/// Slugs and search queries map to fixed answers; anything else finds
/// nothing. Queries listed as failing return an error.
#[derive(Default)]
pub struct MockPageDirectory {
    slugs: HashMap<String, PageCandidate>,
    searches: HashMap<String, Vec<PageCandidate>>,
    failing: Vec<String>,
    lookups: RwLock<Vec<String>>,
}

impl MockPageDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_slug(mut self, slug: impl Into<String>, page: PageCandidate) -> Self {
        self.slugs.insert(slug.into(), page);
        self
    }

    pub fn with_search(mut self, query: impl Into<String>, pages: Vec<PageCandidate>) -> Self {
        self.searches.insert(query.into(), pages);
        self
    }

    /// Slug lookups and searches for `query` fail.
    pub fn with_failure(mut self, query: impl Into<String>) -> Self {
        self.failing.push(query.into());
        self
    }

    /// Every lookup made, as `slug:<name>` or `search:<query>`.
    pub fn lookups(&self) -> Vec<String> {
        self.lookups.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn record(&self, entry: String, query: &str) -> Result<()> {
        self.lookups
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
        if self.failing.iter().any(|q| q == query) {
            return Err(AdIntelError::PageLookup(format!("lookup of {query} failed").into()));
        }
        Ok(())
    }
}

#[async_trait]
impl PageDirectory for MockPageDirectory {
    async fn page_by_slug(&self, slug: &str) -> Result<Option<PageCandidate>> {
        self.record(format!("slug:{slug}"), slug)?;
        Ok(self.slugs.get(slug).cloned())
    }

    async fn search_pages(&self, query: &str, limit: u32) -> Result<Vec<PageCandidate>> {
        self.record(format!("search:{query}"), query)?;
        let mut pages = self.searches.get(query).cloned().unwrap_or_default();
        pages.truncate(limit as usize);
        Ok(pages)
    }
}
