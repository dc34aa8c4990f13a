//! Brand name to page id resolution and multi-target Ads Library searches.

use apify_client::{ads_library_url, AdsLibraryTarget};
use serde_json::Value;
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::error::{AdIntelError, Result};
use crate::traits::{pages::PageDirectory, scraper::AdScraper};
use crate::types::PageCandidate;

/// Results fetched per name search.
const SEARCH_LIMIT: u32 = 5;

/// Pause before the shortened-name retry.
const RETRY_PAUSE: Duration = Duration::from_secs(1);

/// Pick the page a name search most likely meant.
///
/// The first verified page wins. Otherwise the page with the most fans,
/// with a missing count treated as zero and earlier results winning ties.
pub fn pick_best_page(pages: &[PageCandidate]) -> Option<&PageCandidate> {
    if let Some(page) = pages.iter().find(|p| p.is_verified()) {
        return Some(page);
    }
    let fans = |page: &PageCandidate| page.fan_count.unwrap_or(0);
    let mut best: Option<&PageCandidate> = None;
    for page in pages {
        if best.map_or(true, |top| fans(page) > fans(top)) {
            best = Some(page);
        }
    }
    best
}

/// Resolve a brand name to a numeric page id.
///
/// Tries a slug lookup, then a name search, then a search on the part of
/// the name before any `&`. Lookup errors are logged and the next step runs.
#[instrument(skip(directory))]
pub async fn resolve_page_id(directory: &dyn PageDirectory, name: &str) -> Option<String> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    match directory.page_by_slug(name).await {
        Ok(Some(page)) => {
            info!(page_id = %page.id, page_name = ?page.name, "Direct lookup found page");
            return Some(page.id);
        }
        Ok(None) => {}
        Err(e) => warn!(error = %e, "Direct page lookup failed"),
    }

    match directory.search_pages(name, SEARCH_LIMIT).await {
        Ok(pages) => {
            if let Some(page) = pick_best_page(&pages) {
                info!(page_id = %page.id, page_name = ?page.name, "Search found page");
                return Some(page.id.clone());
            }
            warn!("No pages found for query");
        }
        Err(e) => warn!(error = %e, "Page search failed"),
    }

    let shortened = name.split('&').next().unwrap_or(name).trim();
    if !shortened.is_empty() && shortened != name {
        tokio::time::sleep(RETRY_PAUSE).await;
        match directory.search_pages(shortened, SEARCH_LIMIT).await {
            Ok(pages) => {
                if let Some(page) = pages.into_iter().next() {
                    info!(page_id = %page.id, query = shortened, "Shortened search found page");
                    return Some(page.id);
                }
            }
            Err(e) => warn!(error = %e, query = shortened, "Shortened page search failed"),
        }
    }

    warn!("Could not find page id");
    None
}

/// Build Ads Library targets from brand names and explicit page ids.
///
/// Page ids are used as given. Names are resolved through the directory
/// when one is available; unresolved names fall back to a keyword search,
/// and numeric names are taken as page ids. Blank values are skipped.
pub async fn ads_library_targets(
    directory: Option<&dyn PageDirectory>,
    names: &[String],
    page_ids: &[String],
) -> Vec<AdsLibraryTarget> {
    let mut targets: Vec<AdsLibraryTarget> = page_ids
        .iter()
        .map(|id| id.trim())
        .filter(|id| !id.is_empty())
        .map(|id| AdsLibraryTarget::Page(id.to_string()))
        .collect();

    for name in names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
        let fallback = AdsLibraryTarget::from_page_id_or_name(name);
        let target = match directory {
            Some(directory) if matches!(fallback, AdsLibraryTarget::Keyword(_)) => {
                resolve_page_id(directory, name)
                    .await
                    .map(AdsLibraryTarget::Page)
                    .unwrap_or(fallback)
            }
            _ => fallback,
        };
        targets.push(target);
    }
    targets
}

/// Run one Ads Library search covering every target.
#[instrument(skip(scraper, targets), fields(targets = targets.len()))]
pub async fn search_ads_library<S: AdScraper + ?Sized>(
    scraper: &S,
    targets: &[AdsLibraryTarget],
    count: u32,
) -> Result<Vec<Value>> {
    if targets.is_empty() {
        return Err(AdIntelError::Config(
            "Ads Library search needs at least one query or page id".into(),
        ));
    }
    let urls = targets
        .iter()
        .map(ads_library_url)
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let items = scraper.ads_library(&urls, count).await?;
    info!(items = items.len(), "Ads Library search finished");
    Ok(items)
}
