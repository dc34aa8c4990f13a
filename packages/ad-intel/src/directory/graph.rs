//! Facebook Graph API page directory.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{AdIntelError, Result};
use crate::traits::pages::PageDirectory;
use crate::types::PageCandidate;

const GRAPH_URL: &str = "https://graph.facebook.com/v17.0";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<PageCandidate>,
}

/// Resolves pages through the Graph API with an app access token.
#[derive(Clone)]
pub struct GraphPageDirectory {
    client: Client,
    token: String,
    base_url: String,
}

impl GraphPageDirectory {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            token: token.into(),
            base_url: GRAPH_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    async fn get(&self, path: &str, params: &[(&str, &str)]) -> Result<Option<String>> {
        let response = self
            .client
            .get(format!("{}/{}", self.base_url, path))
            .query(params)
            .query(&[("access_token", self.token.as_str())])
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(Some(response.text().await?));
        }
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let message = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), %message, "Graph API request rejected");
        Err(AdIntelError::PageLookup(
            format!("Graph API returned {status}: {message}").into(),
        ))
    }
}

fn parse_page(body: &str) -> Result<Option<PageCandidate>> {
    let page: PageCandidate = serde_json::from_str(body)?;
    Ok((!page.id.is_empty()).then_some(page))
}

fn parse_search(body: &str) -> Result<Vec<PageCandidate>> {
    let response: SearchResponse = serde_json::from_str(body)?;
    Ok(response.data.into_iter().filter(|p| !p.id.is_empty()).collect())
}

#[async_trait]
impl PageDirectory for GraphPageDirectory {
    async fn page_by_slug(&self, slug: &str) -> Result<Option<PageCandidate>> {
        match self.get(slug, &[("fields", "id,name")]).await? {
            Some(body) => parse_page(&body),
            None => {
                debug!(slug, "No page node for slug");
                Ok(None)
            }
        }
    }

    async fn search_pages(&self, query: &str, limit: u32) -> Result<Vec<PageCandidate>> {
        let limit = limit.to_string();
        let params = [
            ("type", "page"),
            ("q", query),
            ("fields", "id,name,verification_status,fan_count"),
            ("limit", limit.as_str()),
        ];
        match self.get("search", &params).await? {
            Some(body) => parse_search(&body),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_page_node() {
        let page = parse_page(r#"{"id": "1234", "name": "Snitch"}"#).unwrap().unwrap();
        assert_eq!(page, PageCandidate::new("1234").with_name("Snitch"));
    }

    #[test]
    fn parses_search_results() {
        let pages = parse_search(
            r#"{"data": [
                {"id": "1", "name": "Snitch", "verification_status": "blue_verified", "fan_count": 90000},
                {"id": "2", "name": "Snitch Fans"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(pages.len(), 2);
        assert!(pages[0].is_verified());
        assert_eq!(pages[0].fan_count, Some(90_000));
        assert_eq!(pages[1].fan_count, None);
    }

    #[test]
    fn empty_search_has_no_pages() {
        assert!(parse_search("{}").unwrap().is_empty());
        assert!(parse_search(r#"{"data": []}"#).unwrap().is_empty());
    }

    #[test]
    fn malformed_body_is_an_error() {
        assert!(matches!(parse_page("<html>"), Err(AdIntelError::JsonParse(_))));
    }

    #[test]
    fn base_url_override() {
        let directory = GraphPageDirectory::new("token").with_base_url("http://localhost:9999");
        assert_eq!(directory.base_url, "http://localhost:9999");
    }
}
