//! Configuration loaded from environment variables.

use dotenvy::dotenv;
use std::env;
use std::time::Duration;

use crate::error::{AdIntelError, Result};
use crate::rate_limit::CallWindow;

/// Process configuration.
///
/// Credentials are optional here because each command needs a different
/// subset; commands call the `require_*` accessors for what they use.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub apify_api_token: Option<String>,
    pub openai_api_key: Option<String>,
    /// Graph API token for resolving brand names to page ids.
    pub facebook_graph_token: Option<String>,
    pub llm_model: String,
    pub llm_calls_per_window: usize,
    pub llm_window: Duration,
}

impl Config {
    /// Load configuration from the environment, reading `.env` if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            database_url: non_empty("DATABASE_URL"),
            apify_api_token: non_empty("APIFY_API_TOKEN"),
            openai_api_key: non_empty("OPENAI_API_KEY"),
            facebook_graph_token: non_empty("FB_GRAPH_TOKEN"),
            llm_model: non_empty("LLM_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string()),
            llm_calls_per_window: parse_or(non_empty("LLM_CALLS_PER_WINDOW"), "LLM_CALLS_PER_WINDOW", 15)?,
            llm_window: Duration::from_secs(parse_or(non_empty("LLM_WINDOW_SECS"), "LLM_WINDOW_SECS", 60)?),
        })
    }

    pub fn require_database_url(&self) -> Result<&str> {
        required(self.database_url.as_deref(), "DATABASE_URL")
    }

    pub fn require_apify_token(&self) -> Result<&str> {
        required(self.apify_api_token.as_deref(), "APIFY_API_TOKEN")
    }

    pub fn require_openai_key(&self) -> Result<&str> {
        required(self.openai_api_key.as_deref(), "OPENAI_API_KEY")
    }

    /// The process-wide classifier window.
    pub fn call_window(&self) -> CallWindow {
        CallWindow::new(self.llm_calls_per_window, self.llm_window)
    }
}

fn required<'a>(value: Option<&'a str>, key: &str) -> Result<&'a str> {
    value.ok_or_else(|| AdIntelError::Config(format!("{key} must be set")))
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, key: &str, default: T) -> Result<T> {
    match value {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AdIntelError::Config(format!("{key} must be a valid number, got {raw:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.llm_model, "gpt-4o-mini");
        assert!(config.facebook_graph_token.is_none());
        assert_eq!(config.llm_calls_per_window, 15);
        assert_eq!(config.llm_window, Duration::from_secs(60));
        assert!(matches!(config.require_database_url(), Err(AdIntelError::Config(_))));
    }

    #[test]
    fn reads_overrides() {
        let config = config(&[
            ("DATABASE_URL", "postgres://localhost/ads"),
            ("LLM_MODEL", "gpt-4o"),
            ("LLM_CALLS_PER_WINDOW", "30"),
            ("LLM_WINDOW_SECS", " 120 "),
            ("OPENAI_API_KEY", "  "),
            ("FB_GRAPH_TOKEN", "graph-token"),
        ])
        .unwrap();

        assert_eq!(config.require_database_url().unwrap(), "postgres://localhost/ads");
        assert_eq!(config.llm_model, "gpt-4o");
        assert_eq!(config.call_window().max_calls(), 30);
        assert_eq!(config.call_window().window(), Duration::from_secs(120));
        assert!(config.require_openai_key().is_err());
        assert_eq!(config.facebook_graph_token.as_deref(), Some("graph-token"));
    }

    #[test]
    fn rejects_bad_numbers() {
        assert!(matches!(
            config(&[("LLM_CALLS_PER_WINDOW", "lots")]),
            Err(AdIntelError::Config(_))
        ));
    }
}
