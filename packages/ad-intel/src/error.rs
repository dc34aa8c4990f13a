//! Typed errors for the ad-intel library.
//!
//! Uses `thiserror` for library errors (not `anyhow`); the CLI wraps these
//! with context at the edge.

use thiserror::Error;

/// Errors that can occur while scraping, filtering, ranking or tagging.
#[derive(Debug, Error)]
pub enum AdIntelError {
    /// Hosted model call failed and was not recovered
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Scraping service failed
    #[error("scraper error: {0}")]
    Scraper(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Page directory request failed
    #[error("page lookup error: {0}")]
    PageLookup(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Storage operation failed
    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A scraper payload did not have the expected shape
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Reading or writing an output file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),

    /// Table names are interpolated into SQL, so they must be plain identifiers
    #[error("invalid table name: {name}")]
    InvalidTable { name: String },
}

impl From<sqlx::Error> for AdIntelError {
    fn from(err: sqlx::Error) -> Self {
        AdIntelError::Storage(Box::new(err))
    }
}

impl From<reqwest::Error> for AdIntelError {
    fn from(err: reqwest::Error) -> Self {
        AdIntelError::PageLookup(Box::new(err))
    }
}

impl From<apify_client::ApifyError> for AdIntelError {
    fn from(err: apify_client::ApifyError) -> Self {
        AdIntelError::Scraper(Box::new(err))
    }
}

/// Errors surfaced by an [`Llm`](crate::traits::llm::Llm) implementation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LlmError {
    /// Rate limited or temporarily unavailable (HTTP 429 / 503)
    #[error("transient model error (status {status}): {message}")]
    Transient { status: u16, message: String },

    /// Anything else: bad request, auth, network, unparseable response
    #[error("model error: {0}")]
    Permanent(String),
}

impl LlmError {
    pub fn is_transient(&self) -> bool {
        matches!(self, LlmError::Transient { .. })
    }
}

/// Errors from decoding nested scraper payloads under a strict policy.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("missing field: {path}")]
    MissingField { path: String },

    #[error("field {path} is not a {expected}")]
    WrongType { path: String, expected: &'static str },
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, AdIntelError>;

/// Result type alias for model calls.
pub type LlmResult<T> = std::result::Result<T, LlmError>;
