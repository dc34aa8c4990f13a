//! Facebook page search results.

use serde::{Deserialize, Serialize};

/// Verification badge reported for official pages.
pub const BLUE_VERIFIED: &str = "blue_verified";

/// A page returned by a slug lookup or a name search.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PageCandidate {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub verification_status: Option<String>,
    #[serde(default)]
    pub fan_count: Option<i64>,
}

impl PageCandidate {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_fan_count(mut self, fans: i64) -> Self {
        self.fan_count = Some(fans);
        self
    }

    pub fn verified(mut self) -> Self {
        self.verification_status = Some(BLUE_VERIFIED.to_string());
        self
    }

    pub fn is_verified(&self) -> bool {
        self.verification_status.as_deref() == Some(BLUE_VERIFIED)
    }
}
