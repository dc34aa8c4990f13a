//! Whole-word, case-insensitive keyword matching.

use regex::{Regex, RegexBuilder};

/// Matches any of a fixed set of keywords as whole words.
///
/// Blank keywords are ignored; a matcher built from no usable keywords never
/// matches.
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    pattern: Option<Regex>,
}

impl KeywordMatcher {
    pub fn new<S: AsRef<str>>(keywords: &[S]) -> Self {
        let alternatives: Vec<String> = keywords
            .iter()
            .map(|k| k.as_ref().trim())
            .filter(|k| !k.is_empty())
            .map(regex::escape)
            .collect();

        if alternatives.is_empty() {
            return Self { pattern: None };
        }

        // Escaped literals cannot produce an invalid pattern; only the size
        // limit can reject it, in which case nothing matches.
        let pattern = RegexBuilder::new(&format!(r"\b(?:{})\b", alternatives.join("|")))
            .case_insensitive(true)
            .build()
            .map_err(|e| tracing::warn!(error = %e, "Keyword pattern rejected"))
            .ok();

        Self { pattern }
    }

    pub fn is_empty(&self) -> bool {
        self.pattern.is_none()
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.pattern.as_ref().is_some_and(|p| p.is_match(text))
    }
}

/// True iff some keyword appears in `text` as a whole word, ignoring case.
pub fn matches_any<S: AsRef<str>>(text: &str, keywords: &[S]) -> bool {
    KeywordMatcher::new(keywords).is_match(text)
}

/// Split a comma-separated keyword list, dropping blanks.
pub fn parse_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}
