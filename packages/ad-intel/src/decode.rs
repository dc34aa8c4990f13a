//! Explicit decoding of nested scraper payloads.
//!
//! Scraper items have no fixed schema. Fields are addressed with a
//! [`FieldPath`] and read under a [`DecodePolicy`]: `Strict` reports the
//! first missing or mistyped field, `Lenient` treats it as empty.

use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::DecodeError;

/// A path of object keys into a JSON document, e.g. `snapshot.caption`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Parse a dot-separated path.
    pub fn parse(dotted: &str) -> Self {
        Self::new(dotted.split('.').filter(|s| !s.is_empty()))
    }

    /// Resolve the path. `null` counts as absent.
    pub fn lookup<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        let found = self
            .0
            .iter()
            .try_fold(value, |current, key| current.get(key.as_str()))?;
        (!found.is_null()).then_some(found)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

impl FromStr for FieldPath {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

/// How absent or mistyped fields are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodePolicy {
    Strict,
    /// Missing values read as empty string / `None`.
    #[default]
    Lenient,
}

/// Read a scalar as text. Numbers and booleans are rendered.
pub fn text_at(value: &Value, path: &FieldPath, policy: DecodePolicy) -> Result<String, DecodeError> {
    match path.lookup(value) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::Bool(b)) => Ok(b.to_string()),
        Some(_) => match policy {
            DecodePolicy::Strict => Err(DecodeError::WrongType {
                path: path.to_string(),
                expected: "string",
            }),
            DecodePolicy::Lenient => Ok(String::new()),
        },
        None => match policy {
            DecodePolicy::Strict => Err(DecodeError::MissingField {
                path: path.to_string(),
            }),
            DecodePolicy::Lenient => Ok(String::new()),
        },
    }
}

/// Read an integer. Floats are truncated, numeric strings parsed.
pub fn i64_at(value: &Value, path: &FieldPath, policy: DecodePolicy) -> Result<Option<i64>, DecodeError> {
    let found = match path.lookup(value) {
        Some(v) => v,
        None => {
            return match policy {
                DecodePolicy::Strict => Err(DecodeError::MissingField {
                    path: path.to_string(),
                }),
                DecodePolicy::Lenient => Ok(None),
            }
        }
    };

    let parsed = match found {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    match (parsed, policy) {
        (Some(n), _) => Ok(Some(n)),
        (None, DecodePolicy::Strict) => Err(DecodeError::WrongType {
            path: path.to_string(),
            expected: "integer",
        }),
        (None, DecodePolicy::Lenient) => Ok(None),
    }
}

/// Read an array; absent or non-array values are empty under `Lenient`.
pub fn array_at<'a>(
    value: &'a Value,
    path: &FieldPath,
    policy: DecodePolicy,
) -> Result<&'a [Value], DecodeError> {
    match (path.lookup(value), policy) {
        (Some(Value::Array(items)), _) => Ok(items.as_slice()),
        (Some(_), DecodePolicy::Strict) => Err(DecodeError::WrongType {
            path: path.to_string(),
            expected: "array",
        }),
        (None, DecodePolicy::Strict) => Err(DecodeError::MissingField {
            path: path.to_string(),
        }),
        (_, DecodePolicy::Lenient) => Ok(&[]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_dotted_paths() {
        let path: FieldPath = "snapshot.body.text".parse().unwrap();
        assert_eq!(path, FieldPath::new(["snapshot", "body", "text"]));
        assert_eq!(path.to_string(), "snapshot.body.text");
    }

    #[test]
    fn lenient_reads_missing_as_empty() {
        let ad = json!({ "snapshot": { "caption": null } });
        let caption = FieldPath::parse("snapshot.caption");
        let title = FieldPath::parse("snapshot.title.text");

        assert_eq!(text_at(&ad, &caption, DecodePolicy::Lenient).unwrap(), "");
        assert_eq!(text_at(&ad, &title, DecodePolicy::Lenient).unwrap(), "");
        assert_eq!(i64_at(&ad, &title, DecodePolicy::Lenient).unwrap(), None);
    }

    #[test]
    fn strict_reports_the_missing_path() {
        let ad = json!({ "snapshot": {} });
        let err = text_at(&ad, &FieldPath::parse("snapshot.caption"), DecodePolicy::Strict).unwrap_err();
        assert_eq!(
            err,
            DecodeError::MissingField {
                path: "snapshot.caption".into()
            }
        );
    }

    #[test]
    fn strict_reports_wrong_types() {
        let ad = json!({ "snapshot": { "caption": ["a"], "likes": "many" } });
        assert!(matches!(
            text_at(&ad, &FieldPath::parse("snapshot.caption"), DecodePolicy::Strict),
            Err(DecodeError::WrongType { expected: "string", .. })
        ));
        assert!(matches!(
            i64_at(&ad, &FieldPath::parse("snapshot.likes"), DecodePolicy::Strict),
            Err(DecodeError::WrongType { expected: "integer", .. })
        ));
    }

    #[test]
    fn scalars_render_as_text() {
        let ad = json!({ "likes": 18001, "active": true, "count": "42" });
        assert_eq!(text_at(&ad, &FieldPath::parse("likes"), DecodePolicy::Strict).unwrap(), "18001");
        assert_eq!(text_at(&ad, &FieldPath::parse("active"), DecodePolicy::Strict).unwrap(), "true");
        assert_eq!(i64_at(&ad, &FieldPath::parse("count"), DecodePolicy::Strict).unwrap(), Some(42));
    }

    #[test]
    fn arrays() {
        let ad = json!({ "snapshot": { "cards": [{ "videoHdUrl": "a" }] } });
        let cards = array_at(&ad, &FieldPath::parse("snapshot.cards"), DecodePolicy::Strict).unwrap();
        assert_eq!(cards.len(), 1);
        assert!(array_at(&ad, &FieldPath::parse("snapshot.videos"), DecodePolicy::Lenient)
            .unwrap()
            .is_empty());
    }
}
