//! Best-effort recovery of a JSON object from model output.
//!
//! Contract: the trimmed reply is parsed as a JSON object; failing that, the
//! text between the first `{` and the last `}` is parsed. `None` means no
//! object could be recovered. Callers decide what an absent object means.

use serde_json::{Map, Value};

pub fn parse_object(raw: &str) -> Option<Map<String, Value>> {
    let trimmed = raw.trim();

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
        return Some(map);
    }

    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }

    match serde_json::from_str::<Value>(&trimmed[start..=end]) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_clean_object() {
        let map = parse_object(r#" {"hook_tag": "controversy"} "#).unwrap();
        assert_eq!(map["hook_tag"], "controversy");
    }

    #[test]
    fn extracts_object_from_fenced_or_chatty_reply() {
        let fenced = "```json\n{\"cta_tag\": \"buy_now\"}\n```";
        assert_eq!(parse_object(fenced).unwrap()["cta_tag"], "buy_now");

        let chatty = "Sure! Here are the tags: {\"actor_tag\": \"female\"} Hope that helps.";
        assert_eq!(parse_object(chatty).unwrap()["actor_tag"], "female");
    }

    #[test]
    fn unrecoverable_replies() {
        assert!(parse_object("").is_none());
        assert!(parse_object("no braces here").is_none());
        assert!(parse_object("} backwards {").is_none());
        assert!(parse_object("{ not json }").is_none());
        assert!(parse_object("[1, 2]").is_none());
    }
}
