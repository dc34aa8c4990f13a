//! Fixed tag vocabularies and the tag set assigned to a record.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Value used when no vocabulary entry applies or tagging failed.
pub const NONE_TAG: &str = "none";

/// A named tag with its allowed values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagCategory {
    pub key: &'static str,
    pub label: &'static str,
    pub values: &'static [&'static str],
}

impl TagCategory {
    pub fn allows(&self, value: &str) -> bool {
        value == NONE_TAG || self.values.contains(&value)
    }
}

pub const HIERARCHY: TagCategory = TagCategory {
    key: "hierarchy_tag",
    label: "HIERARCHY_TAGS",
    values: &["product", "category", "industry", "brand", "none"],
};

pub const STORYLINE: TagCategory = TagCategory {
    key: "storyline_tag",
    label: "STORYLINE_TAGS",
    values: &[
        "unboxing",
        "testimonial",
        "before-after",
        "tutorial",
        "listicle",
        "daily-routine",
        "voice-over-showcase",
        "dialogue",
        "replicate-ad",
        "demonstration",
        "none",
    ],
};

pub const HOOK: TagCategory = TagCategory {
    key: "hook_tag",
    label: "HOOK_TAGS",
    values: &[
        "strong-reaction",
        "dramatize-problem",
        "absurd-alternative",
        "visual-trick",
        "highlight-popularity",
        "target-audience-callout",
        "controversy",
        "emphasize-one-usp",
        "none",
    ],
};

pub const CTA: TagCategory = TagCategory {
    key: "cta_tag",
    label: "CTA_TAGS",
    values: &[
        "buy_now",
        "download_now",
        "visit_website",
        "sign_up",
        "subscribe",
        "start_free_trial",
        "learn_more",
        "none",
    ],
};

pub const ACTOR: TagCategory = TagCategory {
    key: "actor_tag",
    label: "ACTOR_TAGS",
    values: &["male", "female", "mixed", "none"],
};

/// Target-audience personas. "none" is only ever a fallback here.
pub const ICP: TagCategory = TagCategory {
    key: "icp_tag",
    label: "ICP_TAGS",
    values: &["moms", "athletes", "students", "travelers", "golfers"],
};

/// Every category, in prompt and output order.
pub const TAG_CATEGORIES: [TagCategory; 6] = [HIERARCHY, STORYLINE, HOOK, CTA, ACTOR, ICP];

/// Persona descriptions shown to the model.
pub const PERSONAS: [(&str, &str); 5] = [
    (
        "moms",
        "the video features a woman with a child or baby bump, parenting tips, nursery scenes, family routines, baby products, or mom-focused voice-over.",
    ),
    (
        "athletes",
        "the video contains athletic activity (running, gym workouts, sports gear), sporty clothing, coaches/trainers, fitness metrics, competitive or performance imagery.",
    ),
    (
        "students",
        "scenes of classrooms, textbooks, studying setups, backpacks, campus life, teachers explaining concepts, exam prep, or youth-oriented slang.",
    ),
    (
        "travelers",
        "travel footage (landmarks, suitcases, boarding passes), exotic locations, hotel/hostel scenes, flight or train shots, itineraries, or voice-over about exploring.",
    ),
    (
        "golfers",
        "golf courses, clubs/putters, tee shots, fairways/greens, golf attire (polo shirts, visors), swing tutorials, caddie interactions, or scoring overlays.",
    ),
];

/// Tags assigned to one record. A tag the model omitted stays unset.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TagSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hierarchy_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storyline_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hook_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cta_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icp_tag: Option<String>,
}

impl TagSet {
    /// Every tag set to "none".
    pub fn fallback() -> Self {
        let none = || Some(NONE_TAG.to_string());
        Self {
            hierarchy_tag: none(),
            storyline_tag: none(),
            hook_tag: none(),
            cta_tag: none(),
            actor_tag: none(),
            icp_tag: none(),
        }
    }

    /// Build from a parsed model reply. Unknown keys are dropped and values
    /// outside a category's vocabulary become "none".
    pub fn from_reply(reply: &Map<String, Value>) -> Self {
        let mut tags = Self::default();
        for category in TAG_CATEGORIES {
            let Some(value) = reply.get(category.key) else {
                continue;
            };
            let chosen = value
                .as_str()
                .map(|s| s.trim().to_lowercase())
                .filter(|s| category.allows(s))
                .unwrap_or_else(|| NONE_TAG.to_string());
            *tags.slot_mut(category.key) = Some(chosen);
        }
        tags
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        match key {
            "hierarchy_tag" => self.hierarchy_tag.as_deref(),
            "storyline_tag" => self.storyline_tag.as_deref(),
            "hook_tag" => self.hook_tag.as_deref(),
            "cta_tag" => self.cta_tag.as_deref(),
            "actor_tag" => self.actor_tag.as_deref(),
            "icp_tag" => self.icp_tag.as_deref(),
            _ => None,
        }
    }

    fn slot_mut(&mut self, key: &str) -> &mut Option<String> {
        match key {
            "hierarchy_tag" => &mut self.hierarchy_tag,
            "storyline_tag" => &mut self.storyline_tag,
            "hook_tag" => &mut self.hook_tag,
            "cta_tag" => &mut self.cta_tag,
            "actor_tag" => &mut self.actor_tag,
            _ => &mut self.icp_tag,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge the tags over `entry`. Non-object entries are replaced by the
    /// tags alone.
    pub fn merge_into(&self, entry: &Value) -> Value {
        let mut merged = match entry {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };
        for category in TAG_CATEGORIES {
            if let Some(value) = self.get(category.key) {
                merged.insert(category.key.to_string(), Value::String(value.to_string()));
            }
        }
        Value::Object(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fallback_is_all_none() {
        let tags = TagSet::fallback();
        for category in TAG_CATEGORIES {
            assert_eq!(tags.get(category.key), Some(NONE_TAG));
        }
    }

    #[test]
    fn sanitizes_reply() {
        let reply = json!({
            "hierarchy_tag": "Product",
            "storyline_tag": "space-opera",
            "hook_tag": 7,
            "icp_tag": "golfers",
            "mood_tag": "happy"
        });
        let tags = TagSet::from_reply(reply.as_object().unwrap());

        assert_eq!(tags.hierarchy_tag.as_deref(), Some("product"));
        assert_eq!(tags.storyline_tag.as_deref(), Some("none"));
        assert_eq!(tags.hook_tag.as_deref(), Some("none"));
        assert_eq!(tags.cta_tag, None);
        assert_eq!(tags.icp_tag.as_deref(), Some("golfers"));
        assert_eq!(tags.get("mood_tag"), None);
    }

    #[test]
    fn merge_overrides_entry_fields() {
        let entry = json!({ "snapshot_title": "Polo", "icp_tag": "stale" });
        let tags = TagSet {
            icp_tag: Some("athletes".into()),
            ..TagSet::default()
        };
        let merged = tags.merge_into(&entry);
        assert_eq!(merged["snapshot_title"], "Polo");
        assert_eq!(merged["icp_tag"], "athletes");
        assert!(merged.get("hook_tag").is_none());

        assert_eq!(tags.merge_into(&json!("scalar")), json!({ "icp_tag": "athletes" }));
    }

    #[test]
    fn empty_reply_is_empty_tag_set() {
        assert!(TagSet::from_reply(&Map::new()).is_empty());
    }
}
