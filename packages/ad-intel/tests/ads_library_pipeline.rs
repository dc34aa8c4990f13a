//! Integration tests for the on-disk Ads Library flow:
//! flatten, prefilter, rank, tag and split by persona.

use ad_intel::output::{load_json_records, write_json_array, write_tagged_outputs};
use ad_intel::testing::MockLlm;
use ad_intel::{
    prefilter, rank_ads, AdFilterConfig, ContentTagger, EntryKind, FlattenedAd, RankConfig,
    RankedAd, RetryPolicy, TaggerConfig,
};
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use serde_json::{json, Value};
use std::time::Duration;

fn raw_ad(page: &str, video: &str, days_ago: i64, likes: i64) -> Value {
    let now = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
    json!({
        "page_name": page,
        "start_date": (now - ChronoDuration::days(days_ago)).timestamp(),
        "snapshot": {
            "title": format!("{page} drop"),
            "body": { "text": "Breathable cotton polo" },
            "cta_type": "SHOP_NOW",
            "page_like_count": likes,
            "page_categories": ["Clothing", "Retail"],
            "videos": [{ "video_hd_url": video, "video_preview_image_url": format!("{video}.jpg") }]
        }
    })
}

fn tagger(llm: MockLlm) -> ContentTagger<MockLlm> {
    ContentTagger::new(
        llm,
        TaggerConfig::default()
            .with_pacing(Duration::ZERO)
            .with_retry(RetryPolicy::none()),
    )
}

#[tokio::test]
async fn test_raw_ads_to_persona_files() {
    let dir = tempfile::tempdir().unwrap();
    let now = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();

    let raw = vec![
        raw_ad("Alpha", "https://v/1", 30, 50_000),
        raw_ad("Alpha", "https://v/1", 20, 50_000),
        raw_ad("Beta", "https://v/2", 40, 20_000),
        raw_ad("Fresh", "https://v/3", 10, 90_000),
        raw_ad("Small", "https://v/4", 100, 18_000),
    ];
    let raw_path = dir.path().join("meta_ads.json");
    write_json_array(&raw_path, &raw).unwrap();

    let flattened: Vec<FlattenedAd> = load_json_records(&raw_path)
        .unwrap()
        .iter()
        .map(|item| FlattenedAd::from_raw(item, now))
        .collect();
    assert_eq!(flattened[0].page_categories, "Clothing,Retail");

    let kept = prefilter(flattened, &AdFilterConfig::default());
    assert_eq!(kept.len(), 3);

    // Filtered output is re-read the way the rank command reads it
    let filtered_path = dir.path().join("filtered_meta_ads.json");
    write_json_array(&filtered_path, &kept).unwrap();
    let reloaded: Vec<FlattenedAd> = load_json_records(&filtered_path)
        .unwrap()
        .into_iter()
        .map(|v| serde_json::from_value(v).unwrap())
        .collect();
    assert_eq!(reloaded, kept);

    let ranked = rank_ads(&reloaded, &RankConfig::default());
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0].page_name, "Beta");
    assert_eq!(ranked[0].days_since_start, Some(40));
    assert_eq!(ranked[1].page_name, "Alpha");
    assert_eq!(ranked[1].count, 2);
    assert_eq!(ranked[1].days_since_start, Some(30));
    assert_eq!(ranked[1].videos.video_preview_image_url, "https://v/1.jpg");

    let entries: Vec<Value> = ranked
        .iter()
        .map(|ad| serde_json::to_value(ad).unwrap())
        .collect();
    let llm = MockLlm::new()
        .with_reply(r#"{"hierarchy_tag": "Product", "actor_tag": "male", "icp_tag": "Golfers"}"#)
        .with_reply("```json\n{\"icp_tag\": \"athletes\", \"hook_tag\": \"made-up\"}\n```");
    let tagged = tagger(llm.clone()).tag_entries(&entries, EntryKind::RankedAds).await;

    assert!(llm.requests()[0].prompt.contains("https://v/2"));
    assert_eq!(tagged[0]["hierarchy_tag"], "product");
    assert_eq!(tagged[0]["icp_tag"], "golfers");
    assert_eq!(tagged[1]["icp_tag"], "athletes");
    assert_eq!(tagged[1]["hook_tag"], "none");
    assert_eq!(tagged[1]["page_name"], "Alpha");

    let out_dir = dir.path().join("tagged_meta_ads");
    let outputs = write_tagged_outputs(&out_dir, "all_tagged.json", &tagged).unwrap();
    assert_eq!(load_json_records(&outputs.all).unwrap().len(), 2);

    let personas: Vec<(&str, usize)> = outputs
        .personas
        .iter()
        .map(|(persona, _, count)| (persona.as_str(), *count))
        .collect();
    assert_eq!(personas, vec![("athletes", 1), ("golfers", 1)]);

    let golfers = load_json_records(&out_dir.join("tagged_golfers.json")).unwrap();
    let golfer: RankedAd = serde_json::from_value(golfers[0].clone()).unwrap();
    assert_eq!(golfer.page_name, "Beta");
}

#[tokio::test]
async fn test_model_failure_falls_back_to_none_tags() {
    let entries = vec![json!({ "url": "https://shorts/1", "title": "Swing tips" })];
    let llm = MockLlm::new().with_failure(ad_intel::LlmError::Permanent("quota".into()));

    let tagged = tagger(llm).tag_entries(&entries, EntryKind::Shorts).await;

    assert_eq!(tagged[0]["title"], "Swing tips");
    for key in ["hierarchy_tag", "storyline_tag", "hook_tag", "cta_tag", "actor_tag", "icp_tag"] {
        assert_eq!(tagged[0][key], "none");
    }
}

#[test]
fn test_ads_without_video_are_dropped() {
    let now = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
    let mut no_video = raw_ad("Gamma", "", 60, 40_000);
    no_video["snapshot"]["videos"] = json!([]);
    let ads = vec![FlattenedAd::from_raw(&no_video, now)];

    assert!(prefilter(ads.clone(), &AdFilterConfig::default()).is_empty());
    assert!(rank_ads(&ads, &RankConfig::default()).is_empty());
}
