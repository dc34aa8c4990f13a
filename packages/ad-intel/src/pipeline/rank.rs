//! Group ads by video and rank the groups.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

use crate::types::FlattenedAd;

/// Ads sharing one exact video URL.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoGroup {
    pub video_url: String,
    pub count: usize,
    /// Maximum over members.
    pub days_since_start: Option<i64>,
    /// Descriptive fields come from the first member seen.
    pub first: FlattenedAd,
}

impl VideoGroup {
    pub fn popularity(&self) -> Option<i64> {
        self.first.page_like_count
    }
}

/// Ranking knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankConfig {
    pub top_n: usize,
}

impl Default for RankConfig {
    fn default() -> Self {
        Self { top_n: 40 }
    }
}

impl RankConfig {
    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }
}

/// Group by exact video URL in first-seen order. Ads without a video URL
/// are dropped.
pub fn aggregate_by_video(ads: &[FlattenedAd]) -> Vec<VideoGroup> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<VideoGroup> = Vec::new();

    for ad in ads {
        let Some(url) = ad.video_url() else {
            continue;
        };

        match index.get(url) {
            Some(&i) => {
                let group = &mut groups[i];
                group.count += 1;
                group.days_since_start = group.days_since_start.max(ad.days_since_start);
            }
            None => {
                index.insert(url, groups.len());
                groups.push(VideoGroup {
                    video_url: url.to_string(),
                    count: 1,
                    days_since_start: ad.days_since_start,
                    first: ad.clone(),
                });
            }
        }
    }

    debug!(ads = ads.len(), groups = groups.len(), "Aggregated ads by video");
    groups
}

/// Recency, then duplicate count, then popularity, all descending. Missing
/// values sort last.
fn compare_groups(a: &VideoGroup, b: &VideoGroup) -> Ordering {
    b.days_since_start
        .cmp(&a.days_since_start)
        .then_with(|| b.count.cmp(&a.count))
        .then_with(|| b.popularity().cmp(&a.popularity()))
}

/// Stable sort by the composite key, truncated to `top_n`.
pub fn rank_groups(mut groups: Vec<VideoGroup>, config: &RankConfig) -> Vec<VideoGroup> {
    groups.sort_by(compare_groups);
    groups.truncate(config.top_n);
    groups
}

/// Video reference written with each ranked ad.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RankedVideo {
    pub video_hd_url: String,
    pub video_preview_image_url: String,
}

/// One ranked group as written to the top-N file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RankedAd {
    pub count: usize,
    pub days_since_start: Option<i64>,
    pub page_name: String,
    pub snapshot_page_profile_picture_url: String,
    pub snapshot_body_text: String,
    pub snapshot_caption: String,
    pub snapshot_cta_text: String,
    pub snapshot_cta_type: String,
    pub snapshot_link_description: String,
    pub snapshot_link_url: String,
    pub snapshot_page_categories: String,
    pub snapshot_page_like_count: Option<i64>,
    pub snapshot_title: String,
    #[serde(rename = "snapshot.videos")]
    pub videos: RankedVideo,
}

impl From<VideoGroup> for RankedAd {
    fn from(group: VideoGroup) -> Self {
        let first = group.first;
        let preview = first
            .video
            .as_ref()
            .map(|v| v.video_preview_image_url.clone())
            .unwrap_or_default();

        Self {
            count: group.count,
            days_since_start: group.days_since_start,
            page_name: first.page_name,
            snapshot_page_profile_picture_url: first.page_profile_picture_url,
            snapshot_body_text: first.body_text,
            snapshot_caption: first.caption,
            snapshot_cta_text: first.cta_text,
            snapshot_cta_type: first.cta_type,
            snapshot_link_description: first.link_description,
            snapshot_link_url: first.link_url,
            snapshot_page_categories: first.page_categories,
            snapshot_page_like_count: first.page_like_count,
            snapshot_title: first.title,
            videos: RankedVideo {
                video_hd_url: group.video_url,
                video_preview_image_url: preview,
            },
        }
    }
}

/// Aggregate, rank and shape the top groups for output.
pub fn rank_ads(ads: &[FlattenedAd], config: &RankConfig) -> Vec<RankedAd> {
    rank_groups(aggregate_by_video(ads), config)
        .into_iter()
        .map(RankedAd::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VideoRef;
    use proptest::prelude::*;

    fn ad(url: &str, days: Option<i64>, likes: Option<i64>, name: &str) -> FlattenedAd {
        FlattenedAd {
            page_name: name.to_string(),
            page_like_count: likes,
            days_since_start: days,
            video: Some(VideoRef {
                video_hd_url: url.to_string(),
                video_preview_image_url: format!("{url}.jpg"),
                ..VideoRef::default()
            }),
            ..FlattenedAd::default()
        }
    }

    #[test]
    fn duplicate_video_scenario() {
        let ads = vec![
            ad("A", Some(10), Some(20_000), "first"),
            ad("A", Some(10), Some(20_000), "second"),
            ad("B", Some(5), Some(20_000), "third"),
        ];

        let groups = aggregate_by_video(&ads);
        assert_eq!(groups.len(), 2);
        assert_eq!((groups[0].video_url.as_str(), groups[0].count), ("A", 2));
        assert_eq!(groups[0].days_since_start, Some(10));
        assert_eq!(groups[0].first.page_name, "first");
        assert_eq!((groups[1].video_url.as_str(), groups[1].count), ("B", 1));
        assert_eq!(groups[1].days_since_start, Some(5));

        let top = rank_groups(groups, &RankConfig::default().with_top_n(1));
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].video_url, "A");
    }

    #[test]
    fn group_recency_is_the_maximum() {
        let ads = vec![ad("A", Some(3), None, "x"), ad("A", None, None, "y"), ad("A", Some(9), None, "z")];
        let groups = aggregate_by_video(&ads);
        assert_eq!(groups[0].days_since_start, Some(9));
        assert_eq!(groups[0].count, 3);
    }

    #[test]
    fn drops_ads_without_video() {
        let mut no_video = ad("", Some(50), None, "x");
        no_video.video = None;
        let ads = vec![no_video, ad("  ", Some(50), None, "y"), ad("A", Some(1), None, "z")];
        let groups = aggregate_by_video(&ads);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].video_url, "A");
    }

    #[test]
    fn tie_breaks_on_count_then_popularity() {
        let ads = vec![
            ad("low-likes", Some(10), Some(100), "a"),
            ad("high-likes", Some(10), Some(900), "b"),
            ad("dup", Some(10), Some(1), "c"),
            ad("dup", Some(10), Some(1), "d"),
        ];
        let ranked = rank_groups(aggregate_by_video(&ads), &RankConfig::default());
        let order: Vec<_> = ranked.iter().map(|g| g.video_url.as_str()).collect();
        assert_eq!(order, ["dup", "high-likes", "low-likes"]);
    }

    #[test]
    fn missing_keys_sink() {
        let ads = vec![
            ad("unknown-age", None, Some(1_000_000), "a"),
            ad("old", Some(1), Some(1), "b"),
            ad("no-likes", Some(1), None, "c"),
        ];
        let ranked = rank_groups(aggregate_by_video(&ads), &RankConfig::default());
        let order: Vec<_> = ranked.iter().map(|g| g.video_url.as_str()).collect();
        assert_eq!(order, ["old", "no-likes", "unknown-age"]);
    }

    #[test]
    fn full_ties_keep_input_order() {
        let ads: Vec<_> = ["c", "a", "b"]
            .iter()
            .map(|u| ad(u, Some(7), Some(7), u))
            .collect();
        let ranked = rank_groups(aggregate_by_video(&ads), &RankConfig::default());
        let order: Vec<_> = ranked.iter().map(|g| g.video_url.as_str()).collect();
        assert_eq!(order, ["c", "a", "b"]);
    }

    #[test]
    fn ranked_output_shape() {
        let ranked = rank_ads(&[ad("A", Some(10), Some(20_000), "Snitch")], &RankConfig::default());
        let value = serde_json::to_value(&ranked[0]).unwrap();
        assert_eq!(value["count"], 1);
        assert_eq!(value["page_name"], "Snitch");
        assert_eq!(value["snapshot_page_like_count"], 20_000);
        assert_eq!(value["snapshot.videos"]["video_hd_url"], "A");
        assert_eq!(value["snapshot.videos"]["video_preview_image_url"], "A.jpg");
    }

    fn arb_ad() -> impl Strategy<Value = FlattenedAd> {
        (
            prop::sample::select(vec!["", "A", "B", "C", "D"]),
            prop::option::of(0i64..30),
            prop::option::of(0i64..5),
        )
            .prop_map(|(url, days, likes)| ad(url, days, likes, "p"))
    }

    proptest! {
        #[test]
        fn groups_partition_ads_with_video(ads in prop::collection::vec(arb_ad(), 0..40)) {
            let groups = aggregate_by_video(&ads);
            let with_video = ads.iter().filter(|a| a.video_url().is_some()).count();
            prop_assert_eq!(groups.iter().map(|g| g.count).sum::<usize>(), with_video);

            let mut urls: Vec<_> = groups.iter().map(|g| g.video_url.clone()).collect();
            urls.sort();
            urls.dedup();
            prop_assert_eq!(urls.len(), groups.len());
        }

        #[test]
        fn ranking_is_ordered_and_bounded(ads in prop::collection::vec(arb_ad(), 0..40), top_n in 0usize..6) {
            let ranked = rank_groups(aggregate_by_video(&ads), &RankConfig::default().with_top_n(top_n));
            prop_assert!(ranked.len() <= top_n);
            for pair in ranked.windows(2) {
                prop_assert_ne!(compare_groups(&pair[0], &pair[1]), Ordering::Greater);
            }
        }
    }
}
