//! Domain types for ad-intel.

pub mod ad;
pub mod page;
pub mod record;
pub mod tags;

pub use ad::{prefilter, AdFilterConfig, FlattenedAd, VideoRef};
pub use page::{PageCandidate, BLUE_VERIFIED};
pub use record::{
    flatten_comments, AdCardRow, AdRow, CommentRow, RawRecord, RecordId, RelevanceFlag,
    RelevanceUpdate, ReelRow, TableName,
};
pub use tags::{TagCategory, TagSet, NONE_TAG, PERSONAS, TAG_CATEGORIES};
