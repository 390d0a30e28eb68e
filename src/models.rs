use crate::error::{Result, SyncError};
use crate::utils;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Videos at or under this length are tagged as Shorts.
pub const SHORT_MAX_SECONDS: i64 = 60;

/// Column order of every row written to the sheet store.
pub const SHEET_HEADER: [&str; 12] = [
    "Channel ID",
    "Channel",
    "Published",
    "Type",
    "Duration",
    "Title",
    "URL",
    "Views",
    "Likes",
    "Comments",
    "Review",
    "Added",
];

/// Index of the watch-URL column, used to rebuild dedup state from
/// rows already present in the destination.
pub const URL_COLUMN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VideoType {
    Short,
    Long,
}

impl fmt::Display for VideoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VideoType::Short => write!(f, "Short"),
            VideoType::Long => write!(f, "Long"),
        }
    }
}

/// One video item as parsed from a details response, before
/// normalization. Statistics may be withheld by the uploader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoDetail {
    pub video_id: String,
    pub title: String,
    pub channel_id: String,
    pub channel_title: String,
    pub published_at: String,
    pub duration_iso: String,
    pub views: u64,
    pub likes: Option<u64>,
    pub comments: Option<u64>,
}

/// Canonical exported row. Immutable once constructed; only ever
/// created by normalizing a `VideoDetail`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoRecord {
    pub video_id: String,
    pub channel_id: String,
    pub channel_name: String,
    pub published: String,
    pub video_type: VideoType,
    pub duration_secs: i64,
    pub duration: String,
    pub title: String,
    pub url: String,
    pub views: String,
    pub likes: String,
    pub comments: String,
    pub review: String,
    pub added: String,
}

impl VideoRecord {
    /// Normalize a parsed detail item into an exportable record.
    /// A malformed duration or date makes this a processing error so the
    /// caller can skip the single item instead of aborting the fetch.
    pub fn from_detail(detail: &VideoDetail, added_at: DateTime<Utc>) -> Result<VideoRecord> {
        if detail.video_id.is_empty() {
            return Err(SyncError::Processing {
                video_id: "<unknown>".to_string(),
                reason: "missing video id".to_string(),
            });
        }

        let duration_secs =
            utils::parse_iso8601_duration(&detail.duration_iso).ok_or_else(|| {
                SyncError::Processing {
                    video_id: detail.video_id.clone(),
                    reason: format!("unparseable duration {:?}", detail.duration_iso),
                }
            })?;

        let published = utils::parse_rfc3339(&detail.published_at)
            .ok_or_else(|| SyncError::Processing {
                video_id: detail.video_id.clone(),
                reason: format!("unparseable publish date {:?}", detail.published_at),
            })?
            .format("%Y-%m-%d")
            .to_string();

        let video_type = if duration_secs <= SHORT_MAX_SECONDS {
            VideoType::Short
        } else {
            VideoType::Long
        };

        Ok(VideoRecord {
            video_id: detail.video_id.clone(),
            channel_id: detail.channel_id.clone(),
            channel_name: detail.channel_title.clone(),
            published,
            video_type,
            duration_secs,
            duration: utils::format_duration(duration_secs),
            title: detail.title.clone(),
            url: utils::watch_url(&detail.video_id),
            views: detail.views.to_string(),
            likes: detail.likes.unwrap_or(0).to_string(),
            comments: detail.comments.unwrap_or(0).to_string(),
            review: "FALSE".to_string(),
            added: added_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        })
    }

    /// The 12 ordered cells written to the sheet, matching `SHEET_HEADER`.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.channel_id.clone(),
            self.channel_name.clone(),
            self.published.clone(),
            self.video_type.to_string(),
            self.duration.clone(),
            self.title.clone(),
            self.url.clone(),
            self.views.clone(),
            self.likes.clone(),
            self.comments.clone(),
            self.review.clone(),
            self.added.clone(),
        ]
    }
}

pub fn header_row() -> Vec<String> {
    SHEET_HEADER.iter().map(|cell| cell.to_string()).collect()
}
