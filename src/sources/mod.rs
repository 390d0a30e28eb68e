pub mod youtube;

use crate::error::Result;
use crate::models::VideoDetail;
use async_trait::async_trait;

/// Upstream cap on ids per listing page and per details batch.
pub const MAX_PAGE_SIZE: usize = 50;

/// One listing entry, before any details are fetched for it.
#[derive(Debug, Clone)]
pub struct VideoStub {
    pub video_id: String,
    pub title: String,
    pub published_at: String,
    pub channel_title: String,
}

/// A single page of a channel's uploads, newest first.
#[derive(Debug, Clone)]
pub struct VideoPage {
    pub items: Vec<VideoStub>,
    pub next_page_token: Option<String>,
    /// API units this call cost, reported to the quota tracker.
    pub quota_cost: u64,
}

/// One batched details response.
#[derive(Debug, Clone)]
pub struct DetailBatch {
    pub items: Vec<VideoDetail>,
    pub quota_cost: u64,
}

/// The video-source capability. Any client that can page a channel's
/// uploads newest-first and batch-fetch details can back a sync run,
/// which keeps unit tests fully offline.
#[async_trait]
pub trait VideoSource: Send + Sync {
    async fn list_channel_videos(
        &self,
        channel_id: &str,
        page_token: Option<&str>,
    ) -> Result<VideoPage>;

    /// Fetch stats + duration + snippet for up to `MAX_PAGE_SIZE` ids
    /// in one call.
    async fn video_details(&self, video_ids: &[String]) -> Result<DetailBatch>;
}
