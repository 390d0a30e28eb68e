use crate::error::{Result, SyncError};
use crate::models::VideoDetail;
use crate::services::cache::{request_signature, ResponseCache};
use crate::sources::{DetailBatch, VideoPage, VideoSource, VideoStub, MAX_PAGE_SIZE};
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::header::{ETAG, IF_NONE_MATCH};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

const YOUTUBE_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

// Unit costs per https://developers.google.com/youtube/v3/determine_quota_cost
pub const CHANNELS_CALL_COST: u64 = 1;
pub const LIST_CALL_COST: u64 = 1;
pub const DETAILS_CALL_COST: u64 = 1;

/// YouTube Data API v3 client. Channel uploads are read through the
/// channel's uploads playlist (resolved once and memoized), and every
/// request goes through the shared response cache as a conditional
/// fetch: a stored ETag is sent as `If-None-Match` and a 304 re-serves
/// the stored body.
pub struct YouTubeDataApi {
    client: Client,
    api_key: String,
    cache: Arc<ResponseCache>,
    uploads_playlists: Mutex<HashMap<String, String>>,
}

impl YouTubeDataApi {
    pub fn new(api_key: String, cache: Arc<ResponseCache>) -> Self {
        YouTubeDataApi {
            client: Client::new(),
            api_key,
            cache,
            uploads_playlists: Mutex::new(HashMap::new()),
        }
    }

    /// One GET against the API with ETag revalidation. The API key is
    /// auth, not content, so it stays out of the cache signature.
    async fn get_json(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Value> {
        let signature = request_signature(endpoint, params);
        let validator = self.cache.validator(&signature);

        let url = format!("{YOUTUBE_API_BASE}/{endpoint}");
        let mut request = self
            .client
            .get(&url)
            .query(params)
            .query(&[("key", self.api_key.as_str())]);
        if let Some(etag) = &validator {
            request = request.header(IF_NONE_MATCH, etag);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SyncError::Fetch(format!("{endpoint} request failed: {e}")))?;

        if response.status() == StatusCode::NOT_MODIFIED {
            if let Some(entry) = self.cache.get(&signature) {
                debug!("{endpoint}: not modified, serving cached body");
                return Ok(entry.payload);
            }
            return Err(SyncError::Fetch(format!(
                "{endpoint}: got 304 but no cached body for it"
            )));
        }

        let status = response.status();
        let header_etag = response
            .headers()
            .get(ETAG)
            .and_then(|value| value.to_str().ok())
            .map(String::from);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status == StatusCode::FORBIDDEN && body.contains("quotaExceeded") {
                return Err(SyncError::Fetch(
                    "YouTube API daily quota exhausted".to_string(),
                ));
            }
            return Err(SyncError::Fetch(format!(
                "{endpoint} returned {status}: {body}"
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| SyncError::Fetch(format!("{endpoint}: invalid JSON: {e}")))?;

        let etag = header_etag.or_else(|| {
            payload
                .get("etag")
                .and_then(|value| value.as_str())
                .map(String::from)
        });
        self.cache.record_miss();
        self.cache.put(&signature, payload.clone(), etag);

        Ok(payload)
    }

    /// The channel's complete uploads playlist id, memoized per
    /// channel. Returns the quota cost actually incurred (0 on memo).
    async fn uploads_playlist_id(&self, channel_id: &str) -> Result<(String, u64)> {
        if let Ok(memo) = self.uploads_playlists.lock() {
            if let Some(playlist_id) = memo.get(channel_id) {
                return Ok((playlist_id.clone(), 0));
            }
        }

        let payload = self
            .get_json("channels", &[("part", "contentDetails"), ("id", channel_id)])
            .await?;
        let parsed: ChannelListResponse = serde_json::from_value(payload)
            .map_err(|e| SyncError::Fetch(format!("channels: unexpected response shape: {e}")))?;

        let playlist_id = parsed
            .items
            .into_iter()
            .next()
            .and_then(|item| item.content_details.related_playlists.uploads)
            .ok_or_else(|| {
                SyncError::Fetch(format!("no uploads playlist found for channel {channel_id}"))
            })?;

        if let Ok(mut memo) = self.uploads_playlists.lock() {
            memo.insert(channel_id.to_string(), playlist_id.clone());
        }
        Ok((playlist_id, CHANNELS_CALL_COST))
    }
}

#[async_trait]
impl VideoSource for YouTubeDataApi {
    async fn list_channel_videos(
        &self,
        channel_id: &str,
        page_token: Option<&str>,
    ) -> Result<VideoPage> {
        let (playlist_id, resolve_cost) = self.uploads_playlist_id(channel_id).await?;

        let page_size = MAX_PAGE_SIZE.to_string();
        let mut params = vec![
            ("part", "snippet"),
            ("playlistId", playlist_id.as_str()),
            ("maxResults", page_size.as_str()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }

        let payload = self.get_json("playlistItems", &params).await?;
        let parsed: PlaylistItemsResponse = serde_json::from_value(payload).map_err(|e| {
            SyncError::Fetch(format!("playlistItems: unexpected response shape: {e}"))
        })?;

        let items = parsed
            .items
            .into_iter()
            .filter_map(|item| {
                let snippet = item.snippet;
                match snippet.resource_id.video_id {
                    Some(video_id) => Some(VideoStub {
                        video_id,
                        title: snippet.title,
                        published_at: snippet.published_at,
                        channel_title: snippet.channel_title,
                    }),
                    None => {
                        warn!("{channel_id}: playlist item without a video id, skipping");
                        None
                    }
                }
            })
            .collect();

        Ok(VideoPage {
            items,
            next_page_token: parsed.next_page_token,
            quota_cost: resolve_cost + LIST_CALL_COST,
        })
    }

    async fn video_details(&self, video_ids: &[String]) -> Result<DetailBatch> {
        let mut items = Vec::with_capacity(video_ids.len());
        let mut quota_cost = 0;

        for chunk in video_ids.chunks(MAX_PAGE_SIZE) {
            let joined = chunk.join(",");
            let payload = self
                .get_json(
                    "videos",
                    &[
                        ("part", "snippet,statistics,contentDetails"),
                        ("id", joined.as_str()),
                    ],
                )
                .await?;
            quota_cost += DETAILS_CALL_COST;

            let parsed: VideoListResponse = serde_json::from_value(payload).map_err(|e| {
                SyncError::Fetch(format!("videos: unexpected response shape: {e}"))
            })?;

            for item in parsed.items {
                items.push(VideoDetail {
                    video_id: item.id,
                    title: item.snippet.title,
                    channel_id: item.snippet.channel_id,
                    channel_title: item.snippet.channel_title,
                    published_at: item.snippet.published_at,
                    duration_iso: item.content_details.duration,
                    views: item
                        .statistics
                        .view_count
                        .as_deref()
                        .and_then(|count| count.parse().ok())
                        .unwrap_or(0),
                    likes: item
                        .statistics
                        .like_count
                        .as_deref()
                        .and_then(|count| count.parse().ok()),
                    comments: item
                        .statistics
                        .comment_count
                        .as_deref()
                        .and_then(|count| count.parse().ok()),
                });
            }
        }

        Ok(DetailBatch { items, quota_cost })
    }
}

// Documentation: https://developers.google.com/youtube/v3/docs

#[derive(Debug, Deserialize)]
struct ChannelListResponse {
    #[serde(default)]
    items: Vec<ChannelItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelItem {
    content_details: ChannelContentDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelContentDetails {
    related_playlists: RelatedPlaylists,
}

#[derive(Debug, Deserialize)]
struct RelatedPlaylists {
    uploads: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemsResponse {
    #[serde(default)]
    items: Vec<PlaylistItem>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    snippet: PlaylistItemSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemSnippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    published_at: String,
    #[serde(default)]
    channel_title: String,
    resource_id: ResourceId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    id: String,
    snippet: VideoSnippet,
    #[serde(default)]
    statistics: VideoStatistics,
    content_details: VideoContentDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoSnippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    channel_id: String,
    #[serde(default)]
    channel_title: String,
    #[serde(default)]
    published_at: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoStatistics {
    view_count: Option<String>,
    like_count: Option<String>,
    comment_count: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideoContentDetails {
    #[serde(default)]
    duration: String,
}
