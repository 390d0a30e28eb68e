use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use yt_sheet_sync::error::{Result, SyncError};
use yt_sheet_sync::models::{VideoDetail, SHEET_HEADER, URL_COLUMN};
use yt_sheet_sync::sheets::{Destination, SheetStore};
use yt_sheet_sync::sources::{DetailBatch, VideoPage, VideoSource, VideoStub};
use yt_sheet_sync::{ChannelOutcome, ResponseCache, SyncConfig, SyncOrchestrator};

/// Serves a fixed listing per channel (one page) and synthesizes
/// details for whatever ids are asked for, recording every call.
struct FakeSource {
    listings: HashMap<String, Vec<String>>,
    failing_channels: Vec<String>,
    detail_calls: Mutex<Vec<Vec<String>>>,
}

impl FakeSource {
    fn new(listings: &[(&str, &[&str])]) -> Self {
        FakeSource {
            listings: listings
                .iter()
                .map(|(channel, ids)| {
                    (
                        channel.to_string(),
                        ids.iter().map(|id| id.to_string()).collect(),
                    )
                })
                .collect(),
            failing_channels: Vec::new(),
            detail_calls: Mutex::new(Vec::new()),
        }
    }

    fn failing(mut self, channel: &str) -> Self {
        self.failing_channels.push(channel.to_string());
        self
    }
}

#[async_trait]
impl VideoSource for FakeSource {
    async fn list_channel_videos(
        &self,
        channel_id: &str,
        _page_token: Option<&str>,
    ) -> Result<VideoPage> {
        if self.failing_channels.iter().any(|c| c == channel_id) {
            return Err(SyncError::Fetch("channel listing unavailable".to_string()));
        }
        let ids = self.listings.get(channel_id).cloned().unwrap_or_default();
        Ok(VideoPage {
            items: ids
                .iter()
                .map(|id| VideoStub {
                    video_id: id.clone(),
                    title: format!("video {id}"),
                    published_at: "2024-03-01T00:00:00Z".to_string(),
                    channel_title: format!("name of {channel_id}"),
                })
                .collect(),
            next_page_token: None,
            quota_cost: 1,
        })
    }

    async fn video_details(&self, video_ids: &[String]) -> Result<DetailBatch> {
        self.detail_calls.lock().unwrap().push(video_ids.to_vec());
        Ok(DetailBatch {
            items: video_ids
                .iter()
                .map(|id| VideoDetail {
                    video_id: id.clone(),
                    title: format!("video {id}"),
                    channel_id: "UC-owner".to_string(),
                    channel_title: "Owner".to_string(),
                    published_at: "2024-03-01T00:00:00Z".to_string(),
                    duration_iso: "PT5M".to_string(),
                    views: 100,
                    likes: Some(10),
                    comments: Some(2),
                })
                .collect(),
            quota_cost: 1,
        })
    }
}

/// In-memory sheet store: a map of destination to rows plus a log of
/// formatting calls.
#[derive(Default)]
struct FakeStore {
    tabs: Mutex<HashMap<Destination, Vec<Vec<String>>>>,
    format_calls: Mutex<Vec<(Destination, usize)>>,
    read_calls: Mutex<usize>,
}

impl FakeStore {
    fn seed(&self, destination: &Destination, rows: Vec<Vec<String>>) {
        self.tabs.lock().unwrap().insert(destination.clone(), rows);
    }

    fn rows(&self, destination: &Destination) -> Vec<Vec<String>> {
        self.tabs
            .lock()
            .unwrap()
            .get(destination)
            .cloned()
            .unwrap_or_default()
    }

    fn format_count(&self) -> usize {
        self.format_calls.lock().unwrap().len()
    }
}

#[async_trait]
impl SheetStore for FakeStore {
    async fn read_rows(&self, destination: &Destination) -> Result<Vec<Vec<String>>> {
        *self.read_calls.lock().unwrap() += 1;
        // An absent destination reads as zero rows, not an error.
        Ok(self.rows(destination))
    }

    async fn append_rows(&self, destination: &Destination, rows: Vec<Vec<String>>) -> Result<()> {
        self.tabs
            .lock()
            .unwrap()
            .entry(destination.clone())
            .or_default()
            .extend(rows);
        Ok(())
    }

    async fn format_range(&self, destination: &Destination, row_count: usize) -> Result<()> {
        self.format_calls
            .lock()
            .unwrap()
            .push((destination.clone(), row_count));
        Ok(())
    }
}

fn build_orchestrator(
    source: FakeSource,
) -> (SyncOrchestrator, Arc<FakeStore>, Arc<ResponseCache>) {
    let store = Arc::new(FakeStore::default());
    let cache = Arc::new(ResponseCache::new());
    let orchestrator = SyncOrchestrator::new(
        Arc::new(source),
        store.clone(),
        cache.clone(),
        10_000,
    );
    (orchestrator, store, cache)
}

fn existing_row(video_id: &str) -> Vec<String> {
    let mut row: Vec<String> = (0..SHEET_HEADER.len())
        .map(|i| format!("cell-{video_id}-{i}"))
        .collect();
    row[URL_COLUMN] = format!("https://www.youtube.com/watch?v={video_id}");
    row
}

fn header_and_existing(ids: &[&str]) -> Vec<Vec<String>> {
    let mut rows = vec![SHEET_HEADER.iter().map(|c| c.to_string()).collect()];
    rows.extend(ids.iter().map(|id| existing_row(id)));
    rows
}

#[tokio::test]
async fn first_run_writes_header_and_all_rows() {
    let source = FakeSource::new(&[("UC1", &["aaaaaaaaaaa", "bbbbbbbbbbb", "ccccccccccc"])]);
    let (orchestrator, store, _cache) = build_orchestrator(source);
    let destination = Destination::new("sheet-1", "Videos");

    let outcome = orchestrator
        .sync_channel("UC1", &destination, &SyncConfig::default(), false)
        .await
        .expect("sync");

    assert_eq!(outcome, ChannelOutcome::Wrote(3));
    let rows = store.rows(&destination);
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0], SHEET_HEADER.to_vec());
    assert_eq!(
        rows[1][URL_COLUMN],
        "https://www.youtube.com/watch?v=aaaaaaaaaaa"
    );
    assert_eq!(store.format_count(), 1);
    assert_eq!(orchestrator.optimization_report().dedup.total_seen, 3);
}

#[tokio::test]
async fn incremental_run_fetches_details_only_for_new_videos() {
    let source = FakeSource::new(&[("UC1", &["aaaaaaaaaaa", "bbbbbbbbbbb", "ccccccccccc"])]);
    let (orchestrator, store, _cache) = build_orchestrator(source);
    let destination = Destination::new("sheet-1", "Videos");
    store.seed(
        &destination,
        header_and_existing(&["aaaaaaaaaaa", "bbbbbbbbbbb"]),
    );

    let outcome = orchestrator
        .sync_channel("UC1", &destination, &SyncConfig::default(), false)
        .await
        .expect("sync");

    assert_eq!(outcome, ChannelOutcome::Wrote(1));
    let rows = store.rows(&destination);
    // Header + 2 existing + 1 appended, no second header.
    assert_eq!(rows.len(), 4);
    assert_eq!(
        rows[3][URL_COLUMN],
        "https://www.youtube.com/watch?v=ccccccccccc"
    );

    let report = orchestrator.optimization_report();
    // One listing call and one details call for just the new id.
    assert_eq!(report.quota.used, 2);
    assert_eq!(report.dedup.duplicates_prevented, 2);
}

#[tokio::test]
async fn incremental_detail_call_carries_only_the_new_id() {
    let source = Arc::new(FakeSource::new(&[("UC1", &["aaaaaaaaaaa", "ccccccccccc"])]));
    let store = Arc::new(FakeStore::default());
    let cache = Arc::new(ResponseCache::new());
    let orchestrator =
        SyncOrchestrator::new(source.clone(), store.clone(), cache, 10_000);

    let destination = Destination::new("sheet-1", "Videos");
    store.seed(&destination, header_and_existing(&["aaaaaaaaaaa"]));

    orchestrator
        .sync_channel("UC1", &destination, &SyncConfig::default(), true)
        .await
        .expect("sync");

    let calls = source.detail_calls.lock().unwrap().clone();
    assert_eq!(calls, vec![vec!["ccccccccccc".to_string()]]);
}

#[tokio::test]
async fn unchanged_channel_is_a_success_without_writes() {
    let source = FakeSource::new(&[("UC1", &["aaaaaaaaaaa"])]);
    let (orchestrator, store, _cache) = build_orchestrator(source);
    let destination = Destination::new("sheet-1", "Videos");
    let seeded = header_and_existing(&["aaaaaaaaaaa"]);
    store.seed(&destination, seeded.clone());

    let outcome = orchestrator
        .sync_channel("UC1", &destination, &SyncConfig::default(), false)
        .await
        .expect("sync");

    assert_eq!(outcome, ChannelOutcome::NothingNew);
    assert_eq!(store.rows(&destination), seeded);
    assert_eq!(store.format_count(), 0);
}

#[tokio::test]
async fn append_never_touches_existing_rows() {
    let source = FakeSource::new(&[("UC1", &["ccccccccccc", "ddddddddddd"])]);
    let (orchestrator, store, _cache) = build_orchestrator(source);
    let destination = Destination::new("sheet-1", "Videos");
    let original = header_and_existing(&["aaaaaaaaaaa", "bbbbbbbbbbb"]);
    store.seed(&destination, original.clone());

    orchestrator
        .sync_channel("UC1", &destination, &SyncConfig::default(), false)
        .await
        .expect("sync");

    let rows = store.rows(&destination);
    assert_eq!(rows.len(), original.len() + 2);
    assert_eq!(&rows[..original.len()], &original[..]);
}

#[tokio::test]
async fn batch_formats_exactly_once_for_many_channels() {
    let source = FakeSource::new(&[
        ("UC1", &["aaaaaaaaaaa"] as &[&str]),
        ("UC2", &["bbbbbbbbbbb"]),
        ("UC3", &[]),
    ]);
    let (orchestrator, store, _cache) = build_orchestrator(source);
    let destination = Destination::new("sheet-1", "Videos");
    let channels = vec!["UC1".to_string(), "UC2".to_string(), "UC3".to_string()];

    let report = orchestrator
        .sync_many(&channels, &destination, &SyncConfig::default())
        .await;

    assert!(report.all_succeeded());
    assert_eq!(report.videos_written, 2);
    assert_eq!(store.format_count(), 1);
    // Header + one row per channel that had anything.
    assert_eq!(store.rows(&destination).len(), 3);
}

#[tokio::test]
async fn partial_batch_failure_keeps_good_writes_and_still_formats() {
    let source =
        FakeSource::new(&[("chanOK", &["aaaaaaaaaaa"] as &[&str]), ("chanFail", &[])])
            .failing("chanFail");
    let (orchestrator, store, _cache) = build_orchestrator(source);
    let destination = Destination::new("sheet-1", "Videos");
    let channels = vec!["chanOK".to_string(), "chanFail".to_string()];

    let report = orchestrator
        .sync_many(&channels, &destination, &SyncConfig::default())
        .await;

    assert_eq!(report.results.get("chanOK"), Some(&true));
    assert_eq!(report.results.get("chanFail"), Some(&false));
    assert!(!report.all_succeeded());

    // chanOK's rows survived and the deferred pass still ran once.
    let rows = store.rows(&destination);
    assert_eq!(rows.len(), 2);
    assert_eq!(
        rows[1][URL_COLUMN],
        "https://www.youtube.com/watch?v=aaaaaaaaaaa"
    );
    assert_eq!(store.format_count(), 1);
    let (_, formatted_rows) = store.format_calls.lock().unwrap()[0].clone();
    assert_eq!(formatted_rows, 2);
}

#[tokio::test]
async fn two_channels_sharing_a_tab_share_dedup_state() {
    // Both channels list the same video; it must be written once.
    let source = FakeSource::new(&[
        ("UC1", &["aaaaaaaaaaa", "bbbbbbbbbbb"] as &[&str]),
        ("UC2", &["aaaaaaaaaaa", "ccccccccccc"]),
    ]);
    let (orchestrator, store, _cache) = build_orchestrator(source);
    let destination = Destination::new("sheet-1", "Videos");
    let channels = vec!["UC1".to_string(), "UC2".to_string()];

    let report = orchestrator
        .sync_many(&channels, &destination, &SyncConfig::default())
        .await;

    assert!(report.all_succeeded());
    assert_eq!(report.videos_written, 3);

    let rows = store.rows(&destination);
    // Header + three distinct videos; the shared one appears once.
    assert_eq!(rows.len(), 4);
    let shared_count = rows
        .iter()
        .filter(|row| row[URL_COLUMN].contains("aaaaaaaaaaa"))
        .count();
    assert_eq!(shared_count, 1);
}

#[tokio::test]
async fn invalid_config_fails_before_any_io() {
    let source = FakeSource::new(&[("UC1", &["aaaaaaaaaaa"])]);
    let (orchestrator, store, _cache) = build_orchestrator(source);
    let destination = Destination::new("sheet-1", "Videos");
    let config = SyncConfig {
        max_videos: 0,
        ..SyncConfig::default()
    };

    let result = orchestrator
        .sync_channel("UC1", &destination, &config, false)
        .await;
    assert!(matches!(result, Err(SyncError::Validation(_))));
    assert_eq!(*store.read_calls.lock().unwrap(), 0);
}
