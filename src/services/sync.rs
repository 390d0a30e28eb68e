use crate::config::SyncConfig;
use crate::error::Result;
use crate::models::{header_row, VideoRecord};
use crate::services::cache::{CacheStatistics, ResponseCache};
use crate::services::dedup::{DedupStatistics, VideoDeduplicator};
use crate::services::fetcher::fetch_channel_videos;
use crate::services::quota::{QuotaStatus, QuotaTracker};
use crate::sheets::{Destination, SheetStore};
use crate::sources::VideoSource;
use crate::utils;
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

/// Success terminal states of one channel sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOutcome {
    /// Everything upstream was already in the destination; nothing
    /// written, still a success.
    NothingNew,
    Wrote(usize),
}

/// Aggregate result of a batch sync, built incrementally as channels
/// complete and finalized even on partial failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub results: BTreeMap<String, bool>,
    pub videos_written: usize,
    pub quota_used: u64,
    pub elapsed_secs: f64,
}

impl BatchReport {
    pub fn all_succeeded(&self) -> bool {
        self.results.values().all(|ok| *ok)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationReport {
    pub quota: QuotaStatus,
    pub cache: CacheStatistics,
    pub dedup: DedupStatistics,
}

/// Top-level workflow: read existing sheet state, seed the
/// deduplicator, fetch what is new, append it, and format the table,
/// either immediately per channel or once per batch.
///
/// All shared state is owned here and injected at construction; the
/// cache is shared with the video source so conditional fetches and
/// this report see the same statistics. One orchestrator assumes it is
/// the only writer to its destinations for the duration of a run.
pub struct SyncOrchestrator {
    source: Arc<dyn VideoSource>,
    store: Arc<dyn SheetStore>,
    cache: Arc<ResponseCache>,
    quota: QuotaTracker,
    dedup: VideoDeduplicator,
}

impl SyncOrchestrator {
    pub fn new(
        source: Arc<dyn VideoSource>,
        store: Arc<dyn SheetStore>,
        cache: Arc<ResponseCache>,
        daily_quota_limit: u64,
    ) -> Self {
        SyncOrchestrator {
            source,
            store,
            cache,
            quota: QuotaTracker::new(daily_quota_limit),
            dedup: VideoDeduplicator::new(),
        }
    }

    /// Sync one channel into the destination tab.
    ///
    /// Appends only; rows already present stay untouched. A header row
    /// is written first when the tab has no rows yet (an absent tab
    /// counts as empty). With `defer_formatting` the cosmetic
    /// formatting pass is skipped and the caller owns running
    /// `finish_formatting` later.
    pub async fn sync_channel(
        &self,
        channel_id: &str,
        destination: &Destination,
        config: &SyncConfig,
        defer_formatting: bool,
    ) -> Result<ChannelOutcome> {
        config.validate()?;

        let existing_rows = self.store.read_rows(destination).await?;
        let existing_ids = extract_existing_ids(&existing_rows);
        info!(
            "{channel_id} -> {destination}: {} existing rows, {} known video ids",
            existing_rows.len(),
            existing_ids.len()
        );

        let records = fetch_channel_videos(
            self.source.as_ref(),
            &self.dedup,
            &self.quota,
            channel_id,
            Some(&destination.tab),
            config,
            &existing_ids,
        )
        .await?;

        if records.is_empty() {
            info!("{channel_id} -> {destination}: nothing new");
            return Ok(ChannelOutcome::NothingNew);
        }

        let mut rows: Vec<Vec<String>> = Vec::with_capacity(records.len() + 1);
        if existing_rows.is_empty() {
            rows.push(header_row());
        }
        rows.extend(records.iter().map(VideoRecord::to_row));
        let appended = rows.len();

        self.store.append_rows(destination, rows).await?;
        info!(
            "{channel_id} -> {destination}: appended {} videos",
            records.len()
        );

        if !defer_formatting {
            self.store
                .format_range(destination, existing_rows.len() + appended)
                .await?;
        }

        Ok(ChannelOutcome::Wrote(records.len()))
    }

    /// Sync a batch of channels into one destination tab, formatting
    /// exactly once at the end.
    ///
    /// A failing channel is logged, recorded as `false`, and does not
    /// stop its siblings; errors never escape this boundary. The
    /// closing formatting pass runs no matter how many channels
    /// failed, and is itself best-effort: formatting is cosmetic, so
    /// its failure does not demote channels that wrote successfully.
    pub async fn sync_many(
        &self,
        channel_ids: &[String],
        destination: &Destination,
        config: &SyncConfig,
    ) -> BatchReport {
        let started = Instant::now();
        let quota_before = self.quota.status().used;
        let mut results = BTreeMap::new();
        let mut videos_written = 0;

        for channel_id in channel_ids {
            match self
                .sync_channel(channel_id, destination, config, true)
                .await
            {
                Ok(outcome) => {
                    if let ChannelOutcome::Wrote(count) = outcome {
                        videos_written += count;
                    }
                    results.insert(channel_id.clone(), true);
                }
                Err(err) => {
                    error!("sync failed for channel {channel_id}: {err}");
                    results.insert(channel_id.clone(), false);
                }
            }
        }

        if let Err(err) = self.finish_formatting(destination).await {
            error!("deferred formatting for {destination} failed: {err}");
        }

        BatchReport {
            results,
            videos_written,
            quota_used: self.quota.status().used.saturating_sub(quota_before),
            elapsed_secs: started.elapsed().as_secs_f64(),
        }
    }

    /// The deferred formatting pass: one `format_range` over the full
    /// current extent of the destination.
    pub async fn finish_formatting(&self, destination: &Destination) -> Result<()> {
        let row_count = self.store.read_rows(destination).await?.len();
        self.store.format_range(destination, row_count).await
    }

    pub fn optimization_report(&self) -> OptimizationReport {
        OptimizationReport {
            quota: self.quota.status(),
            cache: self.cache.statistics(),
            dedup: self.dedup.statistics(),
        }
    }
}

/// Video ids already present at a destination, recovered by parsing
/// the URL column. Header rows and malformed cells simply contribute
/// nothing.
fn extract_existing_ids(rows: &[Vec<String>]) -> Vec<String> {
    rows.iter()
        .filter_map(|row| row.get(crate::models::URL_COLUMN))
        .filter_map(|cell| utils::extract_video_id(cell))
        .collect()
}
