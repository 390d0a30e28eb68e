use crate::config::SyncConfig;
use crate::error::Result;
use crate::models::{VideoRecord, VideoType};
use crate::services::dedup::VideoDeduplicator;
use crate::services::filters;
use crate::services::quota::QuotaTracker;
use crate::sources::VideoSource;
use chrono::Utc;
use log::{debug, info, warn};

/// Page through a channel's uploads and return normalized records for
/// videos not yet seen in the destination scope, newest first, capped
/// at `config.max_videos` after filtering.
///
/// Ids dropped by the deduplicator never reach the details request;
/// that is where the quota saving happens. Freshly fetched ids are
/// marked seen immediately so a video cannot be fetched twice within
/// one multi-page run. Quota already consumed is not rolled back when
/// a later page fails.
pub async fn fetch_channel_videos(
    source: &dyn VideoSource,
    dedup: &VideoDeduplicator,
    quota: &QuotaTracker,
    channel_id: &str,
    destination: Option<&str>,
    config: &SyncConfig,
    already_seen: &[String],
) -> Result<Vec<VideoRecord>> {
    let seeded = dedup.mark_as_seen(already_seen, channel_id, destination);
    debug!("{channel_id}: seeded {seeded} previously synced ids");

    let mut collected: Vec<VideoRecord> = Vec::new();
    let mut page_token: Option<String> = None;

    loop {
        let page = source
            .list_channel_videos(channel_id, page_token.as_deref())
            .await?;
        quota.consume(page.quota_cost);

        let candidate_ids: Vec<String> = page
            .items
            .iter()
            .map(|stub| stub.video_id.clone())
            .collect();
        let new_ids = dedup.filter_new_videos(&candidate_ids, channel_id, destination);
        debug!(
            "{channel_id}: page had {} candidates, {} new",
            candidate_ids.len(),
            new_ids.len()
        );

        if !new_ids.is_empty() {
            let batch = source.video_details(&new_ids).await?;
            quota.consume(batch.quota_cost);
            dedup.mark_as_seen(&new_ids, channel_id, destination);

            let added_at = Utc::now();
            for detail in &batch.items {
                match VideoRecord::from_detail(detail, added_at) {
                    Ok(record) => collected.push(record),
                    Err(err) => warn!("{channel_id}: skipping item: {err}"),
                }
            }
        }

        if collected.len() >= config.max_videos {
            break;
        }
        match page.next_page_token {
            Some(token) => page_token = Some(token),
            None => break,
        }
    }

    let total_collected = collected.len();
    let mut records = filters::apply(collected, config);
    records.truncate(config.max_videos);

    let shorts = records
        .iter()
        .filter(|r| r.video_type == VideoType::Short)
        .count();
    info!(
        "{channel_id}: {} new videos after filters ({} collected, {} shorts)",
        records.len(),
        total_collected,
        shorts
    );

    Ok(records)
}
