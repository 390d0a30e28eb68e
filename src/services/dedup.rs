use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Tracks which video ids have already been synced, per destination
/// scope. The scope is the destination tab when one is given, so two
/// channels writing the same tab share seen-state, while the same
/// channel writing two tabs does not. Without a destination the
/// channel id itself is the scope.
///
/// Seen-state only grows for the lifetime of the instance; re-seeding
/// with ids that are already marked is a no-op.
pub struct VideoDeduplicator {
    inner: Mutex<DedupInner>,
}

struct DedupInner {
    seen: HashMap<String, HashSet<String>>,
    duplicates_prevented: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupStatistics {
    pub total_seen: usize,
    pub duplicates_prevented: u64,
}

fn scope_key(channel_id: &str, destination: Option<&str>) -> String {
    match destination {
        Some(tab) => format!("tab:{tab}"),
        None => format!("channel:{channel_id}"),
    }
}

impl Default for VideoDeduplicator {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoDeduplicator {
    pub fn new() -> Self {
        VideoDeduplicator {
            inner: Mutex::new(DedupInner {
                seen: HashMap::new(),
                duplicates_prevented: 0,
            }),
        }
    }

    /// Mark ids as seen for a scope. Returns how many were newly
    /// marked; already-seen ids contribute nothing.
    pub fn mark_as_seen(
        &self,
        video_ids: &[String],
        channel_id: &str,
        destination: Option<&str>,
    ) -> usize {
        let key = scope_key(channel_id, destination);
        if let Ok(mut inner) = self.inner.lock() {
            let scope = inner.seen.entry(key).or_default();
            video_ids
                .iter()
                .filter(|id| scope.insert((*id).clone()))
                .count()
        } else {
            0
        }
    }

    /// Drop ids already seen in the scope, preserving input order.
    /// Never marks anything as seen; that happens only when a video is
    /// actually fetched or written. Each dropped id counts toward
    /// `duplicates_prevented`.
    pub fn filter_new_videos(
        &self,
        video_ids: &[String],
        channel_id: &str,
        destination: Option<&str>,
    ) -> Vec<String> {
        let key = scope_key(channel_id, destination);
        if let Ok(mut inner) = self.inner.lock() {
            let new_ids: Vec<String> = match inner.seen.get(&key) {
                Some(scope) => video_ids
                    .iter()
                    .filter(|id| !scope.contains(*id))
                    .cloned()
                    .collect(),
                None => video_ids.to_vec(),
            };
            inner.duplicates_prevented += (video_ids.len() - new_ids.len()) as u64;
            new_ids
        } else {
            video_ids.to_vec()
        }
    }

    pub fn statistics(&self) -> DedupStatistics {
        match self.inner.lock() {
            Ok(inner) => DedupStatistics {
                total_seen: inner.seen.values().map(|scope| scope.len()).sum(),
                duplicates_prevented: inner.duplicates_prevented,
            },
            Err(_) => DedupStatistics {
                total_seen: 0,
                duplicates_prevented: 0,
            },
        }
    }
}
