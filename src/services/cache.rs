use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

/// ETag-validated cache of API response payloads, keyed by a canonical
/// request signature. Stores whole responses only; a stored payload is
/// either reused as-is or replaced by a fresh fetch. Growth is
/// unbounded, which is acceptable for instances scoped to one sync run.
pub struct ResponseCache {
    inner: Mutex<CacheInner>,
}

struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    hits: u64,
    misses: u64,
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub payload: Value,
    pub etag: Option<String>,
    pub stored_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStatistics {
    pub hits: u64,
    pub misses: u64,
    pub total_requests: u64,
    pub hit_rate: f64,
}

/// Canonical signature for a request: endpoint plus every parameter
/// that affects the response, sorted so parameter order never changes
/// the key. Auth parameters are the caller's business and stay out.
pub fn request_signature(endpoint: &str, params: &[(&str, &str)]) -> String {
    let mut sorted: Vec<String> = params
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect();
    sorted.sort();
    format!("{endpoint}?{}", sorted.join("&"))
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseCache {
    pub fn new() -> Self {
        ResponseCache {
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                hits: 0,
                misses: 0,
            }),
        }
    }

    /// Look up a stored payload, counting a hit or a miss.
    pub fn get(&self, signature: &str) -> Option<CacheEntry> {
        if let Ok(mut inner) = self.inner.lock() {
            match inner.entries.get(signature).cloned() {
                Some(entry) => {
                    inner.hits += 1;
                    Some(entry)
                }
                None => {
                    inner.misses += 1;
                    None
                }
            }
        } else {
            None
        }
    }

    /// Peek at the stored validator without touching hit/miss counts,
    /// so a caller can attempt a conditional fetch first.
    pub fn validator(&self, signature: &str) -> Option<String> {
        self.inner
            .lock()
            .ok()
            .and_then(|inner| inner.entries.get(signature).and_then(|e| e.etag.clone()))
    }

    /// Store (or replace) the payload for a signature.
    pub fn put(&self, signature: &str, payload: Value, etag: Option<String>) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.entries.insert(
                signature.to_string(),
                CacheEntry {
                    payload,
                    etag,
                    stored_at: Utc::now(),
                },
            );
        }
    }

    /// Count a refresh of an entry that existed but whose content
    /// changed upstream: the request went out and a fresh body came
    /// back, so it is a miss even though `get` was never consulted.
    pub fn record_miss(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.misses += 1;
        }
    }

    pub fn statistics(&self) -> CacheStatistics {
        match self.inner.lock() {
            Ok(inner) => {
                let total = inner.hits + inner.misses;
                CacheStatistics {
                    hits: inner.hits,
                    misses: inner.misses,
                    total_requests: total,
                    hit_rate: if total > 0 {
                        inner.hits as f64 / total as f64 * 100.0
                    } else {
                        0.0
                    },
                }
            }
            Err(_) => CacheStatistics {
                hits: 0,
                misses: 0,
                total_requests: 0,
                hit_rate: 0.0,
            },
        }
    }
}
