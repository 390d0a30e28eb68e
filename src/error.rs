use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    /// Required credential or setting is missing. Fatal at startup, never retried.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A video-source call failed (network, auth, quota exhausted upstream).
    /// Fatal for the current channel; `sync_many` catches it per channel.
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// A single item failed normalization. Recovered locally by skipping
    /// the item with a warning.
    #[error("could not process video {video_id}: {reason}")]
    Processing { video_id: String, reason: String },

    /// A sheet-store call (read/append/format) failed.
    #[error("sheet store error: {0}")]
    Write(String),

    /// Caller supplied an invalid `SyncConfig`. Raised before any I/O.
    #[error("invalid sync config: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, SyncError>;
