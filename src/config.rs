use crate::error::{Result, SyncError};
use env_logger::Builder;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::env;

pub const DEFAULT_DAILY_QUOTA_LIMIT: u64 = 10_000;
pub const DEFAULT_MAX_VIDEOS: usize = 50;

pub fn load_environment() {
    dotenv::dotenv().ok();
}

pub fn init_logger() {
    Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();
}

/// Credentials and limits read from the environment once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub youtube_api_key: String,
    pub sheets_access_token: String,
    pub daily_quota_limit: u64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Ok(AppConfig {
            youtube_api_key: require_env("YOUTUBE_API_KEY")?,
            sheets_access_token: require_env("SHEETS_ACCESS_TOKEN")?,
            daily_quota_limit: env::var("DAILY_QUOTA_LIMIT")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(DEFAULT_DAILY_QUOTA_LIMIT),
        })
    }
}

fn require_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| {
        SyncError::Configuration(format!("{name} environment variable must be set"))
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum KeywordMode {
    /// Keep a video iff its title contains any keyword.
    Include,
    /// Keep a video iff its title contains none of the keywords.
    Exclude,
}

/// Filter and runtime options for one sync run.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Inclusive duration bounds in seconds; either side optional.
    pub min_duration: Option<i64>,
    pub max_duration: Option<i64>,
    /// Empty list means no keyword filtering regardless of mode.
    pub keywords: Vec<String>,
    pub keyword_mode: KeywordMode,
    /// Cap on videos collected per channel.
    pub max_videos: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            min_duration: None,
            max_duration: None,
            keywords: Vec::new(),
            keyword_mode: KeywordMode::Include,
            max_videos: DEFAULT_MAX_VIDEOS,
        }
    }
}

impl SyncConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_videos == 0 {
            return Err(SyncError::Validation(
                "max_videos must be at least 1".to_string(),
            ));
        }
        if let (Some(min), Some(max)) = (self.min_duration, self.max_duration) {
            if min > max {
                return Err(SyncError::Validation(format!(
                    "min_duration ({min}s) exceeds max_duration ({max}s)"
                )));
            }
        }
        if self.min_duration.is_some_and(|min| min < 0)
            || self.max_duration.is_some_and(|max| max < 0)
        {
            return Err(SyncError::Validation(
                "duration bounds must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}
